// abc-setlist - build a show from ABC songs
// Import songs, fix up titles and part names, check the running time, export the folder

use abc_setlist::{config::clamp_seconds, shell::write_setlist, shell::Shell, Config, Setlist};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "abc-setlist")]
#[command(about = "Put ABC songs in order, edit titles and parts, and export the set")]
struct Args {
    /// Enable developer logging (stderr + debug output)
    #[arg(long, global = true)]
    dev: bool,

    /// Use this config file instead of the one in the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Import songs and print the setlist with its total running time
    Show {
        /// .abc files or folders of them, in show order
        paths: Vec<PathBuf>,
        #[arg(long, allow_negative_numbers = true)]
        padding: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        intro: Option<i64>,
        /// Print JSON instead of cards
        #[arg(long)]
        json: bool,
    },
    /// Import songs and copy them into a folder in show order
    Export {
        paths: Vec<PathBuf>,
        #[arg(long, short)]
        out: Option<PathBuf>,
        /// Keep the original file names (no 01_, 02_ prefix)
        #[arg(long)]
        no_numbering: bool,
    },
    /// Interactive command shell
    Shell { paths: Vec<PathBuf> },
}

fn init_logging(dev: bool, log_dir: &Path) -> Result<Option<WorkerGuard>> {
    // Base filter: info level for general logs, debug for the crate
    let base_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,abc_setlist=debug"));

    if dev {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_target(true)
            .with_env_filter(base_filter)
            .init();
        eprintln!("🔧 Dev mode: debug output on stderr");
        return Ok(None);
    }

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(log_dir, "abc-setlist.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(base_filter)
        .init();

    Ok(Some(guard))
}

/// Add files and folders in the order given; bad ones are reported and skipped
fn load_paths(setlist: &mut Setlist, paths: &[PathBuf]) {
    for path in paths {
        let result = if path.is_dir() {
            setlist.add_directory(path).map(|_| ())
        } else {
            setlist.add_from_file(path).map(|_| ())
        };
        if let Err(e) = result {
            eprintln!("⚠️  Skipping {}: {}", path.display(), e);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load config - falls back to defaults if missing
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let _guard = init_logging(args.dev, &config.log_dir)?;
    info!("abc-setlist starting up");

    let mut setlist = Setlist::new();

    match args.command {
        Cmd::Show {
            paths,
            padding,
            intro,
            json,
        } => {
            load_paths(&mut setlist, &paths);
            let (default_padding, default_intro) = config.timing();
            let padding = padding.map_or(default_padding, |s| clamp_seconds("padding", s));
            let intro = intro.map_or(default_intro, |s| clamp_seconds("intro", s));
            let total = setlist.total_duration(padding, intro);

            if json {
                let report = json!({
                    "songs": setlist.songs(),
                    "padding_seconds": padding,
                    "intro_seconds": intro,
                    "total_seconds": total.as_secs(),
                    "total": total.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let mut stdout = io::stdout();
                write_setlist(&mut stdout, &setlist)?;
                println!();
                println!("⏱️  TOTAL DURATION {} ({} songs)", total, setlist.len());
            }
        }
        Cmd::Export {
            paths,
            out,
            no_numbering,
        } => {
            load_paths(&mut setlist, &paths);
            let folder = out
                .or_else(|| config.export_dir.clone())
                .context("no export folder: pass --out or set export_dir in the config")?;
            let numbering = config.add_numbering && !no_numbering;

            match setlist.export_to_folder(&folder, numbering) {
                Ok(report) => println!(
                    "✅ Successfully exported {} files to {}",
                    report.total(),
                    folder.display()
                ),
                Err(e) => {
                    warn!("Export to {} failed: {}", folder.display(), e);
                    return Err(e).context("export failed");
                }
            }
        }
        Cmd::Shell { paths } => {
            load_paths(&mut setlist, &paths);
            let mut shell = Shell::new(setlist, &config);
            let stdin = io::stdin();
            shell.run(stdin.lock(), io::stdout())?;
        }
    }

    Ok(())
}
