// Command shell - the interactive front end for building a set
// Reads one command per line and runs it to completion before reading the next,
// so the setlist only ever sees one call at a time

mod command;

pub use command::{Command, HELP};

use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{clamp_seconds, Config};
use crate::setlist::Setlist;

/// Whether the shell keeps reading after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    setlist: Setlist,
    padding_seconds: i64,
    intro_seconds: i64,
    numbering: bool,
    export_dir: Option<PathBuf>,
}

impl Shell {
    pub fn new(setlist: Setlist, config: &Config) -> Self {
        Self {
            setlist,
            padding_seconds: config.padding_seconds,
            intro_seconds: config.intro_seconds,
            numbering: config.add_numbering,
            export_dir: config.export_dir.clone(),
        }
    }

    pub fn setlist(&self) -> &Setlist {
        &self.setlist
    }

    /// Read commands until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<()> {
        writeln!(out, "🎼 {} songs loaded - type 'help' for commands", self.setlist.len())?;
        write!(out, "> ")?;
        out.flush()?;

        for line in input.lines() {
            let line = line?;
            match Command::parse(&line) {
                Ok(Some(command)) => {
                    debug!("Shell command: {:?}", command);
                    if self.execute(command, &mut out)? == Flow::Quit {
                        return Ok(());
                    }
                }
                Ok(None) => {}
                Err(message) => writeln!(out, "⚠️  {}", message)?,
            }
            write!(out, "> ")?;
            out.flush()?;
        }

        writeln!(out)?;
        Ok(())
    }

    /// Run one command. Setlist refusals are reported to `out`, not returned;
    /// only a failing writer is an error.
    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow> {
        match command {
            Command::Add(path) => {
                if path.is_dir() {
                    let added = self.setlist.add_directory(&path);
                    report(out, added.map(|n| format!("Added {} songs from {}", n, path.display())))?;
                } else {
                    let added = self.setlist.add_from_file(&path);
                    let message = added.map(|index| {
                        format!("Added #{}: {}", index + 1, self.setlist.songs()[index].title())
                    });
                    report(out, message)?;
                }
            }
            Command::Remove(index) => {
                let removed = self.setlist.remove(index);
                report(out, removed.map(|entry| format!("Removed {}", entry.title())))?;
            }
            Command::Move { from, to } => {
                let moved = self.setlist.reorder(from, to);
                report(out, moved.map(|_| format!("Moved #{} to #{}", from + 1, to + 1)))?;
            }
            Command::Title { song, text } => {
                let updated = self.setlist.update_title(song, &text);
                report(out, updated.map(|_| format!("#{} is now '{}'", song + 1, text)))?;
            }
            Command::Part { song, line, text } => {
                let updated = self.setlist.update_title_line(song, line, &text);
                report(out, updated.map(|_| format!("#{} part {} is now '{}'", song + 1, line + 1, text)))?;
            }
            Command::List => write_setlist(out, &self.setlist)?,
            Command::Total => self.write_total(out)?,
            Command::Padding(seconds) => {
                self.padding_seconds = seconds;
                self.write_total(out)?;
            }
            Command::Intro(seconds) => {
                self.intro_seconds = seconds;
                self.write_total(out)?;
            }
            Command::Numbering(on) => {
                self.numbering = on;
                writeln!(out, "Numbering {}", if on { "on" } else { "off" })?;
            }
            Command::Export(dir) => {
                let Some(dir) = dir.or_else(|| self.export_dir.clone()) else {
                    writeln!(out, "⚠️  No export folder given and none configured")?;
                    return Ok(Flow::Continue);
                };
                self.export(&dir, out)?;
                self.export_dir = Some(dir);
            }
            Command::Clear => {
                self.setlist.clear();
                writeln!(out, "Setlist cleared")?;
            }
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn timing(&self) -> (u64, u64) {
        (
            clamp_seconds("padding", self.padding_seconds),
            clamp_seconds("intro", self.intro_seconds),
        )
    }

    fn write_total<W: Write>(&self, out: &mut W) -> Result<()> {
        let (padding, intro) = self.timing();
        writeln!(
            out,
            "⏱️  Total: {} ({} songs, {}s padding, {}s intro)",
            self.setlist.total_duration(padding, intro),
            self.setlist.len(),
            padding,
            intro
        )?;
        Ok(())
    }

    fn export<W: Write>(&self, dir: &Path, out: &mut W) -> Result<()> {
        match self.setlist.export_to_folder(dir, self.numbering) {
            Ok(report) => {
                let numbering = if self.numbering { " with numbering" } else { "" };
                writeln!(
                    out,
                    "✅ Exported {} files to {}{} ({} with edits)",
                    report.total(),
                    dir.display(),
                    numbering,
                    report.reconciled
                )?;
            }
            Err(e) => writeln!(out, "❌ Export failed: {}", e)?,
        }
        Ok(())
    }
}

fn report<W: Write>(out: &mut W, outcome: crate::error::Result<String>) -> Result<()> {
    match outcome {
        Ok(message) => writeln!(out, "{}", message)?,
        Err(e) => writeln!(out, "⚠️  {}", e)?,
    }
    Ok(())
}

/// Print the setlist as numbered cards. Edited titles get a `*`.
pub fn write_setlist<W: Write>(out: &mut W, setlist: &Setlist) -> Result<()> {
    if setlist.is_empty() {
        writeln!(out, "No songs yet. Add some .abc files to get started!")?;
        return Ok(());
    }

    for entry in setlist.songs() {
        let marker = if entry.title_edited() { " *" } else { "" };
        let minutes = entry.duration_seconds() / 60;
        let seconds = entry.duration_seconds() % 60;
        writeln!(
            out,
            "{:>2}. {}{}  [{}:{:02}]",
            entry.order() + 1,
            entry.title(),
            marker,
            minutes,
            seconds
        )?;
        writeln!(out, "    Instruments: {}", entry.instruments().join(", "))?;
        if entry.title_lines().len() > 1 {
            for (k, line) in entry.title_lines().iter().enumerate() {
                let marker = if line.title_edited() { " *" } else { "" };
                writeln!(out, "    Part {}: {}{}", k + 1, line.full_text(), marker)?;
            }
        }
        writeln!(out, "    {}", entry.filename())?;
    }
    Ok(())
}
