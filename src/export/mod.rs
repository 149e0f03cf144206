// Export module - writes the setlist out as a folder of ABC files
// Untouched songs are written back byte for byte; edited ones get only their
// T: lines swapped, everything else passes through as it was imported

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, SetlistError};
use crate::notation::raw_lines;
use crate::setlist::SongEntry;

/// What an export run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// destination files, in setlist order
    pub written: Vec<PathBuf>,
    pub copied: usize,
    pub reconciled: usize,
}

impl ExportReport {
    pub fn total(&self) -> usize {
        self.written.len()
    }
}

/// File name for the song at 1-based `position`: `07_name.abc` with numbering,
/// the original name without.
pub fn destination_name(position: usize, filename: &str, numbering: bool) -> String {
    if numbering {
        format!("{:02}_{}", position, filename)
    } else {
        filename.to_string()
    }
}

/// Imported bytes with the edits folded back in.
///
/// Each title line remembers which source line it came from; that line is
/// replaced with `T:<text>` when the title line was edited, or with the song's
/// current title when it is the first title line and the song title was edited.
/// Replacements are encoded like the rest of the file; every other line goes
/// out byte for byte. Every output line ends in a single `\n`.
pub fn reconciled_content(entry: &SongEntry) -> Vec<u8> {
    let content = entry.original_content();
    let encoding = entry.encoding();
    let mut output = Vec::with_capacity(content.len() + 64);
    let mut title_lines = entry.title_lines().iter().enumerate().peekable();

    for (index, line) in raw_lines(content).enumerate() {
        match title_lines.next_if(|(_, title_line)| title_line.source_line() == index) {
            Some((_, title_line)) if title_line.title_edited() => {
                output.extend_from_slice(b"T:");
                output.extend_from_slice(&encoding.encode(title_line.full_text()));
            }
            Some((0, _)) if entry.title_edited() => {
                output.extend_from_slice(b"T:");
                output.extend_from_slice(&encoding.encode(entry.title()));
            }
            _ => output.extend_from_slice(line),
        }
        output.push(b'\n');
    }

    output
}

/// Write every song into `folder`, creating it (and any missing parents) first.
///
/// Stops at the first file that can't be written. Files written before the
/// failure stay on disk.
pub fn export_songs(songs: &[SongEntry], folder: &Path, numbering: bool) -> Result<ExportReport> {
    fs::create_dir_all(folder).map_err(|source| export_error(folder, source))?;

    let mut report = ExportReport::default();
    for (index, entry) in songs.iter().enumerate() {
        let destination = folder.join(destination_name(index + 1, entry.filename(), numbering));

        if entry.has_edits() {
            debug!("Reconciling edits for '{}' into {}", entry.title(), destination.display());
            fs::write(&destination, reconciled_content(entry))
                .map_err(|source| export_error(&destination, source))?;
            report.reconciled += 1;
        } else {
            debug!("Copying '{}' unchanged to {}", entry.title(), destination.display());
            fs::write(&destination, entry.original_content())
                .map_err(|source| export_error(&destination, source))?;
            report.copied += 1;
        }

        report.written.push(destination);
    }

    info!(
        "Exported {} songs to {} ({} edited, {} copied)",
        report.total(),
        folder.display(),
        report.reconciled,
        report.copied
    );
    Ok(report)
}

fn export_error(path: &Path, source: io::Error) -> SetlistError {
    warn!("Export failed at {}: {}", path.display(), source);
    SetlistError::Export {
        path: path.to_path_buf(),
        source,
    }
}
