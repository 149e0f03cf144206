// Setlist - the ordered list of songs for a show
// Owns every mutation so the order numbers and edit flags can't drift

mod duration;
mod entry;

pub use duration::{total_seconds, ShowDuration};
pub use entry::SongEntry;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, SetlistError};
use crate::export::{export_songs, ExportReport};
use crate::notation::{
    extract_instruments, extract_title_lines, AbcParser, NotationParser, TextEncoding,
};
use crate::repository::{ContentReader, FileRepository};

/// File extension picked up by folder imports
pub const SONG_EXTENSION: &str = "abc";

pub struct Setlist {
    songs: Vec<SongEntry>,
    reader: Box<dyn ContentReader>,
    parser: Box<dyn NotationParser>,
}

impl Setlist {
    /// Empty setlist reading `.abc` files from disk
    pub fn new() -> Self {
        Self::with_collaborators(Box::new(FileRepository::new()), Box::new(AbcParser::new()))
    }

    pub fn with_collaborators(
        reader: Box<dyn ContentReader>,
        parser: Box<dyn NotationParser>,
    ) -> Self {
        Self {
            songs: Vec::new(),
            reader,
            parser,
        }
    }

    /// Import a song and append it. Returns the new entry's index.
    ///
    /// Fails without touching the list when the file is missing or unreadable,
    /// or when the parser finds no title or no playing time.
    pub fn add_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        match self.build_entry(path) {
            Ok(entry) => {
                info!(
                    "Added '{}' ({}s) to setlist from {}",
                    entry.title(),
                    entry.duration_seconds(),
                    path.display()
                );
                self.songs.push(entry);
                Ok(self.songs.len() - 1)
            }
            Err(e) => {
                warn!("Rejected {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    fn build_entry(&self, path: &Path) -> Result<SongEntry> {
        let content = self.reader.read_file(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let encoding = TextEncoding::detect(&content);
        if encoding != TextEncoding::Utf8 {
            debug!("{} is not UTF-8, reading it as {:?}", filename, encoding);
        }
        let text = encoding.decode(&content);

        let parsed = self.parser.parse(&filename, &text)?;
        if parsed.title.is_empty() {
            return Err(SetlistError::invalid(&filename, "empty title"));
        }
        if parsed.duration_seconds == 0 {
            return Err(SetlistError::invalid(&filename, "duration is zero"));
        }

        let title_lines = extract_title_lines(&text);
        let instruments = extract_instruments(&text);
        drop(text);

        Ok(SongEntry::new(
            path,
            content,
            encoding,
            parsed.title,
            parsed.duration_seconds,
            title_lines,
            instruments,
            self.songs.len(),
        ))
    }

    /// Add every `.abc` file under `dir`, in path order. Files that fail to
    /// import are skipped. Returns how many songs were added.
    pub fn add_directory<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(SetlistError::NotFound(dir.to_path_buf()));
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_song_file(path))
            .collect();
        paths.sort();

        let added = paths
            .iter()
            .filter(|path| self.add_from_file(path).is_ok())
            .count();

        info!("Imported {} of {} songs from {}", added, paths.len(), dir.display());
        Ok(added)
    }

    /// Remove the song at `index` and hand it back.
    pub fn remove(&mut self, index: usize) -> Result<SongEntry> {
        self.check_index(index)?;

        let entry = self.songs.remove(index);
        self.renumber();
        info!("Removed '{}' from setlist", entry.title());
        Ok(entry)
    }

    /// Move the song at `old_index` so it ends up at `new_index`.
    ///
    /// The entry is taken out first and `new_index` is applied to the shortened
    /// list, so moving right lands one slot before the entry that used to sit at
    /// `new_index`. Equal indices do nothing.
    pub fn reorder(&mut self, old_index: usize, new_index: usize) -> Result<()> {
        self.check_index(old_index)?;
        self.check_index(new_index)?;
        if old_index == new_index {
            return Ok(());
        }

        let entry = self.songs.remove(old_index);
        self.songs.insert(new_index, entry);
        self.renumber();
        info!("Moved song from position {} to {}", old_index, new_index);
        Ok(())
    }

    /// Set the display title. Title lines are left alone.
    pub fn update_title(&mut self, index: usize, title: &str) -> Result<()> {
        self.check_index(index)?;

        let entry = &mut self.songs[index];
        entry.set_title(title);
        debug!("Title of song {} is now '{}' (edited: {})", index, title, entry.title_edited());
        Ok(())
    }

    /// Replace the text of one title line; the song's instrument list is
    /// rebuilt from all its lines afterwards.
    pub fn update_title_line(&mut self, song_index: usize, line_index: usize, text: &str) -> Result<()> {
        self.check_index(song_index)?;

        let entry = &mut self.songs[song_index];
        let len = entry.title_lines().len();
        if !entry.set_title_line(line_index, text) {
            return Err(SetlistError::IndexOutOfRange { index: line_index, len });
        }
        debug!("Title line {} of song {} is now '{}'", line_index, song_index, text);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.songs.clear();
        info!("Cleared setlist");
    }

    pub fn songs(&self) -> &[SongEntry] {
        &self.songs
    }

    pub fn get(&self, index: usize) -> Option<&SongEntry> {
        self.songs.get(index)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Length of the whole show. Callers clamp negative settings to zero first.
    pub fn total_duration(&self, padding_seconds: u64, intro_seconds: u64) -> ShowDuration {
        let seconds = total_seconds(
            self.songs.iter().map(SongEntry::duration_seconds),
            padding_seconds,
            intro_seconds,
        );
        ShowDuration::from_secs(seconds)
    }

    /// Write the setlist into `folder`, optionally prefixing `01_`, `02_`, ...
    pub fn export_to_folder<P: AsRef<Path>>(&self, folder: P, numbering: bool) -> Result<ExportReport> {
        export_songs(&self.songs, folder.as_ref(), numbering)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.songs.len() {
            Ok(())
        } else {
            Err(SetlistError::IndexOutOfRange {
                index,
                len: self.songs.len(),
            })
        }
    }

    fn renumber(&mut self) {
        for (position, entry) in self.songs.iter_mut().enumerate() {
            entry.set_order(position);
        }
    }
}

impl Default for Setlist {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_song_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(SONG_EXTENSION))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::MemoryRepository;
    use std::fs;
    use tempfile::tempdir;

    /// Single-part song that plays for exactly `seconds`
    pub(crate) fn song_text(title: &str, seconds: usize) -> String {
        format!("X:1\nT:{}\nL:1/4\nQ:1/4=60\nK:C\n{}|\n", title, "C".repeat(seconds))
    }

    pub(crate) const BAND_SONG: &str = "X:1\nT:Shire Dance [Lute] (1:04)\nL:1/4\nQ:1/4=60\nK:C\nCDEF|\n\
X:2\nT:Shire Dance [Flute]\n%%part-name Flute\nL:1/4\nQ:1/4=60\nK:C\nCDEF|CDEF|\n";

    pub(crate) fn setlist_with(files: &[(&str, String)]) -> Setlist {
        let mut repo = MemoryRepository::new();
        for (path, content) in files {
            repo.insert(*path, content.clone());
        }
        Setlist::with_collaborators(Box::new(repo), Box::new(AbcParser::new()))
    }

    fn abcd() -> Setlist {
        let files: Vec<(&str, String)> = ["songs/a.abc", "songs/b.abc", "songs/c.abc", "songs/d.abc"]
            .into_iter()
            .zip(["a", "b", "c", "d"])
            .map(|(path, title)| (path, song_text(title, 10)))
            .collect();

        let mut setlist = setlist_with(&files);
        for (path, _) in &files {
            setlist.add_from_file(path).unwrap();
        }
        setlist
    }

    fn titles(setlist: &Setlist) -> Vec<&str> {
        setlist.songs().iter().map(SongEntry::title).collect()
    }

    fn assert_dense_order(setlist: &Setlist) {
        for (index, entry) in setlist.songs().iter().enumerate() {
            assert_eq!(entry.order(), index);
        }
    }

    #[test]
    fn test_add_from_file_builds_entry() {
        let mut setlist = setlist_with(&[("music/shire.abc", BAND_SONG.to_string())]);
        let index = setlist.add_from_file("music/shire.abc").unwrap();

        let entry = &setlist.songs()[index];
        assert_eq!(index, 0);
        assert_eq!(entry.filename(), "shire.abc");
        assert_eq!(entry.original_path(), Path::new("music/shire.abc"));
        assert_eq!(entry.original_content(), BAND_SONG.as_bytes());
        assert_eq!(entry.encoding(), TextEncoding::Utf8);
        assert_eq!(entry.title(), "Shire Dance [Lute] (1:04)");
        assert_eq!(entry.duration_seconds(), 8);
        assert_eq!(entry.title_lines().len(), 2);
        assert_eq!(entry.instruments(), ["Lute", "Flute"]);
        assert_eq!(entry.order(), 0);
        assert!(!entry.title_edited());
        assert!(!entry.has_edits());
    }

    #[test]
    fn test_add_missing_file_leaves_setlist_unchanged() {
        let mut setlist = setlist_with(&[]);
        let err = setlist.add_from_file("nowhere.abc").unwrap_err();
        assert!(matches!(err, SetlistError::NotFound(_)));
        assert!(setlist.is_empty());
    }

    #[test]
    fn test_add_rejects_untitled_or_silent_songs() {
        let mut setlist = setlist_with(&[
            ("untitled.abc", "X:1\nL:1/4\nK:C\nCDEF|\n".to_string()),
            ("silent.abc", "X:1\nT:Silent\nK:C\n".to_string()),
        ]);
        assert!(matches!(
            setlist.add_from_file("untitled.abc"),
            Err(SetlistError::InvalidFormat { .. })
        ));
        assert!(matches!(
            setlist.add_from_file("silent.abc"),
            Err(SetlistError::InvalidFormat { .. })
        ));
        assert_eq!(setlist.len(), 0);
    }

    #[test]
    fn test_add_directory_picks_abc_files_in_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.abc"), song_text("B", 5)).unwrap();
        fs::write(dir.path().join("a.ABC"), song_text("A", 5)).unwrap();
        fs::write(dir.path().join("notes.txt"), song_text("Not a song", 5)).unwrap();
        fs::write(dir.path().join("broken.abc"), "no title here").unwrap();

        let mut setlist = Setlist::new();
        let added = setlist.add_directory(dir.path()).unwrap();

        assert_eq!(added, 2);
        assert_eq!(titles(&setlist), ["A", "B"]);
        assert_dense_order(&setlist);
    }

    #[test]
    fn test_add_directory_requires_a_directory() {
        let dir = tempdir().unwrap();
        let mut setlist = Setlist::new();
        assert!(matches!(
            setlist.add_directory(dir.path().join("missing")),
            Err(SetlistError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_renumbers() {
        let mut setlist = abcd();
        let removed = setlist.remove(1).unwrap();

        assert_eq!(removed.title(), "b");
        assert_eq!(titles(&setlist), ["a", "c", "d"]);
        assert_dense_order(&setlist);
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut setlist = abcd();
        assert!(matches!(
            setlist.remove(4),
            Err(SetlistError::IndexOutOfRange { index: 4, len: 4 })
        ));
        assert_eq!(titles(&setlist), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_reorder_right_lands_before_target() {
        let mut setlist = abcd();
        setlist.reorder(0, 2).unwrap();

        // "a" comes out first, then goes in at index 2 of [b, c, d]
        assert_eq!(titles(&setlist), ["b", "c", "a", "d"]);
        assert_dense_order(&setlist);
    }

    #[test]
    fn test_reorder_to_last_slot() {
        let mut setlist = abcd();
        setlist.reorder(1, 3).unwrap();
        assert_eq!(titles(&setlist), ["a", "c", "d", "b"]);
    }

    #[test]
    fn test_reorder_left() {
        let mut setlist = abcd();
        setlist.reorder(3, 0).unwrap();
        assert_eq!(titles(&setlist), ["d", "a", "b", "c"]);
        assert_dense_order(&setlist);
    }

    #[test]
    fn test_reorder_degenerate_calls_change_nothing() {
        let mut setlist = abcd();
        setlist.reorder(2, 2).unwrap();
        assert!(setlist.reorder(0, 4).is_err());
        assert!(setlist.reorder(9, 0).is_err());
        assert_eq!(titles(&setlist), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_order_stays_dense_through_mixed_operations() {
        let mut setlist = abcd();
        let mut seed: usize = 7;
        for step in 0..40 {
            seed = (seed * 31 + 11) % 97;
            match step % 3 {
                0 => {
                    let _ = setlist.reorder(seed % 5, (seed / 5) % 5);
                }
                1 if setlist.len() > 2 => {
                    let _ = setlist.remove(seed % 6);
                }
                _ => {
                    let _ = setlist.add_from_file("songs/a.abc");
                }
            }
            assert_dense_order(&setlist);
        }
    }

    #[test]
    fn test_update_title_tracks_edits() {
        let mut setlist = abcd();
        setlist.update_title(0, "Opener").unwrap();

        let entry = setlist.get(0).unwrap();
        assert_eq!(entry.title(), "Opener");
        assert_eq!(entry.original_title(), "a");
        assert!(entry.title_edited());
        assert_eq!(entry.title_lines()[0].full_text(), "a");

        setlist.update_title(0, "a").unwrap();
        assert!(!setlist.get(0).unwrap().title_edited());
        assert!(setlist.update_title(10, "x").is_err());
    }

    #[test]
    fn test_update_title_line_rebuilds_instruments() {
        let mut setlist = setlist_with(&[("shire.abc", BAND_SONG.to_string())]);
        setlist.add_from_file("shire.abc").unwrap();

        setlist.update_title_line(0, 1, "Shire Dance [Clarinet]").unwrap();
        let entry = setlist.get(0).unwrap();
        assert!(entry.title_lines()[1].title_edited());
        assert_eq!(entry.title_lines()[1].instrument(), "Clarinet");
        assert_eq!(entry.instruments(), ["Lute", "Clarinet"]);
        assert!(entry.has_edits());
        assert!(!entry.title_edited());
    }

    #[test]
    fn test_update_title_line_bad_indices() {
        let mut setlist = setlist_with(&[("shire.abc", BAND_SONG.to_string())]);
        setlist.add_from_file("shire.abc").unwrap();

        assert!(matches!(
            setlist.update_title_line(0, 2, "x"),
            Err(SetlistError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(setlist.update_title_line(1, 0, "x").is_err());
        assert!(!setlist.get(0).unwrap().has_edits());
    }

    #[test]
    fn test_instrument_dedup_differs_between_import_and_edit() {
        let content = "X:1\nT:Duet [Lute]\nL:1/4\nK:C\nCDEF|\nX:2\nT:Duet [Lute] (Part 2)\nL:1/4\nK:C\nCDEF|\n";
        let mut setlist = setlist_with(&[("duet.abc", content.to_string())]);
        setlist.add_from_file("duet.abc").unwrap();

        // import summary drops the repeated label
        assert_eq!(setlist.get(0).unwrap().instruments(), ["Lute", "Part 2"]);

        // the per-line rebuild keeps one label per line, repeats included
        setlist.update_title_line(0, 1, "Duet [Lute] again").unwrap();
        assert_eq!(setlist.get(0).unwrap().instruments(), ["Lute", "Lute"]);
    }

    #[test]
    fn test_total_duration() {
        let mut setlist = setlist_with(&[
            ("one.abc", song_text("One", 125)),
            ("two.abc", song_text("Two", 200)),
        ]);
        assert_eq!(setlist.total_duration(5, 10).as_secs(), 10);

        setlist.add_from_file("one.abc").unwrap();
        assert_eq!(setlist.total_duration(5, 10).as_secs(), 135);

        setlist.add_from_file("two.abc").unwrap();
        assert_eq!(setlist.total_duration(5, 10).as_secs(), 340);
    }

    #[test]
    fn test_latin1_song_imports_and_exports_unchanged() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("cafe.abc");
        let bytes: &[u8] = b"X:1\nT:Caf\xE9 [Lute]\nL:1/4\nQ:1/4=60\nK:C\nCDEF|\n";
        fs::write(&source, bytes).unwrap();

        let mut setlist = Setlist::new();
        setlist.add_from_file(&source).unwrap();

        let entry = setlist.get(0).unwrap();
        assert_eq!(entry.title(), "Café [Lute]");
        assert_eq!(entry.encoding(), TextEncoding::Latin1);
        assert_eq!(entry.instruments(), ["Lute"]);
        assert_eq!(entry.duration_seconds(), 4);

        let out = dir.path().join("show");
        setlist.export_to_folder(&out, true).unwrap();
        assert_eq!(fs::read(out.join("01_cafe.abc")).unwrap(), bytes);
    }

    #[test]
    fn test_huge_padding_saturates() {
        let mut setlist = abcd();
        setlist.remove(3).unwrap();

        let config = crate::config::Config {
            padding_seconds: i64::MAX,
            ..crate::config::Config::default()
        };
        let (padding, intro) = config.timing();
        assert_eq!(setlist.total_duration(padding, intro).as_secs(), u64::MAX);
        assert_eq!(setlist.total_duration(u64::MAX, u64::MAX).as_secs(), u64::MAX);
    }

    #[test]
    fn test_clear() {
        let mut setlist = abcd();
        setlist.clear();
        assert!(setlist.is_empty());
        assert_eq!(setlist.total_duration(5, 0).as_secs(), 0);
    }
}
