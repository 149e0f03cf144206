use std::path::PathBuf;

/// One line typed into the shell. Positions are 1-based here and turned into
/// indices before they reach the setlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(PathBuf),
    Remove(usize),
    Move { from: usize, to: usize },
    Title { song: usize, text: String },
    Part { song: usize, line: usize, text: String },
    List,
    Total,
    Padding(i64),
    Intro(i64),
    Numbering(bool),
    Export(Option<PathBuf>),
    Clear,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands (positions start at 1):
  add <file|folder>         import a song, or every .abc file in a folder
  remove <n>                drop song n
  move <from> <to>          move a song; the target counts after it is taken out
  title <n> <text>          rename song n
  part <n> <k> <text>       replace title line k of song n
  list                      show the setlist
  total                     show the running time
  padding <secs>            gap between songs
  intro <secs>              time before the first song
  numbering on|off          prefix exported files with 01_, 02_, ...
  export [folder]           write the setlist out
  clear                     empty the setlist
  help                      this text
  quit                      leave";

impl Command {
    /// Parse a shell line. Blank lines and `#` comments give `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (word, rest) = split_word(line);
        let command = match word.to_ascii_lowercase().as_str() {
            "add" => Command::Add(PathBuf::from(required(rest, "add <file|folder>")?)),
            "remove" | "rm" => Command::Remove(position(rest)?),
            "move" | "mv" => {
                let (from, rest) = split_word(rest);
                let (to, extra) = split_word(rest);
                if !extra.is_empty() {
                    return Err("usage: move <from> <to>".to_string());
                }
                Command::Move {
                    from: position(from)?,
                    to: position(to)?,
                }
            }
            "title" => {
                let (song, text) = split_word(rest);
                Command::Title {
                    song: position(song)?,
                    text: required(text, "title <n> <text>")?.to_string(),
                }
            }
            "part" => {
                let (song, rest) = split_word(rest);
                let (line, text) = split_word(rest);
                Command::Part {
                    song: position(song)?,
                    line: position(line)?,
                    text: required(text, "part <n> <k> <text>")?.to_string(),
                }
            }
            "list" | "ls" => Command::List,
            "total" => Command::Total,
            "padding" => Command::Padding(seconds(rest)?),
            "intro" => Command::Intro(seconds(rest)?),
            "numbering" => match rest.to_ascii_lowercase().as_str() {
                "on" | "yes" | "true" => Command::Numbering(true),
                "off" | "no" | "false" => Command::Numbering(false),
                _ => return Err("usage: numbering on|off".to_string()),
            },
            "export" => Command::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "clear" => Command::Clear,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("unknown command '{}' (try 'help')", other)),
        };

        Ok(Some(command))
    }
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim_start()),
        None => (text, ""),
    }
}

fn required<'a>(text: &'a str, usage: &str) -> Result<&'a str, String> {
    if text.is_empty() {
        Err(format!("usage: {}", usage))
    } else {
        Ok(text)
    }
}

/// 1-based position to 0-based index
fn position(word: &str) -> Result<usize, String> {
    match word.parse::<usize>() {
        Ok(0) => Err("positions start at 1".to_string()),
        Ok(n) => Ok(n - 1),
        Err(_) => Err(format!("'{}' is not a position", word)),
    }
}

fn seconds(word: &str) -> Result<i64, String> {
    word.trim()
        .parse::<i64>()
        .map_err(|_| format!("'{}' is not a number of seconds", word.trim()))
}
