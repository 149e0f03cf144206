// ABC duration estimator - works out how long a song plays from its notes
// Not a full ABC implementation: it reads just enough (lengths, tempo, meter,
// tuplets, repeats) to time a tune. Multi-part band files put every part in its
// own X: block, and since parts play together the longest one wins.

use std::collections::BTreeMap;

use tracing::debug;

use super::{classify_line, source_lines, LineKind};
use crate::error::{Result, SetlistError};

/// What the set list needs to know about a parsed song
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSong {
    pub title: String,
    pub duration_seconds: u32,
}

/// Turns raw notation text into a title and a play time.
pub trait NotationParser {
    fn parse(&self, filename: &str, content: &str) -> Result<ParsedSong>;
}

#[derive(Debug, Clone, Default)]
pub struct AbcParser;

impl AbcParser {
    pub fn new() -> Self {
        Self
    }
}

impl NotationParser for AbcParser {
    fn parse(&self, filename: &str, content: &str) -> Result<ParsedSong> {
        let title = source_lines(content)
            .find_map(|line| match classify_line(line) {
                LineKind::Title(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
                _ => None,
            })
            .ok_or_else(|| SetlistError::invalid(filename, "no title line"))?;

        let seconds = estimate_seconds(content);
        let duration_seconds = seconds.round();
        if duration_seconds < 1.0 {
            return Err(SetlistError::invalid(filename, "no playable notes (duration is zero)"));
        }

        debug!("Parsed '{}' from {}: {:.1}s", title, filename, seconds);
        Ok(ParsedSong {
            title,
            duration_seconds: duration_seconds as u32,
        })
    }
}

/// Tempo, meter and unit length in force for a tune. Lengths are in whole notes.
#[derive(Debug, Clone)]
struct TuneSettings {
    unit: Option<f64>,
    meter: f64,
    /// `None` means the beat is the unit note length (old `Q:120` style)
    beat: Option<f64>,
    bpm: f64,
}

impl Default for TuneSettings {
    fn default() -> Self {
        Self {
            unit: None,
            meter: 1.0,
            beat: Some(0.25),
            bpm: 120.0,
        }
    }
}

impl TuneSettings {
    fn unit_length(&self) -> f64 {
        self.unit
            .unwrap_or(if self.meter < 0.75 { 1.0 / 16.0 } else { 1.0 / 8.0 })
    }

    fn seconds_for(&self, whole_notes: f64) -> f64 {
        let beat = self.beat.unwrap_or_else(|| self.unit_length());
        whole_notes * 60.0 / (self.bpm * beat)
    }

    fn apply_field(&mut self, field: char, value: &str) {
        match field {
            'L' => {
                if let Some(unit) = parse_fraction(value).filter(|u| *u > 0.0) {
                    self.unit = Some(unit);
                }
            }
            'M' => {
                if let Some(meter) = parse_meter(value) {
                    self.meter = meter;
                }
            }
            'Q' => {
                if let Some((beat, bpm)) = parse_tempo(value) {
                    self.beat = beat;
                    self.bpm = bpm;
                }
            }
            _ => {}
        }
    }
}

/// Running time of one voice
#[derive(Debug, Clone, Default)]
struct VoiceClock {
    seconds: f64,
    section_start: f64,
    first_ending_start: Option<f64>,
    tuplet_left: u32,
    tuplet_factor: f64,
}

impl VoiceClock {
    fn advance(&mut self, settings: &TuneSettings, multiplier: f64) {
        let mut whole_notes = multiplier * settings.unit_length();
        if self.tuplet_left > 0 {
            whole_notes *= self.tuplet_factor;
            self.tuplet_left -= 1;
        }
        self.seconds += settings.seconds_for(whole_notes);
    }

    fn start_repeat(&mut self) {
        self.section_start = self.seconds;
        self.first_ending_start = None;
    }

    // play the section again, minus its first ending
    fn end_repeat(&mut self) {
        let replay_end = self.first_ending_start.unwrap_or(self.seconds);
        self.seconds += (replay_end - self.section_start).max(0.0);
        self.start_repeat();
    }
}

#[derive(Debug, Default)]
struct Tune {
    settings: TuneSettings,
    voices: BTreeMap<String, VoiceClock>,
    current_voice: String,
}

impl Tune {
    fn clock(&mut self) -> &mut VoiceClock {
        self.voices.entry(self.current_voice.clone()).or_default()
    }

    fn apply_field(&mut self, field: char, value: &str) {
        if field == 'V' {
            self.current_voice = value.split_whitespace().next().unwrap_or_default().to_string();
        } else {
            self.settings.apply_field(field, value);
        }
    }

    fn longest_voice(&self) -> f64 {
        self.voices.values().map(|v| v.seconds).fold(0.0, f64::max)
    }
}

fn estimate_seconds(content: &str) -> f64 {
    let mut longest: f64 = 0.0;
    let mut tune = Tune::default();

    for line in source_lines(content) {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.starts_with('%') {
            continue;
        }

        if let Some((field, value)) = field_line(line) {
            if field == 'X' {
                longest = longest.max(tune.longest_voice());
                tune = Tune::default();
            } else {
                tune.apply_field(field, value);
            }
            continue;
        }

        read_music_line(&mut tune, line);
    }

    longest.max(tune.longest_voice())
}

/// `K:value` style header/body field
fn field_line(line: &str) -> Option<(char, &str)> {
    let mut chars = line.chars();
    let field = chars.next()?;
    if field.is_ascii_alphabetic() && chars.next() == Some(':') {
        Some((field, line[2..].trim()))
    } else {
        None
    }
}

fn read_music_line(tune: &mut Tune, line: &str) {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '%' => break,
            '"' => i = skip_past(&chars, i + 1, '"'),
            '!' => i = skip_past(&chars, i + 1, '!'),
            '+' => i = skip_past(&chars, i + 1, '+'),
            '{' => i = skip_past(&chars, i + 1, '}'),
            '[' => i = read_bracket(tune, &chars, i),
            '(' => i = read_tuplet(tune, &chars, i),
            '|' => {
                i += 1;
                if chars.get(i) == Some(&':') {
                    tune.clock().start_repeat();
                    i += 1;
                } else if chars.get(i) == Some(&'1') {
                    let clock = tune.clock();
                    clock.first_ending_start = Some(clock.seconds);
                    i += 1;
                }
            }
            ':' => {
                while chars.get(i) == Some(&':') {
                    i += 1;
                }
                tune.clock().end_repeat();
            }
            'Z' | 'X' => {
                let (bars, next) = read_number(&chars, i + 1);
                let whole_notes = bars.unwrap_or(1) as f64 * tune.settings.meter;
                let seconds = tune.settings.seconds_for(whole_notes);
                tune.clock().seconds += seconds;
                i = next;
            }
            _ if is_note_start(c) => {
                let (multiplier, next) = read_note(&chars, i);
                let settings = tune.settings.clone();
                tune.clock().advance(&settings, multiplier);
                i = next;
            }
            _ => i += 1,
        }
    }
}

fn is_note_start(c: char) -> bool {
    matches!(c, 'A'..='G' | 'a'..='g' | 'z' | 'x' | '^' | '_' | '=')
}

/// Reads accidentals, pitch, octave marks and length; returns the length
/// multiplier and the index after the note.
fn read_note(chars: &[char], mut i: usize) -> (f64, usize) {
    while matches!(chars.get(i), Some('^' | '_' | '=')) {
        i += 1;
    }
    match chars.get(i) {
        Some(c) if matches!(c, 'A'..='G' | 'a'..='g' | 'z' | 'x') => i += 1,
        // stray accidental, no note
        _ => return (0.0, i),
    }
    while matches!(chars.get(i), Some(',' | '\'')) {
        i += 1;
    }
    read_length(chars, i)
}

fn read_length(chars: &[char], i: usize) -> (f64, usize) {
    let (numerator, mut i) = read_number(chars, i);
    let mut denominator = 1.0;
    while chars.get(i) == Some(&'/') {
        let (digits, next) = read_number(chars, i + 1);
        denominator *= digits.map(|d| d as f64).unwrap_or(2.0);
        i = next;
    }
    let numerator = numerator.unwrap_or(1) as f64;
    if denominator <= 0.0 {
        return (0.0, i);
    }
    (numerator / denominator, i)
}

fn read_number(chars: &[char], mut i: usize) -> (Option<u32>, usize) {
    let start = i;
    let mut value: u32 = 0;
    while let Some(digit) = chars.get(i).and_then(|c| c.to_digit(10)) {
        value = value.saturating_mul(10).saturating_add(digit);
        i += 1;
    }
    if i == start {
        (None, i)
    } else {
        (Some(value), i)
    }
}

fn skip_past(chars: &[char], from: usize, closer: char) -> usize {
    chars[from.min(chars.len())..]
        .iter()
        .position(|c| *c == closer)
        .map(|offset| from + offset + 1)
        .unwrap_or(chars.len())
}

/// `[` opens an inline field, a numbered ending, or a chord.
fn read_bracket(tune: &mut Tune, chars: &[char], i: usize) -> usize {
    let next = chars.get(i + 1).copied();
    let is_field = next.is_some_and(|c| c.is_ascii_alphabetic()) && chars.get(i + 2) == Some(&':');

    if is_field {
        let end = skip_past(chars, i + 1, ']');
        let inner: String = chars[i + 3..end.saturating_sub(1).max(i + 3)].iter().collect();
        if let Some(field) = next {
            tune.apply_field(field, inner.trim());
        }
        return end;
    }

    if let Some(digit) = next.filter(|c| c.is_ascii_digit()) {
        if digit == '1' {
            let clock = tune.clock();
            clock.first_ending_start = Some(clock.seconds);
        }
        return read_number(chars, i + 1).1;
    }

    if next == Some('|') {
        return i + 2;
    }

    // chord: timed by its first note, scaled by a length after the closing bracket
    let close = skip_past(chars, i + 1, ']');
    let mut first_note = None;
    let mut j = i + 1;
    while j < close.saturating_sub(1) {
        if is_note_start(chars[j]) {
            let (multiplier, after) = read_note(chars, j);
            first_note.get_or_insert(multiplier);
            j = after;
        } else {
            j += 1;
        }
    }
    let (outer, after) = read_length(chars, close);

    if let Some(multiplier) = first_note {
        let settings = tune.settings.clone();
        tune.clock().advance(&settings, multiplier * outer);
    }
    after
}

/// `(p`, `(p:q` or `(p:q:r` tuplet; a bare `(` is a slur and is skipped.
fn read_tuplet(tune: &mut Tune, chars: &[char], i: usize) -> usize {
    let (p, mut next) = read_number(chars, i + 1);
    let Some(p) = p.filter(|p| *p > 0) else {
        return i + 1;
    };

    let mut q = None;
    let mut r = None;
    if chars.get(next) == Some(&':') {
        let (value, after) = read_number(chars, next + 1);
        q = value;
        next = after;
        if chars.get(next) == Some(&':') {
            let (value, after) = read_number(chars, next + 1);
            r = value;
            next = after;
        }
    }

    // TODO: odd tuplets in compound meters should default to q=3
    let q = q.unwrap_or(match p {
        2 | 4 | 8 => 3,
        _ => 2,
    });

    let clock = tune.clock();
    clock.tuplet_factor = q as f64 / p as f64;
    clock.tuplet_left = r.unwrap_or(p);
    next
}

fn parse_fraction(value: &str) -> Option<f64> {
    let value = value.trim();
    match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num
                .split('+')
                .map(|part| part.trim().parse::<f64>())
                .sum::<std::result::Result<f64, _>>()
                .ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den > 0.0).then(|| num / den)
        }
        None => value.parse().ok(),
    }
}

fn parse_meter(value: &str) -> Option<f64> {
    match value.trim() {
        "C" | "C|" => Some(1.0),
        other => parse_fraction(other).filter(|m| *m > 0.0),
    }
}

/// `1/4=120`, `"Allegro" 3/8=80` or the legacy bare `120`.
fn parse_tempo(value: &str) -> Option<(Option<f64>, f64)> {
    let mut unquoted = String::new();
    let mut in_quotes = false;
    for c in value.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            unquoted.push(c);
        }
    }

    match unquoted.split_once('=') {
        Some((beats, bpm)) => {
            let beat: f64 = beats
                .split_whitespace()
                .map(parse_fraction)
                .sum::<Option<f64>>()?;
            let bpm: f64 = bpm.split_whitespace().next()?.parse().ok()?;
            (beat > 0.0 && bpm > 0.0).then_some((Some(beat), bpm))
        }
        None => {
            let bpm: f64 = unquoted.split_whitespace().next()?.parse().ok()?;
            (bpm > 0.0).then_some((None, bpm))
        }
    }
}
