// Show timing - how long the whole set runs, gaps and intro included

use std::fmt;

use serde::Serialize;

/// Total show length. Displays as `m:ss`, or `h:mm:ss` once it passes an hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub struct ShowDuration(u64);

impl ShowDuration {
    pub fn from_secs(seconds: u64) -> Self {
        Self(seconds)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShowDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 3600;
        let minutes = (self.0 % 3600) / 60;
        let seconds = self.0 % 60;

        if hours > 0 {
            write!(f, "{}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            write!(f, "{}:{:02}", minutes, seconds)
        }
    }
}

/// intro + every song + one padding gap between each pair of songs.
/// Padding never goes before the first song or after the last.
pub fn total_seconds<I>(song_seconds: I, padding_seconds: u64, intro_seconds: u64) -> u64
where
    I: IntoIterator<Item = u32>,
{
    let mut count: u64 = 0;
    let mut total = intro_seconds;

    for seconds in song_seconds {
        total = total.saturating_add(u64::from(seconds));
        count += 1;
    }

    // absurd settings pin the total at u64::MAX instead of overflowing
    total.saturating_add(padding_seconds.saturating_mul(count.saturating_sub(1)))
}
