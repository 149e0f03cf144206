use std::borrow::Cow;

/// How a song file's bytes map to text. Older ABC collections are often
/// Latin-1, so anything that isn't valid UTF-8 is read one char per byte.
/// Line breaks sit at the same positions either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
}

impl TextEncoding {
    pub fn detect(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(_) => TextEncoding::Utf8,
            Err(_) => TextEncoding::Latin1,
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Cow<'_, str> {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes),
            TextEncoding::Latin1 => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    /// Bytes for text written back into a file of this encoding. Latin-1 text
    /// with chars past U+00FF can't be represented and goes out as UTF-8.
    pub fn encode(self, text: &str) -> Cow<'_, [u8]> {
        if self == TextEncoding::Latin1 {
            let latin1: Option<Vec<u8>> = text.chars().map(|c| u8::try_from(c).ok()).collect();
            if let Some(bytes) = latin1 {
                return Cow::Owned(bytes);
            }
        }
        Cow::Borrowed(text.as_bytes())
    }
}
