// abc-setlist Library - core modules for putting an ABC song set together
// Modular design: the setlist never reads files or parses notation itself

pub mod config;     // settings and preferences
pub mod error;      // what can go wrong, in one enum
pub mod export;     // folder export with edit reconciliation
pub mod notation;   // title/instrument extraction + duration parser
pub mod repository; // where song text comes from
pub mod setlist;    // the ordered song list and show timing
pub mod shell;      // line-based command front end

// Export the stuff other modules actually use
pub use config::Config;
pub use error::{Result, SetlistError};
pub use export::ExportReport;
pub use notation::{AbcParser, NotationParser, TextEncoding, TitleLine};
pub use repository::{ContentReader, FileRepository};
pub use setlist::{Setlist, ShowDuration, SongEntry};
