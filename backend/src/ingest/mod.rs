//! Text-to-structure reconstruction engine.
//!
//! A scanned book arrives as bare page text with no markup; the structure
//! (books, chapters, verses, footnotes, image plates) has to be inferred
//! line-by-line from the typographic conventions of the source. The page
//! parser turns one page's lines into a stream of typed events, and the
//! ingestion session folds those events into the archive database.

pub mod event;
pub mod parser;
pub mod consumer;
pub mod linker;

pub use event::PageEvent;
pub use parser::parse_page;
pub use consumer::IngestSession;
