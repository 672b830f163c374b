/// One structural event recognized on a page.
///
/// The parser emits these in line order; the ingestion session folds them
/// into database rows. Consumers must match all variants without a
/// wildcard arm, so that adding a variant breaks at compile time instead
/// of being silently skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// A book title line, e.g. "Book of Apollo" or "阿波罗之预言书".
    BookStart { title: String },
    /// A chapter header line, e.g. "Chapter 7" or "七章".
    ChapterStart { title: String },
    /// A verse line. `key` is the `N/M.K` token from the source text;
    /// `None` marks a continuation line belonging to the open verse.
    Verse { key: Option<String>, text: String },
    /// A footnote line. `key` is the note's integer marker; `None` marks
    /// a continuation line belonging to the open note.
    Note { key: Option<String>, text: String },
    /// An image plate marker, e.g. "i003 Divine throne". The key is the
    /// canonical `IMG` form derived from the plate token.
    ImageRef { key: String, caption: String },
    /// Emitted once at the start of every parsed page.
    PageBreak { page_number: i32 },
}
