//! Line-oriented page parser.
//!
//! Applies an ordered set of recognizers to each line of a page and emits
//! `PageEvent`s. The order is a tie-break policy: most specific first, so
//! a verse line can never be mistaken for a note even though its text may
//! contain a parenthesized number.

use regex::Regex;
use lazy_static::lazy_static;

use crate::ingest::event::PageEvent;
use crate::logger::debug;

lazy_static! {
    // "Book of Apollo"
    static ref RE_BOOK_LATIN: Regex = Regex::new(r"^Book of .+$").unwrap();
    // "阿波罗之预言书"
    static ref RE_BOOK_CJK: Regex = Regex::new(r"^.+之.+书$").unwrap();
    // "Chapter 7"
    static ref RE_CHAPTER_LATIN: Regex = Regex::new(r"^Chapter\s+\d+\b").unwrap();
    // "七章", "十二章"
    static ref RE_CHAPTER_CJK: Regex = Regex::new(r"^[〇零一二三四五六七八九十百千]+章").unwrap();
    // "14/7.1 In the beginning..." - book/chapter.verse key, text optional
    static ref RE_VERSE: Regex = Regex::new(r"^(\d+/\d+\.\d+)(?:\s+(.*))?$").unwrap();
    // "(1) This refers to creation" / "1) This refers to creation".
    // Both patterns are anchored at the line start: a note marker is only
    // accepted when the leading characters confirm it, so a verse or page
    // number that merely contains "(1)" further in does not false-match.
    static ref RE_NOTE_PAREN: Regex = Regex::new(r"^\((\d+)\)\s*(.*)$").unwrap();
    static ref RE_NOTE_SUFFIX: Regex = Regex::new(r"^(\d+)\)\s*(.*)$").unwrap();
    // "i003 Divine throne" - lowercase i, exactly three digits, a caption.
    // The \s after the digit group rejects longer runs such as "i9999".
    static ref RE_IMAGE: Regex = Regex::new(r"^i(\d{3})\s+(.+)$").unwrap();
}

/// True for both surface forms of a book title line.
pub fn is_book_title_line(line: &str) -> bool {
    RE_BOOK_LATIN.is_match(line) || RE_BOOK_CJK.is_match(line)
}

/// True for both surface forms of a chapter header line.
pub fn is_chapter_header_line(line: &str) -> bool {
    RE_CHAPTER_LATIN.is_match(line) || RE_CHAPTER_CJK.is_match(line)
}

pub fn is_verse_line(line: &str) -> bool {
    RE_VERSE.is_match(line)
}

pub fn is_image_marker_line(line: &str) -> bool {
    RE_IMAGE.is_match(line)
}

/// Where the parser currently is in the document structure. Drives the
/// interpretation of continuation lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    OutsideBook,
    InBook,
    InChapter,
    InVerse,
    InNote,
}

/// Parse one page's lines into a stream of structural events.
///
/// Always emits `PageBreak` first. Blank lines are skipped; lines that
/// match no recognizer are folded into the open verse or note as
/// continuations, or dropped when there is nothing open to receive them.
///
/// The state starts at `OutsideBook` on every call and lives in a local
/// variable, so the parser carries nothing across pages and is reentrant
/// for concurrent page-level callers. All cross-page continuity is the
/// ingestion session's concern.
pub fn parse_page(lines: &[&str], page_number: i32) -> Vec<PageEvent> {
    let mut events = Vec::new();
    let mut state = ParserState::OutsideBook;

    events.push(PageEvent::PageBreak { page_number });

    for raw_line in lines {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if is_book_title_line(line) {
            events.push(PageEvent::BookStart { title: line.to_string() });
            state = ParserState::InBook;
            continue;
        }

        if is_chapter_header_line(line) {
            events.push(PageEvent::ChapterStart { title: line.to_string() });
            state = ParserState::InChapter;
            continue;
        }

        // A verse key always wins over the note and image recognizers.
        if let Some(caps) = RE_VERSE.captures(line) {
            let key = caps.get(1).map(|m| m.as_str().to_string());
            let text = caps.get(2).map(|m| m.as_str()).unwrap_or("").to_string();
            events.push(PageEvent::Verse { key, text });
            state = ParserState::InVerse;
            continue;
        }

        if let Some(caps) = RE_NOTE_PAREN.captures(line).or_else(|| RE_NOTE_SUFFIX.captures(line)) {
            let key = caps.get(1).map(|m| m.as_str().to_string());
            let text = caps.get(2).map(|m| m.as_str()).unwrap_or("").to_string();
            events.push(PageEvent::Note { key, text });
            state = ParserState::InNote;
            continue;
        }

        if let Some(caps) = RE_IMAGE.captures(line) {
            let key = format!("IMG{}", &caps[1]);
            let caption = caps[2].to_string();
            events.push(PageEvent::ImageRef { key, caption });
            continue;
        }

        // Continuation line: belongs to the open verse or note, if any.
        match state {
            ParserState::InVerse => {
                events.push(PageEvent::Verse { key: None, text: line.to_string() });
            }
            ParserState::InNote => {
                events.push(PageEvent::Note { key: None, text: line.to_string() });
            }
            ParserState::OutsideBook | ParserState::InBook | ParserState::InChapter => {
                debug(&format!("Page {}: dropping unmatched line: {}", page_number, line));
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_break_is_always_first() {
        let events = parse_page(&[], 42);
        assert_eq!(events, vec![PageEvent::PageBreak { page_number: 42 }]);
    }

    #[test]
    fn test_book_title_latin_and_cjk() {
        let events = parse_page(&["Book of Apollo", "阿波罗之预言书"], 1);
        assert_eq!(events[1], PageEvent::BookStart { title: "Book of Apollo".to_string() });
        assert_eq!(events[2], PageEvent::BookStart { title: "阿波罗之预言书".to_string() });
    }

    #[test]
    fn test_chapter_header_latin_and_cjk() {
        let events = parse_page(&["Chapter 7", "七章"], 1);
        assert_eq!(events[1], PageEvent::ChapterStart { title: "Chapter 7".to_string() });
        assert_eq!(events[2], PageEvent::ChapterStart { title: "七章".to_string() });
    }

    #[test]
    fn test_verse_line() {
        let events = parse_page(&["14/7.1 In the beginning..."], 1);
        assert_eq!(events[1], PageEvent::Verse {
            key: Some("14/7.1".to_string()),
            text: "In the beginning...".to_string(),
        });
    }

    #[test]
    fn test_note_line_paren_and_suffix_forms() {
        let events = parse_page(&["(1) This refers to creation", "2) Another note"], 1);
        assert_eq!(events[1], PageEvent::Note {
            key: Some("1".to_string()),
            text: "This refers to creation".to_string(),
        });
        assert_eq!(events[2], PageEvent::Note {
            key: Some("2".to_string()),
            text: "Another note".to_string(),
        });
    }

    #[test]
    fn test_verse_wins_over_note_and_image() {
        // The text of a verse may contain note-like or image-like tokens;
        // the key at the line start decides.
        let events = parse_page(&["3/2.4 And he said (1) unto them"], 1);
        assert!(matches!(events[1], PageEvent::Verse { .. }));
    }

    #[test]
    fn test_image_marker_requires_exactly_three_digits() {
        let events = parse_page(&["i02 x", "i9999 x", "i002 x"], 1);
        // The two malformed markers fall through to the drop branch since
        // no verse or note is open.
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], PageEvent::ImageRef {
            key: "IMG002".to_string(),
            caption: "x".to_string(),
        });
    }

    #[test]
    fn test_continuation_folds_into_open_verse() {
        let events = parse_page(&["14/7.1 a", "b"], 1);
        assert_eq!(events[2], PageEvent::Verse { key: None, text: "b".to_string() });
    }

    #[test]
    fn test_continuation_folds_into_open_note() {
        let events = parse_page(&["(1) a", "b"], 1);
        assert_eq!(events[2], PageEvent::Note { key: None, text: "b".to_string() });
    }

    #[test]
    fn test_unmatched_line_without_context_is_dropped() {
        let events = parse_page(&["just some stray text"], 1);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_image_after_note_does_not_reset_note_state() {
        // An image marker between note lines leaves the note open for
        // continuations.
        let events = parse_page(&["(1) a", "i003 Divine throne", "b"], 1);
        assert_eq!(events[3], PageEvent::Note { key: None, text: "b".to_string() });
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let events = parse_page(&["", "   ", "14/7.1 a"], 5);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let lines = vec![
            "Book of Apollo",
            "Chapter 7",
            "14/7.1 In the beginning...",
            "(1) This refers to creation",
            "i003 Divine throne",
            "14/7.2 And it was good",
        ];
        let a = parse_page(&lines, 1);
        let b = parse_page(&lines, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_state_resets_between_calls() {
        // End the first page inside a verse. The second page's stray line
        // must be dropped, not treated as a continuation.
        let _ = parse_page(&["14/7.1 a"], 1);
        let events = parse_page(&["stray text"], 2);
        assert_eq!(events, vec![PageEvent::PageBreak { page_number: 2 }]);
    }

    #[test]
    fn test_end_to_end_scenario_events() {
        let lines = vec![
            "Book of Apollo",
            "Chapter 7",
            "14/7.1 In the beginning...",
            "(1) This refers to creation",
            "i003 Divine throne",
            "14/7.2 And it was good",
        ];
        let events = parse_page(&lines, 1);
        assert_eq!(events, vec![
            PageEvent::PageBreak { page_number: 1 },
            PageEvent::BookStart { title: "Book of Apollo".to_string() },
            PageEvent::ChapterStart { title: "Chapter 7".to_string() },
            PageEvent::Verse { key: Some("14/7.1".to_string()), text: "In the beginning...".to_string() },
            PageEvent::Note { key: Some("1".to_string()), text: "This refers to creation".to_string() },
            PageEvent::ImageRef { key: "IMG003".to_string(), caption: "Divine throne".to_string() },
            PageEvent::Verse { key: Some("14/7.2".to_string()), text: "And it was good".to_string() },
        ]);
    }
}
