//! Page category heuristics.
//!
//! Decides which pages the structure parser applies to. The source book
//! mixes body text with front matter, a long table of contents, and full
//! plate pages; running the structure recognizers over a TOC page would
//! produce garbage chapters, so pages are bucketed first.

use serde::{Serialize, Deserialize};

use crate::helpers::is_dot_leader_line;
use crate::ingest::parser::{
    is_book_title_line, is_chapter_header_line, is_image_marker_line, is_verse_line,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageCategory {
    #[serde(rename = "body_text")]
    BodyText,
    #[serde(rename = "toc")]
    TableOfContents,
    #[serde(rename = "image_plate")]
    ImagePlate,
    #[serde(rename = "front_matter")]
    FrontMatter,
    #[serde(rename = "blank")]
    Blank,
}

impl PageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageCategory::BodyText => "body_text",
            PageCategory::TableOfContents => "toc",
            PageCategory::ImagePlate => "image_plate",
            PageCategory::FrontMatter => "front_matter",
            PageCategory::Blank => "blank",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "body_text" => Some(PageCategory::BodyText),
            "toc" => Some(PageCategory::TableOfContents),
            "image_plate" => Some(PageCategory::ImagePlate),
            "front_matter" => Some(PageCategory::FrontMatter),
            "blank" => Some(PageCategory::Blank),
            _ => None,
        }
    }

    /// Pages the structure parser runs over.
    pub fn is_parseable(&self) -> bool {
        matches!(self, PageCategory::BodyText | PageCategory::ImagePlate)
    }
}

/// Classify one page from its cleaned lines.
pub fn classify_page(lines: &[&str]) -> PageCategory {
    let non_blank: Vec<&str> = lines.iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    if non_blank.is_empty() {
        return PageCategory::Blank;
    }

    let total = non_blank.len();
    let dot_leader_count = non_blank.iter().filter(|l| is_dot_leader_line(l)).count();
    let image_count = non_blank.iter().filter(|l| is_image_marker_line(l)).count();
    let structural_count = non_blank.iter()
        .filter(|l| is_book_title_line(l) || is_chapter_header_line(l) || is_verse_line(l))
        .count();

    // A TOC page is dominated by dot-leader entries. Checked before the
    // structural count: TOC entries often begin with "Chapter N".
    if dot_leader_count >= 2 && dot_leader_count * 10 >= total * 3 {
        return PageCategory::TableOfContents;
    }

    if image_count * 2 >= total {
        return PageCategory::ImagePlate;
    }

    if structural_count > 0 {
        return PageCategory::BodyText;
    }

    PageCategory::FrontMatter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_page() {
        assert_eq!(classify_page(&[]), PageCategory::Blank);
        assert_eq!(classify_page(&["", "   "]), PageCategory::Blank);
    }

    #[test]
    fn test_body_text_page() {
        let lines = vec![
            "Chapter 7",
            "14/7.1 In the beginning...",
            "14/7.2 And it was good",
        ];
        assert_eq!(classify_page(&lines), PageCategory::BodyText);
    }

    #[test]
    fn test_toc_page() {
        let lines = vec![
            "Contents",
            "Chapter 1 ........ 12",
            "Chapter 2 ........ 29",
            "Chapter 3 ........ 47",
        ];
        assert_eq!(classify_page(&lines), PageCategory::TableOfContents);
    }

    #[test]
    fn test_image_plate_page() {
        let lines = vec![
            "i003 Divine throne",
            "i004 The seven lamps",
        ];
        assert_eq!(classify_page(&lines), PageCategory::ImagePlate);
    }

    #[test]
    fn test_front_matter_page() {
        let lines = vec![
            "Printed by the Society Press",
            "All rights reserved",
        ];
        assert_eq!(classify_page(&lines), PageCategory::FrontMatter);
    }

    #[test]
    fn test_category_round_trip() {
        for cat in [
            PageCategory::BodyText,
            PageCategory::TableOfContents,
            PageCategory::ImagePlate,
            PageCategory::FrontMatter,
            PageCategory::Blank,
        ] {
            assert_eq!(PageCategory::from_str(cat.as_str()), Some(cat));
        }
    }
}
