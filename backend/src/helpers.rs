use regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
    // "210", "- 210 -", "— 210 —" as the whole line
    static ref RE_BARE_PAGE_NUMBER: Regex = Regex::new(r"^[-—]?\s*\d{1,4}\s*[-—]?$").unwrap();
    // Dot leaders in table-of-contents entries: "Chapter 7 ..... 210"
    static ref RE_DOT_LEADER: Regex = Regex::new(r"\.{3,}\s*\d+\s*$").unwrap();
}

/// Normalize raw extracted page text: unify line endings, strip BOM and
/// zero-width characters, drop control characters other than newline and
/// tab, and collapse runs of blank lines.
pub fn normalize_page_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let cleaned: String = text.chars()
        .filter(|c| {
            !matches!(c, '\u{FEFF}' | '\u{200B}' | '\u{200C}' | '\u{200D}')
                && (!c.is_control() || *c == '\n' || *c == '\t')
        })
        .collect();

    let mut out: Vec<&str> = Vec::new();
    let mut blank_run = 0;
    for line in cleaned.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }

    out.join("\n")
}

/// A line consisting only of a page number, possibly dash-decorated.
/// Printed folios carry these; they are noise to the structure parser.
pub fn is_bare_page_number(line: &str) -> bool {
    RE_BARE_PAGE_NUMBER.is_match(line.trim())
}

/// A table-of-contents entry line with a dot leader and page number.
pub fn is_dot_leader_line(line: &str) -> bool {
    RE_DOT_LEADER.is_match(line.trim_end())
}

/// Normalize page text and drop bare page-number lines.
pub fn clean_page_text(text: &str) -> String {
    let normalized = normalize_page_text(text);
    let kept: Vec<&str> = normalized.lines()
        .filter(|line| !is_bare_page_number(line))
        .collect();
    kept.join("\n")
}

/// Parse a CJK numeral up to the thousands, e.g. "七" -> 7, "十二" -> 12,
/// "二百一十" -> 210. Returns None for anything else.
pub fn cjk_numeral_to_int(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }

    let digit = |c: char| -> Option<u32> {
        match c {
            '〇' | '零' => Some(0),
            '一' => Some(1),
            '二' => Some(2),
            '三' => Some(3),
            '四' => Some(4),
            '五' => Some(5),
            '六' => Some(6),
            '七' => Some(7),
            '八' => Some(8),
            '九' => Some(9),
            _ => None,
        }
    };

    let mut total: u32 = 0;
    let mut current: u32 = 0;
    for c in s.chars() {
        match c {
            '十' => {
                // A bare "十" means 10
                total += if current == 0 { 10 } else { current * 10 };
                current = 0;
            }
            '百' => {
                total += if current == 0 { 100 } else { current * 100 };
                current = 0;
            }
            '千' => {
                total += if current == 0 { 1000 } else { current * 1000 };
                current = 0;
            }
            _ => {
                current = current * 10 + digit(c)?;
            }
        }
    }

    Some(total + current)
}

/// Extract the chapter number from a chapter header title, either Latin
/// ("Chapter 7") or CJK ("七章"). Used by the validation pass to check
/// chapter ordering within a book.
pub fn chapter_number_from_title(title: &str) -> Option<u32> {
    lazy_static! {
        static ref RE_LATIN_NUM: Regex = Regex::new(r"^Chapter\s+(\d+)\b").unwrap();
        static ref RE_CJK_NUM: Regex = Regex::new(r"^([〇零一二三四五六七八九十百千]+)章").unwrap();
    }

    if let Some(caps) = RE_LATIN_NUM.captures(title.trim()) {
        return caps[1].parse().ok();
    }
    if let Some(caps) = RE_CJK_NUM.captures(title.trim()) {
        return cjk_numeral_to_int(&caps[1]);
    }
    None
}
