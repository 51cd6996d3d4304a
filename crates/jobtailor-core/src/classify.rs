//! Line classification: a priority-ordered rule engine assigning each line
//! of a rendered job posting one semantic category.
//!
//! Source documents vary wildly across job boards (ATX headings vs.
//! bold-paragraph headings, inline vs. block salary figures, navigation
//! noise), so ambiguity is resolved by a fixed precedence order:
//!
//! 1. reader-proxy metadata (`Title:`, `URL Source:`, `Markdown Content:`)
//! 2. structural noise (setext underlines, nav-link lines)
//! 3. high-value inline signals (salary, years of experience)
//! 4. heading family, sub-classified by text content
//! 5. list items
//! 6. location cues on bare lines
//! 7. generic prose, length-gated
//!
//! Inline signals outrank structure on purpose: a bullet carrying a salary
//! figure is tagged `salary`, keeping the more informative signal.

use std::sync::LazyLock;

use regex::Regex;

use crate::node::NodeType;

/// Generic prose longer than this is discarded: low information density
/// relative to its token cost.
pub const MAX_BODY_LEN: usize = 300;

static SETEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:-{2,}|={2,})$").unwrap());

static NAV_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\s*\[[^\]]*\]\([^)]*\))+\s*$").unwrap());

static SALARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[$€£]\s?\d[\d,]*(?:\.\d+)?\s*k?(?:\s*(?:per|/)\s*(?:year|yr|hour|hr|annum))?|\b\d[\d,]*k\s*(?:per|/)\s*(?:year|yr|hour|hr|annum)",
    )
    .unwrap()
});

static YEARS_EXP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+\s*\+\s*years?\b|\b\d+\s*[-–—]\s*\d+\s*years?\b").unwrap()
});

static ATX_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}\s+\S").unwrap());

static BOLD_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*{2,}.+\*{2,}$").unwrap());

static META_FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9 /&()'-]{0,39}:\s*\S").unwrap());

static SECTION_VOCAB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:about|overview|responsibilit\w*|requirement\w*|qualification\w*|benefit\w*|location|team|role|skills?|experience|compensation|perks|company|mission|culture)\b",
    )
    .unwrap()
});

static SENIORITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:junior|senior|staff|principal|lead|director|vp|vice president|head|chief|intern|associate|intermediate)\b",
    )
    .unwrap()
});

static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*]\s+").unwrap());

static LOCATION_CUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:remote|hybrid|on-?site)\b").unwrap());

static CITY_REGION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:\s[A-Z][a-z]+)?,\s*[A-Z][a-zA-Z]+").unwrap()
});

/// Assign one trimmed line its category. `None` means the line is
/// discarded (blank, or over-length generic prose).
///
/// Rules run in strict precedence order; the first match wins.
pub fn classify(line: &str) -> Option<NodeType> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    // 1. Reader-proxy metadata. Checked first: these are unambiguous
    //    artifacts of the upstream format and must not be reinterpreted
    //    as headings or meta fields even though they contain colons.
    if line.starts_with("Title:") {
        return Some(NodeType::JinaTitle);
    }
    if line.starts_with("URL Source:") {
        return Some(NodeType::JinaUrl);
    }
    if line == "Markdown Content:" {
        return Some(NodeType::JinaMarker);
    }

    // 2. Structural noise. The underline pattern requires the line be
    //    composed entirely of the repeated character, so a dash-separated
    //    phrase like `hello-world` falls through.
    if SETEXT_RE.is_match(line) {
        return Some(NodeType::SetextUnderline);
    }
    if NAV_LINK_RE.is_match(line) {
        return Some(NodeType::NavLink);
    }

    // 3. Inline signals, before structure: a bullet or heading carrying a
    //    salary figure or an experience requirement keeps that tag.
    if SALARY_RE.is_match(line) {
        return Some(NodeType::Salary);
    }
    if YEARS_EXP_RE.is_match(line) {
        return Some(NodeType::YearsExp);
    }

    // 4. Heading family, sub-classified by text content rather than by
    //    wrapper (ATX and bold-paragraph headings are equivalent here).
    if ATX_HEADING_RE.is_match(line) || BOLD_LINE_RE.is_match(line) {
        return Some(classify_heading_text(&strip_emphasis(line)));
    }

    // 5. List items.
    if BULLET_RE.is_match(line) {
        return Some(NodeType::Bullet);
    }

    // 6. Location cue on a bare line.
    if LOCATION_CUE_RE.is_match(line) || CITY_REGION_RE.is_match(line) {
        return Some(NodeType::Location);
    }

    // 7. Fallback: length-gated generic prose.
    if line.chars().count() > MAX_BODY_LEN {
        return None;
    }
    Some(NodeType::Body)
}

/// Strip ATX markers and all emphasis asterisks so sub-classification sees
/// the text content. Removing every asterisk handles arbitrary nesting
/// (`***X***` and `**X**` both reduce to `X`) as well as inline bold runs
/// like `**Location:**Toronto`.
fn strip_emphasis(line: &str) -> String {
    line.trim_start_matches('#')
        .replace('*', "")
        .trim()
        .to_string()
}

/// Sub-classify a heading by its stripped text. Order matters: a line can
/// satisfy more than one pattern, and meta beats section beats seniority.
fn classify_heading_text(text: &str) -> NodeType {
    if META_FIELD_RE.is_match(text) {
        NodeType::MetaField
    } else if SECTION_VOCAB_RE.is_match(text) {
        NodeType::SectionHeader
    } else if SENIORITY_RE.is_match(text) {
        NodeType::JobTitle
    } else {
        NodeType::Heading
    }
}
