use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// The deepest heading level markdown has.
pub const MAX_LEVEL: usize = 6;

macro_rules! regex {
    ($($name:ident = $pattern:literal),+ $(,)?) => {
        $(
            static $name: Lazy<Regex> = Lazy::new(|| Regex::new($pattern).unwrap());
        )+
    };
}

regex! {
    HEADING = r"^(#{1,6})\s+(.+)$",
    BOLD = r"\*\*(.*?)\*\*",
    ITALIC = r"\*(.*?)\*",
    CODE = r"`(.*?)`",
    LINK = r"\[(.*?)\]\(.*?\)",
    NOT_ID_CHAR = r"[^A-Za-z0-9_\s-]",
    SPACES = r"\s+",
    HYPHENS = r"-+",
}

/// One entry of a page's table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingNode {
    pub anchor_id: String,
    pub display_text: String,
    pub level: usize,
}

/// Lists the headings of `body` in document order, skipping those deeper
/// than `max_level`.
///
/// Headings are found line by line: a line is a heading if, once trimmed, it
/// starts with one to six `#` followed by whitespace and some text. Lines in
/// fenced code blocks are not special.
///
/// ```rust
/// use folio::outline::extract;
///
/// let body = "# Intro\ntext\n## **Setup** and [tools](/tools)\n### Deep\n";
/// let outline = extract(body, 2);
///
/// assert_eq!(outline.len(), 2);
/// assert_eq!(outline[1].display_text, "Setup and tools");
/// assert_eq!(outline[1].anchor_id, "setup-and-tools");
/// assert_eq!(outline[1].level, 2);
/// ```
pub fn extract(body: &str, max_level: usize) -> Vec<HeadingNode> {
    body.split('\n')
        .filter_map(heading)
        .filter(|h| h.level <= max_level)
        .collect()
}

/// The heading `line` declares, if it is a heading line with a non-empty
/// label and anchor id.
pub fn heading(line: &str) -> Option<HeadingNode> {
    let captures = HEADING.captures(line.trim())?;
    let display_text = display_text(&captures[2]);
    let anchor_id = anchor_id(&display_text);
    if display_text.is_empty() || anchor_id.is_empty() {
        return None;
    }

    Some(HeadingNode { anchor_id, display_text, level: captures[1].len() })
}

/// [`extract()`] with every heading level included.
pub fn extract_all(body: &str) -> Vec<HeadingNode> {
    extract(body, MAX_LEVEL)
}

/// The readable label of heading text: bold, italic and code markers are
/// dropped and links are replaced by their text.
pub fn display_text(text: &str) -> String {
    let text = BOLD.replace_all(text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = CODE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    text.trim().to_string()
}

/// The URL fragment for a heading labelled `text`.
///
/// ```rust
/// use folio::outline::anchor_id;
///
/// assert_eq!(anchor_id("What's New in v2.0?"), "whats-new-in-v20");
/// assert_eq!(anchor_id("  --Hello,   World--  "), "hello-world");
/// ```
pub fn anchor_id(text: &str) -> String {
    let id = text.to_lowercase();
    let id = NOT_ID_CHAR.replace_all(&id, "");
    let id = SPACES.replace_all(&id, "-");
    let id = HYPHENS.replace_all(&id, "-");
    id.trim_matches('-').to_string()
}
