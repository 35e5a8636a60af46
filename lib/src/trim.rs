/// How many lines from the top of a body a header-closing rule may appear at.
pub const HEADER_SCAN_LIMIT: usize = 40;

/// Whether `line` is a bare horizontal rule: three or more `-` and nothing
/// else once surrounding whitespace is removed.
pub fn is_rule(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 3 && line.bytes().all(|b| b == b'-')
}

/// Strips a custom header block from `body`: everything up to and including
/// the first horizontal rule, if that rule is one of the first
/// [`HEADER_SCAN_LIMIT`] lines.
///
/// ```rust
/// use folio::trim::trim_header;
///
/// let body = "Custom header\n<Banner />\n---\n\n# Title\nText.\n";
/// assert_eq!(trim_header(body), "# Title\nText.\n");
///
/// assert_eq!(trim_header("\n  No header here.  \n"), "No header here.");
/// ```
pub fn trim_header(body: &str) -> &str {
    trim_header_within(body, HEADER_SCAN_LIMIT)
}

/// [`trim_header()`] with a caller-chosen line limit.
///
/// When a rule is found, only leading whitespace is removed from what follows
/// it. Otherwise the whole body is returned with surrounding whitespace
/// trimmed.
pub fn trim_header_within(body: &str, limit: usize) -> &str {
    let mut offset = 0;
    for line in body.split_inclusive('\n').take(limit) {
        offset += line.len();
        if is_rule(line) {
            return body[offset..].trim_start();
        }
    }

    body.trim()
}
