use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::value::{Dict, Value};

const DELIMITER: &str = "---";

/// The metadata block at the top of a document.
///
/// Recognised keys are lifted into fields; everything else is kept as-is in
/// `extra`. No key is required.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frontmatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub technologies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub award: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub team: Vec<String>,
    #[serde(flatten)]
    pub extra: Dict,
}

impl Frontmatter {
    /// Lifts the recognised keys out of `dict`.
    ///
    /// Scalars are stringified, a lone string in a list field becomes a
    /// one-element list, and a value that can't be coerced stays in `extra`
    /// under its original key.
    pub fn from_dict(mut dict: Dict) -> Frontmatter {
        Frontmatter {
            title: take_string(&mut dict, "title"),
            description: take_string(&mut dict, "description"),
            date: take_string(&mut dict, "date"),
            category: take_string(&mut dict, "category"),
            cover_image: take_string(&mut dict, "coverImage"),
            technologies: take_list(&mut dict, "technologies"),
            course: take_string(&mut dict, "course"),
            repo_url: take_string(&mut dict, "repoUrl"),
            demo_url: take_string(&mut dict, "demoUrl"),
            award: take_string(&mut dict, "award"),
            event: take_string(&mut dict, "event"),
            team: take_list(&mut dict, "team"),
            extra: dict,
        }
    }

    /// The `date` field as a timestamp, if it is in a recognised format.
    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(parse_date)
    }
}

fn take_string(dict: &mut Dict, key: &str) -> Option<String> {
    let value = dict.remove(key)?;
    if let Some(string) = value.to_scalar_string() {
        return Some(string);
    }

    if !value.is_null() {
        log::debug!("front matter key `{key}` holds a {}; keeping it as extra", value.kind());
        dict.insert(key.into(), value);
    }

    None
}

fn take_list(dict: &mut Dict, key: &str) -> Vec<String> {
    let Some(value) = dict.remove(key) else {
        return vec![];
    };

    if let Some(string) = value.to_scalar_string() {
        return vec![string];
    }

    if let Some(items) = value.as_slice() {
        let strings = items.iter()
            .filter(|v| !v.is_null())
            .map(Value::to_scalar_string)
            .collect::<Option<Vec<_>>>();

        if let Some(strings) = strings {
            return strings;
        }
    }

    if !value.is_null() {
        log::debug!("front matter key `{key}` is not a list of scalars; keeping it as extra");
        dict.insert(key.into(), value);
    }

    vec![]
}

/// Splits `raw` into its front matter and its body.
///
/// Never fails: a document without an opening `---` line has empty front
/// matter and is all body; an unterminated block is all front matter and has
/// an empty body; YAML that doesn't parse is salvaged entry by entry.
///
/// ```rust
/// let raw = "---\ntitle: Hello\ntechnologies: [Rust, CUDA]\n---\n# Hello\n";
/// let (frontmatter, body) = folio::frontmatter::parse(raw);
///
/// assert_eq!(frontmatter.title.as_deref(), Some("Hello"));
/// assert_eq!(frontmatter.technologies, ["Rust", "CUDA"]);
/// assert_eq!(body, "# Hello\n");
/// ```
pub fn parse(raw: &str) -> (Frontmatter, String) {
    match split(raw) {
        Some((block, body)) => (Frontmatter::from_dict(parse_block(block)), body.to_string()),
        None => (Frontmatter::default(), raw.to_string()),
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// Returns `(block, body)`, or `None` if `raw` has no opening delimiter.
fn split(raw: &str) -> Option<(&str, &str)> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let (first, rest) = raw.split_once('\n').unwrap_or((raw, ""));
    if !is_delimiter(first) {
        return None;
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if is_delimiter(line) {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }

        offset += line.len();
    }

    Some((rest, ""))
}

fn parse_block(block: &str) -> Dict {
    if block.trim().is_empty() {
        return Dict::new();
    }

    match serde_yaml::from_str::<Dict>(block) {
        Ok(dict) => dict,
        Err(e) => {
            log::debug!("malformed front matter, salvaging entries: {e}");
            salvage(block)
        }
    }
}

/// Parses each top-level entry of `block` on its own, dropping the ones that
/// still don't parse. An entry starts at an unindented line; unindented list
/// items and comments continue the current entry.
fn salvage(block: &str) -> Dict {
    let mut entries: Vec<String> = vec![];
    for line in block.lines() {
        let continues = line.is_empty()
            || line.starts_with(char::is_whitespace)
            || line.starts_with('-')
            || line.starts_with('#');

        match entries.last_mut() {
            Some(entry) if continues => {
                entry.push_str(line);
                entry.push('\n');
            }
            _ => entries.push(format!("{line}\n")),
        }
    }

    let mut dict = Dict::new();
    for entry in entries {
        match serde_yaml::from_str::<Dict>(&entry) {
            Ok(parsed) => dict.extend(parsed),
            Err(e) => log::debug!("dropping front matter entry {:?}: {e}", entry.trim_end()),
        }
    }

    dict
}

/// Parses the date spellings found in front matter.
///
/// ```rust
/// use folio::frontmatter::parse_date;
///
/// let day = parse_date("2024-03-05").unwrap();
/// assert_eq!(parse_date("March 5, 2024"), Some(day));
/// assert_eq!(parse_date("Mar 5, 2024"), Some(day));
/// assert_eq!(parse_date("2024/03/05"), Some(day));
/// assert!(parse_date("2024-03").unwrap() < day);
/// assert!(parse_date("someday").is_none());
/// ```
pub fn parse_date(string: &str) -> Option<NaiveDateTime> {
    let string = string.trim();
    let midnight = |date: NaiveDate| date.and_hms_opt(0, 0, 0);

    string.parse::<NaiveDate>().ok().and_then(midnight)
        .or_else(|| NaiveDate::parse_from_str(string, "%Y/%m/%d").ok().and_then(midnight))
        .or_else(|| string.parse::<DateTime<FixedOffset>>().ok().map(|dt| dt.naive_utc()))
        .or_else(|| string.parse::<NaiveDateTime>().ok())
        .or_else(|| NaiveDate::parse_from_str(string, "%B %d, %Y").ok().and_then(midnight))
        .or_else(|| NaiveDate::parse_from_str(string, "%b %d, %Y").ok().and_then(midnight))
        .or_else(|| {
            let first = format!("{string}-01");
            NaiveDate::parse_from_str(&first, "%Y-%m-%d").ok().and_then(midnight)
        })
        .or_else(|| {
            if string.len() != 4 || !string.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }

            let year = string.parse::<i32>().ok()?;
            NaiveDate::from_ymd_opt(year, 1, 1).and_then(midnight)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_front_matter_is_all_body() {
        let raw = "# Title\n\nSome text.\n";
        let (frontmatter, body) = parse(raw);
        assert_eq!(frontmatter, Frontmatter::default());
        assert_eq!(body, raw);

        let (frontmatter, body) = parse("");
        assert_eq!(frontmatter, Frontmatter::default());
        assert_eq!(body, "");
    }

    #[test]
    fn opening_marker_must_be_first_line() {
        let raw = "\n---\ntitle: x\n---\nbody";
        let (frontmatter, body) = parse(raw);
        assert!(frontmatter.title.is_none());
        assert_eq!(body, raw);

        let (frontmatter, _) = parse("----\ntitle: x\n----\n");
        assert!(frontmatter.title.is_none());
    }

    #[test]
    fn recognised_fields_and_extra() {
        let raw = "\
---
title: Parallel Ising
description: Monte Carlo on a GPU
date: 2024-01-15
category: projects
coverImage: /images/ising.png
technologies:
  - CUDA
  - C++
course: CS 149
repoUrl: https://example.com/repo
demoUrl: https://example.com/demo
award: Best Project
event: HackMIT
team: [Ada, Grace]
stars: 42
---
Body starts here.
";

        let (fm, body) = parse(raw);
        assert_eq!(fm.title.as_deref(), Some("Parallel Ising"));
        assert_eq!(fm.description.as_deref(), Some("Monte Carlo on a GPU"));
        assert_eq!(fm.date.as_deref(), Some("2024-01-15"));
        assert_eq!(fm.category.as_deref(), Some("projects"));
        assert_eq!(fm.cover_image.as_deref(), Some("/images/ising.png"));
        assert_eq!(fm.technologies, ["CUDA", "C++"]);
        assert_eq!(fm.course.as_deref(), Some("CS 149"));
        assert_eq!(fm.repo_url.as_deref(), Some("https://example.com/repo"));
        assert_eq!(fm.demo_url.as_deref(), Some("https://example.com/demo"));
        assert_eq!(fm.award.as_deref(), Some("Best Project"));
        assert_eq!(fm.event.as_deref(), Some("HackMIT"));
        assert_eq!(fm.team, ["Ada", "Grace"]);
        assert_eq!(fm.extra.len(), 1);
        assert_eq!(fm.extra["stars"], Value::from(42i64));
        assert_eq!(body, "Body starts here.\n");
    }

    #[test]
    fn crlf_and_trailing_whitespace_on_markers() {
        let (fm, body) = parse("--- \r\ntitle: Windows\r\n---\r\nbody\r\n");
        assert_eq!(fm.title.as_deref(), Some("Windows"));
        assert_eq!(body, "body\r\n");
    }

    #[test]
    fn unterminated_block_has_empty_body() {
        let (fm, body) = parse("---\ntitle: Forever\ndescription: open\n");
        assert_eq!(fm.title.as_deref(), Some("Forever"));
        assert_eq!(fm.description.as_deref(), Some("open"));
        assert_eq!(body, "");
    }

    #[test]
    fn empty_block() {
        let (fm, body) = parse("---\n---\ntext");
        assert_eq!(fm, Frontmatter::default());
        assert_eq!(body, "text");
    }

    #[test]
    fn block_scalars() {
        let raw = "---\ndescription: |\n  line one\n  line two\n---\n";
        let (fm, _) = parse(raw);
        assert_eq!(fm.description.as_deref(), Some("line one\nline two\n"));
    }

    #[test]
    fn lenient_coercion() {
        let raw = "---\ntitle: 1999\ntechnologies: Rust\nteam:\n- Ada\n- 7\naward: { name: x }\n---\n";
        let (fm, _) = parse(raw);
        assert_eq!(fm.title.as_deref(), Some("1999"));
        assert_eq!(fm.technologies, ["Rust"]);
        assert_eq!(fm.team, ["Ada", "7"]);
        assert!(fm.award.is_none());
        assert!(fm.extra["award"].as_dict().is_some());
    }

    #[test]
    fn null_fields_are_absent() {
        let (fm, _) = parse("---\ntitle:\ntechnologies: ~\n---\n");
        assert!(fm.title.is_none());
        assert!(fm.technologies.is_empty());
        assert!(fm.extra.is_empty());
    }

    #[test]
    fn malformed_yaml_is_salvaged() {
        let raw = "---\ntitle: Good\ndescription: [unclosed\ncategory: research\n---\nbody";
        let (fm, body) = parse(raw);
        assert_eq!(fm.title.as_deref(), Some("Good"));
        assert_eq!(fm.category.as_deref(), Some("research"));
        assert!(fm.description.is_none());
        assert_eq!(body, "body");
    }

    #[test]
    fn salvage_keeps_unindented_lists() {
        let raw = "---\ntechnologies:\n- Rust\n- Go\nbroken: \"quote\ntitle: T\n---\n";
        let (fm, _) = parse(raw);
        assert_eq!(fm.technologies, ["Rust", "Go"]);
        assert_eq!(fm.title.as_deref(), Some("T"));
    }

    #[test]
    fn non_mapping_front_matter_is_empty() {
        let (fm, body) = parse("---\njust a sentence\n---\nbody");
        assert_eq!(fm, Frontmatter::default());
        assert_eq!(body, "body");
    }

    #[test]
    fn serializes_camel_case_and_skips_absent() {
        let (fm, _) = parse("---\ncoverImage: a.png\nrepoUrl: r\nmood: calm\n---\n");
        let json = serde_json::to_value(&fm).unwrap();
        assert_eq!(json, serde_json::json!({
            "coverImage": "a.png",
            "repoUrl": "r",
            "mood": "calm",
        }));
    }

    #[test]
    fn date_formats() {
        let day = NaiveDate::from_ymd_opt(2023, 11, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(parse_date("2023-11-02"), Some(day));
        assert_eq!(parse_date(" 2023/11/02 "), Some(day));
        assert_eq!(parse_date("November 2, 2023"), Some(day));
        assert_eq!(parse_date("Nov 2, 2023"), Some(day));
        assert_eq!(parse_date("2023-11").map(|d| d.date()), NaiveDate::from_ymd_opt(2023, 11, 1));
        assert_eq!(parse_date("2023").map(|d| d.date()), NaiveDate::from_ymd_opt(2023, 1, 1));

        let ts = parse_date("2023-11-02T10:30:00+02:00").unwrap();
        assert_eq!(ts, day + chrono::Duration::hours(8) + chrono::Duration::minutes(30));

        assert_eq!(parse_date("next tuesday"), None);
        assert_eq!(parse_date("20233"), None);
        assert_eq!(parse_date(""), None);
    }
}
