use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

use derive_more::Debug;
use pulldown_cmark_escape::escape_html;

use crate::util::kebab_case;

/// Renders one kind of embeddable block.
///
/// A block appears in a document as a JSX-like tag, either self-closing
/// (`<Name a="b" />`) or wrapping content (`<Name>…</Name>`). The renderer
/// calls [`open()`](Block::open) for the opening tag and
/// [`close()`](Block::close) for the closing one; a self-closing tag gets
/// both, back to back.
pub trait Block: Send + Sync {
    fn open(&self, name: &str, attrs: &Attrs, out: &mut String);

    fn close(&self, name: &str, out: &mut String);
}

/// The value of one attribute on a block tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// `name` with no value.
    Flag,
    /// `name="text"`, `name='text'` or `name=text`.
    Text(String),
    /// `name={expression}`, holding the source between the braces.
    Expr(String),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Flag => None,
            AttrValue::Text(s) | AttrValue::Expr(s) => Some(s),
        }
    }

    /// Flags and `true` values are truthy.
    pub fn is_true(&self) -> bool {
        match self {
            AttrValue::Flag => true,
            AttrValue::Text(s) | AttrValue::Expr(s) => s.trim() == "true",
        }
    }
}

/// The attributes of a block tag, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs(Vec<(String, AttrValue)>);

impl Attrs {
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Wraps a block's content in an HTML element.
///
/// The element gets the configured class plus `block-<name>`; every attribute
/// becomes a `data-` attribute with a kebab-cased name.
#[derive(Debug, Clone)]
pub struct Element {
    tag: Cow<'static, str>,
    class: Cow<'static, str>,
}

impl Element {
    pub fn new<T, C>(tag: T, class: C) -> Self
        where T: Into<Cow<'static, str>>, C: Into<Cow<'static, str>>
    {
        Element { tag: tag.into(), class: class.into() }
    }

    pub fn div<C: Into<Cow<'static, str>>>(class: C) -> Self {
        Element::new("div", class)
    }

    pub fn span<C: Into<Cow<'static, str>>>(class: C) -> Self {
        Element::new("span", class)
    }
}

fn push_data_attrs(attrs: &Attrs, out: &mut String) {
    for (name, value) in attrs.iter() {
        let _ = write!(out, " data-{}", kebab_case(name));
        if let Some(value) = value.as_str() {
            out.push_str("=\"");
            let _ = escape_html(&mut *out, value);
            out.push('"');
        }
    }
}

impl Block for Element {
    fn open(&self, name: &str, attrs: &Attrs, out: &mut String) {
        let _ = write!(out, "<{} class=\"{} block-{}\"", self.tag, self.class, kebab_case(name));
        push_data_attrs(attrs, out);
        out.push('>');
    }

    fn close(&self, _: &str, out: &mut String) {
        let _ = write!(out, "</{}>", self.tag);
    }
}

/// A collapsible section: `<Name title="…" defaultExpanded>…</Name>`.
#[derive(Debug, Clone, Default)]
pub struct Details;

impl Block for Details {
    fn open(&self, name: &str, attrs: &Attrs, out: &mut String) {
        let _ = write!(out, "<details class=\"block-{}\"", kebab_case(name));
        if attrs.get("defaultExpanded").map_or(false, AttrValue::is_true) {
            out.push_str(" open");
        }

        out.push('>');
        if let Some(title) = attrs.get_str("title") {
            out.push_str("<summary>");
            let _ = escape_html(&mut *out, title);
            out.push_str("</summary>");
        }
    }

    fn close(&self, _: &str, out: &mut String) {
        out.push_str("</details>");
    }
}

/// An image with an optional caption: `<Name src="…" alt="…" caption="…" />`.
#[derive(Debug, Clone, Default)]
pub struct Figure;

impl Block for Figure {
    fn open(&self, name: &str, attrs: &Attrs, out: &mut String) {
        let _ = write!(out, "<figure class=\"block-{}\">", kebab_case(name));
        if let Some(src) = attrs.get_str("src") {
            let alt = attrs.get_str("alt").unwrap_or("");
            out.push_str("<img src=\"");
            let _ = escape_html(&mut *out, src);
            out.push_str("\" alt=\"");
            let _ = escape_html(&mut *out, alt);
            out.push_str("\">");
        }

        if let Some(caption) = attrs.get_str("caption") {
            out.push_str("<figcaption>");
            let _ = escape_html(&mut *out, caption);
            out.push_str("</figcaption>");
        }
    }

    fn close(&self, _: &str, out: &mut String) {
        out.push_str("</figure>");
    }
}

/// Maps block names to the [`Block`]s that render them.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    #[debug(ignore)]
    blocks: BTreeMap<Arc<str>, Box<dyn Block>>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        BlockRegistry::default()
    }

    /// The blocks used by the site's content.
    pub fn standard() -> Self {
        BlockRegistry::new()
            .with("Equation", Element::span("equation"))
            .with("BlockEquation", Element::div("equation"))
            .with("CodeBlock", Element::div("code-block"))
            .with("TwoColumnLayout", Element::div("columns"))
            .with("LeftColumn", Element::div("column"))
            .with("RightColumn", Element::div("column"))
            .with("ExpandableSection", Details)
            .with("ProjectImage", Figure)
            .with("PerformanceTable", Element::div("table"))
            .with("Algorithm", Element::div("algorithm"))
            .with("AlgorithmLine", Element::div("algorithm-line"))
            .with("AlgorithmFor", Element::div("algorithm-scope"))
            .with("AlgorithmIf", Element::div("algorithm-scope"))
            .with("AlgorithmBlock", Element::div("algorithm-scope"))
            .with("ScreenshotCarousel", Element::div("carousel"))
    }

    pub fn with<N, B>(mut self, name: N, block: B) -> Self
        where N: Into<Arc<str>>, B: Block + 'static
    {
        self.register(name, block);
        self
    }

    /// Registers `block` under `name`, returning the block it replaces.
    pub fn register<N, B>(&mut self, name: N, block: B) -> Option<Box<dyn Block>>
        where N: Into<Arc<str>>, B: Block + 'static
    {
        self.blocks.insert(name.into(), Box::new(block))
    }

    pub fn get(&self, name: &str) -> Option<&dyn Block> {
        self.blocks.get(name).map(|b| &**b)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(|k| &**k)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Replaces every tag in `html` naming a registered block with that
    /// block's rendering. Everything else is left as-is.
    pub fn rewrite<'a>(&self, html: &'a str) -> Cow<'a, str> {
        let mut out = String::new();
        let (mut copied, mut cursor) = (0, 0);
        while let Some(i) = memchr::memchr(b'<', &html.as_bytes()[cursor..]) {
            let start = cursor + i;
            let found = parse_tag(&html[start..]).and_then(|tag| {
                let block = self.get(tag.name)?;
                Some((tag, block))
            });

            let Some((tag, block)) = found else {
                cursor = start + 1;
                continue;
            };

            out.push_str(&html[copied..start]);
            if tag.closing {
                block.close(tag.name, &mut out);
            } else {
                block.open(tag.name, &tag.attrs, &mut out);
                if tag.self_closing {
                    block.close(tag.name, &mut out);
                }
            }

            cursor = start + tag.len;
            copied = cursor;
        }

        if copied == 0 {
            return Cow::Borrowed(html);
        }

        out.push_str(&html[copied..]);
        Cow::Owned(out)
    }
}

#[derive(Debug, PartialEq)]
struct Tag<'a> {
    name: &'a str,
    attrs: Attrs,
    closing: bool,
    self_closing: bool,
    len: usize,
}

/// Parses the tag at the start of `input`, which begins with `<`. Returns
/// `None` if there isn't a complete, well-formed tag there.
fn parse_tag(input: &str) -> Option<Tag<'_>> {
    let bytes = input.as_bytes();
    let mut i = 1;
    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }

    let name_start = i;
    if !bytes.get(i)?.is_ascii_alphabetic() {
        return None;
    }

    while bytes.get(i).map_or(false, |b| b.is_ascii_alphanumeric() || b"._-".contains(b)) {
        i += 1;
    }

    let name = &input[name_start..i];
    let mut attrs = vec![];
    loop {
        while bytes.get(i)?.is_ascii_whitespace() {
            i += 1;
        }

        match bytes[i] {
            b'>' => {
                return Some(Tag { name, attrs: Attrs(attrs), closing, self_closing: false, len: i + 1 });
            }
            b'/' if !closing && bytes.get(i + 1) == Some(&b'>') => {
                return Some(Tag { name, attrs: Attrs(attrs), closing, self_closing: true, len: i + 2 });
            }
            _ if closing => return None,
            _ => {}
        }

        let attr_start = i;
        while bytes.get(i).map_or(false, |&b| !b.is_ascii_whitespace() && !b"=>/\"'{".contains(&b)) {
            i += 1;
        }

        if i == attr_start {
            return None;
        }

        let attr_name = input[attr_start..i].to_string();
        while bytes.get(i)?.is_ascii_whitespace() {
            i += 1;
        }

        if bytes[i] != b'=' {
            attrs.push((attr_name, AttrValue::Flag));
            continue;
        }

        i += 1;
        while bytes.get(i)?.is_ascii_whitespace() {
            i += 1;
        }

        let value = match bytes[i] {
            quote @ (b'"' | b'\'') => {
                let end = i + 1 + memchr::memchr(quote, &bytes[i + 1..])?;
                let value = AttrValue::Text(input[i + 1..end].to_string());
                i = end + 1;
                value
            }
            b'{' => {
                let mut depth = 0usize;
                let start = i + 1;
                loop {
                    match *bytes.get(i)? {
                        b'{' => depth += 1,
                        b'}' => depth -= 1,
                        _ => {}
                    }

                    i += 1;
                    if depth == 0 {
                        break;
                    }
                }

                AttrValue::Expr(input[start..i - 1].trim().to_string())
            }
            _ => {
                let start = i;
                while bytes.get(i).map_or(false, |&b| !b.is_ascii_whitespace() && b != b'>') {
                    i += 1;
                }

                let end = match input[start..i].ends_with('/') && bytes.get(i) == Some(&b'>') {
                    true => i - 1,
                    false => i,
                };

                i = end;
                AttrValue::Text(input[start..end].to_string())
            }
        };

        attrs.push((attr_name, value));
    }
}
