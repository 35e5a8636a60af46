use std::borrow::Cow;
use std::ops::Range;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

use crate::outline;
use crate::render::BlockRegistry;

/// Renders document bodies to HTML.
///
/// Every heading the outline lists gets the outline's anchor id, computed
/// from the heading's source line, and tags naming registered blocks are
/// rendered by those blocks. Heading attributes (`{#id}`) are not parsed: they
/// stay part of the heading text, as they do in the outline.
///
/// ```rust
/// use folio::render::HtmlRenderer;
///
/// let renderer = HtmlRenderer::standard();
/// let html = renderer.render("## Set *up*\n\n<Equation tex=\"e^x\" />\n");
///
/// assert!(html.contains(r#"<h2 id="set-up">"#));
/// assert!(html.contains(r#"<span class="equation block-equation" data-tex="e^x"></span>"#));
/// ```
#[derive(Debug)]
pub struct HtmlRenderer {
    blocks: BlockRegistry,
    options: Options,
}

impl HtmlRenderer {
    pub fn new(blocks: BlockRegistry) -> Self {
        let options = Options::all()
            .difference(Options::ENABLE_SMART_PUNCTUATION)
            .difference(Options::ENABLE_HEADING_ATTRIBUTES)
            .difference(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS)
            .difference(Options::ENABLE_PLUSES_DELIMITED_METADATA_BLOCKS);

        HtmlRenderer { blocks, options }
    }

    /// A renderer with [`BlockRegistry::standard()`].
    pub fn standard() -> Self {
        HtmlRenderer::new(BlockRegistry::standard())
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut BlockRegistry {
        &mut self.blocks
    }

    pub fn render(&self, body: &str) -> String {
        let events = Parser::new_ext(body, self.options).into_offset_iter();
        let events = Headings { source: body, inner: events };
        let events = RawHtml { inner: events, blocks: &self.blocks, pending: None };

        let mut output = String::with_capacity(body.len() * 3 / 2);
        html::push_html(&mut output, events);
        output
    }
}

/// Gives each heading the anchor id the outline derives from its source line.
struct Headings<'a, I> {
    source: &'a str,
    inner: I,
}

impl<'a, I: Iterator<Item = (Event<'a>, Range<usize>)>> Iterator for Headings<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next()? {
            (Event::Start(Tag::Heading { level, id: None, classes, attrs }), range) => {
                let line = self.source[range].lines().next().unwrap_or_default();
                let id = outline::heading(line).map(|h| CowStr::from(h.anchor_id));
                Some(Event::Start(Tag::Heading { level, id, classes, attrs }))
            }
            (event, _) => Some(event),
        }
    }
}

/// Sends raw HTML through the block registry. The lines of an HTML block are
/// joined first so that tags spanning lines are seen whole.
struct RawHtml<'r, 'a, I> {
    blocks: &'r BlockRegistry,
    pending: Option<Event<'a>>,
    inner: I,
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for RawHtml<'_, 'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.pending.take() {
            return Some(event);
        }

        match self.inner.next()? {
            Event::Html(html) => {
                let mut joined = html.into_string();
                self.pending = loop {
                    match self.inner.next() {
                        Some(Event::Html(more)) => joined.push_str(&more),
                        other => break other,
                    }
                };

                let html = self.blocks.rewrite(&joined).into_owned();
                Some(Event::Html(html.into()))
            }
            Event::InlineHtml(html) => {
                let rewritten = match self.blocks.rewrite(&html) {
                    Cow::Owned(rewritten) => Some(rewritten),
                    Cow::Borrowed(_) => None,
                };

                Some(Event::InlineHtml(rewritten.map_or(html, CowStr::from)))
            }
            event => Some(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline;
    use crate::render::{Attrs, Block};

    #[test]
    fn heading_ids_match_outline() {
        let body = "# Intro\n\n## **Bold** `code` [link](/x)\n\n### C++ & Rust!\n";
        let html = HtmlRenderer::standard().render(body);
        for heading in outline::extract_all(body) {
            let tag = format!("<h{} id=\"{}\">", heading.level, heading.anchor_id);
            assert!(html.contains(&tag), "missing {tag} in {html}");
        }
    }

    #[test]
    fn heading_ids_follow_the_source_line() {
        let body = "## _Intro_ part\n\n## Results {#custom}\n\n### Closing ###\n";
        let html = HtmlRenderer::standard().render(body);
        let outline = outline::extract_all(body);
        assert_eq!(outline.len(), 3);
        for heading in &outline {
            let id = format!("id=\"{}\"", heading.anchor_id);
            assert!(html.contains(&id), "missing {id} in {html}");
        }

        assert!(html.contains(r#"<h2 id="_intro_-part"><em>Intro</em> part</h2>"#), "{html}");
        assert!(html.contains(r#"<h2 id="results-custom">Results {#custom}</h2>"#), "{html}");
    }

    #[test]
    fn setext_headings_get_no_id() {
        let html = HtmlRenderer::standard().render("Title\n=====\n");
        assert!(html.contains("<h1>Title</h1>"), "{html}");
    }

    #[test]
    fn headings_without_id_text_get_no_id() {
        let html = HtmlRenderer::standard().render("## ???\n");
        assert!(html.contains("<h2>???</h2>"), "{html}");
    }

    #[test]
    fn wrapping_blocks_keep_markdown_inside() {
        let body = "<ExpandableSection title=\"More\">\n\nHidden **text**.\n\n</ExpandableSection>\n";
        let html = HtmlRenderer::standard().render(body);
        assert!(html.contains(r#"<details class="block-expandable-section"><summary>More</summary>"#));
        assert!(html.contains("<strong>text</strong>"));
        assert!(html.contains("</details>"));
    }

    #[test]
    fn inline_blocks() {
        let html = HtmlRenderer::standard().render("Energy <Equation tex=\"E=mc^2\" /> here.\n");
        assert!(html.contains(r#"Energy <span class="equation block-equation" data-tex="E=mc^2"></span> here."#), "{html}");
    }

    #[test]
    fn unknown_tags_pass_through() {
        let html = HtmlRenderer::standard().render("<Hero variant=\"big\" />\n\n<div>plain</div>\n");
        assert!(html.contains("<Hero variant=\"big\" />"));
        assert!(html.contains("<div>plain</div>"));
    }

    #[test]
    fn custom_blocks() {
        struct Callout;

        impl Block for Callout {
            fn open(&self, _: &str, attrs: &Attrs, out: &mut String) {
                out.push_str("<aside class=\"");
                out.push_str(attrs.get_str("kind").unwrap_or("note"));
                out.push_str("\">");
            }

            fn close(&self, _: &str, out: &mut String) {
                out.push_str("</aside>");
            }
        }

        let mut renderer = HtmlRenderer::new(BlockRegistry::new());
        renderer.blocks_mut().register("Callout", Callout);
        let html = renderer.render("<Callout kind=\"tip\">\n\nUse `cargo`.\n\n</Callout>\n");
        assert!(html.contains("<aside class=\"tip\">"));
        assert!(html.contains("<code>cargo</code>"));
        assert!(html.contains("</aside>"));
    }
}
