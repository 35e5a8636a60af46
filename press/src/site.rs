use std::fmt::Write;
use std::fs;
use std::path::Path;

use folio::rayon::prelude::*;
use folio::error::{Chainable, Result};
use folio::render::HtmlRenderer;
use pulldown_cmark_escape::escape_html;
use folio::{error, Collection, ResolvedPage, Settings};

pub const PAGE_FILE: &str = "index.html";
pub const PAGE_DATA_FILE: &str = "page.json";
pub const LISTING_FILE: &str = "index.json";

#[derive(Debug, Default)]
pub struct Summary {
    pub pages: usize,
    /// Collections with entries that had no readable document, and how many.
    pub skipped: Vec<(String, usize)>,
}

/// Resolves every collection of the site at `site_root` and writes its pages
/// and listings under `output`.
pub fn build(settings: &Settings, site_root: &Path, output: &Path) -> Result<Summary> {
    let renderer = HtmlRenderer::standard();
    let mut summary = Summary::default();
    for collection in settings.collections(site_root) {
        let dir = output.join(collection.name());
        let expected = collection.slugs().len();
        let pages = collection.resolve_all();
        log::debug!("{}: resolved {} of {expected} entries", collection.name(), pages.len());

        pages.par_iter()
            .map(|page| write_page(&renderer, settings, &dir, page))
            .collect::<Result<()>>()
            .chain_with(|| error! {
                "failed to write collection",
                "collection" => collection.name(),
            })?;

        write_listing(&collection, &dir)?;
        summary.pages += pages.len();
        if pages.len() < expected {
            summary.skipped.push((collection.name().to_string(), expected - pages.len()));
        }
    }

    Ok(summary)
}

fn write_page(renderer: &HtmlRenderer, settings: &Settings, dir: &Path, page: &ResolvedPage) -> Result<()> {
    let dir = dir.join(page.slug.as_str());
    fs::create_dir_all(&dir).chain_with(|| error! {
        "failed to create page directory",
        "path" => dir.display(),
    })?;

    let html = page_html(renderer, page, settings.toc_depth);
    write_file(&dir.join(PAGE_FILE), html)?;
    write_file(&dir.join(PAGE_DATA_FILE), serde_json::to_string_pretty(page)?)
}

fn write_listing(collection: &Collection, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).chain_with(|| error! {
        "failed to create collection directory",
        "path" => dir.display(),
    })?;

    let listing = serde_json::to_string_pretty(&collection.listing())?;
    write_file(&dir.join(LISTING_FILE), listing)
}

fn write_file(path: &Path, contents: String) -> Result<()> {
    fs::write(path, contents).chain_with(|| error! {
        "failed to write output file",
        "path" => path.display(),
    })
}

/// A standalone HTML page: the page header, navigation built from the outline
/// down to `toc_depth`, and the rendered body.
pub fn page_html(renderer: &HtmlRenderer, page: &ResolvedPage, toc_depth: usize) -> String {
    let meta = &page.frontmatter;
    let mut html = String::with_capacity(page.body.len() * 2 + 512);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>");
    let _ = escape_html(&mut html, page.title());
    html.push_str("</title>\n");
    if let Some(description) = &meta.description {
        html.push_str("<meta name=\"description\" content=\"");
        let _ = escape_html(&mut html, description);
        html.push_str("\">\n");
    }

    html.push_str("</head>\n<body>\n<header>\n<h1>");
    let _ = escape_html(&mut html, page.title());
    html.push_str("</h1>\n");
    if let Some(date) = &meta.date {
        html.push_str("<time>");
        let _ = escape_html(&mut html, date);
        html.push_str("</time>\n");
    }

    if let Some(description) = &meta.description {
        html.push_str("<p class=\"description\">");
        let _ = escape_html(&mut html, description);
        html.push_str("</p>\n");
    }

    html.push_str("</header>\n");

    let mut entries = page.outline.iter().filter(|h| h.level <= toc_depth).peekable();
    if entries.peek().is_some() {
        html.push_str("<nav class=\"toc\">\n<ul>\n");
        for heading in entries {
            let _ = write!(html, "<li class=\"toc-h{}\"><a href=\"#", heading.level);
            let _ = escape_html(&mut html, &heading.anchor_id);
            html.push_str("\">");
            let _ = escape_html(&mut html, &heading.display_text);
            html.push_str("</a></li>\n");
        }

        html.push_str("</ul>\n</nav>\n");
    }

    html.push_str("<article>\n");
    html.push_str(&renderer.render(&page.body));
    html.push_str("</article>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn builds_a_site() {
        let site = tempfile::tempdir().unwrap();
        let root = site.path();
        write(root, "content/blog/first/index.mdx", "---\ntitle: First <Post>\ndate: 2024-01-02\n---\n## One\n### Deep\n#### Deeper\n");
        write(root, "content/blog/second/index.mdx", "Plain.\n");
        fs::create_dir_all(root.join("content/blog/broken")).unwrap();

        let settings = Settings::default();
        let output = root.join("public");
        let summary = build(&settings, root, &output).unwrap();
        assert_eq!(summary.pages, 2);
        assert_eq!(summary.skipped, [("blog".to_string(), 1)]);

        let html = fs::read_to_string(output.join("blog/first/index.html")).unwrap();
        assert!(html.contains("<title>First &lt;Post&gt;</title>"));
        assert!(html.contains("<time>2024-01-02</time>"));
        assert!(html.contains("<a href=\"#one\">One</a>"));
        assert!(html.contains("<a href=\"#deep\">Deep</a>"));
        assert!(!html.contains("<a href=\"#deeper\">"));
        assert!(html.contains("<h4 id=\"deeper\">Deeper</h4>"));

        let page: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(output.join("blog/first/page.json")).unwrap()
        ).unwrap();
        assert_eq!(page["slug"], "first");
        assert_eq!(page["outline"][0]["anchorId"], "one");

        let listing: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(output.join("blog/index.json")).unwrap()
        ).unwrap();
        assert_eq!(listing[0]["slug"], "first");
        assert_eq!(listing[1]["slug"], "second");
        assert_eq!(listing[1]["category"], "thoughts");

        assert!(!output.join("blog/broken").exists());
        assert!(output.join("projects/index.json").is_file());
    }

    #[test]
    fn pages_without_outline_have_no_nav() {
        let site = tempfile::tempdir().unwrap();
        write(site.path(), "content/projects/p/index.mdx", "Nothing to see.\n");

        let projects = Collection::new(site.path().join("content"), "projects");
        let page = projects.resolve("p").unwrap();
        let html = page_html(&HtmlRenderer::standard(), &page, 3);
        assert!(!html.contains("<nav"));
        assert!(html.contains("<h1>p</h1>"));
        assert!(html.contains("<p>Nothing to see.</p>"));
    }
}
