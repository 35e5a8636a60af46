use std::fs;
use std::sync::Arc;
use std::cmp::Reverse;
use std::path::{Path, PathBuf};
use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::error::NotFound;
use crate::frontmatter::{self, Frontmatter};
use crate::page::{self, ListingEntry, ResolvedPage, Slug};
use crate::{outline, scan, trim};

/// The file each slug directory holds unless configured otherwise.
pub const DEFAULT_DOCUMENT: &str = "index.mdx";

/// A named set of documents laid out as `<content>/<name>/<slug>/<document>`.
///
/// ```rust,no_run
/// use folio::Collection;
///
/// let blog = Collection::new("content", "blog").with_default_category("thoughts");
/// for entry in blog.listing() {
///     println!("{}: {}", entry.slug, entry.frontmatter.title.unwrap_or_default());
/// }
///
/// let page = blog.resolve("hello-world")?;
/// println!("{} headings", page.outline.len());
/// # Ok::<(), folio::error::NotFound>(())
/// ```
#[derive(Debug, Clone)]
pub struct Collection {
    name: Arc<str>,
    root: PathBuf,
    document: Arc<str>,
    default_category: Option<Arc<str>>,
    header_scan_limit: usize,
}

impl Collection {
    pub fn new<P, N>(content_root: P, name: N) -> Collection
        where P: AsRef<Path>, N: Into<Arc<str>>
    {
        let name = name.into();
        Collection {
            root: content_root.as_ref().join(&*name),
            name,
            document: DEFAULT_DOCUMENT.into(),
            default_category: None,
            header_scan_limit: trim::HEADER_SCAN_LIMIT,
        }
    }

    pub fn with_document<D: Into<Arc<str>>>(mut self, document: D) -> Self {
        self.document = document.into();
        self
    }

    /// The category given to documents that don't name one.
    pub fn with_default_category<C: Into<Arc<str>>>(mut self, category: C) -> Self {
        self.default_category = Some(category.into());
        self
    }

    pub fn with_header_scan_limit(mut self, limit: usize) -> Self {
        self.header_scan_limit = limit;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn default_category(&self) -> Option<&str> {
        self.default_category.as_deref()
    }

    pub fn header_scan_limit(&self) -> usize {
        self.header_scan_limit
    }

    pub fn slugs(&self) -> BTreeSet<Slug> {
        scan::list_slugs(&self.root)
    }

    pub fn document_path(&self, slug: &Slug) -> PathBuf {
        self.root.join(slug.as_str()).join(&*self.document)
    }

    /// Reads and resolves the document named `slug`.
    ///
    /// Fails only if `slug` isn't a valid slug or its document can't be read
    /// as UTF-8 text.
    pub fn resolve(&self, slug: &str) -> Result<ResolvedPage, NotFound> {
        let slug = Slug::new(slug).ok_or_else(|| NotFound::invalid_slug(&self.name, slug))?;
        let raw = self.read(&slug)?;
        Ok(self.resolve_source(slug, &raw))
    }

    /// Runs the resolution pipeline over an already-read document.
    pub fn resolve_source(&self, slug: Slug, raw: &str) -> ResolvedPage {
        let (frontmatter, body) = frontmatter::parse(raw);
        let frontmatter = self.apply_defaults(frontmatter);
        let body = trim::trim_header_within(&body, self.header_scan_limit);
        let outline = outline::extract_all(body);
        page::assemble(slug, frontmatter, body.to_string(), outline)
    }

    /// Resolves every slug in parallel, in slug order. Documents that can't
    /// be read are logged and left out.
    pub fn resolve_all(&self) -> Vec<ResolvedPage> {
        self.slugs()
            .into_par_iter()
            .filter_map(|slug| match self.read(&slug) {
                Ok(raw) => Some(self.resolve_source(slug, &raw)),
                Err(e) => {
                    log::warn!("skipping unreadable document: {e}");
                    None
                }
            })
            .collect()
    }

    /// Every readable entry, newest first. Entries without a parseable date
    /// come last; ties are ordered by slug.
    pub fn listing(&self) -> Vec<ListingEntry> {
        let mut entries: Vec<ListingEntry> = self.slugs()
            .into_par_iter()
            .filter_map(|slug| match self.read(&slug) {
                Ok(raw) => {
                    let (frontmatter, _) = frontmatter::parse(&raw);
                    Some(ListingEntry::new(slug, self.apply_defaults(frontmatter)))
                }
                Err(e) => {
                    log::warn!("leaving unreadable document out of the listing: {e}");
                    None
                }
            })
            .collect();

        entries.sort_by_cached_key(|e| (Reverse(e.frontmatter.parsed_date()), e.slug.clone()));
        entries
    }

    /// The [`listing()`](Self::listing) entries whose category is `category`.
    pub fn listing_by_category(&self, category: &str) -> Vec<ListingEntry> {
        let mut entries = self.listing();
        entries.retain(|e| e.frontmatter.category.as_deref() == Some(category));
        entries
    }

    fn read(&self, slug: &Slug) -> Result<String, NotFound> {
        let path = self.document_path(slug);
        fs::read_to_string(&path).map_err(|e| NotFound::io(&self.name, slug, path, e))
    }

    fn apply_defaults(&self, mut frontmatter: Frontmatter) -> Frontmatter {
        if frontmatter.category.is_none() {
            frontmatter.category = self.default_category.as_deref().map(String::from);
        }

        frontmatter
    }
}
