use std::fmt;
use std::sync::Arc;
use std::borrow::Borrow;

use derive_more::Deref;
use serde::Serialize;

use crate::frontmatter::Frontmatter;
use crate::outline::HeadingNode;

/// The name of one document within a collection, derived from the name of
/// the directory holding it.
///
/// A slug is never empty, never `.` or `..`, and never contains a path
/// separator or NUL, so joining it onto a collection root cannot escape that
/// root.
///
/// ```rust
/// use folio::page::Slug;
///
/// assert!(Slug::new("parallel-ising").is_some());
/// assert!(Slug::new("..").is_none());
/// assert!(Slug::new("a/b").is_none());
/// ```
#[derive(Deref, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[deref(forward)]
#[serde(transparent)]
pub struct Slug(Arc<str>);

impl Slug {
    pub fn new(name: &str) -> Option<Slug> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(|c: char| c == '/' || c == '\\' || c == '\0');

        (!invalid).then(|| Slug(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Slug {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A fully resolved document: metadata with defaults applied, the body with
/// its header block removed, and the body's outline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPage {
    pub slug: Slug,
    pub frontmatter: Frontmatter,
    pub body: String,
    pub outline: Vec<HeadingNode>,
}

impl ResolvedPage {
    /// The page title. Always present once assembled.
    pub fn title(&self) -> &str {
        self.frontmatter.title.as_deref().unwrap_or(self.slug.as_str())
    }

    pub fn listing_entry(&self) -> ListingEntry {
        ListingEntry::new(self.slug.clone(), self.frontmatter.clone())
    }
}

/// A page summary as shown in a collection index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingEntry {
    pub slug: Slug,
    #[serde(flatten)]
    pub frontmatter: Frontmatter,
}

impl ListingEntry {
    pub fn new(slug: Slug, mut frontmatter: Frontmatter) -> Self {
        fill_title(&slug, &mut frontmatter);
        ListingEntry { slug, frontmatter }
    }
}

fn fill_title(slug: &Slug, frontmatter: &mut Frontmatter) {
    if frontmatter.title.is_none() {
        frontmatter.title = Some(slug.to_string());
    }
}

/// Combines the pipeline's outputs into a page. The title falls back to the
/// slug; nothing else is filled in.
pub fn assemble(
    slug: Slug,
    mut frontmatter: Frontmatter,
    body: String,
    outline: Vec<HeadingNode>,
) -> ResolvedPage {
    fill_title(&slug, &mut frontmatter);
    ResolvedPage { slug, frontmatter, body, outline }
}
