#![doc = svgbobdoc::transform!(
//! Content resolution for a portfolio and blog.
//!
//! # Overview
//!
//! Folio turns a directory of content documents into pages ready to render.
//! Documents live at `<content>/<collection>/<slug>/index.mdx`: one directory
//! per document, named by the document's slug, grouped into collections such
//! as `blog` and `projects`.
//!
//! Each document goes through the same pipeline:
//!
//! ```svgbob
//!  +---------+   slugs   +-------------+  body   +-------------+
//!  | scanner |---------->| front matter|-------->| header trim |
//!  +---------+           +------+------+         +------+------+
//!                               |                       |
//!                               | metadata              | trimmed body
//!                               v                       v
//!                        +-------------+  outline +-----------+
//!                        |  assembler  |<---------|  outline  |
//!                        +------+------+          +-----------+
//!                               |
//!                               v
//!                         ResolvedPage
//! ```
//!
//!   * The **scanner** ([`scan`]) lists the slugs of a collection.
//!   * The **front matter** parser ([`frontmatter`]) splits a document into
//!     its metadata block and its body.
//!   * The **header trim** ([`trim`]) drops a custom header block closed by a
//!     horizontal rule near the top of the body.
//!   * The **outline** extractor ([`outline`]) lists the body's headings with
//!     their anchor ids.
//!   * The **assembler** ([`page`]) puts it all together into a
//!     [`ResolvedPage`].
//!
//! No stage fails on malformed input: missing or broken metadata, a missing
//! header and a body without headings all have sensible defaults. The only
//! failure is [`NotFound`](error::NotFound): there's no readable document for
//! the requested slug.
//!
//! A [`Collection`] runs the pipeline for one collection, one slug at a time
//! or all of them in parallel, and lists its entries newest first. The
//! [`PageCache`] memoises resolved pages until their documents change, and
//! the [`render`] module turns page bodies into HTML, rendering embedded
//! blocks like `<Equation />` through a [`BlockRegistry`](render::BlockRegistry).
)]

#[macro_use]
pub mod error;
pub mod util;
pub mod value;
pub mod scan;
pub mod frontmatter;
pub mod trim;
pub mod outline;
pub mod page;
pub mod collection;
pub mod cache;
pub mod render;
pub mod config;

pub use collection::Collection;
pub use cache::PageCache;
pub use config::Settings;
pub use frontmatter::Frontmatter;
pub use outline::HeadingNode;
pub use page::{ListingEntry, ResolvedPage, Slug};
pub use scan::list_slugs;

pub use rayon;
pub use pulldown_cmark;

#[cfg(test)] static_assertions::assert_impl_all!(ResolvedPage: Send, Sync);
#[cfg(test)] static_assertions::assert_impl_all!(Collection: Send, Sync);
#[cfg(test)] static_assertions::assert_impl_all!(PageCache: Send, Sync);
#[cfg(test)] static_assertions::assert_impl_all!(render::BlockRegistry: Send, Sync);
#[cfg(test)] static_assertions::assert_impl_all!(render::HtmlRenderer: Send, Sync);
#[cfg(test)] static_assertions::assert_impl_all!(error::NotFound: Send, Sync);
#[cfg(test)] static_assertions::assert_impl_all!(error::Error: Send, Sync);
