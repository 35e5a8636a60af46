use std::fs;
use std::sync::Arc;
use std::path::PathBuf;
use std::time::SystemTime;

use dashmap::DashMap;

use crate::collection::Collection;
use crate::error::NotFound;
use crate::page::{ResolvedPage, Slug};

type Hasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

/// Everything a resolved page depends on besides the document's contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    path: PathBuf,
    default_category: Option<Arc<str>>,
    header_scan_limit: usize,
}

impl Key {
    fn new(collection: &Collection, slug: &Slug) -> Key {
        Key {
            path: collection.document_path(slug),
            default_category: collection.default_category().map(Arc::from),
            header_scan_limit: collection.header_scan_limit(),
        }
    }
}

#[derive(Debug, Clone)]
struct Cached {
    modified: SystemTime,
    page: Arc<ResolvedPage>,
}

/// Memoises resolved pages by document path.
///
/// A cached page is reused while its document's modification time is
/// unchanged and it was resolved with the same collection settings. Shared
/// freely across threads and collections.
#[derive(Debug, Clone, Default)]
pub struct PageCache {
    pages: Arc<DashMap<Key, Cached, Hasher>>,
}

impl PageCache {
    pub fn new() -> Self {
        PageCache::default()
    }

    /// Resolves `slug` in `collection`, reusing the cached page if the
    /// document hasn't been modified since it was resolved.
    pub fn resolve(&self, collection: &Collection, slug: &str) -> Result<Arc<ResolvedPage>, NotFound> {
        let slug = Slug::new(slug).ok_or_else(|| NotFound::invalid_slug(collection.name(), slug))?;
        let key = Key::new(collection, &slug);
        let modified = match fs::metadata(&key.path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                self.pages.remove(&key);
                return Err(NotFound::io(collection.name(), &slug, key.path, e));
            }
        };

        let hit = self.pages.get(&key)
            .filter(|cached| cached.modified == modified)
            .map(|cached| cached.page.clone());

        if let Some(page) = hit {
            return Ok(page);
        }

        log::debug!("resolving {}/{slug}", collection.name());
        let page = Arc::new(collection.resolve(slug.as_str())?);
        self.pages.insert(key, Cached { modified, page: page.clone() });
        Ok(page)
    }

    /// Drops the cached page for `slug` in `collection`, if any.
    pub fn invalidate(&self, collection: &Collection, slug: &str) {
        if let Some(slug) = Slug::new(slug) {
            self.pages.remove(&Key::new(collection, &slug));
        }
    }

    pub fn clear(&self) {
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use super::*;

    fn write(collection: &Collection, slug: &str, contents: &str) {
        let path = collection.document_path(&Slug::new(slug).unwrap());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn touch(collection: &Collection, slug: &str, offset: u64) {
        let path = collection.document_path(&Slug::new(slug).unwrap());
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(offset)).unwrap();
    }

    #[test]
    fn hit_until_modified() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Collection::new(dir.path(), "blog");
        write(&blog, "post", "---\ntitle: One\n---\n");
        touch(&blog, "post", 1_000);

        let cache = PageCache::new();
        let first = cache.resolve(&blog, "post").unwrap();
        let second = cache.resolve(&blog, "post").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        write(&blog, "post", "---\ntitle: Two\n---\n");
        touch(&blog, "post", 2_000);
        let third = cache.resolve(&blog, "post").unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.title(), "Two");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn same_name_different_roots() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let blog_a = Collection::new(a.path(), "blog");
        let blog_b = Collection::new(b.path(), "blog");
        write(&blog_a, "post", "---\ntitle: Site A\n---\n");
        write(&blog_b, "post", "---\ntitle: Site B\n---\n");
        touch(&blog_a, "post", 1_000);
        touch(&blog_b, "post", 1_000);

        let cache = PageCache::new();
        assert_eq!(cache.resolve(&blog_a, "post").unwrap().title(), "Site A");
        assert_eq!(cache.resolve(&blog_b, "post").unwrap().title(), "Site B");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn collection_settings_are_part_of_the_key() {
        let dir = tempfile::tempdir().unwrap();
        let plain = Collection::new(dir.path(), "blog");
        let thoughts = plain.clone().with_default_category("thoughts");
        let short = plain.clone().with_header_scan_limit(1);
        write(&plain, "post", "intro\n---\nbody\n");

        let cache = PageCache::new();
        assert_eq!(cache.resolve(&plain, "post").unwrap().frontmatter.category, None);
        assert_eq!(cache.resolve(&thoughts, "post").unwrap().frontmatter.category.as_deref(), Some("thoughts"));
        assert_eq!(cache.resolve(&plain, "post").unwrap().body, "body\n");
        assert_eq!(cache.resolve(&short, "post").unwrap().body, "intro\n---\nbody");
        assert_eq!(cache.len(), 3);

        cache.invalidate(&thoughts, "post");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn misses_are_not_stored() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Collection::new(dir.path(), "blog");
        let cache = PageCache::new();

        assert!(cache.resolve(&blog, "ghost").unwrap_err().is_missing());
        assert!(cache.resolve(&blog, "../ghost").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn deleted_documents_are_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Collection::new(dir.path(), "blog");
        write(&blog, "gone", "soon");

        let cache = PageCache::new();
        cache.resolve(&blog, "gone").unwrap();
        assert_eq!(cache.len(), 1);

        fs::remove_file(blog.document_path(&Slug::new("gone").unwrap())).unwrap();
        assert!(cache.resolve(&blog, "gone").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Collection::new(dir.path(), "blog");
        write(&blog, "a", "a");
        write(&blog, "b", "b");

        let cache = PageCache::new();
        cache.resolve(&blog, "a").unwrap();
        cache.resolve(&blog, "b").unwrap();
        assert_eq!(cache.len(), 2);

        cache.invalidate(&blog, "a");
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
