use std::path::Path;
use std::collections::BTreeSet;

use jwalk::{Parallelism, WalkDir};

use crate::page::Slug;

/// Lists the slugs of the collection rooted at `root`: the names of its
/// immediate subdirectories.
///
/// Files, hidden directories and names that aren't valid slugs are skipped.
/// Symbolic links are followed. A root that doesn't exist or can't be read
/// yields an empty set; individual unreadable entries are skipped.
pub fn list_slugs<P: AsRef<Path>>(root: P) -> BTreeSet<Slug> {
    let root = root.as_ref();
    if !root.is_dir() {
        log::debug!("collection root {} is not a directory", root.display());
        return BTreeSet::new();
    }

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .skip_hidden(true)
        .parallelism(Parallelism::Serial);

    walker.into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::debug!("skipping unreadable entry in {}: {e}", root.display());
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(|entry| Slug::new(entry.file_name().to_str()?))
        .collect()
}
