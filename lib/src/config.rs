use std::fs;
use std::path::{Path, PathBuf};
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::collection::{Collection, DEFAULT_DOCUMENT};
use crate::error::{Chainable, Result};
use crate::outline::MAX_LEVEL;
use crate::page::Slug;
use crate::trim::HEADER_SCAN_LIMIT;
use crate::value::Dict;

/// The settings file looked for at the root of a site.
pub const CONFIG_FILE: &str = "folio.toml";

/// Site settings, read from [`CONFIG_FILE`].
///
/// Every key is optional. Keys not listed here are kept in `extra`.
///
/// ```toml
/// content = "content"
/// output = "public"
/// toc_depth = 3
/// header_scan_limit = 40
///
/// [[collection]]
/// name = "blog"
/// document = "index.mdx"
/// default_category = "thoughts"
///
/// [[collection]]
/// name = "projects"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// The content root, relative to the site root.
    pub content: PathBuf,
    /// The output directory, relative to the site root.
    pub output: PathBuf,
    /// The deepest heading level shown in page navigation.
    pub toc_depth: usize,
    pub header_scan_limit: usize,
    #[serde(rename = "collection")]
    pub collections: Vec<CollectionSettings>,
    #[serde(flatten)]
    pub extra: Dict,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CollectionSettings {
    pub name: String,
    #[serde(default = "default_document")]
    pub document: String,
    #[serde(default)]
    pub default_category: Option<String>,
}

fn default_document() -> String {
    DEFAULT_DOCUMENT.into()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            content: "content".into(),
            output: "public".into(),
            toc_depth: 3,
            header_scan_limit: HEADER_SCAN_LIMIT,
            collections: vec![
                CollectionSettings {
                    name: "blog".into(),
                    document: default_document(),
                    default_category: Some("thoughts".into()),
                },
                CollectionSettings {
                    name: "projects".into(),
                    document: default_document(),
                    default_category: None,
                },
            ],
            extra: Dict::new(),
        }
    }
}

impl Settings {
    /// Reads the settings of the site at `site_root`, falling back to the
    /// defaults when it has no settings file.
    pub fn discover<P: AsRef<Path>>(site_root: P) -> Result<Settings> {
        let path = site_root.as_ref().join(CONFIG_FILE);
        if !path.is_file() {
            log::debug!("no {} in {}; using defaults", CONFIG_FILE, site_root.as_ref().display());
            return Ok(Settings::default());
        }

        let string = fs::read_to_string(&path)
            .chain_with(|| error! {
                "failed to read settings file",
                "path" => path.display(),
            })?;

        Settings::from_toml(&string)
            .chain_with(|| error! {
                "invalid settings file",
                "path" => path.display(),
            })
    }

    pub fn from_toml(string: &str) -> Result<Settings> {
        let settings: Settings = toml::from_str(string)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if !(1..=MAX_LEVEL).contains(&self.toc_depth) {
            return err! {
                "`toc_depth` is out of range",
                "expected" => format!("1 through {MAX_LEVEL}"),
                "found" => self.toc_depth,
            };
        }

        let mut seen = BTreeSet::new();
        for collection in &self.collections {
            if Slug::new(&collection.name).is_none() {
                return err! {
                    "invalid collection name",
                    "name" => format!("{:?}", collection.name),
                    "a collection name must be a single directory name",
                };
            }

            if Slug::new(&collection.document).is_none() {
                return err! {
                    "invalid collection document name",
                    "collection" => &collection.name,
                    "document" => format!("{:?}", collection.document),
                };
            }

            if !seen.insert(&collection.name) {
                return err!("duplicate collection", "name" => &collection.name);
            }
        }

        Ok(())
    }

    /// The content root of the site at `site_root`.
    pub fn content_root<P: AsRef<Path>>(&self, site_root: P) -> PathBuf {
        site_root.as_ref().join(&self.content)
    }

    /// The configured collections of the site at `site_root`.
    pub fn collections<P: AsRef<Path>>(&self, site_root: P) -> Vec<Collection> {
        let content_root = self.content_root(site_root);
        self.collections.iter()
            .map(|c| {
                let collection = Collection::new(&content_root, c.name.as_str())
                    .with_document(c.document.as_str())
                    .with_header_scan_limit(self.header_scan_limit);

                match &c.default_category {
                    Some(category) => collection.with_default_category(category.as_str()),
                    None => collection,
                }
            })
            .collect()
    }
}
