use std::{fmt, io};
use std::path::PathBuf;
use std::panic::Location;
use std::error::Error as StdError;

use crate::page::Slug;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A chain of error details, most recent first.
///
/// Each link carries one or more details plus the caller location that
/// created it. Display renders the chain as an indented tree, one context row
/// per line.
#[derive(Debug)]
pub struct Error {
    detail: Vec<Box<dyn ErrorDetail>>,
    prev: Option<Box<Error>>,
    location: &'static Location<'static>,
}

pub trait ErrorDetail: fmt::Display + fmt::Debug + Send + Sync {
    fn context(&self) -> Vec<(Option<String>, String)> { vec![] }
}

impl Error {
    /// Places `self` behind `other`: `other` becomes the outermost detail.
    pub fn chain(self, mut other: Error) -> Self {
        fn push_back(error: Error, behind: &mut Error) {
            match behind.prev.as_mut() {
                Some(prev) => push_back(error, prev),
                None => behind.prev = Some(Box::new(error)),
            }
        }

        push_back(self, &mut other);
        other
    }

    /// The first detail of the outermost link, as a string.
    pub fn message(&self) -> String {
        self.detail.first().map(|d| d.to_string()).unwrap_or_default()
    }

    /// Iterates over the links of the chain, outermost first.
    pub fn links(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |e| e.prev.as_deref())
    }
}

impl ErrorDetail for &(dyn StdError + Send + Sync) {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let mut context = vec![];
        let mut error = self.source();
        while let Some(e) = error {
            context.push((None, e.to_string()));
            error = e.source();
        }

        context
    }
}

impl ErrorDetail for Box<dyn StdError + Send + Sync> {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let error: &(dyn StdError + Send + Sync) = &**self;
        error.context()
    }
}

macro_rules! impl_error_detail_with_std_error {
    ($($T:ty),+ $(,)?) => {
        $(
            impl $crate::error::ErrorDetail for $T {
                fn context(&self) -> Vec<(Option<String>, String)> {
                    let error: &(dyn std::error::Error + Send + Sync) = self;
                    error.context()
                }
            }
        )+
    }
}

impl_error_detail_with_std_error!(io::Error, toml::de::Error, serde_json::Error, serde_yaml::Error);

impl ErrorDetail for String { }
impl ErrorDetail for &'static str { }

impl<T: ErrorDetail + 'static> From<T> for Error {
    #[track_caller]
    fn from(detail: T) -> Self {
        Error {
            prev: None,
            detail: vec![Box::new(detail)],
            location: Location::caller(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_link(f: &mut fmt::Formatter<'_>, depth: usize, e: &Error) -> fmt::Result {
            let indent = " ".repeat(depth * 4);
            let newline = format!("\n{indent}");
            for detail in &e.detail {
                writeln!(f, "{indent}{}", detail.to_string().replace('\n', &newline))?;
                for (key, value) in detail.context() {
                    let value = value.replace('\n', &newline);
                    match key {
                        Some(key) => writeln!(f, "{indent}{key}: {value}")?,
                        None => writeln!(f, "{indent}{value}")?,
                    }
                }

                if std::env::var_os("RUST_BACKTRACE").is_some() {
                    writeln!(f, "{indent}[{}]", e.location)?;
                }
            }

            match &e.prev {
                Some(prev) => write_link(f, depth + 1, prev),
                None => Ok(()),
            }
        }

        write_link(f, 0, self)
    }
}

/// An ad-hoc error built by [`error!`](crate::error!): a message plus
/// optional keyed context rows.
#[derive(Debug)]
pub struct Message {
    pub message: String,
    pub parameters: Vec<(Option<String>, String)>,
}

#[doc(hidden)]
#[macro_export]
macro_rules! err {
    ($($token:tt)*) => (Err($crate::error!($($token)*)));
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($msg:expr, $($rest:tt)*) => (
        $crate::error::Error::from($crate::error::Message {
            message: $msg.to_string(),
            parameters: {
                #[allow(unused_mut)]
                let mut v: Vec<(Option<String>, String)> = Vec::new();
                $crate::error!(@param v $($rest)*);
                v
            },
        })
    );

    ($msg:expr) => ( $crate::error!($msg,) );

    (@param $v:ident $key:expr => $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $key => $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $key:expr => $value:expr) => {
        $v.push((Some($key.to_string()), $value.to_string()));
    };

    (@param $v:ident $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $value:expr) => {
        $v.push((None, $value.to_string()));
    };

    (@param $v:ident $(,)?) => { };
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.message, f)
    }
}

impl ErrorDetail for Message {
    fn context(&self) -> Vec<(Option<String>, String)> {
        self.parameters.clone()
    }
}

pub trait Chainable<T> {
    fn chain(self, other: impl Into<Error>) -> Result<T>;

    fn chain_with<F, E>(self, f: F) -> Result<T>
        where F: FnOnce() -> E, E: Into<Error>;
}

impl<T, E: Into<Error>> Chainable<T> for Result<T, E> {
    #[track_caller]
    fn chain(self, other: impl Into<Error>) -> Result<T> {
        self.map_err(|e| e.into().chain(other.into()))
    }

    fn chain_with<F, Err>(self, f: F) -> Result<T>
        where F: FnOnce() -> Err, Err: Into<Error>,
    {
        self.map_err(|e| e.into().chain(f().into()))
    }
}

/// The one failure a page resolution reports: there is no readable document
/// for the requested slug.
#[derive(Debug)]
pub struct NotFound {
    pub collection: String,
    pub slug: String,
    pub path: Option<PathBuf>,
    source: Option<io::Error>,
}

impl NotFound {
    pub(crate) fn invalid_slug(collection: &str, slug: &str) -> Self {
        NotFound {
            collection: collection.into(),
            slug: slug.into(),
            path: None,
            source: None,
        }
    }

    pub(crate) fn io(collection: &str, slug: &Slug, path: PathBuf, source: io::Error) -> Self {
        NotFound {
            collection: collection.into(),
            slug: slug.to_string(),
            path: Some(path),
            source: Some(source),
        }
    }

    /// Whether the document file is absent, as opposed to present but
    /// unreadable (permissions, invalid UTF-8).
    pub fn is_missing(&self) -> bool {
        match &self.source {
            Some(e) => e.kind() == io::ErrorKind::NotFound,
            None => true,
        }
    }
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no {} entry named `{}`", self.collection, self.slug)
    }
}

impl StdError for NotFound {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn StdError + 'static))
    }
}

impl ErrorDetail for NotFound {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let mut context = vec![];
        if let Some(path) = &self.path {
            context.push((Some("document path".into()), path.display().to_string()));
        }

        if let Some(source) = &self.source {
            context.push((Some("cause".into()), source.to_string()));
        }

        context
    }
}
