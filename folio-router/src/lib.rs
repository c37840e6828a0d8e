//! Request classification for the offline router.
//!
//! Every GET request the router intercepts falls into exactly one
//! [`RequestClass`], and the class alone decides which caching strategy runs.
//!
//! The main components of this module are:
//!
//! - `Classifier`: resolves the manifest against the book origin and classifies
//!   requests.
//! - `ClassificationRule`: an internal trait, one implementation per class.
//! - `Manifest`: the static precache lists.
//!
//! Rules are evaluated in a fixed order (navigation, core file, chapter file,
//! external resource) and the first match wins; anything else is `Other`.
//!
//! # Examples
//!
//! ```
//! use folio_router::{Classifier, CoreFileMatch, Manifest, RequestClass};
//! use folio_router::url::Url;
//!
//! let origin = Url::parse("https://book.example/").unwrap();
//! let classifier =
//!     Classifier::new(origin, Manifest::default(), CoreFileMatch::Exact).unwrap();
//!
//! let url = Url::parse("https://book.example/chapters/chapter2.html").unwrap();
//! assert_eq!(classifier.classify_url(&url), RequestClass::ChapterFile);
//! ```
#![warn(clippy::unwrap_used)]
use folio_cache::{FetchRequest, RequestMode, http::Method};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
pub use url;
use url::{Position, Url};

mod manifest;

pub use manifest::{DEFAULT_OFFLINE_URL, Manifest};

/// Directory segment every chapter page lives under.
pub const CHAPTERS_SEGMENT: &str = "/chapters/";
pub const HTML_EXTENSION: &str = ".html";

/// URLs grouped by class, in first-seen order.
pub type ClassifiedUrls = IndexMap<RequestClass, Vec<Url>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestClass {
    Navigation,
    CoreFile,
    ChapterFile,
    ExternalResource,
    Other,
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestClass::Navigation => "navigation",
            RequestClass::CoreFile => "core-file",
            RequestClass::ChapterFile => "chapter-file",
            RequestClass::ExternalResource => "external-resource",
            RequestClass::Other => "other",
        };
        f.write_str(name)
    }
}

/// How request paths are matched against core-file entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoreFileMatch {
    /// Same origin and identical path.
    #[default]
    Exact,
    /// Path ends with the entry minus its leading slash, any origin. The root
    /// entry only matches `/`.
    Suffix,
}

/// A manifest entry that satisfies more than one class rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Ambiguity {
    pub url: Url,
    pub classes: Vec<RequestClass>,
}

trait ClassificationRule: Send + Sync {
    fn class(&self) -> RequestClass;
    fn matches(&self, request: &FetchRequest) -> bool;
}

struct NavigationRule;

struct CoreFileRule {
    files: Vec<Url>,
    mode: CoreFileMatch,
}

struct ChapterFileRule;

struct ExternalResourceRule {
    prefixes: Vec<String>,
}

impl ClassificationRule for NavigationRule {
    fn class(&self) -> RequestClass {
        RequestClass::Navigation
    }

    fn matches(&self, request: &FetchRequest) -> bool {
        request.mode == RequestMode::Navigate
            || (request.method == Method::GET
                && request.accept().is_some_and(|a| a.contains("text/html")))
    }
}

impl ClassificationRule for CoreFileRule {
    fn class(&self) -> RequestClass {
        RequestClass::CoreFile
    }

    fn matches(&self, request: &FetchRequest) -> bool {
        let path = request.url.path();
        match self.mode {
            CoreFileMatch::Exact => self.files.iter().any(|file| {
                file.origin() == request.url.origin() && file.path() == path
            }),
            CoreFileMatch::Suffix => self.files.iter().any(|file| {
                match file.path().strip_prefix('/').unwrap_or(file.path()) {
                    "" => path == "/",
                    suffix => path.ends_with(suffix),
                }
            }),
        }
    }
}

impl ClassificationRule for ChapterFileRule {
    fn class(&self) -> RequestClass {
        RequestClass::ChapterFile
    }

    fn matches(&self, request: &FetchRequest) -> bool {
        let path = request.url.path();
        path.contains(CHAPTERS_SEGMENT) && path.ends_with(HTML_EXTENSION)
    }
}

impl ClassificationRule for ExternalResourceRule {
    fn class(&self) -> RequestClass {
        RequestClass::ExternalResource
    }

    fn matches(&self, request: &FetchRequest) -> bool {
        let url = without_query(&request.url);
        self.prefixes.iter().any(|prefix| url.starts_with(prefix.as_str()))
    }
}

fn without_query(url: &Url) -> &str {
    &url[..Position::AfterPath]
}

/// Classifies requests against a manifest resolved on the book origin.
pub struct Classifier {
    origin: Url,
    manifest: Manifest,
    core_urls: Vec<Url>,
    chapter_urls: Vec<Url>,
    external_urls: Vec<Url>,
    rules: Vec<Box<dyn ClassificationRule>>,
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("origin", &self.origin.as_str())
            .field("rules_count", &self.rules.len())
            .finish()
    }
}

impl Classifier {
    /// Creates a classifier, resolving every manifest entry against `origin`.
    ///
    /// # Returns
    ///
    /// An `Err` with the `url::ParseError` of the first entry that does not
    /// resolve to a URL.
    pub fn new(
        origin: Url,
        manifest: Manifest,
        core_match: CoreFileMatch,
    ) -> Result<Self, url::ParseError> {
        let resolve = |entries: &[String]| {
            entries
                .iter()
                .map(|entry| origin.join(entry))
                .collect::<Result<Vec<_>, _>>()
        };
        let core_urls = resolve(&manifest.core_files)?;
        let chapter_urls = resolve(&manifest.chapter_files)?;
        let external_urls = resolve(&manifest.external_resources)?;

        let rules: Vec<Box<dyn ClassificationRule>> = vec![
            Box::new(NavigationRule),
            Box::new(CoreFileRule {
                files: core_urls.clone(),
                mode: core_match,
            }),
            Box::new(ChapterFileRule),
            Box::new(ExternalResourceRule {
                prefixes: external_urls
                    .iter()
                    .map(|url| without_query(url).to_string())
                    .collect(),
            }),
        ];

        Ok(Self {
            origin,
            manifest,
            core_urls,
            chapter_urls,
            external_urls,
            rules,
        })
    }

    /// Class of a request. Callers only pass GET requests over HTTP(S).
    pub fn classify(&self, request: &FetchRequest) -> RequestClass {
        self.rules
            .iter()
            .find(|rule| rule.matches(request))
            .map(|rule| rule.class())
            .unwrap_or(RequestClass::Other)
    }

    /// Class of a plain GET for `url`, without navigation hints.
    pub fn classify_url(&self, url: &Url) -> RequestClass {
        self.classify(&FetchRequest::get(url.clone()))
    }

    /// Groups URLs by their class.
    pub fn classify_urls(&self, urls: Vec<Url>) -> ClassifiedUrls {
        let mut classified = ClassifiedUrls::new();
        for url in urls {
            classified.entry(self.classify_url(&url)).or_default().push(url);
        }
        classified
    }

    /// Manifest entries matched by more than one non-navigation rule.
    ///
    /// The first matching rule still decides the class; this only surfaces
    /// the overlap so it can be fixed in the manifest.
    pub fn ambiguities(&self) -> Vec<Ambiguity> {
        let entries = self
            .core_urls
            .iter()
            .chain(&self.chapter_urls)
            .chain(&self.external_urls);
        entries
            .filter_map(|url| {
                let request = FetchRequest::get(url.clone());
                let classes: Vec<_> = self
                    .rules
                    .iter()
                    .filter(|rule| rule.class() != RequestClass::Navigation)
                    .filter(|rule| rule.matches(&request))
                    .map(|rule| rule.class())
                    .collect();
                (classes.len() > 1).then(|| Ambiguity {
                    url: url.clone(),
                    classes,
                })
            })
            .collect()
    }

    /// Resolve a manifest-style path against the origin.
    pub fn resolve(&self, entry: &str) -> Result<Url, url::ParseError> {
        self.origin.join(entry)
    }

    /// Same scheme, host and port as the book origin.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn core_urls(&self) -> &[Url] {
        &self.core_urls
    }

    pub fn chapter_urls(&self) -> &[Url] {
        &self.chapter_urls
    }

    pub fn external_urls(&self) -> &[Url] {
        &self.external_urls
    }
}
