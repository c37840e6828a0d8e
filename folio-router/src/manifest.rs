use serde::{Deserialize, Serialize};

/// Page served when a navigation can be satisfied by neither network nor store.
pub const DEFAULT_OFFLINE_URL: &str = "/offline.html";

/// Static lists of resources known ahead of time.
///
/// Core and chapter entries are paths relative to the book origin; external
/// resources are absolute URLs. The three lists are expected to be disjoint,
/// see [`crate::Classifier::ambiguities`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub core_files: Vec<String>,
    pub chapter_files: Vec<String>,
    pub external_resources: Vec<String>,
}

impl Manifest {
    pub fn new(
        core_files: Vec<String>,
        chapter_files: Vec<String>,
        external_resources: Vec<String>,
    ) -> Self {
        Self {
            core_files,
            chapter_files,
            external_resources,
        }
    }

    /// Make sure the offline page is precached with the core files.
    pub fn with_offline_url(mut self, offline_url: &str) -> Self {
        if !self.core_files.iter().any(|file| file == offline_url) {
            self.core_files.push(offline_url.to_string());
        }
        self
    }

    /// Append chapters not listed yet, keeping order.
    pub fn extend_chapters(&mut self, chapters: impl IntoIterator<Item = String>) {
        for chapter in chapters {
            if !self.chapter_files.contains(&chapter) {
                self.chapter_files.push(chapter);
            }
        }
    }
}

impl Default for Manifest {
    fn default() -> Self {
        let core_files = [
            "/",
            "/index.html",
            "/toc.html",
            "/about.html",
            "/style.css",
            "/css/style.css",
            "/css/print.css",
            "/js/main.js",
            "/js/interactive.js",
            "/manifest.json",
            DEFAULT_OFFLINE_URL,
        ];
        let chapter_files = (1..=4).map(|n| format!("/chapters/chapter{n}.html"));
        let external_resources = [concat!(
            "https://fonts.googleapis.com/css2",
            "?family=Cairo:wght@300;400;600;700&display=swap"
        )];

        Self {
            core_files: core_files.iter().map(|s| s.to_string()).collect(),
            chapter_files: chapter_files.collect(),
            external_resources: external_resources
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
