use std::fmt::Display;

/// Coarse classification of the site the tracked tab is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    GoogleColab,
    GoogleDocs,
    BrowserApp,
}

impl Platform {
    /// Three-way classification used when the popup opens. Matches are checked
    /// in priority order, Colab before Docs before the default.
    pub fn detect(url: &str) -> Self {
        if url.contains("colab") {
            Platform::GoogleColab
        } else if url.contains("docs.google") {
            Platform::GoogleDocs
        } else {
            Platform::BrowserApp
        }
    }

    /// Two-way split used when a report is submitted. Intentionally coarser
    /// than [Platform::detect]: the Docs label never appears in a report.
    pub fn detect_coarse(url: &str) -> Self {
        if url.contains("colab") {
            Platform::GoogleColab
        } else {
            Platform::BrowserApp
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::GoogleColab => write!(f, "Google Colab"),
            Platform::GoogleDocs => write!(f, "Google Docs"),
            Platform::BrowserApp => write!(f, "Browser App"),
        }
    }
}
