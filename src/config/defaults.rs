//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn title() -> String {
        "Untitled".into()
    }

    pub fn url() -> String {
        "/".into()
    }

    pub fn language() -> String {
        "en".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        "Documentation.docc".into()
    }

    pub fn output() -> PathBuf {
        "docs".into()
    }

    pub fn templates() -> PathBuf {
        "templates".into()
    }

    pub fn public() -> PathBuf {
        "public".into()
    }

    pub fn jobs() -> usize {
        1
    }

    pub fn strip() -> Vec<String> {
        vec!["introduction".into()]
    }

    pub mod render {
        pub fn command() -> Vec<String> {
            [
                "curl",
                "--http2",
                "--fail",
                "--silent",
                "--show-error",
                "https://api.swiftinit.org/render/swift-nio/niocore/swift-concurrency?account={account}&api_key={api_key}",
                "-o",
                "{output}",
            ]
            .into_iter()
            .map(String::from)
            .collect()
        }

        pub fn timeout() -> u64 {
            300
        }

        pub fn account_id() -> String {
            "4296918970".into()
        }

        pub fn api_key() -> Option<String> {
            None
        }
    }

    pub mod rss {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "rss.xml".into()
        }
    }

    pub mod sitemap {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "sitemap.xml".into()
        }
    }
}
