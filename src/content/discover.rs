//! Article folder discovery.
//!
//! A folder is an *article folder* when it contains both `<name>.md` and
//! `metadata.yml`, where `<name>` is the folder's own base name. Every other
//! folder is a *container* and is searched recursively.
//!
//! ```text
//! Documentation.docc/              container
//! ├── tutorials/                   container
//! │   ├── getting-started/         article  (getting-started.md + metadata.yml)
//! │   │   └── images/              never visited
//! │   └── drafts/                  container
//! └── hummingbird/                 article
//! ```
//!
//! [`discover`] returns a lazy iterator over article folders in depth-first
//! pre-order. It never descends into an article folder, and an unreadable
//! subtree produces one `Err` item before the walk moves on to its siblings.

use super::meta::METADATA_FILE;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Error for a subtree the walker could not read.
pub type DiscoverError = walkdir::Error;

/// A folder holding one article's sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFolder {
    /// Folder path
    pub path: PathBuf,
    /// Folder base name, which also names the `.md` and `.html` files
    pub name: String,
}

impl ArticleFolder {
    /// Classify `path`. Returns `None` for container folders.
    pub fn from_dir(path: &Path) -> Option<Self> {
        let name = folder_name(path)?;
        is_article_folder(path).then(|| Self {
            path: path.to_path_buf(),
            name: name.to_owned(),
        })
    }

    /// `<name>.md`
    pub fn markdown(&self) -> PathBuf {
        self.path.join(format!("{}.md", self.name))
    }

    /// `<name>.html`, produced by the external renderer.
    pub fn rendered(&self) -> PathBuf {
        self.path.join(format!("{}.html", self.name))
    }

    pub fn metadata(&self) -> PathBuf {
        self.path.join(METADATA_FILE)
    }

    /// Optional `images/` folder.
    pub fn images(&self) -> PathBuf {
        self.path.join("images")
    }

    /// Optional `cover.jpg`.
    pub fn cover(&self) -> PathBuf {
        self.path.join("cover.jpg")
    }
}

/// Whether `path` holds both `<name>.md` and `metadata.yml`.
pub fn is_article_folder(path: &Path) -> bool {
    folder_name(path).is_some_and(|name| {
        path.join(format!("{name}.md")).exists() && path.join(METADATA_FILE).exists()
    })
}

fn folder_name(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()
}

/// Walk `root` and yield every article folder beneath it (including `root`
/// itself when it is one).
pub fn discover(root: &Path) -> Discover {
    Discover {
        walker: WalkDir::new(root).sort_by_file_name().into_iter(),
    }
}

/// Lazy, finite iterator returned by [`discover`].
pub struct Discover {
    walker: walkdir::IntoIter,
}

impl Iterator for Discover {
    type Item = Result<ArticleFolder, DiscoverError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err)),
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(folder) = ArticleFolder::from_dir(entry.path()) {
                // Articles are leaves: their own subfolders are assets.
                self.walker.skip_current_dir();
                return Some(Ok(folder));
            }
        }
    }
}
