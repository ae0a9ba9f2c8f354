//! External rendering of article folders into `<name>.html`.
//!
//! Rendering is the expensive step of a build, so it is skipped whenever the
//! folder already holds a rendered file from an earlier run. Delete
//! `<name>.html` to force a fresh render.

mod command;

pub use command::CommandRenderer;

use crate::{content::ArticleFolder, log};
use std::{
    fs, io,
    path::{Path, PathBuf},
    process::ExitStatus,
    time::Duration,
};
use thiserror::Error;

/// Turns one article folder into its rendered HTML file.
///
/// Implementations block until the file exists, the tool fails, or `timeout`
/// elapses. They share no mutable state, so one renderer can serve several
/// articles at once.
pub trait Renderer: Sync {
    fn render(&self, folder: &ArticleFolder, timeout: Duration) -> Result<PathBuf, RenderError>;
}

/// Why an external render did not produce a usable file.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no API key configured; set API_KEY or [build.render].api_key")]
    MissingCredentials,

    #[error("failed to start `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed while waiting for `{command}`")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}{}", format_stderr(.stderr))]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("`{command}` did not finish within {}s", .timeout.as_secs_f32())]
    Timeout { command: String, timeout: Duration },

    #[error("renderer finished without producing {}", .path.display())]
    MissingOutput { path: PathBuf },
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Where an article's rendered HTML came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Left over from a previous run; the renderer was not called.
    Cached(PathBuf),
    /// Produced by the renderer during this run.
    Fresh(PathBuf),
}

impl Rendered {
    pub fn path(&self) -> &Path {
        match self {
            Self::Cached(path) | Self::Fresh(path) => path,
        }
    }

    pub const fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }
}

/// Make sure `<name>.html` exists, calling `renderer` only when it does not.
///
/// A failed render removes whatever the tool left at `<name>.html`, so a
/// truncated file is never picked up as cached by a later run.
pub fn ensure_rendered<R>(
    folder: &ArticleFolder,
    renderer: &R,
    timeout: Duration,
) -> Result<Rendered, RenderError>
where
    R: Renderer + ?Sized,
{
    let cached = folder.rendered();
    if cached.is_file() {
        return Ok(Rendered::Cached(cached));
    }

    let path = match renderer.render(folder, timeout) {
        Ok(path) => path,
        Err(e) => {
            discard_partial(&cached);
            return Err(e);
        }
    };
    if !path.is_file() {
        return Err(RenderError::MissingOutput { path });
    }
    Ok(Rendered::Fresh(path))
}

fn discard_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log!("warn"; "removed partial render {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log!("warn"; "failed to remove partial render {}: {}", path.display(), e),
    }
}
