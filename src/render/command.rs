//! Renderer backed by an external command.
//!
//! The command is an argv list taken from `[build.render]`. Each argument may
//! contain placeholders that are substituted per article:
//!
//! | Placeholder  | Value                                  |
//! |--------------|----------------------------------------|
//! | `{name}`     | article folder name                    |
//! | `{folder}`   | article folder path                    |
//! | `{output}`   | `<name>.html`                          |
//! | `{account}`  | `account_id`                           |
//! | `{api_key}`  | `api_key` (required if referenced)     |
//!
//! The child runs inside the article folder with stdin closed and stdout
//! discarded; stderr is captured for error reporting.

use super::{RenderError, Renderer};
use crate::{config::RenderConfig, content::ArticleFolder, log};
use std::{
    io::Read,
    path::PathBuf,
    process::{Child, Command, ExitStatus, Stdio},
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

/// How often a running child is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

const API_KEY_PLACEHOLDER: &str = "{api_key}";

/// Runs a configured command once per article.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    command: Vec<String>,
    account_id: String,
    api_key: Option<String>,
}

impl CommandRenderer {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            command: config.command.clone(),
            account_id: config.account_id.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Argument vector for `folder` with every placeholder substituted.
    fn argv(&self, folder: &ArticleFolder) -> Result<Vec<String>, RenderError> {
        let needs_key = self.command.iter().any(|arg| arg.contains(API_KEY_PLACEHOLDER));
        let api_key = match (&self.api_key, needs_key) {
            (Some(key), _) => key.as_str(),
            (None, false) => "",
            (None, true) => return Err(RenderError::MissingCredentials),
        };
        let output = format!("{}.html", folder.name);
        let folder_path = folder.path.to_string_lossy();

        Ok(self
            .command
            .iter()
            .map(|arg| {
                arg.replace("{name}", &folder.name)
                    .replace("{folder}", &folder_path)
                    .replace("{output}", &output)
                    .replace("{account}", &self.account_id)
                    .replace(API_KEY_PLACEHOLDER, api_key)
            })
            .collect())
    }
}

impl Renderer for CommandRenderer {
    fn render(&self, folder: &ArticleFolder, timeout: Duration) -> Result<PathBuf, RenderError> {
        let argv = self.argv(folder)?;
        let Some((program, args)) = argv.split_first() else {
            return Err(RenderError::Spawn {
                command: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };
        let command = program.clone();

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&folder.path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RenderError::Spawn {
                command: command.clone(),
                source,
            })?;

        // Drain stderr on a separate thread so a chatty child cannot fill the
        // pipe and block forever.
        let (tx, rx) = mpsc::channel();
        if let Some(mut pipe) = child.stderr.take() {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                let _ = tx.send(buf);
            });
        }

        let deadline = Instant::now() + timeout;
        let status = wait_until(&mut child, deadline).map_err(|source| RenderError::Wait {
            command: command.clone(),
            source,
        })?;

        let Some(status) = status else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RenderError::Timeout { command, timeout });
        };

        // A background process that inherited the pipe keeps it open past
        // the child's exit; stop listening at the deadline.
        let stderr = rx
            .recv_timeout(deadline.saturating_duration_since(Instant::now()))
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default();

        if !status.success() {
            return Err(RenderError::Failed {
                command,
                status,
                stderr,
            });
        }

        for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
            log!("render"; "{}: {}", folder.name, line.trim());
        }

        Ok(folder.rendered())
    }
}

/// Wait for `child` to exit, giving up at `deadline`.
///
/// Returns `Ok(None)` when the deadline passes; the child is left running.
fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ensure_rendered;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    fn folder(dir: &Path, name: &str) -> ArticleFolder {
        let path = dir.join(name);
        fs::create_dir_all(&path).unwrap();
        ArticleFolder {
            path,
            name: name.into(),
        }
    }

    fn renderer(command: &[&str], api_key: Option<&str>) -> CommandRenderer {
        CommandRenderer {
            command: command.iter().map(ToString::to_string).collect(),
            account_id: "42".into(),
            api_key: api_key.map(Into::into),
        }
    }

    #[test]
    fn test_placeholders_are_substituted() {
        let dir = TempDir::new().unwrap();
        let folder = folder(dir.path(), "intro");
        let r = renderer(
            &["tool", "--key={api_key}", "https://x/{account}/{name}", "-o", "{output}"],
            Some("secret"),
        );

        assert_eq!(
            r.argv(&folder).unwrap(),
            vec!["tool", "--key=secret", "https://x/42/intro", "-o", "intro.html"]
        );
    }

    #[test]
    fn test_missing_api_key_only_matters_when_referenced() {
        let dir = TempDir::new().unwrap();
        let folder = folder(dir.path(), "intro");

        let err = renderer(&["tool", "{api_key}"], None).argv(&folder).unwrap_err();
        assert!(matches!(err, RenderError::MissingCredentials));

        assert!(renderer(&["tool", "{name}"], None).argv(&folder).is_ok());
    }

    #[test]
    fn test_from_config_uses_defaults() {
        let r = CommandRenderer::from_config(&RenderConfig::default());
        assert_eq!(r.command.first().map(String::as_str), Some("curl"));
        assert_eq!(r.account_id, "4296918970");
        assert!(r.api_key.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_runs_in_article_folder() {
        let dir = TempDir::new().unwrap();
        let folder = folder(dir.path(), "intro");
        let r = renderer(&["sh", "-c", "printf '<p>{name}</p>' > {output}"], None);

        let rendered = ensure_rendered(&folder, &r, Duration::from_secs(10)).unwrap();

        assert!(!rendered.is_cached());
        assert_eq!(fs::read_to_string(folder.rendered()).unwrap(), "<p>intro</p>");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_reports_stderr() {
        let dir = TempDir::new().unwrap();
        let folder = folder(dir.path(), "intro");
        let r = renderer(&["sh", "-c", "echo boom >&2; exit 3"], None);

        let err = r.render(&folder, Duration::from_secs(10)).unwrap_err();
        match err {
            RenderError::Failed { stderr, status, .. } => {
                assert_eq!(stderr.trim(), "boom");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_slow_command_times_out() {
        let dir = TempDir::new().unwrap();
        let folder = folder(dir.path(), "intro");
        let r = renderer(&["sleep", "5"], None);

        let started = Instant::now();
        let err = r.render(&folder, Duration::from_millis(200)).unwrap_err();

        assert!(matches!(err, RenderError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(!folder.rendered().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_command_leaves_no_cached_output() {
        let dir = TempDir::new().unwrap();
        let folder = folder(dir.path(), "intro");
        let r = renderer(&["sh", "-c", "printf '<p>partial' > {output}; exit 18"], None);

        let err = ensure_rendered(&folder, &r, Duration::from_secs(10)).unwrap_err();
        assert!(matches!(err, RenderError::Failed { .. }));
        assert!(!folder.rendered().exists());

        // The retry runs the command again rather than reusing a cached file
        let err = ensure_rendered(&folder, &r, Duration::from_secs(10)).unwrap_err();
        assert!(matches!(err, RenderError::Failed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_timed_out_command_leaves_no_cached_output() {
        let dir = TempDir::new().unwrap();
        let folder = folder(dir.path(), "intro");
        let r = renderer(&["sh", "-c", "printf '<p>half' > {output}; exec sleep 5"], None);

        let err = ensure_rendered(&folder, &r, Duration::from_millis(300)).unwrap_err();
        assert!(matches!(err, RenderError::Timeout { .. }));
        assert!(!folder.rendered().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_invalid_utf8_stderr_is_kept() {
        let dir = TempDir::new().unwrap();
        let folder = folder(dir.path(), "intro");
        let r = renderer(&["sh", "-c", "printf 'bad \\377 byte' >&2; exit 1"], None);

        match r.render(&folder, Duration::from_secs(10)).unwrap_err() {
            RenderError::Failed { stderr, .. } => {
                assert!(stderr.starts_with("bad "));
                assert!(stderr.ends_with(" byte"));
                assert!(stderr.contains('\u{FFFD}'));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_background_holder_of_stderr_does_not_block() {
        let dir = TempDir::new().unwrap();
        let folder = folder(dir.path(), "intro");
        // The backgrounded sleep inherits stderr and outlives the shell
        let r = renderer(&["sh", "-c", "sleep 5 & printf '<p>ok</p>' > {output}"], None);

        let started = Instant::now();
        r.render(&folder, Duration::from_millis(500)).unwrap();
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_success_without_output_is_missing_output() {
        let dir = TempDir::new().unwrap();
        let folder = folder(dir.path(), "intro");
        let r = renderer(&["true"], None);

        let err = ensure_rendered(&folder, &r, Duration::from_secs(10)).unwrap_err();
        assert!(matches!(err, RenderError::MissingOutput { .. }));
    }

    #[test]
    fn test_unknown_program_fails_to_spawn() {
        let dir = TempDir::new().unwrap();
        let folder = folder(dir.path(), "intro");
        let r = renderer(&["definitely-not-a-real-renderer-binary"], None);

        let err = r.render(&folder, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
    }
}
