use anyhow::{Context as AnyhowContext, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

const PLACEHOLDER: &str = "{}";

/// Predicate backed by a shell command run against a candidate file.
///
/// The candidate lines are written verbatim to a scratch file; the command is run via
/// `sh -c` with `{}` replaced by that file's path (or the path appended when
/// the command has no placeholder). The candidate is sufficient when the
/// command exits with the expected status.
pub struct ShellPredicate {
    command: String,
    expect_status: i32,
    candidate_path: PathBuf,
    // Keeps the scratch directory alive
    _scratch: TempDir,
}

impl ShellPredicate {
    pub fn new(command: impl Into<String>, expect_status: i32) -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("ktest-minimize")
            .tempdir()
            .context("Failed to create scratch directory")?;
        let candidate_path = scratch.path().join("candidate");
        Ok(Self {
            command: command.into(),
            expect_status,
            candidate_path,
            _scratch: scratch,
        })
    }

    /// Shell script actually run for a candidate at `path`
    pub fn render(&self, path: &Path) -> String {
        let quoted = shell_quote(&path.to_string_lossy());
        if self.command.contains(PLACEHOLDER) {
            self.command.replace(PLACEHOLDER, &quoted)
        } else {
            format!("{} {}", self.command, quoted)
        }
    }

    /// Run the command against `lines`, each carrying its own terminator
    pub fn check(&mut self, lines: &[String]) -> Result<bool> {
        fs::write(&self.candidate_path, lines.concat()).with_context(|| {
            format!(
                "Failed to write candidate to {}",
                self.candidate_path.display()
            )
        })?;

        let script = self.render(&self.candidate_path);
        let status = Command::new("sh")
            .arg("-c")
            .arg(&script)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("Failed to run `{script}`"))?;

        match status.code() {
            Some(code) => {
                log::trace!("`{script}` exited with {code}");
                Ok(code == self.expect_status)
            }
            None => {
                log::warn!("`{script}` was terminated by a signal");
                Ok(false)
            }
        }
    }
}

fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| format!("{s}\n")).collect()
    }

    #[test]
    fn renders_placeholder_and_appends_otherwise() {
        let pred = ShellPredicate::new("grep -q x {} && wc -l {}", 0).unwrap();
        assert_eq!(
            pred.render(Path::new("/tmp/c")),
            "grep -q x '/tmp/c' && wc -l '/tmp/c'"
        );

        let pred = ShellPredicate::new("grep -q x", 0).unwrap();
        assert_eq!(pred.render(Path::new("/tmp/c")), "grep -q x '/tmp/c'");
    }

    #[test]
    fn quotes_single_quotes() {
        assert_eq!(shell_quote("a'b"), r"'a'\''b'");
    }

    #[test]
    fn exit_status_decides() {
        let mut pred = ShellPredicate::new("grep -q needle {}", 0).unwrap();
        assert!(pred.check(&lines(&["hay", "needle"])).unwrap());
        assert!(!pred.check(&lines(&["hay"])).unwrap());
        assert!(!pred.check(&[]).unwrap());

        let mut inverted = ShellPredicate::new("grep -q needle {}", 1).unwrap();
        assert!(inverted.check(&lines(&["hay"])).unwrap());
    }

    #[test]
    fn candidate_file_is_written_verbatim() {
        let mut pred = ShellPredicate::new("printf 'a\\r\\nb' | cmp -s - {}", 0).unwrap();
        assert!(pred.check(&["a\r\n".to_string(), "b".to_string()]).unwrap());
        assert!(!pred.check(&lines(&["a", "b"])).unwrap());
    }
}
