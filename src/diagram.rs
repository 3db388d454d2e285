//! Diagram rendering through an external graph layout tool
//!
//! The [`DiagramRenderer`] writes the fault tree as a DOT description into a
//! scratch directory and asks the layout tool (Graphviz `dot` by default) to
//! turn it into an image. Every failure is reported as a [`DiagramError`] so
//! the caller can carry on without the image.

use std::{
    fs,
    io::{self, Read, Seek, Write},
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use tempfile::NamedTempFile;
use tracing::instrument;

use crate::{
    domain::{Config, FaultTree},
    render::{DotOptions, looks_like_digraph, to_dot},
};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Errors that can occur while rendering the diagram.
#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    /// The layout tool could not be run.
    #[error("layout tool '{}' is not available: {reason}", .tool.display())]
    MissingTool {
        /// The configured tool.
        tool: PathBuf,
        /// Why the tool could not be run.
        reason: String,
    },

    /// The scratch directory could not be created or written to.
    #[error("scratch directory '{}' is not writable: {source}", .path.display())]
    ScratchDirUnwritable {
        /// The scratch directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The intermediate graph description failed its sanity check.
    #[error("intermediate graph description is malformed (expected a digraph)")]
    MalformedIntermediate {
        /// The offending description.
        content: String,
    },

    /// The layout tool ran but did not produce an image.
    #[error("layout tool failed: {reason}")]
    SubprocessFailure {
        /// What went wrong.
        reason: String,
    },

    /// A previous image is in the way and cannot be removed.
    #[error("cannot replace existing diagram '{}': {source}", .path.display())]
    FileLocked {
        /// The stale image.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl DiagramError {
    /// Steps a user can take to fix the problem.
    #[must_use]
    pub const fn remediation(&self) -> &'static [&'static str] {
        match self {
            Self::MissingTool { .. } => &[
                "Install Graphviz from https://graphviz.org/download/",
                "Make sure 'dot' is on PATH, or set 'layout_tool' to its full path",
            ],
            Self::ScratchDirUnwritable { .. } => &[
                "Create the scratch directory manually",
                "Give the current user write access to it",
                "Or set 'scratch_dir' to a directory that is already writable",
            ],
            Self::MalformedIntermediate { .. } => {
                &["Inspect the logged graph description for unexpected content"]
            }
            Self::SubprocessFailure { .. } => &[
                "Run the layout tool by hand on a small graph to check the installation",
                "Check that 'image_format' is a format the tool supports",
                "Raise 'tool_timeout_secs' if the tool timed out",
            ],
            Self::FileLocked { .. } => &[
                "Close any program that has the old diagram open",
                "Or delete the old diagram manually",
            ],
        }
    }
}

/// Renders fault tree diagrams with an external layout tool.
///
/// All settings are explicit; the renderer never touches `PATH` or the
/// process temp directory.
#[derive(Debug, Clone)]
pub struct DiagramRenderer {
    tool: PathBuf,
    scratch_dir: PathBuf,
    format: String,
    dot_options: DotOptions,
    timeout: Option<Duration>,
}

impl DiagramRenderer {
    /// Creates a renderer producing PNG images, with no timeout.
    #[must_use]
    pub fn new(tool: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            scratch_dir: scratch_dir.into(),
            format: "png".to_string(),
            dot_options: DotOptions::default(),
            timeout: None,
        }
    }

    /// Creates a renderer from the run configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.layout_tool, &config.scratch_dir)
            .with_format(&config.image_format)
            .with_font(config.font.clone())
            .with_timeout(config.tool_timeout())
    }

    /// Sets the output format passed as `-T<format>`.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Sets the label font.
    #[must_use]
    pub fn with_font(mut self, font: Option<String>) -> Self {
        self.dot_options.font = font;
        self
    }

    /// Bounds how long the layout tool may run.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Renders the tree to `output`.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError`] if any step fails. The intermediate
    /// description is removed whatever the outcome.
    pub fn render(&self, tree: &FaultTree, output: &Path) -> Result<PathBuf, DiagramError> {
        self.render_description(&to_dot(tree, &self.dot_options), output)
    }

    /// Renders an already-built DOT description to `output`.
    ///
    /// # Errors
    ///
    /// See [`DiagramRenderer::render`].
    #[instrument(level = "debug", skip(self, dot), fields(tool = %self.tool.display()))]
    pub fn render_description(&self, dot: &str, output: &Path) -> Result<PathBuf, DiagramError> {
        self.probe_tool()?;
        let created_scratch_dir = self.prepare_scratch_dir()?;

        let result = self.render_in_scratch_dir(dot, output);

        if created_scratch_dir {
            self.remove_scratch_dir();
        }
        result
    }

    fn render_in_scratch_dir(&self, dot: &str, output: &Path) -> Result<PathBuf, DiagramError> {
        remove_stale(output)?;

        let intermediate = self.write_intermediate(dot)?;
        let result = self.layout(intermediate.path(), output);

        let intermediate_path = intermediate.path().to_path_buf();
        if let Err(e) = intermediate.close() {
            tracing::warn!(
                "failed to remove intermediate file {}: {e}",
                intermediate_path.display()
            );
        } else {
            tracing::debug!("removed intermediate file {}", intermediate_path.display());
        }

        if result.is_err() {
            discard_output(output);
        }
        result
    }

    fn probe_tool(&self) -> Result<(), DiagramError> {
        let missing = |reason: String| DiagramError::MissingTool {
            tool: self.tool.clone(),
            reason,
        };

        let status = Command::new(&self.tool)
            .arg("-V")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| missing(e.to_string()))?;

        if status.success() {
            tracing::debug!("found layout tool {}", self.tool.display());
            Ok(())
        } else {
            Err(missing(format!("version check exited with {status}")))
        }
    }

    /// Creates the scratch directory if needed and checks that it accepts
    /// files.
    ///
    /// Returns whether the directory was created here, in which case the
    /// caller owns its removal.
    fn prepare_scratch_dir(&self) -> Result<bool, DiagramError> {
        let unwritable = |source| DiagramError::ScratchDirUnwritable {
            path: self.scratch_dir.clone(),
            source,
        };

        let created = !self.scratch_dir.is_dir();
        if created {
            tracing::debug!("creating scratch directory {}", self.scratch_dir.display());
        }
        fs::create_dir_all(&self.scratch_dir).map_err(unwritable)?;

        if let Err(e) = self.check_scratch_dir() {
            if created {
                self.remove_scratch_dir();
            }
            return Err(unwritable(e));
        }
        Ok(created)
    }

    fn check_scratch_dir(&self) -> io::Result<()> {
        let mut probe = tempfile::Builder::new()
            .prefix("probe-")
            .tempfile_in(&self.scratch_dir)?;
        probe.write_all(b"probe")?;
        probe.close()
    }

    /// Removes the scratch directory; only the innermost level is removed.
    fn remove_scratch_dir(&self) {
        match fs::remove_dir(&self.scratch_dir) {
            Ok(()) => tracing::debug!("removed scratch directory {}", self.scratch_dir.display()),
            Err(e) => tracing::warn!(
                "failed to remove scratch directory {}: {e}",
                self.scratch_dir.display()
            ),
        }
    }

    fn write_intermediate(&self, dot: &str) -> Result<NamedTempFile, DiagramError> {
        let unwritable = |source| DiagramError::ScratchDirUnwritable {
            path: self.scratch_dir.clone(),
            source,
        };

        let mut file = tempfile::Builder::new()
            .prefix("fault_tree-")
            .suffix(".dot")
            .tempfile_in(&self.scratch_dir)
            .map_err(unwritable)?;
        file.write_all(dot.as_bytes()).map_err(unwritable)?;
        file.flush().map_err(unwritable)?;
        tracing::debug!("wrote intermediate file {}", file.path().display());

        let written = fs::read_to_string(file.path()).map_err(unwritable)?;
        if !looks_like_digraph(&written) {
            tracing::warn!("intermediate graph description:\n{written}");
            return Err(DiagramError::MalformedIntermediate { content: written });
        }

        Ok(file)
    }

    fn layout(&self, input: &Path, output: &Path) -> Result<PathBuf, DiagramError> {
        let failure = |reason: String| DiagramError::SubprocessFailure { reason };

        // stderr goes to an unnamed file so a chatty tool cannot fill a pipe
        // while we poll for the timeout.
        let mut log = tempfile::tempfile_in(&self.scratch_dir)
            .map_err(|e| failure(format!("cannot capture tool output: {e}")))?;
        let stderr = log
            .try_clone()
            .map_err(|e| failure(format!("cannot capture tool output: {e}")))?;

        tracing::debug!(
            "running {} -T{} {} -o {}",
            self.tool.display(),
            self.format,
            input.display(),
            output.display()
        );
        let mut child = Command::new(&self.tool)
            .arg(format!("-T{}", self.format))
            .arg(input)
            .arg("-o")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| failure(format!("cannot start {}: {e}", self.tool.display())))?;

        let status = wait(&mut child, self.timeout)
            .map_err(|e| failure(format!("cannot wait for {}: {e}", self.tool.display())))?;

        let mut diagnostics = String::new();
        if let Err(e) = log.rewind().and_then(|()| log.read_to_string(&mut diagnostics)) {
            tracing::debug!("cannot read layout tool diagnostics: {e}");
        }
        let diagnostics = diagnostics.trim();

        let Some(status) = status else {
            return Err(failure(format!(
                "timed out after {:?}",
                self.timeout.unwrap_or_default()
            )));
        };
        if !status.success() {
            return Err(failure(if diagnostics.is_empty() {
                format!("exited with {status}")
            } else {
                format!("exited with {status}: {diagnostics}")
            }));
        }

        match fs::metadata(output) {
            Ok(metadata) if metadata.len() > 0 => {
                tracing::debug!("layout tool wrote {} bytes", metadata.len());
                Ok(output.to_path_buf())
            }
            Ok(_) => Err(failure(format!("{} is empty", output.display()))),
            Err(e) => Err(failure(format!("{} was not produced: {e}", output.display()))),
        }
    }
}

fn remove_stale(output: &Path) -> Result<(), DiagramError> {
    match fs::remove_file(output) {
        Ok(()) => {
            tracing::debug!("removed previous diagram {}", output.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(DiagramError::FileLocked {
            path: output.to_path_buf(),
            source,
        }),
    }
}

/// Removes whatever a failed layout run left at `output`.
fn discard_output(output: &Path) {
    match fs::remove_file(output) {
        Ok(()) => tracing::debug!("removed incomplete diagram {}", output.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            "failed to remove incomplete diagram {}: {e}",
            output.display()
        ),
    }
}

/// Waits for the child, killing it if it outlives `timeout`.
///
/// Returns `None` if the child was killed.
fn wait(child: &mut Child, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use tempfile::TempDir;

    use super::*;

    /// Writes a shell script standing in for the layout tool.
    ///
    /// Arguments arrive as `-T<fmt> <input> -o <output>`, so the input is `$2`
    /// and the output `$4`.
    fn fake_tool(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-dot");
        fs::write(
            &path,
            format!("#!/bin/sh\nif [ \"$1\" = \"-V\" ]; then exit 0; fi\n{body}\n"),
        )
        .unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        // A concurrently forked test process can briefly hold the script open
        // for writing, which makes exec fail with ETXTBSY.
        for _ in 0..100 {
            match Command::new(&path).arg("-V").status() {
                Err(e) if e.raw_os_error() == Some(26) => thread::sleep(POLL_INTERVAL),
                _ => break,
            }
        }
        path
    }

    fn intermediate_files(scratch: &Path) -> Vec<PathBuf> {
        fs::read_dir(scratch)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.path())
                    .collect()
            })
            .unwrap_or_default()
    }

    struct Fixture {
        _tmp: TempDir,
        scratch: PathBuf,
        output: PathBuf,
        root: PathBuf,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_path_buf();
        Fixture {
            scratch: root.join("scratch"),
            output: root.join("cooling_fta.png"),
            root,
            _tmp: tmp,
        }
    }

    #[test]
    fn renders_with_a_working_tool() {
        let fx = fixture();
        let tool = fake_tool(&fx.root, "cat \"$2\" > \"$4\"");
        let renderer = DiagramRenderer::new(tool, &fx.scratch);

        let path = renderer
            .render(&FaultTree::reference(), &fx.output)
            .unwrap();

        assert_eq!(path, fx.output);
        let image = fs::read_to_string(&fx.output).unwrap();
        assert!(image.starts_with("digraph"));
        assert!(intermediate_files(&fx.scratch).is_empty());
    }

    #[test]
    fn replaces_a_stale_image() {
        let fx = fixture();
        fs::write(&fx.output, "old").unwrap();
        let tool = fake_tool(&fx.root, "printf new > \"$4\"");

        DiagramRenderer::new(tool, &fx.scratch)
            .render(&FaultTree::reference(), &fx.output)
            .unwrap();

        assert_eq!(fs::read_to_string(&fx.output).unwrap(), "new");
    }

    #[test]
    fn missing_tool_is_reported() {
        let fx = fixture();
        let renderer = DiagramRenderer::new(fx.root.join("no-such-dot"), &fx.scratch);

        let error = renderer
            .render(&FaultTree::reference(), &fx.output)
            .unwrap_err();

        assert!(matches!(error, DiagramError::MissingTool { .. }));
        assert!(!error.remediation().is_empty());
        assert!(!fx.output.exists());
        assert!(intermediate_files(&fx.scratch).is_empty());
    }

    #[test]
    fn unwritable_scratch_dir_is_reported() {
        let fx = fixture();
        let tool = fake_tool(&fx.root, "cat \"$2\" > \"$4\"");
        let blocker = fx.root.join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let error = DiagramRenderer::new(tool, blocker.join("scratch"))
            .render(&FaultTree::reference(), &fx.output)
            .unwrap_err();

        assert!(matches!(error, DiagramError::ScratchDirUnwritable { .. }));
        assert!(!fx.output.exists());
    }

    #[test]
    fn malformed_description_is_rejected_and_removed() {
        let fx = fixture();
        let tool = fake_tool(&fx.root, "cat \"$2\" > \"$4\"");

        let error = DiagramRenderer::new(tool, &fx.scratch)
            .render_description("graph {", &fx.output)
            .unwrap_err();

        let DiagramError::MalformedIntermediate { content } = error else {
            panic!("unexpected error: {error}");
        };
        assert_eq!(content, "graph {");
        assert!(intermediate_files(&fx.scratch).is_empty());
        assert!(!fx.output.exists());
    }

    #[test]
    fn failing_tool_is_reported_with_its_diagnostics() {
        let fx = fixture();
        let tool = fake_tool(&fx.root, "echo 'syntax error in line 1' >&2\nexit 3");

        let error = DiagramRenderer::new(tool, &fx.scratch)
            .render(&FaultTree::reference(), &fx.output)
            .unwrap_err();

        let DiagramError::SubprocessFailure { reason } = error else {
            panic!("unexpected error: {error}");
        };
        assert!(reason.contains("syntax error in line 1"));
        assert!(intermediate_files(&fx.scratch).is_empty());
    }

    #[test]
    fn partial_image_from_a_failing_tool_is_removed() {
        let fx = fixture();
        let tool = fake_tool(&fx.root, "printf partial > \"$4\"\nexit 1");

        let error = DiagramRenderer::new(tool, &fx.scratch)
            .render(&FaultTree::reference(), &fx.output)
            .unwrap_err();

        assert!(matches!(error, DiagramError::SubprocessFailure { .. }));
        assert!(!fx.output.exists());
    }

    #[test]
    fn partial_image_from_a_timed_out_tool_is_removed() {
        let fx = fixture();
        let tool = fake_tool(&fx.root, "printf partial > \"$4\"\nsleep 10");

        let error = DiagramRenderer::new(tool, &fx.scratch)
            .with_timeout(Some(Duration::from_millis(200)))
            .render(&FaultTree::reference(), &fx.output)
            .unwrap_err();

        assert!(matches!(error, DiagramError::SubprocessFailure { .. }));
        assert!(!fx.output.exists());
    }

    #[test]
    fn created_scratch_dir_is_removed_afterwards() {
        let fx = fixture();
        let tool = fake_tool(&fx.root, "cat \"$2\" > \"$4\"");

        DiagramRenderer::new(tool, &fx.scratch)
            .render(&FaultTree::reference(), &fx.output)
            .unwrap();
        assert!(!fx.scratch.exists());

        let failing = fake_tool(&fx.root, "exit 1");
        DiagramRenderer::new(failing, &fx.scratch)
            .render(&FaultTree::reference(), &fx.output)
            .unwrap_err();
        assert!(!fx.scratch.exists());
    }

    #[test]
    fn existing_scratch_dir_is_left_in_place() {
        let fx = fixture();
        fs::create_dir_all(&fx.scratch).unwrap();
        fs::write(fx.scratch.join("notes.txt"), "keep").unwrap();
        let tool = fake_tool(&fx.root, "cat \"$2\" > \"$4\"");

        DiagramRenderer::new(tool, &fx.scratch)
            .render(&FaultTree::reference(), &fx.output)
            .unwrap();

        assert_eq!(
            intermediate_files(&fx.scratch),
            [fx.scratch.join("notes.txt")]
        );
    }

    #[test]
    fn empty_output_is_a_failure() {
        let fx = fixture();
        let tool = fake_tool(&fx.root, ": > \"$4\"");

        let error = DiagramRenderer::new(tool, &fx.scratch)
            .render(&FaultTree::reference(), &fx.output)
            .unwrap_err();

        assert!(matches!(error, DiagramError::SubprocessFailure { .. }));
        assert!(!fx.output.exists());
        assert!(intermediate_files(&fx.scratch).is_empty());
    }

    #[test]
    fn no_output_is_a_failure() {
        let fx = fixture();
        let tool = fake_tool(&fx.root, "exit 0");

        let error = DiagramRenderer::new(tool, &fx.scratch)
            .render(&FaultTree::reference(), &fx.output)
            .unwrap_err();

        assert!(matches!(error, DiagramError::SubprocessFailure { .. }));
    }

    #[test]
    fn slow_tool_is_killed_after_timeout() {
        let fx = fixture();
        let tool = fake_tool(&fx.root, "sleep 10");

        let started = Instant::now();
        let error = DiagramRenderer::new(tool, &fx.scratch)
            .with_timeout(Some(Duration::from_millis(200)))
            .render(&FaultTree::reference(), &fx.output)
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        let DiagramError::SubprocessFailure { reason } = error else {
            panic!("unexpected error: {error}");
        };
        assert!(reason.starts_with("timed out"));
        assert!(intermediate_files(&fx.scratch).is_empty());
    }

    #[test]
    fn locked_output_is_left_in_place() {
        let fx = fixture();
        let tool = fake_tool(&fx.root, "cat \"$2\" > \"$4\"");
        // A non-empty directory cannot be removed with remove_file.
        fs::create_dir_all(fx.output.join("held")).unwrap();

        let error = DiagramRenderer::new(tool, &fx.scratch)
            .render(&FaultTree::reference(), &fx.output)
            .unwrap_err();

        assert!(matches!(error, DiagramError::FileLocked { .. }));
        assert!(fx.output.join("held").exists());
    }
}
