//! # Provenance
//!
//! Where a node came from and who last touched it. Version and author are
//! resolved best-effort from version control; any failure (tool missing,
//! timeout, non-zero exit, not a repository) leaves the field `None`.

use crate::identity::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default bound on a single version-control query
pub const DEFAULT_VCS_TIMEOUT: Duration = Duration::from_millis(2000);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Origin and authorship record attached to a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub origin_file: Option<PathBuf>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub parent_id: Option<NodeId>,
}

impl Provenance {
    /// Empty provenance stamped with the current time
    pub fn now() -> Self {
        Self {
            origin_file: None,
            version: None,
            author: None,
            created_at: Utc::now(),
            modified_at: None,
            parent_id: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_parent(mut self, parent_id: NodeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Record a modification made now.
    ///
    /// `author` replaces the recorded author only when given; `created_at`
    /// is always kept.
    pub fn with_modification(&self, author: Option<&str>) -> Self {
        Self {
            origin_file: self.origin_file.clone(),
            version: self.version.clone(),
            author: author.map(str::to_string).or_else(|| self.author.clone()),
            created_at: self.created_at,
            modified_at: Some(Utc::now()),
            parent_id: self.parent_id.clone(),
        }
    }
}

/// Source of revision and author information
pub trait VersionControl {
    /// Revision that last touched `path`
    fn revision(&self, path: &Path) -> Option<String>;

    /// Configured author, optionally scoped to the repository holding `path`
    fn author(&self, path: Option<&Path>) -> Option<String>;
}

/// `git` command-line resolver with a bounded wait per query
#[derive(Debug, Clone)]
pub struct Git {
    timeout: Duration,
}

impl Default for Git {
    fn default() -> Self {
        Self::new(DEFAULT_VCS_TIMEOUT)
    }
}

impl Git {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run git and return trimmed stdout, or `None` on any failure
    fn run(&self, args: &[&str], cwd: Option<&Path>) -> Option<String> {
        let mut command = Command::new("git");
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                debug!(error = %e, "git unavailable");
                return None;
            }
        };

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!(?args, timeout_ms = self.timeout.as_millis() as u64, "git timed out");
                    return None;
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    debug!(error = %e, "failed waiting for git");
                    return None;
                }
            }
        };

        if !status.success() {
            debug!(?args, code = ?status.code(), "git exited with failure");
            return None;
        }

        let mut output = String::new();
        child.stdout.take()?.read_to_string(&mut output).ok()?;
        let trimmed = output.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

impl VersionControl for Git {
    fn revision(&self, path: &Path) -> Option<String> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let file = path.file_name()?.to_str()?;
        self.run(&["log", "-1", "--format=%H", "--", file], dir)
    }

    fn author(&self, path: Option<&Path>) -> Option<String> {
        let dir = path
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty());
        self.run(&["config", "user.name"], dir)
    }
}

/// Where new nodes are being created: a file on disk or an interactive
/// session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProvenanceContext {
    pub file_path: Option<PathBuf>,
    pub version: Option<String>,
    pub author: Option<String>,
}

impl ProvenanceContext {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::from_file_with(path, &Git::default())
    }

    pub fn from_file_with(path: impl Into<PathBuf>, vcs: &dyn VersionControl) -> Self {
        let path = path.into();
        let version = vcs.revision(&path);
        let author = vcs.author(Some(&path));
        debug!(
            path = %path.display(),
            resolved_version = version.is_some(),
            resolved_author = author.is_some(),
            "Resolved file provenance"
        );

        Self {
            file_path: Some(path),
            version,
            author,
        }
    }

    pub fn from_repl() -> Self {
        Self::from_repl_with(&Git::default())
    }

    pub fn from_repl_with(vcs: &dyn VersionControl) -> Self {
        Self {
            file_path: None,
            version: None,
            author: vcs.author(None),
        }
    }

    /// Fresh provenance for a node created in this context
    pub fn create_provenance(&self) -> Provenance {
        Provenance {
            origin_file: self.file_path.clone(),
            version: self.version.clone(),
            author: self.author.clone(),
            created_at: Utc::now(),
            modified_at: None,
            parent_id: None,
        }
    }
}
