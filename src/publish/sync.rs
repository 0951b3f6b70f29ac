use crate::error::{ProcessingError, Result};
use crate::settings::AwsCredentials;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Makes a remote location mirror a local directory: files are added,
/// replaced and deleted so that both sides hold the same tree.
pub trait RemoteSync: Send + Sync {
    fn sync(&self, local: &Path, remote: &str, exclude: &[String], quiet_errors: bool) -> Result<()>;
}

/// Syncs through the `aws` command line tool.
///
/// Credentials reach the child process through its environment only; the
/// parent process environment is left untouched.
pub struct AwsCliSync {
    credentials: AwsCredentials,
    program: String,
}

impl AwsCliSync {
    pub fn new(credentials: AwsCredentials) -> Self {
        Self {
            credentials,
            program: "aws".to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn arguments(local: &Path, remote: &str, exclude: &[String], quiet_errors: bool) -> Vec<String> {
        let mut args = vec![
            "s3".to_string(),
            "sync".to_string(),
            local.display().to_string(),
            remote.to_string(),
        ];
        for pattern in exclude {
            args.push("--exclude".to_string());
            args.push(pattern.clone());
        }
        if quiet_errors {
            args.push("--only-show-errors".to_string());
        }
        args.push("--delete".to_string());
        args
    }
}

impl RemoteSync for AwsCliSync {
    fn sync(&self, local: &Path, remote: &str, exclude: &[String], quiet_errors: bool) -> Result<()> {
        let args = Self::arguments(local, remote, exclude, quiet_errors);
        debug!(program = %self.program, ?args, "Running sync");

        let output = Command::new(&self.program)
            .args(&args)
            .env("AWS_ACCESS_KEY_ID", &self.credentials.aws_access_key_id)
            .env("AWS_SECRET_ACCESS_KEY", &self.credentials.aws_secret_access_key)
            .output()
            .map_err(|e| ProcessingError::Sync {
                destination: remote.to_string(),
                details: format!("failed to spawn {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            return Err(ProcessingError::Sync {
                destination: remote.to_string(),
                details: format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }
}

/// Mirrors into a directory tree on local disk, the remote URI's scheme
/// stripped and the remainder resolved under `root`.
pub struct LocalMirrorSync {
    root: PathBuf,
}

impl LocalMirrorSync {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn destination(&self, remote: &str) -> PathBuf {
        let path = remote.split_once("://").map_or(remote, |(_, rest)| rest);
        self.root.join(path.trim_start_matches('/'))
    }
}

impl RemoteSync for LocalMirrorSync {
    fn sync(&self, local: &Path, remote: &str, exclude: &[String], _quiet_errors: bool) -> Result<()> {
        if !local.is_dir() {
            return Err(ProcessingError::MissingInput {
                path: local.to_path_buf(),
            });
        }
        let excluded = build_exclusions(exclude)?;
        let destination = self.destination(remote);
        fs::create_dir_all(&destination)?;

        let mut kept = HashSet::new();
        for entry in WalkDir::new(local).sort_by_file_name() {
            let entry = entry.map_err(|e| sync_error(remote, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(local)
                .map_err(|e| sync_error(remote, e))?;
            if excluded.is_match(relative) {
                continue;
            }

            let target = destination.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            kept.insert(relative.to_path_buf());
        }

        // excluded files are left alone on the destination side too
        let mut deleted = 0usize;
        for entry in WalkDir::new(&destination) {
            let entry = entry.map_err(|e| sync_error(remote, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&destination)
                .map_err(|e| sync_error(remote, e))?;
            if !kept.contains(relative) && !excluded.is_match(relative) {
                fs::remove_file(entry.path())?;
                deleted += 1;
            }
        }

        // partitions that vanished locally leave empty directories behind
        for entry in WalkDir::new(&destination).min_depth(1).contents_first(true) {
            let entry = entry.map_err(|e| sync_error(remote, e))?;
            if entry.file_type().is_dir() && fs::read_dir(entry.path())?.next().is_none() {
                fs::remove_dir(entry.path())?;
            }
        }

        info!(
            destination = %destination.display(),
            files = kept.len(),
            deleted,
            "Mirrored directory"
        );
        Ok(())
    }
}

fn build_exclusions(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| ProcessingError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ProcessingError::Config(e.to_string()))
}

fn sync_error(remote: &str, err: impl std::fmt::Display) -> ProcessingError {
    ProcessingError::Sync {
        destination: remote.to_string(),
        details: err.to_string(),
    }
}
