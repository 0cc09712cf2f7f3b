//! # Project Files
//!
//! Reads and writes `.chs` project files (JSON):
//! - **Atomic saves**: the project is written to `.chs.tmp`, synced, then
//!   renamed over the target
//! - **Locking**: a `.chs.lock` file holds an OS lock and tells other users
//!   who is editing the project
//! - **Version check**: files written by a newer schema are refused
//!
//! Loading does not rebuild field states; call
//! [`load_and_revalidate`] or [`Project::revalidate`] for that.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use chaussee_core::file_io::{load_and_revalidate, save_project, FileLock};
//! use chaussee_core::layer::ValidationEngine;
//! use chaussee_core::project::Project;
//!
//! let mut engine = ValidationEngine::new();
//! let project = Project::new("RD 12", "A. Dupont", &mut engine);
//! let path = Path::new("rd12.chs");
//!
//! let lock = FileLock::acquire(path, "a.dupont")?;
//! save_project(&project, path)?;
//! drop(lock);
//!
//! let (reloaded, _outcomes) = load_and_revalidate(path, &mut engine)?;
//! assert_eq!(reloaded.meta.id, project.meta.id);
//! # Ok::<(), chaussee_core::errors::CalcError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{CalcError, CalcResult};
use crate::layer::{LayerOutcome, ValidationEngine};
use crate::project::{Project, SCHEMA_VERSION};

/// Extension of project files
pub const PROJECT_EXTENSION: &str = "chs";

/// Locks older than this are taken over (hours)
const STALE_LOCK_HOURS: i64 = 24;

fn io_error<'a>(operation: &str, path: &'a Path) -> impl FnOnce(std::io::Error) -> CalcError + 'a {
    let operation = operation.to_string();
    move |e| CalcError::file_error(operation, path.display().to_string(), e.to_string())
}

/// Content of a `.chs.lock` file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User name or e-mail
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Held by a process that no longer runs on this machine, or too old
    pub fn is_stale(&self) -> bool {
        if Utc::now() - self.locked_at > chrono::Duration::hours(STALE_LOCK_HOURS) {
            return true;
        }
        if hostname().as_deref() != Some(self.machine.as_str()) {
            return false;
        }
        !process_alive(self.pid)
    }
}

fn hostname() -> Option<String> {
    let var = if cfg!(windows) { "COMPUTERNAME" } else { "HOSTNAME" };
    std::env::var(var).ok().or_else(|| std::env::var("HOST").ok())
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Exclusive lock on a project file, released on drop.
///
/// Combines an OS lock taken through `fs2` with a lock file describing the
/// holder.
#[derive(Debug)]
pub struct FileLock {
    project_path: PathBuf,
    lock_path: PathBuf,
    _handle: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Lock `path` for `user_id`.
    ///
    /// Fails with [`CalcError::FileLocked`] when another live holder owns
    /// the lock; stale locks are taken over.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        let lock_path = lock_path_for(path);

        if let Some(holder) = read_lock_info(&lock_path) {
            if !holder.is_stale() {
                return Err(CalcError::file_locked(
                    path.display().to_string(),
                    format!("{} ({})", holder.user_id, holder.machine),
                    holder.locked_at.to_rfc3339(),
                ));
            }
            warn!(path = %path.display(), holder = %holder.user_id, "taking over stale lock");
        }

        let mut handle = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(io_error("create lock", &lock_path))?;

        handle
            .try_lock_exclusive()
            .map_err(|_| CalcError::file_locked(path.display().to_string(), "another process", "unknown"))?;

        let info = LockInfo::new(user_id);
        let json = serde_json::to_string_pretty(&info)?;
        handle
            .write_all(json.as_bytes())
            .map_err(io_error("write lock", &lock_path))?;
        handle.sync_all().map_err(io_error("sync lock", &lock_path))?;

        debug!(path = %path.display(), user = %info.user_id, "project locked");
        Ok(FileLock {
            project_path: path.to_path_buf(),
            lock_path,
            _handle: handle,
            info,
        })
    }

    /// Current live holder of the lock on `path`, if any
    pub fn check(path: &Path) -> Option<LockInfo> {
        read_lock_info(&lock_path_for(path)).filter(|info| !info.is_stale())
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `rd12.chs` -> `rd12.chs.lock`
fn lock_path_for(project_path: &Path) -> PathBuf {
    with_suffix(project_path, "lock")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let extension = match path.extension() {
        Some(ext) => format!("{}.{}", ext.to_string_lossy(), suffix),
        None => suffix.to_string(),
    };
    path.with_extension(extension)
}

fn read_lock_info(lock_path: &Path) -> Option<LockInfo> {
    let contents = fs::read_to_string(lock_path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Write a project atomically.
pub fn save_project(project: &Project, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(project)?;
    let tmp_path = with_suffix(path, "tmp");

    let mut tmp = File::create(&tmp_path).map_err(io_error("create temp file", &tmp_path))?;
    tmp.write_all(json.as_bytes())
        .map_err(io_error("write temp file", &tmp_path))?;
    tmp.sync_all().map_err(io_error("sync temp file", &tmp_path))?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(CalcError::file_error("rename to final", path.display().to_string(), e.to_string()));
    }

    info!(path = %path.display(), layers = project.structure.layers().len(), "project saved");
    Ok(())
}

/// Read a project and check its schema version.
pub fn load_project(path: &Path) -> CalcResult<Project> {
    let contents = fs::read_to_string(path).map_err(io_error("read", path))?;
    let project: Project = serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
        reason: format!("invalid project file {}: {}", path.display(), e),
    })?;
    validate_version(&project.meta.version)?;
    debug!(path = %path.display(), name = %project.meta.name, "project loaded");
    Ok(project)
}

/// Read a project and rebuild every field state.
pub fn load_and_revalidate(path: &Path, engine: &mut ValidationEngine) -> CalcResult<(Project, Vec<LayerOutcome>)> {
    let mut project = load_project(path)?;
    let outcomes = project.revalidate(engine);
    Ok((project, outcomes))
}

/// Read a project and report who else holds its lock.
pub fn load_project_with_lock_check(path: &Path) -> CalcResult<(Project, Option<LockInfo>)> {
    let project = load_project(path)?;
    Ok((project, FileLock::check(path)))
}

/// Accept files with the same major version and, while in 0.x, no newer
/// minor version.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };
    let parse = |v: &str| -> Option<(u32, u32)> {
        let mut parts = v.split('.').map(|p| p.parse::<u32>().ok());
        Some((parts.next()??, parts.next().flatten().unwrap_or(0)))
    };

    let (file_major, file_minor) = parse(file_version).ok_or_else(mismatch)?;
    let (major, minor) = parse(SCHEMA_VERSION).ok_or_else(mismatch)?;

    if file_major != major || (major == 0 && file_minor > minor) {
        return Err(mismatch());
    }
    Ok(())
}
