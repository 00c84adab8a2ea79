//! Tracker lifecycle and the capture handlers.
//!
//! One [`CrashTracker`] owns the dump directory, the dump sequence
//! counter, and the single coarse lock every mutating path converges on:
//! shader saves from renderer threads, crash-dump and debug-info
//! callbacks from the diagnostics runtime's threads.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{error, info};

use gpucrash_diag::{
    CaptureHooks, DescriptionKey, DiagnosticsApi, DiagnosticsError, DiagnosticsLoader, DumpDetail,
    DIAGNOSTICS_API_VERSION,
};

use crate::config::TrackerConfig;
use crate::fs::{DumpFs, StdFs};
use crate::paths;

/// Why [`CrashTracker::initialize`] failed.
///
/// Terminal for the attempt, never for the renderer: the host decides
/// whether to continue without crash diagnostics, and calling
/// `initialize` again is safe.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to acquire the GPU diagnostics runtime: {0}")]
    Diagnostics(#[from] DiagnosticsError),

    #[error("no per-user log directory is available for crash dumps")]
    NoLogDirectory,

    #[error("failed to create dump directory {path}: {source}")]
    CreateDumpDir { path: PathBuf, source: io::Error },

    #[error("failed to register crash capture callbacks: {0}")]
    Register(#[source] DiagnosticsError),
}

/// Capture-path failures. Logged and swallowed; nothing crosses back
/// into the diagnostics runtime's calling thread.
#[derive(Debug, Error)]
enum CaptureError {
    #[error("crash diagnostics are not initialized")]
    NotInitialized,

    #[error(transparent)]
    Diagnostics(#[from] DiagnosticsError),

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("short write to {path}: {written} of {expected} bytes")]
    ShortWrite {
        path: PathBuf,
        written: usize,
        expected: usize,
    },
}

#[derive(Default)]
struct TrackerState {
    initialized: bool,
    diagnostics: Option<Arc<dyn DiagnosticsApi>>,
    dump_dir: PathBuf,
    dump_counter: u64,
}

struct TrackerInner {
    config: TrackerConfig,
    fs: Arc<dyn DumpFs>,
    state: Mutex<TrackerState>,
}

/// Owns the diagnostics hooks, the dump directory, and the dump sequence
/// counter for one process run.
///
/// Construct once at renderer startup and share with whichever component
/// compiles shaders. [`CrashTracker::save_shader`] and the capture
/// callbacks all serialize on the tracker's lock; none of them can fail
/// into the rendering path.
pub struct CrashTracker {
    inner: Arc<TrackerInner>,
}

impl CrashTracker {
    pub fn new(config: TrackerConfig, fs: Arc<dyn DumpFs>) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                config,
                fs,
                state: Mutex::new(TrackerState::default()),
            }),
        }
    }

    /// Tracker over the real filesystem.
    pub fn with_default_fs(config: TrackerConfig) -> Self {
        Self::new(config, Arc::new(StdFs))
    }

    /// Acquire the diagnostics runtime, prepare the dump directory, and
    /// register the capture callbacks.
    ///
    /// All-or-nothing: on any failure the tracker stays uninitialized
    /// and a later retry is safe. A second successful call is a no-op.
    pub fn initialize(&self, loader: &dyn DiagnosticsLoader) -> Result<(), InitError> {
        let inner = &self.inner;
        let mut state = inner.lock_state();
        if state.initialized {
            return Ok(());
        }

        let diagnostics = loader.load(DIAGNOSTICS_API_VERSION)?;

        let dump_dir = match &inner.config.dump_root {
            Some(root) => root.clone(),
            None => inner.fs.user_log_dir().ok_or(InitError::NoLogDirectory)?,
        }
        .join(paths::DUMP_DIR_NAME);

        // Artifacts from a previous run are stale once the process
        // restarts; the delete is best effort.
        let _ = inner.fs.remove_dir_all(&dump_dir);
        inner
            .fs
            .create_dir_all(&dump_dir)
            .map_err(|source| InitError::CreateDumpDir {
                path: dump_dir.clone(),
                source,
            })?;

        diagnostics
            .enable_crash_dumps(Arc::clone(&self.inner) as Arc<dyn CaptureHooks>)
            .map_err(InitError::Register)?;

        info!("GPU crash dump directory is {}", dump_dir.display());

        state.initialized = true;
        state.diagnostics = Some(diagnostics);
        state.dump_dir = dump_dir;
        state.dump_counter = 0;
        Ok(())
    }

    /// Whether a successful [`CrashTracker::initialize`] has happened.
    pub fn is_initialized(&self) -> bool {
        self.inner.lock_state().initialized
    }

    /// The active dump directory, once initialized.
    pub fn dump_dir(&self) -> Option<PathBuf> {
        let state = self.inner.lock_state();
        state.initialized.then(|| state.dump_dir.clone())
    }

    /// Persist a compiled SPIR-V module under its content hash.
    ///
    /// No-op until the tracker is initialized. Failures are logged and
    /// swallowed; shader compilation never observes them.
    pub fn save_shader(&self, spirv: &[u32]) {
        let state = self.inner.lock_state();
        if !state.initialized {
            return;
        }
        if let Err(err) = self.inner.write_shader(&state, spirv) {
            error!("failed to archive shader source: {err}");
        }
    }
}

impl Drop for CrashTracker {
    fn drop(&mut self) {
        let state = self.inner.lock_state();
        if state.initialized {
            if let Some(diagnostics) = &state.diagnostics {
                // Best effort; the renderer is tearing down.
                let _ = diagnostics.disable_crash_dumps();
            }
        }
    }
}

impl TrackerInner {
    /// The single coarse lock. A poisoned lock is absorbed rather than
    /// propagated so the capture path can never panic across the
    /// callback registration boundary.
    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_all(&self, path: &Path, bytes: &[u8]) -> Result<(), CaptureError> {
        let written = self
            .fs
            .write(path, bytes)
            .map_err(|source| CaptureError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        if written != bytes.len() {
            return Err(CaptureError::ShortWrite {
                path: path.to_path_buf(),
                written,
                expected: bytes.len(),
            });
        }
        Ok(())
    }

    fn write_shader(&self, state: &TrackerState, spirv: &[u32]) -> Result<(), CaptureError> {
        let diagnostics = state.diagnostics.clone().ok_or(CaptureError::NotInitialized)?;

        // Vendor hashers read the module through FFI and require memory
        // the caller cannot move or free mid-call; hash a private copy.
        let words = spirv.to_vec();
        let hash = diagnostics.shader_hash(&words)?;

        let path = state.dump_dir.join(paths::shader_file_name(hash));
        // The caller's words go to disk verbatim, not the hashing copy.
        self.write_all(&path, bytemuck::cast_slice(spirv))
    }

    fn write_crash_dump(&self, state: &mut TrackerState, dump: &[u8]) -> Result<(), CaptureError> {
        let diagnostics = state.diagnostics.clone().ok_or(CaptureError::NotInitialized)?;

        // The decoder is released on drop, on every exit path below.
        let mut decoder = diagnostics.create_decoder(dump)?;
        let json_size = decoder.generate_json(DumpDetail::AllInfo)?;
        let json = decoder.json(json_size)?;

        // Read-then-increment under the lock keeps sequences distinct
        // and gapless across concurrent faults.
        let sequence = state.dump_counter;
        state.dump_counter += 1;

        let dump_name = paths::crash_dump_file_name(sequence);
        self.write_all(&state.dump_dir.join(&dump_name), dump)?;
        self.write_all(
            &state.dump_dir.join(paths::decoded_dump_file_name(&dump_name)),
            json.as_bytes(),
        )
    }

    fn write_debug_info(&self, state: &TrackerState, data: &[u8]) -> Result<(), CaptureError> {
        let diagnostics = state.diagnostics.clone().ok_or(CaptureError::NotInitialized)?;

        let id = diagnostics.debug_info_id(data)?;
        let path = state.dump_dir.join(paths::debug_info_file_name(id));
        self.write_all(&path, data)
    }
}

impl CaptureHooks for TrackerInner {
    fn on_crash_dump(&self, dump: &[u8]) {
        let mut state = self.lock_state();
        error!("GPU crash dump captured ({} bytes)", dump.len());
        if let Err(err) = self.write_crash_dump(&mut state, dump) {
            error!("failed to persist GPU crash dump: {err}");
        }
    }

    fn on_shader_debug_info(&self, data: &[u8]) {
        let state = self.lock_state();
        if let Err(err) = self.write_debug_info(&state, data) {
            error!("failed to persist shader debug info: {err}");
        }
    }

    fn on_crash_dump_description(&self, add: &mut dyn FnMut(DescriptionKey, &str)) {
        // Runs inside the already-locked crash-dump flow; taking the
        // tracker lock here would deadlock.
        add(DescriptionKey::ApplicationName, &self.config.application_name);
        if let Some(version) = &self.config.application_version {
            add(DescriptionKey::ApplicationVersion, version);
        }
    }
}
