//! # gpucrash-tracker
//!
//! GPU crash diagnostics capture for a real-time renderer.
//!
//! When the GPU driver detects a fault, the vendor diagnostics runtime
//! hands over a raw crash dump; the tracker persists the dump, a decoded
//! JSON rendition, the offending shader binaries, and shader
//! debug-correlation blobs under a `gpucrash` directory, without ever
//! propagating a failure back into the rendering path.
//!
//! Construct one [`CrashTracker`] at renderer startup, call
//! [`CrashTracker::initialize`] with a vendor-backed
//! [`gpucrash_diag::DiagnosticsLoader`], and report compiled shaders
//! through [`CrashTracker::save_shader`]. Everything else happens on the
//! diagnostics runtime's threads.

mod config;
mod fs;
mod paths;
mod tracker;

pub use config::TrackerConfig;
pub use fs::{DumpFs, StdFs};
pub use paths::DUMP_DIR_NAME;
pub use tracker::{CrashTracker, InitError};
