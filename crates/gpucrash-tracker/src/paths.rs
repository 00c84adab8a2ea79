//! Artifact naming.
//!
//! Every on-disk name is a deterministic function of the artifact's
//! identity: identical content always resolves to the same path, so
//! rewrites are idempotent overwrites.

use gpucrash_diag::{DebugInfoId, ShaderHash};

/// Directory leaf created inside the host log directory.
pub const DUMP_DIR_NAME: &str = "gpucrash";

/// `source_<16-hex-hash>.spv`
pub fn shader_file_name(hash: ShaderHash) -> String {
    format!("source_{hash:016x}.spv")
}

/// `crash.nv-gpudmp` for the first dump of a run, `crash_<N>.nv-gpudmp`
/// for every later one.
pub fn crash_dump_file_name(sequence: u64) -> String {
    if sequence == 0 {
        "crash.nv-gpudmp".to_string()
    } else {
        format!("crash_{sequence}.nv-gpudmp")
    }
}

/// `<dump-name>.json`
pub fn decoded_dump_file_name(dump_name: &str) -> String {
    format!("{dump_name}.json")
}

/// `shader_<32-hex-id>.nvdbg`
pub fn debug_info_file_name(id: DebugInfoId) -> String {
    format!("shader_{}.nvdbg", id.to_hex())
}
