//! # gpucrash-diag
//!
//! Capability surface of the vendor GPU diagnostics runtime.
//!
//! The crash tracker consumes the vendor runtime (crash-dump capture,
//! shader hashing, dump decoding) exclusively through the traits in this
//! crate. Production code plugs in a vendor-backed implementation behind
//! [`DiagnosticsLoader`]; tests substitute [`testing::MockDiagnostics`].

pub mod testing;

use std::sync::Arc;

use thiserror::Error;

/// Version-negotiation value passed to [`DiagnosticsLoader::load`].
///
/// An implementation that cannot serve this version must refuse to load
/// rather than misbehave at runtime.
pub const DIAGNOSTICS_API_VERSION: u32 = 0x0000_020b;

#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("GPU diagnostics runtime is not available")]
    NotAvailable,

    #[error("diagnostics entry point {0} is missing")]
    MissingEntryPoint(&'static str),

    #[error("diagnostics API version {requested:#x} is not supported")]
    UnsupportedVersion { requested: u32 },

    #[error("diagnostics call {call} failed with status {status}")]
    CallFailed { call: &'static str, status: i32 },
}

pub type Result<T> = std::result::Result<T, DiagnosticsError>;

/// 64-bit content hash of a SPIR-V module.
pub type ShaderHash = u64;

/// 128-bit identifier of a shader debug-info blob (two 64-bit words).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebugInfoId(pub [u64; 2]);

impl DebugInfoId {
    /// 32-hex-digit concatenation of the two words, zero-padded.
    pub fn to_hex(&self) -> String {
        format!("{:016x}{:016x}", self.0[0], self.0[1])
    }
}

/// Level of detail requested when rendering a dump as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpDetail {
    /// Fault summary only.
    Basic,
    /// Everything the runtime can decode, including shader correlation.
    #[default]
    AllInfo,
}

/// Keys a crash-dump description entry can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionKey {
    ApplicationName,
    ApplicationVersion,
}

/// The three callback slots registered through
/// [`DiagnosticsApi::enable_crash_dumps`].
///
/// The runtime invokes these from its own threads, concurrently with the
/// renderer. Implementations must not panic across this boundary.
pub trait CaptureHooks: Send + Sync {
    /// A raw crash dump was captured for a GPU fault.
    fn on_crash_dump(&self, dump: &[u8]);

    /// The driver emitted debug-correlation data for a compiled shader.
    fn on_shader_debug_info(&self, data: &[u8]);

    /// Invoked while a dump is being decoded; supplies process metadata
    /// through the provided insertion function.
    fn on_crash_dump_description(&self, add: &mut dyn FnMut(DescriptionKey, &str));
}

/// Transient decoder over one raw crash dump.
///
/// Dropping the decoder releases the underlying context, so callers get
/// release-on-every-exit-path for free.
pub trait DumpDecoder {
    /// Render the dump as JSON at the given detail level and return the
    /// required byte size. The runtime consults the registered
    /// description hook during this call.
    fn generate_json(&mut self, detail: DumpDetail) -> Result<usize>;

    /// Retrieve the JSON produced by [`DumpDecoder::generate_json`].
    fn json(&self, size: usize) -> Result<String>;
}

/// Entry points of the vendor diagnostics runtime.
pub trait DiagnosticsApi: Send + Sync {
    /// Register the capture hooks and start watching for GPU faults.
    ///
    /// Hooks fire from the runtime's own threads at fault time; the
    /// runtime must not invoke them synchronously from this call.
    fn enable_crash_dumps(&self, hooks: Arc<dyn CaptureHooks>) -> Result<()>;

    /// Stop watching for GPU faults.
    fn disable_crash_dumps(&self) -> Result<()>;

    /// Content hash of a SPIR-V module.
    fn shader_hash(&self, words: &[u32]) -> Result<ShaderHash>;

    /// Identifier of a shader debug-info blob.
    fn debug_info_id(&self, data: &[u8]) -> Result<DebugInfoId>;

    /// Create a decoder over a raw crash dump.
    fn create_decoder<'a>(&'a self, dump: &'a [u8]) -> Result<Box<dyn DumpDecoder + 'a>>;
}

/// Acquires the diagnostics runtime at a negotiated API version.
///
/// This is where a missing runtime or a missing entry point surfaces;
/// both are reported as [`DiagnosticsError`] and leave the caller free to
/// retry later.
pub trait DiagnosticsLoader {
    fn load(&self, version: u32) -> Result<Arc<dyn DiagnosticsApi>>;
}
