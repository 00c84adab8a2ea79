//! Deterministic test doubles for the diagnostics surface.
//!
//! `MockDiagnostics` stands in for the vendor runtime: hashes and
//! identifiers are scripted per input (with a stable fold as fallback),
//! every entry point can be switched to fail, and registered hooks can be
//! driven the way the real runtime drives them from its own threads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::{
    CaptureHooks, DebugInfoId, DescriptionKey, DiagnosticsApi, DiagnosticsError, DiagnosticsLoader,
    DumpDecoder, DumpDetail, Result, ShaderHash, DIAGNOSTICS_API_VERSION,
};

/// Failure switches, one per vendor entry point.
#[derive(Debug, Default, Clone)]
pub struct MockFailures {
    pub enable: bool,
    pub disable: bool,
    pub shader_hash: bool,
    pub debug_info_id: bool,
    pub create_decoder: bool,
    pub generate_json: bool,
    pub get_json: bool,
}

#[derive(Default)]
struct MockState {
    hooks: Option<Arc<dyn CaptureHooks>>,
    shader_hashes: HashMap<Vec<u32>, ShaderHash>,
    debug_info_ids: HashMap<Vec<u8>, DebugInfoId>,
}

/// Deterministic [`DiagnosticsApi`] double.
pub struct MockDiagnostics {
    state: Mutex<MockState>,
    failures: Mutex<MockFailures>,
    live_decoders: AtomicUsize,
    enable_calls: AtomicUsize,
    disable_calls: AtomicUsize,
}

impl MockDiagnostics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState::default()),
            failures: Mutex::new(MockFailures::default()),
            live_decoders: AtomicUsize::new(0),
            enable_calls: AtomicUsize::new(0),
            disable_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_failures(&self, failures: MockFailures) {
        *self.failures.lock().unwrap() = failures;
    }

    /// Script the hash returned for one exact module.
    pub fn script_shader_hash(&self, words: &[u32], hash: ShaderHash) {
        self.state
            .lock()
            .unwrap()
            .shader_hashes
            .insert(words.to_vec(), hash);
    }

    /// Script the identifier returned for one exact debug-info blob.
    pub fn script_debug_info_id(&self, data: &[u8], id: DebugInfoId) {
        self.state
            .lock()
            .unwrap()
            .debug_info_ids
            .insert(data.to_vec(), id);
    }

    /// Hooks registered by the last successful `enable_crash_dumps`.
    pub fn hooks(&self) -> Option<Arc<dyn CaptureHooks>> {
        self.state.lock().unwrap().hooks.clone()
    }

    /// Drive a captured crash dump through the registered hooks, the way
    /// the vendor runtime does from one of its own threads.
    pub fn deliver_crash_dump(&self, dump: &[u8]) {
        if let Some(hooks) = self.hooks() {
            hooks.on_crash_dump(dump);
        }
    }

    /// Drive a shader debug-info blob through the registered hooks.
    pub fn deliver_shader_debug_info(&self, data: &[u8]) {
        if let Some(hooks) = self.hooks() {
            hooks.on_shader_debug_info(data);
        }
    }

    /// Decoders created and not yet released.
    pub fn live_decoders(&self) -> usize {
        self.live_decoders.load(Ordering::SeqCst)
    }

    pub fn enable_calls(&self) -> usize {
        self.enable_calls.load(Ordering::SeqCst)
    }

    pub fn disable_calls(&self) -> usize {
        self.disable_calls.load(Ordering::SeqCst)
    }

    fn failed(&self, switch: impl Fn(&MockFailures) -> bool, call: &'static str) -> Result<()> {
        if switch(&self.failures.lock().unwrap()) {
            Err(DiagnosticsError::CallFailed { call, status: -1 })
        } else {
            Ok(())
        }
    }

    // FNV-1a folds keep unscripted inputs deterministic across runs.
    fn fold_words(words: &[u32]) -> u64 {
        words.iter().fold(0xcbf2_9ce4_8422_2325, |acc, w| {
            (acc ^ u64::from(*w)).wrapping_mul(0x0000_0100_0000_01b3)
        })
    }

    fn fold_bytes(seed: u64, data: &[u8]) -> u64 {
        data.iter().fold(seed, |acc, b| {
            (acc ^ u64::from(*b)).wrapping_mul(0x0000_0100_0000_01b3)
        })
    }
}

impl DiagnosticsApi for MockDiagnostics {
    fn enable_crash_dumps(&self, hooks: Arc<dyn CaptureHooks>) -> Result<()> {
        self.failed(|f| f.enable, "enable_crash_dumps")?;
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap().hooks = Some(hooks);
        Ok(())
    }

    fn disable_crash_dumps(&self) -> Result<()> {
        self.failed(|f| f.disable, "disable_crash_dumps")?;
        self.disable_calls.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap().hooks = None;
        Ok(())
    }

    fn shader_hash(&self, words: &[u32]) -> Result<ShaderHash> {
        self.failed(|f| f.shader_hash, "shader_hash")?;
        let scripted = self.state.lock().unwrap().shader_hashes.get(words).copied();
        Ok(scripted.unwrap_or_else(|| Self::fold_words(words)))
    }

    fn debug_info_id(&self, data: &[u8]) -> Result<DebugInfoId> {
        self.failed(|f| f.debug_info_id, "debug_info_id")?;
        let scripted = self.state.lock().unwrap().debug_info_ids.get(data).copied();
        Ok(scripted.unwrap_or_else(|| {
            DebugInfoId([
                Self::fold_bytes(0xcbf2_9ce4_8422_2325, data),
                Self::fold_bytes(0x84222325_cbf29ce4, data),
            ])
        }))
    }

    fn create_decoder<'a>(&'a self, dump: &'a [u8]) -> Result<Box<dyn DumpDecoder + 'a>> {
        self.failed(|f| f.create_decoder, "create_decoder")?;
        self.live_decoders.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDecoder {
            runtime: self,
            dump,
            json: None,
        }))
    }
}

struct MockDecoder<'a> {
    runtime: &'a MockDiagnostics,
    dump: &'a [u8],
    json: Option<String>,
}

impl DumpDecoder for MockDecoder<'_> {
    fn generate_json(&mut self, _detail: DumpDetail) -> Result<usize> {
        self.runtime.failed(|f| f.generate_json, "generate_json")?;

        let mut description = Vec::new();
        if let Some(hooks) = self.runtime.hooks() {
            hooks.on_crash_dump_description(&mut |key, value| {
                let key = match key {
                    DescriptionKey::ApplicationName => "application_name",
                    DescriptionKey::ApplicationVersion => "application_version",
                };
                description.push(format!("\"{key}\":\"{value}\""));
            });
        }
        let json = format!(
            "{{\"dump_bytes\":{},\"description\":{{{}}}}}",
            self.dump.len(),
            description.join(",")
        );
        let size = json.len();
        self.json = Some(json);
        Ok(size)
    }

    fn json(&self, size: usize) -> Result<String> {
        self.runtime.failed(|f| f.get_json, "get_json")?;
        let json = self.json.as_ref().ok_or(DiagnosticsError::CallFailed {
            call: "get_json",
            status: -2,
        })?;
        if size != json.len() {
            return Err(DiagnosticsError::CallFailed {
                call: "get_json",
                status: -3,
            });
        }
        Ok(json.clone())
    }
}

impl Drop for MockDecoder<'_> {
    fn drop(&mut self) {
        self.runtime.live_decoders.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scripted [`DiagnosticsLoader`].
pub enum MockLoader {
    /// Yields the runtime after verifying the negotiated version.
    Available(Arc<MockDiagnostics>),
    /// The runtime could not be found at all.
    Unavailable,
    /// The runtime exists but lacks one entry point.
    MissingEntryPoint(&'static str),
}

impl DiagnosticsLoader for MockLoader {
    fn load(&self, version: u32) -> Result<Arc<dyn DiagnosticsApi>> {
        if version != DIAGNOSTICS_API_VERSION {
            return Err(DiagnosticsError::UnsupportedVersion { requested: version });
        }
        match self {
            MockLoader::Available(runtime) => Ok(Arc::clone(runtime) as Arc<dyn DiagnosticsApi>),
            MockLoader::Unavailable => Err(DiagnosticsError::NotAvailable),
            MockLoader::MissingEntryPoint(name) => Err(DiagnosticsError::MissingEntryPoint(name)),
        }
    }
}
