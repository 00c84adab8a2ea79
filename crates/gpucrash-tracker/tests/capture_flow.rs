//! End-to-end capture flow against the mock diagnostics runtime: one
//! renderer run that archives shaders, receives debug info, and survives
//! two GPU faults.

use std::sync::Arc;

use gpucrash_diag::testing::{MockDiagnostics, MockLoader};
use gpucrash_diag::DebugInfoId;
use gpucrash_tracker::{CrashTracker, TrackerConfig};
use tempfile::TempDir;

#[test]
fn test_full_capture_run() {
    let temp = TempDir::new().unwrap();
    let mock = MockDiagnostics::new();

    let mut config = TrackerConfig::new("vulkan-renderer");
    config.application_version = Some("0.9.0".to_string());
    config.dump_root = Some(temp.path().to_path_buf());

    let tracker = CrashTracker::with_default_fs(config);
    tracker
        .initialize(&MockLoader::Available(Arc::clone(&mock)))
        .unwrap();
    let dump_dir = tracker.dump_dir().unwrap();

    // Renderer compiles two pipelines.
    let vertex = [0x0723_0203_u32, 0x0001_0000, 0x0000_0001];
    let fragment = [0x0723_0203_u32, 0x0001_0000, 0x0000_0002];
    mock.script_shader_hash(&vertex, 0x1111_2222_3333_4444);
    mock.script_shader_hash(&fragment, 0x5555_6666_7777_8888);
    tracker.save_shader(&vertex);
    tracker.save_shader(&fragment);

    // The driver instruments one of them for crash correlation.
    mock.script_debug_info_id(b"correlation blob", DebugInfoId([0xabc, 0xdef]));
    mock.deliver_shader_debug_info(b"correlation blob");

    // Two faults in one run.
    mock.deliver_crash_dump(b"first raw dump");
    mock.deliver_crash_dump(b"second raw dump");

    for name in [
        "source_1111222233334444.spv",
        "source_5555666677778888.spv",
        "shader_0000000000000abc0000000000000def.nvdbg",
        "crash.nv-gpudmp",
        "crash.nv-gpudmp.json",
        "crash_1.nv-gpudmp",
        "crash_1.nv-gpudmp.json",
    ] {
        assert!(dump_dir.join(name).is_file(), "missing artifact {name}");
    }

    assert_eq!(
        std::fs::read(dump_dir.join("crash.nv-gpudmp")).unwrap(),
        b"first raw dump"
    );
    assert_eq!(
        std::fs::read(dump_dir.join("crash_1.nv-gpudmp")).unwrap(),
        b"second raw dump"
    );
    let json = std::fs::read_to_string(dump_dir.join("crash_1.nv-gpudmp.json")).unwrap();
    assert!(json.contains("\"application_name\":\"vulkan-renderer\""));

    assert_eq!(mock.live_decoders(), 0);
    drop(tracker);
    assert_eq!(mock.disable_calls(), 1);
}
