// C-compatible FFI bindings for the native shell.
//
// Safety requirements:
// - All pointers must be non-null unless documented otherwise
// - All handles must be created by this module and not fabricated
// - Path parameters must be valid null-terminated UTF-8
// - Caller must call the corresponding _destroy function for each _create
//
// Threading:
// - Engine functions belong to the editing thread
// - Playback functions belong to the audio thread; a playback handle stays
//   valid after its engine is destroyed and then renders the last loop

use std::ffi::{CStr, c_char};
use std::path::Path;

use log::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::graph::NodeId;
use crate::playback::Playback;

/// Returned in place of a node id when the call failed.
pub const TILESYNTH_INVALID_NODE: u32 = u32::MAX;

// Logger subsystem identifier
#[cfg(feature = "ios")]
const LOG_SUBSYSTEM: &str = "com.tilesynth.engine";

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize logging.
///
/// Call once at application startup before using any other FFI function.
/// With the `ios` feature, logs go to unified logging (Console.app and
/// Xcode's debug console); otherwise to stderr, filtered by `RUST_LOG`.
#[unsafe(no_mangle)]
pub extern "C" fn tilesynth_init_logger() {
    #[cfg(feature = "ios")]
    {
        oslog::OsLogger::new(LOG_SUBSYSTEM)
            .level_filter(log::LevelFilter::Debug)
            .init()
            .ok();
    }

    #[cfg(not(feature = "ios"))]
    {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .try_init()
            .ok();
    }
}

/// Flush any buffered log records. Call before the process exits.
#[unsafe(no_mangle)]
pub extern "C" fn tilesynth_shutdown_logger() {
    log::logger().flush();
}

// ═══════════════════════════════════════════════════════════════════════════
// Opaque Handle Types
// ═══════════════════════════════════════════════════════════════════════════

/// Opaque handle to the editing-side engine.
pub struct TileSynthEngine {
    inner: Engine,
}

/// Opaque handle to a real-time playback cursor.
pub struct TileSynthPlayback {
    inner: Playback,
}

// ═══════════════════════════════════════════════════════════════════════════
// Engine Creation
// ═══════════════════════════════════════════════════════════════════════════

/// Configuration for creating an engine.
#[repr(C)]
pub struct TileSynthConfig {
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Frames per host callback (sizing hint).
    pub frame_size: u32,
    /// Times the loop is repeated in an exported file.
    pub export_loops: u32,
}

impl Default for TileSynthConfig {
    fn default() -> Self {
        let cfg = EngineConfig::default();
        Self {
            sample_rate: cfg.sample_rate,
            frame_size: cfg.frame_size as u32,
            export_loops: cfg.export_loops,
        }
    }
}

impl From<&TileSynthConfig> for EngineConfig {
    fn from(c: &TileSynthConfig) -> Self {
        EngineConfig::with_values(c.sample_rate, c.frame_size as usize, c.export_loops)
    }
}

/// Get the default configuration values.
#[unsafe(no_mangle)]
pub extern "C" fn tilesynth_default_config() -> TileSynthConfig {
    TileSynthConfig::default()
}

/// Create an engine holding only its output node.
///
/// Returns an opaque pointer that must be freed with
/// `tilesynth_engine_destroy`.
///
/// # Safety
/// `config` must be a valid pointer to a TileSynthConfig or NULL for defaults.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_engine_create(
    config: *const TileSynthConfig,
) -> *mut TileSynthEngine {
    let cfg = if config.is_null() {
        EngineConfig::default()
    } else {
        unsafe { EngineConfig::from(&*config) }
    };

    Box::into_raw(Box::new(TileSynthEngine {
        inner: Engine::new(cfg),
    }))
}

/// Destroy an engine handle.
///
/// # Safety
/// `engine` must be a valid pointer returned by `tilesynth_engine_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_engine_destroy(engine: *mut TileSynthEngine) {
    if !engine.is_null() {
        unsafe { drop(Box::from_raw(engine)) };
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Engine - Graph Mutations
// ═══════════════════════════════════════════════════════════════════════════

/// Id of the output node.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_engine_output_node(engine: *const TileSynthEngine) -> u32 {
    if engine.is_null() {
        return TILESYNTH_INVALID_NODE;
    }
    unsafe { (*engine).inner.output_node().0 }
}

/// Add a node of a registered type.
///
/// Returns the new node's id, or `TILESYNTH_INVALID_NODE`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_engine_add_node(engine: *mut TileSynthEngine, type_id: u32) -> u32 {
    if engine.is_null() {
        return TILESYNTH_INVALID_NODE;
    }
    match unsafe { (*engine).inner.add_node(type_id) } {
        Ok(id) => {
            debug!("ffi: add_node type {} -> {}", type_id, id);
            id.0
        }
        Err(e) => {
            warn!("ffi: add_node failed: {}", e);
            TILESYNTH_INVALID_NODE
        }
    }
}

/// Remove a node. Its children stay alive, unconnected.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_engine_remove_node(engine: *mut TileSynthEngine, node_id: u32) -> bool {
    if engine.is_null() {
        return false;
    }
    report("remove_node", unsafe { (*engine).inner.remove_node(NodeId(node_id)) })
}

/// Make `child` an input of `parent`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_engine_connect(
    engine: *mut TileSynthEngine,
    child: u32,
    parent: u32,
) -> bool {
    if engine.is_null() {
        return false;
    }
    report("connect", unsafe {
        (*engine).inner.connect(NodeId(child), NodeId(parent))
    })
}

/// Detach `child` from `parent`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_engine_disconnect(
    engine: *mut TileSynthEngine,
    child: u32,
    parent: u32,
) -> bool {
    if engine.is_null() {
        return false;
    }
    report("disconnect", unsafe {
        (*engine).inner.disconnect(NodeId(child), NodeId(parent))
    })
}

/// Set a node parameter. Out-of-range values are clamped.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_engine_set_param(
    engine: *mut TileSynthEngine,
    node_id: u32,
    param_id: u32,
    value: f32,
) -> bool {
    if engine.is_null() {
        return false;
    }
    report("set_param", unsafe {
        (*engine).inner.set_param(NodeId(node_id), param_id, value)
    })
}

fn report<E: std::fmt::Display>(op: &str, result: Result<(), E>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("ffi: {} failed: {}", op, e);
            false
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Engine - Recalculation & Readback
// ═══════════════════════════════════════════════════════════════════════════

/// Regenerate the graph and publish the new loop to playback.
///
/// Returns the number of nodes that failed and were silenced (0 on full
/// success), or `u32::MAX` for a null handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_engine_recalculate(engine: *mut TileSynthEngine) -> u32 {
    if engine.is_null() {
        return u32::MAX;
    }
    match unsafe { (*engine).inner.recalculate() } {
        Ok(()) => 0,
        Err(e) => e.faults.len() as u32,
    }
}

/// Length of the published loop in samples per channel.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_engine_output_len(engine: *const TileSynthEngine) -> u32 {
    if engine.is_null() {
        return 0;
    }
    unsafe { (*engine).inner.output().buffer.len() as u32 }
}

/// Copy the published loop into caller-owned channel arrays.
///
/// Copies at most `capacity` samples per channel and returns how many were
/// copied.
///
/// # Safety
/// `left` and `right` must each have space for `capacity` floats.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_engine_copy_output(
    engine: *const TileSynthEngine,
    left: *mut f32,
    right: *mut f32,
    capacity: u32,
) -> u32 {
    if engine.is_null() || left.is_null() || right.is_null() {
        return 0;
    }

    let published = unsafe { (*engine).inner.output() };
    let buffer = &published.buffer;
    let n = buffer.len().min(capacity as usize);

    let out_left = unsafe { std::slice::from_raw_parts_mut(left, n) };
    let out_right = unsafe { std::slice::from_raw_parts_mut(right, n) };
    out_left.copy_from_slice(&buffer.left()[..n]);
    out_right.copy_from_slice(&buffer.right()[..n]);

    n as u32
}

// ═══════════════════════════════════════════════════════════════════════════
// Export
// ═══════════════════════════════════════════════════════════════════════════

/// Recalculate and write the loop as a 16-bit stereo WAV file.
///
/// A NULL `path` means no destination was chosen; nothing is written and
/// `false` is returned.
///
/// # Safety
/// `path` must be a valid null-terminated UTF-8 string or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_engine_export_wav(
    engine: *mut TileSynthEngine,
    path: *const c_char,
) -> bool {
    if engine.is_null() {
        return false;
    }

    let path = if path.is_null() {
        None
    } else {
        match unsafe { CStr::from_ptr(path) }.to_str() {
            Ok(s) => Some(Path::new(s)),
            Err(_) => {
                error!("ffi: export path is not valid UTF-8");
                return false;
            }
        }
    };

    match unsafe { (*engine).inner.save_wav(path) } {
        Ok(()) => {
            info!("ffi: export finished");
            true
        }
        Err(e) => {
            warn!("ffi: export failed: {}", e);
            false
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Playback (audio thread)
// ═══════════════════════════════════════════════════════════════════════════

/// Create a playback cursor that reads the engine's published loop.
///
/// Create it on the editing thread, then hand it to the audio thread.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_playback_create(
    engine: *const TileSynthEngine,
) -> *mut TileSynthPlayback {
    if engine.is_null() {
        return std::ptr::null_mut();
    }
    let playback = unsafe { (*engine).inner.playback() };
    Box::into_raw(Box::new(TileSynthPlayback { inner: playback }))
}

/// Destroy a playback handle.
///
/// # Safety
/// `playback` must be a valid pointer returned by `tilesynth_playback_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_playback_destroy(playback: *mut TileSynthPlayback) {
    if !playback.is_null() {
        unsafe { drop(Box::from_raw(playback)) };
    }
}

/// Render `frames` frames into separate left/right buffers.
///
/// If the handle is invalid, buffers are filled with silence.
///
/// # Safety
/// - Must be called from the audio thread
/// - Output buffers must be valid and have space for `frames` samples
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_playback_render(
    playback: *mut TileSynthPlayback,
    frames: u32,
    output_left: *mut f32,
    output_right: *mut f32,
) {
    let total_frames = frames as usize;

    if playback.is_null() || output_left.is_null() || output_right.is_null() {
        if !output_left.is_null() {
            unsafe { std::ptr::write_bytes(output_left, 0, total_frames) };
        }
        if !output_right.is_null() {
            unsafe { std::ptr::write_bytes(output_right, 0, total_frames) };
        }
        return;
    }

    let out_left = unsafe { std::slice::from_raw_parts_mut(output_left, total_frames) };
    let out_right = unsafe { std::slice::from_raw_parts_mut(output_right, total_frames) };
    unsafe { (*playback).inner.render_planar(out_left, out_right) };
}

/// Render `frames` frames to an interleaved stereo buffer.
///
/// Output format: [L0, R0, L1, R1, L2, R2, ...]
///
/// # Safety
/// - Must be called from the audio thread
/// - `output` must have space for `frames * 2` floats
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tilesynth_playback_render_interleaved(
    playback: *mut TileSynthPlayback,
    frames: u32,
    output: *mut f32,
) {
    let total = frames as usize * 2;

    if playback.is_null() || output.is_null() {
        if !output.is_null() {
            unsafe { std::ptr::write_bytes(output, 0, total) };
        }
        return;
    }

    let out = unsafe { std::slice::from_raw_parts_mut(output, total) };
    unsafe { (*playback).inner.render(out) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{node_types, params};
    use std::ffi::CString;

    #[test]
    fn null_handles_are_rejected() {
        unsafe {
            assert_eq!(
                tilesynth_engine_add_node(std::ptr::null_mut(), node_types::OSCILLATOR),
                TILESYNTH_INVALID_NODE
            );
            assert!(!tilesynth_engine_connect(std::ptr::null_mut(), 1, 0));
            assert_eq!(tilesynth_engine_recalculate(std::ptr::null_mut()), u32::MAX);
            assert!(tilesynth_playback_create(std::ptr::null()).is_null());

            let mut out = [1.0_f32; 4];
            tilesynth_playback_render_interleaved(std::ptr::null_mut(), 2, out.as_mut_ptr());
            assert_eq!(out, [0.0; 4]);
        }
    }

    #[test]
    fn build_recalculate_and_play() {
        unsafe {
            let engine = tilesynth_engine_create(std::ptr::null());
            let output = tilesynth_engine_output_node(engine);

            let osc = tilesynth_engine_add_node(engine, node_types::OSCILLATOR);
            assert_ne!(osc, TILESYNTH_INVALID_NODE);
            assert!(tilesynth_engine_set_param(engine, osc, params::FREQ, 441.0));
            assert!(tilesynth_engine_connect(engine, osc, output));
            assert!(!tilesynth_engine_connect(engine, output, osc));
            assert_eq!(tilesynth_engine_recalculate(engine), 0);
            assert_eq!(tilesynth_engine_output_len(engine), 100);

            let mut left = [0.0_f32; 128];
            let mut right = [0.0_f32; 128];
            let copied =
                tilesynth_engine_copy_output(engine, left.as_mut_ptr(), right.as_mut_ptr(), 128);
            assert_eq!(copied, 100);

            let playback = tilesynth_playback_create(engine);
            let mut l = [0.0_f32; 4];
            let mut r = [0.0_f32; 4];
            tilesynth_playback_render(playback, 4, l.as_mut_ptr(), r.as_mut_ptr());
            assert_eq!(&l, &left[..4]);
            assert_eq!(&r, &right[..4]);

            // playback outlives the engine
            tilesynth_engine_destroy(engine);
            tilesynth_playback_render(playback, 4, l.as_mut_ptr(), r.as_mut_ptr());
            assert_eq!(&l, &left[4..8]);
            tilesynth_playback_destroy(playback);
        }
    }

    #[test]
    fn bad_frequency_counts_as_fault() {
        unsafe {
            let engine = tilesynth_engine_create(std::ptr::null());
            let osc = tilesynth_engine_add_node(engine, node_types::OSCILLATOR);
            tilesynth_engine_connect(engine, osc, tilesynth_engine_output_node(engine));
            tilesynth_engine_set_param(engine, osc, params::FREQ, -5.0);
            assert_eq!(tilesynth_engine_recalculate(engine), 1);
            assert_eq!(tilesynth_engine_output_len(engine), 0);
            tilesynth_engine_destroy(engine);
        }
    }

    #[test]
    fn export_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let c_path = CString::new(path.to_str().unwrap()).unwrap();

        unsafe {
            let config = TileSynthConfig {
                sample_rate: 48_000,
                frame_size: 128,
                export_loops: 1,
            };
            let engine = tilesynth_engine_create(&config);
            assert!(!tilesynth_engine_export_wav(engine, std::ptr::null()));
            assert!(tilesynth_engine_export_wav(engine, c_path.as_ptr()));
            tilesynth_engine_destroy(engine);
        }

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 48_000);
        assert_eq!(reader.duration(), 0);
    }
}
