// src/config.rs
//
// Engine configuration.

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default frames per audio callback
pub const DEFAULT_FRAME_SIZE: usize = 256;

/// Default number of times the loop buffer is written on export
pub const DEFAULT_EXPORT_LOOPS: u32 = 1;

/// Configuration for creating an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Sample rate in Hz (used for period lengths and the WAV header).
    pub sample_rate: u32,
    /// Frames the host asks for per callback (sizing hint for shells).
    pub frame_size: usize,
    /// Repetitions of the finished loop in an exported file.
    pub export_loops: u32,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration with custom values.
    pub fn with_values(sample_rate: u32, frame_size: usize, export_loops: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            frame_size: frame_size.max(1),
            export_loops: export_loops.max(1),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_size: DEFAULT_FRAME_SIZE,
            export_loops: DEFAULT_EXPORT_LOOPS,
        }
    }
}
