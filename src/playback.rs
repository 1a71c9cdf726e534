// src/playback.rs

use std::sync::Arc;

use crate::audio_buffer::SampleBuffer;
use crate::buffer_handoff::BufferHandoff;
use crate::position::PlaybackPosition;

/// Real-time pull callback state.
///
/// This struct runs exclusively on the audio thread. The host's audio
/// subsystem calls [`Playback::render`] on its own schedule; it reads the
/// currently published buffer with wrap-around indexing.
/// It must not allocate, lock, or log.
pub struct Playback {
    handoff: Arc<BufferHandoff>,

    /// Read cursor into the published buffer
    position: PlaybackPosition,

    /// Generation the cursor belongs to
    generation: u64,
}

impl Playback {
    pub fn new(handoff: Arc<BufferHandoff>) -> Self {
        Self {
            handoff,
            position: PlaybackPosition::new(),
            generation: 0,
        }
    }

    /// Fill `out` with interleaved stereo frames `[L0, R0, L1, R1, ...]`.
    ///
    /// A trailing odd sample is zeroed.
    pub fn render(&mut self, out: &mut [f32]) {
        let current = self.handoff.load();
        self.follow(current.generation);
        let buffer = &current.buffer;

        let mut frames = out.chunks_exact_mut(2);
        for frame in &mut frames {
            let f = self.position.next_frame(buffer, 1.0);
            frame[0] = f.left;
            frame[1] = f.right;
        }
        frames.into_remainder().fill(0.0);
    }

    /// Fill separate left/right channel slices.
    pub fn render_planar(&mut self, left: &mut [f32], right: &mut [f32]) {
        let current = self.handoff.load();
        self.follow(current.generation);
        let buffer: &SampleBuffer = &current.buffer;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let f = self.position.next_frame(buffer, 1.0);
            *l = f.left;
            *r = f.right;
        }
        let frames = left.len().min(right.len());
        left[frames..].fill(0.0);
        right[frames..].fill(0.0);
    }

    #[inline]
    pub fn position(&self) -> PlaybackPosition {
        self.position
    }

    /// Restart from the top of a newly published buffer.
    #[inline]
    fn follow(&mut self, generation: u64) {
        if generation != self.generation {
            self.generation = generation;
            self.position.reset();
        }
    }
}
