use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::{ArcSwap, Guard};
use log::debug;

use crate::audio_buffer::SampleBuffer;

/// A finished output buffer plus the publication it belongs to.
#[derive(Debug, Default)]
pub struct PublishedBuffer {
    pub generation: u64,
    pub buffer: SampleBuffer,
}

/// Lock-free hand-off of finished buffers to the audio thread.
///
/// Single producer (editing thread, after recalculation)
/// Any number of consumers (audio callback, exporter, meters)
///
/// A published buffer is immutable. Publishing swaps in a new `Arc`; the
/// buffer being read is never written in place.
pub struct BufferHandoff {
    current: ArcSwap<PublishedBuffer>,

    /// Previous publication, released on the editing thread at the next
    /// publish. The audio callback only frees a buffer if two publishes land
    /// inside one callback. Only the editing thread locks it.
    retired: Mutex<Option<Arc<PublishedBuffer>>>,

    generation: AtomicU64,
}

impl BufferHandoff {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(PublishedBuffer::default()),
            retired: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Publish a finished buffer.
    ///
    /// Editing-thread only. Allocates; never call from the audio callback.
    pub fn publish(&self, buffer: SampleBuffer) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let len = buffer.len();
        let previous = self
            .current
            .swap(Arc::new(PublishedBuffer { generation, buffer }));
        let released = match self.retired.lock() {
            Ok(mut slot) => slot.replace(previous),
            Err(poisoned) => poisoned.into_inner().replace(previous),
        };
        drop(released);
        debug!("handoff: published generation {} ({} samples)", generation, len);
        generation
    }

    /// Borrow the currently published buffer.
    ///
    /// Audio-thread-safe, lock-free.
    #[inline]
    pub fn load(&self) -> Guard<Arc<PublishedBuffer>> {
        self.current.load()
    }

    /// Take a long-lived reference to the current buffer (not for the
    /// audio thread).
    #[inline]
    pub fn snapshot(&self) -> Arc<PublishedBuffer> {
        self.current.load_full()
    }

    /// Generation of the most recent publication (0 = nothing published).
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }
}

impl Default for BufferHandoff {
    fn default() -> Self {
        Self::new()
    }
}
