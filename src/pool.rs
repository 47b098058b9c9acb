//! Source pool module.
//!
//! # Overview
//!
//! Native playback sources are a scarce, driver-limited resource, and
//! generating them is not free. [`SourcePool`] puts a hard ceiling on how
//! many of them exist at once and recycles finished ones: acquiring hands
//! out a previously reclaimed source when one is idle and only generates a
//! new native handle while the pool is below its capacity. Reclaiming
//! resets a finished source (drains its processed buffers, rewinds it) and
//! makes it available for the next acquire.
//!
//! The pool also detects caller misuse deterministically: reclaiming a
//! source of another pool, a disposed source, or a source that is still
//! playing fails immediately with a dedicated error instead of corrupting
//! the bookkeeping.
//!
//! # Usage
//!
//! ```no_run
//! use chorus_sound::{context::AudioContext, pool::SourcePool};
//!
//! fn fire_and_forget() -> Result<(), chorus_sound::error::SoundError> {
//!     let mut pool = SourcePool::new(AudioContext::software(), 16)?;
//!
//!     // Give finished sources back to the pool before asking for a new
//!     // one; a steady state never allocates.
//!     pool.reclaim_all_finished()?;
//!     if let Some(source) = pool.try_acquire()? {
//!         // queue data and play...
//!         let _ = source;
//!     }
//!     Ok(())
//! }
//! ```

use crate::{context::AudioContext, error::SoundError, source::Source};
use log::{debug, warn};
use std::collections::VecDeque;

/// A bounded pool of reusable playback sources. See module docs.
///
/// Each source tracked by the pool moves through a fixed lifecycle:
/// unallocated → available → in use → available → ... → disposed. The move
/// from in use back to available happens only through a successful reclaim,
/// which requires the source to have finished playing.
#[derive(Debug)]
pub struct SourcePool {
    context: AudioContext,
    capacity: usize,
    sources: Vec<Source>,
    available: VecDeque<Source>,
    disposed: bool,
}

impl SourcePool {
    /// Creates a new source pool with room for `capacity` sources. No
    /// native handles are generated until they are first needed, so a pool
    /// can be sized generously without paying for unused slots.
    pub fn new(context: AudioContext, capacity: usize) -> Result<Self, SoundError> {
        if capacity == 0 {
            return Err(SoundError::InvalidCapacity);
        }
        Ok(Self {
            context,
            capacity,
            sources: Vec::with_capacity(capacity),
            available: VecDeque::with_capacity(capacity),
            disposed: false,
        })
    }

    /// Creates a new source pool and eagerly generates all `capacity`
    /// native handles, trading startup cost for steady-state latency
    /// without a first-use allocation spike.
    pub fn preallocated(context: AudioContext, capacity: usize) -> Result<Self, SoundError> {
        let mut pool = Self::new(context, capacity)?;
        for _ in 0..capacity {
            pool.allocate_new_source()?;
        }
        Ok(pool)
    }

    /// The number of sources this source pool manages.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of sources allocated so far. Never exceeds the capacity.
    pub fn allocated_count(&self) -> usize {
        self.sources.len()
    }

    /// Whether there is currently a source available for playing, either
    /// idle in the pool or still unallocated. A disposed pool has no
    /// available sources.
    pub fn has_available_source(&self) -> bool {
        !self.disposed && (self.has_available_allocated_source() || !self.has_reached_capacity())
    }

    /// Disposal state of the pool.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Attempts to get an available source, marking it as in use until it
    /// is reclaimed. Returns an idle allocated source if there is one, else
    /// generates a new native handle if the pool is below capacity, else
    /// returns `None`. Exhaustion is a normal negative result, not an
    /// error; use [`SourcePool::acquire`] for the strict variant.
    pub fn try_acquire(&mut self) -> Result<Option<Source>, SoundError> {
        self.check_not_disposed()?;
        self.ensure_source_available_if_possible()?;
        Ok(self.available.pop_front())
    }

    /// Like [`SourcePool::try_acquire`], but exhaustion is an error. Fails
    /// with `PoolExhausted` when every source is in use and the pool has
    /// reached its capacity; callers may retry after reclaiming.
    pub fn acquire(&mut self) -> Result<Source, SoundError> {
        self.try_acquire()?.ok_or(SoundError::PoolExhausted)
    }

    /// Reclaims a source, adding it back to the available sources of this
    /// pool after draining its processed buffers and rewinding it.
    ///
    /// The source must have been acquired from this pool (`ForeignSource`
    /// otherwise), must not be disposed (`DisposedSource`) and must have
    /// finished playing (`StillPlaying`). Reclaiming a source that is
    /// already idle in the pool has no effect.
    pub fn reclaim(&mut self, source: &Source) -> Result<(), SoundError> {
        self.check_not_disposed()?;
        if !self.sources.contains(source) {
            return Err(SoundError::ForeignSource);
        }
        if source.is_disposed() {
            return Err(SoundError::DisposedSource);
        }
        if !source.finished_playing()? {
            return Err(SoundError::StillPlaying);
        }
        if self.available.contains(source) {
            return Ok(());
        }
        self.reset_and_enqueue(source)
    }

    /// Reclaims every source that has finished playing, in allocation
    /// order. Looping and still-playing sources stay in use. Fails with
    /// `DisposedSource` if any in-use source was disposed out of band;
    /// sources scanned before the disposed one are reclaimed regardless.
    pub fn reclaim_all_finished(&mut self) -> Result<(), SoundError> {
        self.check_not_disposed()?;
        for index in 0..self.sources.len() {
            let source = self.sources[index].clone();
            if self.available.contains(&source) {
                continue;
            }
            if source.is_disposed() {
                return Err(SoundError::DisposedSource);
            }
            if source.finished_playing()? {
                self.reset_and_enqueue(&source)?;
            }
        }
        Ok(())
    }

    /// Disposes every allocated source exactly once, clears the pool and
    /// marks it disposed. Idempotent. After disposal every acquire/reclaim
    /// operation fails with `PoolDisposed`.
    pub fn dispose(&mut self) -> Result<(), SoundError> {
        if self.disposed {
            return Ok(());
        }
        for source in &self.sources {
            source.dispose()?;
        }
        self.sources.clear();
        self.available.clear();
        self.disposed = true;
        debug!("source pool disposed");
        Ok(())
    }

    fn has_reached_capacity(&self) -> bool {
        self.sources.len() == self.capacity
    }

    fn has_available_allocated_source(&self) -> bool {
        !self.available.is_empty()
    }

    fn ensure_source_available_if_possible(&mut self) -> Result<(), SoundError> {
        if self.has_available_allocated_source() {
            return Ok(());
        }
        if !self.has_reached_capacity() {
            self.allocate_new_source()?;
        }
        Ok(())
    }

    fn allocate_new_source(&mut self) -> Result<(), SoundError> {
        debug_assert!(
            !self.has_reached_capacity(),
            "should not allocate when pool has reached capacity"
        );
        let source = Source::new(&self.context)?;
        debug!(
            "allocated pooled source {} ({} of {})",
            source.handle(),
            self.sources.len() + 1,
            self.capacity
        );
        self.sources.push(source.clone());
        self.available.push_back(source);
        Ok(())
    }

    // The source must be fully reset before it becomes visible as
    // available, so an acquire never observes a half-reset source.
    fn reset_and_enqueue(&mut self, source: &Source) -> Result<(), SoundError> {
        source.dequeue_processed_buffers()?;
        source.rewind()?;
        self.available.push_back(source.clone());
        Ok(())
    }

    fn check_not_disposed(&self) -> Result<(), SoundError> {
        if self.disposed {
            Err(SoundError::PoolDisposed)
        } else {
            Ok(())
        }
    }
}

impl Drop for SourcePool {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            warn!("failed to dispose source pool on drop: {}", err);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        backend::software::SoftwareBackend,
        buffer::{SampleFormat, SoundBuffer, SoundBufferData},
    };

    fn generated_sources(context: &AudioContext) -> usize {
        context
            .state()
            .backend()
            .as_any()
            .downcast_ref::<SoftwareBackend>()
            .unwrap()
            .generated_source_count()
    }

    fn rewinds(context: &AudioContext, source: &Source) -> usize {
        let handle = source.handle();
        context
            .state()
            .backend()
            .as_any()
            .downcast_ref::<SoftwareBackend>()
            .unwrap()
            .rewind_count(handle)
    }

    fn queue_and_play(context: &AudioContext, source: &Source) -> SoundBuffer {
        let data = SoundBufferData::new(vec![vec![0; 8]], SampleFormat::Mono16, 44100);
        let buffer = SoundBuffer::from_data(context, &data).unwrap();
        source.queue_buffer(&buffer).unwrap();
        source.play().unwrap();
        buffer
    }

    fn finish_playback(context: &AudioContext, source: &Source) {
        let handle = source.handle();
        let mut state = context.state();
        state
            .backend_mut()
            .as_any_mut()
            .downcast_mut::<SoftwareBackend>()
            .unwrap()
            .finish_queued(handle)
            .unwrap();
    }

    #[test]
    fn preallocated_creates_pool_with_correct_capacity() {
        let pool = SourcePool::preallocated(AudioContext::software(), 10).unwrap();

        assert_eq!(pool.capacity(), 10);
    }

    #[test]
    fn preallocated_rejects_zero_capacity() {
        assert!(matches!(
            SourcePool::preallocated(AudioContext::software(), 0),
            Err(SoundError::InvalidCapacity)
        ));
    }

    #[test]
    fn preallocated_immediately_allocates_sources() {
        let context = AudioContext::software();

        let pool = SourcePool::preallocated(context.clone(), 7).unwrap();

        assert_eq!(generated_sources(&context), 7);
        assert_eq!(pool.allocated_count(), 7);
    }

    #[test]
    fn preallocated_pool_acquires_without_further_allocation() {
        let context = AudioContext::software();
        let mut pool = SourcePool::preallocated(context.clone(), 3).unwrap();

        for _ in 0..3 {
            assert!(pool.try_acquire().unwrap().is_some());
        }

        assert_eq!(generated_sources(&context), 3);
    }

    #[test]
    fn new_creates_pool_with_correct_capacity() {
        let pool = SourcePool::new(AudioContext::software(), 19).unwrap();

        assert_eq!(pool.capacity(), 19);
    }

    #[test]
    fn new_rejects_zero_capacity() {
        assert!(matches!(
            SourcePool::new(AudioContext::software(), 0),
            Err(SoundError::InvalidCapacity)
        ));
    }

    #[test]
    fn new_does_not_immediately_allocate_sources() {
        let context = AudioContext::software();

        let pool = SourcePool::new(context.clone(), 4).unwrap();

        assert_eq!(generated_sources(&context), 0);
        assert_eq!(pool.allocated_count(), 0);
        assert!(pool.has_available_source());
    }

    #[test]
    fn try_acquire_returns_a_source_when_available() {
        let mut pool = SourcePool::new(AudioContext::software(), 1).unwrap();

        assert!(pool.try_acquire().unwrap().is_some());
    }

    #[test]
    fn try_acquire_allocates_lazily() {
        let context = AudioContext::software();
        let mut pool = SourcePool::new(context.clone(), 1).unwrap();

        pool.try_acquire().unwrap();

        assert_eq!(generated_sources(&context), 1);
    }

    #[test]
    fn try_acquire_returns_none_when_exhausted() {
        let mut pool = SourcePool::new(AudioContext::software(), 1).unwrap();
        pool.try_acquire().unwrap();

        assert!(pool.try_acquire().unwrap().is_none());
    }

    #[test]
    fn try_acquire_uses_up_capacity() {
        let mut pool = SourcePool::new(AudioContext::software(), 1).unwrap();

        pool.try_acquire().unwrap();

        assert!(!pool.has_available_source());
    }

    #[test]
    fn pool_never_exceeds_its_capacity() {
        let context = AudioContext::software();
        let mut pool = SourcePool::new(context.clone(), 3).unwrap();

        while pool.try_acquire().unwrap().is_some() {}

        assert_eq!(generated_sources(&context), 3);
    }

    #[test]
    fn acquire_fails_when_exhausted() {
        let mut pool = SourcePool::new(AudioContext::software(), 1).unwrap();
        let _held = pool.acquire().unwrap();

        assert!(matches!(pool.acquire(), Err(SoundError::PoolExhausted)));
    }

    #[test]
    fn reclaim_rejects_a_foreign_source() {
        let context = AudioContext::software();
        let mut pool = SourcePool::new(context.clone(), 1).unwrap();
        let foreign = Source::new(&context).unwrap();

        assert!(matches!(
            pool.reclaim(&foreign),
            Err(SoundError::ForeignSource)
        ));
    }

    #[test]
    fn reclaim_rejects_a_disposed_source() {
        let mut pool = SourcePool::new(AudioContext::software(), 1).unwrap();
        let source = pool.acquire().unwrap();
        source.dispose().unwrap();

        assert!(matches!(
            pool.reclaim(&source),
            Err(SoundError::DisposedSource)
        ));
    }

    #[test]
    fn reclaim_rejects_a_looping_source() {
        let mut pool = SourcePool::new(AudioContext::software(), 1).unwrap();
        let source = pool.acquire().unwrap();
        source.set_looping(true).unwrap();

        assert!(matches!(
            pool.reclaim(&source),
            Err(SoundError::StillPlaying)
        ));
    }

    #[test]
    fn reclaim_rejects_a_source_with_pending_buffers() {
        let context = AudioContext::software();
        let mut pool = SourcePool::new(context.clone(), 1).unwrap();
        let source = pool.acquire().unwrap();
        let _buffer = queue_and_play(&context, &source);

        assert!(matches!(
            pool.reclaim(&source),
            Err(SoundError::StillPlaying)
        ));
    }

    #[test]
    fn reclaim_makes_the_source_available_for_reuse() {
        let mut pool = SourcePool::new(AudioContext::software(), 1).unwrap();
        let source = pool.acquire().unwrap();

        pool.reclaim(&source).unwrap();

        assert!(pool.has_available_source());
        assert_eq!(pool.try_acquire().unwrap().unwrap(), source);
    }

    #[test]
    fn reclaim_rewinds_the_source_exactly_once() {
        let context = AudioContext::software();
        let mut pool = SourcePool::new(context.clone(), 1).unwrap();
        let source = pool.acquire().unwrap();
        source.play().unwrap();
        finish_playback(&context, &source);

        pool.reclaim(&source).unwrap();

        assert_eq!(rewinds(&context, &source), 1);
    }

    #[test]
    fn reclaim_drains_processed_buffers_before_requeueing() {
        let context = AudioContext::software();
        let mut pool = SourcePool::new(context.clone(), 1).unwrap();
        let source = pool.acquire().unwrap();
        let _buffer = queue_and_play(&context, &source);
        finish_playback(&context, &source);

        pool.reclaim(&source).unwrap();

        assert_eq!(source.queued_buffers().unwrap(), 0);
        assert_eq!(source.playback_state().unwrap(), crate::backend::PlaybackState::Initial);
    }

    #[test]
    fn reclaim_of_an_idle_source_is_a_noop() {
        let mut pool = SourcePool::new(AudioContext::software(), 1).unwrap();
        let source = pool.acquire().unwrap();
        pool.reclaim(&source).unwrap();

        pool.reclaim(&source).unwrap();

        assert!(pool.try_acquire().unwrap().is_some());
        assert!(pool.try_acquire().unwrap().is_none());
    }

    #[test]
    fn acquire_reuses_reclaimed_sources_before_allocating() {
        let context = AudioContext::software();
        let mut pool = SourcePool::new(context.clone(), 2).unwrap();
        let source = pool.acquire().unwrap();
        pool.reclaim(&source).unwrap();

        let reused = pool.acquire().unwrap();

        assert_eq!(reused, source);
        assert_eq!(generated_sources(&context), 1);
    }

    #[test]
    fn available_sources_come_back_in_reclaim_order() {
        let mut pool = SourcePool::new(AudioContext::software(), 2).unwrap();
        let first = pool.acquire().unwrap();
        let second = pool.acquire().unwrap();

        pool.reclaim(&second).unwrap();
        pool.reclaim(&first).unwrap();

        assert_eq!(pool.acquire().unwrap(), second);
        assert_eq!(pool.acquire().unwrap(), first);
    }

    #[test]
    fn reclaim_all_finished_reclaims_only_finished_sources() {
        let mut pool = SourcePool::new(AudioContext::software(), 2).unwrap();
        let looping = pool.acquire().unwrap();
        let finished = pool.acquire().unwrap();
        looping.set_looping(true).unwrap();

        pool.reclaim_all_finished().unwrap();

        assert!(pool.has_available_source());
        assert_eq!(pool.try_acquire().unwrap().unwrap(), finished);
        assert!(!pool.has_available_source());
    }

    #[test]
    fn reclaim_all_finished_rewinds_each_reclaimed_source_once() {
        let context = AudioContext::software();
        let mut pool = SourcePool::new(context.clone(), 2).unwrap();
        let looping = pool.acquire().unwrap();
        let finished = pool.acquire().unwrap();
        looping.set_looping(true).unwrap();

        pool.reclaim_all_finished().unwrap();

        assert_eq!(rewinds(&context, &finished), 1);
        assert_eq!(rewinds(&context, &looping), 0);
    }

    #[test]
    fn reclaim_all_finished_fails_if_any_source_was_disposed() {
        let mut pool = SourcePool::new(AudioContext::software(), 2).unwrap();
        let disposed = pool.acquire().unwrap();
        let _held = pool.acquire().unwrap();
        disposed.dispose().unwrap();

        assert!(matches!(
            pool.reclaim_all_finished(),
            Err(SoundError::DisposedSource)
        ));
    }

    #[test]
    fn reclaim_all_finished_skips_sources_already_available() {
        let context = AudioContext::software();
        let mut pool = SourcePool::new(context.clone(), 2).unwrap();
        let source = pool.acquire().unwrap();
        pool.reclaim(&source).unwrap();

        pool.reclaim_all_finished().unwrap();

        // The idle source must be in the queue exactly once.
        assert!(pool.try_acquire().unwrap().is_some());
        pool.try_acquire().unwrap();
        assert!(pool.try_acquire().unwrap().is_none());
        assert_eq!(generated_sources(&context), 2);
        assert_eq!(rewinds(&context, &source), 1);
    }

    #[test]
    fn dispose_disposes_every_allocated_source() {
        let mut pool = SourcePool::new(AudioContext::software(), 2).unwrap();
        let held = pool.acquire().unwrap();
        let idle = pool.acquire().unwrap();
        pool.reclaim(&idle).unwrap();

        pool.dispose().unwrap();

        assert!(held.is_disposed());
        assert!(idle.is_disposed());
    }

    #[test]
    fn dispose_is_idempotent() {
        let context = AudioContext::software();
        let mut pool = SourcePool::new(context.clone(), 1).unwrap();
        pool.try_acquire().unwrap();

        pool.dispose().unwrap();
        pool.dispose().unwrap();

        assert!(pool.is_disposed());
        let state = context.state();
        let backend = state
            .backend()
            .as_any()
            .downcast_ref::<SoftwareBackend>()
            .unwrap();
        assert_eq!(backend.live_source_count(), 0);
    }

    #[test]
    fn operations_on_a_disposed_pool_fail() {
        let mut pool = SourcePool::new(AudioContext::software(), 1).unwrap();
        let source = pool.acquire().unwrap();
        pool.dispose().unwrap();

        assert!(matches!(pool.try_acquire(), Err(SoundError::PoolDisposed)));
        assert!(matches!(pool.acquire(), Err(SoundError::PoolDisposed)));
        assert!(matches!(
            pool.reclaim(&source),
            Err(SoundError::PoolDisposed)
        ));
        assert!(matches!(
            pool.reclaim_all_finished(),
            Err(SoundError::PoolDisposed)
        ));
        assert!(!pool.has_available_source());
    }

    #[test]
    fn dropping_the_pool_disposes_its_sources() {
        let context = AudioContext::software();
        let held;
        {
            let mut pool = SourcePool::new(context.clone(), 1).unwrap();
            held = pool.acquire().unwrap();
        }

        assert!(held.is_disposed());
        assert_eq!(
            context
                .state()
                .backend()
                .as_any()
                .downcast_ref::<SoftwareBackend>()
                .unwrap()
                .live_source_count(),
            0
        );
    }
}
