//! Sound source module.
//!
//! # Overview
//!
//! A [`Source`] is one playback channel of the native backend. It owns one
//! native source handle, mirrors every settable property (gain, pitch,
//! looping, 3D position and velocity) to the backend on write, and queries
//! live transport state (queue counters, playback state) from the backend
//! on read — playback advances in the backend outside of this library's
//! control, so those reads are never cached.
//!
//! Sources are cheaply clonable handles to shared state; two clones compare
//! equal only if they refer to the same playback channel. This is what lets
//! a [`SourcePool`](crate::pool::SourcePool) keep ownership bookkeeping for
//! sources that are currently lent out to callers.
//!
//! A source created directly (outside a pool) must be disposed explicitly;
//! pooled sources are disposed by their pool.

use crate::{
    backend::{BoolProperty, FloatProperty, IntProperty, PlaybackState, Vec3Property},
    buffer::SoundBuffer,
    context::AudioContext,
    error::SoundError,
};
use nalgebra::Vector3;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct SourceState {
    context: AudioContext,
    handle: u32,
    disposed: bool,
    gain: f32,
    pitch: f32,
    looping: bool,
    position_relative: bool,
    position: Vector3<f32>,
    velocity: Vector3<f32>,
}

/// One playback channel of the native backend. See module docs.
#[derive(Clone, Debug)]
pub struct Source {
    state: Arc<Mutex<SourceState>>,
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Source {
    /// Generates a new native source on the given context.
    pub fn new(context: &AudioContext) -> Result<Self, SoundError> {
        let handle = context.state().backend_mut().generate_source()?;
        Ok(Self {
            state: Arc::new(Mutex::new(SourceState {
                context: context.clone(),
                handle,
                disposed: false,
                gain: 1.0,
                pitch: 1.0,
                looping: false,
                position_relative: false,
                position: Vector3::new(0.0, 0.0, 0.0),
                velocity: Vector3::new(0.0, 0.0, 0.0),
            })),
        })
    }

    /// Returns the underlying native handle.
    pub fn handle(&self) -> u32 {
        self.state.lock().unwrap().handle
    }

    /// Disposal state of this source.
    pub fn is_disposed(&self) -> bool {
        self.state.lock().unwrap().disposed
    }

    /// Returns the volume at which the source plays its buffers.
    pub fn gain(&self) -> f32 {
        self.state.lock().unwrap().gain
    }

    /// Sets the volume at which the source plays its buffers.
    pub fn set_gain(&self, gain: f32) -> Result<(), SoundError> {
        let mut state = self.checked_state()?;
        state
            .context
            .state()
            .backend_mut()
            .set_source_f32(state.handle, FloatProperty::Gain, gain)?;
        state.gain = gain;
        Ok(())
    }

    /// Returns the pitch at which the source plays its buffers.
    pub fn pitch(&self) -> f32 {
        self.state.lock().unwrap().pitch
    }

    /// Sets the pitch at which the source plays its buffers.
    pub fn set_pitch(&self, pitch: f32) -> Result<(), SoundError> {
        let mut state = self.checked_state()?;
        state
            .context
            .state()
            .backend_mut()
            .set_source_f32(state.handle, FloatProperty::Pitch, pitch)?;
        state.pitch = pitch;
        Ok(())
    }

    /// Returns whether the source repeats its queue instead of finishing.
    pub fn is_looping(&self) -> bool {
        self.state.lock().unwrap().looping
    }

    /// Sets whether the source should repeat its queue. A looping source
    /// never reports itself as finished.
    pub fn set_looping(&self, looping: bool) -> Result<(), SoundError> {
        let mut state = self.checked_state()?;
        state
            .context
            .state()
            .backend_mut()
            .set_source_bool(state.handle, BoolProperty::Looping, looping)?;
        state.looping = looping;
        Ok(())
    }

    /// Returns whether the source position is relative to the listener.
    pub fn is_position_relative(&self) -> bool {
        self.state.lock().unwrap().position_relative
    }

    /// Sets whether the source position is relative to the listener.
    pub fn set_position_relative(&self, relative: bool) -> Result<(), SoundError> {
        let mut state = self.checked_state()?;
        state
            .context
            .state()
            .backend_mut()
            .set_source_bool(state.handle, BoolProperty::PositionRelative, relative)?;
        state.position_relative = relative;
        Ok(())
    }

    /// Returns position of the source.
    pub fn position(&self) -> Vector3<f32> {
        self.state.lock().unwrap().position
    }

    /// Sets position of the source in 3D space.
    pub fn set_position(&self, position: Vector3<f32>) -> Result<(), SoundError> {
        let mut state = self.checked_state()?;
        state
            .context
            .state()
            .backend_mut()
            .set_source_vec3(state.handle, Vec3Property::Position, position)?;
        state.position = position;
        Ok(())
    }

    /// Returns velocity of the source.
    pub fn velocity(&self) -> Vector3<f32> {
        self.state.lock().unwrap().velocity
    }

    /// Sets velocity of the source in 3D space.
    pub fn set_velocity(&self, velocity: Vector3<f32>) -> Result<(), SoundError> {
        let mut state = self.checked_state()?;
        state
            .context
            .state()
            .backend_mut()
            .set_source_vec3(state.handle, Vec3Property::Velocity, velocity)?;
        state.velocity = velocity;
        Ok(())
    }

    /// Returns current playback state of the source, queried live.
    pub fn playback_state(&self) -> Result<PlaybackState, SoundError> {
        let state = self.checked_state()?;
        let result = state.context.state().backend().playback_state(state.handle)?;
        Ok(result)
    }

    /// The amount of queued buffers the source has already played, queried
    /// live.
    pub fn processed_buffers(&self) -> Result<usize, SoundError> {
        let state = self.checked_state()?;
        let result = state
            .context
            .state()
            .backend()
            .source_int(state.handle, IntProperty::BuffersProcessed)?;
        Ok(result)
    }

    /// The total amount of buffers the source has queued to play, queried
    /// live.
    pub fn queued_buffers(&self) -> Result<usize, SoundError> {
        let state = self.checked_state()?;
        let result = state
            .context
            .state()
            .backend()
            .source_int(state.handle, IntProperty::BuffersQueued)?;
        Ok(result)
    }

    /// Whether the source is finished playing all queued buffers. A looping
    /// source is never finished.
    pub fn finished_playing(&self) -> Result<bool, SoundError> {
        let state = self.checked_state()?;
        let context_state = state.context.state();
        let backend = context_state.backend();
        let processed = backend.source_int(state.handle, IntProperty::BuffersProcessed)?;
        let queued = backend.source_int(state.handle, IntProperty::BuffersQueued)?;
        Ok(processed >= queued && !state.looping)
    }

    /// Queues a group of sound buffers to be played by this source.
    pub fn queue_buffer(&self, buffer: &SoundBuffer) -> Result<(), SoundError> {
        let state = self.checked_state()?;
        state
            .context
            .state()
            .backend_mut()
            .queue_buffers(state.handle, buffer.handles())?;
        Ok(())
    }

    /// Removes all buffers from the source queue, used to fully reset it.
    pub fn dequeue_buffers(&self) -> Result<(), SoundError> {
        let state = self.checked_state()?;
        let mut context_state = state.context.state();
        let queued = context_state
            .backend()
            .source_int(state.handle, IntProperty::BuffersQueued)?;
        if queued == 0 {
            return Ok(());
        }
        context_state
            .backend_mut()
            .unqueue_buffers(state.handle, queued)?;
        Ok(())
    }

    /// Removes all processed buffers from the source queue.
    pub fn dequeue_processed_buffers(&self) -> Result<(), SoundError> {
        let state = self.checked_state()?;
        let mut context_state = state.context.state();
        let processed = context_state
            .backend()
            .source_int(state.handle, IntProperty::BuffersProcessed)?;
        if processed == 0 {
            return Ok(());
        }
        context_state
            .backend_mut()
            .unqueue_buffers(state.handle, processed)?;
        Ok(())
    }

    /// Starts playing the source.
    pub fn play(&self) -> Result<(), SoundError> {
        let state = self.checked_state()?;
        let result = state.context.state().backend_mut().play(state.handle)?;
        Ok(result)
    }

    /// Pauses playing the source.
    pub fn pause(&self) -> Result<(), SoundError> {
        let state = self.checked_state()?;
        let result = state.context.state().backend_mut().pause(state.handle)?;
        Ok(result)
    }

    /// Stops playing the source.
    pub fn stop(&self) -> Result<(), SoundError> {
        let state = self.checked_state()?;
        let result = state.context.state().backend_mut().stop(state.handle)?;
        Ok(result)
    }

    /// Rewinds the source to the start of its queue.
    pub fn rewind(&self) -> Result<(), SoundError> {
        let state = self.checked_state()?;
        let result = state.context.state().backend_mut().rewind(state.handle)?;
        Ok(result)
    }

    /// Stops the source if it is not already stopped, deletes the native
    /// handle and marks the source disposed. Idempotent; all subsequent
    /// backend-touching operations fail with `UseAfterDispose`.
    pub fn dispose(&self) -> Result<(), SoundError> {
        let mut state = self.state.lock().unwrap();
        if state.disposed {
            return Ok(());
        }
        let mut context_state = state.context.state();
        if context_state.backend().playback_state(state.handle)? != PlaybackState::Stopped {
            context_state.backend_mut().stop(state.handle)?;
        }
        context_state.backend_mut().delete_source(state.handle)?;
        drop(context_state);
        state.disposed = true;
        Ok(())
    }

    fn checked_state(&self) -> Result<std::sync::MutexGuard<'_, SourceState>, SoundError> {
        let state = self.state.lock().unwrap();
        if state.disposed {
            return Err(SoundError::UseAfterDispose);
        }
        Ok(state)
    }
}
