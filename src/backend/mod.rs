//! Native audio backend boundary.
//!
//! # Overview
//!
//! The binding does not talk to a native audio library directly. Every
//! primitive operation (handle generation, property writes, playback state
//! queries, buffer queuing) goes through the [`AudioBackend`] trait, and an
//! implementation of it is injected into [`AudioContext`](crate::context::AudioContext)
//! at construction time. This is what makes the source pool and the sources
//! testable without an audio device: tests (and headless applications) use
//! the bundled [`SoftwareBackend`], while a real backend implements the same
//! trait over the native API of choice.

use crate::{buffer::SampleFormat, error::BackendError};
use nalgebra::Vector3;
use std::any::Any;
use std::fmt::Debug;

pub mod software;

pub use software::SoftwareBackend;

/// Playback state of a native source.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PlaybackState {
    /// Source was created or rewound and has not played yet. This is the
    /// default state of all sources.
    Initial,

    /// Source is playing.
    Playing,

    /// Source is paused and can be resumed.
    Paused,

    /// Source is stopped.
    Stopped,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::Initial
    }
}

/// Float-valued source property kind.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FloatProperty {
    /// Playback volume.
    Gain,

    /// Playback speed multiplier.
    Pitch,
}

/// Boolean-valued source property kind.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BoolProperty {
    /// Whether the source restarts playback after the last queued buffer.
    Looping,

    /// Whether the source position is relative to the listener.
    PositionRelative,
}

/// Vector-valued source property kind.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Vec3Property {
    /// Position of the source in 3D space.
    Position,

    /// Velocity of the source in 3D space.
    Velocity,
}

/// Integer-valued source property kind. These are playback-progress counters
/// maintained by the backend.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IntProperty {
    /// Amount of queued buffers the source has fully played.
    BuffersProcessed,

    /// Total amount of buffers currently queued on the source.
    BuffersQueued,
}

/// Primitive operations of a native audio backend.
///
/// All handles are opaque integers owned by the backend. Implementations
/// must translate native error codes into [`BackendError`] kinds; errors
/// always propagate to the caller.
pub trait AudioBackend: Debug {
    /// Generates one new source handle.
    fn generate_source(&mut self) -> Result<u32, BackendError>;

    /// Deletes a source handle.
    fn delete_source(&mut self, source: u32) -> Result<(), BackendError>;

    /// Returns current playback state of a source.
    fn playback_state(&self, source: u32) -> Result<PlaybackState, BackendError>;

    /// Returns a playback-progress counter of a source.
    fn source_int(&self, source: u32, property: IntProperty) -> Result<usize, BackendError>;

    /// Returns a float-valued property of a source.
    fn source_f32(&self, source: u32, property: FloatProperty) -> Result<f32, BackendError>;

    /// Returns a boolean-valued property of a source.
    fn source_bool(&self, source: u32, property: BoolProperty) -> Result<bool, BackendError>;

    /// Returns a vector-valued property of a source.
    fn source_vec3(&self, source: u32, property: Vec3Property)
        -> Result<Vector3<f32>, BackendError>;

    /// Sets a float-valued property of a source.
    fn set_source_f32(
        &mut self,
        source: u32,
        property: FloatProperty,
        value: f32,
    ) -> Result<(), BackendError>;

    /// Sets a boolean-valued property of a source.
    fn set_source_bool(
        &mut self,
        source: u32,
        property: BoolProperty,
        value: bool,
    ) -> Result<(), BackendError>;

    /// Sets a vector-valued property of a source.
    fn set_source_vec3(
        &mut self,
        source: u32,
        property: Vec3Property,
        value: Vector3<f32>,
    ) -> Result<(), BackendError>;

    /// Appends buffers to the playback queue of a source.
    fn queue_buffers(&mut self, source: u32, buffers: &[u32]) -> Result<(), BackendError>;

    /// Removes up to `count` buffers from the front of the playback queue of
    /// a source and returns their handles.
    fn unqueue_buffers(&mut self, source: u32, count: usize) -> Result<Vec<u32>, BackendError>;

    /// Starts playback.
    fn play(&mut self, source: u32) -> Result<(), BackendError>;

    /// Pauses playback.
    fn pause(&mut self, source: u32) -> Result<(), BackendError>;

    /// Stops playback.
    fn stop(&mut self, source: u32) -> Result<(), BackendError>;

    /// Rewinds the source to its initial state.
    fn rewind(&mut self, source: u32) -> Result<(), BackendError>;

    /// Generates `count` new buffer handles.
    fn generate_buffers(&mut self, count: usize) -> Result<Vec<u32>, BackendError>;

    /// Deletes buffer handles.
    fn delete_buffers(&mut self, buffers: &[u32]) -> Result<(), BackendError>;

    /// Uploads sample data into a buffer.
    fn fill_buffer(
        &mut self,
        buffer: u32,
        format: SampleFormat,
        samples: &[i16],
        sample_rate: u32,
    ) -> Result<(), BackendError>;

    /// Sets the listener position.
    fn set_listener_position(&mut self, value: Vector3<f32>) -> Result<(), BackendError>;

    /// Sets the listener velocity.
    fn set_listener_velocity(&mut self, value: Vector3<f32>) -> Result<(), BackendError>;

    /// Sets the listener gain.
    fn set_listener_gain(&mut self, value: f32) -> Result<(), BackendError>;

    /// Sets the listener orientation from its "at" and "up" vectors.
    fn set_listener_orientation(
        &mut self,
        at: Vector3<f32>,
        up: Vector3<f32>,
    ) -> Result<(), BackendError>;

    /// Returns the listener position.
    fn listener_position(&self) -> Result<Vector3<f32>, BackendError>;

    /// Returns the listener velocity.
    fn listener_velocity(&self) -> Result<Vector3<f32>, BackendError>;

    /// Returns the listener gain.
    fn listener_gain(&self) -> Result<f32, BackendError>;

    /// Returns the listener orientation as its "at" and "up" vectors.
    fn listener_orientation(&self) -> Result<(Vector3<f32>, Vector3<f32>), BackendError>;

    /// Returns `self` as `&dyn Any`, used for downcasting to a concrete
    /// backend type.
    fn as_any(&self) -> &dyn Any;

    /// Returns `self` as `&mut dyn Any`, used for downcasting to a concrete
    /// backend type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
