//! Listener module.
//!
//! # Overview
//!
//! The native backend has a single listener slot which defines the point of
//! view for spatial playback. [`Listener`] is a handle to that slot: each
//! [`AudioContext`](crate::context::AudioContext) owns exactly one listener
//! state, and every [`AudioContext::listener`](crate::context::AudioContext::listener)
//! call returns a handle to it. Property writes go to the backend
//! immediately; there is no deferred synchronization step.

use crate::{context::AudioContext, error::SoundError};
use nalgebra::Vector3;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub(crate) struct ListenerState {
    position: Vector3<f32>,
    velocity: Vector3<f32>,
    gain: f32,
    at: Vector3<f32>,
    up: Vector3<f32>,
}

impl Default for ListenerState {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            velocity: Vector3::new(0.0, 0.0, 0.0),
            gain: 1.0,
            at: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::new(0.0, 1.0, 0.0),
        }
    }
}

/// Handle to the single listener of a context. See module docs.
#[derive(Clone, Debug)]
pub struct Listener {
    context: AudioContext,
    state: Arc<Mutex<ListenerState>>,
}

impl Listener {
    pub(crate) fn new(context: AudioContext, state: Arc<Mutex<ListenerState>>) -> Self {
        Self { context, state }
    }

    /// Returns position of the listener.
    pub fn position(&self) -> Vector3<f32> {
        self.state.lock().unwrap().position
    }

    /// Sets position of the listener in world space.
    pub fn set_position(&self, position: Vector3<f32>) -> Result<(), SoundError> {
        self.context
            .state()
            .backend_mut()
            .set_listener_position(position)?;
        self.state.lock().unwrap().position = position;
        Ok(())
    }

    /// Returns velocity of the listener.
    pub fn velocity(&self) -> Vector3<f32> {
        self.state.lock().unwrap().velocity
    }

    /// Sets velocity of the listener. Velocity is used by the backend to
    /// simulate the Doppler effect; it does not move the listener.
    pub fn set_velocity(&self, velocity: Vector3<f32>) -> Result<(), SoundError> {
        self.context
            .state()
            .backend_mut()
            .set_listener_velocity(velocity)?;
        self.state.lock().unwrap().velocity = velocity;
        Ok(())
    }

    /// Returns gain of the listener.
    pub fn gain(&self) -> f32 {
        self.state.lock().unwrap().gain
    }

    /// Sets gain (master volume) of the listener.
    pub fn set_gain(&self, gain: f32) -> Result<(), SoundError> {
        self.context.state().backend_mut().set_listener_gain(gain)?;
        self.state.lock().unwrap().gain = gain;
        Ok(())
    }

    /// Returns the "at" (look) component of the listener orientation.
    pub fn at(&self) -> Vector3<f32> {
        self.state.lock().unwrap().at
    }

    /// Returns the "up" component of the listener orientation.
    pub fn up(&self) -> Vector3<f32> {
        self.state.lock().unwrap().up
    }

    /// Sets orientation of the listener from its look and up vectors. Both
    /// components form a single orientation value in the backend, so they
    /// are always written together.
    pub fn set_orientation(
        &self,
        at: Vector3<f32>,
        up: Vector3<f32>,
    ) -> Result<(), SoundError> {
        self.context
            .state()
            .backend_mut()
            .set_listener_orientation(at, up)?;
        let mut state = self.state.lock().unwrap();
        state.at = at;
        state.up = up;
        Ok(())
    }
}
