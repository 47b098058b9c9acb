//! Context module.
//!
//! # Overview
//!
//! [`AudioContext`] is the entry point of the library. It owns the injected
//! [`AudioBackend`] implementation and the single [`Listener`], and is
//! passed explicitly to everything that needs to reach the native backend
//! (source pools, sources, buffers). Create it once at startup, tear it
//! down once at shutdown.
//!
//! Backend errors encountered while mirroring property writes always
//! propagate to the caller; the context never swallows or merely logs them.

use crate::{
    backend::{software::SoftwareBackend, AudioBackend},
    listener::{Listener, ListenerState},
};
use std::sync::{Arc, Mutex, MutexGuard};

/// Main context for using any audio related code. See module docs.
#[derive(Clone, Debug)]
pub struct AudioContext {
    state: Arc<Mutex<State>>,
    listener: Arc<Mutex<ListenerState>>,
}

impl PartialEq for AudioContext {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

/// Internal state of the context.
#[derive(Debug)]
pub struct State {
    backend: Box<dyn AudioBackend>,
}

impl State {
    /// Returns shared reference to the backend.
    pub fn backend(&self) -> &dyn AudioBackend {
        &*self.backend
    }

    /// Returns mutable reference to the backend.
    pub fn backend_mut(&mut self) -> &mut dyn AudioBackend {
        &mut *self.backend
    }
}

impl AudioContext {
    /// Creates a new context over the given backend.
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State { backend })),
            listener: Arc::new(Mutex::new(ListenerState::default())),
        }
    }

    /// Creates a new context over a [`SoftwareBackend`]. Useful for tests
    /// and for running the full audio code path without an audio device.
    pub fn software() -> Self {
        Self::new(Box::new(SoftwareBackend::new()))
    }

    /// Returns internal state of the context.
    ///
    /// ## Deadlocks
    ///
    /// This method internally locks a mutex, so do not store the guard
    /// anywhere and call context methods while holding it.
    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Returns a handle to the single listener of this context. Every call
    /// returns a handle to the same listener; there is exactly one listener
    /// slot per context.
    pub fn listener(&self) -> Listener {
        Listener::new(self.clone(), self.listener.clone())
    }
}
