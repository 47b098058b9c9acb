//! Software backend.
//!
//! # Overview
//!
//! [`SoftwareBackend`] keeps the entire native object model (source and
//! buffer handle tables, playback queues, listener slot) in plain process
//! memory and produces no audio output. It exists for two reasons: it is the
//! test double for everything built on top of the backend boundary, and it
//! lets applications run their full audio code path on machines without an
//! audio device.
//!
//! Playback does not advance on its own. A queued buffer becomes
//! "processed" only through [`SoftwareBackend::finish_queued`] (or a stop),
//! which keeps misuse detection in the source pool fully deterministic.

use crate::{
    backend::{
        AudioBackend, BoolProperty, FloatProperty, IntProperty, PlaybackState, Vec3Property,
    },
    buffer::SampleFormat,
    error::BackendError,
};
use nalgebra::Vector3;
use std::any::Any;
use std::collections::{HashMap, VecDeque};

#[derive(Debug)]
struct SourceData {
    state: PlaybackState,
    queued: VecDeque<u32>,
    processed: usize,
    rewinds: usize,
    gain: f32,
    pitch: f32,
    looping: bool,
    position_relative: bool,
    position: Vector3<f32>,
    velocity: Vector3<f32>,
}

impl Default for SourceData {
    fn default() -> Self {
        Self {
            state: PlaybackState::Initial,
            queued: VecDeque::new(),
            processed: 0,
            rewinds: 0,
            gain: 1.0,
            pitch: 1.0,
            looping: false,
            position_relative: false,
            position: Vector3::new(0.0, 0.0, 0.0),
            velocity: Vector3::new(0.0, 0.0, 0.0),
        }
    }
}

#[derive(Debug, Default)]
struct BufferData {
    format: Option<SampleFormat>,
    sample_rate: u32,
    samples: Vec<i16>,
}

#[derive(Debug)]
struct ListenerData {
    position: Vector3<f32>,
    velocity: Vector3<f32>,
    gain: f32,
    at: Vector3<f32>,
    up: Vector3<f32>,
}

impl Default for ListenerData {
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

/// In-process backend without audio output. See module docs.
#[derive(Debug, Default)]
pub struct SoftwareBackend {
    next_handle: u32,
    sources: HashMap<u32, SourceData>,
    buffers: HashMap<u32, BufferData>,
    listener: ListenerData,
    generated_sources: usize,
    generated_buffers: usize,
}

impl SoftwareBackend {
    /// Creates a new backend with empty handle tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total amount of source handles generated over the backend lifetime,
    /// including deleted ones.
    pub fn generated_source_count(&self) -> usize {
        self.generated_sources
    }

    /// Total amount of buffer handles generated over the backend lifetime,
    /// including deleted ones.
    pub fn generated_buffer_count(&self) -> usize {
        self.generated_buffers
    }

    /// Amount of currently live source handles.
    pub fn live_source_count(&self) -> usize {
        self.sources.len()
    }

    /// Amount of currently live buffer handles.
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Amount of rewinds performed on the given source.
    pub fn rewind_count(&self, source: u32) -> usize {
        self.sources.get(&source).map_or(0, |data| data.rewinds)
    }

    /// Last uploaded contents of the given buffer, if it is live and filled.
    pub fn buffer_contents(&self, buffer: u32) -> Option<(SampleFormat, u32, &[i16])> {
        let data = self.buffers.get(&buffer)?;
        data.format
            .map(|format| (format, data.sample_rate, data.samples.as_slice()))
    }

    /// Marks every queued buffer of the source as processed and stops it,
    /// simulating playback running to completion.
    pub fn finish_queued(&mut self, source: u32) -> Result<(), BackendError> {
        let data = source_data_mut(&mut self.sources, source)?;
        data.processed = data.queued.len();
        data.state = PlaybackState::Stopped;
        Ok(())
    }
}

fn source_data<'a>(
    sources: &'a HashMap<u32, SourceData>,
    source: u32,
) -> Result<&'a SourceData, BackendError> {
    sources
        .get(&source)
        .ok_or_else(|| BackendError::InvalidName(format!("no such source: {}", source)))
}

fn source_data_mut<'a>(
    sources: &'a mut HashMap<u32, SourceData>,
    source: u32,
) -> Result<&'a mut SourceData, BackendError> {
    sources
        .get_mut(&source)
        .ok_or_else(|| BackendError::InvalidName(format!("no such source: {}", source)))
}

impl AudioBackend for SoftwareBackend {
    fn generate_source(&mut self) -> Result<u32, BackendError> {
        self.next_handle += 1;
        self.sources.insert(self.next_handle, SourceData::default());
        self.generated_sources += 1;
        Ok(self.next_handle)
    }

    fn delete_source(&mut self, source: u32) -> Result<(), BackendError> {
        self.sources
            .remove(&source)
            .map(|_| ())
            .ok_or_else(|| BackendError::InvalidName(format!("no such source: {}", source)))
    }

    fn playback_state(&self, source: u32) -> Result<PlaybackState, BackendError> {
        Ok(source_data(&self.sources, source)?.state)
    }

    fn source_int(&self, source: u32, property: IntProperty) -> Result<usize, BackendError> {
        let data = source_data(&self.sources, source)?;
        Ok(match property {
            IntProperty::BuffersProcessed => data.processed,
            IntProperty::BuffersQueued => data.queued.len(),
        })
    }

    fn source_f32(&self, source: u32, property: FloatProperty) -> Result<f32, BackendError> {
        let data = source_data(&self.sources, source)?;
        Ok(match property {
            FloatProperty::Gain => data.gain,
            FloatProperty::Pitch => data.pitch,
        })
    }

    fn source_bool(&self, source: u32, property: BoolProperty) -> Result<bool, BackendError> {
        let data = source_data(&self.sources, source)?;
        Ok(match property {
            BoolProperty::Looping => data.looping,
            BoolProperty::PositionRelative => data.position_relative,
        })
    }

    fn source_vec3(
        &self,
        source: u32,
        property: Vec3Property,
    ) -> Result<Vector3<f32>, BackendError> {
        let data = source_data(&self.sources, source)?;
        Ok(match property {
            Vec3Property::Position => data.position,
            Vec3Property::Velocity => data.velocity,
        })
    }

    fn set_source_f32(
        &mut self,
        source: u32,
        property: FloatProperty,
        value: f32,
    ) -> Result<(), BackendError> {
        let data = source_data_mut(&mut self.sources, source)?;
        match property {
            FloatProperty::Gain => data.gain = value,
            FloatProperty::Pitch => data.pitch = value,
        }
        Ok(())
    }

    fn set_source_bool(
        &mut self,
        source: u32,
        property: BoolProperty,
        value: bool,
    ) -> Result<(), BackendError> {
        let data = source_data_mut(&mut self.sources, source)?;
        match property {
            BoolProperty::Looping => data.looping = value,
            BoolProperty::PositionRelative => data.position_relative = value,
        }
        Ok(())
    }

    fn set_source_vec3(
        &mut self,
        source: u32,
        property: Vec3Property,
        value: Vector3<f32>,
    ) -> Result<(), BackendError> {
        let data = source_data_mut(&mut self.sources, source)?;
        match property {
            Vec3Property::Position => data.position = value,
            Vec3Property::Velocity => data.velocity = value,
        }
        Ok(())
    }

    fn queue_buffers(&mut self, source: u32, buffers: &[u32]) -> Result<(), BackendError> {
        for buffer in buffers {
            if !self.buffers.contains_key(buffer) {
                return Err(BackendError::InvalidName(format!(
                    "no such buffer: {}",
                    buffer
                )));
            }
        }
        let data = source_data_mut(&mut self.sources, source)?;
        data.queued.extend(buffers.iter().copied());
        Ok(())
    }

    fn unqueue_buffers(&mut self, source: u32, count: usize) -> Result<Vec<u32>, BackendError> {
        let data = source_data_mut(&mut self.sources, source)?;
        if count > data.queued.len() {
            return Err(BackendError::InvalidValue(format!(
                "cannot unqueue {} buffers, only {} queued",
                count,
                data.queued.len()
            )));
        }
        let removed = data.queued.drain(..count).collect();
        data.processed = data.processed.saturating_sub(count);
        Ok(removed)
    }

    fn play(&mut self, source: u32) -> Result<(), BackendError> {
        source_data_mut(&mut self.sources, source)?.state = PlaybackState::Playing;
        Ok(())
    }

    fn pause(&mut self, source: u32) -> Result<(), BackendError> {
        source_data_mut(&mut self.sources, source)?.state = PlaybackState::Paused;
        Ok(())
    }

    fn stop(&mut self, source: u32) -> Result<(), BackendError> {
        let data = source_data_mut(&mut self.sources, source)?;
        data.state = PlaybackState::Stopped;
        // A stopped source has played through its whole queue as far as the
        // queue bookkeeping is concerned.
        data.processed = data.queued.len();
        Ok(())
    }

    fn rewind(&mut self, source: u32) -> Result<(), BackendError> {
        let data = source_data_mut(&mut self.sources, source)?;
        data.state = PlaybackState::Initial;
        data.processed = 0;
        data.rewinds += 1;
        Ok(())
    }

    fn generate_buffers(&mut self, count: usize) -> Result<Vec<u32>, BackendError> {
        let mut handles = Vec::with_capacity(count);
        for _ in 0..count {
            self.next_handle += 1;
            self.buffers.insert(self.next_handle, BufferData::default());
            handles.push(self.next_handle);
        }
        self.generated_buffers += count;
        Ok(handles)
    }

    fn delete_buffers(&mut self, buffers: &[u32]) -> Result<(), BackendError> {
        for buffer in buffers {
            if !self.buffers.contains_key(buffer) {
                return Err(BackendError::InvalidName(format!(
                    "no such buffer: {}",
                    buffer
                )));
            }
        }
        for buffer in buffers {
            self.buffers.remove(buffer);
        }
        Ok(())
    }

    fn fill_buffer(
        &mut self,
        buffer: u32,
        format: SampleFormat,
        samples: &[i16],
        sample_rate: u32,
    ) -> Result<(), BackendError> {
        let data = self
            .buffers
            .get_mut(&buffer)
            .ok_or_else(|| BackendError::InvalidName(format!("no such buffer: {}", buffer)))?;
        data.format = Some(format);
        data.sample_rate = sample_rate;
        data.samples = samples.to_vec();
        Ok(())
    }

    fn set_listener_position(&mut self, value: Vector3<f32>) -> Result<(), BackendError> {
        self.listener.position = value;
        Ok(())
    }

    fn set_listener_velocity(&mut self, value: Vector3<f32>) -> Result<(), BackendError> {
        self.listener.velocity = value;
        Ok(())
    }

    fn set_listener_gain(&mut self, value: f32) -> Result<(), BackendError> {
        self.listener.gain = value;
        Ok(())
    }

    fn set_listener_orientation(
        &mut self,
        at: Vector3<f32>,
        up: Vector3<f32>,
    ) -> Result<(), BackendError> {
        self.listener.at = at;
        self.listener.up = up;
        Ok(())
    }

    fn listener_position(&self) -> Result<Vector3<f32>, BackendError> {
        Ok(self.listener.position)
    }

    fn listener_velocity(&self) -> Result<Vector3<f32>, BackendError> {
        Ok(self.listener.velocity)
    }

    fn listener_gain(&self) -> Result<f32, BackendError> {
        Ok(self.listener.gain)
    }

    fn listener_orientation(&self) -> Result<(Vector3<f32>, Vector3<f32>), BackendError> {
        Ok((self.listener.at, self.listener.up))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
