//! This module provides all needed types and methods to decode sound data
//! and upload it into native buffers.
//!
//! # Overview
//!
//! Decoded sound data is kept as a sequence of bounded-size sample chunks
//! ([`SoundBufferData`]), because native backends limit how much data a
//! single buffer can hold. A [`SoundBuffer`] is the native counterpart: a
//! group of backend buffer handles, one per chunk, that sources queue for
//! playback.

use crate::{
    context::AudioContext,
    decoder::{Decoder, MAX_CHUNK_LEN},
    error::SoundError,
};
use log::warn;
use std::{
    fs::File,
    io::{BufReader, Cursor, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

/// Data source enumeration. Provides unified way of selecting data source
/// for decoding. It can be either a file or memory block.
#[derive(Debug)]
pub enum DataSource {
    /// Data source is a file of any supported format.
    File {
        /// Path to file.
        path: PathBuf,

        /// Reader for reading from the file.
        file: BufReader<File>,
    },

    /// Data source is a memory block. Memory block must be in valid format
    /// (wav or vorbis/ogg). This variant can be used together with virtual
    /// file system.
    Memory(Cursor<Vec<u8>>),
}

impl DataSource {
    /// Tries to create new `File` data source from given path. May fail if
    /// file does not exist.
    pub fn from_file<P>(path: P) -> Result<Self, SoundError>
    where
        P: AsRef<Path>,
    {
        Ok(DataSource::File {
            path: path.as_ref().to_path_buf(),
            file: BufReader::new(File::open(path.as_ref())?),
        })
    }

    /// Creates new data source from given memory block. This function does
    /// not check if this is a valid source; validity will be checked on
    /// decoding.
    pub fn from_memory(data: Vec<u8>) -> Self {
        DataSource::Memory(Cursor::new(data))
    }

    /// Tries to get a path to external data source.
    pub fn path(&self) -> Option<&Path> {
        match self {
            DataSource::File { path, .. } => Some(path),
            DataSource::Memory(_) => None,
        }
    }
}

impl Read for DataSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, std::io::Error> {
        match self {
            DataSource::File { file, .. } => file.read(buf),
            DataSource::Memory(cursor) => cursor.read(buf),
        }
    }
}

impl Seek for DataSource {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, std::io::Error> {
        match self {
            DataSource::File { file, .. } => file.seek(pos),
            DataSource::Memory(cursor) => cursor.seek(pos),
        }
    }
}

/// Container format of an encoded sound stream.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FileFormat {
    /// Uncompressed PCM wave file.
    Wav,

    /// Vorbis stream in an Ogg container.
    Ogg,
}

/// Sample layout of decoded sound data, as understood by the backend.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SampleFormat {
    /// One channel, 8 bits per sample.
    Mono8,

    /// One channel, 16 bits per sample.
    Mono16,

    /// Two interleaved channels, 8 bits per sample.
    Stereo8,

    /// Two interleaved channels, 16 bits per sample.
    Stereo16,
}

impl SampleFormat {
    pub(crate) fn from_layout(channels: u16, bits_per_sample: u16) -> Result<Self, SoundError> {
        match (channels, bits_per_sample) {
            (1, 8) => Ok(Self::Mono8),
            (1, 16) => Ok(Self::Mono16),
            (2, 8) => Ok(Self::Stereo8),
            (2, 16) => Ok(Self::Stereo16),
            _ => Err(SoundError::UnsupportedFormat),
        }
    }

    /// Amount of channels in this format.
    pub fn channel_count(&self) -> usize {
        match self {
            Self::Mono8 | Self::Mono16 => 1,
            Self::Stereo8 | Self::Stereo16 => 2,
        }
    }
}

/// Decoded sound data that can be uploaded into native buffers. Immutable
/// once decoded.
#[derive(Debug)]
pub struct SoundBufferData {
    chunks: Vec<Vec<i16>>,
    format: SampleFormat,
    sample_rate: u32,
}

impl SoundBufferData {
    /// Creates sound data from already decoded chunks.
    pub fn new(chunks: Vec<Vec<i16>>, format: SampleFormat, sample_rate: u32) -> Self {
        Self {
            chunks,
            format,
            sample_rate,
        }
    }

    /// Decodes a stream of the given container format.
    pub fn decode(source: DataSource, format: FileFormat) -> Result<Self, SoundError> {
        let mut decoder = Decoder::new(source, format, MAX_CHUNK_LEN)?;
        Ok(Self {
            format: decoder.format(),
            sample_rate: decoder.sample_rate(),
            chunks: decoder.read_all()?,
        })
    }

    /// Extracts the sound data from an uncompressed wave stream.
    pub fn from_wav(source: DataSource) -> Result<Self, SoundError> {
        Self::decode(source, FileFormat::Wav)
    }

    /// Extracts the sound data from an ogg/vorbis stream.
    pub fn from_ogg(source: DataSource) -> Result<Self, SoundError> {
        Self::decode(source, FileFormat::Ogg)
    }

    /// Returns the decoded sample chunks.
    pub fn chunks(&self) -> &[Vec<i16>] {
        &self.chunks
    }

    /// Returns the sample layout of the chunks.
    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Returns the sample rate of the data.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// A group of native buffer handles. See module docs.
#[derive(Debug)]
pub struct SoundBuffer {
    context: AudioContext,
    handles: Vec<u32>,
    disposed: bool,
}

impl SoundBuffer {
    /// Generates a new group of `count` empty native buffers.
    pub fn new(context: &AudioContext, count: usize) -> Result<Self, SoundError> {
        let handles = context.state().backend_mut().generate_buffers(count)?;
        Ok(Self {
            context: context.clone(),
            handles,
            disposed: false,
        })
    }

    /// Generates a new group of native buffers, one per chunk of the given
    /// data, and fills them.
    pub fn from_data(context: &AudioContext, data: &SoundBufferData) -> Result<Self, SoundError> {
        let mut buffer = Self::new(context, data.chunks().len())?;
        buffer.fill(data)?;
        Ok(buffer)
    }

    /// Fills the buffers with new data, starting at the first buffer.
    ///
    /// # Panics
    ///
    /// Panics if the data has more chunks than this group has buffers.
    pub fn fill(&mut self, data: &SoundBufferData) -> Result<(), SoundError> {
        self.fill_at(0, data)
    }

    /// Fills the buffers with new data, starting at the buffer at `index`
    /// and wrapping around past the end of the group.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds or the data has more chunks than
    /// this group has buffers.
    pub fn fill_at(&mut self, index: usize, data: &SoundBufferData) -> Result<(), SoundError> {
        if self.disposed {
            return Err(SoundError::UseAfterDispose);
        }
        assert!(index < self.handles.len());
        assert!(
            data.chunks().len() <= self.handles.len(),
            "data does not fit in the buffer"
        );

        let mut state = self.context.state();
        for (i, chunk) in data.chunks().iter().enumerate() {
            let handle = self.handles[(index + i) % self.handles.len()];
            state
                .backend_mut()
                .fill_buffer(handle, data.format(), chunk, data.sample_rate())?;
        }
        Ok(())
    }

    /// Returns the native buffer handles of the group.
    pub fn handles(&self) -> &[u32] {
        &self.handles
    }

    /// Returns the native handle of the buffer at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn handle(&self, index: usize) -> u32 {
        self.handles[index]
    }

    /// Amount of buffers in the group.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns true if the group contains no buffers.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Deletes the native buffers. Idempotent; all subsequent fills fail
    /// with `UseAfterDispose`.
    pub fn dispose(&mut self) -> Result<(), SoundError> {
        if self.disposed {
            return Ok(());
        }
        self.context
            .state()
            .backend_mut()
            .delete_buffers(&self.handles)?;
        self.disposed = true;
        Ok(())
    }

    /// Disposal state of the group.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for SoundBuffer {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            warn!("failed to delete sound buffers on drop: {}", err);
        }
    }
}
