//! Thin object-oriented binding over a native 3D audio API.
//!
//! ## Features
//!
//! - Pooled playback sources with a hard ceiling on live native handles.
//! - WAV and OGG/Vorbis decoding into upload-ready sample chunks.
//! - 3D sources and a single spatial listener.
//! - Pluggable backend: any type implementing [`backend::AudioBackend`] can
//!   drive the binding; a software backend is bundled for tests and
//!   headless use.
//!
//! ## Examples
//!
//! Here is an example of how to play a decoded sound through a pooled
//! source:
//!
//! ```no_run
//! use chorus_sound::{
//!     buffer::{DataSource, FileFormat, SoundBuffer, SoundBufferData},
//!     context::AudioContext,
//!     pool::SourcePool,
//! };
//!
//! fn play() -> Result<(), chorus_sound::error::SoundError> {
//!     let context = AudioContext::software();
//!
//!     let data = SoundBufferData::decode(
//!         DataSource::from_file("sound.wav")?,
//!         FileFormat::Wav,
//!     )?;
//!     let buffer = SoundBuffer::from_data(&context, &data)?;
//!
//!     let mut pool = SourcePool::new(context, 8)?;
//!     if let Some(source) = pool.try_acquire()? {
//!         source.queue_buffer(&buffer)?;
//!         source.play()?;
//!         // ... later, once playback finished:
//!         pool.reclaim(&source)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The pool never allocates more than its capacity of native handles;
//! acquire reuses reclaimed sources before generating new ones.

#![warn(missing_docs)]

pub mod backend;
pub mod buffer;
pub mod context;
pub mod decoder;
pub mod error;
pub mod listener;
pub mod pool;
pub mod source;

// Reexport because vector types are part of the public API.
pub use nalgebra as algebra;
