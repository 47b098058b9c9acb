//! Contains all possible errors that can occur in the library.

use lewton::VorbisError;
use std::fmt::{Display, Error, Formatter};

/// Decoder specific error.
#[derive(Debug)]
pub enum DecoderError {
    /// Ogg/vorbis (lewton) specific error.
    Ogg(VorbisError),
}

/// Native backend error kind, translated from the backend's error codes.
#[derive(Debug)]
pub enum BackendError {
    /// An enum-like parameter had a value the backend does not know.
    InvalidEnum(String),

    /// A handle did not refer to a live native object.
    InvalidName(String),

    /// The requested operation is not valid in the current backend state.
    InvalidOperation(String),

    /// A parameter value was out of range.
    InvalidValue(String),

    /// The backend ran out of memory.
    OutOfMemory(String),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            Self::InvalidEnum(msg) => write!(f, "invalid enum: {}", msg),
            Self::InvalidName(msg) => write!(f, "invalid name: {}", msg),
            Self::InvalidOperation(msg) => write!(f, "invalid operation: {}", msg),
            Self::InvalidValue(msg) => write!(f, "invalid value: {}", msg),
            Self::OutOfMemory(msg) => write!(f, "out of memory: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

/// Generic error enumeration for each error in this library.
#[derive(Debug)]
pub enum SoundError {
    /// Generic input error.
    Io(std::io::Error),

    /// A source pool was constructed with zero capacity.
    InvalidCapacity,

    /// Strict acquire was requested but every source is in use and the pool
    /// has reached its capacity. Recoverable: retry after reclaiming.
    PoolExhausted,

    /// Attempt to reclaim a source that does not belong to the pool.
    ForeignSource,

    /// Attempt to reclaim a source that has been disposed.
    DisposedSource,

    /// Attempt to reclaim a source that has not finished playing yet.
    StillPlaying,

    /// Any operation on a pool after it was disposed.
    PoolDisposed,

    /// Any backend-touching operation on a source after it was disposed.
    UseAfterDispose,

    /// Unsupported or malformed format of a sound file.
    UnsupportedFormat,

    /// Decoder specific error, can occur in the decoder by any reason
    /// (invalid format, insufficient data, etc.). Exact reason stored in
    /// inner value.
    DecoderError(DecoderError),

    /// Error reported by the native backend.
    Backend(BackendError),
}

impl From<std::io::Error> for SoundError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<VorbisError> for SoundError {
    fn from(ve: VorbisError) -> Self {
        Self::DecoderError(DecoderError::Ogg(ve))
    }
}

impl From<BackendError> for SoundError {
    fn from(be: BackendError) -> Self {
        Self::Backend(be)
    }
}

impl Display for SoundError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            Self::Io(io) => write!(f, "io error: {}", io),
            Self::InvalidCapacity => {
                write!(f, "cannot create a source pool with zero capacity")
            }
            Self::PoolExhausted => {
                write!(f, "no source available and pool has reached capacity")
            }
            Self::ForeignSource => {
                write!(f, "cannot reclaim a source that is not part of this source pool")
            }
            Self::DisposedSource => write!(f, "cannot reclaim a disposed source"),
            Self::StillPlaying => {
                write!(f, "cannot reclaim a source that has not finished playing")
            }
            Self::PoolDisposed => write!(f, "cannot use a source pool after disposing it"),
            Self::UseAfterDispose => write!(f, "cannot use a source after disposing it"),
            Self::UnsupportedFormat => write!(f, "unsupported format of sound file"),
            Self::DecoderError(de) => write!(f, "internal decoder error: {:?}", de),
            Self::Backend(be) => write!(f, "backend error: {}", be),
        }
    }
}

impl std::error::Error for SoundError {}
