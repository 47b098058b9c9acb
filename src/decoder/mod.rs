//! Decoders for supported sound containers.
//!
//! # Overview
//!
//! Both decoders transform an encoded byte stream into chunks of signed
//! 16-bit samples, bounded by a maximum chunk length, plus format metadata.
//! Chunks can be pulled one at a time ([`Decoder::read_chunk`]) or all at
//! once ([`Decoder::read_all`]); bulk reading is defined as repeated
//! incremental reading, so both produce identical chunking.

use crate::{
    buffer::{DataSource, FileFormat, SampleFormat},
    error::SoundError,
};

pub mod vorbis;
pub mod wav;

use vorbis::OggDecoder;
use wav::WavDecoder;

/// Default maximum chunk length, in 16-bit samples. Matches common native
/// buffer upload limits.
pub const MAX_CHUNK_LEN: usize = 16384;

/// A decoder for any supported container format.
#[derive(Debug)]
pub enum Decoder {
    /// Uncompressed PCM wave decoder.
    Wav(WavDecoder),

    /// Ogg/vorbis decoder.
    Ogg(OggDecoder),
}

impl Decoder {
    /// Creates a decoder for the given container format.
    pub fn new(
        source: DataSource,
        format: FileFormat,
        max_chunk_len: usize,
    ) -> Result<Self, SoundError> {
        match format {
            FileFormat::Wav => Ok(Decoder::Wav(WavDecoder::new(source, max_chunk_len)?)),
            FileFormat::Ogg => Ok(Decoder::Ogg(OggDecoder::new(source, max_chunk_len)?)),
        }
    }

    /// Reads the next chunk, or `None` once the stream is exhausted.
    pub fn read_chunk(&mut self) -> Result<Option<Vec<i16>>, SoundError> {
        match self {
            Decoder::Wav(wav) => wav.read_chunk(),
            Decoder::Ogg(ogg) => ogg.read_chunk(),
        }
    }

    /// Reads all remaining chunks.
    pub fn read_all(&mut self) -> Result<Vec<Vec<i16>>, SoundError> {
        match self {
            Decoder::Wav(wav) => wav.read_all(),
            Decoder::Ogg(ogg) => ogg.read_all(),
        }
    }

    /// Returns the sample layout of the decoded data.
    pub fn format(&self) -> SampleFormat {
        match self {
            Decoder::Wav(wav) => wav.format(),
            Decoder::Ogg(ogg) => ogg.format(),
        }
    }

    /// Returns the sample rate of the decoded data.
    pub fn sample_rate(&self) -> u32 {
        match self {
            Decoder::Wav(wav) => wav.sample_rate(),
            Decoder::Ogg(ogg) => ogg.sample_rate(),
        }
    }
}
