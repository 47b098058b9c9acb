//! Ogg/vorbis decoder built on top of lewton.

use crate::{
    buffer::{DataSource, SampleFormat},
    error::SoundError,
};
use lewton::{inside_ogg::OggStreamReader, samples::InterleavedSamples};
use std::fmt::{Debug, Formatter};
use std::vec;

fn sample_to_i16(sample: f32) -> i16 {
    // Decoded samples are nominally in [-1, 1]; the cast saturates the rare
    // out-of-range value instead of wrapping.
    (32767.0 * sample) as i16
}

/// Ogg/vorbis decoder. Produces chunks whose length is the largest multiple
/// of the channel count not exceeding `max_chunk_len`, so a chunk never
/// splits a multi-channel frame.
pub struct OggDecoder {
    reader: Box<OggStreamReader<DataSource>>,
    pending: vec::IntoIter<f32>,
    format: SampleFormat,
    sample_rate: u32,
    chunk_len: usize,
    ended: bool,
}

impl Debug for OggDecoder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "OggDecoder")
    }
}

impl OggDecoder {
    /// Creates a decoder over the given stream. Fails with
    /// `UnsupportedFormat` if the stream is not a vorbis stream in an ogg
    /// container, or has more than two channels.
    ///
    /// # Panics
    ///
    /// Panics if `max_chunk_len` cannot hold a single frame.
    pub fn new(source: DataSource, max_chunk_len: usize) -> Result<Self, SoundError> {
        let reader =
            OggStreamReader::new(source).map_err(|_| SoundError::UnsupportedFormat)?;

        let channel_count = reader.ident_hdr.audio_channels as usize;
        let format = match channel_count {
            1 => SampleFormat::Mono16,
            2 => SampleFormat::Stereo16,
            _ => return Err(SoundError::UnsupportedFormat),
        };

        let chunk_len = chunk_len_for(max_chunk_len, channel_count);
        assert!(chunk_len > 0);

        Ok(Self {
            sample_rate: reader.ident_hdr.audio_sample_rate,
            reader: Box::new(reader),
            pending: Vec::new().into_iter(),
            format,
            chunk_len,
            ended: false,
        })
    }

    /// Returns the sample layout of the decoded data.
    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Returns the sample rate of the decoded data.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Reads the next chunk, or `None` once the stream is exhausted.
    pub fn read_chunk(&mut self) -> Result<Option<Vec<i16>>, SoundError> {
        let mut chunk = Vec::with_capacity(self.chunk_len);
        while chunk.len() < self.chunk_len {
            match self.next_sample()? {
                Some(sample) => chunk.push(sample_to_i16(sample)),
                None => break,
            }
        }

        if chunk.is_empty() {
            Ok(None)
        } else {
            Ok(Some(chunk))
        }
    }

    /// Reads all remaining chunks.
    pub fn read_all(&mut self) -> Result<Vec<Vec<i16>>, SoundError> {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.read_chunk()? {
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    fn next_sample(&mut self) -> Result<Option<f32>, SoundError> {
        loop {
            if let Some(sample) = self.pending.next() {
                return Ok(Some(sample));
            }
            if self.ended {
                return Ok(None);
            }
            match self
                .reader
                .read_dec_packet_generic::<InterleavedSamples<f32>>()?
            {
                Some(packet) => self.pending = packet.samples.into_iter(),
                None => self.ended = true,
            }
        }
    }
}

fn chunk_len_for(max_chunk_len: usize, channel_count: usize) -> usize {
    max_chunk_len - max_chunk_len % channel_count
}
