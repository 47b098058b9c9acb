//! Wav decoder for uncompressed PCM data.

use crate::{
    buffer::{DataSource, SampleFormat},
    error::SoundError,
};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{ErrorKind, Read, Seek, SeekFrom};

// The fmt chunk payload of a plain PCM file. Writers are allowed to append
// extra bytes to it; they carry nothing we need.
const FMT_CHUNK_MIN_SIZE: u32 = 16;

struct WavHeader {
    num_channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    data_size: u32,
}

/// Wav decoder. Produces chunks of at most `max_chunk_len` 16-bit samples;
/// the data chunk bytes are taken as little-endian 16-bit values for both
/// the 8-bit and the 16-bit layouts, matching what the backend expects to
/// receive for upload.
#[derive(Debug)]
pub struct WavDecoder {
    source: DataSource,
    format: SampleFormat,
    sample_rate: u32,
    max_chunk_len: usize,
    samples_left: usize,
}

impl WavDecoder {
    /// Creates a decoder over the given stream. Fails with
    /// `UnsupportedFormat` if the stream is not an uncompressed mono or
    /// stereo wave file at 8 or 16 bits per sample.
    ///
    /// # Panics
    ///
    /// Panics if `max_chunk_len` is zero.
    pub fn new(mut source: DataSource, max_chunk_len: usize) -> Result<Self, SoundError> {
        assert!(max_chunk_len > 0);

        let header = read_header(&mut source)?;
        let format = SampleFormat::from_layout(header.num_channels, header.bits_per_sample)?;

        // Truncated files declare more data than they carry; read what is
        // actually there, like the size-less readers do.
        let pos = source.stream_position()?;
        let end = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(pos))?;
        let data_size = u64::from(header.data_size).min(end - pos);

        Ok(Self {
            source,
            format,
            sample_rate: header.sample_rate,
            max_chunk_len,
            // A trailing odd byte cannot form a 16-bit value and is dropped.
            samples_left: (data_size / 2) as usize,
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

    /// Reads the next chunk, or `None` once the data chunk is exhausted.
    /// Every chunk is `max_chunk_len` long except the last one, which holds
    /// the remainder.
    pub fn read_chunk(&mut self) -> Result<Option<Vec<i16>>, SoundError> {
        if self.samples_left == 0 {
            return Ok(None);
        }

        let len = self.samples_left.min(self.max_chunk_len);
        let mut chunk = vec![0i16; len];
        self.source.read_i16_into::<LittleEndian>(&mut chunk)?;
        self.samples_left -= len;
        Ok(Some(chunk))
    }

    /// Reads all remaining chunks.
    pub fn read_all(&mut self) -> Result<Vec<Vec<i16>>, SoundError> {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.read_chunk()? {
            chunks.push(chunk);
        }
        Ok(chunks)
    }
}

fn read_header(source: &mut DataSource) -> Result<WavHeader, SoundError> {
    let mut signature = [0u8; 4];
    source.read_exact(&mut signature)?;
    if &signature != b"RIFF" {
        return Err(SoundError::UnsupportedFormat);
    }
    let _riff_size = source.read_u32::<LittleEndian>()?;

    let mut format = [0u8; 4];
    source.read_exact(&mut format)?;
    if &format != b"WAVE" {
        return Err(SoundError::UnsupportedFormat);
    }

    let mut fmt_signature = [0u8; 4];
    source.read_exact(&mut fmt_signature)?;
    if &fmt_signature != b"fmt " {
        return Err(SoundError::UnsupportedFormat);
    }
    let fmt_size = source.read_u32::<LittleEndian>()?;
    if fmt_size < FMT_CHUNK_MIN_SIZE {
        return Err(SoundError::UnsupportedFormat);
    }
    let _audio_format = source.read_u16::<LittleEndian>()?;
    let num_channels = source.read_u16::<LittleEndian>()?;
    let sample_rate = source.read_u32::<LittleEndian>()?;
    let _byte_rate = source.read_u32::<LittleEndian>()?;
    let _block_align = source.read_u16::<LittleEndian>()?;
    let bits_per_sample = source.read_u16::<LittleEndian>()?;
    if fmt_size > FMT_CHUNK_MIN_SIZE {
        source.seek(SeekFrom::Current(i64::from(fmt_size - FMT_CHUNK_MIN_SIZE)))?;
    }

    // Skip over any unknown chunks (LIST, fact, cue, ...) until the data
    // chunk. Running out of stream here means there is no data chunk at all.
    let data_size = loop {
        let mut chunk_signature = [0u8; 4];
        if let Err(err) = source.read_exact(&mut chunk_signature) {
            return Err(if err.kind() == ErrorKind::UnexpectedEof {
                SoundError::UnsupportedFormat
            } else {
                SoundError::Io(err)
            });
        }
        let chunk_size = source.read_u32::<LittleEndian>()?;
        if &chunk_signature == b"data" {
            break chunk_size;
        }
        source.seek(SeekFrom::Current(i64::from(chunk_size)))?;
    };

    Ok(WavHeader {
        num_channels,
        sample_rate,
        bits_per_sample,
        data_size,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    struct Fixture {
        channels: u16,
        bits_per_sample: u16,
        fmt_extra: Vec<u8>,
        junk_chunk: Option<(&'static [u8; 4], Vec<u8>)>,
        data: Vec<u8>,
    }

    impl Fixture {
        fn pcm16(samples: &[i16]) -> Self {
            let mut data = Vec::new();
            for sample in samples {
                data.write_i16::<LittleEndian>(*sample).unwrap();
            }
            Self {
                channels: 1,
                bits_per_sample: 16,
                fmt_extra: Vec::new(),
                junk_chunk: None,
                data,
            }
        }

        fn build(&self) -> DataSource {
            let mut bytes = Vec::new();
            bytes.write_all(b"RIFF").unwrap();
            bytes.write_u32::<LittleEndian>(0).unwrap();
            bytes.write_all(b"WAVE").unwrap();

            bytes.write_all(b"fmt ").unwrap();
            bytes
                .write_u32::<LittleEndian>(16 + self.fmt_extra.len() as u32)
                .unwrap();
            bytes.write_u16::<LittleEndian>(1).unwrap();
            bytes.write_u16::<LittleEndian>(self.channels).unwrap();
            bytes.write_u32::<LittleEndian>(11025).unwrap();
            let block_align = self.channels * self.bits_per_sample / 8;
            bytes
                .write_u32::<LittleEndian>(11025 * u32::from(block_align))
                .unwrap();
            bytes.write_u16::<LittleEndian>(block_align).unwrap();
            bytes.write_u16::<LittleEndian>(self.bits_per_sample).unwrap();
            bytes.write_all(&self.fmt_extra).unwrap();

            if let Some((signature, payload)) = &self.junk_chunk {
                bytes.write_all(*signature).unwrap();
                bytes.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
                bytes.write_all(payload).unwrap();
            }

            bytes.write_all(b"data").unwrap();
            bytes.write_u32::<LittleEndian>(self.data.len() as u32).unwrap();
            bytes.write_all(&self.data).unwrap();

            DataSource::from_memory(bytes)
        }

        fn build_bytes(&self) -> Vec<u8> {
            match self.build() {
                DataSource::Memory(cursor) => cursor.into_inner(),
                DataSource::File { .. } => unreachable!(),
            }
        }
    }

    #[test]
    fn decodes_metadata() {
        let mut decoder = WavDecoder::new(Fixture::pcm16(&[0; 4]).build(), 16384).unwrap();

        assert_eq!(decoder.format(), SampleFormat::Mono16);
        assert_eq!(decoder.sample_rate(), 11025);
        assert_eq!(decoder.read_all().unwrap().len(), 1);
    }

    #[test]
    fn chunking_splits_at_max_len_with_short_tail() {
        let samples: Vec<i16> = (0..10).collect();
        let mut decoder = WavDecoder::new(Fixture::pcm16(&samples).build(), 4).unwrap();

        let chunks = decoder.read_all().unwrap();

        assert_eq!(
            chunks.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![4, 4, 2]
        );
        let concatenated: Vec<i16> = chunks.into_iter().flatten().collect();
        assert_eq!(concatenated, samples);
    }

    #[test]
    fn chunking_of_exact_multiple_has_no_tail() {
        let samples: Vec<i16> = (0..8).collect();
        let mut decoder = WavDecoder::new(Fixture::pcm16(&samples).build(), 4).unwrap();

        let chunks = decoder.read_all().unwrap();

        assert_eq!(chunks.iter().map(Vec::len).collect::<Vec<_>>(), vec![4, 4]);
    }

    #[test]
    fn incremental_reads_equal_bulk_reads() {
        let samples: Vec<i16> = (0..37).collect();

        let mut bulk = WavDecoder::new(Fixture::pcm16(&samples).build(), 8).unwrap();
        let mut incremental = WavDecoder::new(Fixture::pcm16(&samples).build(), 8).unwrap();

        let bulk_chunks = bulk.read_all().unwrap();
        let mut incremental_chunks = Vec::new();
        while let Some(chunk) = incremental.read_chunk().unwrap() {
            incremental_chunks.push(chunk);
        }

        assert_eq!(bulk_chunks, incremental_chunks);
    }

    #[test]
    fn eight_bit_data_is_kept_as_raw_byte_pairs() {
        let mut fixture = Fixture::pcm16(&[]);
        fixture.bits_per_sample = 8;
        fixture.data = vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06];

        let mut decoder = WavDecoder::new(fixture.build(), 16384).unwrap();

        assert_eq!(decoder.format(), SampleFormat::Mono8);
        assert_eq!(decoder.read_all().unwrap(), vec![vec![0x0201, 0x0403, 0x0605]]);
    }

    #[test]
    fn tolerates_oversized_fmt_chunk() {
        let mut fixture = Fixture::pcm16(&[1, 2, 3]);
        fixture.fmt_extra = vec![0xAA; 6];

        let mut decoder = WavDecoder::new(fixture.build(), 16384).unwrap();

        assert_eq!(decoder.read_all().unwrap(), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn skips_unknown_chunks_before_data() {
        let mut fixture = Fixture::pcm16(&[7, 8]);
        fixture.junk_chunk = Some((b"LIST", vec![0x55; 11]));

        let mut decoder = WavDecoder::new(fixture.build(), 16384).unwrap();

        assert_eq!(decoder.read_all().unwrap(), vec![vec![7, 8]]);
    }

    #[test]
    fn truncated_data_chunk_yields_available_samples() {
        let mut fixture = Fixture::pcm16(&[1, 2, 3]);
        // Claim twice the data actually present.
        let declared = fixture.data.len() as u32 * 2;
        let mut bytes = Vec::new();
        bytes.write_all(b"RIFF").unwrap();
        bytes.write_u32::<LittleEndian>(0).unwrap();
        bytes.write_all(b"WAVE").unwrap();
        bytes.write_all(b"fmt ").unwrap();
        bytes.write_u32::<LittleEndian>(16).unwrap();
        bytes.write_u16::<LittleEndian>(1).unwrap();
        bytes.write_u16::<LittleEndian>(1).unwrap();
        bytes.write_u32::<LittleEndian>(11025).unwrap();
        bytes.write_u32::<LittleEndian>(22050).unwrap();
        bytes.write_u16::<LittleEndian>(2).unwrap();
        bytes.write_u16::<LittleEndian>(16).unwrap();
        bytes.write_all(b"data").unwrap();
        bytes.write_u32::<LittleEndian>(declared).unwrap();
        bytes.write_all(&fixture.data).unwrap();

        let mut decoder = WavDecoder::new(DataSource::from_memory(bytes), 16384).unwrap();

        assert_eq!(decoder.read_all().unwrap(), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn rejects_streams_without_riff_signature() {
        let mut bytes = Fixture::pcm16(&[1]).build_bytes();
        bytes[0..4].copy_from_slice(b"JUNK");

        assert!(matches!(
            WavDecoder::new(DataSource::from_memory(bytes), 16384),
            Err(SoundError::UnsupportedFormat)
        ));
    }

    #[test]
    fn rejects_streams_without_wave_signature() {
        let mut bytes = Fixture::pcm16(&[1]).build_bytes();
        bytes[8..12].copy_from_slice(b"AVI ");

        assert!(matches!(
            WavDecoder::new(DataSource::from_memory(bytes), 16384),
            Err(SoundError::UnsupportedFormat)
        ));
    }

    #[test]
    fn rejects_streams_without_fmt_chunk() {
        let mut bytes = Fixture::pcm16(&[1]).build_bytes();
        bytes[12..16].copy_from_slice(b"fact");

        assert!(matches!(
            WavDecoder::new(DataSource::from_memory(bytes), 16384),
            Err(SoundError::UnsupportedFormat)
        ));
    }

    #[test]
    fn rejects_streams_without_data_chunk() {
        let mut fixture = Fixture::pcm16(&[]);
        fixture.junk_chunk = Some((b"LIST", vec![0; 4]));
        let mut bytes = fixture.build_bytes();
        // Overwrite the data chunk signature; the decoder runs off the end
        // of the stream looking for it.
        let data_offset = bytes.len() - 8;
        bytes[data_offset..data_offset + 4].copy_from_slice(b"fact");

        assert!(matches!(
            WavDecoder::new(DataSource::from_memory(bytes), 16384),
            Err(SoundError::UnsupportedFormat)
        ));
    }

    #[test]
    fn rejects_unsupported_bit_depth() {
        let mut fixture = Fixture::pcm16(&[1]);
        fixture.bits_per_sample = 24;

        assert!(matches!(
            WavDecoder::new(fixture.build(), 16384),
            Err(SoundError::UnsupportedFormat)
        ));
    }

    #[test]
    fn rejects_unsupported_channel_count() {
        let mut fixture = Fixture::pcm16(&[1]);
        fixture.channels = 6;

        assert!(matches!(
            WavDecoder::new(fixture.build(), 16384),
            Err(SoundError::UnsupportedFormat)
        ));
    }

}
