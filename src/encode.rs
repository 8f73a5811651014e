//! Format conversion: whole-buffer PCM → self-contained container bytes.
//!
//! Converters are looked up by the request's `response_format` in a
//! registry built at startup. Two are registered: `opus` (libopus frames
//! in an Ogg container, the network-delivery default) and `wav`.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use ogg::{PacketWriteEndInfo, PacketWriter};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unsupported channel count: {0}")]
    BadChannelCount(u16),

    #[error("opus encoder error: {0}")]
    Opus(#[from] opus::Error),

    #[error("ogg write error: {0}")]
    Ogg(#[from] std::io::Error),

    #[error("wav write error: {0}")]
    Wav(#[from] hound::Error),
}

/// One registered audio container encoder.
pub trait FormatConverter: Send + Sync {
    /// Encode the entire buffer at once into a complete byte sequence.
    fn convert(&self, sample_rate: u32, channels: u16, samples: &[i16])
        -> Result<Vec<u8>, ConvertError>;

    fn mime_type(&self) -> &'static str;
}

/// Converters keyed by wire format name.
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn FormatConverter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Registry with the built-in converters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("opus", Arc::new(OpusFormatConverter));
        registry.register("wav", Arc::new(WavFormatConverter));
        registry
    }

    pub fn register(&mut self, name: &str, converter: Arc<dyn FormatConverter>) {
        self.converters.insert(name.to_string(), converter);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn FormatConverter>> {
        self.converters.get(name).cloned()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Opus frames wrapped in an Ogg container (`audio/ogg; codecs=opus`).
pub struct OpusFormatConverter;

// libopus lookahead at 48 kHz, advertised as pre-skip in OpusHead.
const PRE_SKIP: u16 = 312;
// 20 ms frames. Granule positions always count 48 kHz samples.
const FRAMES_PER_SECOND: u32 = 50;
const MAX_PACKET_BYTES: usize = 4000;
const STREAM_SERIAL: u32 = 0x70_67_74_73;

impl FormatConverter for OpusFormatConverter {
    fn convert(
        &self,
        sample_rate: u32,
        channels: u16,
        samples: &[i16],
    ) -> Result<Vec<u8>, ConvertError> {
        let opus_channels = match channels {
            1 => opus::Channels::Mono,
            2 => opus::Channels::Stereo,
            other => return Err(ConvertError::BadChannelCount(other)),
        };
        let mut encoder =
            opus::Encoder::new(sample_rate, opus_channels, opus::Application::Audio)?;

        let frame_len = (sample_rate / FRAMES_PER_SECOND) as usize * channels as usize;
        let frames: Vec<&[i16]> = samples.chunks(frame_len).collect();

        let mut writer = PacketWriter::new(Vec::new());
        writer.write_packet(
            opus_head(channels, sample_rate),
            STREAM_SERIAL,
            PacketWriteEndInfo::EndPage,
            0,
        )?;
        writer.write_packet(
            opus_tags(),
            STREAM_SERIAL,
            if frames.is_empty() {
                // No audio packets follow; close the logical stream here so
                // an empty input still yields a complete container.
                PacketWriteEndInfo::EndStream
            } else {
                PacketWriteEndInfo::EndPage
            },
            0,
        )?;

        let mut granule = PRE_SKIP as u64;
        let mut padded = Vec::new();
        for (i, frame) in frames.iter().enumerate() {
            let packet = if frame.len() == frame_len {
                encoder.encode_vec(frame, MAX_PACKET_BYTES)?
            } else {
                // Final short frame: pad with silence to a full 20 ms.
                padded.clear();
                padded.extend_from_slice(frame);
                padded.resize(frame_len, 0);
                encoder.encode_vec(&padded, MAX_PACKET_BYTES)?
            };

            // Granule counts real (unpadded) samples, scaled to 48 kHz.
            granule += (frame.len() / channels as usize) as u64 * 48_000 / sample_rate as u64;
            let end_info = if i + 1 == frames.len() {
                PacketWriteEndInfo::EndStream
            } else {
                PacketWriteEndInfo::NormalPacket
            };
            writer.write_packet(packet, STREAM_SERIAL, end_info, granule)?;
        }

        Ok(writer.into_inner())
    }

    fn mime_type(&self) -> &'static str {
        "audio/ogg; codecs=opus"
    }
}

/// Identification header, RFC 7845 §5.1.
fn opus_head(channels: u16, sample_rate: u32) -> Vec<u8> {
    let mut head = Vec::with_capacity(19);
    head.extend_from_slice(b"OpusHead");
    head.push(1); // version
    head.push(channels as u8);
    head.extend_from_slice(&PRE_SKIP.to_le_bytes());
    head.extend_from_slice(&sample_rate.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes()); // output gain
    head.push(0); // channel mapping family
    head
}

/// Comment header, RFC 7845 §5.2.
fn opus_tags() -> Vec<u8> {
    let vendor = b"polyglot-tts";
    let mut tags = Vec::with_capacity(8 + 4 + vendor.len() + 4);
    tags.extend_from_slice(b"OpusTags");
    tags.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    tags.extend_from_slice(vendor);
    tags.extend_from_slice(&0u32.to_le_bytes()); // no user comments
    tags
}

/// Plain WAV container (`audio/wav`).
pub struct WavFormatConverter;

impl FormatConverter for WavFormatConverter {
    fn convert(
        &self,
        sample_rate: u32,
        channels: u16,
        samples: &[i16],
    ) -> Result<Vec<u8>, ConvertError> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
            for &sample in samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }

    fn mime_type(&self) -> &'static str {
        "audio/wav"
    }
}
