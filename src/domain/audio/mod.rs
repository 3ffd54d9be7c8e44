use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Highest sample rate accepted from a stored or synthesized track
pub const MAX_SAMPLE_RATE: u32 = 384_000;
/// Highest channel count accepted from a stored or synthesized track
pub const MAX_CHANNELS: u16 = 8;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("wav codec error: {0}")]
    Wav(#[from] hound::Error),
    #[error("unsupported audio: {0}")]
    Unsupported(String),
    #[error("inconsistent audio: {0}")]
    Inconsistent(String),
}

/// PCM parameters shared by every track of a playback batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    /// Bytes per sample (1 = unsigned 8-bit, 2..=4 = signed little-endian)
    pub sample_width: u16,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, channels: u16, sample_width: u16) -> Self {
        Self {
            sample_rate,
            channels,
            sample_width,
        }
    }

    /// Bytes per frame (one sample for every channel)
    pub fn block_align(&self) -> usize {
        self.channels as usize * self.sample_width as usize
    }

    pub fn validate(&self) -> Result<(), AudioError> {
        if self.sample_rate == 0 {
            return Err(AudioError::Inconsistent("sample rate must be positive".to_string()));
        }
        if self.sample_rate > MAX_SAMPLE_RATE {
            return Err(AudioError::Unsupported(format!(
                "sample rate of {} Hz",
                self.sample_rate
            )));
        }
        if self.channels == 0 {
            return Err(AudioError::Inconsistent("channel count must be positive".to_string()));
        }
        if self.channels > MAX_CHANNELS {
            return Err(AudioError::Unsupported(format!("{} channels", self.channels)));
        }
        if !(1..=4).contains(&self.sample_width) {
            return Err(AudioError::Unsupported(format!(
                "sample width of {} bytes",
                self.sample_width
            )));
        }
        Ok(())
    }

    /// Silence lasting `seconds`, scaled by the sample rate
    pub fn silence(&self, seconds: u32) -> Vec<u8> {
        let frames = seconds as usize * self.sample_rate as usize;
        // 8-bit PCM is unsigned, its midpoint is 0x80
        let fill = if self.sample_width == 1 { 0x80 } else { 0x00 };
        vec![fill; frames * self.block_align()]
    }

    fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.sample_width * 8,
            sample_format: hound::SampleFormat::Int,
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {}-byte samples",
            self.sample_rate, self.channels, self.sample_width
        )
    }
}

/// Raw interleaved PCM plus the parameters needed to interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub format: AudioFormat,
    pub pcm: Vec<u8>,
}

impl AudioClip {
    pub fn new(format: AudioFormat, pcm: Vec<u8>) -> Result<Self, AudioError> {
        let clip = Self { format, pcm };
        clip.validate()?;
        Ok(clip)
    }

    pub fn validate(&self) -> Result<(), AudioError> {
        self.format.validate()?;
        if self.pcm.len() % self.format.block_align() != 0 {
            return Err(AudioError::Inconsistent(format!(
                "{} bytes is not a whole number of {}-byte frames",
                self.pcm.len(),
                self.format.block_align()
            )));
        }
        Ok(())
    }

    pub fn frame_count(&self) -> usize {
        self.pcm.len() / self.format.block_align()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.format.sample_rate as f64
    }

    /// Wrap the PCM in a WAV container
    pub fn to_wav(&self) -> Result<Vec<u8>, AudioError> {
        self.validate()?;
        let width = self.format.sample_width as usize;
        let mut buffer = Vec::with_capacity(self.pcm.len() + 44);
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut buffer), self.format.wav_spec())?;
            for chunk in self.pcm.chunks_exact(width) {
                writer.write_sample(decode_sample(chunk))?;
            }
            writer.finalize()?;
        }
        Ok(buffer)
    }

    /// Parse a WAV container back into raw PCM.
    ///
    /// Truncated data chunks and malformed headers surface as errors; nothing
    /// is padded or repaired.
    pub fn from_wav(bytes: &[u8]) -> Result<Self, AudioError> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();
        if spec.sample_format != hound::SampleFormat::Int {
            return Err(AudioError::Unsupported("floating point samples".to_string()));
        }
        if spec.bits_per_sample % 8 != 0 {
            return Err(AudioError::Unsupported(format!(
                "{} bits per sample",
                spec.bits_per_sample
            )));
        }

        let format = AudioFormat::new(spec.sample_rate, spec.channels, spec.bits_per_sample / 8);
        format.validate()?;

        // The declared data length is unchecked; never reserve past the input
        let width = format.sample_width as usize;
        let declared = (reader.len() as usize).saturating_mul(width);
        let mut pcm = Vec::with_capacity(declared.min(bytes.len()));
        for sample in reader.samples::<i32>() {
            encode_sample(sample?, width, &mut pcm);
        }

        Self::new(format, pcm)
    }
}

fn decode_sample(bytes: &[u8]) -> i32 {
    match bytes.len() {
        1 => bytes[0] as i32 - 128,
        2 => i16::from_le_bytes([bytes[0], bytes[1]]) as i32,
        3 => (i32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]) << 8) >> 8,
        _ => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

fn encode_sample(value: i32, width: usize, out: &mut Vec<u8>) {
    match width {
        1 => out.push((value + 128) as u8),
        2 => out.extend_from_slice(&(value as i16).to_le_bytes()),
        3 => out.extend_from_slice(&value.to_le_bytes()[..3]),
        _ => out.extend_from_slice(&value.to_le_bytes()),
    }
}
