use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::{take, SampleEncoding, BLOCK_SIZE, PARAMETER_KEY, PARAMETER_START_BLOCK};
use crate::error::C3dError;

/// The fixed 512-byte header block at the start of every C3D file.
#[derive(Debug, Clone, PartialEq)]
pub struct C3dHeader {
    pub parameter_block: u8,          // word 1, low byte
    pub point_count: i16,             // word 2
    pub analog_channels: i16,         // word 3 is channels * samples per frame
    pub first_frame: i32,             // word 4
    pub last_frame: i32,              // word 5, the running frame counter
    pub max_interpolation_gap: i16,   // word 6
    pub scale_factor: f32,            // words 7-8
    pub data_start: i16,              // word 9
    pub analog_samples_per_frame: i16, // word 10
    pub frame_rate: f32,              // words 11-12
}

impl Default for C3dHeader {
    fn default() -> Self {
        C3dHeader {
            parameter_block: PARAMETER_START_BLOCK,
            point_count: 0,
            analog_channels: 0,
            first_frame: 1,
            last_frame: 0,
            max_interpolation_gap: 10,
            scale_factor: 1.0,
            data_start: 2,
            analog_samples_per_frame: 0,
            frame_rate: 30.0,
        }
    }
}

impl C3dHeader {
    /// Serializes the header into exactly one 512-byte block.
    ///
    /// Frame numbers are stored as unsigned 16-bit words; larger counters are
    /// clamped to `u16::MAX`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, C3dError> {
        if self.analog_channels < 0 || self.analog_samples_per_frame < 0 {
            return Err(C3dError::BlockSerializationError(format!(
                "negative analog layout: {} channels, {} samples per frame",
                self.analog_channels, self.analog_samples_per_frame
            )));
        }
        let measurements = self.analog_channels as i32 * self.analog_samples_per_frame as i32;
        let measurements = i16::try_from(measurements).map_err(|_| {
            C3dError::BlockSerializationError(format!(
                "{} analog measurements per frame do not fit the header",
                measurements
            ))
        })?;

        let mut buf = vec![0u8; BLOCK_SIZE as usize];
        buf[0] = self.parameter_block;
        buf[1] = PARAMETER_KEY;
        LittleEndian::write_i16(&mut buf[2..4], self.point_count);
        LittleEndian::write_i16(&mut buf[4..6], measurements);
        LittleEndian::write_u16(&mut buf[6..8], clamp_frame(self.first_frame));
        LittleEndian::write_u16(&mut buf[8..10], clamp_frame(self.last_frame));
        LittleEndian::write_i16(&mut buf[10..12], self.max_interpolation_gap);
        LittleEndian::write_f32(&mut buf[12..16], self.scale_factor);
        LittleEndian::write_i16(&mut buf[16..18], self.data_start);
        LittleEndian::write_i16(&mut buf[18..20], self.analog_samples_per_frame);
        LittleEndian::write_f32(&mut buf[20..24], self.frame_rate);
        Ok(buf)
    }

    /// Parses a header from the first block of a file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, C3dError> {
        let bytes = take(bytes, 0, BLOCK_SIZE as usize)?;
        if bytes[1] != PARAMETER_KEY {
            return Err(C3dError::FileIdentifierError(bytes[1]));
        }

        let samples_per_frame = LittleEndian::read_i16(&bytes[18..20]);
        let measurements = LittleEndian::read_i16(&bytes[4..6]);
        let analog_channels = if samples_per_frame > 0 {
            measurements / samples_per_frame
        } else {
            0
        };

        Ok(C3dHeader {
            parameter_block: bytes[0],
            point_count: LittleEndian::read_i16(&bytes[2..4]),
            analog_channels,
            first_frame: LittleEndian::read_u16(&bytes[6..8]) as i32,
            last_frame: LittleEndian::read_u16(&bytes[8..10]) as i32,
            max_interpolation_gap: LittleEndian::read_i16(&bytes[10..12]),
            scale_factor: LittleEndian::read_f32(&bytes[12..16]),
            data_start: LittleEndian::read_i16(&bytes[16..18]),
            analog_samples_per_frame: samples_per_frame,
            frame_rate: LittleEndian::read_f32(&bytes[20..24]),
        })
    }

    /// Number of frames between `first_frame` and `last_frame`, inclusive.
    pub fn frames_count(&self) -> usize {
        (self.last_frame - self.first_frame + 1).max(0) as usize
    }

    pub fn analog_rate(&self) -> f32 {
        self.frame_rate * self.analog_samples_per_frame as f32
    }

    pub fn encoding(&self) -> SampleEncoding {
        SampleEncoding::from_scale_factor(self.scale_factor)
    }

    /// Magnitude of the scale factor, used to scale integer point coordinates.
    pub fn point_scale(&self) -> f32 {
        let scale = self.scale_factor.abs();
        if scale == 0.0 { 1.0 } else { scale }
    }

    /// Analog words stored after the points of every frame.
    pub fn analog_words_per_frame(&self) -> usize {
        self.analog_channels.max(0) as usize * self.analog_samples_per_frame.max(0) as usize
    }

    /// Size in bytes of one frame record: four words per point plus analog words.
    pub fn frame_stride(&self, encoding: SampleEncoding) -> usize {
        (self.point_count.max(0) as usize * 4 + self.analog_words_per_frame()) * encoding.word_size()
    }

    /// Absolute byte offset of the first frame.
    pub fn data_offset(&self) -> u64 {
        (self.data_start.max(1) as u64 - 1) * BLOCK_SIZE
    }
}

fn clamp_frame(frame: i32) -> u16 {
    frame.clamp(0, u16::MAX as i32) as u16
}
