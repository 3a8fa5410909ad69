// Point and analog sample records of the data section
use super::*;
use crate::blocks::common::SampleEncoding;

/// Largest frame number the header can address.
pub const MAX_FRAMES: i32 = u16::MAX as i32;

/// A point sample that can be stored as X, Y, Z and residual words.
pub trait PointSample {
    fn components(&self) -> [f32; 4];
}

impl PointSample for [f32; 3] {
    fn components(&self) -> [f32; 4] {
        [self[0], self[1], self[2], 0.0]
    }
}

impl PointSample for [f32; 4] {
    fn components(&self) -> [f32; 4] {
        *self
    }
}

impl C3dWriter {
    /// Appends one frame of points in the configured encoding and advances
    /// the frame counter.
    ///
    /// The number of points is not checked against `POINT:USED`.
    pub fn write_frame<P: PointSample>(&mut self, points: &[P]) -> Result<(), C3dError> {
        let encoding = self.header.encoding();
        self.write_frame_as(points, encoding)
    }

    /// Appends one frame of points using an explicit encoding.
    ///
    /// The header stores frame numbers as 16-bit words, so frame 65536 is
    /// rejected before anything is written.
    pub fn write_frame_as<P: PointSample>(&mut self, points: &[P], encoding: SampleEncoding) -> Result<(), C3dError> {
        if self.header.last_frame >= MAX_FRAMES {
            return Err(C3dError::BlockSerializationError(format!(
                "C3D files hold at most {} frames",
                MAX_FRAMES
            )));
        }
        let scale = self.header.point_scale();
        let mut buf = Vec::with_capacity(points.len() * 4 * encoding.word_size());
        for point in points {
            let [x, y, z, residual] = point.components();
            match encoding {
                SampleEncoding::Float => {
                    for v in [x, y, z, residual] {
                        buf.extend_from_slice(&v.to_le_bytes());
                    }
                }
                SampleEncoding::Integer => {
                    for v in [x / scale, y / scale, z / scale, residual] {
                        buf.extend_from_slice(&to_word(v).to_le_bytes());
                    }
                }
            }
        }

        self.session_mut()?.write_block(&buf)?;
        self.header.last_frame += 1;
        Ok(())
    }

    /// Appends one sample of every analog channel.
    ///
    /// Fails with `ChannelCountMismatch` before writing anything when the
    /// slice length differs from the declared channel count.
    pub fn write_analog_data(&mut self, channels: &[f32]) -> Result<(), C3dError> {
        let encoding = self.header.encoding();
        self.write_analog_data_as(channels, encoding)
    }

    pub fn write_analog_data_as(&mut self, channels: &[f32], encoding: SampleEncoding) -> Result<(), C3dError> {
        let expected = self.header.analog_channels.max(0) as usize;
        if channels.len() != expected {
            return Err(C3dError::ChannelCountMismatch { expected, actual: channels.len() });
        }

        let mut buf = Vec::with_capacity(channels.len() * encoding.word_size());
        for v in channels {
            match encoding {
                SampleEncoding::Float => buf.extend_from_slice(&v.to_le_bytes()),
                SampleEncoding::Integer => buf.extend_from_slice(&to_word(*v).to_le_bytes()),
            }
        }
        self.session_mut()?.write_block(&buf)?;
        Ok(())
    }
}

// Float to integer casts saturate at the i16 range.
fn to_word(v: f32) -> i16 {
    v.round() as i16
}
