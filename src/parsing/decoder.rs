use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::{take, SampleEncoding};
use crate::error::C3dError;

/// One decoded frame of the data section.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// X, Y, Z and residual of every point.
    pub points: Vec<[f32; 4]>,
    /// Analog words in file order: all channels of the first sample, then the
    /// next sample.
    pub analog: Vec<f32>,
}

/// Decodes a frame record.
///
/// Integer coordinates are multiplied by `scale`; residuals and analog words
/// are returned unscaled.
pub fn decode_frame(
    record: &[u8],
    point_count: usize,
    analog_words: usize,
    encoding: SampleEncoding,
    scale: f32,
) -> Result<Frame, C3dError> {
    let word = encoding.word_size();
    let record = take(record, 0, (point_count * 4 + analog_words) * word)?;
    let read = |index: usize| -> f32 {
        let bytes = &record[index * word..(index + 1) * word];
        match encoding {
            SampleEncoding::Float => LittleEndian::read_f32(bytes),
            SampleEncoding::Integer => LittleEndian::read_i16(bytes) as f32,
        }
    };

    let mut points = Vec::with_capacity(point_count);
    for p in 0..point_count {
        let base = p * 4;
        let mut point = [read(base), read(base + 1), read(base + 2), read(base + 3)];
        if encoding == SampleEncoding::Integer {
            for v in &mut point[..3] {
                *v *= scale;
            }
        }
        points.push(point);
    }
    let analog = (0..analog_words).map(|i| read(point_count * 4 + i)).collect();
    Ok(Frame { points, analog })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_points_are_scaled_but_residuals_are_not() {
        let mut record = Vec::new();
        for w in [10i16, -20, 30, 2, 7] {
            record.extend_from_slice(&w.to_le_bytes());
        }
        let frame = decode_frame(&record, 1, 1, SampleEncoding::Integer, 0.5).unwrap();
        assert_eq!(frame.points, vec![[5.0, -10.0, 15.0, 2.0]]);
        assert_eq!(frame.analog, vec![7.0]);
    }

    #[test]
    fn short_record_is_an_error() {
        let record = [0u8; 12];
        assert!(matches!(
            decode_frame(&record, 1, 0, SampleEncoding::Float, 1.0),
            Err(C3dError::TooShortBuffer { .. })
        ));
    }
}
