use crate::error::C3dError;

/// Size of every C3D block (header, parameter section, data section alignment).
pub const BLOCK_SIZE: u64 = 512;

/// Key byte stored after the parameter-block pointer in the header and in the
/// parameter section marker.
pub const PARAMETER_KEY: u8 = 0x50;

/// Processor type written into the parameter section marker (Intel, little-endian).
pub const PROCESSOR_INTEL: u8 = 0x54;

/// Block number (1-based) at which the parameter section starts.
pub const PARAMETER_START_BLOCK: u8 = 2;

/// Numeric encoding of point and analog samples in the data section.
///
/// C3D signals floating point data with a negative scale factor; a positive
/// scale factor means 16-bit integers that are multiplied by the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    Integer,
    Float,
}

impl SampleEncoding {
    pub fn from_scale_factor(scale_factor: f32) -> Self {
        if scale_factor < 0.0 {
            SampleEncoding::Float
        } else {
            SampleEncoding::Integer
        }
    }

    /// Bytes per stored word.
    pub fn word_size(self) -> usize {
        match self {
            SampleEncoding::Integer => 2,
            SampleEncoding::Float => 4,
        }
    }
}

/// Returns the slice `bytes[start..start + len]` or a `TooShortBuffer` error.
pub fn take(bytes: &[u8], start: usize, len: usize) -> Result<&[u8], C3dError> {
    let end = start + len;
    if bytes.len() < end {
        return Err(C3dError::TooShortBuffer {
            actual:   bytes.len(),
            expected: end,
            file:     file!(),
            line:     line!(),
        });
    }
    Ok(&bytes[start..end])
}
