use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use crate::blocks::common::{take, SampleEncoding, BLOCK_SIZE, PARAMETER_KEY, PROCESSOR_INTEL};
use crate::blocks::header_block::C3dHeader;
use crate::blocks::parameter_block::{DirectoryRecord, ParameterValue};
use crate::error::C3dError;
use crate::parameters::ParameterStore;
use crate::parsing::decoder::{decode_frame, Frame};

/// Sequential reader for C3D files written on Intel processors.
///
/// The whole file is memory mapped; the header and the parameter directory
/// are parsed up front and frames are decoded on demand.
#[derive(Debug)]
pub struct C3dReader {
    header: C3dHeader,
    parameters: ParameterStore,
    next_frame: usize,
    mmap: Mmap, // Keep the mmap alive for the frame slices.
}

impl C3dReader {
    /// Maps the file at `path` and parses its header and parameters.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, C3dError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let header = C3dHeader::from_bytes(&mmap)?;
        let section = (header.parameter_block.max(1) as u64 - 1) * BLOCK_SIZE;
        let parameters = parse_directory(&mmap, section as usize)?;
        debug!(
            path = %path.display(),
            groups = parameters.groups().len(),
            parameters = parameters.len(),
            frames = header.frames_count(),
            "parsed C3D file"
        );

        Ok(C3dReader {
            header,
            parameters,
            next_frame: 0,
            mmap,
        })
    }

    pub fn header(&self) -> &C3dHeader {
        &self.header
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    pub fn parameter(&self, path: &str) -> Option<&ParameterValue> {
        self.parameters.get(path)
    }

    /// Every parameter as `(GROUP:NAME, value)` in directory order.
    pub fn all_parameters(&self) -> Vec<(String, ParameterValue)> {
        self.parameters.iter().map(|(path, p)| (path, p.value.clone())).collect()
    }

    pub fn frames_count(&self) -> usize {
        self.header.frames_count()
    }

    pub fn encoding(&self) -> SampleEncoding {
        self.header.encoding()
    }

    pub fn is_float(&self) -> bool {
        self.encoding() == SampleEncoding::Float
    }

    pub fn is_integer(&self) -> bool {
        self.encoding() == SampleEncoding::Integer
    }

    pub fn frame_stride(&self) -> usize {
        self.header.frame_stride(self.encoding())
    }

    /// Decodes the next frame, or returns `None` after the last one.
    pub fn read_frame(&mut self) -> Result<Option<Frame>, C3dError> {
        if self.next_frame >= self.frames_count() {
            return Ok(None);
        }
        let stride = self.frame_stride();
        let start = self.header.data_offset() as usize + self.next_frame * stride;
        let record = take(&self.mmap, start, stride)?;
        let frame = decode_frame(
            record,
            self.header.point_count.max(0) as usize,
            self.header.analog_words_per_frame(),
            self.encoding(),
            self.header.point_scale(),
        )?;
        self.next_frame += 1;
        Ok(Some(frame))
    }

    /// Unmaps the file.
    pub fn close(self) {}
}

/// Parses the parameter section starting at byte `section`.
///
/// Groups are stored in directory order; parameters are attached once every
/// group is known, so a parameter may precede its group.
fn parse_directory(bytes: &[u8], section: usize) -> Result<ParameterStore, C3dError> {
    let marker = take(bytes, section, 4)?;
    if marker[1] != PARAMETER_KEY {
        return Err(C3dError::FileIdentifierError(marker[1]));
    }
    if marker[3] != PROCESSOR_INTEL {
        return Err(C3dError::UnsupportedProcessor(marker[3]));
    }
    // Some writers leave the block count at zero; walk to the terminator then.
    let end = match marker[2] {
        0 => bytes.len(),
        blocks => section + blocks as usize * BLOCK_SIZE as usize,
    };

    let mut store = ParameterStore::new();
    let mut group_ids: HashMap<i8, usize> = HashMap::new();
    let mut pending = Vec::new();
    let mut offset = section + marker.len();
    while offset < end.min(bytes.len()) {
        let (record, next) = DirectoryRecord::from_bytes(bytes, offset)?;
        match record {
            DirectoryRecord::End => break,
            DirectoryRecord::Group { id, group } => {
                group_ids.insert(id, store.push_group(group));
            }
            DirectoryRecord::Parameter { group_id, parameter } => pending.push((group_id, parameter)),
        }
        if next <= offset {
            break;
        }
        offset = next;
    }

    for (group_id, parameter) in pending {
        let group = group_ids.get(&-group_id).copied().ok_or_else(|| {
            C3dError::BlockSerializationError(format!(
                "parameter {} references missing group {}",
                parameter.name, group_id
            ))
        })?;
        store.push_parameter(group, parameter)?;
    }
    Ok(store)
}
