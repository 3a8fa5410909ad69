// Parameter directory layout: records, block count and data start
use super::*;
use crate::blocks::common::{BLOCK_SIZE, PARAMETER_KEY, PROCESSOR_INTEL};
use crate::blocks::parameter_block::TERMINATOR_LEN;

/// First four bytes of the parameter section. The third byte holds the number
/// of parameter blocks and is patched once the directory size is known.
pub const PARAMETER_MARKER: [u8; 4] = [0x01, PARAMETER_KEY, 0x02, PROCESSOR_INTEL];

/// Data-start block for a directory whose last record ends at `directory_end`:
/// the block after the one holding the terminator, counted from 1.
pub fn data_start_block(directory_end: u64) -> u64 {
    (directory_end + TERMINATOR_LEN) / BLOCK_SIZE + 2
}

/// Computes the data-start block `store` would get if written now, without
/// touching a file.
pub fn predict_data_start(store: &ParameterStore) -> Result<u64, C3dError> {
    let mut end = BLOCK_SIZE + PARAMETER_MARKER.len() as u64;
    for (idx, group) in store.groups().iter().enumerate() {
        let id = wire_group_id(idx)?;
        end += group.to_bytes(id)?.len() as u64;
        for parameter in &group.parameters {
            end += parameter.to_bytes(-id)?.len() as u64;
        }
    }
    Ok(data_start_block(end))
}

impl C3dWriter {
    /// Writes the parameter directory right after the header block and pads
    /// the file up to the first data block.
    pub(super) fn write_parameters(&mut self) -> Result<(), C3dError> {
        let session = self.session.as_mut().ok_or(C3dError::NotOpen)?;
        let marker_pos = session.write_block(&PARAMETER_MARKER)?;

        for group_idx in 0..self.parameters.groups().len() {
            let group = &self.parameters.groups()[group_idx];
            let id = wire_group_id(group_idx)?;
            session.write_block(&group.to_bytes(id)?)?;

            let mut offsets = Vec::with_capacity(group.parameters.len());
            for parameter in &group.parameters {
                offsets.push(session.write_block(&parameter.to_bytes(-id)?)?);
            }
            for (index, offset) in offsets.into_iter().enumerate() {
                self.parameters.set_offset(ParameterSlot { group: group_idx, index }, offset);
            }
        }

        let data_start = data_start_block(session.offset());
        let blocks = u8::try_from(data_start - 2).map_err(|_| {
            C3dError::BlockSerializationError(format!(
                "parameter section needs {} blocks, at most 255 are addressable",
                data_start - 2
            ))
        })?;

        // Records are already on disk, so this patches DATA_START in place.
        self.set_parameter("POINT:DATA_START", data_start as i16)?;
        self.header.data_start = data_start as i16;

        let session = self.session_mut()?;
        session.update_u8(marker_pos + 2, blocks)?;
        session.write_block(&ParameterGroup::terminator_bytes())?;
        session.pad_to((data_start - 1) * BLOCK_SIZE)?;

        debug!(data_start, blocks, "parameter directory written");
        Ok(())
    }
}
