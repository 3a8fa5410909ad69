// Low level file handling of an open write session
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::WriteBytesExt;

use super::*;

/// An open output file together with the sequential write cursor.
pub(super) struct Session {
    file: BufWriter<File>,
    offset: u64,
    /// File the bytes go to; the scratch file while events are staged.
    pub(super) path: PathBuf,
    /// File the caller asked for.
    pub(super) target: PathBuf,
}

impl Session {
    /// Creates (or truncates) the file at `path`.
    pub(super) fn create(path: &Path, target: &Path) -> Result<Self, C3dError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Session {
            file: BufWriter::new(file),
            offset: 0,
            path: path.to_path_buf(),
            target: target.to_path_buf(),
        })
    }

    /// Appends bytes at the write cursor and returns where they start.
    pub(super) fn write_block(&mut self, bytes: &[u8]) -> Result<u64, C3dError> {
        let start = self.offset;
        self.file.write_all(bytes)?;
        self.offset += bytes.len() as u64;
        Ok(start)
    }

    /// Zero-fills the file up to `position`.
    pub(super) fn pad_to(&mut self, position: u64) -> Result<(), C3dError> {
        if position > self.offset {
            let padding = vec![0u8; (position - self.offset) as usize];
            self.write_block(&padding)?;
        }
        Ok(())
    }

    /// Overwrites bytes at `offset` and restores the write cursor.
    pub(super) fn update_bytes(&mut self, offset: u64, bytes: &[u8]) -> Result<(), C3dError> {
        let current_pos = self.offset;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        self.file.seek(SeekFrom::Start(current_pos))?;
        Ok(())
    }

    pub(super) fn update_u8(&mut self, offset: u64, value: u8) -> Result<(), C3dError> {
        let current_pos = self.offset;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_u8(value)?;
        self.file.seek(SeekFrom::Start(current_pos))?;
        Ok(())
    }

    pub(super) fn offset(&self) -> u64 {
        self.offset
    }

    /// Flushes buffered bytes and releases the file handle.
    pub(super) fn finish(self) -> Result<(), C3dError> {
        let file = self.file.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }
}

impl C3dWriter {
    pub(super) fn session_mut(&mut self) -> Result<&mut Session, C3dError> {
        self.session.as_mut().ok_or(C3dError::NotOpen)
    }

    /// Current write position, `None` while the writer is closed.
    pub fn offset(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.offset())
    }

    /// Re-serializes the parameter at `slot` over its recorded file offset.
    pub(super) fn update_parameter(&mut self, slot: ParameterSlot) -> Result<(), C3dError> {
        let parameter = self.parameters.slot(slot);
        let offset = parameter.offset_in_file;
        let bytes = parameter.to_bytes(-wire_group_id(slot.group)?)?;
        debug!(parameter = %parameter.name, offset, len = bytes.len(), "patching parameter in place");
        self.session_mut()?.update_bytes(offset, &bytes)
    }
}
