//! Regeneration of a file so the event groups precede the data section.
//!
//! Events are only known when a session ends, but the parameter directory is
//! written when it starts. With events enabled the session therefore writes
//! to a scratch file; on close the event parameters are staged, the target
//! file is written from scratch and the frames are copied over.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::C3dError;
use crate::parsing::c3d_file::C3dReader;
use crate::writer::c3d_writer::C3dWriter;

/// Scratch file used for `target` while events are staged: a hidden file in
/// the same directory.
pub fn scratch_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "c3d".to_string());
    target.with_file_name(format!(".{}.scratch", name))
}

/// Copies every remaining frame of `reader` into the open `writer`, keeping
/// the reader's sample encoding. Returns the number of frames copied.
pub fn copy_frames(reader: &mut C3dReader, writer: &mut C3dWriter) -> Result<usize, C3dError> {
    let encoding = reader.encoding();
    let channels = reader.header().analog_channels.max(0) as usize;
    let mut copied = 0;
    while let Some(frame) = reader.read_frame()? {
        writer.write_frame_as(&frame.points, encoding)?;
        if channels > 0 {
            for sample in frame.analog.chunks(channels) {
                writer.write_analog_data_as(sample, encoding)?;
            }
        }
        copied += 1;
    }
    Ok(copied)
}

/// Rewrites `target` from the closed session in `scratch` with the event
/// parameters included, then deletes the scratch file.
///
/// Event staging is switched off for the copy and back on afterwards, also
/// when the copy fails. The staged event groups are dropped from the writer
/// once the target is written.
pub(crate) fn regenerate(writer: &mut C3dWriter, scratch: &Path, target: &Path) -> Result<(), C3dError> {
    let events = writer.events().len();
    writer.stage_event_parameters()?;
    writer.set_events_enabled(false)?;

    let result = regenerate_target(writer, scratch, target);
    if result.is_err() && writer.is_open() {
        if let Err(err) = writer.close() {
            warn!(%err, path = %target.display(), "failed to close target after a failed rewrite");
        }
    }
    writer.discard_event_parameters();
    writer.set_events_enabled(true)?;
    result?;

    std::fs::remove_file(scratch)?;
    writer.clear_events();
    info!(path = %target.display(), events, "rewrote C3D file with events");
    Ok(())
}

fn regenerate_target(writer: &mut C3dWriter, scratch: &Path, target: &Path) -> Result<(), C3dError> {
    writer.open(target)?;
    let mut reader = C3dReader::open(scratch)?;
    let frames = copy_frames(&mut reader, writer)?;
    reader.close();
    writer.close()?;
    info!(frames, scratch = %scratch.display(), "copied frames from scratch file");
    Ok(())
}
