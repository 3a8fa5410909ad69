//! Implementation of the C3dWriter struct split across several submodules

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::blocks::header_block::C3dHeader;
use crate::blocks::parameter_block::{wire_group_id, ParameterGroup, ParameterValue};
use crate::error::C3dError;
use crate::parameters::{split_path, ParameterSlot, ParameterStore};
use crate::parsing::c3d_file::C3dReader;
use crate::writer::config::WriterConfig;
use crate::writer::rewrite;

mod data;
mod events;
mod io;
mod layout;

pub use data::{PointSample, MAX_FRAMES};
pub use layout::{data_start_block, predict_data_start, PARAMETER_MARKER};

use events::EventLog;
use io::Session;

/// Writer for C3D files.
///
/// Groups and parameters are created while the writer is closed. `open`
/// writes the header and the parameter directory, after which frames are
/// appended sequentially and existing parameters can only be patched in
/// place. `close` (or dropping the writer) finalizes the frame count and the
/// header, and when events are enabled regenerates the file so the event
/// parameters precede the data section.
pub struct C3dWriter {
    header: C3dHeader,
    parameters: ParameterStore,
    events: EventLog,
    session: Option<Session>,
}

impl Default for C3dWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl C3dWriter {
    /// Creates a closed writer populated with the default POINT and ANALOG
    /// parameters.
    pub fn new() -> Self {
        let header = C3dHeader::default();
        let mut parameters = ParameterStore::new();
        parameters.insert("POINT", "DATA_START", ParameterValue::Int16(header.data_start));
        parameters.insert("POINT", "USED", ParameterValue::Int16(header.point_count));
        parameters.insert("POINT", "FRAMES", ParameterValue::Int16(0));
        parameters.insert("POINT", "SCALE", ParameterValue::Float(header.scale_factor));
        parameters.insert("POINT", "RATE", ParameterValue::Float(header.frame_rate));
        parameters.insert("ANALOG", "RATE", ParameterValue::Float(header.analog_rate()));
        parameters.insert("ANALOG", "USED", ParameterValue::Int16(header.analog_channels));
        parameters.insert("ANALOG", "SCALE", ParameterValue::FloatArray(Vec::new()));
        parameters.insert("ANALOG", "GEN_SCALE", ParameterValue::Float(1.0));
        parameters.insert("ANALOG", "OFFSET", ParameterValue::Int16Array(Vec::new()));

        C3dWriter {
            header,
            parameters,
            events: EventLog::default(),
            session: None,
        }
    }

    /// Creates a writer for the given point labels, analog channels and rates.
    pub fn with_config(config: &WriterConfig) -> Result<Self, C3dError> {
        let mut writer = C3dWriter::new();
        let channels = i16::try_from(config.analog_labels.len()).map_err(|_| {
            C3dError::BlockSerializationError(format!("{} analog channels exceed the header limit", config.analog_labels.len()))
        })?;

        writer.set_parameter("POINT:RATE", config.point_rate)?;
        writer.set_parameter("POINT:SCALE", config.scale_factor)?;
        writer.set_parameter("POINT:LABELS", config.point_labels.clone())?;
        writer.set_parameter("ANALOG:USED", channels)?;
        writer.set_parameter("ANALOG:LABELS", config.analog_labels.clone())?;
        writer.set_parameter("ANALOG:RATE", config.analog_rate)?;
        writer.set_parameter("ANALOG:SCALE", vec![1.0f32; channels as usize])?;
        writer.set_parameter("ANALOG:OFFSET", vec![0i16; channels as usize])?;
        writer.set_analog_samples_per_frame(config.analog_samples_per_frame())?;

        writer.events.enabled = config.events_enabled;
        for context in &config.event_contexts {
            writer.declare_event_context(context.clone());
        }
        Ok(writer)
    }

    /// Creates a closed writer carrying the header settings and every
    /// parameter of an existing file. Frames are not copied.
    pub fn from_reader(reader: &C3dReader) -> Self {
        let mut header = reader.header().clone();
        header.first_frame = 1;
        header.last_frame = 0;
        let mut parameters = reader.parameters().clone();
        parameters.reset_offsets();

        C3dWriter {
            header,
            parameters,
            events: EventLog::default(),
            session: None,
        }
    }

    pub fn header(&self) -> &C3dHeader {
        &self.header
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    /// Value stored under `GROUP:NAME`.
    pub fn parameter(&self, path: &str) -> Option<&ParameterValue> {
        self.parameters.get(path)
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Number of frames written in the current session.
    pub fn current_frame(&self) -> i32 {
        self.header.last_frame
    }

    pub fn frames_count(&self) -> usize {
        self.header.frames_count()
    }

    pub fn point_labels(&self) -> &[String] {
        self.parameters
            .get("POINT:LABELS")
            .and_then(|v| v.as_strings())
            .unwrap_or(&[])
    }

    /// Stores a parameter value under `GROUP:NAME`.
    ///
    /// While the file is open only existing parameters can be changed, and
    /// only to a value of the same shape; the record is rewritten in place.
    /// `POINT:LABELS` also updates the header point count and `POINT:USED`;
    /// `POINT:SCALE`, `POINT:RATE` and `ANALOG:USED` are mirrored into the
    /// header and cannot change once the file is open.
    pub fn set_parameter(&mut self, path: &str, value: impl Into<ParameterValue>) -> Result<(), C3dError> {
        let value = value.into();
        let (group, name) = split_path(path)?;
        self.check_reserved(path, &value)?;

        let open = self.is_open();
        let mirrored = is_mirrored(path).then(|| value.clone());
        let slot = self.parameters.set(group, name, value, !open)?;
        if let Some(value) = mirrored {
            self.mirror_into_header(path, &value)?;
        }

        if open && self.parameters.slot(slot).offset_in_file > 0 {
            self.update_parameter(slot)?;
        }
        Ok(())
    }

    pub fn set_group_description(&mut self, group: &str, description: &str) -> Result<(), C3dError> {
        if self.is_open() {
            return Err(C3dError::Lifecycle("group descriptions are fixed once the file is open".into()));
        }
        self.parameters
            .set_group_description(group, description)
            .ok_or_else(|| C3dError::InvalidPath(group.to_string()))
    }

    pub fn set_analog_samples_per_frame(&mut self, samples: i16) -> Result<(), C3dError> {
        if self.is_open() {
            return Err(C3dError::Lifecycle("the analog layout is fixed once the file is open".into()));
        }
        if samples < 0 || (samples == 0 && self.header.analog_channels > 0) {
            return Err(C3dError::BlockSerializationError(format!(
                "{} analog channels need at least one sample per frame, got {}",
                self.header.analog_channels, samples
            )));
        }
        self.header.analog_samples_per_frame = samples;
        Ok(())
    }

    fn check_reserved(&self, path: &str, value: &ParameterValue) -> Result<(), C3dError> {
        let (expected, fixed_when_open) = match path {
            "POINT:LABELS" => ("string[]", false),
            "POINT:SCALE" | "POINT:RATE" => ("float", true),
            "ANALOG:USED" => ("int16", true),
            _ => return Ok(()),
        };
        if value.kind_name() != expected {
            return Err(C3dError::ShapeMismatch {
                path:     path.to_string(),
                expected: expected.to_string(),
                found:    value.shape(),
            });
        }
        if fixed_when_open && self.is_open() {
            return Err(C3dError::Lifecycle(format!("{} cannot change while the file is open", path)));
        }
        Ok(())
    }

    fn mirror_into_header(&mut self, path: &str, value: &ParameterValue) -> Result<(), C3dError> {
        match (path, value) {
            ("POINT:LABELS", ParameterValue::StringArray(labels)) => {
                let count = i16::try_from(labels.len()).map_err(|_| {
                    C3dError::BlockSerializationError(format!("{} point labels exceed the header limit", labels.len()))
                })?;
                self.header.point_count = count;
                self.set_parameter("POINT:USED", count)?;
            }
            ("POINT:SCALE", ParameterValue::Float(scale)) => self.header.scale_factor = *scale,
            ("POINT:RATE", ParameterValue::Float(rate)) => self.header.frame_rate = *rate,
            ("ANALOG:USED", ParameterValue::Int16(channels)) => {
                self.header.analog_channels = *channels;
                if *channels > 0 && self.header.analog_samples_per_frame == 0 {
                    self.header.analog_samples_per_frame = 1;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Opens `path` for writing and writes the header and parameter directory.
    ///
    /// With events enabled the bytes go to a scratch file next to `path`
    /// until `close` regenerates the real file. On failure the writer stays
    /// closed and `open` can be retried.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), C3dError> {
        if self.is_open() {
            return Err(C3dError::Lifecycle("writer is already open".into()));
        }
        let target = path.as_ref();
        let write_path = if self.events.enabled {
            rewrite::scratch_path(target)
        } else {
            target.to_path_buf()
        };

        self.ensure_directory_parameters();
        self.parameters.reset_offsets();
        self.header.first_frame = 1;
        self.header.last_frame = 0;
        if let Some(data_start) = self.parameters.get("POINT:DATA_START").and_then(|v| v.as_i16()) {
            self.header.data_start = data_start;
        }

        self.session = Some(Session::create(&write_path, target)?);
        if let Err(err) = self.write_header().and_then(|()| self.write_parameters()) {
            warn!(path = %write_path.display(), %err, "failed to write C3D header and parameters");
            self.session = None;
            self.parameters.reset_offsets();
            return Err(err);
        }

        info!(
            path = %write_path.display(),
            data_start = self.header.data_start,
            staged = self.events.enabled,
            "opened C3D file"
        );
        Ok(())
    }

    /// Finalizes the file: frame count, header and, with events enabled,
    /// the rewrite that places the event parameters.
    ///
    /// Returns `Ok(false)` when the writer was not open.
    pub fn close(&mut self) -> Result<bool, C3dError> {
        if !self.is_open() {
            return Ok(false);
        }
        let (written, target) = self.finish_session()?;
        if self.events.enabled {
            rewrite::regenerate(self, &written, &target)?;
        }
        info!(path = %target.display(), frames = self.frames_count(), "closed C3D file");
        Ok(true)
    }

    fn write_header(&mut self) -> Result<(), C3dError> {
        let bytes = self.header.to_bytes()?;
        self.session_mut()?.write_block(&bytes)?;
        Ok(())
    }

    /// Patches `POINT:FRAMES`, rewrites the header block and releases the
    /// file handle. Returns the written path and the target path.
    fn finish_session(&mut self) -> Result<(PathBuf, PathBuf), C3dError> {
        let frames = self.header.last_frame.clamp(0, u16::MAX as i32) as u16 as i16;
        let patched = self.set_parameter("POINT:FRAMES", frames).and_then(|()| {
            if let Some(data_start) = self.parameters.get("POINT:DATA_START").and_then(|v| v.as_i16()) {
                self.header.data_start = data_start;
            }
            self.header.to_bytes()
        });

        let mut session = self.session.take().ok_or(C3dError::NotOpen)?;
        let header = patched?;
        session.update_bytes(0, &header)?;
        let paths = (session.path.clone(), session.target.clone());
        session.finish()?;
        debug!(path = %paths.0.display(), frames = self.header.last_frame, "finalized header");
        Ok(paths)
    }

    /// The layout patches these two parameters, so they must exist before
    /// the directory is frozen.
    fn ensure_directory_parameters(&mut self) {
        if self.parameters.parameter("POINT:DATA_START").is_none() {
            self.parameters.insert("POINT", "DATA_START", ParameterValue::Int16(self.header.data_start));
        }
        if self.parameters.parameter("POINT:FRAMES").is_none() {
            self.parameters.insert("POINT", "FRAMES", ParameterValue::Int16(0));
        }
    }

    pub(crate) fn clear_events(&mut self) {
        self.events.events.clear();
    }
}

impl Drop for C3dWriter {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(err) = self.close() {
                error!(%err, "failed to close C3D writer on drop");
            }
        }
    }
}

fn is_mirrored(path: &str) -> bool {
    matches!(path, "POINT:LABELS" | "POINT:SCALE" | "POINT:RATE" | "ANALOG:USED")
}
