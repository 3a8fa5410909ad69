//! Writer settings that can be loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::C3dError;
use crate::event::EventContext;

/// Layout and rates of a recording, used by [`C3dWriter::with_config`].
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes:
///
/// ```json
/// { "point_labels": ["LASI", "RASI"], "point_rate": 100.0, "scale_factor": -1.0 }
/// ```
///
/// [`C3dWriter::with_config`]: crate::writer::C3dWriter::with_config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    pub point_labels: Vec<String>,
    pub point_rate: f32,
    pub analog_labels: Vec<String>,
    pub analog_rate: f32,
    /// Negative values select float storage.
    pub scale_factor: f32,
    pub events_enabled: bool,
    pub event_contexts: Vec<EventContext>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            point_labels: Vec::new(),
            point_rate: 30.0,
            analog_labels: Vec::new(),
            analog_rate: 0.0,
            scale_factor: 1.0,
            events_enabled: false,
            event_contexts: Vec::new(),
        }
    }
}

impl WriterConfig {
    pub fn from_json_str(json: &str) -> Result<Self, C3dError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, C3dError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Analog samples stored per point frame: the ratio of the two rates,
    /// at least 1 when analog channels exist and 0 otherwise.
    pub fn analog_samples_per_frame(&self) -> i16 {
        if self.analog_labels.is_empty() {
            return 0;
        }
        if self.point_rate <= 0.0 {
            return 1;
        }
        (self.analog_rate / self.point_rate).round().clamp(1.0, i16::MAX as f32) as i16
    }
}
