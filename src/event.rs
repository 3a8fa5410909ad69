//! Events recorded during a write session and their conversion into the
//! `EVENT` and `EVENT_CONTEXT` parameter groups.

use serde::{Deserialize, Serialize};

use crate::blocks::parameter_block::ParameterValue;

/// A labelled moment of the recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct C3dEvent {
    pub label: String,
    pub context: String,
    pub description: String,
    pub subject: String,
    /// Frame of the event; `None` means the frame current when it is added.
    pub frame: Option<i32>,
    pub icon_id: i16,
    pub generic_flag: u8,
}

impl C3dEvent {
    pub fn new(label: &str, context: &str) -> Self {
        C3dEvent {
            label: label.to_string(),
            context: context.to_string(),
            ..Default::default()
        }
    }

    pub fn at_frame(mut self, frame: i32) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }
}

/// Display metadata of one event context ("Left", "Right", "General", ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventContext {
    pub label: String,
    pub description: String,
    pub icon_id: i16,
    pub colour: i16,
}

impl EventContext {
    pub fn new(label: &str) -> Self {
        EventContext {
            label: label.to_string(),
            ..Default::default()
        }
    }
}

/// Context table of a session: declared contexts first, then every context
/// used by an event that was not declared, in order of first appearance.
pub fn distinct_contexts(events: &[C3dEvent], declared: &[EventContext]) -> Vec<EventContext> {
    let mut contexts: Vec<EventContext> = Vec::with_capacity(declared.len());
    for context in declared {
        if !contexts.iter().any(|c| c.label == context.label) {
            contexts.push(context.clone());
        }
    }
    for event in events {
        if !contexts.iter().any(|c| c.label == event.context) {
            contexts.push(EventContext::new(&event.context));
        }
    }
    contexts
}

/// Splits the event time `frame / frame_rate` into whole minutes and the
/// remaining seconds (fraction included).
pub fn event_time(frame: i32, frame_rate: f32) -> (f32, f32) {
    if frame_rate <= 0.0 {
        return (0.0, 0.0);
    }
    let seconds = frame as f32 / frame_rate;
    let minutes = (seconds.floor() as i32 / 60) as f32;
    (minutes, seconds - minutes * 60.0)
}

/// Builds every `EVENT:*` and `EVENT_CONTEXT:*` parameter for the session.
///
/// Events without a frame are placed at frame 0.
pub fn event_parameters(
    events: &[C3dEvent],
    declared: &[EventContext],
    frame_rate: f32,
) -> Vec<(&'static str, ParameterValue)> {
    let contexts = distinct_contexts(events, declared);
    let (minutes, seconds): (Vec<f32>, Vec<f32>) = events
        .iter()
        .map(|e| event_time(e.frame.unwrap_or(0), frame_rate))
        .unzip();
    let strings = |f: fn(&C3dEvent) -> &String| -> ParameterValue {
        ParameterValue::StringArray(events.iter().map(|e| f(e).clone()).collect())
    };

    vec![
        ("EVENT:USED", ParameterValue::Int16(events.len() as i16)),
        ("EVENT:CONTEXTS", strings(|e| &e.context)),
        ("EVENT:LABELS", strings(|e| &e.label)),
        ("EVENT:DESCRIPTIONS", strings(|e| &e.description)),
        ("EVENT:SUBJECTS", strings(|e| &e.subject)),
        ("EVENT:TIMES", ParameterValue::Float2D(vec![minutes, seconds])),
        ("EVENT:ICON_IDS", ParameterValue::Int16Array(events.iter().map(|e| e.icon_id).collect())),
        ("EVENT:GENERIC_FLAGS", ParameterValue::ByteArray(events.iter().map(|e| e.generic_flag).collect())),
        ("EVENT_CONTEXT:USED", ParameterValue::Int16(contexts.len() as i16)),
        ("EVENT_CONTEXT:LABELS", ParameterValue::StringArray(contexts.iter().map(|c| c.label.clone()).collect())),
        (
            "EVENT_CONTEXT:DESCRIPTIONS",
            ParameterValue::StringArray(contexts.iter().map(|c| c.description.clone()).collect()),
        ),
        ("EVENT_CONTEXT:ICON_IDS", ParameterValue::Int16Array(contexts.iter().map(|c| c.icon_id).collect())),
        ("EVENT_CONTEXT:COLOURS", ParameterValue::Int16Array(contexts.iter().map(|c| c.colour).collect())),
    ]
}
