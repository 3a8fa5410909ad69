// Event staging during a write session
use super::*;
use crate::event::{event_parameters, C3dEvent, EventContext};

/// Events collected in memory until the writer is closed.
#[derive(Debug, Default)]
pub(super) struct EventLog {
    pub(super) enabled: bool,
    pub(super) events: Vec<C3dEvent>,
    pub(super) contexts: Vec<EventContext>,
}

impl C3dWriter {
    pub fn events_enabled(&self) -> bool {
        self.events.enabled
    }

    /// Turns event staging on or off for the next session.
    pub fn set_events_enabled(&mut self, enabled: bool) -> Result<(), C3dError> {
        if self.is_open() {
            return Err(C3dError::Lifecycle("cannot toggle events while the file is open".into()));
        }
        self.events.enabled = enabled;
        Ok(())
    }

    /// Records an event. Without an explicit frame the event is placed at
    /// the current frame counter.
    pub fn add_event(&mut self, mut event: C3dEvent) -> Result<(), C3dError> {
        if !self.events.enabled {
            return Err(C3dError::EventsDisabled);
        }
        if event.frame.is_none() {
            event.frame = Some(self.current_frame());
        }
        self.events.events.push(event);
        Ok(())
    }

    /// Declares display metadata for a context; declared contexts lead the
    /// context table in declaration order.
    pub fn declare_event_context(&mut self, context: EventContext) {
        match self.events.contexts.iter_mut().find(|c| c.label == context.label) {
            Some(existing) => *existing = context,
            None => self.events.contexts.push(context),
        }
    }

    pub fn events(&self) -> &[C3dEvent] {
        &self.events.events
    }

    /// Drops the `EVENT` and `EVENT_CONTEXT` groups so a following session
    /// does not carry the previous recording's events.
    pub(crate) fn discard_event_parameters(&mut self) {
        for group in ["EVENT", "EVENT_CONTEXT"] {
            self.parameters.remove_group(group);
        }
    }

    /// Materializes the staged events as `EVENT` and `EVENT_CONTEXT`
    /// parameters. Only legal while the file is closed, since it may create
    /// groups.
    pub fn stage_event_parameters(&mut self) -> Result<(), C3dError> {
        if self.is_open() {
            return Err(C3dError::Lifecycle("event parameters can only be staged while closed".into()));
        }
        let staged = event_parameters(&self.events.events, &self.events.contexts, self.header.frame_rate);
        for (path, value) in staged {
            self.set_parameter(path, value)?;
        }
        Ok(())
    }
}
