//! Editor session context.
//!
//! # Responsibility
//! - Hold the per-process UI state: active note, editor buffer, preview flag.
//! - Model the autosave debounce and the save-status indicator as
//!   deadline-based cancellable timers.
//!
//! # Invariants
//! - Each timer has at most one pending deadline; scheduling replaces it.
//! - A timer fires at most once per schedule.

use crate::config::SessionConfig;
use crate::model::note::NoteId;
use std::time::Duration;

/// Cancel-and-replace one-shot timer driven by an external clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    delay_ms: i64,
    deadline_ms: Option<i64>,
}

impl Timer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay_ms: i64::try_from(delay.as_millis()).unwrap_or(i64::MAX),
            deadline_ms: None,
        }
    }

    /// Arms the timer `delay` after `now_ms`, dropping any pending deadline.
    pub fn schedule(&mut self, now_ms: i64) {
        self.deadline_ms = Some(now_ms.saturating_add(self.delay_ms));
    }

    pub fn cancel(&mut self) {
        self.deadline_ms = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline_ms.is_some()
    }

    pub fn deadline_ms(&self) -> Option<i64> {
        self.deadline_ms
    }

    /// Returns `true` and disarms the timer when its deadline has passed.
    pub fn fire_if_due(&mut self, now_ms: i64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                true
            }
            _ => false,
        }
    }
}

/// Explicit session state owned by the note registry.
#[derive(Debug, Clone)]
pub struct EditorSession {
    active_note_id: Option<NoteId>,
    buffer: String,
    preview_mode: bool,
    autosave: Timer,
    save_status: Timer,
}

impl EditorSession {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            active_note_id: None,
            buffer: String::new(),
            preview_mode: false,
            autosave: Timer::new(config.debounce),
            save_status: Timer::new(config.save_status),
        }
    }

    pub fn active_note_id(&self) -> Option<&NoteId> {
        self.active_note_id.as_ref()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn set_buffer(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    pub fn is_preview_mode(&self) -> bool {
        self.preview_mode
    }

    pub(crate) fn set_preview_mode(&mut self, enabled: bool) {
        self.preview_mode = enabled;
    }

    /// Binds the editor to `id` with its stored `content`. Leaves preview mode
    /// and drops any pending autosave of the previous note's buffer.
    pub(crate) fn activate(&mut self, id: NoteId, content: String) {
        self.active_note_id = Some(id);
        self.buffer = content;
        self.preview_mode = false;
        self.autosave.cancel();
    }

    pub(crate) fn autosave_mut(&mut self) -> &mut Timer {
        &mut self.autosave
    }

    pub(crate) fn save_status_mut(&mut self) -> &mut Timer {
        &mut self.save_status
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    pub fn save_status_visible(&self) -> bool {
        self.save_status.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::{EditorSession, Timer};
    use crate::config::SessionConfig;
    use crate::model::note::NoteId;
    use std::time::Duration;

    #[test]
    fn timer_reschedule_replaces_deadline() {
        let mut timer = Timer::new(Duration::from_millis(500));
        timer.schedule(1_000);
        timer.schedule(1_300);
        assert_eq!(timer.deadline_ms(), Some(1_800));

        assert!(!timer.fire_if_due(1_500));
        assert!(timer.fire_if_due(1_800));
        assert!(!timer.fire_if_due(5_000), "fires once per schedule");
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timer = Timer::new(Duration::from_millis(10));
        timer.schedule(0);
        timer.cancel();
        assert!(!timer.is_pending());
        assert!(!timer.fire_if_due(100));
    }

    #[test]
    fn activate_resets_preview_and_pending_autosave() {
        let mut session = EditorSession::new(&SessionConfig::default());
        session.set_preview_mode(true);
        session.autosave_mut().schedule(0);

        session.activate(NoteId::new("note_1"), "body".to_string());
        assert_eq!(session.active_note_id(), Some(&NoteId::new("note_1")));
        assert_eq!(session.buffer(), "body");
        assert!(!session.is_preview_mode());
        assert!(!session.autosave_pending());
    }
}
