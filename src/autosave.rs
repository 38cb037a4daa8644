//! Autosave scheduling policy.
//!
//! Edits are debounced: each edit pushes the write deadline out to a full
//! quiet interval after the edit, and only the latest deadline exists. The
//! scheduler decides *when* to write; the owner of the notes does the write
//! and reports back through [`AutosaveScheduler::record_write`].
use log::{debug, trace};
use tokio::time::{Duration, Instant};

use crate::{Result, SaveStatus};

/// Where the scheduler is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveState {
    /// No unsaved edits
    Idle,
    /// Unsaved edits, to be written at `deadline` unless another edit arrives
    Pending { deadline: Instant },
}

#[derive(Debug)]
pub struct AutosaveScheduler {
    quiet: Duration,
    state: AutosaveState,
    status: SaveStatus,
}

impl AutosaveScheduler {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            state: AutosaveState::Idle,
            status: SaveStatus::Idle,
        }
    }

    /// Records an edit at `now`, replacing any earlier deadline.
    pub fn note_edit(&mut self, now: Instant) -> Instant {
        let deadline = now + self.quiet;
        match self.state {
            AutosaveState::Idle => debug!("Autosave pending, due in {:?}", self.quiet),
            AutosaveState::Pending { .. } => trace!("Autosave deadline pushed back"),
        }
        self.state = AutosaveState::Pending { deadline };
        self.status = SaveStatus::Editing;
        deadline
    }

    /// Drops the pending deadline, if any. Used when a write happens for
    /// another reason. Returns whether something was pending.
    pub fn cancel(&mut self) -> bool {
        let was_pending = self.is_pending();
        if was_pending {
            trace!("Pending autosave cancelled");
        }
        self.state = AutosaveState::Idle;
        was_pending
    }

    /// If the deadline has passed, goes back to idle and returns `true`: the
    /// caller must write now.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.state {
            AutosaveState::Pending { deadline } if now >= deadline => {
                self.state = AutosaveState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Updates the visible status after a write attempt.
    pub fn record_write(&mut self, outcome: &Result<()>) {
        self.status = match outcome {
            Ok(()) => SaveStatus::Saved,
            Err(e) => SaveStatus::Failed(e.to_string()),
        };
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            AutosaveState::Pending { deadline } => Some(deadline),
            AutosaveState::Idle => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, AutosaveState::Pending { .. })
    }

    pub fn state(&self) -> AutosaveState {
        self.state
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoteError;

    const QUIET: Duration = Duration::from_millis(500);

    #[test]
    fn test_edit_moves_to_pending() {
        let mut scheduler = AutosaveScheduler::new(QUIET);
        let now = Instant::now();

        assert_eq!(scheduler.state(), AutosaveState::Idle);
        assert_eq!(scheduler.status(), &SaveStatus::Idle);

        let deadline = scheduler.note_edit(now);
        assert_eq!(deadline, now + QUIET);
        assert_eq!(scheduler.state(), AutosaveState::Pending { deadline });
        assert_eq!(scheduler.status(), &SaveStatus::Editing);
    }

    #[test]
    fn test_deadline_follows_last_edit() {
        let mut scheduler = AutosaveScheduler::new(QUIET);
        let start = Instant::now();

        for step in 0..5 {
            scheduler.note_edit(start + Duration::from_millis(100 * step));
        }
        let last = start + Duration::from_millis(400);

        assert!(!scheduler.take_due(start + QUIET));
        assert!(!scheduler.take_due(last + QUIET - Duration::from_millis(1)));
        assert!(scheduler.take_due(last + QUIET));
        assert!(!scheduler.is_pending());
        // Fires once per quiet period.
        assert!(!scheduler.take_due(last + QUIET * 2));
    }

    #[test]
    fn test_cancel_clears_deadline() {
        let mut scheduler = AutosaveScheduler::new(QUIET);
        let now = Instant::now();

        assert!(!scheduler.cancel());
        scheduler.note_edit(now);
        assert!(scheduler.cancel());
        assert_eq!(scheduler.deadline(), None);
        assert!(!scheduler.take_due(now + QUIET));
    }

    #[test]
    fn test_record_write_sets_status() {
        let mut scheduler = AutosaveScheduler::new(QUIET);

        scheduler.record_write(&Ok(()));
        assert_eq!(scheduler.status(), &SaveStatus::Saved);

        scheduler.record_write(&Err(NoteError::persistence("disk full")));
        assert!(matches!(scheduler.status(), SaveStatus::Failed(msg) if msg.contains("disk full")));
    }
}
