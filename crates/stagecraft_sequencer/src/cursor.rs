// SPDX-License-Identifier: MIT OR Apache-2.0
//! Step cursor: numbers the steps of a thread body and tracks the pending one.
//!
//! A body claims one step index per scheduler call, in program order, every
//! time it runs. Comparing that index with the cursor position decides whether
//! the call is replayed (already done), executed, or held back behind a wait
//! that is still pending.

/// Position of a step inside a thread body
pub type StepIndex = u32;

/// How a step is treated on the current visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    /// Completed on an earlier visit; side effects are suppressed
    Passed,
    /// The pending step; executes for real
    Live,
    /// Behind a pending step; does nothing this frame
    Blocked,
}

/// Per-thread step bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepCursor {
    /// Index of the pending step
    position: StepIndex,
    /// Steps claimed so far in the current frame
    visited: StepIndex,
}

impl StepCursor {
    /// Create a cursor at the start of a body
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cursor resuming at a given step
    pub fn at(position: StepIndex) -> Self {
        Self {
            position,
            visited: 0,
        }
    }

    /// Index of the pending step
    pub fn position(&self) -> StepIndex {
        self.position
    }

    /// Number of steps claimed in the current frame
    pub fn visited(&self) -> StepIndex {
        self.visited
    }

    /// Start numbering steps from zero again
    pub fn begin_frame(&mut self) {
        self.visited = 0;
    }

    /// Claim the next step index and classify it
    pub fn visit(&mut self) -> (StepIndex, StepPhase) {
        let index = self.visited;
        self.visited = self.visited.saturating_add(1);

        let phase = match index.cmp(&self.position) {
            std::cmp::Ordering::Less => StepPhase::Passed,
            std::cmp::Ordering::Equal => StepPhase::Live,
            std::cmp::Ordering::Greater => StepPhase::Blocked,
        };

        (index, phase)
    }

    /// Mark the pending step as done
    pub fn advance(&mut self) {
        self.position = self.position.saturating_add(1);
    }

    /// Return to the start of the body.
    ///
    /// Steps already claimed this frame stay claimed, so a rewind in the
    /// middle of a frame leaves the rest of that frame blocked.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Whether the pending step was visited this frame and is still pending
    pub fn is_suspended(&self) -> bool {
        self.visited > self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_cursor_runs_first_step_live() {
        let mut cursor = StepCursor::new();
        assert_eq!(cursor.visit(), (0, StepPhase::Live));
        assert_eq!(cursor.visit(), (1, StepPhase::Blocked));
        assert!(cursor.is_suspended());
    }

    #[test]
    fn test_advance_lets_next_step_run_in_same_frame() {
        let mut cursor = StepCursor::new();
        assert_eq!(cursor.visit().1, StepPhase::Live);
        cursor.advance();
        assert!(!cursor.is_suspended());
        assert_eq!(cursor.visit(), (1, StepPhase::Live));
    }

    #[test]
    fn test_replay_after_begin_frame() {
        let mut cursor = StepCursor::at(2);
        cursor.begin_frame();
        assert_eq!(cursor.visit().1, StepPhase::Passed);
        assert_eq!(cursor.visit().1, StepPhase::Passed);
        assert_eq!(cursor.visit().1, StepPhase::Live);
        assert_eq!(cursor.visit().1, StepPhase::Blocked);
    }

    #[test]
    fn test_rewind_mid_frame_blocks_remaining_steps() {
        let mut cursor = StepCursor::at(3);
        cursor.visit();
        cursor.visit();
        cursor.rewind();
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.visit().1, StepPhase::Blocked);

        cursor.begin_frame();
        assert_eq!(cursor.visit().1, StepPhase::Live);
    }
}
