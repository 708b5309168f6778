// SPDX-License-Identifier: Apache-2.0

//! State Manager (§4.11): the single source of truth for a workspace's run
//! state, guarded by one mutex so a transition is always atomic, with
//! progress fanned out over a broadcast channel rather than stored as
//! scattered mutable flags (§9).

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::{CoreError, CoreResult, ErrorEntry};

/// A run's lifecycle state (§3: "Run").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
	Idle,
	Running,
	Paused,
	Stopping,
	Cancelling,
	Failed,
	Complete,
}

/// Which stage of the pipeline a progress event describes (§3: "Progress
/// Event").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	Discovering,
	Parsing,
	Chunking,
	Embedding,
	Storing,
	Complete,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
	pub phase: Phase,
	pub files_processed: usize,
	pub files_total: usize,
	pub chunks_processed: usize,
	pub message: Option<String>,
}

/// Owns the run-state machine for one workspace. One [`StateManager`] per
/// workspace enforces the one-run-at-a-time invariant (§4.11).
pub struct StateManager {
	state: Mutex<RunState>,
	errors: Mutex<Vec<ErrorEntry>>,
	progress_tx: broadcast::Sender<ProgressEvent>,
}

impl Default for StateManager {
	fn default() -> Self {
		Self::new()
	}
}

impl StateManager {
	pub fn new() -> Self {
		let (progress_tx, _rx) = broadcast::channel(256);
		Self {
			state: Mutex::new(RunState::Idle),
			errors: Mutex::new(Vec::new()),
			progress_tx,
		}
	}

	pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
		self.progress_tx.subscribe()
	}

	pub fn current_state(&self) -> RunState {
		*self.state.lock()
	}

	pub fn is_indexing(&self) -> bool {
		matches!(
			*self.state.lock(),
			RunState::Running | RunState::Paused | RunState::Stopping | RunState::Cancelling
		)
	}

	pub fn is_paused(&self) -> bool {
		*self.state.lock() == RunState::Paused
	}

	/// Idle/Complete/Failed -> Running. Fails if a run is already active
	/// (§4.11: one-run-at-a-time).
	pub fn try_start(&self) -> CoreResult<()> {
		let mut state = self.state.lock();
		match *state {
			RunState::Idle | RunState::Complete | RunState::Failed => {
				*state = RunState::Running;
				self.errors.lock().clear();
				Ok(())
			}
			_ => Err(CoreError::RunAlreadyActive),
		}
	}

	pub fn set_paused(&self, paused: bool) -> CoreResult<()> {
		let mut state = self.state.lock();
		match (*state, paused) {
			(RunState::Running, true) => {
				*state = RunState::Paused;
				Ok(())
			}
			(RunState::Paused, false) => {
				*state = RunState::Running;
				Ok(())
			}
			// Idempotent: already in the requested state.
			(RunState::Paused, true) | (RunState::Running, false) => Ok(()),
			_ => Err(CoreError::NoActiveRun),
		}
	}

	/// Graceful stop: let the current item finish, emit no new work.
	pub fn request_stop(&self) -> CoreResult<()> {
		let mut state = self.state.lock();
		match *state {
			RunState::Running | RunState::Paused => {
				*state = RunState::Stopping;
				Ok(())
			}
			_ => Err(CoreError::NoActiveRun),
		}
	}

	/// Immediate cancellation: abort at the next cooperative checkpoint.
	pub fn request_cancel(&self) -> CoreResult<()> {
		let mut state = self.state.lock();
		match *state {
			RunState::Running | RunState::Paused | RunState::Stopping => {
				*state = RunState::Cancelling;
				Ok(())
			}
			_ => Err(CoreError::NoActiveRun),
		}
	}

	pub fn stop_requested(&self) -> bool {
		matches!(*self.state.lock(), RunState::Stopping | RunState::Cancelling)
	}

	pub fn cancellation_requested(&self) -> bool {
		*self.state.lock() == RunState::Cancelling
	}

	pub fn finish_complete(&self) {
		*self.state.lock() = RunState::Complete;
		let _ = self.progress_tx.send(ProgressEvent {
			phase: Phase::Complete,
			files_processed: 0,
			files_total: 0,
			chunks_processed: 0,
			message: None,
		});
	}

	pub fn finish_cancelled(&self) {
		*self.state.lock() = RunState::Idle;
	}

	pub fn set_error(&self, category: crate::error::ErrorCategory, message: impl Into<String>) {
		*self.state.lock() = RunState::Failed;
		self.errors.lock().push(ErrorEntry::new(category, message));
	}

	pub fn clear_error(&self) {
		let mut state = self.state.lock();
		if *state == RunState::Failed {
			*state = RunState::Idle;
		}
		self.errors.lock().clear();
	}

	pub fn record_error(&self, entry: ErrorEntry) {
		self.errors.lock().push(entry);
	}

	pub fn errors_snapshot(&self) -> Vec<ErrorEntry> {
		self.errors.lock().clone()
	}

	pub fn emit_progress(&self, event: ProgressEvent) {
		let _ = self.progress_tx.send(event);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cannot_start_two_runs_at_once() {
		let sm = StateManager::new();
		sm.try_start().unwrap();
		assert!(matches!(sm.try_start(), Err(CoreError::RunAlreadyActive)));
	}

	#[test]
	fn pause_and_resume_round_trip() {
		let sm = StateManager::new();
		sm.try_start().unwrap();
		sm.set_paused(true).unwrap();
		assert!(sm.is_paused());
		sm.set_paused(false).unwrap();
		assert!(!sm.is_paused());
		assert_eq!(sm.current_state(), RunState::Running);
	}

	#[test]
	fn stop_then_cancel_escalates() {
		let sm = StateManager::new();
		sm.try_start().unwrap();
		sm.request_stop().unwrap();
		assert!(sm.stop_requested());
		assert!(!sm.cancellation_requested());
		sm.request_cancel().unwrap();
		assert!(sm.cancellation_requested());
	}

	#[test]
	fn cancel_requires_an_active_run() {
		let sm = StateManager::new();
		assert!(matches!(sm.request_cancel(), Err(CoreError::NoActiveRun)));
	}

	#[test]
	fn after_cancellation_a_new_run_can_start() {
		let sm = StateManager::new();
		sm.try_start().unwrap();
		sm.request_cancel().unwrap();
		sm.finish_cancelled();
		assert_eq!(sm.current_state(), RunState::Idle);
		sm.try_start().unwrap();
	}

	#[tokio::test]
	async fn progress_events_reach_subscribers() {
		let sm = StateManager::new();
		let mut rx = sm.subscribe();
		sm.emit_progress(ProgressEvent {
			phase: Phase::Discovering,
			files_processed: 1,
			files_total: 10,
			chunks_processed: 0,
			message: None,
		});
		let event = rx.recv().await.unwrap();
		assert_eq!(event.phase, Phase::Discovering);
	}
}
