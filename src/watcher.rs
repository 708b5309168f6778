// SPDX-License-Identifier: Apache-2.0

//! File Watcher (§4.9): wraps `notify` with a debounce table keyed by path.
//! A create/modify event bumps that path's generation counter and schedules
//! a timer; when the timer fires it checks whether its generation is still
//! current before forwarding — a later event for the same path bumps the
//! counter again, so the stale timer simply no-ops instead of being
//! cancelled out-of-band. Delete events bypass the table and are forwarded
//! immediately (§9: explicit per-path debounce table, no cross-thread
//! captured closures for cancellation).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::constants::DEFAULT_DEBOUNCE_MILLIS;

#[derive(Debug, Clone)]
pub enum WatchEvent {
	Changed(PathBuf),
	Removed(PathBuf),
}

struct DebounceTable {
	generations: Mutex<HashMap<PathBuf, u64>>,
}

impl DebounceTable {
	fn new() -> Self {
		Self {
			generations: Mutex::new(HashMap::new()),
		}
	}

	fn bump(&self, path: &Path) -> u64 {
		let mut table = self.generations.lock();
		let entry = table.entry(path.to_path_buf()).or_insert(0);
		*entry += 1;
		*entry
	}

	fn clear(&self, path: &Path) {
		self.generations.lock().remove(path);
	}

	fn is_current(&self, path: &Path, generation: u64) -> bool {
		self.generations.lock().get(path).copied() == Some(generation)
	}
}

/// An active file watch. Dropping this stops watching and cancels any
/// pending debounce timers (they check `is_current` after the drop has
/// cleared their generation's entry and simply no-op).
pub struct FileWatcher {
	_watcher: RecommendedWatcher,
	debounce_table: Arc<DebounceTable>,
}

impl FileWatcher {
	/// Begin watching `root` recursively. Returns the watcher (keep it
	/// alive for as long as watching should continue) and a channel of
	/// debounced events.
	pub fn watch(root: &Path, debounce: Duration) -> notify::Result<(Self, mpsc::UnboundedReceiver<WatchEvent>)> {
		let (tx, rx) = mpsc::unbounded_channel();
		let debounce_table = Arc::new(DebounceTable::new());
		let runtime_handle = tokio::runtime::Handle::current();

		let table_for_callback = debounce_table.clone();
		let tx_for_callback = tx.clone();

		let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
			let Ok(event) = res else { return };
			handle_event(event, &table_for_callback, &tx_for_callback, debounce, &runtime_handle);
		})?;

		watcher.watch(root, RecursiveMode::Recursive)?;

		Ok((
			Self {
				_watcher: watcher,
				debounce_table,
			},
			rx,
		))
	}
}

fn handle_event(
	event: Event,
	table: &Arc<DebounceTable>,
	tx: &mpsc::UnboundedSender<WatchEvent>,
	debounce: Duration,
	runtime_handle: &tokio::runtime::Handle,
) {
	for path in event.paths {
		match &event.kind {
			EventKind::Remove(_) => {
				// Bypasses the debounce table entirely (§4.9) and clears any
				// pending timer for this path so it cannot fire after the
				// removal has already been forwarded.
				table.clear(&path);
				let _ = tx.send(WatchEvent::Removed(path));
			}
			EventKind::Create(_) | EventKind::Modify(_) => {
				let generation = table.bump(&path);
				let table = table.clone();
				let tx = tx.clone();
				runtime_handle.spawn(async move {
					tokio::time::sleep(debounce).await;
					if table.is_current(&path, generation) {
						table.clear(&path);
						let _ = tx.send(WatchEvent::Changed(path));
					}
				});
			}
			_ => {}
		}
	}
}

pub fn default_debounce() -> Duration {
	Duration::from_millis(DEFAULT_DEBOUNCE_MILLIS)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::tempdir;

	#[tokio::test]
	async fn create_then_modify_collapses_to_one_event() {
		let dir = tempdir().unwrap();
		let (_watcher, mut rx) = FileWatcher::watch(dir.path(), Duration::from_millis(80)).unwrap();

		let file_path = dir.path().join("a.rs");
		fs::write(&file_path, "fn a() {}").unwrap();
		tokio::time::sleep(Duration::from_millis(20)).await;
		fs::write(&file_path, "fn a() { 1 }").unwrap();

		let event = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await.unwrap().unwrap();
		assert!(matches!(event, WatchEvent::Changed(_)));

		// No second event should follow for the same burst.
		let second = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
		assert!(second.is_err(), "expected no further debounced event");
	}

	#[tokio::test]
	async fn delete_is_forwarded_immediately() {
		let dir = tempdir().unwrap();
		let file_path = dir.path().join("a.rs");
		fs::write(&file_path, "fn a() {}").unwrap();

		let (_watcher, mut rx) = FileWatcher::watch(dir.path(), Duration::from_secs(5)).unwrap();
		fs::remove_file(&file_path).unwrap();

		let event = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await.unwrap().unwrap();
		assert!(matches!(event, WatchEvent::Removed(_)));
	}

	#[test]
	fn debounce_table_generation_semantics() {
		let table = DebounceTable::new();
		let path = PathBuf::from("/tmp/x");
		let g1 = table.bump(&path);
		let g2 = table.bump(&path);
		assert!(g2 > g1);
		assert!(!table.is_current(&path, g1));
		assert!(table.is_current(&path, g2));
		table.clear(&path);
		assert!(!table.is_current(&path, g2));
	}
}
