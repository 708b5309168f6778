// SPDX-License-Identifier: Apache-2.0

//! File Discovery (§4.2): enumerate candidate files under a workspace root,
//! honoring the Ignore Matcher, in deterministic sorted order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::constants::{DEFAULT_PROGRESS_EVERY_FILES, DEFAULT_PROGRESS_EVERY_MILLIS};
use crate::error::{CoreError, CoreResult};
use crate::ignore_matcher::IgnoreMatcher;
use crate::parsing::languages::detect_language;

/// A file that survived ignore filtering and carries a relative path under
/// the workspace root (§3: "File Record").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
	pub absolute_path: PathBuf,
	pub relative_path: String,
	/// `None` marks an *unsupported* language — the file is still a
	/// candidate if it falls into the generic text family (§4.2).
	pub language: Option<&'static str>,
	pub size_bytes: u64,
}

/// Progress snapshot emitted during a scan. Distinct from the coordinator's
/// `ProgressEvent` (§3) — this one only covers the discovery phase.
#[derive(Debug, Clone)]
pub struct DiscoveryProgress {
	pub files_seen: usize,
	pub files_ignored: usize,
	pub bytes_seen: u64,
}

pub trait ProgressSink: Send {
	fn on_progress(&mut self, progress: &DiscoveryProgress);
}

/// A sink that drops every update; useful when only the final statistics
/// matter.
pub struct NullSink;
impl ProgressSink for NullSink {
	fn on_progress(&mut self, _progress: &DiscoveryProgress) {}
}

impl<F: FnMut(&DiscoveryProgress) + Send> ProgressSink for F {
	fn on_progress(&mut self, progress: &DiscoveryProgress) {
		(self)(progress)
	}
}

#[derive(Debug, Clone, Default)]
pub struct DiscoveryStats {
	pub files_seen: usize,
	pub files_ignored: usize,
	pub files_indexable: usize,
	pub bytes_seen: u64,
	/// True when the root has no non-hidden, non-artifact children at all
	/// (§4.2: empty-workspace short circuit).
	pub empty: bool,
}

/// Cheap per-extension planning breakdown (§4.2: `stats()`).
#[derive(Debug, Clone, Default)]
pub struct ExtensionStats {
	pub total: usize,
	pub by_extension: BTreeMap<String, usize>,
}

pub struct FileDiscovery<'a> {
	root: PathBuf,
	matcher: &'a IgnoreMatcher,
	progress_every_files: usize,
	progress_every: Duration,
}

impl<'a> FileDiscovery<'a> {
	pub fn new(root: impl Into<PathBuf>, matcher: &'a IgnoreMatcher) -> Self {
		Self {
			root: root.into(),
			matcher,
			progress_every_files: DEFAULT_PROGRESS_EVERY_FILES,
			progress_every: Duration::from_millis(DEFAULT_PROGRESS_EVERY_MILLIS),
		}
	}

	pub fn with_progress_interval(mut self, every_files: usize, every: Duration) -> Self {
		self.progress_every_files = every_files.max(1);
		self.progress_every = every;
		self
	}

	/// Enumerate files, applying the ignore matcher, returning them in
	/// deterministic sorted (lexicographic, by relative path) order along
	/// with aggregate statistics.
	pub fn scan(&self, sink: &mut dyn ProgressSink) -> CoreResult<(Vec<FileRecord>, DiscoveryStats)> {
		if !self.root.exists() {
			return Err(CoreError::Discovery {
				root: self.root.clone(),
				source: std::io::Error::new(std::io::ErrorKind::NotFound, "workspace root does not exist"),
			});
		}

		let walker = build_walker(&self.root);
		let mut files = Vec::new();
		let mut stats = DiscoveryStats::default();
		let mut last_emit = Instant::now();
		let mut saw_any_entry = false;

		for entry in walker {
			let entry = match entry {
				Ok(e) => e,
				Err(_) => continue, // individual read failures are logged upstream and excluded
			};

			if !entry.file_type().is_some_and(|ft| ft.is_file()) {
				continue;
			}
			saw_any_entry = true;

			let relative_path = relative_path_string(entry.path(), &self.root);
			let is_ignored = self.matcher.ignores(entry.path(), false);

			stats.files_seen += 1;
			let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);

			if is_ignored {
				stats.files_ignored += 1;
			} else {
				stats.bytes_seen += size_bytes;
				let language = detect_language(entry.path());
				let indexable = language.is_some() || is_generic_text_extension(entry.path());
				if indexable {
					stats.files_indexable += 1;
					files.push(FileRecord {
						absolute_path: entry.path().to_path_buf(),
						relative_path,
						language,
						size_bytes,
					});
				}
			}

			if stats.files_seen % self.progress_every_files == 0
				|| last_emit.elapsed() >= self.progress_every
			{
				sink.on_progress(&DiscoveryProgress {
					files_seen: stats.files_seen,
					files_ignored: stats.files_ignored,
					bytes_seen: stats.bytes_seen,
				});
				last_emit = Instant::now();
			}
		}

		stats.empty = !saw_any_entry;

		// Deterministic, reproducible ordering.
		files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

		sink.on_progress(&DiscoveryProgress {
			files_seen: stats.files_seen,
			files_ignored: stats.files_ignored,
			bytes_seen: stats.bytes_seen,
		});

		Ok((files, stats))
	}

	/// Cheaper variant for planning: counts only, no file list retained.
	pub fn stats(&self) -> CoreResult<ExtensionStats> {
		let walker = build_walker(&self.root);
		let mut out = ExtensionStats::default();

		for entry in walker {
			let entry = match entry {
				Ok(e) => e,
				Err(_) => continue,
			};
			if !entry.file_type().is_some_and(|ft| ft.is_file()) {
				continue;
			}
			if self.matcher.ignores(entry.path(), false) {
				continue;
			}
			let ext = entry
				.path()
				.extension()
				.and_then(|e| e.to_str())
				.unwrap_or("")
				.to_lowercase();
			out.total += 1;
			*out.by_extension.entry(ext).or_insert(0) += 1;
		}

		Ok(out)
	}
}

fn build_walker(root: &Path) -> ignore::Walk {
	let mut builder = ignore::WalkBuilder::new(root);
	builder
		.hidden(true)
		.git_ignore(true)
		.git_global(true)
		.git_exclude(true)
		.add_custom_ignore_filename(crate::ignore_matcher::TOOL_IGNORE_FILENAME);
	builder.build()
}

pub fn relative_path_string(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.to_string_lossy()
		.replace('\\', "/")
}

/// Extensions treated as generic text when no language grammar claims them
/// (§4.2: "supported language or ... generic text family").
fn is_generic_text_extension(path: &Path) -> bool {
	const GENERIC_TEXT_EXTENSIONS: &[&str] = &[
		"txt", "md", "markdown", "json", "yaml", "yml", "toml", "ini", "cfg", "conf", "xml", "html",
		"htm", "css", "csv", "sql",
	];
	path.extension()
		.and_then(|e| e.to_str())
		.map(|e| GENERIC_TEXT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
		.unwrap_or(false)
}
