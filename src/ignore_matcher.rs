// SPDX-License-Identifier: Apache-2.0

//! Ignore Matcher (§4.1): compiles gitignore-syntax patterns from layered
//! sources into one predicate, `ignores(path) -> bool`.
//!
//! Sources are layered in priority order: built-in defaults first, then
//! `.gitignore`, then the tool-specific ignore file. Within gitignore
//! semantics the *last* matching pattern wins, including negation (`!foo`
//! re-includes a path an earlier pattern excluded) — this falls directly out
//! of handing every source's lines to one `ignore::gitignore::Gitignore` in
//! that order.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// Patterns every workspace ignores unless explicitly re-included by a later,
/// more specific source.
const BUILTIN_DEFAULTS: &[&str] = &[
	".git/",
	"node_modules/",
	"target/",
	"dist/",
	"build/",
	"vendor/",
	".venv/",
	"__pycache__/",
	"*.min.js",
	"*.min.css",
	"*.map",
	"*.lock",
];

/// The name of the tool-specific ignore file layered on top of `.gitignore`
/// (§3: "tool-specific ignore file").
pub const TOOL_IGNORE_FILENAME: &str = ".code-context-ignore";

/// A non-fatal failure encountered while loading one ignore source.
#[derive(Debug, Clone)]
pub struct IgnoreSourceWarning {
	pub source: String,
	pub message: String,
}

pub struct IgnoreMatcher {
	matcher: Gitignore,
	pub warnings: Vec<IgnoreSourceWarning>,
}

impl IgnoreMatcher {
	/// Build a matcher for `root`, layering built-in defaults, then
	/// `root/.gitignore`, then `root/.code-context-ignore`. Unreadable
	/// sources are skipped and recorded as a warning rather than failing the
	/// build — per §4.1, "failures reading an ignore source are non-fatal".
	pub fn build(root: &Path) -> Self {
		let mut builder = GitignoreBuilder::new(root);
		let mut warnings = Vec::new();

		for pattern in BUILTIN_DEFAULTS {
			if let Some(err) = builder.add_line(None, pattern) {
				warnings.push(IgnoreSourceWarning {
					source: "<builtin>".to_string(),
					message: err.to_string(),
				});
			}
		}

		let gitignore_path = root.join(".gitignore");
		if gitignore_path.exists() {
			if let Some(err) = builder.add(&gitignore_path) {
				warnings.push(IgnoreSourceWarning {
					source: ".gitignore".to_string(),
					message: err.to_string(),
				});
			}
		}

		let tool_ignore_path = root.join(TOOL_IGNORE_FILENAME);
		if tool_ignore_path.exists() {
			if let Some(err) = builder.add(&tool_ignore_path) {
				warnings.push(IgnoreSourceWarning {
					source: TOOL_IGNORE_FILENAME.to_string(),
					message: err.to_string(),
				});
			}
		}

		let matcher = match builder.build() {
			Ok(m) => m,
			Err(err) => {
				warnings.push(IgnoreSourceWarning {
					source: "<compile>".to_string(),
					message: err.to_string(),
				});
				// An empty matcher ignores nothing; discovery still runs.
				Gitignore::empty()
			}
		};

		Self { matcher, warnings }
	}

	/// Evaluate the predicate for a path relative to (or under) the root
	/// this matcher was built from. `is_dir` affects directory-suffixed
	/// patterns (`foo/` only matches directories).
	pub fn ignores(&self, path: &Path, is_dir: bool) -> bool {
		self.matcher.matched(path, is_dir).is_ignore()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::tempdir;

	#[test]
	fn builtin_defaults_ignore_node_modules() {
		let dir = tempdir().unwrap();
		let matcher = IgnoreMatcher::build(dir.path());
		assert!(matcher.ignores(&dir.path().join("node_modules/pkg/index.js"), false));
		assert!(!matcher.ignores(&dir.path().join("src/main.rs"), false));
	}

	#[test]
	fn negation_re_includes_after_exclude() {
		let dir = tempdir().unwrap();
		fs::write(dir.path().join(".gitignore"), "*.log\n!important.log\n").unwrap();
		let matcher = IgnoreMatcher::build(dir.path());
		assert!(matcher.ignores(&dir.path().join("debug.log"), false));
		assert!(!matcher.ignores(&dir.path().join("important.log"), false));
	}

	#[test]
	fn last_match_wins_across_sources() {
		let dir = tempdir().unwrap();
		// .gitignore excludes all .secret files; the tool-specific file
		// re-includes one. Since the tool file is added after .gitignore,
		// its rule must win.
		fs::write(dir.path().join(".gitignore"), "*.secret\n").unwrap();
		fs::write(dir.path().join(TOOL_IGNORE_FILENAME), "!keep.secret\n").unwrap();
		let matcher = IgnoreMatcher::build(dir.path());
		assert!(matcher.ignores(&dir.path().join("drop.secret"), false));
		assert!(!matcher.ignores(&dir.path().join("keep.secret"), false));
	}

	#[test]
	fn directory_suffixed_pattern_matches_only_directories() {
		let dir = tempdir().unwrap();
		fs::write(dir.path().join(".gitignore"), "build/\n").unwrap();
		let matcher = IgnoreMatcher::build(dir.path());
		assert!(matcher.ignores(&dir.path().join("build"), true));
		assert!(!matcher.ignores(&dir.path().join("build"), false));
	}

	#[test]
	fn missing_ignore_sources_are_non_fatal() {
		let dir = tempdir().unwrap();
		let matcher = IgnoreMatcher::build(dir.path());
		assert!(matcher.warnings.is_empty());
	}
}
