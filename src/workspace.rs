// SPDX-License-Identifier: Apache-2.0

//! Workspace Identity (§4.12): a pure, deterministic mapping from a
//! workspace root to the collection name that owns its Indexed Points.

use std::path::Path;

use crate::constants::COLLECTION_PREFIX;

/// Derive the per-workspace collection name `code_context_<slug>`.
///
/// `slug` is the root's final path segment, lowercased, with any character
/// outside `[a-z0-9_-]` replaced by `_`. The mapping is pure: the same root
/// path always yields the same name, and distinct roots with distinct final
/// segments never collide on a blank slug (an empty segment falls back to
/// `workspace`).
pub fn collection_name_for(root: &Path) -> String {
	format!("{COLLECTION_PREFIX}{}", slugify_root(root))
}

fn slugify_root(root: &Path) -> String {
	let raw = root
		.file_name()
		.and_then(|s| s.to_str())
		.unwrap_or("workspace");

	let mut slug: String = raw
		.to_lowercase()
		.chars()
		.map(|c| {
			if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
				c
			} else {
				'_'
			}
		})
		.collect();

	if slug.is_empty() {
		slug.push_str("workspace");
	}

	slug
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;

	#[test]
	fn simple_name_lowercased() {
		assert_eq!(
			collection_name_for(&PathBuf::from("/home/user/MyProject")),
			"code_context_myproject"
		);
	}

	#[test]
	fn non_alnum_replaced() {
		assert_eq!(
			collection_name_for(&PathBuf::from("/srv/repos/Foo Bar (2).git")),
			"code_context_foo_bar__2__git"
		);
	}

	#[test]
	fn deterministic_across_calls() {
		let root = PathBuf::from("/a/b/c");
		assert_eq!(collection_name_for(&root), collection_name_for(&root));
	}

	#[test]
	fn distinct_roots_distinct_names() {
		let a = collection_name_for(&PathBuf::from("/a/b/repo-one"));
		let b = collection_name_for(&PathBuf::from("/a/b/repo-two"));
		assert_ne!(a, b);
	}

	#[test]
	fn root_with_no_file_name_falls_back() {
		assert_eq!(collection_name_for(&PathBuf::from("/")), "code_context_workspace");
	}
}
