// SPDX-License-Identifier: Apache-2.0

//! AST Parser (§4.3): stateless, per-call tree-sitter parsing with
//! recoverable-error reporting. A fresh `tree_sitter::Parser` is created per
//! call rather than pooled, mirroring the teacher's per-file parser usage —
//! tree-sitter parsers are cheap to construct and hold no state worth
//! reusing across files.

pub mod languages;

use tree_sitter::{Node, Tree};

use crate::error::{CoreError, CoreResult};

/// Result of parsing one file's contents.
pub struct ParseOutcome {
	pub tree: Tree,
	/// True if tree-sitter's error recovery kicked in anywhere in the tree
	/// (a syntax error was present but parsing still produced a usable
	/// tree) — §4.3: "recoverable errors are noted, not fatal".
	pub had_recoverable_errors: bool,
}

/// Parse `source` using the named language's grammar. Returns `Ok` even when
/// the source contains syntax errors, as long as tree-sitter could still
/// produce a tree (its error-recovery nodes absorb the unparseable region).
/// Only a parser-construction failure — an unsupported or misconfigured
/// grammar — is fatal.
pub fn parse(language: &str, source: &str) -> CoreResult<ParseOutcome> {
	let lang_impl = languages::get_language(language).ok_or_else(|| CoreError::ParseFatal {
		path: String::new(),
		language: language.to_string(),
	})?;

	let mut parser = tree_sitter::Parser::new();
	parser
		.set_language(&lang_impl.get_ts_language())
		.map_err(|_| CoreError::ParseFatal {
			path: String::new(),
			language: language.to_string(),
		})?;

	let tree = parser.parse(source, None).ok_or_else(|| CoreError::ParseFatal {
		path: String::new(),
		language: language.to_string(),
	})?;

	let had_recoverable_errors = tree.root_node().has_error();

	Ok(ParseOutcome {
		tree,
		had_recoverable_errors,
	})
}

/// Depth-first, document-order visitor used by the chunker to enumerate
/// candidate chunk-boundary nodes alongside their nesting depth.
pub fn walk_in_document_order<'a>(root: Node<'a>, mut visit: impl FnMut(Node<'a>, usize)) {
	fn recurse<'a>(node: Node<'a>, depth: usize, visit: &mut dyn FnMut(Node<'a>, usize)) {
		visit(node, depth);
		let mut cursor = node.walk();
		for child in node.children(&mut cursor) {
			recurse(child, depth + 1, visit);
		}
	}
	recurse(root, 0, &mut visit);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_well_formed_rust() {
		let outcome = parse("rust", "fn main() {}").unwrap();
		assert!(!outcome.had_recoverable_errors);
		assert_eq!(outcome.tree.root_node().kind(), "source_file");
	}

	#[test]
	fn malformed_source_still_produces_a_tree() {
		let outcome = parse("rust", "fn main( {{{ ???").unwrap();
		assert!(outcome.had_recoverable_errors);
	}

	#[test]
	fn unsupported_language_is_fatal() {
		assert!(parse("cobol", "IDENTIFICATION DIVISION.").is_err());
	}

	#[test]
	fn empty_source_parses_cleanly() {
		let outcome = parse("rust", "").unwrap();
		assert!(!outcome.had_recoverable_errors);
	}

	#[test]
	fn document_order_visits_parent_before_children() {
		let outcome = parse("rust", "fn a() { fn b() {} }").unwrap();
		let mut kinds = Vec::new();
		walk_in_document_order(outcome.tree.root_node(), |node, depth| {
			kinds.push((node.kind().to_string(), depth));
		});
		// root is always first and at depth 0.
		assert_eq!(kinds[0].1, 0);
		assert_eq!(kinds[0].0, "source_file");
	}
}
