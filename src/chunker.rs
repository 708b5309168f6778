// SPDX-License-Identifier: Apache-2.0

//! Chunker (§4.4): turns one file's parsed syntax tree into a sequence of
//! [`CodeChunk`]s in document order, falling back to fixed-size line windows
//! for unsupported languages, grammars with no meaningful node kinds, and
//! oversized files.

use tree_sitter::Node;

use crate::chunk::{ChunkKind, CodeChunk};
use crate::constants::{DEFAULT_MAX_WINDOW_CHUNKS, DEFAULT_OVERSIZE_CEILING_BYTES, DEFAULT_WINDOW_LINES};
use crate::parsing::{self, languages};

/// Produce chunks for one file's content. `relative_path` is used only to
/// stamp the resulting chunks; it plays no role in chunking itself.
pub fn chunk_file(relative_path: &str, language: Option<&'static str>, content: &str) -> Vec<CodeChunk> {
	if content.trim().is_empty() {
		return Vec::new();
	}

	if content.len() > DEFAULT_OVERSIZE_CEILING_BYTES {
		return window_chunks(relative_path, language, content);
	}

	if let Some(lang_name) = language {
		if let Ok(outcome) = parsing::parse(lang_name, content) {
			if let Some(lang_impl) = languages::get_language(lang_name) {
				let mut chunks = Vec::new();
				collect_ast_chunks(
					outcome.tree.root_node(),
					content,
					lang_impl.as_ref(),
					relative_path,
					language,
					&mut chunks,
				);
				if !chunks.is_empty() {
					return chunks;
				}
				// Grammar parsed fine but produced no meaningful nodes
				// (e.g. a file of only comments/imports) — fall through to
				// a module-level chunk below rather than windows, since the
				// file is well within the oversize ceiling.
				return vec![module_fallback_chunk(relative_path, language, content)];
			}
		}
	}

	// Unsupported language, or a grammar with no meaningful kinds at all:
	// treat the whole file as one module chunk (§4.4: "module-fallback for
	// low-grammar languages").
	vec![module_fallback_chunk(relative_path, language, content)]
}

fn collect_ast_chunks(
	node: Node,
	source: &str,
	lang_impl: &dyn languages::Language,
	relative_path: &str,
	language: Option<&'static str>,
	out: &mut Vec<CodeChunk>,
) {
	collect_ast_chunks_at_depth(node, source, lang_impl, relative_path, language, 0, out);
}

fn collect_ast_chunks_at_depth(
	node: Node,
	source: &str,
	lang_impl: &dyn languages::Language,
	relative_path: &str,
	language: Option<&'static str>,
	depth: usize,
	out: &mut Vec<CodeChunk>,
) {
	if let Some(kind) = lang_impl.classify(node) {
		if let Some(chunk) = chunk_from_node(node, source, kind, lang_impl, relative_path, language, depth) {
			out.push(chunk);
		}
		// Do not descend further: a matched node's own internals (e.g. a
		// method's body) are not separately chunked, keeping chunks
		// non-overlapping.
		return;
	}

	let mut cursor = node.walk();
	for child in node.children(&mut cursor) {
		collect_ast_chunks_at_depth(child, source, lang_impl, relative_path, language, depth + 1, out);
	}
}

fn chunk_from_node(
	node: Node,
	source: &str,
	kind: ChunkKind,
	lang_impl: &dyn languages::Language,
	relative_path: &str,
	language: Option<&'static str>,
	depth: usize,
) -> Option<CodeChunk> {
	let content = node.utf8_text(source.as_bytes()).ok()?.to_string();
	if content.trim().is_empty() {
		return None;
	}

	Some(CodeChunk {
		relative_path: relative_path.to_string(),
		kind,
		symbol: lang_impl.extract_name(node, source),
		language,
		start_line: node.start_position().row + 1,
		end_line: node.end_position().row + 1,
		content,
		depth,
	})
}

fn module_fallback_chunk(relative_path: &str, language: Option<&'static str>, content: &str) -> CodeChunk {
	CodeChunk {
		relative_path: relative_path.to_string(),
		kind: ChunkKind::Module,
		symbol: None,
		language,
		start_line: 1,
		end_line: content.lines().count().max(1),
		content: content.to_string(),
		depth: 0,
	}
}

/// Split `content` into fixed-size, non-overlapping line windows, capped at
/// `DEFAULT_MAX_WINDOW_CHUNKS` (§4.4 item 3: the oversized-file fallback).
/// Any remainder beyond the cap is silently dropped from indexing, not
/// truncated mid-window.
fn window_chunks(relative_path: &str, language: Option<&'static str>, content: &str) -> Vec<CodeChunk> {
	let lines: Vec<&str> = content.lines().collect();
	if lines.is_empty() {
		return Vec::new();
	}

	let mut chunks = Vec::new();
	for (window_index, window) in lines.chunks(DEFAULT_WINDOW_LINES).enumerate() {
		if window_index >= DEFAULT_MAX_WINDOW_CHUNKS {
			break;
		}
		let window_text = window.join("\n");
		if window_text.trim().is_empty() {
			continue;
		}
		let start_line = window_index * DEFAULT_WINDOW_LINES + 1;
		chunks.push(CodeChunk {
			relative_path: relative_path.to_string(),
			kind: ChunkKind::TextWindow,
			symbol: None,
			language,
			start_line,
			end_line: start_line + window.len() - 1,
			content: window_text,
			depth: 0,
		});
	}
	chunks
}
