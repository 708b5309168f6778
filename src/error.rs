// SPDX-License-Identifier: Apache-2.0

// Error taxonomy for the indexing & retrieval core.
//
// Each variant corresponds to one category from the error handling design:
// configuration and discovery failures are fatal at run start; file I/O,
// parse, oversize, embed and store failures are per-item and non-fatal to
// the run as a whole; dimension mismatch is fatal at collection creation;
// cancellation is a terminal state, not a failure.

use std::path::PathBuf;

/// A single error entry attached to a run's error log (§7: "category,
/// message, file?, line?").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorEntry {
	pub category: ErrorCategory,
	pub message: String,
	pub file: Option<String>,
	pub line: Option<usize>,
}

impl ErrorEntry {
	pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
		Self {
			category,
			message: message.into(),
			file: None,
			line: None,
		}
	}

	pub fn with_file(mut self, file: impl Into<String>) -> Self {
		self.file = Some(file.into());
		self
	}

	pub fn with_line(mut self, line: usize) -> Self {
		self.line = Some(line);
		self
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
	Configuration,
	Discovery,
	FileIo,
	Parse,
	ParseFatal,
	Oversize,
	Embed,
	Store,
	DimensionMismatch,
	Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
	#[error("configuration error: {0}")]
	Configuration(String),

	#[error("discovery failed: root {root} is unreadable: {source}")]
	Discovery {
		root: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("file I/O error reading {path}: {source}")]
	FileIo {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("file {path} appears to be binary (contains a null byte)")]
	BinaryFile { path: String },

	#[error("parser returned no tree for {path} ({language})")]
	ParseFatal { path: String, language: String },

	#[error("embedding batch failed: {0}")]
	Embed(String),

	#[error("vector store operation failed: {0}")]
	Store(String),

	#[error(
		"dimension mismatch: collection {collection} has dimension {existing}, embedder produces {requested}"
	)]
	DimensionMismatch {
		collection: String,
		existing: usize,
		requested: usize,
	},

	#[error("invalid query: {0}")]
	InvalidQuery(String),

	#[error("a run is already active for this workspace")]
	RunAlreadyActive,

	#[error("no run is active for this workspace")]
	NoActiveRun,

	#[error("run was cancelled")]
	Cancelled,
}

impl CoreError {
	/// The [`ErrorCategory`] a run-level failure should be logged and
	/// reported under (§7). Used by callers that only have a `CoreError` in
	/// hand and need to attribute it correctly, rather than guessing a
	/// single category for every fatal path.
	pub fn category(&self) -> ErrorCategory {
		match self {
			CoreError::Configuration(_) => ErrorCategory::Configuration,
			CoreError::Discovery { .. } => ErrorCategory::Discovery,
			CoreError::FileIo { .. } => ErrorCategory::FileIo,
			CoreError::BinaryFile { .. } => ErrorCategory::Parse,
			CoreError::ParseFatal { .. } => ErrorCategory::ParseFatal,
			CoreError::Embed(_) => ErrorCategory::Embed,
			CoreError::Store(_) => ErrorCategory::Store,
			CoreError::DimensionMismatch { .. } => ErrorCategory::DimensionMismatch,
			CoreError::InvalidQuery(_) => ErrorCategory::Configuration,
			CoreError::RunAlreadyActive | CoreError::NoActiveRun => ErrorCategory::Configuration,
			CoreError::Cancelled => ErrorCategory::Cancelled,
		}
	}
}

pub type CoreResult<T> = Result<T, CoreError>;
