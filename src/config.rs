// SPDX-License-Identifier: Apache-2.0

//! Per-workspace configuration: a struct-of-structs TOML file at
//! `.code-context/config.toml`, falling back to defaults when absent, with
//! embedder API keys overridable from the environment after file load.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::constants::{
	DEFAULT_DEBOUNCE_MILLIS, DEFAULT_MAX_TOKENS_PER_EMBED_BATCH, DEFAULT_MAX_WINDOW_CHUNKS, DEFAULT_OVERSIZE_CEILING_BYTES,
	DEFAULT_SEARCH_TOP_K, DEFAULT_UPSERT_BATCH_SIZE, DEFAULT_WINDOW_LINES,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
	/// Ignore patterns applied in addition to `.gitignore`/`.noindex`.
	pub extra_ignore_patterns: Vec<String>,
	pub follow_symlinks: bool,
}

impl Default for DiscoveryConfig {
	fn default() -> Self {
		Self {
			extra_ignore_patterns: Vec::new(),
			follow_symlinks: false,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
	pub oversize_ceiling_bytes: usize,
	pub window_lines: usize,
	pub max_window_chunks: usize,
}

impl Default for ChunkerConfig {
	fn default() -> Self {
		Self {
			oversize_ceiling_bytes: DEFAULT_OVERSIZE_CEILING_BYTES,
			window_lines: DEFAULT_WINDOW_LINES,
			max_window_chunks: DEFAULT_MAX_WINDOW_CHUNKS,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
	/// `None` defers to [`crate::worker::default_worker_count`].
	pub worker_count: Option<usize>,
	pub upsert_batch_size: usize,
	pub max_tokens_per_embed_batch: usize,
}

impl Default for WorkerConfig {
	fn default() -> Self {
		Self {
			worker_count: None,
			upsert_batch_size: DEFAULT_UPSERT_BATCH_SIZE,
			max_tokens_per_embed_batch: DEFAULT_MAX_TOKENS_PER_EMBED_BATCH,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
	pub debounce_millis: u64,
}

impl Default for WatcherConfig {
	fn default() -> Self {
		Self {
			debounce_millis: DEFAULT_DEBOUNCE_MILLIS,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
	pub top_k: usize,
}

impl Default for SearchConfig {
	fn default() -> Self {
		Self { top_k: DEFAULT_SEARCH_TOP_K }
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderConfig {
	/// "hash" for the deterministic local embedder, "http" for a real
	/// provider (§4.5).
	pub provider: String,
	pub endpoint: Option<String>,
	pub api_key: Option<String>,
	pub model: String,
	pub dimension: usize,
}

impl Default for EmbedderConfig {
	fn default() -> Self {
		Self {
			provider: "hash".to_string(),
			endpoint: None,
			api_key: None,
			model: "hash-local".to_string(),
			dimension: 256,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	#[serde(default = "default_version")]
	pub version: u32,
	#[serde(default)]
	pub discovery: DiscoveryConfig,
	#[serde(default)]
	pub chunker: ChunkerConfig,
	#[serde(default)]
	pub worker: WorkerConfig,
	#[serde(default)]
	pub watcher: WatcherConfig,
	#[serde(default)]
	pub search: SearchConfig,
	#[serde(default)]
	pub embedder: EmbedderConfig,
}

fn default_version() -> u32 {
	1
}

impl Default for Config {
	fn default() -> Self {
		Self {
			version: default_version(),
			discovery: DiscoveryConfig::default(),
			chunker: ChunkerConfig::default(),
			worker: WorkerConfig::default(),
			watcher: WatcherConfig::default(),
			search: SearchConfig::default(),
			embedder: EmbedderConfig::default(),
		}
	}
}

impl Config {
	/// Load `.code-context/config.toml` from `root`, falling back to
	/// defaults when absent. Environment variables take precedence over the
	/// file for the embedder API key.
	pub fn load(root: &Path) -> Result<Self> {
		let config_path = Self::workspace_config_path(root);
		let mut config = if config_path.exists() {
			let content = fs::read_to_string(&config_path)?;
			toml::from_str(&content)?
		} else {
			Self::default()
		};

		if let Ok(api_key) = std::env::var("CODECTX_EMBEDDER_API_KEY") {
			config.embedder.api_key = Some(api_key);
		}

		Ok(config)
	}

	pub fn save(&self, root: &Path) -> Result<()> {
		let config_path = Self::workspace_config_path(root);
		if let Some(parent) = config_path.parent() {
			if !parent.exists() {
				fs::create_dir_all(parent)?;
			}
		}
		fs::write(config_path, toml::to_string_pretty(self)?)?;
		Ok(())
	}

	pub fn workspace_config_path(root: &Path) -> PathBuf {
		root.join(".code-context").join("config.toml")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn default_config_has_sensible_values() {
		let config = Config::default();
		assert_eq!(config.version, 1);
		assert_eq!(config.chunker.oversize_ceiling_bytes, DEFAULT_OVERSIZE_CEILING_BYTES);
		assert_eq!(config.embedder.provider, "hash");
	}

	#[test]
	fn load_without_a_config_file_returns_defaults() {
		let dir = tempdir().unwrap();
		let config = Config::load(dir.path()).unwrap();
		assert_eq!(config.search.top_k, DEFAULT_SEARCH_TOP_K);
	}

	#[test]
	fn save_then_load_round_trips() {
		let dir = tempdir().unwrap();
		let mut config = Config::default();
		config.search.top_k = 7;
		config.save(dir.path()).unwrap();

		let loaded = Config::load(dir.path()).unwrap();
		assert_eq!(loaded.search.top_k, 7);
	}

	#[test]
	fn env_var_overrides_the_configured_api_key() {
		let dir = tempdir().unwrap();
		let mut config = Config::default();
		config.embedder.api_key = Some("from-file".to_string());
		config.save(dir.path()).unwrap();

		// SAFETY: test-only, single-threaded within this test's lifetime.
		unsafe { std::env::set_var("CODECTX_EMBEDDER_API_KEY", "from-env") };
		let loaded = Config::load(dir.path()).unwrap();
		unsafe { std::env::remove_var("CODECTX_EMBEDDER_API_KEY") };

		assert_eq!(loaded.embedder.api_key.as_deref(), Some("from-env"));
	}
}
