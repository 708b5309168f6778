// SPDX-License-Identifier: Apache-2.0

//! Logging initialization: a project-hashed log directory under
//! `.code-context/logs`, JSON-formatted file layer, optional human-readable
//! stderr layer in debug mode. Progress events log at `debug`, phase
//! transitions at `info`, recoverable per-file/per-batch errors at `warn`,
//! fatal run errors at `error`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use sha2::{Digest, Sha256};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt::Layer, prelude::*, registry::Registry, EnvFilter};

static LOG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Initialize process-wide logging for a workspace rooted at `root`.
/// Idempotent-ish: safe to call once per process; a second call will fail
/// because `tracing` refuses a second global subscriber, which callers
/// should treat as non-fatal.
pub fn init_logging(root: &Path, debug_mode: bool) -> Result<(), anyhow::Error> {
	let project_hash = {
		let mut hasher = Sha256::new();
		hasher.update(root.to_string_lossy().as_bytes());
		format!("{:x}", hasher.finalize())[..12].to_string()
	};
	let project_name = root.file_name().and_then(|n| n.to_str()).unwrap_or("unknown");

	let log_dir = root.join(".code-context").join("logs").join(format!("{project_name}_{project_hash}"));
	std::fs::create_dir_all(&log_dir)?;
	let _ = LOG_DIR.set(log_dir.clone());

	let latest_file = root.join(".code-context").join("logs").join("latest.txt");
	if let Err(e) = std::fs::write(&latest_file, log_dir.to_string_lossy().as_bytes()) {
		eprintln!("warning: could not write latest log indicator: {e}");
	}

	let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "codectx.log");

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if debug_mode { "debug" } else { "info" }));

	let file_layer = Layer::new()
		.with_writer(file_appender)
		.with_ansi(false)
		.with_target(true)
		.with_file(true)
		.with_line_number(true)
		.with_thread_ids(true)
		.json();

	let console_layer = debug_mode.then(|| Layer::new().with_writer(std::io::stderr).with_ansi(true).with_target(false));

	let registry = Registry::default().with(file_layer).with(env_filter);
	if let Some(console) = console_layer {
		registry.with(console).init();
	} else {
		registry.init();
	}

	tracing::info!(
		root = %root.display(),
		project_name,
		log_directory = %log_dir.display(),
		debug_mode,
		"logging initialized"
	);
	Ok(())
}

pub fn log_directory() -> Option<PathBuf> {
	LOG_DIR.get().cloned()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn project_hash_is_stable_for_the_same_path() {
		let mut hasher = Sha256::new();
		hasher.update(Path::new("/workspace/demo").to_string_lossy().as_bytes());
		let a = format!("{:x}", hasher.finalize())[..12].to_string();

		let mut hasher = Sha256::new();
		hasher.update(Path::new("/workspace/demo").to_string_lossy().as_bytes());
		let b = format!("{:x}", hasher.finalize())[..12].to_string();

		assert_eq!(a, b);
	}
}
