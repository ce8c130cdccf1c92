//! # Composer CLI
//!
//! Headless host for the composer editor.
//!
//! ## Usage
//!
//! ```bash
//! composer --data-dir ./projects new launch-video --aspect-ratio 9:16 --scenes 3
//! composer --data-dir ./projects apply launch-video edits.json
//! composer --data-dir ./projects inspect launch-video
//! ```
//!
//! ## Layout
//!
//! Each project is stored as `<name>.json` in the data directory. Scene
//! records written by the persistence task live next to it in
//! `<name>.scenes/`, one file per scene, and can rebuild the project with
//! `recover`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub mod commands;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use composer_core::{AspectRatio, EditorConfig};
use composer_sync::SyncConfig;
use thiserror::Error;

pub use commands::{
    apply_script, create_project, load_project, recover_project, save_project, summarize,
    ApplyReport,
};

/// Command-line arguments for the `composer` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "composer")]
#[command(about = "Composer scene-graph editor, headless")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding project documents and scene records
    #[arg(long, env = "COMPOSER_DATA_DIR", default_value = "composer-data")]
    pub data_dir: PathBuf,

    /// Alignment snap threshold in canvas pixels
    #[arg(long, env = "COMPOSER_SNAP_THRESHOLD")]
    pub snap_threshold: Option<f32>,

    /// Maximum undo depth (unlimited when unset)
    #[arg(long, env = "COMPOSER_HISTORY_LIMIT")]
    pub history_limit: Option<usize>,

    /// Quiet period before a changed scene is written, in milliseconds
    #[arg(long, env = "COMPOSER_SYNC_DEBOUNCE_MS")]
    pub debounce_ms: Option<u64>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Create a project with empty scenes
    New {
        /// Project name (letters, digits, `-` and `_`)
        name: String,
        /// Canvas aspect ratio: 16:9, 9:16, 1:1 or 4:3
        #[arg(long, default_value = "16:9")]
        aspect_ratio: AspectRatio,
        /// Number of scenes to start with
        #[arg(long, default_value_t = 1)]
        scenes: usize,
    },
    /// Replay a JSON array of editor commands against a project
    Apply {
        /// Project name
        name: String,
        /// Path to the command script
        script: PathBuf,
    },
    /// Print a project summary
    Inspect {
        /// Project name
        name: String,
        /// Print the full document instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Rebuild a project document from its scene records
    Recover {
        /// Project name
        name: String,
    },
}

/// Errors specific to the command-line host.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// Project names become file names and must stay inside the data directory.
    #[error("Invalid project name `{0}`: use letters, digits, `-` and `_`")]
    InvalidName(String),

    /// `new` refuses to overwrite.
    #[error("Project already exists: {0}")]
    ProjectExists(PathBuf),
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// Data directory.
    pub data_dir: PathBuf,
    /// Editor settings. The aspect ratio is replaced by the project's own.
    pub editor: EditorConfig,
    /// Persistence settings.
    pub sync: SyncConfig,
}

impl CliConfig {
    /// Create a configuration with default settings rooted at `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            editor: EditorConfig::default(),
            sync: SyncConfig::default(),
        }
    }

    /// Path of a project's document.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::InvalidName`] for names that are not plain file stems.
    pub fn project_path(&self, name: &str) -> Result<PathBuf, CliError> {
        validate_name(name)?;
        Ok(self.data_dir.join(format!("{name}.json")))
    }

    /// Directory of a project's scene records.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::InvalidName`] for names that are not plain file stems.
    pub fn scenes_dir(&self, name: &str) -> Result<PathBuf, CliError> {
        validate_name(name)?;
        Ok(self.data_dir.join(format!("{name}.scenes")))
    }

    /// Data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        let mut config = Self::new(args.data_dir.clone());
        if let Some(threshold) = args
            .snap_threshold
            .filter(|t| t.is_finite() && *t >= 0.0)
        {
            config.editor.snap_threshold = threshold;
        }
        config.editor.history_limit = args.history_limit.filter(|limit| *limit > 0);
        if let Some(debounce_ms) = args.debounce_ms {
            config.sync = SyncConfig::with_debounce_ms(debounce_ms);
        }
        config
    }
}

fn validate_name(name: &str) -> Result<(), CliError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CliError::InvalidName(name.to_string()))
    }
}
