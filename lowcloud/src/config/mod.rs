//! User configuration.
//!
//! The configuration lives in `~/.lowcloud/config.ini` and is split by
//! concern:
//!
//! - `settings` holds one plain struct per `[section]`
//! - `defaults` provides `ConfigFile::default()` and the constants behind it
//! - `parser` maps INI keys onto the structs
//! - `writer` renders the commented INI written by `config init`
//!
//! A loaded [`ConfigFile`] converts into the run-level
//! [`SearchConfig`](crate::search::SearchConfig) via
//! [`ConfigFile::search_config`].

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{DEFAULT_LOG_FILE_NAME, MAX_COVERAGE_SAMPLES};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, LoggingSettings, PathsSettings, PreviewSettings, SearchSettings,
    ToolchainSettings,
};
