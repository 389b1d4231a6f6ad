//! CLI runner for common setup and operations.
//!
//! Encapsulates logging initialization, config loading and input file
//! handling to reduce duplication across command handlers.

use std::path::{Path, PathBuf};

use tracing::info;

use lowcloud::catalog::{CatalogQuery, CatalogSource, ImageRecord, JsonCatalog};
use lowcloud::config::{ConfigFile, DEFAULT_LOG_FILE_NAME};
use lowcloud::geo::{PolygonDocument, Roi};
use lowcloud::logging::{init_logging_full, LoggingGuard};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner with optional debug logging.
    ///
    /// When stdout is a TTY, stdout logging is disabled so log lines do not
    /// interleave with progress output and control input.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        Self::new(debug_mode, true)
    }

    /// Create a new CLI runner.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    /// * `stdout_logs` - When false, log lines never reach stdout, even when
    ///   it is piped. Machine-readable output relies on this.
    pub fn new(debug_mode: bool, stdout_logs: bool) -> Result<Self, CliError> {
        // Load config file (or use defaults if not present)
        let config = ConfigFile::load()?;

        // Use log path from config
        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_LOG_FILE_NAME.to_string());

        let stdout_enabled = stdout_logs && !atty::is(atty::Stream::Stdout);

        let logging_guard = init_logging_full(&log_dir, &log_file, stdout_enabled, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("lowcloud v{}", lowcloud::VERSION);
        info!("lowcloud CLI: {} command", command);
    }

    /// Load the region of interest from a polygon document.
    ///
    /// The region name is, in order: `name`, `[paths] roi_name`, the file
    /// stem.
    pub fn load_roi(&self, path: &Path, name: Option<&str>) -> Result<Roi, CliError> {
        let input_error = |reason: String| CliError::Input {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| input_error(e.to_string()))?;
        let document: PolygonDocument =
            serde_json::from_str(&content).map_err(|e| input_error(e.to_string()))?;
        let polygon = document
            .polygon()
            .map_err(|e| input_error(e.to_string()))?;

        let name = name
            .map(str::to_string)
            .or_else(|| self.config.paths.roi_name.clone())
            .or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().to_string())
            })
            .ok_or_else(|| input_error("cannot derive a region name".to_string()))?;

        info!(roi = %name, area_km2 = polygon.area_km2(), "region of interest loaded");
        Ok(Roi::new(name, polygon))
    }

    /// Open a catalog document.
    pub fn open_catalog(&self, path: &Path) -> Result<JsonCatalog, CliError> {
        let catalog = JsonCatalog::open(path)?;
        info!(
            path = %path.display(),
            records = catalog.records().len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Open a catalog document and run `query` against it.
    pub fn query_catalog(
        &self,
        path: &Path,
        query: &CatalogQuery,
    ) -> Result<Vec<ImageRecord>, CliError> {
        Ok(self.open_catalog(path)?.query(query)?)
    }

    /// Directory of pre-downloaded previews: `--previews`, then
    /// `[preview] source_dir`.
    pub fn preview_dir(&self, arg: Option<PathBuf>) -> Result<PathBuf, CliError> {
        arg.or_else(|| self.config.preview.source_dir.clone())
            .ok_or_else(|| {
                CliError::Config(
                    "no preview directory. Use --previews or set [preview] source_dir."
                        .to_string(),
                )
            })
    }
}
