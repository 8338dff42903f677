//! Translator configuration.
//!
//! Looked up in order: an explicit path, `./rowpage.toml`, then
//! `<config dir>/rowpage/config.toml`. Missing files fall back to defaults.
//!
//! ```toml
//! dialect = "sqlserver"
//! paging = "row_number"
//! ranking_column = "__RowNumber__"
//! layout = "pretty"
//! prefer_top = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ast::COMPUTED_COLUMN;
use crate::error::{RowPageError, RowPageResult};
use crate::transpiler::Dialect;

pub const LOCAL_CONFIG: &str = "rowpage.toml";

/// How skip/take reach the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingStrategy {
    /// ROW_NUMBER() window over nested derived tables
    #[default]
    RowNumber,
    /// Native OFFSET/FETCH, left to another translator
    OffsetFetch,
}

impl std::fmt::Display for PagingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PagingStrategy::RowNumber => write!(f, "row_number"),
            PagingStrategy::OffsetFetch => write!(f, "offset_fetch"),
        }
    }
}

/// Text layout of the emitted statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One clause per line, nested selects indented by four spaces
    #[default]
    Pretty,
    /// Single line
    Compact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub dialect: Dialect,
    pub paging: PagingStrategy,
    /// Name of the synthetic ranking column
    pub ranking_column: String,
    /// Prefix of derived table aliases (`t`, `t0`, `t1`, ...)
    pub alias_prefix: String,
    pub layout: Layout,
    /// Use `TOP(n)` instead of a window when only take is present
    pub prefer_top: bool,
    /// Render the ordering a paged root select carries
    pub preserve_order: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            paging: PagingStrategy::default(),
            ranking_column: "__RowNumber__".to_string(),
            alias_prefix: "t".to_string(),
            layout: Layout::default(),
            prefer_top: true,
            preserve_order: false,
        }
    }
}

impl TranslatorConfig {
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> RowPageResult<Self> {
        let config: TranslatorConfig =
            toml::from_str(content).map_err(|e| RowPageError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from the first default location that exists.
    pub fn load(path: Option<&Path>) -> RowPageResult<Self> {
        let candidate = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_locations().into_iter().find(|p| p.exists()),
        };
        match candidate {
            Some(path) => {
                tracing::debug!("loading config from {}", path.display());
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    RowPageError::Config(format!("failed to read '{}': {}", path.display(), e))
                })?;
                Self::from_toml(&content)
            }
            None => Ok(Self::default()),
        }
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(LOCAL_CONFIG)];
        if let Some(dir) = dirs::config_dir() {
            locations.push(dir.join("rowpage").join("config.toml"));
        }
        locations
    }

    fn validate(&self) -> RowPageResult<()> {
        if self.ranking_column.is_empty() {
            return Err(RowPageError::Config("ranking_column must not be empty".into()));
        }
        if self.ranking_column.eq_ignore_ascii_case(COMPUTED_COLUMN) {
            return Err(RowPageError::Config(format!(
                "ranking_column '{}' collides with the marker column",
                self.ranking_column
            )));
        }
        if self.alias_prefix.is_empty()
            || !self.alias_prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(RowPageError::Config(format!(
                "alias_prefix '{}' must be a non-empty identifier",
                self.alias_prefix
            )));
        }
        Ok(())
    }
}
