mod file_config;

pub use file_config::{FileConfig, SettingsConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    /// Password gating collection export. Export is refused when unset.
    pub admin_password: Option<String>,
    pub settings: CollectionSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    RecentlyAdded,
    Name,
    ReleaseDate,
}

/// App-wide display settings handed to the server at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSettings {
    pub show_edition_notes: bool,
    pub show_purchase_dates: bool,
    pub show_store_links: bool,
    pub default_sort: SortOrder,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            show_edition_notes: true,
            show_purchase_dates: true,
            show_store_links: true,
            default_sort: SortOrder::RecentlyAdded,
        }
    }
}

impl CollectionSettings {
    fn resolve(file: Option<SettingsConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let default_sort = match file.default_sort {
            Some(s) => match SortOrder::from_str(&s, true) {
                Ok(sort) => sort,
                Err(_) => bail!("Unknown default_sort in config file: {}", s),
            },
            None => defaults.default_sort,
        };

        Ok(Self {
            show_edition_notes: file
                .show_edition_notes
                .unwrap_or(defaults.show_edition_notes),
            show_purchase_dates: file
                .show_purchase_dates
                .unwrap_or(defaults.show_purchase_dates),
            show_store_links: file.show_store_links.unwrap_or(defaults.show_store_links),
            default_sort,
        })
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let admin_password = file
            .admin_password
            .or_else(|| cli.admin_password.clone())
            .filter(|p| !p.is_empty());

        let settings = CollectionSettings::resolve(file.settings)?;

        Ok(Self {
            db_dir,
            port,
            logging_level,
            frontend_dir_path,
            admin_password,
            settings,
        })
    }

    pub fn collection_db_path(&self) -> PathBuf {
        self.db_dir.join("collection.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
