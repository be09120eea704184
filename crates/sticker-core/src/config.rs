// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration, read from `config.toml`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::LabelType;
use crate::error::{Result, StickerError};
use crate::types::Backend;

/// Default location of the configuration file, relative to the working dir.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Persistent application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub printer: PrinterSection,
    pub ui: UiSection,
}

/// `[app]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub title: String,
    /// Label stock to use when the printer cannot report its media.
    pub label_type: Option<LabelType>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            title: "STICKER FACTORY".into(),
            label_type: None,
        }
    }
}

/// `[printer]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterSection {
    /// Backends tried during discovery, in order.
    pub backends: Vec<Backend>,
    /// Path or name of the `brother_ql` executable.
    pub brother_ql: String,
    /// Path or name of the `brother_ql_create` executable.
    pub brother_ql_create: String,
    pub discovery_timeout_secs: u64,
    pub status_timeout_secs: u64,
    /// Upper bound for a transmission; a successful print can legitimately
    /// take far longer than a status query.
    pub print_timeout_secs: u64,
}

impl Default for PrinterSection {
    fn default() -> Self {
        Self {
            backends: Backend::default_order(),
            brother_ql: "brother_ql".into(),
            brother_ql_create: "brother_ql_create".into(),
            discovery_timeout_secs: 5,
            status_timeout_secs: 10,
            print_timeout_secs: 120,
        }
    }
}

impl PrinterSection {
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }

    pub fn print_timeout(&self) -> Duration {
        Duration::from_secs(self.print_timeout_secs)
    }
}

/// `[ui]` table. Consumed by the front end only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSection {
    pub history_limit: usize,
    pub items_per_page: usize,
    pub queue_view: bool,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            history_limit: 15,
            items_per_page: 5,
            queue_view: true,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| StickerError::Config(e.to_string()))
    }

    /// Load the config file at `path`.
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.  A file that exists but does not parse is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let config = Self::from_toml_str(&text)?;
                info!(path = %path.display(), "configuration loaded");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(StickerError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        let config = AppConfig::from_toml_str("").expect("parse");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.printer.backends, vec![Backend::Pyusb, Backend::LinuxKernel]);
        assert!(config.app.label_type.is_none());
    }

    #[test]
    fn label_type_and_backends_parse() {
        let config = AppConfig::from_toml_str(
            r#"
            [app]
            label_type = "29"

            [printer]
            backends = ["linux_kernel"]
            status_timeout_secs = 3
            "#,
        )
        .expect("parse");
        assert_eq!(config.app.label_type, Some(LabelType::Mm29));
        assert_eq!(config.printer.backends, vec![Backend::LinuxKernel]);
        assert_eq!(config.printer.status_timeout(), Duration::from_secs(3));
        assert_eq!(config.printer.print_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn unsupported_label_type_is_rejected() {
        let err = AppConfig::from_toml_str("[app]\nlabel_type = \"63\"\n").unwrap_err();
        assert!(matches!(err, StickerError::Config(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig::load(dir.path().join("absent.toml")).expect("load");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "[app]\ntitle = \"LABELS\"").expect("write");
        let config = AppConfig::load(file.path()).expect("load");
        assert_eq!(config.app.title, "LABELS");
    }
}
