//! JSON configuration and report helpers.

use crate::params::AnalysisParams;
use crate::pipeline::{AnalysisResult, PlaqueAnalyzer};
use crate::process::{CommandSpec, ProcessLocator, ProcessSegmenter};
use crate::store::BlobStore;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum AnalysisIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid analysis parameters: {0}")]
    InvalidParams(String),
}

/// Model commands, tunables and output location for one deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub locator: CommandSpec,
    pub segmenter: CommandSpec,
    #[serde(default)]
    pub params: AnalysisParams,
    /// Parent folder for new session directories.
    #[serde(default)]
    pub output_dir: Option<String>,
}

impl AnalysisConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, AnalysisIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), AnalysisIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the folder new sessions are created in.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("sessions"))
    }

    /// Validated pipeline parameters.
    pub fn build_params(&self) -> Result<AnalysisParams, ConfigError> {
        self.params.validate().map_err(ConfigError::InvalidParams)?;
        Ok(self.params.clone())
    }

    /// Build an analyzer backed by the configured model programs.
    pub fn build_analyzer(
        &self,
        store: impl BlobStore + 'static,
    ) -> Result<PlaqueAnalyzer, ConfigError> {
        let params = self.build_params()?;
        Ok(PlaqueAnalyzer::new(
            ProcessLocator::new(self.locator.clone()),
            ProcessSegmenter::new(self.segmenter.clone()),
            store,
            params,
        ))
    }
}

impl AnalysisResult {
    /// Load a JSON report from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, AnalysisIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), AnalysisIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBlobStore;

    #[test]
    fn minimal_config_uses_default_params() {
        let cfg: AnalysisConfig = serde_json::from_str(
            r#"{
                "locator": { "program": "locate-teeth", "args": ["--conf", "0.5"] },
                "segmenter": { "program": "segment-teeth" }
            }"#,
        )
        .expect("parse");
        assert_eq!(cfg.locator.args, vec!["--conf", "0.5"]);
        assert!(cfg.segmenter.args.is_empty());
        assert_eq!(cfg.params, AnalysisParams::default());
        assert_eq!(cfg.output_dir(), PathBuf::from("sessions"));
    }

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let cfg = AnalysisConfig {
            locator: CommandSpec::new("python3").arg("locate.py"),
            segmenter: CommandSpec::new("python3").arg("segment.py"),
            params: AnalysisParams {
                morph_kernel: 5,
                ..AnalysisParams::default()
            },
            output_dir: Some("/data/sessions".into()),
        };
        cfg.write_json(&path).expect("write");
        let back = AnalysisConfig::load_json(&path).expect("load");
        assert_eq!(back.locator, cfg.locator);
        assert_eq!(back.params.morph_kernel, 5);
        assert_eq!(back.output_dir(), PathBuf::from("/data/sessions"));
    }

    #[test]
    fn invalid_params_are_rejected_before_building() {
        let cfg = AnalysisConfig {
            locator: CommandSpec::new("a"),
            segmenter: CommandSpec::new("b"),
            params: AnalysisParams {
                morph_kernel: 0,
                ..AnalysisParams::default()
            },
            output_dir: None,
        };
        assert!(matches!(
            cfg.build_analyzer(MemoryBlobStore::new()),
            Err(ConfigError::InvalidParams(_))
        ));
    }

    #[test]
    fn missing_config_file_is_an_io_error() {
        let err = AnalysisConfig::load_json("/nonexistent/plaque.json").unwrap_err();
        assert!(matches!(err, AnalysisIoError::Io(_)));
    }
}
