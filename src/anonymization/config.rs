//! Anonymization configuration

use crate::anonymization::models::EntityType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// How dates are rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRedactionPolicy {
    /// Replace the whole date with its code
    #[default]
    Full,
    /// Keep the 4-digit year after the code (`[DATE_A] 1978`)
    KeepYear,
}

impl std::str::FromStr for DateRedactionPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "full" => Ok(Self::Full),
            "keep_year" | "keepyear" => Ok(Self::KeepYear),
            _ => anyhow::bail!("Invalid date redaction policy: {s}"),
        }
    }
}

/// Anonymization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    /// Register the broad catch-all numeric recognizer
    #[serde(default)]
    pub enable_catch_all_numeric: bool,

    /// Date rewrite policy
    #[serde(default)]
    pub date_redaction_policy: DateRedactionPolicy,

    /// Shortest capitalized word the fuzzy deep scan will consider
    #[serde(default = "default_min_fuzzy_name_length")]
    pub min_fuzzy_name_length: usize,

    /// Words that are never treated as PII (case-insensitive)
    #[serde(default)]
    pub user_exclusion_words: Vec<String>,

    /// Words that are always treated as PII, with their type
    #[serde(default)]
    pub user_inclusion_words: BTreeMap<String, EntityType>,

    /// Dry-run mode (detect but don't rewrite)
    #[serde(default)]
    pub dry_run: bool,

    /// Path to pattern library TOML file
    pub pattern_library: Option<PathBuf>,

    /// Path to a newline-separated spell-check word list
    pub dictionary_path: Option<PathBuf>,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Orchestration configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Audit logging configuration
    #[serde(default)]
    pub audit: AuditConfig,
}

fn default_min_fuzzy_name_length() -> usize {
    3
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        Self {
            enable_catch_all_numeric: false,
            date_redaction_policy: DateRedactionPolicy::Full,
            min_fuzzy_name_length: default_min_fuzzy_name_length(),
            user_exclusion_words: Vec::new(),
            user_inclusion_words: BTreeMap::new(),
            dry_run: false,
            pattern_library: None,
            dictionary_path: None,
            chunking: ChunkingConfig::default(),
            pipeline: PipelineConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl AnonymizationConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref path) = self.pattern_library {
            if !path.exists() {
                anyhow::bail!("Pattern library file not found: {}", path.display());
            }
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                anyhow::bail!("Pattern library must be a TOML file: {}", path.display());
            }
        }

        if let Some(ref path) = self.dictionary_path {
            if !path.exists() {
                anyhow::bail!("Dictionary file not found: {}", path.display());
            }
        }

        if self.min_fuzzy_name_length == 0 {
            anyhow::bail!("min_fuzzy_name_length must be at least 1");
        }

        for word in self.user_inclusion_words.keys() {
            if word.trim().is_empty() {
                anyhow::bail!("user_inclusion_words cannot contain an empty word");
            }
        }

        self.chunking
            .validate()
            .context("Invalid chunking configuration")?;
        self.pipeline
            .validate()
            .context("Invalid pipeline configuration")?;
        self.audit.validate().context("Invalid audit configuration")?;

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("CLINANON_ANONYMIZATION_ENABLE_CATCH_ALL_NUMERIC") {
            self.enable_catch_all_numeric = val
                .parse()
                .context("Invalid CLINANON_ANONYMIZATION_ENABLE_CATCH_ALL_NUMERIC value")?;
        }

        if let Ok(val) = std::env::var("CLINANON_ANONYMIZATION_DATE_REDACTION_POLICY") {
            self.date_redaction_policy = val.parse()?;
        }

        if let Ok(val) = std::env::var("CLINANON_ANONYMIZATION_MIN_FUZZY_NAME_LENGTH") {
            self.min_fuzzy_name_length = val
                .parse()
                .context("Invalid CLINANON_ANONYMIZATION_MIN_FUZZY_NAME_LENGTH value")?;
        }

        if let Ok(val) = std::env::var("CLINANON_ANONYMIZATION_USER_EXCLUSION_WORDS") {
            self.user_exclusion_words = val
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(val) = std::env::var("CLINANON_ANONYMIZATION_DRY_RUN") {
            self.dry_run = val
                .parse()
                .context("Invalid CLINANON_ANONYMIZATION_DRY_RUN value")?;
        }

        if let Ok(val) = std::env::var("CLINANON_ANONYMIZATION_PATTERN_LIBRARY") {
            self.pattern_library = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("CLINANON_ANONYMIZATION_DICTIONARY_PATH") {
            self.dictionary_path = Some(PathBuf::from(val));
        }

        self.chunking.apply_env_overrides()?;
        self.pipeline.apply_env_overrides()?;
        self.audit.apply_env_overrides()?;

        Ok(())
    }
}

/// Chunking configuration (sizes in UTF-16 units)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk length
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap shared with each neighbour
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// How far back from the ideal cut to look for a sentence or line break
    #[serde(default = "default_boundary_search_window")]
    pub boundary_search_window: usize,
}

fn default_chunk_size() -> usize {
    4000
}

fn default_overlap() -> usize {
    200
}

fn default_boundary_search_window() -> usize {
    500
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            boundary_search_window: default_boundary_search_window(),
        }
    }
}

impl ChunkingConfig {
    /// Validate chunking configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than 0");
        }
        if self.overlap >= self.chunk_size {
            anyhow::bail!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap,
                self.chunk_size
            );
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("CLINANON_ANONYMIZATION_CHUNK_SIZE") {
            self.chunk_size = val
                .parse()
                .context("Invalid CLINANON_ANONYMIZATION_CHUNK_SIZE value")?;
        }

        if let Ok(val) = std::env::var("CLINANON_ANONYMIZATION_CHUNK_OVERLAP") {
            self.overlap = val
                .parse()
                .context("Invalid CLINANON_ANONYMIZATION_CHUNK_OVERLAP value")?;
        }

        Ok(())
    }
}

/// Orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum chunks recognized at the same time
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Run the deep scan after anonymization
    #[serde(default)]
    pub deep_scan: bool,

    /// Confidence threshold passed to an external detector
    #[serde(default = "default_detector_threshold")]
    pub detector_threshold: f32,

    /// Lower threshold used for the deep-scan tagger pass
    #[serde(default = "default_deep_scan_threshold")]
    pub deep_scan_threshold: f32,

    /// Names shorter than this use `fuzzy_short_distance`
    #[serde(default = "default_fuzzy_long_name_length")]
    pub fuzzy_long_name_length: usize,

    /// Maximum edit distance for short known names
    #[serde(default = "default_fuzzy_short_distance")]
    pub fuzzy_short_distance: usize,

    /// Maximum edit distance for long known names
    #[serde(default = "default_fuzzy_long_distance")]
    pub fuzzy_long_distance: usize,

    /// Compiled size cap, in bytes, for the combined name and entity matchers
    #[serde(default = "default_matcher_size_limit")]
    pub matcher_size_limit: usize,
}

fn default_max_concurrency() -> usize {
    4
}

fn default_detector_threshold() -> f32 {
    0.5
}

fn default_deep_scan_threshold() -> f32 {
    0.3
}

fn default_fuzzy_long_name_length() -> usize {
    6
}

fn default_fuzzy_short_distance() -> usize {
    1
}

fn default_fuzzy_long_distance() -> usize {
    2
}

fn default_matcher_size_limit() -> usize {
    crate::anonymization::matcher::DEFAULT_SIZE_LIMIT
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            deep_scan: false,
            detector_threshold: default_detector_threshold(),
            deep_scan_threshold: default_deep_scan_threshold(),
            fuzzy_long_name_length: default_fuzzy_long_name_length(),
            fuzzy_short_distance: default_fuzzy_short_distance(),
            fuzzy_long_distance: default_fuzzy_long_distance(),
            matcher_size_limit: default_matcher_size_limit(),
        }
    }
}

impl PipelineConfig {
    /// Validate pipeline configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            anyhow::bail!("max_concurrency must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.detector_threshold) {
            anyhow::bail!("detector_threshold must be between 0.0 and 1.0");
        }
        if !(0.0..=1.0).contains(&self.deep_scan_threshold) {
            anyhow::bail!("deep_scan_threshold must be between 0.0 and 1.0");
        }
        if self.matcher_size_limit == 0 {
            anyhow::bail!("matcher_size_limit must be at least 1");
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("CLINANON_ANONYMIZATION_MAX_CONCURRENCY") {
            self.max_concurrency = val
                .parse()
                .context("Invalid CLINANON_ANONYMIZATION_MAX_CONCURRENCY value")?;
        }

        if let Ok(val) = std::env::var("CLINANON_ANONYMIZATION_DEEP_SCAN") {
            self.deep_scan = val
                .parse()
                .context("Invalid CLINANON_ANONYMIZATION_DEEP_SCAN value")?;
        }

        Ok(())
    }
}

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging
    #[serde(default)]
    pub enabled: bool,

    /// Audit log file path
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// Use JSON format for audit logs
    #[serde(default = "default_audit_json_format")]
    pub json_format: bool,
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/anonymization.log")
}

fn default_audit_json_format() -> bool {
    true
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
            json_format: default_audit_json_format(),
        }
    }
}

impl AuditConfig {
    /// Validate audit configuration
    pub fn validate(&self) -> Result<()> {
        if self.enabled {
            if let Some(parent) = self.log_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!(
                            "Failed to create audit log directory: {}",
                            parent.display()
                        )
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("CLINANON_ANONYMIZATION_AUDIT_ENABLED") {
            self.enabled = val
                .parse()
                .context("Invalid CLINANON_ANONYMIZATION_AUDIT_ENABLED value")?;
        }

        if let Ok(val) = std::env::var("CLINANON_ANONYMIZATION_AUDIT_LOG_PATH") {
            self.log_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("CLINANON_ANONYMIZATION_AUDIT_JSON_FORMAT") {
            self.json_format = val
                .parse()
                .context("Invalid CLINANON_ANONYMIZATION_AUDIT_JSON_FORMAT value")?;
        }

        Ok(())
    }
}
