//! Configuration management for Folio.
//!
//! Parses `folio.toml` with serde and discovers it in the current directory
//! or its parents. Values given on the command line are applied on top through
//! [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! These string values support `${VAR}` (error if unset) and
//! `${VAR:-default}`:
//!
//! - `export.download_dir`
//! - `export.title`
//! - `export.header`
//! - `export.footer`
//! - `upload.bucket`
//! - `upload.region`
//! - `upload.endpoint`
//! - `upload.prefix`

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "folio.toml";

/// Default cap on collected search matches.
pub const DEFAULT_MAX_MATCHES: usize = 10_000;

/// CLI settings that override configuration file values.
///
/// Only `Some` values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub read_only: Option<bool>,
    pub download_dir: Option<PathBuf>,
    pub file_stem: Option<String>,
    pub title: Option<String>,
    pub allow_incomplete: Option<bool>,
    pub max_matches: Option<usize>,
    /// Upload bucket; creates an `[upload]` section with defaults if absent.
    pub upload_bucket: Option<String>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub editor: EditorConfig,
    pub search: SearchConfig,
    /// Export settings as written in TOML (paths relative).
    #[serde(rename = "export")]
    export_raw: ExportConfigRaw,
    /// Remote upload; absent means exports stay local.
    pub upload: Option<UploadConfig>,

    /// Resolved export configuration (set after loading).
    #[serde(skip)]
    pub export: ExportConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Editing surface settings.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Open documents read-only.
    pub read_only: bool,
    /// Grid applied to new text boxes.
    pub snap_increment: Option<f64>,
    /// Canvas width; together with `canvas_height` enables clamping.
    pub canvas_width: Option<f64>,
    pub canvas_height: Option<f64>,
}

impl EditorConfig {
    /// Canvas size when both dimensions are configured.
    #[must_use]
    pub fn canvas(&self) -> Option<(f64, f64)> {
        self.canvas_width.zip(self.canvas_height)
    }
}

/// Search settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_matches: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_matches: DEFAULT_MAX_MATCHES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExportConfigRaw {
    download_dir: Option<String>,
    file_stem: Option<String>,
    title: Option<String>,
    header: Option<String>,
    footer: Option<String>,
    allow_incomplete: Option<bool>,
    qr_module_size: Option<usize>,
    qr_margin: Option<usize>,
}

/// Resolved export configuration with an absolute download directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Where local artifacts are written.
    pub download_dir: PathBuf,
    pub file_stem: String,
    pub title: String,
    /// Markup for the page header.
    pub header: String,
    /// Markup for the page footer.
    pub footer: String,
    pub allow_incomplete: bool,
    pub qr_module_size: usize,
    pub qr_margin: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::with_base(Path::new("."))
    }
}

impl ExportConfig {
    fn with_base(base: &Path) -> Self {
        Self {
            download_dir: base.join("downloads"),
            file_stem: "document".to_owned(),
            title: "Document".to_owned(),
            header: String::new(),
            footer: String::new(),
            allow_incomplete: false,
            qr_module_size: 4,
            qr_margin: 4,
        }
    }
}

/// S3 upload configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadConfig {
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// S3-compatible endpoint URL.
    pub endpoint: Option<String>,
    /// Key prefix within the bucket.
    pub prefix: Option<String>,
}

impl UploadConfig {
    /// Validate that all required fields are properly set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.bucket, "upload.bucket")?;
        require_non_empty(&self.region, "upload.region")?;
        if let Some(endpoint) = &self.endpoint {
            require_http_url(endpoint, "upload.endpoint")?;
        }
        Ok(())
    }
}

fn default_region() -> String {
    "us-east-1".to_owned()
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g. `upload.bucket`).
        field: String,
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn require_positive(value: Option<f64>, field: &str) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(ConfigError::Validation(format!(
            "{field} must be a positive number"
        ))),
        _ => Ok(()),
    }
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `folio.toml` in the current directory and its parents, falling back
    /// to defaults.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(read_only) = settings.read_only {
            self.editor.read_only = read_only;
        }
        if let Some(dir) = &settings.download_dir {
            self.export.download_dir.clone_from(dir);
        }
        if let Some(stem) = &settings.file_stem {
            self.export.file_stem.clone_from(stem);
        }
        if let Some(title) = &settings.title {
            self.export.title.clone_from(title);
        }
        if let Some(allow) = settings.allow_incomplete {
            self.export.allow_incomplete = allow;
        }
        if let Some(max) = settings.max_matches {
            self.search.max_matches = max;
        }
        if let Some(bucket) = &settings.upload_bucket {
            match &mut self.upload {
                Some(upload) => upload.bucket.clone_from(bucket),
                None => {
                    self.upload = Some(UploadConfig {
                        bucket: bucket.clone(),
                        region: default_region(),
                        endpoint: None,
                        prefix: None,
                    });
                }
            }
        }
    }

    /// Search for the config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            editor: EditorConfig::default(),
            search: SearchConfig::default(),
            export_raw: ExportConfigRaw::default(),
            upload: None,
            export: ExportConfig::with_base(base),
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive(self.editor.snap_increment, "editor.snap_increment")?;
        require_positive(self.editor.canvas_width, "editor.canvas_width")?;
        require_positive(self.editor.canvas_height, "editor.canvas_height")?;
        if self.editor.canvas_width.is_some() != self.editor.canvas_height.is_some() {
            return Err(ConfigError::Validation(
                "editor.canvas_width and editor.canvas_height must be set together".to_owned(),
            ));
        }

        if self.search.max_matches == 0 {
            return Err(ConfigError::Validation(
                "search.max_matches must be greater than 0".to_owned(),
            ));
        }

        require_non_empty(&self.export.file_stem, "export.file_stem")?;
        if self.export.qr_module_size == 0 {
            return Err(ConfigError::Validation(
                "export.qr_module_size must be greater than 0".to_owned(),
            ));
        }

        if let Some(upload) = &self.upload {
            upload.validate()?;
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let export = &mut self.export_raw;
        expand::expand_opt(&mut export.download_dir, "export.download_dir")?;
        expand::expand_opt(&mut export.title, "export.title")?;
        expand::expand_opt(&mut export.header, "export.header")?;
        expand::expand_opt(&mut export.footer, "export.footer")?;

        if let Some(upload) = &mut self.upload {
            upload.bucket = expand::expand_env(&upload.bucket, "upload.bucket")?;
            upload.region = expand::expand_env(&upload.region, "upload.region")?;
            expand::expand_opt(&mut upload.endpoint, "upload.endpoint")?;
            expand::expand_opt(&mut upload.prefix, "upload.prefix")?;
        }
        Ok(())
    }

    /// Resolve the raw export section against the config directory.
    fn resolve(&mut self, config_dir: &Path) {
        let defaults = ExportConfig::with_base(config_dir);
        let raw = &self.export_raw;
        self.export = ExportConfig {
            download_dir: raw
                .download_dir
                .as_deref()
                .map_or(defaults.download_dir, |d| config_dir.join(d)),
            file_stem: raw.file_stem.clone().unwrap_or(defaults.file_stem),
            title: raw.title.clone().unwrap_or(defaults.title),
            header: raw.header.clone().unwrap_or(defaults.header),
            footer: raw.footer.clone().unwrap_or(defaults.footer),
            allow_incomplete: raw.allow_incomplete.unwrap_or(defaults.allow_incomplete),
            qr_module_size: raw.qr_module_size.unwrap_or(defaults.qr_module_size),
            qr_margin: raw.qr_margin.unwrap_or(defaults.qr_margin),
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(toml: &str, base: &str) -> Config {
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();
        config.resolve(Path::new(base));
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/work"));
        assert!(!config.editor.read_only);
        assert_eq!(config.editor.canvas(), None);
        assert_eq!(config.search.max_matches, 10_000);
        assert_eq!(config.export.download_dir, PathBuf::from("/work/downloads"));
        assert_eq!(config.export.file_stem, "document");
        assert_eq!(config.export.qr_module_size, 4);
        assert!(config.upload.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r#"
[editor]
read_only = true
snap_increment = 10
canvas_width = 794
canvas_height = 1123

[search]
max_matches = 500

[export]
download_dir = "out"
file_stem = "invoice"
title = "Invoice"
header = "<p>Acme</p>"
allow_incomplete = true
qr_module_size = 6
qr_margin = 2

[upload]
bucket = "exports"
prefix = "tenant-1"
"#,
            "/project",
        );
        assert!(config.editor.read_only);
        assert_eq!(config.editor.snap_increment, Some(10.0));
        assert_eq!(config.editor.canvas(), Some((794.0, 1123.0)));
        assert_eq!(config.search.max_matches, 500);
        assert_eq!(
            config.export,
            ExportConfig {
                download_dir: PathBuf::from("/project/out"),
                file_stem: "invoice".to_owned(),
                title: "Invoice".to_owned(),
                header: "<p>Acme</p>".to_owned(),
                footer: String::new(),
                allow_incomplete: true,
                qr_module_size: 6,
                qr_margin: 2,
            }
        );
        let upload = config.upload.as_ref().unwrap();
        assert_eq!(upload.region, "us-east-1");
        assert_eq!(upload.prefix.as_deref(), Some("tenant-1"));
        config.validate().unwrap();
    }

    #[test]
    fn test_absolute_download_dir_kept() {
        let config = parse("[export]\ndownload_dir = \"/tmp/exports\"\n", "/project");
        assert_eq!(config.export.download_dir, PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            ("[editor]\nsnap_increment = 0\n", "editor.snap_increment"),
            ("[editor]\ncanvas_width = 800\n", "set together"),
            ("[search]\nmax_matches = 0\n", "search.max_matches"),
            ("[export]\nfile_stem = \" \"\n", "export.file_stem"),
            ("[export]\nqr_module_size = 0\n", "export.qr_module_size"),
            ("[upload]\nbucket = \"\"\n", "upload.bucket"),
            (
                "[upload]\nbucket = \"b\"\nendpoint = \"minio:9000\"\n",
                "upload.endpoint",
            ),
        ];
        for (toml, needle) in cases {
            let err = parse(toml, "/p").validate().unwrap_err();
            assert!(
                matches!(err, ConfigError::Validation(_)),
                "expected validation error for {toml:?}, got {err:?}"
            );
            assert!(err.to_string().contains(needle), "{err} lacks {needle}");
        }
    }

    #[test]
    fn test_upload_section_requires_bucket() {
        let err = toml::from_str::<Config>("[upload]\nregion = \"eu-west-1\"\n").unwrap_err();
        assert!(err.to_string().contains("bucket"));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("FOLIO_CONFIG_TEST_BUCKET", "tenant-exports");
            std::env::remove_var("FOLIO_CONFIG_TEST_TITLE");
        }
        let config = parse(
            r#"
[export]
title = "${FOLIO_CONFIG_TEST_TITLE:-Quarterly}"

[upload]
bucket = "${FOLIO_CONFIG_TEST_BUCKET}"
"#,
            "/p",
        );
        assert_eq!(config.export.title, "Quarterly");
        assert_eq!(config.upload.unwrap().bucket, "tenant-exports");
        unsafe {
            std::env::remove_var("FOLIO_CONFIG_TEST_BUCKET");
        }
    }

    #[test]
    fn test_expand_env_vars_missing() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("FOLIO_CONFIG_TEST_MISSING");
        }
        let mut config: Config =
            toml::from_str("[upload]\nbucket = \"${FOLIO_CONFIG_TEST_MISSING}\"\n").unwrap();
        let err = config.expand_env_vars().unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { ref field, .. } if field == "upload.bucket"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/work"));
        config.apply_cli_settings(&CliSettings {
            read_only: Some(true),
            download_dir: Some(PathBuf::from("/elsewhere")),
            file_stem: Some("q3".to_owned()),
            max_matches: Some(5),
            upload_bucket: Some("cli-bucket".to_owned()),
            ..Default::default()
        });
        assert!(config.editor.read_only);
        assert_eq!(config.export.download_dir, PathBuf::from("/elsewhere"));
        assert_eq!(config.export.file_stem, "q3");
        assert_eq!(config.export.title, "Document");
        assert_eq!(config.search.max_matches, 5);
        assert_eq!(
            config.upload,
            Some(UploadConfig {
                bucket: "cli-bucket".to_owned(),
                region: "us-east-1".to_owned(),
                endpoint: None,
                prefix: None,
            })
        );
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "[export]\nfile_stem = \"report\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.export.file_stem, "report");
        assert_eq!(config.export.download_dir, temp.path().join("downloads"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_path() {
        let err = Config::load(Some(Path::new("/nonexistent/folio.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_cli_settings_validated() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "").unwrap();

        let settings = CliSettings {
            max_matches: Some(0),
            ..Default::default()
        };
        let err = Config::load(Some(&path), Some(&settings)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_discover_config_in_parent() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            Config::discover_config(&nested),
            Some(temp.path().join(CONFIG_FILENAME))
        );
    }
}
