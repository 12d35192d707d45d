//! Configuration primitives and loader for the pds4-label toolkit.
//!
//! Settings resolve through three layers, lowest precedence first:
//! built-in defaults → `.pds4-label.toml` in the working directory → an
//! explicit override file. Relative paths are resolved against the directory
//! of the file that declared them. There is no environment lookup; the
//! segment directory must be configured or passed on the command line.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".pds4-label.toml";

const DEFAULT_EXTENSION: &str = "xml";
const DEFAULT_SEGMENT_PATTERN: &str = "trk_TableBinary_SFDU_{kind:02}.xml";
const DEFAULT_KINDS: RangeInclusive<u8> = 0..=17;

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub label: LabelSettings,
    pub segments: SegmentSettings,
    pub sources: ConfigSources,
}

/// Settings shared by every label workflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelSettings {
    pub extension: String,
    /// Lowercase the product part of `logical_identifier`. Unset leaves the
    /// choice to the workflow.
    pub lowercase_lid: Option<bool>,
}

impl LabelSettings {
    pub fn lowercase_lid_or(&self, workflow_default: bool) -> bool {
        self.lowercase_lid.unwrap_or(workflow_default)
    }
}

/// Where segment sub-templates live and how they are placed in a host label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentSettings {
    pub directory: Option<PathBuf>,
    pub file_pattern: String,
    pub kinds: RangeInclusive<u8>,
    pub placement: Placement,
    pub markers: HostMarkers,
}

impl SegmentSettings {
    /// File name of the sub-template for `kind`, e.g. `trk_TableBinary_SFDU_05.xml`.
    pub fn file_name(&self, kind: u8) -> String {
        self.file_pattern
            .replace("{kind:02}", &format!("{kind:02}"))
            .replace("{kind}", &kind.to_string())
    }
}

/// Side of the closing marker a sub-template is inserted on.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Before,
    After,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Placement::Before => "before",
            Placement::After => "after",
        })
    }
}

/// Markers the segment assembler looks for in the host label.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostMarkers {
    pub wrapper_open: String,
    pub wrapper_close: String,
    pub file_close: String,
}

impl Default for HostMarkers {
    fn default() -> Self {
        HostMarkers {
            wrapper_open: "<Table_Binary>".into(),
            wrapper_close: "</Table_Binary>".into(),
            file_close: "</File>".into(),
        }
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {}: {source}", .attempted.display())]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {} not found", .path.display())]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default(working_dir.clone());
        let mut merged = defaults_layer(default_source.clone());
        let mut source_layers = vec![default_source];

        let local_config_path = working_dir.join(CONFIG_FILE_NAME);
        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let (label, segments) = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            label,
            segments,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }

    /// Defaults only, without touching the filesystem.
    pub fn builtin() -> Self {
        let source = ConfigSource::default(PathBuf::from("."));
        let (label, segments) = defaults_layer(source.clone())
            .finalize()
            .unwrap_or_else(|err| panic!("built-in pds4-label defaults are invalid: {err}"));
        Config {
            label,
            segments,
            sources: ConfigSources {
                working_directory: PathBuf::from("."),
                layers: vec![source],
            },
        }
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.into(),
        source: err,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|err| ConfigError::Parse {
        path: path.into(),
        source: err,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    let markers = HostMarkers::default();
    PartialConfig {
        extension: Some(Located::new(DEFAULT_EXTENSION.into(), source.clone())),
        lowercase_lid: None,
        directory: None,
        file_pattern: Some(Located::new(DEFAULT_SEGMENT_PATTERN.into(), source.clone())),
        kinds: Some(Located::new(
            vec![*DEFAULT_KINDS.start(), *DEFAULT_KINDS.end()],
            source.clone(),
        )),
        placement: Some(Placement::default()),
        wrapper_open: Some(Located::new(markers.wrapper_open, source.clone())),
        wrapper_close: Some(Located::new(markers.wrapper_close, source.clone())),
        file_close: Some(Located::new(markers.file_close, source)),
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    let path = &located.value;
    if path.is_absolute() {
        path.clone()
    } else {
        located.source.base_dir.join(path)
    }
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    extension: Option<Located<String>>,
    lowercase_lid: Option<bool>,
    directory: Option<Located<PathBuf>>,
    file_pattern: Option<Located<String>>,
    kinds: Option<Located<Vec<u8>>>,
    placement: Option<Placement>,
    wrapper_open: Option<Located<String>>,
    wrapper_close: Option<Located<String>>,
    file_close: Option<Located<String>>,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        fn take<T>(slot: &mut Option<T>, incoming: Option<T>) {
            if incoming.is_some() {
                *slot = incoming;
            }
        }

        take(&mut self.extension, other.extension);
        take(&mut self.lowercase_lid, other.lowercase_lid);
        take(&mut self.directory, other.directory);
        take(&mut self.file_pattern, other.file_pattern);
        take(&mut self.kinds, other.kinds);
        take(&mut self.placement, other.placement);
        take(&mut self.wrapper_open, other.wrapper_open);
        take(&mut self.wrapper_close, other.wrapper_close);
        take(&mut self.file_close, other.file_close);
    }

    fn finalize(self) -> Result<(LabelSettings, SegmentSettings), ConfigValidationErrors> {
        let mut errors = Vec::new();
        let fallback = || ConfigSource::default(PathBuf::from("."));

        let extension = self
            .extension
            .unwrap_or_else(|| Located::new(DEFAULT_EXTENSION.into(), fallback()));
        let extension_value = extension.value.trim_start_matches('.').to_string();
        if extension_value.trim().is_empty() {
            errors.push(ConfigValidationError::new(
                Some(extension.source.clone()),
                "label.extension cannot be empty".into(),
            ));
        }

        let file_pattern = self
            .file_pattern
            .unwrap_or_else(|| Located::new(DEFAULT_SEGMENT_PATTERN.into(), fallback()));
        if !file_pattern.value.contains("{kind}") && !file_pattern.value.contains("{kind:02}") {
            errors.push(ConfigValidationError::new(
                Some(file_pattern.source.clone()),
                format!(
                    "segments.file_pattern '{}' must contain {{kind}} or {{kind:02}}",
                    file_pattern.value
                ),
            ));
        }

        let kinds = self.kinds.unwrap_or_else(|| {
            Located::new(
                vec![*DEFAULT_KINDS.start(), *DEFAULT_KINDS.end()],
                fallback(),
            )
        });
        let kind_range = match kinds.value.as_slice() {
            [low, high] if low <= high => *low..=*high,
            other => {
                errors.push(ConfigValidationError::new(
                    Some(kinds.source.clone()),
                    format!("segments.kinds must be [low, high] with low <= high (received {other:?})"),
                ));
                DEFAULT_KINDS
            }
        };

        let defaults = HostMarkers::default();
        let mut marker = |located: Option<Located<String>>, default: String, key: &str| {
            let located = located.unwrap_or_else(|| Located::new(default, fallback()));
            if located.value.trim().is_empty() {
                errors.push(ConfigValidationError::new(
                    Some(located.source.clone()),
                    format!("segments.markers.{key} cannot be empty"),
                ));
            }
            located.value
        };
        let markers = HostMarkers {
            wrapper_open: marker(self.wrapper_open, defaults.wrapper_open, "wrapper_open"),
            wrapper_close: marker(self.wrapper_close, defaults.wrapper_close, "wrapper_close"),
            file_close: marker(self.file_close, defaults.file_close, "file_close"),
        };

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok((
            LabelSettings {
                extension: extension_value,
                lowercase_lid: self.lowercase_lid,
            },
            SegmentSettings {
                directory: self.directory.as_ref().map(resolve_path),
                file_pattern: file_pattern.value,
                kinds: kind_range,
                placement: self.placement.unwrap_or_default(),
                markers,
            },
        ))
    }
}

/// Collection of validation errors.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Single validation failure with optional provenance.
#[derive(Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError { source, message }
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    label: Option<RawLabel>,
    #[serde(default)]
    segments: Option<RawSegments>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLabel {
    extension: Option<String>,
    lowercase_lid: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSegments {
    directory: Option<PathBuf>,
    file_pattern: Option<String>,
    kinds: Option<Vec<u8>>,
    placement: Option<Placement>,
    markers: Option<RawMarkers>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMarkers {
    wrapper_open: Option<String>,
    wrapper_close: Option<String>,
    file_close: Option<String>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        let located = |value| Located::new(value, source.clone());
        let mut partial = PartialConfig::default();

        if let Some(label) = self.label {
            partial.extension = label.extension.map(located);
            partial.lowercase_lid = label.lowercase_lid;
        }

        if let Some(segments) = self.segments {
            partial.directory = segments
                .directory
                .map(|dir| Located::new(dir, source.clone()));
            partial.file_pattern = segments.file_pattern.map(located);
            partial.kinds = segments
                .kinds
                .map(|kinds| Located::new(kinds, source.clone()));
            partial.placement = segments.placement;
            if let Some(markers) = segments.markers {
                partial.wrapper_open = markers.wrapper_open.map(located);
                partial.wrapper_close = markers.wrapper_close.map(located);
                partial.file_close = markers.file_close.map(located);
            }
        }

        partial
    }
}
