use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use glob::{Pattern, glob};
use serde::{Deserialize, Serialize};

use crate::core::{
    DEFAULT_CONFIDENCE_THRESHOLD, file_scanner::ScanOptions, scanner::is_identifier,
};

pub const CONFIG_FILE_NAME: &str = ".nestkeyrc.json";

/// Placeholder substituted with each locale in `catalogPattern`.
pub const LOCALE_PLACEHOLDER: &str = "{locale}";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_includes")]
    pub includes: Vec<String>,
    #[serde(default)]
    pub ignores: Vec<String>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_ignore_test_files")]
    pub ignore_test_files: bool,
    #[serde(default = "default_source_root")]
    pub source_root: String,
    #[serde(default = "default_messages_root")]
    pub messages_root: String,
    #[serde(default = "default_catalog_pattern")]
    pub catalog_pattern: String,
    /// Empty means every catalog matching `catalogPattern` is used.
    #[serde(default)]
    pub locales: Vec<String>,
    #[serde(default = "default_primary_locale")]
    pub primary_locale: String,
    #[serde(default = "default_routes_root")]
    pub routes_root: String,
    #[serde(default = "default_namespace_depth")]
    pub namespace_depth: usize,
    #[serde(default = "default_message_accessor")]
    pub message_accessor: String,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_keep_backups")]
    pub keep_backups: bool,
}

fn default_includes() -> Vec<String> {
    vec!["src".to_string()]
}

fn default_extensions() -> Vec<String> {
    ["svelte", "ts", "js", "tsx", "jsx"].map(String::from).to_vec()
}

fn default_ignore_test_files() -> bool {
    true
}

fn default_source_root() -> String {
    "./".to_string()
}

fn default_messages_root() -> String {
    "./messages".to_string()
}

fn default_catalog_pattern() -> String {
    format!("{}.json", LOCALE_PLACEHOLDER)
}

fn default_primary_locale() -> String {
    "en".to_string()
}

fn default_routes_root() -> String {
    "src/routes".to_string()
}

fn default_namespace_depth() -> usize {
    1
}

fn default_message_accessor() -> String {
    "m".to_string()
}

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_keep_backups() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            includes: default_includes(),
            ignores: Vec::new(),
            extensions: default_extensions(),
            ignore_test_files: default_ignore_test_files(),
            source_root: default_source_root(),
            messages_root: default_messages_root(),
            catalog_pattern: default_catalog_pattern(),
            locales: Vec::new(),
            primary_locale: default_primary_locale(),
            routes_root: default_routes_root(),
            namespace_depth: default_namespace_depth(),
            message_accessor: default_message_accessor(),
            confidence_threshold: default_confidence_threshold(),
            keep_backups: default_keep_backups(),
        }
    }
}

/// A locale catalog resolved from `catalogPattern`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFile {
    pub locale: String,
    pub path: PathBuf,
}

impl Config {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }

        // Patterns without wildcards are literal paths, so `[lang]` needs no escaping
        for pattern in &self.includes {
            if pattern.contains('*') || pattern.contains('?') {
                Pattern::new(pattern).with_context(|| {
                    format!("Invalid glob pattern in 'includes': \"{}\"", pattern)
                })?;
            }
        }

        if !self.catalog_pattern.contains(LOCALE_PLACEHOLDER) {
            bail!(
                "'catalogPattern' must contain {}: \"{}\"",
                LOCALE_PLACEHOLDER,
                self.catalog_pattern
            );
        }
        if !is_identifier(&self.message_accessor) {
            bail!(
                "'messageAccessor' is not an identifier: \"{}\"",
                self.message_accessor
            );
        }
        if !(DEFAULT_CONFIDENCE_THRESHOLD..=1.0).contains(&self.confidence_threshold) {
            bail!(
                "'confidenceThreshold' must be between {} and 1, got {}",
                DEFAULT_CONFIDENCE_THRESHOLD,
                self.confidence_threshold
            );
        }
        if self.namespace_depth == 0 {
            bail!("'namespaceDepth' must be at least 1");
        }

        Ok(())
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            includes: self.includes.clone(),
            ignores: self.ignores.clone(),
            extensions: self.extensions.clone(),
            ignore_test_files: self.ignore_test_files,
        }
    }

    pub fn source_dir(&self, project_root: &Path) -> PathBuf {
        join_relative(project_root, &self.source_root)
    }

    pub fn messages_dir(&self, project_root: &Path) -> PathBuf {
        join_relative(project_root, &self.messages_root)
    }

    /// Catalog files for the configured locales, or for every file matching
    /// the pattern when no locales are listed. Configured catalogs that do
    /// not exist are left out. Sorted by locale.
    pub fn resolve_catalogs(&self, project_root: &Path) -> Result<Vec<CatalogFile>> {
        let messages_dir = self.messages_dir(project_root);
        let mut catalogs = if self.locales.is_empty() {
            self.discover_catalogs(&messages_dir)?
        } else {
            self.locales
                .iter()
                .map(|locale| CatalogFile {
                    locale: locale.clone(),
                    path: messages_dir
                        .join(self.catalog_pattern.replace(LOCALE_PLACEHOLDER, locale)),
                })
                .filter(|catalog| catalog.path.is_file())
                .collect()
        };
        catalogs.sort_by(|a, b| a.locale.cmp(&b.locale));
        Ok(catalogs)
    }

    fn discover_catalogs(&self, messages_dir: &Path) -> Result<Vec<CatalogFile>> {
        let Some((prefix, suffix)) = self.catalog_pattern.split_once(LOCALE_PLACEHOLDER) else {
            bail!("'catalogPattern' must contain {}", LOCALE_PLACEHOLDER);
        };
        let search = format!(
            "{}/{}*{}",
            Pattern::escape(&messages_dir.to_string_lossy()),
            Pattern::escape(prefix),
            Pattern::escape(suffix)
        );
        let entries = glob(&search)
            .with_context(|| format!("Invalid catalog pattern: \"{}\"", self.catalog_pattern))?;

        let mut catalogs = Vec::new();
        for path in entries.flatten() {
            let Ok(relative) = path.strip_prefix(messages_dir) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            let locale = relative
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(suffix));
            if let Some(locale) = locale
                && !locale.is_empty()
                && !locale.contains('/')
                && path.is_file()
            {
                catalogs.push(CatalogFile {
                    locale: locale.to_string(),
                    path: path.clone(),
                });
            }
        }
        Ok(catalogs)
    }
}

/// `root` joined with `path`, dropping `.` components so glob patterns built
/// from the result stay plain.
fn join_relative(root: &Path, path: &str) -> PathBuf {
    let mut joined = root.to_path_buf();
    for component in Path::new(path).components() {
        if component != Component::CurDir {
            joined.push(component);
        }
    }
    joined
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// Directory relative config paths are resolved against: the config
    /// file's directory, or the start directory when using defaults.
    pub project_root: PathBuf,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            let project_root = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| start_dir.to_path_buf());
            Ok(ConfigLoadResult {
                config,
                project_root,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            project_root: start_dir.to_path_buf(),
            from_file: false,
        }),
    }
}
