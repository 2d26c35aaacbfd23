use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::{
    cli::args::CommonArgs,
    config::{CatalogFile, Config, load_config},
    core::{
        CancelFlag, PatternScanner, RouteClassifier, ScanError, SharedIndex, UsageIndex,
        collect_files, read_sources,
    },
};

/// Everything a command needs about one project: resolved config, scanned
/// sources and the published usage index.
pub struct ProjectContext {
    pub config: Config,
    pub project_root: PathBuf,
    pub source_dir: PathBuf,
    pub scanner: PatternScanner,
    pub index: SharedIndex,
    pub catalogs: Vec<CatalogFile>,
    pub source_files: usize,
    pub scan_errors: Vec<ScanError>,
}

impl ProjectContext {
    pub fn load(common: &CommonArgs) -> Result<Self> {
        let start_dir = match &common.path {
            Some(path) => path.clone(),
            None => env::current_dir().context("Failed to read current directory")?,
        };
        let loaded = load_config(&start_dir)?;
        let mut config = loaded.config;
        if let Some(source_root) = &common.source_root {
            config.source_root = source_root.clone();
        }
        if let Some(messages_root) = &common.messages_root {
            config.messages_root = messages_root.clone();
        }
        debug!(
            from_file = loaded.from_file,
            root = %loaded.project_root.display(),
            "config loaded"
        );

        let project_root = loaded.project_root;
        let source_dir = config.source_dir(&project_root);
        let scanner = PatternScanner::for_accessor(&config.message_accessor)
            .context("Failed to compile reference patterns")?;

        let collected = collect_files(&source_dir, &config.scan_options());
        let paths: Vec<String> = collected.files.into_iter().collect();
        let read = read_sources(&source_dir, &paths, &CancelFlag::new());
        let index = UsageIndex::rebuild(&scanner, &read.files);
        info!(
            files = read.files.len(),
            keys = index.all_keys().len(),
            sites = index.site_count(),
            "source tree indexed"
        );

        let catalogs = config
            .resolve_catalogs(&project_root)
            .context("Failed to resolve catalog files")?;

        Ok(Self {
            source_files: read.files.len(),
            scan_errors: read.errors,
            index: SharedIndex::new(index),
            config,
            project_root,
            source_dir,
            scanner,
            catalogs,
        })
    }

    pub fn snapshot(&self) -> Arc<UsageIndex> {
        self.index.snapshot()
    }

    pub fn classifier(&self) -> RouteClassifier {
        RouteClassifier::new(&self.config.routes_root, self.config.namespace_depth)
    }

    pub fn catalog_paths(&self) -> Vec<PathBuf> {
        self.catalogs.iter().map(|c| c.path.clone()).collect()
    }

    pub fn primary_catalog(&self) -> Option<&CatalogFile> {
        self.catalogs
            .iter()
            .find(|c| c.locale == self.config.primary_locale)
    }

    /// Re-read `paths` and publish an updated index. Paths outside the source
    /// directory or with other extensions are ignored; paths that no longer
    /// read are removed.
    pub fn refresh(&self, paths: impl IntoIterator<Item = PathBuf>) -> Arc<UsageIndex> {
        let extensions = &self.config.extensions;
        let relative: Vec<String> = paths
            .into_iter()
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| extensions.iter().any(|allowed| allowed == ext))
            })
            .filter_map(|path| relative_to(&self.source_dir, &path))
            .collect();
        let read = read_sources(&self.source_dir, &relative, &CancelFlag::new());
        let removed: Vec<String> = read.errors.iter().map(|e| e.path().to_string()).collect();
        debug!(changed = read.files.len(), removed = removed.len(), "refreshing index");
        self.index.apply_changes(&self.scanner, &read.files, &removed)
    }
}

fn relative_to(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    Some(parts.join("/"))
}
