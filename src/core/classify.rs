//! Mapping source files to namespace candidates.

use std::path::{Component, Path};

/// Derives a namespace candidate from a source file's location.
///
/// Returning `None` means the file carries no namespace signal.
pub trait Classifier {
    fn classify(&self, file_path: &str) -> Option<String>;
}

impl<F> Classifier for F
where
    F: Fn(&str) -> Option<String>,
{
    fn classify(&self, file_path: &str) -> Option<String> {
        self(file_path)
    }
}

/// Classifies files by their route directory.
///
/// For a routes root of `src/routes`:
///
/// | path                                        | namespace   |
/// |---------------------------------------------|-------------|
/// | `src/routes/home/+page.svelte`              | `home`      |
/// | `src/routes/(app)/settings/profile/Form.svelte` | `settings` (depth 1) |
/// | `src/routes/blog/[slug]/+page.svelte`       | `blog`      |
/// | `src/routes/+layout.svelte`                 | none        |
/// | `src/lib/Button.svelte`                     | none        |
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    root: Vec<String>,
    depth: usize,
}

impl RouteClassifier {
    pub fn new(routes_root: &str, depth: usize) -> Self {
        Self {
            root: normal_segments(routes_root),
            depth: depth.max(1),
        }
    }
}

impl Classifier for RouteClassifier {
    fn classify(&self, file_path: &str) -> Option<String> {
        let segments = normal_segments(file_path);
        let start = if self.root.is_empty() {
            0
        } else {
            segments
                .windows(self.root.len())
                .position(|window| window == self.root.as_slice())?
        };

        let after_root = &segments[start + self.root.len()..];
        // The last segment is the file name
        let (_, dirs) = after_root.split_last()?;

        let namespace: Vec<&str> = dirs
            .iter()
            .map(String::as_str)
            .filter(|segment| is_static_segment(segment))
            .take(self.depth)
            .collect();

        if namespace.is_empty() {
            None
        } else {
            Some(namespace.join("."))
        }
    }
}

/// Route groups `(name)`, params `[id]` and special `+`/`_` folders carry no
/// namespace meaning.
fn is_static_segment(segment: &str) -> bool {
    !(segment.is_empty()
        || segment.starts_with('(')
        || segment.starts_with('[')
        || segment.starts_with('+')
        || segment.starts_with('_')
        || segment.starts_with('@'))
}

fn normal_segments(path: &str) -> Vec<String> {
    Path::new(path)
        .components()
        .filter_map(|component| match component {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect()
}
