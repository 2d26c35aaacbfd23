//! Library-level runs of the whole pipeline: collect, scan, index, suggest,
//! then migrate on disk.

use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
};

use nestkey::core::{
    CancelFlag, KeyStore, MemoryKeyStore, PatternScanner, ReferenceForm, RefactoringExecutor,
    RescanRequest, RouteClassifier, ScanOptions, SharedIndex, SourceFile, SuggestionEngine,
    UsageIndex, collect_files, read_sources, refactor::catalog::read_messages,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write(root: &Path, path: &str, content: &str) {
    let file_path = root.join(path);
    fs::create_dir_all(file_path.parent().unwrap()).unwrap();
    fs::write(file_path, content).unwrap();
}

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "src/routes/home/+page.svelte",
        concat!(
            "<script>\n",
            "  const t = m.hello();\n",
            "</script>\n",
            "<h1>{m.page.title()}</h1>\n",
            "<p>{m.hello()}</p>\n",
            "<p>{m.hello()}</p>\n",
        ),
    );
    write(root, "src/lib/Footer.svelte", "<footer>{m.hello()}</footer>\n");
    write(
        root,
        "src/routes/settings/+page.ts",
        "export const load = () => ({ title: m.settings_title() });\n",
    );
    write(root, "src/routes/home/page.test.ts", "m.hello();\nm.hello();\n");
    write(
        root,
        "messages/en.json",
        r#"{"hello": "Hello", "settings_title": "Settings", "page": {"title": "Page"}}"#,
    );
    write(
        root,
        "messages/fr.json",
        r#"{"hello": "Bonjour", "settings_title": "Réglages", "page": {"title": "Page"}}"#,
    );
    dir
}

fn index_project(root: &Path, scanner: &PatternScanner) -> UsageIndex {
    let options = ScanOptions {
        includes: vec!["src".to_string()],
        ..ScanOptions::default()
    };
    let collected = collect_files(root, &options);
    let paths: Vec<String> = collected.files.into_iter().collect();
    let read = read_sources(root, &paths, &CancelFlag::new());
    assert!(read.errors.is_empty());
    UsageIndex::rebuild(scanner, &read.files)
}

#[test]
fn test_single_line_yields_two_sites() {
    let scanner = PatternScanner::for_accessor("m").unwrap();
    let sites = scanner.scan("const t = m.hello(); <h1>{m.page.title()}</h1>");

    let found: Vec<(&str, ReferenceForm)> =
        sites.iter().map(|s| (s.key.as_str(), s.form)).collect();
    assert_eq!(
        found,
        vec![
            ("hello", ReferenceForm::BareCall),
            ("page.title", ReferenceForm::TemplateCall),
        ]
    );
}

#[test]
fn test_three_of_four_usages_suggest_home() {
    let scanner = PatternScanner::for_accessor("m").unwrap();
    let files = vec![
        SourceFile::new("src/routes/home/+page.svelte", "{m.hello()}\n{m.hello()}"),
        SourceFile::new("src/routes/home/Hero.svelte", "{m.hello()}"),
        SourceFile::new("src/lib/Nav.svelte", "{m.hello()}"),
    ];
    let index = UsageIndex::rebuild(&scanner, &files);
    let classifier = RouteClassifier::new("src/routes", 1);

    let suggestions = SuggestionEngine::default().suggest(&index, &classifier);

    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].suggested_key, "home.hello");
    assert_eq!(suggestions[0].confidence, 0.75);
    assert_eq!(
        suggestions[0].affected_files,
        vec!["src/routes/home/+page.svelte", "src/routes/home/Hero.svelte"]
    );
}

#[test]
fn test_project_index() {
    let dir = project();
    let scanner = PatternScanner::for_accessor("m").unwrap();
    let index = index_project(dir.path(), &scanner);

    assert_eq!(index.all_keys(), vec!["hello", "page.title", "settings_title"]);
    // The test file is skipped by default
    assert_eq!(index.usages_for("hello").len(), 4);
    assert_eq!(
        index.files_for("hello"),
        vec!["src/lib/Footer.svelte", "src/routes/home/+page.svelte"]
    );
    assert_eq!(index.file_count(), 3);

    let first = &index.usages_for("hello")[0];
    assert_eq!(first.position(), ("src/lib/Footer.svelte", 1, 9));
}

#[test]
fn test_suggest_then_migrate() {
    let dir = project();
    let root = dir.path();
    let scanner = PatternScanner::for_accessor("m").unwrap();
    let shared = SharedIndex::new(index_project(root, &scanner));
    let classifier = RouteClassifier::new("src/routes", 1);

    let suggestions = SuggestionEngine::default().suggest(&shared.snapshot(), &classifier);
    let keys: Vec<(&str, &str)> = suggestions
        .iter()
        .map(|s| (s.original_key.as_str(), s.suggested_key.as_str()))
        .collect();
    // page.title is already namespaced
    assert_eq!(
        keys,
        vec![
            ("settings_title", "settings.settings_title"),
            ("hello", "home.hello"),
        ]
    );

    let catalogs = vec![root.join("messages/en.json"), root.join("messages/fr.json")];
    let mut store = MemoryKeyStore::from_messages(&read_messages(&catalogs[0]).unwrap());
    let requests: RefCell<Vec<RescanRequest>> = RefCell::new(Vec::new());

    let outcome = RefactoringExecutor::new(&mut store, catalogs)
        .keep_backups(false)
        .source_root(root)
        .with_index(shared.snapshot())
        .on_rescan(|request: RescanRequest| requests.borrow_mut().push(request))
        .execute(&suggestions);

    assert!(!outcome.has_failures());
    assert_eq!(outcome.keys_updated, 2);
    assert!(outcome.backups.is_empty());
    assert_eq!(
        outcome.files_modified,
        [
            "messages/en.json",
            "messages/fr.json",
            "src/lib/Footer.svelte",
            "src/routes/home/+page.svelte",
            "src/routes/settings/+page.ts",
        ]
        .iter()
        .map(|p| root.join(p))
        .collect()
    );

    assert_eq!(store.lookup_value("home.hello").as_deref(), Some("Hello"));
    assert_eq!(store.lookup_value("hello"), None);

    let fr = fs::read_to_string(root.join("messages/fr.json")).unwrap();
    insta::assert_snapshot!(fr.trim_end(), @r#"
    {
      "home": {
        "hello": "Bonjour"
      },
      "page": {
        "title": "Page"
      },
      "settings": {
        "settings_title": "Réglages"
      }
    }
    "#);
    assert_eq!(
        fs::read_to_string(root.join("src/routes/settings/+page.ts")).unwrap(),
        "export const load = () => ({ title: m[\"settings.settings_title\"]() });\n"
    );
    // Skipped by the scan, so left alone
    assert_eq!(
        fs::read_to_string(root.join("src/routes/home/page.test.ts")).unwrap(),
        "m.hello();\nm.hello();\n"
    );

    // One request for the whole batch, then the published index sees new keys
    let requests = requests.into_inner();
    assert_eq!(requests.len(), 1);
    let changed: Vec<SourceFile> = requests[0]
        .paths
        .iter()
        .filter(|p| p.extension().is_some_and(|e| e != "json"))
        .map(|p| {
            let relative = p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
            SourceFile::new(relative, fs::read_to_string(p).unwrap())
        })
        .collect();
    let updated = shared.apply_changes(&scanner, &changed, &[]);

    assert_eq!(
        updated.all_keys(),
        vec!["home.hello", "page.title", "settings.settings_title"]
    );
    assert_eq!(updated.usages_for("home.hello").len(), 4);
    assert!(SuggestionEngine::default().suggest(&updated, &classifier).is_empty());
}

#[test]
fn test_failed_migration_leaves_project_untouched() {
    let dir = project();
    let root = dir.path();
    let scanner = PatternScanner::for_accessor("m").unwrap();
    let index = index_project(root, &scanner);
    let classifier = RouteClassifier::new("src/routes", 1);
    let suggestions = SuggestionEngine::default().suggest(&index, &classifier);

    let before: Vec<(PathBuf, String)> = [
        "src/lib/Footer.svelte",
        "src/routes/home/+page.svelte",
        "src/routes/settings/+page.ts",
    ]
    .iter()
    .map(|p| (root.join(p), fs::read_to_string(root.join(p)).unwrap()))
    .collect();

    // No catalog holds the keys, so every suggestion must roll back
    let mut store = MemoryKeyStore::new();
    store.insert("hello", Some("Hello".to_string()));
    store.insert("settings_title", Some("Settings".to_string()));
    let outcome = RefactoringExecutor::new(&mut store, Vec::new())
        .source_root(root)
        .execute(&suggestions);

    assert_eq!(outcome.failed.len(), 2);
    assert!(outcome.applied.is_empty());
    assert!(outcome.files_modified.is_empty());
    for (path, content) in before {
        assert_eq!(fs::read_to_string(path).unwrap(), content);
    }
    assert!(store.get("hello").is_some());
    assert!(store.get("home.hello").is_none());
}
