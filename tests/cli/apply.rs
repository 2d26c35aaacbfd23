use std::fs;

use anyhow::Result;
use serde_json::json;

use crate::CliTest;

#[test]
fn test_apply_is_dry_run_by_default() -> Result<()> {
    let test = CliTest::with_project()?;

    let out = test.run(&["apply"])?;
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);
    assert!(out.stdout.contains("Would migrate 2 keys in 3 source files"));
    assert!(out.stdout.contains("Run with --apply"));

    assert_eq!(
        test.read_file("src/routes/home/+page.svelte")?,
        "<h1>{m.hello()}</h1>\n<p>{m.hello()}</p>\n<p>{m.hello()}</p>\n"
    );
    assert_eq!(test.list_dir("messages")?, vec!["de.json", "en.json"]);

    Ok(())
}

#[test]
fn test_apply_selected_key() -> Result<()> {
    let test = CliTest::with_project()?;

    let out = test.run(&["apply", "--apply", "--key", "hello"])?;
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);
    assert!(out.stdout.contains("hello -> home.hello"));
    assert!(out.stdout.contains("Migrated 1 key, modified 4 files."));

    // Every reference is rewritten, including the one outside the namespace
    assert_eq!(
        test.read_file("src/routes/home/+page.svelte")?,
        "<h1>{m[\"home.hello\"]()}</h1>\n\
         <p>{m[\"home.hello\"]()}</p>\n\
         <p>{m[\"home.hello\"]()}</p>\n"
    );
    assert_eq!(
        test.read_file("src/lib/Nav.svelte")?,
        "<a href=\"/\">{m[\"home.hello\"]()}</a>\n"
    );
    assert_eq!(
        test.read_file("src/routes/about/+page.svelte")?,
        "<h1>{m.about_title()}</h1>\n"
    );

    assert_eq!(
        test.read_json("messages/en.json")?,
        json!({"about_title": "About", "home": {"hello": "Hello"}})
    );
    assert_eq!(
        test.read_json("messages/de.json")?,
        json!({"about_title": "Über uns", "home": {"hello": "Hallo"}})
    );

    let backups: Vec<String> = test
        .list_dir("messages")?
        .into_iter()
        .filter(|name| name.ends_with(".bak"))
        .collect();
    assert_eq!(backups.len(), 2);

    Ok(())
}

#[test]
fn test_apply_then_scan_sees_new_keys() -> Result<()> {
    let test = CliTest::with_project()?;

    let out = test.run(&["apply", "--apply"])?;
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);
    assert!(out.stdout.contains("Rescanned sources: 2 keys indexed."));

    let out = test.run(&["scan"])?;
    assert!(out.stdout.contains("about.about_title"));
    assert!(out.stdout.contains("home.hello"));
    assert!(!out.stdout.lines().any(|line| line.starts_with("hello ")));

    let out = test.run(&["suggest"])?;
    assert!(out.stdout.contains("No flat keys to namespace"));

    Ok(())
}

#[test]
fn test_apply_without_backups() -> Result<()> {
    let test = CliTest::with_project()?;
    test.write_file(".nestkeyrc.json", r#"{ "keepBackups": false }"#)?;

    let out = test.run(&["apply", "--apply"])?;
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);
    assert_eq!(test.list_dir("messages")?, vec!["de.json", "en.json"]);
    assert_eq!(test.list_dir("src/lib")?, vec!["Nav.svelte"]);

    Ok(())
}

#[test]
fn test_apply_with_read_only_catalogs_fails() -> Result<()> {
    let test = CliTest::with_project()?;
    for catalog in ["messages/en.json", "messages/de.json"] {
        let path = test.root().join(catalog);
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms)?;
    }

    let out = test.run(&["apply", "--apply", "--key", "hello"])?;
    assert_eq!(out.code, Some(1));
    assert!(out.stdout.contains("no catalog could be updated for 'hello'"));
    assert!(out.stdout.contains("messages/en.json is read-only"));

    assert_eq!(
        test.read_file("messages/en.json")?,
        r#"{"hello": "Hello", "about_title": "About"}"#
    );
    assert_eq!(
        test.read_file("src/lib/Nav.svelte")?,
        "<a href=\"/\">{m.hello()}</a>\n"
    );

    Ok(())
}

#[test]
fn test_apply_unknown_key() -> Result<()> {
    let test = CliTest::with_project()?;

    let out = test.run(&["apply", "--key", "nope"])?;
    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains("warning: no suggestion for key \"nope\""));
    assert!(out.stdout.contains("Nothing to migrate"));

    Ok(())
}
