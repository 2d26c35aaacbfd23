use anyhow::Result;

use crate::CliTest;

#[test]
fn test_scan_lists_keys() -> Result<()> {
    let test = CliTest::with_project()?;

    let out = test.run(&["scan"])?;
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);

    let lines: Vec<&str> = out.stdout.lines().collect();
    assert_eq!(lines[0], "about_title  1 usage in 1 file");
    assert_eq!(lines[1], "hello        4 usages in 2 files");
    assert!(out.stdout.contains("Indexed 2 keys, 5 usages in 3 source files"));

    Ok(())
}

#[test]
fn test_scan_verbose_shows_sites() -> Result<()> {
    let test = CliTest::with_project()?;

    let out = test.run(&["scan", "--verbose"])?;
    assert!(out.stdout.contains("--> src/lib/Nav.svelte:1:13 <a href=\"/\">{m.hello()}</a>"));
    assert!(out.stdout.contains("--> src/routes/home/+page.svelte:3:4"));

    Ok(())
}

#[test]
fn test_scan_respects_config() -> Result<()> {
    let test = CliTest::with_project()?;
    test.write_file(
        ".nestkeyrc.json",
        r#"{ "ignores": ["src/lib"], "messageAccessor": "m" }"#,
    )?;
    test.write_file("src/routes/home/page.test.ts", "m.hello()")?;

    let out = test.run(&["scan"])?;
    assert!(out.stdout.contains("3 usages in 1 file"));
    assert!(out.stdout.contains("in 2 source files"));

    Ok(())
}

#[test]
fn test_scan_reports_unreadable_files() -> Result<()> {
    let test = CliTest::with_project()?;
    std::fs::write(test.root().join("src/lib/broken.ts"), [0xff, 0xfe, 0xfd])?;

    let out = test.run(&["scan"])?;
    assert_eq!(out.code, Some(0));
    assert!(out.stderr.contains("1 file(s) could not be read"));
    assert!(out.stdout.contains("in 3 source files"));

    Ok(())
}
