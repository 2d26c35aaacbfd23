use anyhow::Result;

use crate::CliTest;

#[test]
fn test_suggest_ranks_by_confidence() -> Result<()> {
    let test = CliTest::with_project()?;

    let out = test.run(&["suggest"])?;
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);

    let about = out
        .stdout
        .find("about_title -> about.about_title  100%")
        .expect("about_title suggestion");
    let hello = out
        .stdout
        .find("hello -> home.hello  75%")
        .expect("hello suggestion");
    assert!(about < hello);
    assert!(out.stdout.contains("3 of 4 usages (75%) are in 1 file under 'home'"));
    assert!(out.stdout.contains("2 suggestions at confidence >= 60%"));

    Ok(())
}

#[test]
fn test_suggest_threshold_override() -> Result<()> {
    let test = CliTest::with_project()?;

    let out = test.run(&["suggest", "--threshold", "0.8"])?;
    assert!(out.stdout.contains("about_title -> about.about_title"));
    assert!(!out.stdout.contains("home.hello"));

    let out = test.run(&["suggest", "--threshold", "0.3"])?;
    assert_eq!(out.code, Some(2));
    assert!(out.stderr.contains("--threshold"));

    Ok(())
}

#[test]
fn test_suggest_nothing_to_do() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file("src/lib/Nav.svelte", "{m.hello()}")?;

    let out = test.run(&["suggest"])?;
    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains("No flat keys to namespace"));

    Ok(())
}
