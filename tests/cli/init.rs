use anyhow::{Context, Result};
use serde_json::Value;

use crate::CliTest;

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let out = test.run(&["init"])?;
    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains("Created .nestkeyrc.json"));

    let content = test.read_file(".nestkeyrc.json")?;
    let parsed: Value = serde_json::from_str(&content).context("Config should be valid JSON")?;
    assert_eq!(parsed["catalogPattern"], "{locale}.json");
    assert_eq!(parsed["messageAccessor"], "m");
    assert_eq!(parsed["confidenceThreshold"], 0.6);
    assert!(content.contains("\n  \"includes\""), "2-space indentation");

    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".nestkeyrc.json", "{}")?;

    let out = test.run(&["init"])?;
    assert_eq!(out.code, Some(1));
    assert!(out.stdout.contains(".nestkeyrc.json already exists"));
    assert_eq!(test.read_file(".nestkeyrc.json")?, "{}");

    Ok(())
}

#[test]
fn test_init_config_is_immediately_usable() -> Result<()> {
    let test = CliTest::with_project()?;
    test.run(&["init"])?;

    let out = test.run(&["scan"])?;
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);

    Ok(())
}

#[test]
fn test_invalid_config_is_an_error() -> Result<()> {
    let test = CliTest::with_project()?;
    test.write_file(".nestkeyrc.json", r#"{ "confidenceThreshold": 0.2 }"#)?;

    let out = test.run(&["scan"])?;
    assert_eq!(out.code, Some(2));
    assert!(out.stderr.contains("confidenceThreshold"));

    Ok(())
}
