use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use anyhow::{Context, Result};
use insta_cmd::get_cargo_bin;
use tempfile::TempDir;

mod apply;
mod init;
mod scan;
mod suggest;

const BIN_NAME: &str = "nestkey";

pub struct CliTest {
    _temp_dir: TempDir,
    project_dir: PathBuf,
}

impl CliTest {
    /// An empty project. The `.git` marker stops config discovery from
    /// walking above the temp directory.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().canonicalize()?;
        fs::create_dir(project_dir.join(".git"))?;
        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
        })
    }

    /// A small SvelteKit project:
    /// - `hello` is used 3 times under `routes/home` and once in `lib`
    /// - `about_title` is used once under `routes/about`
    pub fn with_project() -> Result<Self> {
        let test = Self::new()?;
        test.write_file(
            "src/routes/home/+page.svelte",
            "<h1>{m.hello()}</h1>\n<p>{m.hello()}</p>\n<p>{m.hello()}</p>\n",
        )?;
        test.write_file("src/lib/Nav.svelte", "<a href=\"/\">{m.hello()}</a>\n")?;
        test.write_file("src/routes/about/+page.svelte", "<h1>{m.about_title()}</h1>\n")?;
        test.write_file(
            "messages/en.json",
            r#"{"hello": "Hello", "about_title": "About"}"#,
        )?;
        test.write_file(
            "messages/de.json",
            r#"{"hello": "Hallo", "about_title": "Über uns"}"#,
        )?;
        Ok(test)
    }

    pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let file_path = self.project_dir.join(path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory:{}", parent.display()))?;
        }

        fs::write(&file_path, content)
            .with_context(|| format!("Failed to write file: {}", file_path.display()))?;

        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.project_dir
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(get_cargo_bin(BIN_NAME));
        cmd.current_dir(&self.project_dir);
        cmd.env_clear();
        cmd.env("NO_COLOR", "1"); // Disable colors for consistent test output
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Result<RunOutput> {
        let output = self.command().args(args).output()?;
        Ok(RunOutput::from(output))
    }

    pub fn read_file(&self, path: &str) -> Result<String> {
        let file_path = self.project_dir.join(path);
        fs::read_to_string(&file_path)
            .with_context(|| format!("Failed to read file: {}", file_path.display()))
    }

    pub fn read_json(&self, path: &str) -> Result<serde_json::Value> {
        let content = self.read_file(path)?;
        serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path))
    }

    /// Names of the files directly inside `dir`, sorted.
    pub fn list_dir(&self, dir: &str) -> Result<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(self.project_dir.join(dir))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        Ok(names)
    }
}

pub struct RunOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<Output> for RunOutput {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}
