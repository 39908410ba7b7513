use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::time::Duration;

use anyhow::{ensure, Context as _};
use serde::Deserialize;

use crate::testing::{CaseMatcher, ProcessRunner, Workspace};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    pub judge: JudgeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub timeout_secs: u64,
    pub scratch_dir: PathBuf,
    pub output_file: String,
    pub expected_template: String,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: ProcessRunner::DEFAULT_TIME_LIMIT.as_secs(),
            scratch_dir: Workspace::DEFAULT_DIR.into(),
            output_file: Workspace::DEFAULT_OUTPUT_FILE_NAME.to_owned(),
            expected_template: CaseMatcher::DEFAULT_TEMPLATE.to_owned(),
        }
    }
}

impl Config {
    pub const FILENAME: &'static str = "batchjudge.toml";

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_if_exists(&filepath)
            .context("Cannot read a file")?
            .with_context(|| format!("Config file not found: {:?}", filepath))?;
        let toml = String::from_utf8(toml)
            .with_context(|| format!("Config is not valid UTF-8: {:?}", filepath))?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Find config file in ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> Option<PathBuf> {
        cur_dir
            .as_ref()
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
    }

    /// Built-in defaults apply when no config file is found.
    pub fn from_file_finding_in_ancestors_or_default(
        cur_dir: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        match Self::find_file_in_ancestors(cur_dir) {
            Some(path) => {
                log::debug!("Using config {:?}", path);
                Self::from_toml_file(path)
            }
            None => Ok(Self::default()),
        }
    }
}

impl JudgeConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.timeout_secs > 0, "timeout_secs must be positive");
        ensure!(
            self.expected_template.contains(CaseMatcher::ID_PLACEHOLDER),
            "expected_template '{}' must contain '{}'",
            self.expected_template,
            CaseMatcher::ID_PLACEHOLDER,
        );

        let is_plain_name = Path::new(&self.output_file)
            .file_name()
            .map_or(false, |name| name == self.output_file.as_str());
        ensure!(
            is_plain_name,
            "output_file '{}' must be a plain file name",
            self.output_file
        );
        let reserved = [
            Workspace::EXECUTABLE_NAME,
            Workspace::INPUT_FILE_NAME,
            Workspace::EXPECTED_FILE_NAME,
        ];
        ensure!(
            !reserved.contains(&self.output_file.as_str()),
            "output_file '{}' collides with a staged file name",
            self.output_file
        );
        Ok(())
    }
}
