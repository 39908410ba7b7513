use std::path::PathBuf;

use anyhow::Context as _;
use batchjudge_core::{action, style};

use crate::config;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Executable under test
    #[arg()]
    pub program: PathBuf,

    /// Directory with one input file per case; each name embeds a numeric id
    #[arg()]
    pub input_dir: PathBuf,

    /// Directory with the expected results (`cost<id>.txt` by default)
    #[arg()]
    pub output_dir: PathBuf,

    /// Config file (default: `batchjudge.toml` in the current or an ancestor dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Per-case wall-clock time limit
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Scratch dir recreated at session start
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// File name the program under test writes its answer to
    #[arg(long)]
    pub output_file: Option<String>,

    /// Also write the session report as JSON
    #[arg(long, value_name = "FILE")]
    pub report_json: Option<PathBuf>,
}

pub type CmdResult = anyhow::Result<()>;

impl Args {
    pub async fn exec(&self) -> CmdResult {
        let cfg = config::load(self)?;

        let report =
            action::run_session(&self.program, &self.input_dir, &self.output_dir, &cfg).await?;
        style::print_session_summary(&report);

        if let Some(path) = &self.report_json {
            fsutil::write_json_with_mkdir(path, &report)
                .with_context(|| format!("Failed to write report to {:?}", path))?;
            log::info!("Report written to {}", path.to_string_lossy());
        }
        Ok(())
    }
}
