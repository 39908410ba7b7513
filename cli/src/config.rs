use batchjudge_core::config::{Config, JudgeConfig};

use crate::{cmd::Args, util};

/// Config file (explicit or discovered) overlaid with command-line flags.
pub fn load(args: &Args) -> anyhow::Result<JudgeConfig> {
    let file_cfg = match &args.config {
        Some(path) => Config::from_toml_file(path.clone())?,
        None => Config::from_file_finding_in_ancestors_or_default(util::current_dir())?,
    };
    let cfg = with_args(file_cfg.judge, args);
    cfg.validate()?;
    Ok(cfg)
}

pub fn with_args(mut cfg: JudgeConfig, args: &Args) -> JudgeConfig {
    let Args {
        program: _,
        input_dir: _,
        output_dir: _,
        config: _,
        timeout,
        scratch_dir,
        output_file,
        report_json: _,
    } = args;

    if let Some(secs) = timeout {
        cfg.timeout_secs = *secs;
    }
    if let Some(dir) = scratch_dir {
        cfg.scratch_dir = dir.clone();
    }
    if let Some(name) = output_file {
        cfg.output_file = name.clone();
    }
    cfg
}
