pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}
use std::path::Path;
use std::result::Result as StdResult;
use std::time::Duration;

use colored::Colorize;
use error::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::JudgeConfig;
use crate::error::JudgeError;
use crate::style;
use crate::testing::{
    compare_files, CaseMatcher, CaseVerdict, JudgeCode, LineDiff, ProcessRunner, SessionReport,
    TestCase, Workspace,
};

/// Runs every case in `input_dir` against `program`, strictly one at a time.
///
/// Mismatches and timeouts accumulate in the report; any [`JudgeError`]
/// aborts the session immediately.
pub async fn run_session(
    program: impl AsRef<Path>,
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    cfg: &JudgeConfig,
) -> Result<SessionReport> {
    let program = program.as_ref();

    let mut ws = Workspace::new(&cfg.scratch_dir).output_file_name(&cfg.output_file);
    ws.reset().context("Failed to prepare scratch dir")?;
    ws.stage_executable(program)
        .context("Failed to stage the program under test")?;

    let inputs = fsutil::list_files_sorted(&input_dir).context("Failed to list input cases")?;
    let matcher = CaseMatcher::new(output_dir.as_ref()).template(&cfg.expected_template);
    let runner = ProcessRunner::new().time_limit(cfg.time_limit());

    log::info!(
        "Testing {} with {} cases (time limit {:?})",
        program.to_string_lossy(),
        inputs.len(),
        runner.get_time_limit(),
    );

    let spinner_style = ProgressStyle::default_spinner()
        .template("{spinner} {msg}")
        .map_err(|e| anyhow!("Invalid progress template: {}", e))?;

    let total = inputs.len();
    let mut report = SessionReport::new(total);

    for (i, input) in inputs.iter().enumerate() {
        let case = matcher.resolve(input)?;
        let label = style::case_label(i, total, case.name());

        let bar = ProgressBar::new_spinner()
            .with_style(spinner_style.clone())
            .with_message(format!("{} ...", label));
        bar.enable_steady_tick(Duration::from_millis(80));

        let (verdict, diff) = match self::judge_case(&ws, &runner, &case).await {
            Ok(res) => res,
            Err(e) => {
                bar.abandon_with_message(format!("{} ... {}", label, "aborted".bright_red()));
                return Err(e).with_context(|| format!("Case {} aborted the session", case.name()));
            }
        };

        let msg = format!(
            "{} ... {}{} [{}ms]",
            label,
            style::judge_icon(verdict.judge),
            " ".repeat(3 - verdict.judge.to_string().len()),
            verdict.elapsed.as_millis(),
        )
        .cyan()
        .to_string();
        if bar.is_hidden() {
            println!("{}", msg);
        }
        bar.finish_with_message(msg);
        if let Some(diff) = &diff {
            style::print_mismatch_detail(diff);
        }
        log::info!("{} => {}", case.name(), verdict.judge);
        report.record(verdict);
    }
    println!();

    Ok(report)
}

/// Stage, run, compare, clean up. Cleanup happens on every path out.
async fn judge_case(
    ws: &Workspace,
    runner: &ProcessRunner,
    case: &TestCase,
) -> StdResult<(CaseVerdict, Option<LineDiff>), JudgeError> {
    let staged = ws.stage_case(case)?;

    let outcome = runner
        .run_with_timeout(ws.executable_path(), ws.dir())
        .await?;
    outcome.ensure_judgeable()?;

    let (comparison, diff) = compare_files(ws.expected_path(), ws.output_path())?;
    staged.finish()?;

    let verdict = CaseVerdict {
        name: case.name().to_owned(),
        judge: JudgeCode::judge(&outcome, comparison),
        elapsed: outcome.elapsed,
        timed_out: outcome.timed_out(),
    };
    Ok((verdict, diff))
}
