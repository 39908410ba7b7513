use std::{fmt, process::ExitStatus, time::Duration};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::compare::Comparison;
use crate::error::JudgeError;

/// How a single run of the subject program ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitKind {
    Code(i32),
    Signaled(i32),
    TimedOut,
}

impl ExitKind {
    pub fn from_status(status: ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt as _;
        match (status.code(), status.signal()) {
            (Some(code), _) => ExitKind::Code(code),
            (None, Some(sig)) => ExitKind::Signaled(sig),
            // Neither code nor signal: treat as an unknown abnormal exit.
            (None, None) => ExitKind::Code(-1),
        }
    }
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExitKind::Code(code) => write!(f, "exitcode={}", code),
            ExitKind::Signaled(sig) => write!(f, "terminated by signal {}", sig),
            ExitKind::TimedOut => write!(f, "killed by watchdog"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub exit: ExitKind,
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn timed_out(&self) -> bool {
        self.exit == ExitKind::TimedOut
    }

    /// A run that ended abnormally without the watchdog being involved cannot
    /// be judged: the subject program itself is broken.
    pub fn ensure_judgeable(&self) -> Result<(), JudgeError> {
        match self.exit {
            ExitKind::Code(0) | ExitKind::TimedOut => Ok(()),
            exit => Err(JudgeError::FatalRun(exit)),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, Serialize,
)]
pub enum JudgeCode {
    AC,
    WA,
    TLE,
}

impl JudgeCode {
    /// Output that matches passes even when the watchdog fired.
    pub fn judge(outcome: &RunOutcome, comparison: Comparison) -> Self {
        match (comparison, outcome.timed_out()) {
            (Comparison::Match, _) => JudgeCode::AC,
            (Comparison::Mismatch, true) => JudgeCode::TLE,
            (Comparison::Mismatch, false) => JudgeCode::WA,
        }
    }

    pub fn is_pass(self) -> bool {
        self == JudgeCode::AC
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseVerdict {
    pub name: String,
    pub judge: JudgeCode,
    #[serde(serialize_with = "serialize_millis", rename = "elapsed_ms")]
    pub elapsed: Duration,
    pub timed_out: bool,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Accumulated result of a whole session, in case order.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub started_at: DateTime<Local>,
    pub total: usize,
    passed: usize,
    failed: usize,
    failing_cases: Vec<String>,
    cases: Vec<CaseVerdict>,
}

impl SessionReport {
    pub fn new(total: usize) -> Self {
        Self {
            started_at: Local::now(),
            total,
            passed: 0,
            failed: 0,
            failing_cases: Vec::new(),
            cases: Vec::with_capacity(total),
        }
    }

    pub fn record(&mut self, verdict: CaseVerdict) {
        if verdict.judge.is_pass() {
            self.passed += 1;
        } else {
            self.failed += 1;
            self.failing_cases.push(verdict.name.clone());
        }
        self.cases.push(verdict);
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn failing_cases(&self) -> &[String] {
        &self.failing_cases
    }

    pub fn cases(&self) -> &[CaseVerdict] {
        &self.cases
    }

    /// `None` for an empty session.
    pub fn pass_ratio(&self) -> Option<f64> {
        match self.total {
            0 => None,
            total => Some(self.passed as f64 / total as f64),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
