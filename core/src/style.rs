use std::collections::HashMap;

use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;
use strum::IntoEnumIterator;

use crate::testing::{JudgeCode, LineDiff, SessionReport};

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false
    };
    matches!(v.as_str(), "truecolor" | "24bit")
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for JudgeCode {
    fn color(&self) -> Color {
        use JudgeCode::*;
        if !self::is_truecolor_supported() {
            return match self {
                AC => Color::Green,
                WA => Color::Yellow,
                TLE => Color::Red,
            };
        }

        match self {
            AC => Color::TrueColor {
                r: 30,
                g: 180,
                b: 40,
            },
            WA => Color::TrueColor {
                r: 210,
                g: 138,
                b: 4,
            },
            TLE => Color::TrueColor {
                r: 220,
                g: 42,
                b: 42,
            },
        }
    }
}

pub fn judge_icon(judge: JudgeCode) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {} ", judge)
        .on_color(judge.color())
        .bold()
        .color(fg)
}

/// `(i/total) name`
pub fn case_label(index: usize, total: usize, name: &str) -> String {
    format!("({}/{}) {}", index + 1, total, name)
}

pub fn print_mismatch_detail(diff: &LineDiff) {
    let (cols, _) = terminal::size().unwrap_or((40, 40));
    let thin_bar = "─".repeat(cols.min(80) as usize).dimmed();

    let show = |side: &Option<String>| match side {
        Some(line) => line.to_owned(),
        None => "<end of output>".dimmed().to_string(),
    };

    println!("{}", thin_bar);
    println!("{} {}", "First difference at line".bright_yellow(), diff.line_no);
    println!("  {} {}", "expected:".cyan(), show(&diff.expected));
    println!("  {} {}", "actual:  ".cyan(), show(&diff.actual));
    println!("{}", thin_bar);
}

pub fn print_session_summary(report: &SessionReport) {
    let bar = "-".repeat(5);
    print!("{} ", bar);

    let count: HashMap<JudgeCode, usize> =
        report.cases().iter().fold(HashMap::new(), |mut count, r| {
            *count.entry(r.judge).or_default() += 1;
            count
        });

    let num_total = report.total;
    let num_passed = report.passed();

    if report.all_passed() {
        let msg = format!("All {} tests passed ✨", num_total);
        print!("{}", msg.green());
    } else {
        let summary_msg = if num_passed > 0 {
            format!("{}/{} tests failed 💣", report.failed(), num_total)
        } else {
            format!("All {} tests failed 💀", num_total)
        };

        let detail_msg = JudgeCode::iter()
            .filter(|judge| !judge.is_pass())
            .filter_map(|judge| count.get(&judge).map(|&cnt| (judge, cnt)))
            .map(|(judge, cnt)| {
                format!(
                    "{}{}{}",
                    self::judge_icon(judge),
                    "x".dimmed(),
                    cnt.to_string().bold().bright_white(),
                )
            })
            .collect::<Vec<String>>()
            .join(", ");

        print!("{} ({})", summary_msg.bright_red(), detail_msg);
    }
    println!(" {}", bar);

    let ratio = report
        .pass_ratio()
        .map_or_else(|| "N/A".to_owned(), |r| format!("{:.3}", r));
    println!("Passed (passed/total): ({}/{})", num_passed, num_total);
    println!("Pass ratio: {}", ratio);
    println!("Failing cases: [{}]", report.failing_cases().join(", "));
}
