use owo_colors::{OwoColorize, Stream, Style};

use crate::stats;
use crate::types::{BenchReport, OutputFormat};

/// Output for the chosen format. `json` wins over `format`.
pub fn render(report: &BenchReport, format: OutputFormat, json: bool) -> String {
    if json {
        return format_json(report);
    }
    match format {
        OutputFormat::Plain => format_plain(report),
        OutputFormat::Summary => format_summary(report),
    }
}

/// The reported value in seconds, on its own line. Always printed as a
/// float: `0.0`, `2.0`, `1e-5`.
pub fn format_plain(report: &BenchReport) -> String {
    format!("{:?}\n", report.seconds)
}

pub fn format_json(report: &BenchReport) -> String {
    match serde_json::to_string_pretty(report) {
        Ok(json) => format!("{}\n", json),
        Err(_) => "{}\n".to_string(),
    }
}

fn style_label() -> Style {
    Style::new().cyan().bold()
}

/// Milliseconds with enough digits to tell kernel runs apart.
pub fn format_millis(seconds: f64) -> String {
    format!("{:.3} ms", seconds * 1e3)
}

/// Human-readable run table with header, one row per run, footer.
pub fn format_summary(report: &BenchReport) -> String {
    let mut out = String::new();

    let header = format!(
        "{} @{} ({} run{}, {} warm-up)",
        report.function_name,
        report.entry_point,
        report.runs.len(),
        if report.runs.len() == 1 { "" } else { "s" },
        report.warmup
    );
    out.push_str(
        &header
            .if_supports_color(Stream::Stdout, |s| s.style(style_label()))
            .to_string(),
    );
    out.push('\n');

    let args = if report.arguments.is_empty() {
        "(none)".to_string()
    } else {
        report.arguments.join(", ")
    };
    out.push_str(&format!(
        "  {} {}\n\n",
        "arguments:".if_supports_color(Stream::Stdout, |s| s.dimmed()),
        args
    ));

    let index_width = report.runs.len().to_string().len();
    for (i, run) in report.runs.iter().enumerate() {
        let idx = format!("{:>width$}", i, width = index_width);
        let kernel = format!("{:>12}", format_millis(run.seconds));
        let wall = format!("{:>12}", format_millis(run.wall_seconds));
        out.push_str(&format!(
            "  {}  {}  {}\n",
            idx.if_supports_color(Stream::Stdout, |s| s.style(style_label())),
            kernel.if_supports_color(Stream::Stdout, |s| s.yellow()),
            format!("(wall {})", wall.trim_start()).if_supports_color(Stream::Stdout, |s| s.dimmed()),
        ));
    }

    let samples: Vec<f64> = report.runs.iter().map(|r| r.seconds).collect();
    out.push('\n');
    if let (Some((lo, hi)), Some(mean)) = (stats::min_max(&samples), stats::mean(&samples))
        && samples.len() > 1
    {
        out.push_str(&format!(
            "  min {}  mean {}  max {}\n",
            format_millis(lo),
            format_millis(mean),
            format_millis(hi)
        ));
    }

    let label = if report.runs.len() == 1 { "result" } else { "median" };
    out.push_str(&format!(
        "  {}: {} s\n",
        label.if_supports_color(Stream::Stdout, |s| s.style(style_label())),
        report.seconds.if_supports_color(Stream::Stdout, |s| s.green())
    ));

    out
}
