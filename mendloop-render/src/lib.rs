//! Rendering helpers (markdown) for human-readable artifacts.

use mendloop_types::outcome::{ArtifactOutcome, ArtifactReport};
use mendloop_types::run::RunReport;
use mendloop_types::stats::RunResult;

pub fn render_run_md(run: &RunReport) -> String {
    let mut out = String::new();
    out.push_str("# mendloop run\n\n");
    out.push_str(&format!("- Run id: `{}`\n", run.run_id));
    if let Some(target) = &run.target {
        out.push_str(&format!("- Target: `{}`\n", target));
    }
    out.push_str(&format!("- Result: **{}**\n", result_label(run.result)));
    out.push_str(&format!(
        "- Artifacts: {} ({} validated, {} failed)\n",
        run.stats.total, run.stats.validated, run.stats.failed
    ));
    out.push_str(&format!(
        "- First try: {}, self-healed: {}\n",
        run.stats.first_try, run.stats.self_healed
    ));
    out.push_str(&format!(
        "- Iterations: {} total, {:.2} per artifact\n\n",
        run.stats.total_iterations,
        run.stats.average_iterations()
    ));

    out.push_str("## Artifacts\n\n");
    if run.artifacts.is_empty() {
        out.push_str("_No artifacts processed._\n");
        return out;
    }

    for (i, artifact) in run.artifacts.iter().enumerate() {
        out.push_str(&render_artifact_section(i + 1, artifact));
    }

    out
}

pub fn render_artifact_md(report: &ArtifactReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", report.artifact.name()));
    out.push_str(&render_artifact_body(report));
    out
}

fn render_artifact_section(index: usize, report: &ArtifactReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("### {}. {}\n\n", index, report.artifact));
    out.push_str(&render_artifact_body(report));
    out
}

fn render_artifact_body(report: &ArtifactReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("- Outcome: `{}`\n", report.outcome.label()));
    if let ArtifactOutcome::ValidatedAfterHealing { rounds } = report.outcome {
        out.push_str(&format!("- Healed on round: {}\n", rounds));
    }
    out.push_str(&format!("- Iterations: {}\n", report.iterations()));

    for record in &report.rounds {
        out.push_str(&format!("\n**Round {}**\n\n", record.round));
        let fix_label = if record.fix.is_success() { "ok" } else { "failed" };
        match &record.fix.message {
            Some(message) => out.push_str(&format!("- Fix: `{}`: {}\n", fix_label, message)),
            None => out.push_str(&format!("- Fix: `{}`\n", fix_label)),
        }
        match &record.findings {
            None => out.push_str("- Verify: not attempted\n"),
            Some(findings) if findings.is_pass() => out.push_str("- Verify: `pass`\n"),
            Some(findings) => {
                out.push_str(&format!(
                    "- Verify: `blocking` ({} findings)\n",
                    findings.findings.len()
                ));
                for finding in &findings.findings {
                    let line = finding
                        .line
                        .map(|l| format!("line {}", l))
                        .unwrap_or_else(|| "-".to_string());
                    out.push_str(&format!(
                        "  - `{}` at {}: {}\n",
                        finding.kind, line, finding.description
                    ));
                    if !finding.suggestion.is_empty() {
                        out.push_str(&format!("    - suggestion: {}\n", finding.suggestion));
                    }
                }
                for improvement in &findings.improvements {
                    out.push_str(&format!("  - improvement (non-blocking): {}\n", improvement));
                }
            }
        }
    }

    out.push('\n');
    out
}

fn result_label(result: RunResult) -> &'static str {
    match result {
        RunResult::Success => "success",
        RunResult::PartialSuccess => "partial success",
        RunResult::Failure => "failure",
    }
}
