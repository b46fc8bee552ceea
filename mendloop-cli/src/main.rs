mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::ConfigMerger;
use fs_err as fs;
use mendloop_core::adapters::{FsHandoffSink, JsonlReporter, SleepThrottle};
use mendloop_core::orchestrator::run_batch;
use mendloop_core::ports::{CancelFlag, StageClients, Throttle, Verifier};
use mendloop_core::process::{CommandSpec, ProcessAuditor, ProcessFixer, ProcessVerifier};
use mendloop_core::settings::RunSettings;
use mendloop_render::{render_artifact_md, render_run_md};
use mendloop_types::artifact::Artifact;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "mendloop",
    version,
    about = "Self-healing audit/fix/verify batch runner for source artifacts."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Audit, fix, and verify every artifact in the target directory.
    Run(RunArgs),
    /// Verify-only pass over the batch; exits zero iff every artifact passes.
    Check(CheckArgs),
}

#[derive(Debug, Parser)]
struct RunArgs {
    /// Target directory containing the artifacts (default: current directory).
    #[arg(long, default_value = ".")]
    target: Utf8PathBuf,

    /// Output directory for run artifacts (default: <target>/mendloop).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Extension of the files to collect (default: py).
    #[arg(long)]
    ext: Option<String>,

    /// Maximum (fix, verify) rounds per artifact (default: 3).
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Delay in seconds between external requests (default: 10).
    #[arg(long)]
    delay_secs: Option<u64>,

    /// Audit command; the artifact path is appended as the final argument.
    #[arg(long)]
    audit_cmd: Option<String>,

    /// Fix command; receives the audit report on stdin.
    #[arg(long)]
    fix_cmd: Option<String>,

    /// Verify command; may emit a JSON findings document on stdout.
    #[arg(long)]
    verify_cmd: Option<String>,
}

#[derive(Debug, Parser)]
struct CheckArgs {
    /// Target directory containing the artifacts (default: current directory).
    #[arg(long, default_value = ".")]
    target: Utf8PathBuf,

    /// Extension of the files to collect (default: py).
    #[arg(long)]
    ext: Option<String>,

    /// Delay in seconds between external requests (default: 10).
    #[arg(long)]
    delay_secs: Option<u64>,

    /// Verify command; may emit a JSON findings document on stdout.
    #[arg(long)]
    verify_cmd: Option<String>,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let target = args.target;
    let out_dir = args.out_dir.unwrap_or_else(|| target.join("mendloop"));

    let file_config = config::load_or_default(&target).context("load mendloop.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_args(
        args.max_rounds,
        args.delay_secs,
        args.ext.as_deref(),
        args.audit_cmd.as_deref(),
        args.fix_cmd.as_deref(),
        args.verify_cmd.as_deref(),
    );

    let auditor = ProcessAuditor {
        spec: stage_spec(&merged.audit, "audit")?,
    };
    let fixer = ProcessFixer {
        spec: stage_spec(&merged.fix, "fix")?,
    };
    let verifier = ProcessVerifier {
        spec: stage_spec(&merged.verify, "verify")?,
    };

    let artifacts = collect_artifacts(&target, &merged.ext)?;
    if artifacts.is_empty() {
        warn!(target = %target, ext = %merged.ext, "no artifacts found");
    }

    fs::create_dir_all(&out_dir).with_context(|| format!("create {}", out_dir))?;

    let handoff = FsHandoffSink::new(out_dir.join("findings.json"));
    let throttle = SleepThrottle::new(merged.delay);
    let mut reporter = JsonlReporter::create(&out_dir.join("run.jsonl"))?;

    let settings = RunSettings {
        max_rounds: merged.max_rounds,
        delay: merged.delay,
    };
    let mut report = run_batch(
        &settings,
        &artifacts,
        StageClients {
            auditor: &auditor,
            fixer: &fixer,
            verifier: &verifier,
            handoff: &handoff,
        },
        &throttle,
        &CancelFlag::new(),
        &mut reporter,
    );
    report.target = Some(target);

    let audit_dir = out_dir.join("audit");
    fs::create_dir_all(&audit_dir).with_context(|| format!("create {}", audit_dir))?;
    let trail_dir = out_dir.join("artifacts");
    fs::create_dir_all(&trail_dir).with_context(|| format!("create {}", trail_dir))?;
    for artifact_report in &report.artifacts {
        if let Some(audit) = &artifact_report.audit {
            let path = audit_dir.join(format!("{}.audit.md", artifact_report.artifact.stem()));
            fs::write(&path, audit.as_str()).with_context(|| format!("write {}", path))?;
        }
        let trail_path = trail_dir.join(format!("{}.md", artifact_report.artifact.stem()));
        fs::write(&trail_path, render_artifact_md(artifact_report))
            .with_context(|| format!("write {}", trail_path))?;
    }

    write_json(&out_dir.join("report.json"), &report)?;
    fs::write(out_dir.join("report.md"), render_run_md(&report))?;

    info!("wrote run artifacts to {}", out_dir);
    Ok(ExitCode::from(report.result.exit_code()))
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<ExitCode> {
    let target = args.target;

    let file_config = config::load_or_default(&target).context("load mendloop.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_args(
        None,
        args.delay_secs,
        args.ext.as_deref(),
        None,
        None,
        args.verify_cmd.as_deref(),
    );

    let verifier = ProcessVerifier {
        spec: stage_spec(&merged.verify, "verify")?,
    };
    let throttle = SleepThrottle::new(merged.delay);

    let artifacts = collect_artifacts(&target, &merged.ext)?;
    let mut blocked = 0usize;
    for (index, artifact) in artifacts.iter().enumerate() {
        if index > 0 {
            throttle.pause();
        }
        match verifier.verify(artifact) {
            Ok(findings) if findings.is_pass() => println!("{artifact}: pass"),
            Ok(findings) => {
                blocked += 1;
                println!("{artifact}: blocking ({} findings)", findings.findings.len());
            }
            Err(err) => {
                blocked += 1;
                println!("{artifact}: verify error: {err:#}");
            }
        }
    }
    println!(
        "checked {} artifacts: {} pass, {} blocking",
        artifacts.len(),
        artifacts.len() - blocked,
        blocked
    );

    Ok(if blocked == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn stage_spec(words: &[String], stage: &str) -> anyhow::Result<CommandSpec> {
    CommandSpec::parse(words).with_context(|| {
        format!("{stage} command not configured; set [stages].{stage} in mendloop.toml or pass --{stage}-cmd")
    })
}

/// Collect the batch: direct children of the target directory with the
/// configured extension, in lexicographic path order.
fn collect_artifacts(target: &Utf8Path, ext: &str) -> anyhow::Result<Vec<Artifact>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(target).with_context(|| format!("read target dir {}", target))? {
        let entry = entry.context("read dir entry")?;
        let path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|p| anyhow::anyhow!("non-UTF-8 path {}", p.display()))?;
        if path.is_file() && path.extension() == Some(ext) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths.into_iter().map(Artifact::new).collect())
}

fn write_json<T: serde::Serialize>(path: &Utf8Path, v: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(v).context("serialize json")?;
    fs::write(path, s).with_context(|| format!("write {}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp dir")
    }

    #[test]
    fn collect_filters_by_extension_and_sorts() {
        let temp = TempDir::new().expect("temp dir");
        let root = utf8(&temp);
        fs::write(root.join("b.py"), "").unwrap();
        fs::write(root.join("a.py"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::create_dir(root.join("sub.py")).unwrap();

        let artifacts = collect_artifacts(&root, "py").expect("collect");
        let names: Vec<&str> = artifacts.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["a.py", "b.py"]);
    }

    #[test]
    fn collect_empty_dir_yields_empty_batch() {
        let temp = TempDir::new().expect("temp dir");
        let artifacts = collect_artifacts(&utf8(&temp), "py").expect("collect");
        assert!(artifacts.is_empty());
    }

    #[test]
    fn stage_spec_names_the_missing_stage() {
        let err = stage_spec(&[], "verify").expect_err("must fail");
        assert!(format!("{err:#}").contains("--verify-cmd"));
    }
}
