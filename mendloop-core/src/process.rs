//! Command-backed stage clients.
//!
//! Each stage is one external collaborator command; the artifact path is
//! appended as the final argument. The fixer receives the audit report on
//! stdin and reads the findings hand-off document itself; the verifier
//! reports back through its exit status and, optionally, a structured
//! findings document on stdout. Timeout policy belongs to the collaborator
//! commands, not to the core.

use crate::error::{AuditError, FixError, VerifyError};
use crate::ports::{Auditor, Fixer, Verifier};
use anyhow::Context;
use mendloop_types::artifact::{Artifact, AuditReport};
use mendloop_types::finding::{Finding, FindingSet, kinds};
use mendloop_types::fix::FixResult;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Upper bound, in characters, on collaborator output carried into
/// findings and messages.
const OUTPUT_SNIPPET_CHARS: usize = 1000;

/// One collaborator command template.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Build from whitespace-split words; the first word is the program.
    pub fn parse(words: &[String]) -> anyhow::Result<Self> {
        let (program, args) = words
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("empty command"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn command(&self, artifact: &Artifact) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(artifact.as_path());
        cmd
    }
}

fn run_captured(mut cmd: Command, stdin: Option<&str>) -> anyhow::Result<Output> {
    let program = cmd.get_program().to_string_lossy().to_string();
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    let mut child = cmd.spawn().with_context(|| format!("spawn {program}"))?;
    // Feed stdin from a separate thread while the parent drains stdout and
    // stderr; writing inline would deadlock once both the input and the
    // child's output exceed the pipe buffer. The pipe is dropped when the
    // thread finishes, signalling EOF.
    let writer = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let input = input.to_string();
            Some(std::thread::spawn(move || pipe.write_all(input.as_bytes())))
        }
        _ => None,
    };
    let output = child
        .wait_with_output()
        .with_context(|| format!("wait for {program}"))?;
    // A child that exits without reading its input is legitimate; any
    // other write failure is an infrastructure error.
    if let Some(writer) = writer
        && let Ok(Err(err)) = writer.join()
        && err.kind() != std::io::ErrorKind::BrokenPipe
    {
        return Err(anyhow::Error::new(err).context(format!("write stdin of {program}")));
    }
    Ok(output)
}

fn snippet(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    match text.char_indices().nth(OUTPUT_SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

/// Runs a diagnostic command; its stdout becomes the audit report.
#[derive(Debug, Clone)]
pub struct ProcessAuditor {
    pub spec: CommandSpec,
}

impl Auditor for ProcessAuditor {
    fn audit(&self, artifact: &Artifact) -> Result<AuditReport, AuditError> {
        debug!(artifact = %artifact, program = %self.spec.program, "running audit command");
        let output = run_captured(self.spec.command(artifact), None)?;
        if !output.status.success() {
            return Err(AuditError(anyhow::anyhow!(
                "audit command exited with {}: {}",
                output.status,
                snippet(&output.stderr)
            )));
        }
        Ok(AuditReport::new(String::from_utf8_lossy(&output.stdout)))
    }
}

/// Runs a repair command that rewrites the artifact in place.
///
/// Exit 0 maps to a successful [`FixResult`]; a non-zero exit is a
/// collaborator-reported failure, not an infrastructure error.
#[derive(Debug, Clone)]
pub struct ProcessFixer {
    pub spec: CommandSpec,
}

impl Fixer for ProcessFixer {
    fn fix(
        &self,
        artifact: &Artifact,
        audit: &AuditReport,
        _findings: Option<&FindingSet>,
    ) -> Result<FixResult, FixError> {
        debug!(artifact = %artifact, program = %self.spec.program, "running fix command");
        let output = run_captured(self.spec.command(artifact), Some(audit.as_str()))?;
        if output.status.success() {
            let message = snippet(&output.stdout);
            Ok(FixResult::success(if message.is_empty() {
                "fix applied".to_string()
            } else {
                message
            }))
        } else {
            Ok(FixResult::failure(format!(
                "fix command exited with {}: {}",
                output.status,
                snippet(&output.stderr)
            )))
        }
    }
}

/// Runs a validation command and converts its output into a verdict.
///
/// If stdout carries a findings document it is used as-is (after
/// normalization); a document that looks structured but fails to parse
/// becomes a synthetic parse-error finding. Without structured output the
/// exit status decides: zero is a pass, anything else is blocking.
#[derive(Debug, Clone)]
pub struct ProcessVerifier {
    pub spec: CommandSpec,
}

impl Verifier for ProcessVerifier {
    fn verify(&self, artifact: &Artifact) -> Result<FindingSet, VerifyError> {
        debug!(artifact = %artifact, program = %self.spec.program, "running verify command");
        let output = run_captured(self.spec.command(artifact), None)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();

        if stdout.starts_with('{') {
            return Ok(match serde_json::from_str::<FindingSet>(stdout) {
                Ok(findings) => findings.normalized(),
                Err(err) => FindingSet::infra_failure(
                    kinds::PARSE_ERROR,
                    format!("unparseable verifier output: {err}"),
                ),
            });
        }

        if output.status.success() {
            Ok(FindingSet::pass())
        } else {
            Ok(FindingSet::blocking(vec![
                Finding::new(
                    kinds::CHECK_FAILED,
                    format!(
                        "verify command exited with {}: {}",
                        output.status,
                        snippet(&output.stderr)
                    ),
                )
                .with_suggestion("inspect the verifier output and re-run the fix"),
            ]))
        }
    }
}
