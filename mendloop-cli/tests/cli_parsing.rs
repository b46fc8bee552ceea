//! CLI argument parsing and end-to-end subcommand tests driven through
//! the binary with shell-backed stage commands.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn mendloop() -> Command {
    Command::cargo_bin("mendloop").expect("mendloop binary")
}

fn create_target_dir(files: &[&str]) -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    for name in files {
        fs::write(td.path().join(name), "print('hello')\n").unwrap();
    }
    td
}

#[test]
fn test_help_flag() {
    mendloop()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mendloop"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_version_flag() {
    mendloop()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mendloop"));
}

#[test]
fn test_unknown_subcommand() {
    mendloop()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid").or(predicate::str::contains("unrecognized")));
}

#[test]
fn test_run_without_stage_commands_fails() {
    let temp = create_target_dir(&["a.py"]);

    mendloop()
        .current_dir(temp.path())
        .arg("run")
        .arg("--delay-secs")
        .arg("0")
        .assert()
        .failure();
}

#[test]
fn test_run_happy_path_writes_artifacts() {
    let temp = create_target_dir(&["a.py", "b.py"]);

    mendloop()
        .current_dir(temp.path())
        .arg("run")
        .arg("--delay-secs")
        .arg("0")
        .arg("--audit-cmd")
        .arg("echo plan")
        .arg("--fix-cmd")
        .arg("true")
        .arg("--verify-cmd")
        .arg("true")
        .assert()
        .success();

    let out = temp.path().join("mendloop");
    assert!(out.join("report.json").exists());
    assert!(out.join("report.md").exists());
    assert!(out.join("run.jsonl").exists());
    assert!(out.join("audit").join("a.audit.md").exists());
    assert!(out.join("audit").join("b.audit.md").exists());
    assert!(out.join("artifacts").join("a.md").exists());

    let trail = fs::read_to_string(out.join("artifacts").join("a.md")).unwrap();
    assert!(trail.contains("# a.py"));
    assert!(trail.contains("validated (first try)"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("report.json")).unwrap()).unwrap();
    assert_eq!(report["result"], "success");
    assert_eq!(report["stats"]["total"], 2);
    assert_eq!(report["stats"]["first_try"], 2);
}

#[test]
fn test_run_exhaustion_exits_one() {
    let temp = create_target_dir(&["a.py"]);

    mendloop()
        .current_dir(temp.path())
        .arg("run")
        .arg("--delay-secs")
        .arg("0")
        .arg("--max-rounds")
        .arg("1")
        .arg("--audit-cmd")
        .arg("echo plan")
        .arg("--fix-cmd")
        .arg("true")
        .arg("--verify-cmd")
        .arg("false")
        .assert()
        .code(1);

    let report: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("mendloop").join("report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["result"], "failure");
    assert_eq!(report["artifacts"][0]["outcome"]["kind"], "failed_exhausted");
}

#[test]
fn test_run_mixed_batch_exits_two() {
    let temp = create_target_dir(&["good.py", "zbad.py"]);
    fs::write(
        temp.path().join("check.sh"),
        "case \"$1\" in *good*) exit 0;; *) exit 1;; esac\n",
    )
    .unwrap();

    // The verifier passes files whose name contains "good" and blocks the rest.
    mendloop()
        .current_dir(temp.path())
        .arg("run")
        .arg("--delay-secs")
        .arg("0")
        .arg("--max-rounds")
        .arg("1")
        .arg("--audit-cmd")
        .arg("echo plan")
        .arg("--fix-cmd")
        .arg("true")
        .arg("--verify-cmd")
        .arg("sh check.sh")
        .assert()
        .code(2);
}

#[test]
fn test_run_reads_stage_commands_from_config() {
    let temp = create_target_dir(&["a.py"]);
    fs::write(
        temp.path().join("mendloop.toml"),
        r#"
[run]
delay_secs = 0

[stages]
audit = ["echo", "plan"]
fix = ["true"]
verify = ["true"]
"#,
    )
    .unwrap();

    mendloop().current_dir(temp.path()).arg("run").assert().success();
}

#[test]
fn test_check_all_pass_exits_zero() {
    let temp = create_target_dir(&["a.py", "b.py"]);

    mendloop()
        .current_dir(temp.path())
        .arg("check")
        .arg("--delay-secs")
        .arg("0")
        .arg("--verify-cmd")
        .arg("true")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 pass, 0 blocking"));
}

#[test]
fn test_check_blocking_exits_one() {
    let temp = create_target_dir(&["a.py"]);

    mendloop()
        .current_dir(temp.path())
        .arg("check")
        .arg("--delay-secs")
        .arg("0")
        .arg("--verify-cmd")
        .arg("false")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("blocking"));
}

#[test]
fn test_invalid_max_rounds_non_numeric() {
    mendloop()
        .arg("run")
        .arg("--max-rounds")
        .arg("abc")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid"));
}
