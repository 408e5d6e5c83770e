mod common;

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;

use common::{NpyArray, write_benchmark};

const SOURCE: &str = "module {\n  func.func @main(%A: memref<1xf64>) -> i64 {\n    %ns = arith.constant 0 : i64\n    return %ns : i64\n  }\n}\n";

/// A `jitbench` command isolated from the caller's environment: benchmarks
/// root and config dir live in `tmp`.
fn jitbench_cmd(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("jitbench").unwrap();
    cmd.env_remove("SHARED_LIBS");
    cmd.env_remove("MATRICES_FOLDER");
    cmd.env_remove("RUST_LOG");
    cmd.env("JITBENCH_ROOT", tmp.path());
    cmd.env("XDG_CONFIG_HOME", tmp.path().join("config"));
    cmd.env("HOME", tmp.path());
    cmd.env("NO_COLOR", "1");
    cmd
}

// ---- Required inputs ----

#[test]
fn empty_stdin_exits_1() {
    let tmp = TempDir::new().unwrap();
    jitbench_cmd(&tmp)
        .arg("axpy")
        .write_stdin("")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No input code was received"));
}

#[test]
fn missing_function_name_exits_1() {
    let tmp = TempDir::new().unwrap();
    jitbench_cmd(&tmp)
        .arg("--config")
        .arg(tmp.path().join("missing.toml"))
        .write_stdin(SOURCE)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Function name is required"))
        .stderr(predicate::str::contains("Failed to read config file").not());
}

#[test]
fn empty_stdin_is_reported_before_missing_name() {
    let tmp = TempDir::new().unwrap();
    jitbench_cmd(&tmp)
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No input code was received"));
}

#[test]
fn input_errors_are_plain_diagnostics() {
    let tmp = TempDir::new().unwrap();
    jitbench_cmd(&tmp)
        .write_stdin(SOURCE)
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error:").not());
}

// ---- Configuration ----

#[test]
fn zero_repeat_is_rejected() {
    let tmp = TempDir::new().unwrap();
    jitbench_cmd(&tmp)
        .args(["axpy", "--repeat", "0"])
        .write_stdin(SOURCE)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Repeat count must be at least 1"));
}

#[test]
fn repeat_and_median_conflict() {
    let tmp = TempDir::new().unwrap();
    jitbench_cmd(&tmp)
        .args(["axpy", "--repeat", "3", "--median"])
        .write_stdin(SOURCE)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn explicit_missing_config_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    jitbench_cmd(&tmp)
        .arg("axpy")
        .arg("--config")
        .arg(&missing)
        .write_stdin(SOURCE)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn malformed_config_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let cfg = tmp.path().join("jitbench.toml");
    std::fs::write(&cfg, "repeat = \"five\"\n").unwrap();
    jitbench_cmd(&tmp)
        .arg("axpy")
        .arg("--config")
        .arg(&cfg)
        .write_stdin(SOURCE)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn help_lists_options() {
    let tmp = TempDir::new().unwrap();
    jitbench_cmd(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--repeat"))
        .stdout(predicate::str::contains("--median"))
        .stdout(predicate::str::contains("SHARED_LIBS"));
}

// ---- Engine ----

#[cfg(not(feature = "mlir"))]
#[test]
fn without_engine_the_run_fails_cleanly() {
    let tmp = TempDir::new().unwrap();
    write_benchmark(
        tmp.path(),
        "matrices",
        "axpy",
        SOURCE,
        &[NpyArray::new("A", &[1], &[1.0])],
    );

    jitbench_cmd(&tmp)
        .arg("axpy")
        .env("SHARED_LIBS", "")
        .write_stdin(SOURCE)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Error: benchmark 'axpy' failed"))
        .stderr(predicate::str::contains("`mlir` feature"));
}

/// Already lowered to the LLVM dialect; returns 2.5 ms worth of nanoseconds.
#[cfg(feature = "mlir")]
const KERNEL: &str = r#"module {
  llvm.func @_mlir_ciface_main(%lhs: !llvm.ptr) -> i64 {
    %ns = llvm.mlir.constant(2500000 : i64) : i64
    llvm.return %ns : i64
  }
}
"#;

#[cfg(feature = "mlir")]
fn kernel_home() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_benchmark(
        tmp.path(),
        "matrices",
        "scale",
        KERNEL,
        &[NpyArray::new("lhs", &[2], &[1.0, 2.0])],
    );
    tmp
}

#[cfg(feature = "mlir")]
#[test]
fn real_kernel_prints_seconds() {
    let tmp = kernel_home();
    jitbench_cmd(&tmp)
        .arg("scale")
        .write_stdin(KERNEL)
        .assert()
        .success()
        .stdout("0.0025\n");
}

#[cfg(feature = "mlir")]
#[test]
fn real_kernel_json_wins_over_format() {
    let tmp = kernel_home();
    let output = jitbench_cmd(&tmp)
        .args(["scale", "--median", "--format", "summary", "--json"])
        .write_stdin(KERNEL)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["function_name"], "scale");
    assert_eq!(report["arguments"][0], "lhs");
    assert_eq!(report["runs"].as_array().unwrap().len(), 5);
    assert_eq!(report["seconds"], 0.0025);
}

#[cfg(feature = "mlir")]
#[test]
fn real_kernel_summary() {
    let tmp = kernel_home();
    jitbench_cmd(&tmp)
        .args(["scale", "--repeat", "2", "--format", "summary"])
        .write_stdin(KERNEL)
        .assert()
        .success()
        .stdout(predicate::str::contains("scale @main (2 runs, 0 warm-up)"))
        .stdout(predicate::str::contains("2.500 ms"))
        .stdout(predicate::str::contains("median"));
}

#[cfg(feature = "mlir")]
#[test]
fn unlowered_module_fails_to_build_an_engine() {
    let tmp = TempDir::new().unwrap();
    write_benchmark(
        tmp.path(),
        "matrices",
        "axpy",
        SOURCE,
        &[NpyArray::new("A", &[1], &[1.0])],
    );

    jitbench_cmd(&tmp)
        .arg("axpy")
        .write_stdin(SOURCE)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to create execution engine"));
}
