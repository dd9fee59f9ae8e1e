use std::process::Command;

#[test]
fn main_lists_containers() {
    let bin = env!("CARGO_BIN_EXE_pidial");
    let output = Command::new(bin)
        .arg("--list-containers")
        .env("PIDIAL_TEST_CONTAINERS", "abc:web:running:nginx,def:db:exited:postgres")
        .output()
        .expect("run pidial");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("web [running]"));
    assert!(stdout.contains("db [exited]"));
}

#[test]
fn main_reports_no_containers() {
    let bin = env!("CARGO_BIN_EXE_pidial");
    let output = Command::new(bin)
        .arg("--list-containers")
        .env("PIDIAL_TEST_CONTAINERS", "")
        .output()
        .expect("run pidial");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<no containers>"));
}

#[test]
fn main_rejects_invalid_timing_flags() {
    let bin = env!("CARGO_BIN_EXE_pidial");
    let output = Command::new(bin)
        .args(["--doctor", "--debounce-ms", "0"])
        .output()
        .expect("run pidial");
    // Doctor renders even with bad flags so users can see what is wrong.
    assert!(output.status.success());
}
