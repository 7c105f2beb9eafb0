use std::process::Command;

fn run_tabletree(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_tabletree"))
        .args(args)
        .output()
        .unwrap_or_else(|error| panic!("failed to run tabletree: {error}"))
}

#[test]
fn missing_schema_argument_is_a_usage_error() {
    let output = run_tabletree(&[]);

    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: tabletree"));
    assert!(stderr.contains("<SCHEMA>"));
}

#[test]
fn rejects_unknown_flag() {
    let output = run_tabletree(&["app", "--not-a-real-flag"]);

    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unexpected argument"));
}
