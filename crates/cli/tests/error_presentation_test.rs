use std::process::{Command, Stdio};

fn run_tabletree_with_empty_stdin(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_tabletree"))
        .args(args)
        .stdin(Stdio::null())
        .output()
        .unwrap_or_else(|error| panic!("failed to run tabletree: {error}"))
}

#[test]
fn missing_desired_schema_input_is_reported_with_usage_category() {
    let output = run_tabletree_with_empty_stdin(&["app"]);

    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[usage]"), "stderr must carry the usage category, got: {stderr}");
    assert!(stderr.contains("--dir"), "stderr must point at the fix, got: {stderr}");
}
