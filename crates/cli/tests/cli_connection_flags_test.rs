use std::process::Command;

fn run_tabletree(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_tabletree"))
        .args(args)
        .output()
        .unwrap_or_else(|error| panic!("failed to run tabletree: {error}"))
}

#[test]
fn help_lists_connection_flags() {
    let output = run_tabletree(&["--help"]);

    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--host"));
    assert!(stdout.contains("--port"));
    assert!(stdout.contains("--user"));
    assert!(stdout.contains("--password"));
    assert!(stdout.contains("--socket"));
}

#[test]
fn help_lists_reconciliation_flags() {
    let output = run_tabletree(&["--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--dry-run"));
    assert!(stdout.contains("--allow-drop-table"));
    assert!(stdout.contains("--allow-drop-column"));
    assert!(stdout.contains("--ignore-table"));
}
