//! End-to-end tests for the virtmem binary.

use std::process::{Command, Output};

use virtmem::PAGE_SIZE;

fn virtmem(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_virtmem"))
        .args(args)
        .output()
        .expect("failed to run virtmem")
}

fn stats_line(output: &Output) -> Vec<u64> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().last().expect("no output");
    line.split_whitespace().map(|t| t.parse().unwrap()).collect()
}

#[test]
fn test_scan_prints_result_and_stats() {
    let output = virtmem(&["4", "2", "rand", "scan", "--seed", "3"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("scan result is "));

    let stats = stats_line(&output);
    assert_eq!(stats.len(), 3);
    let (faults, reads, writes) = (stats[0], stats[1], stats[2]);
    assert!(faults >= 4);
    assert!(reads <= faults);
    assert!(writes <= reads);
}

#[test]
fn test_unknown_policy_rejected() {
    let output = virtmem(&["4", "2", "lru", "scan"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown replacement policy: lru"));
}

#[test]
fn test_unknown_program_rejected() {
    let output = virtmem(&["4", "2", "fifo", "grep"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown program: grep"));
}

#[test]
fn test_wrong_argument_count() {
    let output = virtmem(&["4", "2"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_zero_frames_rejected() {
    let output = virtmem(&["4", "0", "fifo", "scan"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_file_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("myvirtualdisk");
    let disk_arg = format!("--disk={}", path.to_str().unwrap());

    let on_file = virtmem(&["3", "2", "custom", "focus", &disk_arg]);
    assert!(on_file.status.success());
    assert_eq!(std::fs::metadata(&path).unwrap().len(), (3 * PAGE_SIZE) as u64);

    let in_memory = virtmem(&["3", "2", "custom", "focus"]);
    assert_eq!(on_file.stdout, in_memory.stdout);
}

#[test]
fn test_bare_disk_flag_before_positionals() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_virtmem"))
        .args(["--disk", "3", "2", "fifo", "scan"])
        .current_dir(dir.path())
        .output()
        .expect("failed to run virtmem");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stats_line(&output).len(), 3);
    let disk = dir.path().join(virtmem::DEFAULT_DISK_FILE);
    assert_eq!(std::fs::metadata(disk).unwrap().len(), (3 * PAGE_SIZE) as u64);
}

#[test]
fn test_oversized_page_count_rejected() {
    let npages = (usize::MAX / 2).to_string();
    let output = virtmem(&[&npages, "1", "fifo", "scan"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("too large"));
}
