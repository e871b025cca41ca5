//! Read-eval loop tests: the shell binary driven through piped stdin.

use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Run the shell in line mode with `input` on stdin.
fn session(input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tabshell"))
        .arg("--no-raw")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn shell");
    let mut stdin = child.stdin.take().expect("piped stdin");
    stdin.write_all(input.as_bytes()).expect("write input");
    drop(stdin);
    child.wait_with_output().expect("wait for shell")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn exit_stops_the_loop_with_its_status() {
    let output = session("echo 'a  b'\"c\"\nexit 7\necho after\n");
    assert_eq!(output.status.code(), Some(7));
    assert_eq!(stdout(&output), "$ a  bc\r\n$ ");
    assert_eq!(stderr(&output), "");
}

#[test]
fn end_of_input_ends_with_success() {
    let output = session("echo one\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "$ one\r\n$ ");
}

#[test]
fn empty_input_only_prompts() {
    let output = session("");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "$ ");
}

#[test]
fn final_line_without_newline_still_runs() {
    let output = session("echo first\necho last");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "$ first\r\n$ last\r\n$ ");
}

#[test]
fn syntax_error_is_reported_and_loop_continues() {
    let output = session("echo 'oops\necho ok\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "$ $ ok\r\n$ ");
    assert_eq!(
        stderr(&output),
        "invalid command: unterminated quote: missing closing '\r\n"
    );
}

#[test]
fn redirection_error_is_reported_and_loop_continues() {
    let output = session("echo hi >\necho ok\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "$ $ ok\r\n$ ");
    assert_eq!(
        stderr(&output),
        "failed redirecting: redirect specified but no target file given after '>'\r\n"
    );
}

#[test]
fn unknown_command_does_not_end_the_session() {
    let output = session("no_such_command_here\necho still here\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "$ $ still here\r\n$ ");
    assert_eq!(stderr(&output), "no_such_command_here: command not found\r\n");
}

#[test]
fn custom_prompt_is_written_before_each_read() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tabshell"))
        .args(["--no-raw", "--prompt", "> "])
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn shell");
    child
        .stdin
        .take()
        .expect("piped stdin")
        .write_all(b"pwd\n")
        .expect("write input");
    let output = child.wait_with_output().expect("wait for shell");
    let text = stdout(&output);
    assert!(text.starts_with("> "), "{text:?}");
    assert!(text.ends_with("\r\n> "), "{text:?}");
}

#[test]
#[cfg(unix)]
fn child_reads_the_lines_after_its_command() {
    let output = session("sh -c 'read x; echo got:$x'\nhello\necho back\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "$ got:hello\n$ back\r\n$ ");
    assert_eq!(stderr(&output), "");
}

#[test]
fn one_shot_command_reports_its_status() {
    let output = Command::new(env!("CARGO_BIN_EXE_tabshell"))
        .args(["-c", "exit 3"])
        .env_remove("RUST_LOG")
        .output()
        .expect("run shell");
    assert_eq!(output.status.code(), Some(3));
}
