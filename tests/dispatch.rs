//! End-to-end dispatch tests: tokenizing, redirecting and running whole lines.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::rc::Rc;

use tabshell::completion::{CandidateSource, complete};
use tabshell::env::Environment;
use tabshell::io_adapters::MemWriter;
use tabshell::redirect::RedirectionError;
use tabshell::{Interpreter, ShellError};
use tempfile::TempDir;

/// Shell rooted in a fresh temporary directory with the process's PATH.
fn shell(dir: &TempDir) -> Interpreter {
    let mut vars = HashMap::new();
    if let Ok(path) = std::env::var("PATH") {
        vars.insert("PATH".to_string(), path);
    }
    Interpreter::default().with_environment(Environment::with_vars(vars, dir.path().into()))
}

fn run(sh: &mut Interpreter, line: &str) -> (Result<i32, ShellError>, String, String) {
    let (mut out, out_buf) = MemWriter::with_handle();
    let (mut err, err_buf) = MemWriter::with_handle();
    let res = sh.execute_line_with_output(line, &mut out, &mut err);
    (res, text(&out_buf), text(&err_buf))
}

fn text(buf: &Rc<RefCell<Vec<u8>>>) -> String {
    String::from_utf8(buf.borrow().clone()).unwrap()
}

fn read(dir: &TempDir, name: &str) -> String {
    fs::read_to_string(dir.path().join(name)).unwrap()
}

#[test]
fn echo_redirect_truncates_existing_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("out.txt"), "previous contents\n").unwrap();
    let mut sh = shell(&dir);

    let (res, out, err) = run(&mut sh, "echo hi > out.txt");
    assert_eq!(res.unwrap(), 0);
    assert_eq!(out, "");
    assert_eq!(err, "");
    assert_eq!(read(&dir, "out.txt"), "hi\r\n");
}

#[test]
fn echo_append_keeps_existing_content() {
    let dir = TempDir::new().unwrap();
    let mut sh = shell(&dir);

    run(&mut sh, "echo one >> out.txt").0.unwrap();
    run(&mut sh, "echo two >> out.txt").0.unwrap();
    assert_eq!(read(&dir, "out.txt"), "one\r\ntwo\r\n");
}

#[test]
fn quoted_target_with_spaces() {
    let dir = TempDir::new().unwrap();
    let mut sh = shell(&dir);

    run(&mut sh, "echo 'a  b' 1> 'my file.txt'").0.unwrap();
    assert_eq!(read(&dir, "my file.txt"), "a  b\r\n");
}

#[test]
#[cfg(unix)]
fn trailing_operator_runs_nothing() {
    let dir = TempDir::new().unwrap();
    let mut sh = shell(&dir);

    let (res, out, _) = run(&mut sh, "touch marker >");
    assert!(matches!(
        res,
        Err(ShellError::Redirection(RedirectionError::MissingTarget { ref operator })) if operator == ">"
    ));
    assert_eq!(out, "");
    assert!(!dir.path().join("marker").exists());
}

#[test]
#[cfg(unix)]
fn external_stderr_redirect() {
    let dir = TempDir::new().unwrap();
    let mut sh = shell(&dir);

    let (res, out, err) = run(&mut sh, "sh -c 'echo oops >&2; exit 2' 2> err.txt");
    assert_eq!(res.unwrap(), 2);
    assert_eq!(out, "");
    assert_eq!(err, "");
    assert_eq!(read(&dir, "err.txt"), "oops\nsh: exit status 2\r\n");
}

#[test]
#[cfg(unix)]
fn external_runs_in_shell_directory() {
    let dir = TempDir::new().unwrap();
    let mut sh = shell(&dir);

    let (res, _, _) = run(&mut sh, "touch created_here");
    assert_eq!(res.unwrap(), 0);
    assert!(dir.path().join("created_here").exists());
}

#[test]
fn type_reports_builtin_and_missing() {
    let dir = TempDir::new().unwrap();
    let mut sh = shell(&dir);

    let (res, out, _) = run(&mut sh, "type echo no_such_command_here");
    assert_eq!(res.unwrap(), 1);
    assert_eq!(
        out,
        "echo is a shell builtin\r\nno_such_command_here: not found\r\n"
    );
}

#[test]
fn exit_with_bad_code_keeps_running() {
    let dir = TempDir::new().unwrap();
    let mut sh = shell(&dir);

    let (res, _, err) = run(&mut sh, "exit abc");
    assert_eq!(res.unwrap(), 1);
    assert_eq!(err, "invalid exit code value: abc\r\n");
    assert!(!sh.env().should_exit);
}

#[test]
#[cfg(unix)]
fn completion_sees_builtins_and_path_executables() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let bin = dir.path().join("bin");
    fs::create_dir(&bin).unwrap();
    for (name, mode) in [("ecology", 0o755), ("echoer", 0o755), ("echo.txt", 0o644)] {
        let path = bin.join(name);
        fs::write(&path, "").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    }

    let mut vars = HashMap::new();
    vars.insert("PATH".to_string(), bin.to_string_lossy().to_string());
    let sh = Interpreter::default().with_environment(Environment::with_vars(vars, dir.path().into()));

    let names = sh.known_names();
    assert_eq!(complete("ec", &names), vec!["echo", "echoer", "ecology"]);
    assert_eq!(complete("ech", &names), vec!["echo", "echoer"]);
    assert!(complete("", &names).is_empty());
}
