// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! Exit-code and stream behaviour of the executables.

use std::io::Write;
use std::process::{Command, Stdio};

fn run(exe: &str, args: &[&str], input: &str) -> (i32, String, String) {
    let mut child = Command::new(exe)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("the executable must spawn");
    child
        .stdin
        .as_mut()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("the input must be written");
    let output = child.wait_with_output().expect("the executable must finish");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[test]
fn the_code_generator_emits_tac_and_exits_zero() {
    let (code, stdout, _stderr) = run(env!("CARGO_BIN_EXE_pascomp_tac"), &[], "x = 1 + 2;");
    assert_eq!(code, 0);
    assert_eq!(stdout, "    t0 := 1 + 2\n    x := t0\n");
}

#[test]
fn a_syntax_error_exits_one_with_a_diagnostic() {
    let (code, stdout, stderr) = run(env!("CARGO_BIN_EXE_pascomp_tac"), &[], "x = ;");
    assert_eq!(code, 1);
    assert_eq!(stdout, "");
    assert!(stderr.contains("Syntax Error"));
    assert!(stderr.contains("\";\""));
    assert!(stderr.contains("(, id, int8, int10 or int16"));
}

#[test]
fn invalid_usage_exits_two() {
    let (code, _stdout, _stderr) = run(env!("CARGO_BIN_EXE_pascomp_tac"), &["--bogus"], "");
    assert_eq!(code, 2);
}

#[test]
fn an_unreadable_file_exits_one() {
    let (code, _stdout, stderr) = run(
        env!("CARGO_BIN_EXE_pascomp_tac"),
        &["-f", "no/such/file.pas"],
        "",
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("no/such/file.pas"));
}

#[test]
fn the_lexer_dumps_tokens_and_flags_bad_literals() {
    let (code, stdout, _stderr) = run(env!("CARGO_BIN_EXE_pascomp_lex"), &[], "007 089");
    assert_eq!(code, 1);
    assert!(stdout.contains("int8 \"007\""));
    assert!(stdout.contains("bad_int8 \"089\""));
}

#[test]
fn the_lexer_accepts_clean_input() {
    let (code, stdout, stderr) = run(env!("CARGO_BIN_EXE_pascomp_lex"), &[], "begin x end");
    assert_eq!(code, 0);
    assert_eq!(stderr, "");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("begin"));
    assert!(lines[1].contains("id \"x\""));
    assert!(lines[2].contains("end"));
}

#[test]
fn the_parser_prints_a_tree_for_good_input() {
    let (code, stdout, _stderr) = run(env!("CARGO_BIN_EXE_pascomp_parse"), &[], "x = 1;");
    assert_eq!(code, 0);
    assert!(stdout.contains("S: id = E"));
}

#[test]
fn the_parser_describes_the_state_machine() {
    let (code, stdout, _stderr) = run(env!("CARGO_BIN_EXE_pascomp_parse"), &["--describe"], "");
    assert_eq!(code, 0);
    assert!(stdout.contains("FIRST(E)"));
    assert!(stdout.contains("State 0:"));
}
