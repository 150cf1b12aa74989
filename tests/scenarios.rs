// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! End-to-end checks: source text in, three-address code out.

use pascomp::{compile_source, parse_source, ParseError, ParserChoice, TokenKind};
use passyn::prod;

const ALL_CHOICES: [ParserChoice; 4] = [
    ParserChoice::RecursiveDescent,
    ParserChoice::Lr0,
    ParserChoice::Slr1,
    ParserChoice::Lr1,
];

fn tac_lines(text: &str, choice: ParserChoice) -> Vec<String> {
    let translation =
        compile_source(text, "", choice).unwrap_or_else(|error| panic!("{:?}: {}", choice, error));
    translation
        .code
        .to_text()
        .lines()
        .map(|line| line.trim().to_string())
        .collect()
}

#[test]
fn simple_addition_compiles_everywhere() {
    for choice in ALL_CHOICES.iter() {
        assert_eq!(
            tac_lines("x = 1 + 2;", *choice),
            vec!["t0 := 1 + 2", "x := t0"],
            "wrong code from the {} parser",
            choice
        );
    }
}

#[test]
fn precedence_compiles_everywhere() {
    for choice in ALL_CHOICES.iter() {
        assert_eq!(
            tac_lines("x = a * b + c;", *choice),
            vec!["t0 := a * b", "t1 := t0 + c", "x := t1"]
        );
    }
}

#[test]
fn if_statement_compiles_everywhere() {
    for choice in ALL_CHOICES.iter() {
        assert_eq!(
            tac_lines("if x > 0 then y = 1;", *choice),
            vec!["if x > 0 goto L0", "goto L1", "L0:", "y := 1", "L1:"]
        );
    }
}

#[test]
fn while_statement_compiles_everywhere() {
    for choice in ALL_CHOICES.iter() {
        assert_eq!(
            tac_lines("while i < 10 do i = i + 1;", *choice),
            vec![
                "L0:",
                "if i < 10 goto L1",
                "goto L2",
                "L1:",
                "t0 := i + 1",
                "i := t0",
                "goto L0",
                "L2:"
            ]
        );
    }
}

#[test]
fn block_statement_compiles_everywhere() {
    for choice in ALL_CHOICES.iter() {
        assert_eq!(
            tac_lines("begin x = 1; y = 2; end;", *choice),
            vec!["x := 1", "y := 2"]
        );
    }
}

#[test]
fn the_assignment_trace_tail_is_canonical() {
    let output = parse_source("x = 1 + 2;", "", ParserChoice::Lr1).expect("must parse");
    let tail: Vec<u32> = output
        .trace
        .iter()
        .rev()
        .take(5)
        .rev()
        .copied()
        .collect();
    assert_eq!(
        tail,
        vec![
            prod::EXPR,
            prod::STMT_ASSIGN,
            prod::STMT_LINE,
            prod::PROGRAM_TAIL_EMPTY,
            prod::PROGRAM,
        ]
    );
}

#[test]
fn a_missing_expression_fails_with_the_expected_starters() {
    for choice in ALL_CHOICES.iter() {
        let error = compile_source("x = ;", "", *choice).expect_err("the compile must fail");
        let failure = match error {
            pascomp::CompileError::Parse(failure) => failure,
            other => panic!("expected a parse failure, got {}", other),
        };
        match &failure.diagnostics[0] {
            ParseError::Syntax { token, expected } => {
                assert_eq!(token.kind(), TokenKind::Semicolon);
                assert_eq!(
                    expected,
                    &vec![
                        TokenKind::LParen,
                        TokenKind::Ident,
                        TokenKind::OctInt,
                        TokenKind::DecInt,
                        TokenKind::HexInt,
                    ],
                    "wrong expected set from the {} parser",
                    choice
                );
            }
            other => panic!("expected a syntax diagnostic, got {}", other),
        }
    }
}

#[test]
fn octal_and_hex_literals_survive_to_the_code() {
    for choice in ALL_CHOICES.iter() {
        assert_eq!(
            tac_lines("x = 007 + 0xFF;", *choice),
            vec!["t0 := 007 + 0xFF", "x := t0"]
        );
    }
}
