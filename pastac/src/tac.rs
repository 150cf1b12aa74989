// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

const INITIAL_CODE_CAPACITY: usize = 64;

/// Three-address-code operations.  Only the first thirteen are produced by
/// the translator; `Param`/`Call`/`Return` round out the instruction set
/// for call-style extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Goto,
    Label,
    Param,
    Call,
    Return,
}

impl Op {
    pub fn is_relation(self) -> bool {
        match self {
            Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge => true,
            _ => false,
        }
    }

    pub fn is_arithmetic(self) -> bool {
        match self {
            Op::Add | Op::Sub | Op::Mul | Op::Div => true,
            _ => false,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Op::Assign => write!(f, ":="),
            Op::Add => write!(f, "+"),
            Op::Sub => write!(f, "-"),
            Op::Mul => write!(f, "*"),
            Op::Div => write!(f, "/"),
            Op::Eq => write!(f, "="),
            Op::Ne => write!(f, "<>"),
            Op::Lt => write!(f, "<"),
            Op::Le => write!(f, "<="),
            Op::Gt => write!(f, ">"),
            Op::Ge => write!(f, ">="),
            Op::Goto => write!(f, "goto"),
            Op::Label => write!(f, "label"),
            Op::Param => write!(f, "param"),
            Op::Call => write!(f, "call"),
            Op::Return => write!(f, "return"),
        }
    }
}

/// One instruction; `arg1`/`arg2` are genuinely optional per-op.  Every
/// embedded name is an owned copy, so the program is self-contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    op: Op,
    result: Option<String>,
    arg1: Option<String>,
    arg2: Option<String>,
    line_no: usize,
}

fn field(option: &Option<String>) -> &str {
    option.as_deref().unwrap_or("?")
}

impl Instruction {
    pub fn op(&self) -> Op {
        self.op
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn arg1(&self) -> Option<&str> {
        self.arg1.as_deref()
    }

    pub fn arg2(&self) -> Option<&str> {
        self.arg2.as_deref()
    }

    pub fn line_no(&self) -> usize {
        self.line_no
    }

    fn text(&self) -> String {
        match self.op {
            Op::Assign => format!("{} := {}", field(&self.result), field(&self.arg1)),
            Op::Add | Op::Sub | Op::Mul | Op::Div => format!(
                "{} := {} {} {}",
                field(&self.result),
                field(&self.arg1),
                self.op,
                field(&self.arg2)
            ),
            Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge => format!(
                "if {} {} {} goto {}",
                field(&self.arg1),
                self.op,
                field(&self.arg2),
                field(&self.result)
            ),
            Op::Goto => format!("goto {}", field(&self.result)),
            Op::Label => format!("{}:", field(&self.result)),
            Op::Param => format!("param {}", field(&self.arg1)),
            Op::Call => format!("call {}", field(&self.arg1)),
            Op::Return => match &self.arg1 {
                Some(arg1) => format!("return {}", arg1),
                None => "return".to_string(),
            },
        }
    }
}

/// An ordered three-address-code program.
#[derive(Debug, Default)]
pub struct TacProgram {
    instructions: Vec<Instruction>,
}

impl TacProgram {
    pub fn new() -> Self {
        Self {
            instructions: Vec::with_capacity(INITIAL_CODE_CAPACITY),
        }
    }

    pub fn emit(
        &mut self,
        op: Op,
        result: Option<String>,
        arg1: Option<String>,
        arg2: Option<String>,
    ) {
        let line_no = self.instructions.len();
        self.instructions.push(Instruction {
            op,
            result,
            arg1,
            arg2,
            line_no,
        });
    }

    pub fn emit_assign(&mut self, result: String, arg1: String) {
        self.emit(Op::Assign, Some(result), Some(arg1), None);
    }

    pub fn emit_binary(&mut self, op: Op, result: String, arg1: String, arg2: String) {
        debug_assert!(op.is_arithmetic());
        self.emit(op, Some(result), Some(arg1), Some(arg2));
    }

    /// `if arg1 op arg2 goto label`
    pub fn emit_branch(&mut self, op: Op, label: String, arg1: String, arg2: String) {
        debug_assert!(op.is_relation());
        self.emit(op, Some(label), Some(arg1), Some(arg2));
    }

    pub fn emit_goto(&mut self, label: String) {
        self.emit(Op::Goto, Some(label), None, None);
    }

    pub fn emit_label(&mut self, label: String) {
        self.emit(Op::Label, Some(label), None, None);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The textual form: labels start their line in column zero and every
    /// other instruction is indented four spaces, so a label reads as a
    /// heading for the body that follows it.  Consecutive labels each get
    /// their own line.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for instruction in self.instructions.iter() {
            if instruction.op == Op::Label {
                text += &format!("{}\n", instruction.text());
            } else {
                text += &format!("    {}\n", instruction.text());
            }
        }
        text
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.to_text().as_bytes())
    }

    pub fn print(&self) -> io::Result<()> {
        self.write(&mut io::stdout())
    }

    pub fn write_to_file(&self, file_path: &Path) -> io::Result<()> {
        let mut file = File::create(file_path)?;
        self.write(&mut file)
    }
}

impl fmt::Display for TacProgram {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_formats() {
        let mut program = TacProgram::new();
        program.emit_binary(Op::Add, "t0".to_string(), "1".to_string(), "2".to_string());
        program.emit_assign("x".to_string(), "t0".to_string());
        program.emit_branch(
            Op::Gt,
            "L0".to_string(),
            "x".to_string(),
            "0".to_string(),
        );
        program.emit_goto("L1".to_string());
        program.emit_label("L0".to_string());
        assert_eq!(
            program.to_text(),
            "    t0 := 1 + 2\n    x := t0\n    if x > 0 goto L0\n    goto L1\nL0:\n"
        );
    }

    #[test]
    fn consecutive_labels_get_their_own_lines() {
        let mut program = TacProgram::new();
        program.emit_label("L0".to_string());
        program.emit_label("L1".to_string());
        program.emit_assign("x".to_string(), "1".to_string());
        assert_eq!(program.to_text(), "L0:\nL1:\n    x := 1\n");
    }

    #[test]
    fn line_numbers_follow_emission_order() {
        let mut program = TacProgram::new();
        program.emit_assign("x".to_string(), "1".to_string());
        program.emit_assign("y".to_string(), "2".to_string());
        let line_nos: Vec<usize> = program
            .instructions()
            .iter()
            .map(|instruction| instruction.line_no())
            .collect();
        assert_eq!(line_nos, vec![0, 1]);
    }

    #[test]
    fn call_style_ops_format() {
        let mut program = TacProgram::new();
        program.emit(Op::Param, None, Some("x".to_string()), None);
        program.emit(Op::Call, None, Some("f".to_string()), None);
        program.emit(Op::Return, None, None, None);
        assert_eq!(program.to_text(), "    param x\n    call f\n    return\n");
    }
}
