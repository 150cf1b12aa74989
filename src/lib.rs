// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;

pub mod cli;
pub mod diag;

pub use paslex::{teaching_lexicon, Lexicon, Location, Token, TokenKind, TokenStream};
pub use passyn::{
    teaching_grammar, ActionTable, Automaton, DescentDriver, Grammar, LrDriver, LrVariant,
    ParseError, ParseFailure, ParseOutput,
};
pub use pastac::{translate, SdtError, TacProgram, Translation};

/// Which parser drives the pipeline.  The executables pick this from the
/// build-time features; the library keeps it a runtime value so every
/// variant stays testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserChoice {
    RecursiveDescent,
    Lr0,
    Slr1,
    Lr1,
}

impl ParserChoice {
    /// The build-time selection: the first enabled feature wins, LR(1) is
    /// the default.
    pub fn configured() -> Self {
        if cfg!(feature = "recursive_descent") {
            ParserChoice::RecursiveDescent
        } else if cfg!(feature = "lr0") {
            ParserChoice::Lr0
        } else if cfg!(feature = "slr1") {
            ParserChoice::Slr1
        } else {
            ParserChoice::Lr1
        }
    }

    pub fn variant(self) -> Option<LrVariant> {
        match self {
            ParserChoice::RecursiveDescent => None,
            ParserChoice::Lr0 => Some(LrVariant::Lr0),
            ParserChoice::Slr1 => Some(LrVariant::Slr1),
            ParserChoice::Lr1 => Some(LrVariant::Lr1),
        }
    }
}

impl fmt::Display for ParserChoice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParserChoice::RecursiveDescent => write!(f, "recursive descent"),
            ParserChoice::Lr0 => write!(f, "LR(0)"),
            ParserChoice::Slr1 => write!(f, "SLR(1)"),
            ParserChoice::Lr1 => write!(f, "LR(1)"),
        }
    }
}

fn build_table(variant: LrVariant) -> ActionTable {
    let automaton = Automaton::build(grammar(), variant);
    let table = ActionTable::build(grammar(), &automaton, passyn::ConflictPolicy::PreferShift)
        .expect("prefer-shift conflict resolution never aborts");
    for conflict in table.conflicts() {
        diag::report_conflict(variant, conflict);
    }
    table
}

lazy_static! {
    static ref GRAMMAR: Grammar = teaching_grammar();
    static ref LEXICON: Arc<Lexicon> = teaching_lexicon();
    static ref LR0_TABLE: ActionTable = build_table(LrVariant::Lr0);
    static ref SLR1_TABLE: ActionTable = build_table(LrVariant::Slr1);
    static ref LR1_TABLE: ActionTable = build_table(LrVariant::Lr1);
}

/// The grammar shared by every parser in the process; built once,
/// read-only afterwards.
pub fn grammar() -> &'static Grammar {
    &GRAMMAR
}

/// The cached ACTION/GOTO table for a variant.  Construction conflicts are
/// reported to stderr the first time a table is built.
pub fn table(variant: LrVariant) -> &'static ActionTable {
    match variant {
        LrVariant::Lr0 => &LR0_TABLE,
        LrVariant::Slr1 => &SLR1_TABLE,
        LrVariant::Lr1 => &LR1_TABLE,
    }
}

pub fn token_stream(text: &str, label: &str) -> TokenStream {
    TokenStream::new(&LEXICON, text.to_string(), label.to_string())
}

/// Tokenizes source to a syntax tree and production trace with the chosen
/// parser.
pub fn parse_source(
    text: &str,
    label: &str,
    choice: ParserChoice,
) -> Result<ParseOutput, ParseFailure> {
    let mut tokens = token_stream(text, label);
    match choice.variant() {
        None => DescentDriver::new(grammar()).parse(&mut tokens),
        Some(variant) => LrDriver::new(grammar(), table(variant)).parse(&mut tokens),
    }
}

#[derive(Debug)]
pub enum CompileError {
    Parse(ParseFailure),
    Translate(SdtError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompileError::Parse(failure) => write!(f, "{}", failure),
            CompileError::Translate(error) => write!(f, "Semantic Error: {}.", error),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<ParseFailure> for CompileError {
    fn from(failure: ParseFailure) -> Self {
        CompileError::Parse(failure)
    }
}

impl From<SdtError> for CompileError {
    fn from(error: SdtError) -> Self {
        CompileError::Translate(error)
    }
}

/// The whole pipeline: tokens, tree, then three-address code.
pub fn compile_source(
    text: &str,
    label: &str,
    choice: ParserChoice,
) -> Result<Translation, CompileError> {
    let mut output = parse_source(text, label, choice)?;
    let translation = translate(&mut output.tree)?;
    Ok(translation)
}
