// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

pub mod automaton;
pub mod descent;
pub mod driver;
pub mod grammar;
pub mod item;
pub mod symbol;
pub mod table;
pub mod tree;

pub use crate::automaton::{Automaton, LrVariant, State};
pub use crate::descent::DescentDriver;
pub use crate::driver::{LrDriver, ParseError, ParseFailure, ParseOutput};
pub use crate::grammar::{prod, teaching_grammar, Grammar, GrammarBuilder, GrammarError, Production};
pub use crate::symbol::{NonTerminal, Symbol, TerminalSet};
pub use crate::table::{Action, ActionTable, Conflict, ConflictPolicy, TableError};
pub use crate::tree::{NodeId, NodeKind, SdtAttributes, SyntaxTree};
