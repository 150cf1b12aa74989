// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::fmt;

use paslex::{Location, Token, TokenKind, TokenStream};

use crate::grammar::{prod, Grammar};
use crate::symbol::NonTerminal;
use crate::table::{Action, ActionTable};
use crate::tree::{NodeId, SyntaxTree};

const STACK_CAPACITY: usize = 128;

pub fn format_expected(expected: &[TokenKind]) -> String {
    let mut string = String::new();
    if expected.is_empty() {
        return string;
    }
    let last = expected.len() - 1;
    for (index, kind) in expected.iter().enumerate() {
        if index == 0 {
            string += &kind.to_string();
        } else {
            if index == last {
                string += " or ";
            } else {
                string += ", ";
            };
            string += &kind.to_string();
        }
    }
    string
}

#[derive(Debug, Clone)]
pub enum ParseError {
    Syntax {
        token: Token,
        expected: Vec<TokenKind>,
    },
    Lexical {
        error: paslex::Error,
        expected: Vec<TokenKind>,
    },
    InvalidLiteral {
        token: Token,
    },
    MissingGoto {
        state: u32,
        non_terminal: NonTerminal,
        location: Location,
    },
}

impl ParseError {
    pub fn location(&self) -> &Location {
        match self {
            ParseError::Syntax { token, .. } => token.location(),
            ParseError::Lexical { error, .. } => error.location(),
            ParseError::InvalidLiteral { token } => token.location(),
            ParseError::MissingGoto { location, .. } => location,
        }
    }

    pub fn expected(&self) -> &[TokenKind] {
        match self {
            ParseError::Syntax { expected, .. } | ParseError::Lexical { expected, .. } => expected,
            _ => &[],
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::Syntax { token, expected } => write!(
                f,
                "Syntax Error: expected: {} found: \"{}\" at: {}.",
                format_expected(expected),
                token.kind(),
                token.location()
            ),
            ParseError::Lexical { error, expected } => {
                if expected.is_empty() {
                    write!(f, "Lexical Error: {}.", error)
                } else {
                    write!(
                        f,
                        "Lexical Error: {}: expected: {}.",
                        error,
                        format_expected(expected)
                    )
                }
            }
            ParseError::InvalidLiteral { token } => {
                let flavour = match token.kind() {
                    TokenKind::BadOctInt => "octal",
                    _ => "hexadecimal",
                };
                write!(
                    f,
                    "Lexical Error: malformed {} literal \"{}\" at: {}.",
                    flavour,
                    token.lexeme(),
                    token.location()
                )
            }
            ParseError::MissingGoto {
                state,
                non_terminal,
                location,
            } => write!(
                f,
                "Parse Error: no goto on {} from state {} at: {}.",
                non_terminal, state, location
            ),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub diagnostics: Vec<ParseError>,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.diagnostics.first() {
            Some(error) => write!(f, "{}", error),
            None => write!(f, "parse failed"),
        }
    }
}

impl std::error::Error for ParseFailure {}

/// A successful parse: the concrete syntax tree plus the production trace
/// in completion (reduction) order.
#[derive(Debug)]
pub struct ParseOutput {
    pub tree: SyntaxTree,
    pub trace: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecoveryContext {
    Expression,
    Statement,
    Block,
}

/// The table-driven shift/reduce driver.
pub struct LrDriver<'a> {
    grammar: &'a Grammar,
    table: &'a ActionTable,
}

impl<'a> LrDriver<'a> {
    pub fn new(grammar: &'a Grammar, table: &'a ActionTable) -> Self {
        Self { grammar, table }
    }

    pub fn parse(&self, tokens: &mut TokenStream) -> Result<ParseOutput, ParseFailure> {
        let mut state_stack: Vec<u32> = Vec::with_capacity(STACK_CAPACITY);
        let mut node_stack: Vec<Option<NodeId>> = Vec::with_capacity(STACK_CAPACITY);
        state_stack.push(0);
        node_stack.push(None);
        let mut tree = SyntaxTree::new();
        let mut trace: Vec<u32> = vec![];
        let mut diagnostics: Vec<ParseError> = vec![];
        let mut last_program: Option<NodeId> = None;
        let mut recovery_anchor: Option<usize> = None;

        loop {
            debug_assert_eq!(state_stack.len(), node_stack.len());
            let top = top_state(&state_stack);
            let token = match tokens.front() {
                Err(error) => {
                    let expected = self.table.expected_terminals(top);
                    diagnostics.push(ParseError::Lexical { error, expected });
                    tokens.advance();
                    continue;
                }
                Ok(token) => token,
            };
            if token.kind().is_illegal() {
                diagnostics.push(ParseError::InvalidLiteral { token });
                tokens.advance();
                continue;
            }
            match self.table.action(top, token.kind()) {
                Action::Accept => {
                    let root = if let Some(ident) = last_program {
                        Some(ident)
                    } else if let Some(Some(ident)) = node_stack.last() {
                        Some(*ident)
                    } else if node_stack.len() >= 2 {
                        // skip over an already-shifted end-marker
                        node_stack[node_stack.len() - 2]
                    } else {
                        None
                    };
                    if let Some(root) = root {
                        tree.set_root(root);
                    }
                    break;
                }
                Action::Shift(next_state) => {
                    let node = if token.kind() == TokenKind::EndMarker {
                        None
                    } else {
                        Some(tree.terminal(token))
                    };
                    state_stack.push(next_state);
                    node_stack.push(node);
                    tokens.advance();
                }
                Action::Reduce(production_id) => {
                    let production = self.grammar.production(production_id);
                    let count = production.len();
                    let left_hand_side = production.left_hand_side();
                    let split = state_stack.len().saturating_sub(count);
                    if split == 0 {
                        diagnostics.push(ParseError::MissingGoto {
                            state: top,
                            non_terminal: left_hand_side,
                            location: token.location().clone(),
                        });
                        break;
                    }
                    state_stack.truncate(split);
                    let children = node_stack.split_off(split);
                    let node = tree.non_terminal(left_hand_side, production_id);
                    if production.is_epsilon() {
                        let epsilon = tree.epsilon();
                        tree.add_child(node, epsilon);
                    } else {
                        // children come back in original left-to-right order;
                        // shifted end-markers have no node and are skipped
                        for child in children {
                            if let Some(child) = child {
                                tree.add_child(node, child);
                            }
                        }
                    }
                    if production_id != prod::AUGMENTED_START {
                        trace.push(production_id);
                    }
                    let goto_from = top_state(&state_stack);
                    match self.table.goto(goto_from, left_hand_side) {
                        Some(next_state) => {
                            state_stack.push(next_state);
                            node_stack.push(Some(node));
                            if left_hand_side == NonTerminal::Program {
                                last_program = Some(node);
                            }
                        }
                        None => {
                            diagnostics.push(ParseError::MissingGoto {
                                state: goto_from,
                                non_terminal: left_hand_side,
                                location: token.location().clone(),
                            });
                            break;
                        }
                    }
                }
                Action::Error => {
                    let expected = self.table.expected_terminals(top);
                    diagnostics.push(ParseError::Syntax {
                        token: token.clone(),
                        expected,
                    });
                    if !self.recover(
                        tokens,
                        &mut state_stack,
                        &mut node_stack,
                        &tree,
                        &mut recovery_anchor,
                    ) {
                        break;
                    }
                }
            }
        }

        if diagnostics.is_empty() {
            Ok(ParseOutput { tree, trace })
        } else {
            Err(ParseFailure { diagnostics })
        }
    }

    /// Panic-mode recovery: classify the context from the node stack, skip
    /// ahead to a sync token of that context and pop back to a state that
    /// can act on it.  Returns `false` when the parse cannot continue.
    fn recover(
        &self,
        tokens: &mut TokenStream,
        state_stack: &mut Vec<u32>,
        node_stack: &mut Vec<Option<NodeId>>,
        tree: &SyntaxTree,
        recovery_anchor: &mut Option<usize>,
    ) -> bool {
        // a second error without forward progress ends the parse
        let here = tokens.mark();
        if let Some(anchor) = *recovery_anchor {
            if here <= anchor {
                return false;
            }
        }
        let sync_kinds: &[TokenKind] = match classify_context(node_stack, tree) {
            RecoveryContext::Expression => &[TokenKind::RParen],
            RecoveryContext::Statement => &[
                TokenKind::Semicolon,
                TokenKind::Then,
                TokenKind::Else,
                TokenKind::Do,
                TokenKind::End,
            ],
            RecoveryContext::Block => &[TokenKind::End, TokenKind::Begin, TokenKind::EndMarker],
        };
        let sync_kind = loop {
            match tokens.front() {
                Ok(token) => {
                    let kind = token.kind();
                    if sync_kinds.contains(&kind) {
                        break kind;
                    }
                    if kind == TokenKind::EndMarker {
                        return false;
                    }
                }
                Err(_) => (),
            }
            tokens.advance();
        };
        while state_stack.len() > 1 {
            if self.table.action(top_state(state_stack), sync_kind) != Action::Error {
                break;
            }
            state_stack.pop();
            node_stack.pop();
        }
        if self.table.action(top_state(state_stack), sync_kind) == Action::Error {
            return false;
        }
        *recovery_anchor = Some(tokens.mark());
        true
    }
}

fn top_state(state_stack: &[u32]) -> u32 {
    state_stack.last().copied().unwrap_or(0)
}

fn classify_context(node_stack: &[Option<NodeId>], tree: &SyntaxTree) -> RecoveryContext {
    for entry in node_stack.iter().rev() {
        let ident = match entry {
            Some(ident) => *ident,
            None => continue,
        };
        let non_terminal = match tree.non_terminal_of(ident) {
            Some(non_terminal) => non_terminal,
            None => continue,
        };
        return match non_terminal {
            NonTerminal::Expr
            | NonTerminal::ExprTail
            | NonTerminal::Term
            | NonTerminal::TermTail
            | NonTerminal::Factor
            | NonTerminal::Cond => RecoveryContext::Expression,
            NonTerminal::Stmt | NonTerminal::StmtLine | NonTerminal::ElseTail => {
                RecoveryContext::Statement
            }
            NonTerminal::Program | NonTerminal::ProgramTail | NonTerminal::Start => {
                RecoveryContext::Block
            }
        };
    }
    RecoveryContext::Statement
}
