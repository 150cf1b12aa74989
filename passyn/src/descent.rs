// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use paslex::{Token, TokenKind, TokenStream};

use crate::driver::{ParseError, ParseFailure, ParseOutput};
use crate::grammar::{prod, Grammar};
use crate::symbol::NonTerminal;
use crate::tree::{NodeId, SyntaxTree};

type Parse<T> = Result<T, ParseError>;

/// The top-down alternative to the LR driver: one procedure per
/// non-terminal, one-token lookahead, and cursor backtracking where the
/// grammar needs it (statement and condition alternatives).  ε tails are
/// chosen whenever no operator token matches and recorded with an ε child,
/// so both drivers produce identical trees and production traces.
pub struct DescentDriver<'a> {
    grammar: &'a Grammar,
}

impl<'a> DescentDriver<'a> {
    pub fn new(grammar: &'a Grammar) -> Self {
        Self { grammar }
    }

    pub fn parse(&self, tokens: &mut TokenStream) -> Result<ParseOutput, ParseFailure> {
        let mut descent = Descent {
            grammar: self.grammar,
            tokens,
            tree: SyntaxTree::new(),
            trace: vec![],
        };
        match descent.run() {
            Ok(()) => Ok(ParseOutput {
                tree: descent.tree,
                trace: descent.trace,
            }),
            Err(error) => Err(ParseFailure {
                diagnostics: vec![error],
            }),
        }
    }
}

struct Descent<'a, 's> {
    grammar: &'a Grammar,
    tokens: &'s mut TokenStream,
    tree: SyntaxTree,
    trace: Vec<u32>,
}

impl<'a, 's> Descent<'a, 's> {
    fn run(&mut self) -> Parse<()> {
        let root = self.program()?;
        let token = self.peek()?;
        if token.kind() != TokenKind::EndMarker {
            let mut expected = self.first_kinds(NonTerminal::Program);
            expected.push(TokenKind::EndMarker);
            return Err(ParseError::Syntax { token, expected });
        }
        self.tree.set_root(root);
        Ok(())
    }

    fn peek(&mut self) -> Parse<Token> {
        match self.tokens.front() {
            Ok(token) => {
                if token.kind().is_illegal() {
                    Err(ParseError::InvalidLiteral { token })
                } else {
                    Ok(token)
                }
            }
            Err(error) => Err(ParseError::Lexical {
                error,
                expected: vec![],
            }),
        }
    }

    fn accept(&mut self, kind: TokenKind) -> Parse<NodeId> {
        let token = self.peek()?;
        if token.kind() == kind {
            self.tokens.advance();
            Ok(self.tree.terminal(token))
        } else {
            Err(ParseError::Syntax {
                token,
                expected: vec![kind],
            })
        }
    }

    fn first_kinds(&self, non_terminal: NonTerminal) -> Vec<TokenKind> {
        self.grammar
            .first(non_terminal)
            .without_epsilon()
            .iter()
            .collect()
    }

    fn at_first_of(&mut self, non_terminal: NonTerminal) -> Parse<bool> {
        let token = self.peek()?;
        Ok(self.grammar.first(non_terminal).contains(token.kind()))
    }

    fn snapshot(&self) -> (usize, usize, usize) {
        (self.tokens.mark(), self.tree.mark(), self.trace.len())
    }

    fn restore(&mut self, snapshot: (usize, usize, usize)) {
        self.tokens.rewind(snapshot.0);
        self.tree.truncate(snapshot.1);
        self.trace.truncate(snapshot.2);
    }

    // P → L T
    fn program(&mut self) -> Parse<NodeId> {
        let line = self.stmt_line()?;
        let tail = self.program_tail()?;
        let node = self.tree.non_terminal(NonTerminal::Program, prod::PROGRAM);
        self.tree.add_child(node, line);
        self.tree.add_child(node, tail);
        self.trace.push(prod::PROGRAM);
        Ok(node)
    }

    // T → P T | ε
    fn program_tail(&mut self) -> Parse<NodeId> {
        if self.at_first_of(NonTerminal::Program)? {
            let program = self.program()?;
            let tail = self.program_tail()?;
            let node = self
                .tree
                .non_terminal(NonTerminal::ProgramTail, prod::PROGRAM_TAIL);
            self.tree.add_child(node, program);
            self.tree.add_child(node, tail);
            self.trace.push(prod::PROGRAM_TAIL);
            Ok(node)
        } else {
            Ok(self.epsilon_node(NonTerminal::ProgramTail, prod::PROGRAM_TAIL_EMPTY))
        }
    }

    // L → S ;
    fn stmt_line(&mut self) -> Parse<NodeId> {
        let stmt = self.stmt()?;
        let semicolon = self.accept(TokenKind::Semicolon)?;
        let node = self
            .tree
            .non_terminal(NonTerminal::StmtLine, prod::STMT_LINE);
        self.tree.add_child(node, stmt);
        self.tree.add_child(node, semicolon);
        self.trace.push(prod::STMT_LINE);
        Ok(node)
    }

    // S → id = E | if C then S N | while C do S | begin P end, tried in
    // order with the cursor restored after an inner failure; the diagnostic
    // that consumed the most input wins.
    fn stmt(&mut self) -> Parse<NodeId> {
        let mut best: Option<(usize, ParseError)> = None;
        for attempt in 0..4 {
            let snapshot = self.snapshot();
            let result = match attempt {
                0 => self.stmt_assign(),
                1 => self.stmt_if(),
                2 => self.stmt_while(),
                _ => self.stmt_block(),
            };
            match result {
                Ok(node) => return Ok(node),
                Err(error) => {
                    let progress = self.tokens.mark();
                    match &best {
                        Some((furthest, _)) if *furthest >= progress => (),
                        _ => best = Some((progress, error)),
                    }
                    self.restore(snapshot);
                }
            }
        }
        match best {
            Some((_, error)) => Err(error),
            None => {
                let token = self.peek()?;
                Err(ParseError::Syntax {
                    token,
                    expected: self.first_kinds(NonTerminal::Stmt),
                })
            }
        }
    }

    fn stmt_assign(&mut self) -> Parse<NodeId> {
        let ident = self.accept(TokenKind::Ident)?;
        let assign = self.accept(TokenKind::Assign)?;
        let expr = self.expr()?;
        let node = self.tree.non_terminal(NonTerminal::Stmt, prod::STMT_ASSIGN);
        self.tree.add_child(node, ident);
        self.tree.add_child(node, assign);
        self.tree.add_child(node, expr);
        self.trace.push(prod::STMT_ASSIGN);
        Ok(node)
    }

    fn stmt_if(&mut self) -> Parse<NodeId> {
        let if_token = self.accept(TokenKind::If)?;
        let cond = self.cond()?;
        let then_token = self.accept(TokenKind::Then)?;
        let stmt = self.stmt()?;
        let else_tail = self.else_tail()?;
        let node = self.tree.non_terminal(NonTerminal::Stmt, prod::STMT_IF);
        self.tree.add_child(node, if_token);
        self.tree.add_child(node, cond);
        self.tree.add_child(node, then_token);
        self.tree.add_child(node, stmt);
        self.tree.add_child(node, else_tail);
        self.trace.push(prod::STMT_IF);
        Ok(node)
    }

    fn stmt_while(&mut self) -> Parse<NodeId> {
        let while_token = self.accept(TokenKind::While)?;
        let cond = self.cond()?;
        let do_token = self.accept(TokenKind::Do)?;
        let stmt = self.stmt()?;
        let node = self.tree.non_terminal(NonTerminal::Stmt, prod::STMT_WHILE);
        self.tree.add_child(node, while_token);
        self.tree.add_child(node, cond);
        self.tree.add_child(node, do_token);
        self.tree.add_child(node, stmt);
        self.trace.push(prod::STMT_WHILE);
        Ok(node)
    }

    fn stmt_block(&mut self) -> Parse<NodeId> {
        let begin = self.accept(TokenKind::Begin)?;
        let program = self.program()?;
        let end = self.accept(TokenKind::End)?;
        let node = self.tree.non_terminal(NonTerminal::Stmt, prod::STMT_BLOCK);
        self.tree.add_child(node, begin);
        self.tree.add_child(node, program);
        self.tree.add_child(node, end);
        self.trace.push(prod::STMT_BLOCK);
        Ok(node)
    }

    // N → else S | ε; the greedy else matches the LR driver's
    // shift-preferred dangling-else resolution
    fn else_tail(&mut self) -> Parse<NodeId> {
        if self.peek()?.kind() == TokenKind::Else {
            let else_token = self.accept(TokenKind::Else)?;
            let stmt = self.stmt()?;
            let node = self.tree.non_terminal(NonTerminal::ElseTail, prod::ELSE_TAIL);
            self.tree.add_child(node, else_token);
            self.tree.add_child(node, stmt);
            self.trace.push(prod::ELSE_TAIL);
            Ok(node)
        } else {
            Ok(self.epsilon_node(NonTerminal::ElseTail, prod::ELSE_TAIL_EMPTY))
        }
    }

    // C → E rel E | ( C ), relation first, backtracking into the
    // parenthesised form
    fn cond(&mut self) -> Parse<NodeId> {
        let snapshot = self.snapshot();
        let relation_error = match self.cond_relation() {
            Ok(node) => return Ok(node),
            Err(error) => (self.tokens.mark(), error),
        };
        self.restore(snapshot);
        let paren_error = match self.cond_paren() {
            Ok(node) => return Ok(node),
            Err(error) => (self.tokens.mark(), error),
        };
        self.restore(snapshot);
        if relation_error.0 >= paren_error.0 {
            Err(relation_error.1)
        } else {
            Err(paren_error.1)
        }
    }

    fn cond_relation(&mut self) -> Parse<NodeId> {
        let left = self.expr()?;
        let token = self.peek()?;
        let production = match token.kind() {
            TokenKind::Greater => prod::COND_GT,
            TokenKind::Less => prod::COND_LT,
            TokenKind::Assign => prod::COND_EQ,
            TokenKind::GreaterEqual => prod::COND_GE,
            TokenKind::LessEqual => prod::COND_LE,
            TokenKind::NotEqual => prod::COND_NE,
            _ => {
                return Err(ParseError::Syntax {
                    token,
                    expected: vec![
                        TokenKind::Assign,
                        TokenKind::NotEqual,
                        TokenKind::Less,
                        TokenKind::LessEqual,
                        TokenKind::Greater,
                        TokenKind::GreaterEqual,
                    ],
                })
            }
        };
        let relation = self.accept(token.kind())?;
        let right = self.expr()?;
        let node = self.tree.non_terminal(NonTerminal::Cond, production);
        self.tree.add_child(node, left);
        self.tree.add_child(node, relation);
        self.tree.add_child(node, right);
        self.trace.push(production);
        Ok(node)
    }

    fn cond_paren(&mut self) -> Parse<NodeId> {
        let left = self.accept(TokenKind::LParen)?;
        let cond = self.cond()?;
        let right = self.accept(TokenKind::RParen)?;
        let node = self.tree.non_terminal(NonTerminal::Cond, prod::COND_PAREN);
        self.tree.add_child(node, left);
        self.tree.add_child(node, cond);
        self.tree.add_child(node, right);
        self.trace.push(prod::COND_PAREN);
        Ok(node)
    }

    // E → R X
    fn expr(&mut self) -> Parse<NodeId> {
        let term = self.term()?;
        let tail = self.expr_tail()?;
        let node = self.tree.non_terminal(NonTerminal::Expr, prod::EXPR);
        self.tree.add_child(node, term);
        self.tree.add_child(node, tail);
        self.trace.push(prod::EXPR);
        Ok(node)
    }

    // X → + R X | - R X | ε
    fn expr_tail(&mut self) -> Parse<NodeId> {
        let kind = self.peek()?.kind();
        let production = match kind {
            TokenKind::Plus => prod::EXPR_TAIL_ADD,
            TokenKind::Minus => prod::EXPR_TAIL_SUB,
            _ => return Ok(self.epsilon_node(NonTerminal::ExprTail, prod::EXPR_TAIL_EMPTY)),
        };
        let operator = self.accept(kind)?;
        let term = self.term()?;
        let tail = self.expr_tail()?;
        let node = self.tree.non_terminal(NonTerminal::ExprTail, production);
        self.tree.add_child(node, operator);
        self.tree.add_child(node, term);
        self.tree.add_child(node, tail);
        self.trace.push(production);
        Ok(node)
    }

    // R → F Y
    fn term(&mut self) -> Parse<NodeId> {
        let factor = self.factor()?;
        let tail = self.term_tail()?;
        let node = self.tree.non_terminal(NonTerminal::Term, prod::TERM);
        self.tree.add_child(node, factor);
        self.tree.add_child(node, tail);
        self.trace.push(prod::TERM);
        Ok(node)
    }

    // Y → * F Y | / F Y | ε
    fn term_tail(&mut self) -> Parse<NodeId> {
        let kind = self.peek()?.kind();
        let production = match kind {
            TokenKind::Star => prod::TERM_TAIL_MUL,
            TokenKind::Slash => prod::TERM_TAIL_DIV,
            _ => return Ok(self.epsilon_node(NonTerminal::TermTail, prod::TERM_TAIL_EMPTY)),
        };
        let operator = self.accept(kind)?;
        let factor = self.factor()?;
        let tail = self.term_tail()?;
        let node = self.tree.non_terminal(NonTerminal::TermTail, production);
        self.tree.add_child(node, operator);
        self.tree.add_child(node, factor);
        self.tree.add_child(node, tail);
        self.trace.push(production);
        Ok(node)
    }

    // F → ( E ) | id | int8 | int10 | int16
    fn factor(&mut self) -> Parse<NodeId> {
        let token = self.peek()?;
        match token.kind() {
            TokenKind::LParen => {
                let left = self.accept(TokenKind::LParen)?;
                let expr = self.expr()?;
                let right = self.accept(TokenKind::RParen)?;
                let node = self.tree.non_terminal(NonTerminal::Factor, prod::FACTOR_PAREN);
                self.tree.add_child(node, left);
                self.tree.add_child(node, expr);
                self.tree.add_child(node, right);
                self.trace.push(prod::FACTOR_PAREN);
                Ok(node)
            }
            TokenKind::Ident => self.factor_leaf(prod::FACTOR_ID, TokenKind::Ident),
            TokenKind::OctInt => self.factor_leaf(prod::FACTOR_OCT, TokenKind::OctInt),
            TokenKind::DecInt => self.factor_leaf(prod::FACTOR_DEC, TokenKind::DecInt),
            TokenKind::HexInt => self.factor_leaf(prod::FACTOR_HEX, TokenKind::HexInt),
            _ => Err(ParseError::Syntax {
                token,
                expected: self.first_kinds(NonTerminal::Factor),
            }),
        }
    }

    fn factor_leaf(&mut self, production: u32, kind: TokenKind) -> Parse<NodeId> {
        let leaf = self.accept(kind)?;
        let node = self.tree.non_terminal(NonTerminal::Factor, production);
        self.tree.add_child(node, leaf);
        self.trace.push(production);
        Ok(node)
    }

    fn epsilon_node(&mut self, non_terminal: NonTerminal, production: u32) -> NodeId {
        let node = self.tree.non_terminal(non_terminal, production);
        let epsilon = self.tree.epsilon();
        self.tree.add_child(node, epsilon);
        self.trace.push(production);
        node
    }
}
