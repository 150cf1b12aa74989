// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::fmt;

use paslex::TokenKind;

use crate::symbol::{NonTerminal, Symbol, TerminalSet};

/// A single grammar production.  An ε-production carries `Symbol::Epsilon`
/// as its only right-hand-side entry and has an effective length of zero.
#[derive(Debug, Clone)]
pub struct Production {
    ident: u32,
    left_hand_side: NonTerminal,
    right_hand_side: Vec<Symbol>,
}

impl Production {
    fn new(ident: u32, left_hand_side: NonTerminal, right_hand_side: Vec<Symbol>) -> Self {
        Self {
            ident,
            left_hand_side,
            right_hand_side,
        }
    }

    pub fn ident(&self) -> u32 {
        self.ident
    }

    pub fn left_hand_side(&self) -> NonTerminal {
        self.left_hand_side
    }

    pub fn right_hand_side(&self) -> &[Symbol] {
        &self.right_hand_side
    }

    pub fn is_epsilon(&self) -> bool {
        self.right_hand_side.len() == 1 && self.right_hand_side[0] == Symbol::Epsilon
    }

    /// Effective right-hand-side length: zero for ε-productions.
    pub fn len(&self) -> usize {
        if self.is_epsilon() {
            0
        } else {
            self.right_hand_side.len()
        }
    }

    /// The symbol at `dot`, or `None` when the dot is at the end or the
    /// right-hand side is a single ε.
    pub fn symbol_at(&self, dot: usize) -> Option<Symbol> {
        if self.is_epsilon() {
            None
        } else {
            self.right_hand_side.get(dot).copied()
        }
    }

    /// The symbols after the one at `dot`.
    pub fn tail_after(&self, dot: usize) -> &[Symbol] {
        if self.is_epsilon() || dot + 1 >= self.right_hand_side.len() {
            &[]
        } else {
            &self.right_hand_side[dot + 1..]
        }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut string = format!("{}:", self.left_hand_side);
        for symbol in self.right_hand_side.iter() {
            string += &format!(" {}", symbol);
        }
        write!(f, "{}", string)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    MissingAugmentedStart,
    UndefinedNonTerminal(NonTerminal),
    MisplacedEpsilon(u32),
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GrammarError::MissingAugmentedStart => {
                write!(f, "production 0 must be the augmented start production")
            }
            GrammarError::UndefinedNonTerminal(non_terminal) => {
                write!(f, "non-terminal \"{}\" has no productions", non_terminal)
            }
            GrammarError::MisplacedEpsilon(ident) => write!(
                f,
                "production {}: ε may only appear alone on a right-hand side",
                ident
            ),
        }
    }
}

impl std::error::Error for GrammarError {}

/// A grammar with its FIRST and FOLLOW sets.  Constructed once through
/// `GrammarBuilder` and read-only afterwards.
#[derive(Debug)]
pub struct Grammar {
    productions: Vec<Production>,
    terminals: Vec<TokenKind>,
    non_terminals: Vec<NonTerminal>,
    firsts: Vec<TerminalSet>,
    follows: Vec<TerminalSet>,
}

impl Grammar {
    pub fn productions(&self) -> impl Iterator<Item = &Production> {
        self.productions.iter()
    }

    pub fn production(&self, ident: u32) -> &Production {
        &self.productions[ident as usize]
    }

    pub fn production_count(&self) -> usize {
        self.productions.len()
    }

    pub fn productions_for(&self, non_terminal: NonTerminal) -> impl Iterator<Item = &Production> {
        self.productions
            .iter()
            .filter(move |production| production.left_hand_side == non_terminal)
    }

    /// The terminals this grammar mentions, in table-column order; the
    /// end-marker is always the last entry.
    pub fn terminals(&self) -> &[TokenKind] {
        &self.terminals
    }

    pub fn non_terminals(&self) -> &[NonTerminal] {
        &self.non_terminals
    }

    pub fn first(&self, non_terminal: NonTerminal) -> TerminalSet {
        self.firsts[non_terminal.index()]
    }

    pub fn follow(&self, non_terminal: NonTerminal) -> TerminalSet {
        self.follows[non_terminal.index()]
    }

    pub fn first_of_symbol(&self, symbol: Symbol) -> TerminalSet {
        first_of_symbol(&self.firsts, symbol)
    }

    /// FIRST of a symbol sequence: the standard prefix walk respecting
    /// nullability.  The empty sequence yields `{ε}`.
    pub fn first_of_sequence(&self, symbols: &[Symbol]) -> TerminalSet {
        first_of_sequence(&self.firsts, symbols)
    }

    pub fn description(&self) -> String {
        let mut string = "Productions:\n".to_string();
        for production in self.productions.iter() {
            string += &format!("  {:2}: {}\n", production.ident, production);
        }
        string += "FIRST sets:\n";
        for non_terminal in self.non_terminals.iter() {
            string += &format!("  FIRST({}) = {}\n", non_terminal, self.first(*non_terminal));
        }
        string += "FOLLOW sets:\n";
        for non_terminal in self.non_terminals.iter() {
            string += &format!(
                "  FOLLOW({}) = {}\n",
                non_terminal,
                self.follow(*non_terminal)
            );
        }
        string
    }
}

fn first_of_symbol(firsts: &[TerminalSet], symbol: Symbol) -> TerminalSet {
    let mut set = TerminalSet::new();
    match symbol {
        Symbol::Terminal(kind) => {
            set.insert(kind);
        }
        Symbol::NonTerminal(non_terminal) => set = firsts[non_terminal.index()],
        Symbol::Epsilon => {
            set.insert_epsilon();
        }
    }
    set
}

fn first_of_sequence(firsts: &[TerminalSet], symbols: &[Symbol]) -> TerminalSet {
    let mut set = TerminalSet::new();
    let mut all_nullable = true;
    for symbol in symbols.iter() {
        let symbol_firsts = first_of_symbol(firsts, *symbol);
        set |= symbol_firsts.without_epsilon();
        if !symbol_firsts.contains_epsilon() {
            all_nullable = false;
            break;
        }
    }
    if all_nullable {
        set.insert_epsilon();
    }
    set
}

fn compute_firsts(productions: &[Production]) -> Vec<TerminalSet> {
    let mut firsts = vec![TerminalSet::new(); NonTerminal::COUNT];
    let mut additions_made = true;
    while additions_made {
        additions_made = false;
        for production in productions.iter() {
            let rhs_firsts = if production.is_epsilon() {
                let mut set = TerminalSet::new();
                set.insert_epsilon();
                set
            } else {
                first_of_sequence(&firsts, &production.right_hand_side)
            };
            let index = production.left_hand_side.index();
            let combined = firsts[index] | rhs_firsts;
            if combined != firsts[index] {
                firsts[index] = combined;
                additions_made = true;
            }
        }
    }
    firsts
}

fn compute_follows(productions: &[Production], firsts: &[TerminalSet]) -> Vec<TerminalSet> {
    let mut follows = vec![TerminalSet::new(); NonTerminal::COUNT];
    follows[NonTerminal::Start.index()].insert(TokenKind::EndMarker);
    let mut additions_made = true;
    while additions_made {
        additions_made = false;
        for production in productions.iter() {
            if production.is_epsilon() {
                continue;
            }
            let lhs_follow = follows[production.left_hand_side.index()];
            for (dot, symbol) in production.right_hand_side.iter().enumerate() {
                let non_terminal = match symbol {
                    Symbol::NonTerminal(non_terminal) => *non_terminal,
                    _ => continue,
                };
                let beta_firsts = first_of_sequence(firsts, &production.right_hand_side[dot + 1..]);
                let mut addition = beta_firsts.without_epsilon();
                if beta_firsts.contains_epsilon() {
                    addition |= lhs_follow;
                }
                let index = non_terminal.index();
                let combined = follows[index] | addition;
                if combined != follows[index] {
                    follows[index] = combined;
                    additions_made = true;
                }
            }
        }
    }
    follows
}

/// Registers productions and builds a `Grammar`, failing when a referenced
/// non-terminal has no productions of its own.
#[derive(Debug)]
pub struct GrammarBuilder {
    productions: Vec<Production>,
}

impl GrammarBuilder {
    /// Starts a grammar whose production 0 is the augmented
    /// `S' → start` production.
    pub fn new(start: NonTerminal) -> Self {
        let augmented = Production::new(0, NonTerminal::Start, vec![Symbol::from(start)]);
        Self {
            productions: vec![augmented],
        }
    }

    pub fn rule(&mut self, left_hand_side: NonTerminal, right_hand_side: &[Symbol]) -> &mut Self {
        let ident = self.productions.len() as u32;
        self.productions.push(Production::new(
            ident,
            left_hand_side,
            right_hand_side.to_vec(),
        ));
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        let productions = self.productions;
        match productions.first() {
            Some(production) if production.left_hand_side == NonTerminal::Start => (),
            _ => return Err(GrammarError::MissingAugmentedStart),
        };
        let mut terminal_set = TerminalSet::new();
        for production in productions.iter() {
            if production.right_hand_side.len() > 1
                && production.right_hand_side.contains(&Symbol::Epsilon)
            {
                return Err(GrammarError::MisplacedEpsilon(production.ident));
            }
            for symbol in production.right_hand_side.iter() {
                match symbol {
                    Symbol::Terminal(kind) => {
                        terminal_set.insert(*kind);
                    }
                    Symbol::NonTerminal(non_terminal) => {
                        if !productions.iter().any(|p| p.left_hand_side == *non_terminal) {
                            return Err(GrammarError::UndefinedNonTerminal(*non_terminal));
                        }
                    }
                    Symbol::Epsilon => (),
                }
            }
        }
        terminal_set.insert(TokenKind::EndMarker);
        let terminals: Vec<TokenKind> = terminal_set.iter().collect();
        let non_terminals: Vec<NonTerminal> = NonTerminal::ALL
            .iter()
            .copied()
            .filter(|non_terminal| {
                productions
                    .iter()
                    .any(|p| p.left_hand_side == *non_terminal)
            })
            .collect();
        let firsts = compute_firsts(&productions);
        let follows = compute_follows(&productions, &firsts);
        Ok(Grammar {
            productions,
            terminals,
            non_terminals,
            firsts,
            follows,
        })
    }
}

/// Canonical production numbering for the teaching grammar.  The table
/// constructor, both drivers and the semantic actions all dispatch on
/// these identifiers.
pub mod prod {
    pub const AUGMENTED_START: u32 = 0;
    pub const PROGRAM: u32 = 1; //          P → L T
    pub const PROGRAM_TAIL: u32 = 2; //     T → P T
    pub const PROGRAM_TAIL_EMPTY: u32 = 3; // T → ε
    pub const STMT_LINE: u32 = 4; //        L → S ;
    pub const STMT_ASSIGN: u32 = 5; //      S → id = E
    pub const STMT_IF: u32 = 6; //          S → if C then S N
    pub const STMT_WHILE: u32 = 7; //       S → while C do S
    pub const STMT_BLOCK: u32 = 8; //       S → begin P end
    pub const ELSE_TAIL: u32 = 9; //        N → else S
    pub const ELSE_TAIL_EMPTY: u32 = 10; // N → ε
    pub const COND_GT: u32 = 11; //         C → E > E
    pub const COND_LT: u32 = 12; //         C → E < E
    pub const COND_EQ: u32 = 13; //         C → E = E
    pub const COND_GE: u32 = 14; //         C → E >= E
    pub const COND_LE: u32 = 15; //         C → E <= E
    pub const COND_NE: u32 = 16; //         C → E <> E
    pub const COND_PAREN: u32 = 17; //      C → ( C )
    pub const EXPR: u32 = 18; //            E → R X
    pub const EXPR_TAIL_ADD: u32 = 19; //   X → + R X
    pub const EXPR_TAIL_SUB: u32 = 20; //   X → - R X
    pub const EXPR_TAIL_EMPTY: u32 = 21; // X → ε
    pub const TERM: u32 = 22; //            R → F Y
    pub const TERM_TAIL_MUL: u32 = 23; //   Y → * F Y
    pub const TERM_TAIL_DIV: u32 = 24; //   Y → / F Y
    pub const TERM_TAIL_EMPTY: u32 = 25; // Y → ε
    pub const FACTOR_PAREN: u32 = 26; //    F → ( E )
    pub const FACTOR_ID: u32 = 27; //       F → id
    pub const FACTOR_OCT: u32 = 28; //      F → int8
    pub const FACTOR_DEC: u32 = 29; //      F → int10
    pub const FACTOR_HEX: u32 = 30; //      F → int16
}

/// The grammar of the teaching language.
pub fn teaching_grammar() -> Grammar {
    use NonTerminal::*;
    use TokenKind::*;
    let t = |kind: TokenKind| Symbol::Terminal(kind);
    let n = |non_terminal: NonTerminal| Symbol::NonTerminal(non_terminal);
    let mut builder = GrammarBuilder::new(Program);
    builder
        .rule(Program, &[n(StmtLine), n(ProgramTail)])
        .rule(ProgramTail, &[n(Program), n(ProgramTail)])
        .rule(ProgramTail, &[Symbol::Epsilon])
        .rule(StmtLine, &[n(Stmt), t(Semicolon)])
        .rule(Stmt, &[t(Ident), t(Assign), n(Expr)])
        .rule(Stmt, &[t(If), n(Cond), t(Then), n(Stmt), n(ElseTail)])
        .rule(Stmt, &[t(While), n(Cond), t(Do), n(Stmt)])
        .rule(Stmt, &[t(Begin), n(Program), t(End)])
        .rule(ElseTail, &[t(Else), n(Stmt)])
        .rule(ElseTail, &[Symbol::Epsilon])
        .rule(Cond, &[n(Expr), t(Greater), n(Expr)])
        .rule(Cond, &[n(Expr), t(Less), n(Expr)])
        .rule(Cond, &[n(Expr), t(Assign), n(Expr)])
        .rule(Cond, &[n(Expr), t(GreaterEqual), n(Expr)])
        .rule(Cond, &[n(Expr), t(LessEqual), n(Expr)])
        .rule(Cond, &[n(Expr), t(NotEqual), n(Expr)])
        .rule(Cond, &[t(LParen), n(Cond), t(RParen)])
        .rule(Expr, &[n(Term), n(ExprTail)])
        .rule(ExprTail, &[t(Plus), n(Term), n(ExprTail)])
        .rule(ExprTail, &[t(Minus), n(Term), n(ExprTail)])
        .rule(ExprTail, &[Symbol::Epsilon])
        .rule(Term, &[n(Factor), n(TermTail)])
        .rule(TermTail, &[t(Star), n(Factor), n(TermTail)])
        .rule(TermTail, &[t(Slash), n(Factor), n(TermTail)])
        .rule(TermTail, &[Symbol::Epsilon])
        .rule(Factor, &[t(LParen), n(Expr), t(RParen)])
        .rule(Factor, &[t(Ident)])
        .rule(Factor, &[t(OctInt)])
        .rule(Factor, &[t(DecInt)])
        .rule(Factor, &[t(HexInt)]);
    builder.build().expect("the teaching grammar is well formed")
}
