// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use paslex::TokenKind;

/// The non-terminal symbols of the teaching grammar.  `Start` is the
/// augmented start symbol and never appears on a right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NonTerminal {
    Start,
    Program,
    ProgramTail,
    StmtLine,
    Stmt,
    ElseTail,
    Cond,
    Expr,
    ExprTail,
    Term,
    TermTail,
    Factor,
}

impl NonTerminal {
    pub const COUNT: usize = 12;

    pub const ALL: [NonTerminal; NonTerminal::COUNT] = [
        NonTerminal::Start,
        NonTerminal::Program,
        NonTerminal::ProgramTail,
        NonTerminal::StmtLine,
        NonTerminal::Stmt,
        NonTerminal::ElseTail,
        NonTerminal::Cond,
        NonTerminal::Expr,
        NonTerminal::ExprTail,
        NonTerminal::Term,
        NonTerminal::TermTail,
        NonTerminal::Factor,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NonTerminal::Start => write!(f, "S'"),
            NonTerminal::Program => write!(f, "P"),
            NonTerminal::ProgramTail => write!(f, "T"),
            NonTerminal::StmtLine => write!(f, "L"),
            NonTerminal::Stmt => write!(f, "S"),
            NonTerminal::ElseTail => write!(f, "N"),
            NonTerminal::Cond => write!(f, "C"),
            NonTerminal::Expr => write!(f, "E"),
            NonTerminal::ExprTail => write!(f, "X"),
            NonTerminal::Term => write!(f, "R"),
            NonTerminal::TermTail => write!(f, "Y"),
            NonTerminal::Factor => write!(f, "F"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Symbol {
    Terminal(TokenKind),
    NonTerminal(NonTerminal),
    Epsilon,
}

impl Symbol {
    pub fn is_non_terminal(&self) -> bool {
        match self {
            Symbol::NonTerminal(_) => true,
            _ => false,
        }
    }
}

impl From<TokenKind> for Symbol {
    fn from(kind: TokenKind) -> Self {
        Symbol::Terminal(kind)
    }
}

impl From<NonTerminal> for Symbol {
    fn from(non_terminal: NonTerminal) -> Self {
        Symbol::NonTerminal(non_terminal)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Symbol::Terminal(kind) => write!(f, "{}", kind),
            Symbol::NonTerminal(non_terminal) => write!(f, "{}", non_terminal),
            Symbol::Epsilon => write!(f, "ε"),
        }
    }
}

const EPSILON_BIT: u32 = 1 << 31;

/// A set of terminals represented as a bit-set over token-kind bits, with
/// one extra bit for ε (used by FIRST sets of nullable symbols).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TerminalSet(u32);

impl TerminalSet {
    pub fn new() -> Self {
        TerminalSet::default()
    }

    pub fn of(kinds: &[TokenKind]) -> Self {
        let mut set = TerminalSet::new();
        for kind in kinds.iter() {
            set.insert(*kind);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, kind: TokenKind) -> bool {
        let old = self.0;
        self.0 |= kind.bit();
        self.0 != old
    }

    pub fn insert_epsilon(&mut self) -> bool {
        let old = self.0;
        self.0 |= EPSILON_BIT;
        self.0 != old
    }

    pub fn contains(&self, kind: TokenKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn contains_epsilon(&self) -> bool {
        self.0 & EPSILON_BIT != 0
    }

    pub fn without_epsilon(self) -> Self {
        TerminalSet(self.0 & !EPSILON_BIT)
    }

    pub fn iter(&self) -> impl Iterator<Item = TokenKind> {
        let bits = self.0;
        TokenKind::ALL
            .iter()
            .copied()
            .filter(move |kind| bits & kind.bit() != 0)
    }
}

impl BitOr for TerminalSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        TerminalSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for TerminalSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

impl fmt::Display for TerminalSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut set_string = "{".to_string();
        for (index, kind) in self.iter().enumerate() {
            if index == 0 {
                set_string += &format!("{}", kind);
            } else {
                set_string += &format!(", {}", kind);
            }
        }
        if self.contains_epsilon() {
            if set_string.len() > 1 {
                set_string += ", ε";
            } else {
                set_string += "ε";
            }
        }
        set_string += "}";
        write!(f, "{}", set_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_set_basics() {
        let mut set = TerminalSet::new();
        assert!(set.is_empty());
        assert!(set.insert(TokenKind::Plus));
        assert!(!set.insert(TokenKind::Plus));
        assert!(set.insert_epsilon());
        assert!(set.contains(TokenKind::Plus));
        assert!(!set.contains(TokenKind::Minus));
        assert!(set.contains_epsilon());
        assert_eq!(set.len(), 2);
        assert!(!set.without_epsilon().contains_epsilon());
        assert_eq!(format!("{}", set), "{+, ε}");
    }

    #[test]
    fn terminal_set_union() {
        let mut set = TerminalSet::of(&[TokenKind::Plus]);
        set |= TerminalSet::of(&[TokenKind::Minus]);
        let kinds: Vec<TokenKind> = set.iter().collect();
        assert_eq!(kinds, vec![TokenKind::Plus, TokenKind::Minus]);
    }
}
