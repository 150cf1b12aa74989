// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::fmt;

use paslex::TokenKind;

use crate::automaton::{Automaton, LrVariant};
use crate::grammar::{prod, Grammar};
use crate::symbol::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(u32),
    Reduce(u32),
    Accept,
    Error,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Action::Shift(state) => write!(f, "shift {}", state),
            Action::Reduce(production) => write!(f, "reduce {}", production),
            Action::Accept => write!(f, "accept"),
            Action::Error => write!(f, "error"),
        }
    }
}

/// What to do when two actions land in the same table cell.  The default
/// keeps the teaching behaviour: shift beats reduce and the earlier
/// numbered production beats the later one, with a diagnostic either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    PreferShift,
    Fail,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        ConflictPolicy::PreferShift
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict {
    state: u32,
    terminal: TokenKind,
    kept: Action,
    discarded: Action,
}

impl Conflict {
    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn terminal(&self) -> TokenKind {
        self.terminal
    }

    pub fn kept(&self) -> Action {
        self.kept
    }

    pub fn discarded(&self) -> Action {
        self.discarded
    }

    pub fn is_shift_reduce(&self) -> bool {
        match (self.kept, self.discarded) {
            (Action::Shift(_), Action::Reduce(_)) | (Action::Reduce(_), Action::Shift(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = if self.is_shift_reduce() {
            "shift/reduce"
        } else {
            "reduce/reduce"
        };
        write!(
            f,
            "state {}: {} conflict on \"{}\": kept {}, dropped {}",
            self.state, kind, self.terminal, self.kept, self.discarded
        )
    }
}

#[derive(Debug)]
pub enum TableError {
    Conflict(Conflict),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TableError::Conflict(conflict) => write!(f, "unresolved {}", conflict),
        }
    }
}

impl std::error::Error for TableError {}

/// Dense ACTION/GOTO tables.  Every cell starts as `Error`/`None`; filling
/// never aborts under the default policy, it records conflicts instead.
#[derive(Debug)]
pub struct ActionTable {
    variant: LrVariant,
    columns: Vec<Option<usize>>,
    terminals: Vec<TokenKind>,
    actions: Vec<Vec<Action>>,
    gotos: Vec<Vec<Option<u32>>>,
    conflicts: Vec<Conflict>,
}

impl ActionTable {
    pub fn build(
        grammar: &Grammar,
        automaton: &Automaton,
        policy: ConflictPolicy,
    ) -> Result<Self, TableError> {
        let terminals: Vec<TokenKind> = grammar.terminals().to_vec();
        let mut columns = vec![None; TokenKind::COUNT];
        for (column, kind) in terminals.iter().enumerate() {
            columns[*kind as usize] = Some(column);
        }
        let state_count = automaton.state_count();
        let mut table = Self {
            variant: automaton.variant(),
            columns,
            terminals: terminals.clone(),
            actions: vec![vec![Action::Error; terminals.len()]; state_count],
            gotos: vec![vec![None; crate::symbol::NonTerminal::COUNT]; state_count],
            conflicts: vec![],
        };

        for state in automaton.states() {
            let ident = state.ident();
            for (symbol, target) in state.transitions() {
                match symbol {
                    Symbol::Terminal(kind) => {
                        table.set_action(ident, *kind, Action::Shift(*target), policy)?
                    }
                    Symbol::NonTerminal(non_terminal) => {
                        table.gotos[ident as usize][non_terminal.index()] = Some(*target)
                    }
                    Symbol::Epsilon => (),
                }
            }
            for (item, lookaheads) in state.items().reducible_set(grammar) {
                if item.production() == prod::AUGMENTED_START {
                    // the accepting item only ever fires on the end-marker
                    table.set_action(ident, TokenKind::EndMarker, Action::Accept, policy)?;
                    continue;
                }
                let action = Action::Reduce(item.production());
                match automaton.variant() {
                    LrVariant::Lr0 => {
                        for kind in terminals.iter() {
                            table.set_action(ident, *kind, action, policy)?;
                        }
                    }
                    LrVariant::Slr1 => {
                        let lhs = grammar.production(item.production()).left_hand_side();
                        for kind in grammar.follow(lhs).iter() {
                            table.set_action(ident, kind, action, policy)?;
                        }
                    }
                    LrVariant::Lr1 => {
                        for kind in lookaheads.iter() {
                            table.set_action(ident, kind, action, policy)?;
                        }
                    }
                }
            }
        }
        Ok(table)
    }

    fn set_action(
        &mut self,
        state: u32,
        kind: TokenKind,
        new: Action,
        policy: ConflictPolicy,
    ) -> Result<(), TableError> {
        let column = match self.column(kind) {
            Some(column) => column,
            None => return Ok(()),
        };
        let current = self.actions[state as usize][column];
        let (kept, discarded) = match (current, new) {
            (Action::Error, _) => {
                self.actions[state as usize][column] = new;
                return Ok(());
            }
            (current, new) if current == new => return Ok(()),
            // accept never loses its cell
            (Action::Accept, other) => (Action::Accept, other),
            (other, Action::Accept) => (Action::Accept, other),
            // shift/reduce: shift wins
            (Action::Shift(target), Action::Reduce(production)) => {
                (Action::Shift(target), Action::Reduce(production))
            }
            (Action::Reduce(production), Action::Shift(target)) => {
                (Action::Shift(target), Action::Reduce(production))
            }
            // reduce/reduce: the earlier numbered production wins
            (Action::Reduce(a), Action::Reduce(b)) => {
                if a <= b {
                    (Action::Reduce(a), Action::Reduce(b))
                } else {
                    (Action::Reduce(b), Action::Reduce(a))
                }
            }
            (Action::Shift(a), Action::Shift(b)) => {
                debug_assert!(a == b, "one transition per symbol per state");
                return Ok(());
            }
            (current, new) => (current, new),
        };
        let conflict = Conflict {
            state,
            terminal: kind,
            kept,
            discarded,
        };
        match policy {
            ConflictPolicy::Fail => Err(TableError::Conflict(conflict)),
            ConflictPolicy::PreferShift => {
                self.actions[state as usize][column] = kept;
                self.conflicts.push(conflict);
                Ok(())
            }
        }
    }

    fn column(&self, kind: TokenKind) -> Option<usize> {
        self.columns[kind as usize]
    }

    pub fn variant(&self) -> LrVariant {
        self.variant
    }

    pub fn state_count(&self) -> usize {
        self.actions.len()
    }

    pub fn action(&self, state: u32, kind: TokenKind) -> Action {
        match self.column(kind) {
            Some(column) => self.actions[state as usize][column],
            None => Action::Error,
        }
    }

    pub fn goto(&self, state: u32, non_terminal: crate::symbol::NonTerminal) -> Option<u32> {
        self.gotos[state as usize][non_terminal.index()]
    }

    /// The terminals a state's row has any non-error action for, in table
    /// column order.  This is what "expected: …" diagnostics list.
    pub fn expected_terminals(&self, state: u32) -> Vec<TokenKind> {
        self.terminals
            .iter()
            .enumerate()
            .filter(|(column, _)| self.actions[state as usize][*column] != Action::Error)
            .map(|(_, kind)| *kind)
            .collect()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Automaton;
    use crate::grammar::teaching_grammar;
    use crate::symbol::NonTerminal;

    fn table_for(variant: LrVariant) -> ActionTable {
        let grammar = teaching_grammar();
        let automaton = Automaton::build(&grammar, variant);
        ActionTable::build(&grammar, &automaton, ConflictPolicy::PreferShift)
            .expect("prefer-shift filling cannot fail")
    }

    #[test]
    fn accept_lives_in_the_end_marker_column() {
        for variant in [LrVariant::Lr0, LrVariant::Slr1, LrVariant::Lr1].iter() {
            let table = table_for(*variant);
            let accepts = (0..table.state_count() as u32)
                .filter(|state| table.action(*state, TokenKind::EndMarker) == Action::Accept)
                .count();
            assert_eq!(accepts, 1, "{} table should accept in one state", variant);
        }
    }

    #[test]
    fn start_state_shifts_statement_starters() {
        let table = table_for(LrVariant::Lr1);
        for kind in [
            TokenKind::Ident,
            TokenKind::If,
            TokenKind::While,
            TokenKind::Begin,
        ]
        .iter()
        {
            match table.action(0, *kind) {
                Action::Shift(_) => (),
                other => panic!("expected shift on {}, got {}", kind, other),
            }
        }
        assert_eq!(table.action(0, TokenKind::Plus), Action::Error);
        assert!(table.goto(0, NonTerminal::Program).is_some());
        assert!(table.goto(0, NonTerminal::Stmt).is_some());
        assert_eq!(table.goto(0, NonTerminal::Factor), None);
    }

    #[test]
    fn dangling_else_resolves_in_favour_of_shift() {
        for variant in [LrVariant::Slr1, LrVariant::Lr1].iter() {
            let table = table_for(*variant);
            let else_conflicts: Vec<&Conflict> = table
                .conflicts()
                .iter()
                .filter(|conflict| conflict.terminal() == TokenKind::Else)
                .collect();
            assert!(
                !else_conflicts.is_empty(),
                "{} table should report the dangling-else conflict",
                variant
            );
            for conflict in else_conflicts {
                assert!(conflict.is_shift_reduce());
                match conflict.kept() {
                    Action::Shift(_) => (),
                    other => panic!("dangling else must keep the shift, kept {}", other),
                }
                assert_eq!(conflict.discarded(), Action::Reduce(prod::ELSE_TAIL_EMPTY));
            }
        }
    }

    #[test]
    fn lr0_tables_have_many_conflicts_but_fill_completely() {
        let table = table_for(LrVariant::Lr0);
        assert!(!table.conflicts().is_empty());
    }

    #[test]
    fn fail_policy_surfaces_the_first_conflict() {
        let grammar = teaching_grammar();
        let automaton = Automaton::build(&grammar, LrVariant::Lr1);
        match ActionTable::build(&grammar, &automaton, ConflictPolicy::Fail) {
            Err(TableError::Conflict(conflict)) => {
                assert_eq!(conflict.terminal(), TokenKind::Else)
            }
            Ok(_) => panic!("the dangling else must surface under the fail policy"),
        }
    }

    #[test]
    fn expected_terminals_after_assign_are_expression_starters() {
        let table = table_for(LrVariant::Lr1);
        // drive the table by hand: shift id, then shift '='
        let after_id = match table.action(0, TokenKind::Ident) {
            Action::Shift(state) => state,
            other => panic!("expected shift, got {}", other),
        };
        let after_assign = match table.action(after_id, TokenKind::Assign) {
            Action::Shift(state) => state,
            other => panic!("expected shift, got {}", other),
        };
        let expected = table.expected_terminals(after_assign);
        assert_eq!(
            expected,
            vec![
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::OctInt,
                TokenKind::DecInt,
                TokenKind::HexInt,
            ]
        );
    }
}
