// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use paslex::TokenKind;

use crate::grammar::{prod, Grammar};
use crate::item::{Item, ItemSet};
use crate::symbol::{Symbol, TerminalSet};

/// Which LR construction the automaton and table use.  LR(0) and SLR(1)
/// share the lookahead-free collection; canonical LR(1) threads lookaheads
/// through closure and state identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LrVariant {
    Lr0,
    Slr1,
    Lr1,
}

impl LrVariant {
    pub fn with_lookaheads(self) -> bool {
        match self {
            LrVariant::Lr1 => true,
            _ => false,
        }
    }
}

impl fmt::Display for LrVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LrVariant::Lr0 => write!(f, "LR(0)"),
            LrVariant::Slr1 => write!(f, "SLR(1)"),
            LrVariant::Lr1 => write!(f, "LR(1)"),
        }
    }
}

/// A state of the LR automaton: an item set plus its outgoing transitions.
#[derive(Debug)]
pub struct State {
    ident: u32,
    items: ItemSet,
    transitions: BTreeMap<Symbol, u32>,
}

impl State {
    pub fn ident(&self) -> u32 {
        self.ident
    }

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    pub fn transitions(&self) -> impl Iterator<Item = (&Symbol, &u32)> {
        self.transitions.iter()
    }

    pub fn transition(&self, symbol: Symbol) -> Option<u32> {
        self.transitions.get(&symbol).copied()
    }

    pub fn description(&self, grammar: &Grammar) -> String {
        let mut string = format!("State {}:\n", self.ident);
        string += "  items:\n";
        string += &self.items.description(grammar);
        if !self.transitions.is_empty() {
            string += "  transitions:\n";
            for (symbol, target) in self.transitions.iter() {
                string += &format!("    {} -> {}\n", symbol, target);
            }
        }
        string
    }
}

/// The canonical collection of LR states for a grammar.
#[derive(Debug)]
pub struct Automaton {
    variant: LrVariant,
    states: Vec<State>,
}

impl Automaton {
    /// Builds the canonical collection with a work-list walk.  States are
    /// identified by their kernel items: core equality for LR(0)/SLR(1),
    /// full (lookahead-inclusive) equality for LR(1), so construction is
    /// deterministic for a fixed grammar and variant.
    pub fn build(grammar: &Grammar, variant: LrVariant) -> Self {
        let mut start_lookaheads = TerminalSet::new();
        if variant.with_lookaheads() {
            start_lookaheads.insert(TokenKind::EndMarker);
        }
        let mut start_kernel = ItemSet::new();
        start_kernel.insert(Item::start(prod::AUGMENTED_START), start_lookaheads);
        let start_items = closure(grammar, start_kernel, variant);
        let mut states = vec![State {
            ident: 0,
            items: start_items,
            transitions: BTreeMap::new(),
        }];

        let mut index = 0;
        while index < states.len() {
            // collect the goto kernels first so the state list can grow
            // while they are processed
            let goto_seeds: Vec<(Symbol, ItemSet)> = {
                let items = &states[index].items;
                let symbols: BTreeSet<Symbol> = items
                    .iter()
                    .filter_map(|(item, _)| item.next_symbol(grammar))
                    .collect();
                symbols
                    .into_iter()
                    .map(|symbol| (symbol, items.goto_kernel(symbol, grammar)))
                    .collect()
            };
            for (symbol, kernel) in goto_seeds {
                let item_set = closure(grammar, kernel, variant);
                let target = match find_equivalent(&states, &item_set, variant) {
                    Some(ident) => ident,
                    None => {
                        let ident = states.len() as u32;
                        states.push(State {
                            ident,
                            items: item_set,
                            transitions: BTreeMap::new(),
                        });
                        ident
                    }
                };
                states[index].transitions.insert(symbol, target);
            }
            index += 1;
        }
        Self { variant, states }
    }

    pub fn variant(&self) -> LrVariant {
        self.variant
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn description(&self, grammar: &Grammar) -> String {
        let mut string = format!("{} automaton, {} states\n", self.variant, self.states.len());
        for state in self.states.iter() {
            string += &state.description(grammar);
        }
        string
    }
}

fn find_equivalent(states: &[State], item_set: &ItemSet, variant: LrVariant) -> Option<u32> {
    if variant.with_lookaheads() {
        let target = item_set.kernel_map();
        states
            .iter()
            .find(|state| state.items.kernel_map() == target)
            .map(|state| state.ident)
    } else {
        let target = item_set.kernel_keys();
        states
            .iter()
            .find(|state| state.items.kernel_keys() == target)
            .map(|state| state.ident)
    }
}

/// Saturates an item set with `·`-introduction items for every non-terminal
/// immediately right of a dot.  With lookaheads, each introduced item gets
/// `FIRST(β)` of the remaining tail, plus the parent's lookaheads when the
/// tail is nullable.
fn closure(grammar: &Grammar, mut item_set: ItemSet, variant: LrVariant) -> ItemSet {
    let mut additions_made = true;
    while additions_made {
        additions_made = false;
        for (item, lookaheads) in item_set.closable_set(grammar) {
            let non_terminal = match item.next_symbol(grammar) {
                Some(Symbol::NonTerminal(non_terminal)) => non_terminal,
                _ => continue,
            };
            let mut new_lookaheads = TerminalSet::new();
            if variant.with_lookaheads() {
                let tail_firsts = grammar.first_of_sequence(item.rhs_tail(grammar));
                new_lookaheads = tail_firsts.without_epsilon();
                if tail_firsts.contains_epsilon() {
                    new_lookaheads |= lookaheads;
                }
            }
            for production in grammar.productions_for(non_terminal) {
                if item_set.insert(Item::start(production.ident()), new_lookaheads) {
                    additions_made = true;
                }
            }
        }
    }
    item_set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::teaching_grammar;
    use crate::symbol::NonTerminal;

    #[test]
    fn start_state_closure_covers_statement_starters() {
        let grammar = teaching_grammar();
        let automaton = Automaton::build(&grammar, LrVariant::Lr0);
        let start = &automaton.states()[0];
        // S' → · P pulls in P, L and every S production
        let productions: Vec<u32> = start.items().iter().map(|(item, _)| item.production()).collect();
        assert!(productions.contains(&prod::AUGMENTED_START));
        assert!(productions.contains(&prod::PROGRAM));
        assert!(productions.contains(&prod::STMT_LINE));
        assert!(productions.contains(&prod::STMT_ASSIGN));
        assert!(productions.contains(&prod::STMT_IF));
        assert!(productions.contains(&prod::STMT_WHILE));
        assert!(productions.contains(&prod::STMT_BLOCK));
        // expressions are not reachable before an assignment or condition
        assert!(!productions.contains(&prod::EXPR));
    }

    #[test]
    fn lr1_start_state_carries_end_marker_lookahead() {
        let grammar = teaching_grammar();
        let automaton = Automaton::build(&grammar, LrVariant::Lr1);
        let start = &automaton.states()[0];
        let lookaheads = start
            .items()
            .lookaheads(&Item::start(prod::AUGMENTED_START))
            .copied()
            .unwrap();
        assert!(lookaheads.contains(TokenKind::EndMarker));
        assert_eq!(lookaheads.len(), 1);
    }

    #[test]
    fn construction_is_deterministic() {
        let grammar = teaching_grammar();
        for variant in [LrVariant::Lr0, LrVariant::Slr1, LrVariant::Lr1].iter() {
            let first = Automaton::build(&grammar, *variant);
            let second = Automaton::build(&grammar, *variant);
            assert_eq!(first.state_count(), second.state_count());
            for (a, b) in first.states().iter().zip(second.states().iter()) {
                assert_eq!(a.ident(), b.ident());
                assert_eq!(a.items(), b.items());
                let a_transitions: Vec<(Symbol, u32)> =
                    a.transitions().map(|(s, t)| (*s, *t)).collect();
                let b_transitions: Vec<(Symbol, u32)> =
                    b.transitions().map(|(s, t)| (*s, *t)).collect();
                assert_eq!(a_transitions, b_transitions);
            }
        }
    }

    #[test]
    fn lr0_and_slr1_share_the_same_collection() {
        let grammar = teaching_grammar();
        let lr0 = Automaton::build(&grammar, LrVariant::Lr0);
        let slr1 = Automaton::build(&grammar, LrVariant::Slr1);
        assert_eq!(lr0.state_count(), slr1.state_count());
        // canonical LR(1) splits states by lookahead context
        let lr1 = Automaton::build(&grammar, LrVariant::Lr1);
        assert!(lr1.state_count() >= lr0.state_count());
    }

    #[test]
    fn every_transition_target_exists() {
        let grammar = teaching_grammar();
        for variant in [LrVariant::Lr0, LrVariant::Lr1].iter() {
            let automaton = Automaton::build(&grammar, *variant);
            for state in automaton.states() {
                for (_, target) in state.transitions() {
                    assert!((*target as usize) < automaton.state_count());
                }
            }
        }
    }

    #[test]
    fn goto_on_program_from_start_leads_to_accepting_state() {
        let grammar = teaching_grammar();
        let automaton = Automaton::build(&grammar, LrVariant::Lr1);
        let start = &automaton.states()[0];
        let target = start
            .transition(Symbol::NonTerminal(NonTerminal::Program))
            .expect("the start state must have a GOTO on P");
        let state = &automaton.states()[target as usize];
        let accept_item = Item::start(prod::AUGMENTED_START).shifted();
        assert!(state.items().lookaheads(&accept_item).is_some());
    }
}
