// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::collections::{BTreeMap, BTreeSet};

use crate::grammar::{prod, Grammar};
use crate::symbol::{Symbol, TerminalSet};

/// An LR item: a production with a dot position.  Lookaheads live beside
/// the item in the owning `ItemSet`, so two items are core-equal exactly
/// when they compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Item {
    production: u32,
    dot: usize,
}

impl Item {
    pub fn start(production: u32) -> Self {
        Self { production, dot: 0 }
    }

    pub fn production(&self) -> u32 {
        self.production
    }

    pub fn dot(&self) -> usize {
        self.dot
    }

    pub fn shifted(&self) -> Self {
        Self {
            production: self.production,
            dot: self.dot + 1,
        }
    }

    pub fn is_kernel_item(&self) -> bool {
        self.dot > 0 || self.production == prod::AUGMENTED_START
    }

    pub fn is_reducible(&self, grammar: &Grammar) -> bool {
        self.dot >= grammar.production(self.production).len()
    }

    /// The symbol after the dot, or `None` when the dot is at the end or
    /// the right-hand side is a single ε.
    pub fn next_symbol(&self, grammar: &Grammar) -> Option<Symbol> {
        grammar.production(self.production).symbol_at(self.dot)
    }

    pub fn is_closable(&self, grammar: &Grammar) -> bool {
        match self.next_symbol(grammar) {
            Some(symbol) => symbol.is_non_terminal(),
            None => false,
        }
    }

    pub fn rhs_tail<'a>(&self, grammar: &'a Grammar) -> &'a [Symbol] {
        grammar.production(self.production).tail_after(self.dot)
    }

    pub fn display(&self, grammar: &Grammar) -> String {
        let production = grammar.production(self.production);
        let mut string = format!("{}:", production.left_hand_side());
        for (index, symbol) in production.right_hand_side().iter().enumerate() {
            if index == self.dot {
                string += &format!(" . {}", symbol);
            } else {
                string += &format!(" {}", symbol);
            }
        }
        if self.dot >= production.right_hand_side().len() {
            string += " . ";
        }
        string
    }
}

/// A set of LR items with their lookahead sets.  In LR(0)/SLR(1) mode the
/// lookahead sets stay empty and only the items themselves matter.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ItemSet(BTreeMap<Item, TerminalSet>);

impl ItemSet {
    pub fn new() -> Self {
        ItemSet::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Item, &TerminalSet)> {
        self.0.iter()
    }

    pub fn lookaheads(&self, item: &Item) -> Option<&TerminalSet> {
        self.0.get(item)
    }

    /// Adds an item, merging lookaheads with a core-equal entry when one is
    /// already present.  Returns `true` iff the item was new or at least
    /// one lookahead was newly added.
    pub fn insert(&mut self, item: Item, lookaheads: TerminalSet) -> bool {
        if let Some(set) = self.0.get_mut(&item) {
            let combined = *set | lookaheads;
            if combined != *set {
                *set = combined;
                true
            } else {
                false
            }
        } else {
            self.0.insert(item, lookaheads);
            true
        }
    }

    /// Snapshot of the closable items; a separate vector so closure can
    /// mutate the set while walking it.
    pub fn closable_set(&self, grammar: &Grammar) -> Vec<(Item, TerminalSet)> {
        let mut closables = vec![];
        for (item, set) in self.0.iter().filter(|(item, _)| item.is_closable(grammar)) {
            closables.push((*item, *set));
        }
        closables
    }

    /// The kernel of GOTO(self, symbol): every item with `symbol` after the
    /// dot, shifted one place.
    pub fn goto_kernel(&self, symbol: Symbol, grammar: &Grammar) -> ItemSet {
        let mut map = BTreeMap::new();
        for (item, lookaheads) in self.0.iter() {
            if item.next_symbol(grammar) == Some(symbol) {
                map.insert(item.shifted(), *lookaheads);
            }
        }
        ItemSet(map)
    }

    pub fn kernel_keys(&self) -> BTreeSet<Item> {
        self.0
            .keys()
            .filter(|item| item.is_kernel_item())
            .copied()
            .collect()
    }

    pub fn kernel_map(&self) -> BTreeMap<Item, TerminalSet> {
        self.0
            .iter()
            .filter(|(item, _)| item.is_kernel_item())
            .map(|(item, set)| (*item, *set))
            .collect()
    }

    pub fn reducible_set(&self, grammar: &Grammar) -> Vec<(Item, TerminalSet)> {
        self.0
            .iter()
            .filter(|(item, _)| item.is_reducible(grammar))
            .map(|(item, set)| (*item, *set))
            .collect()
    }

    pub fn description(&self, grammar: &Grammar) -> String {
        let mut string = String::new();
        for (item, lookaheads) in self.0.iter() {
            if lookaheads.is_empty() {
                string += &format!("    {}\n", item.display(grammar));
            } else {
                string += &format!("    {} {}\n", item.display(grammar), lookaheads);
            }
        }
        string
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::teaching_grammar;
    use paslex::TokenKind;

    #[test]
    fn kernel_and_reducibility() {
        let grammar = teaching_grammar();
        let start = Item::start(prod::AUGMENTED_START);
        assert!(start.is_kernel_item());
        assert!(!start.is_reducible(&grammar));
        let other = Item::start(prod::STMT_ASSIGN);
        assert!(!other.is_kernel_item());
        assert!(other.shifted().is_kernel_item());
        // ε-productions are reducible at dot zero and expose no next symbol
        let empty = Item::start(prod::PROGRAM_TAIL_EMPTY);
        assert!(empty.is_reducible(&grammar));
        assert_eq!(empty.next_symbol(&grammar), None);
    }

    #[test]
    fn insert_merges_lookaheads() {
        let mut set = ItemSet::new();
        let item = Item::start(prod::STMT_ASSIGN);
        assert!(set.insert(item, TerminalSet::of(&[TokenKind::Semicolon])));
        // same item, same lookaheads: nothing new
        assert!(!set.insert(item, TerminalSet::of(&[TokenKind::Semicolon])));
        // a new lookahead is detected
        assert!(set.insert(item, TerminalSet::of(&[TokenKind::EndMarker])));
        assert_eq!(set.lookaheads(&item).unwrap().len(), 2);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn goto_kernel_shifts_the_dot() {
        let grammar = teaching_grammar();
        let mut set = ItemSet::new();
        set.insert(Item::start(prod::STMT_ASSIGN), TerminalSet::new());
        set.insert(Item::start(prod::STMT_IF), TerminalSet::new());
        let kernel = set.goto_kernel(Symbol::Terminal(TokenKind::Ident), &grammar);
        assert_eq!(kernel.len(), 1);
        let (item, _) = kernel.iter().next().unwrap();
        assert_eq!(item.production(), prod::STMT_ASSIGN);
        assert_eq!(item.dot(), 1);
    }
}
