// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::collections::BTreeMap;

/// Flat name tracking plus temporary allocation.  Source identifiers are
/// noted in first-seen order; temporaries are `t0`, `t1`, … and the counter
/// only ever moves forward.
#[derive(Debug, Default)]
pub struct SymbolTable {
    names: Vec<String>,
    index: BTreeMap<String, usize>,
    next_temp: u32,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Notes a source identifier, returning its slot.
    pub fn note(&mut self, name: &str) -> usize {
        if let Some(index) = self.index.get(name) {
            *index
        } else {
            let index = self.names.len();
            self.names.push(name.to_string());
            self.index.insert(name.to_string(), index);
            index
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// A fresh temporary name, or `None` once the allocator is exhausted.
    pub fn new_temp(&mut self) -> Option<String> {
        let name = format!("t{}", self.next_temp);
        self.next_temp = self.next_temp.checked_add(1)?;
        Some(name)
    }
}

/// Unique label allocation: `L0`, `L1`, …
#[derive(Debug, Default)]
pub struct LabelManager {
    next: u32,
}

impl LabelManager {
    pub fn new() -> Self {
        LabelManager::default()
    }

    pub fn new_label(&mut self) -> Option<String> {
        let name = format!("L{}", self.next);
        self.next = self.next.checked_add(1)?;
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temps_and_labels_are_sequential() {
        let mut symbols = SymbolTable::new();
        assert_eq!(symbols.new_temp().unwrap(), "t0");
        assert_eq!(symbols.new_temp().unwrap(), "t1");
        let mut labels = LabelManager::new();
        assert_eq!(labels.new_label().unwrap(), "L0");
        assert_eq!(labels.new_label().unwrap(), "L1");
    }

    #[test]
    fn names_are_noted_once() {
        let mut symbols = SymbolTable::new();
        assert_eq!(symbols.note("x"), 0);
        assert_eq!(symbols.note("y"), 1);
        assert_eq!(symbols.note("x"), 0);
        assert_eq!(symbols.len(), 2);
        assert!(symbols.contains("y"));
        assert!(!symbols.contains("z"));
    }
}
