// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::fmt;

use passyn::grammar::prod;
use passyn::tree::{NodeId, SyntaxTree};

use crate::names::{LabelManager, SymbolTable};
use crate::tac::{Op, TacProgram};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdtError {
    MissingRoot,
    MissingAttribute {
        production: u32,
        attribute: &'static str,
    },
    MalformedTree(&'static str),
    UnexpectedProduction(u32),
    AllocatorExhausted(&'static str),
}

impl fmt::Display for SdtError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SdtError::MissingRoot => write!(f, "translation requires a rooted syntax tree"),
            SdtError::MissingAttribute {
                production,
                attribute,
            } => write!(
                f,
                "semantic action for production {}: child lacks required attribute \"{}\"",
                production, attribute
            ),
            SdtError::MalformedTree(expected) => {
                write!(f, "malformed syntax tree: expected {}", expected)
            }
            SdtError::UnexpectedProduction(production) => {
                write!(f, "no semantic action fits production {} here", production)
            }
            SdtError::AllocatorExhausted(what) => write!(f, "{} allocator exhausted", what),
        }
    }
}

impl std::error::Error for SdtError {}

/// The result of a translation: the emitted program plus the flat symbol
/// table of source identifiers.
#[derive(Debug)]
pub struct Translation {
    pub code: TacProgram,
    pub symbols: SymbolTable,
}

/// Runs the per-production semantic actions over a parsed tree and returns
/// the emitted three-address code.  Control-flow actions allocate their
/// labels before the condition subtree is visited and interleave label
/// emission between child visits, which pins the instruction order the
/// translation guarantees.
pub fn translate(tree: &mut SyntaxTree) -> Result<Translation, SdtError> {
    let root = tree.root().ok_or(SdtError::MissingRoot)?;
    let mut translator = Translator {
        symbols: SymbolTable::new(),
        labels: LabelManager::new(),
        code: TacProgram::new(),
    };
    translator.emit_node(tree, root)?;
    Ok(Translation {
        code: translator.code,
        symbols: translator.symbols,
    })
}

struct Translator {
    symbols: SymbolTable,
    labels: LabelManager,
    code: TacProgram,
}

impl Translator {
    fn new_temp(&mut self) -> Result<String, SdtError> {
        self.symbols
            .new_temp()
            .ok_or(SdtError::AllocatorExhausted("temporary"))
    }

    fn new_label(&mut self) -> Result<String, SdtError> {
        self.labels
            .new_label()
            .ok_or(SdtError::AllocatorExhausted("label"))
    }

    fn place_of(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        production: u32,
    ) -> Result<String, SdtError> {
        tree.place(node)
            .map(str::to_string)
            .ok_or(SdtError::MissingAttribute {
                production,
                attribute: "place",
            })
    }

    /// Statement-level dispatch, selected by production identifier.
    fn emit_node(&mut self, tree: &mut SyntaxTree, node: NodeId) -> Result<(), SdtError> {
        let production = match tree.production_of(node) {
            Some(production) => production,
            // terminals and ε leaves contribute no code of their own
            None => return Ok(()),
        };
        match production {
            prod::AUGMENTED_START
            | prod::PROGRAM
            | prod::PROGRAM_TAIL
            | prod::STMT_LINE
            | prod::STMT_BLOCK
            | prod::ELSE_TAIL => {
                for child in tree.children(node).to_vec() {
                    self.emit_node(tree, child)?;
                }
                Ok(())
            }
            prod::PROGRAM_TAIL_EMPTY | prod::ELSE_TAIL_EMPTY => Ok(()),
            prod::STMT_ASSIGN => {
                let children = tree.children(node).to_vec();
                if children.len() != 3 {
                    return Err(SdtError::MalformedTree("S: id = E"));
                }
                let target = match tree.token(children[0]) {
                    Some(token) => token.lexeme().to_string(),
                    None => return Err(SdtError::MalformedTree("an identifier leaf")),
                };
                self.eval_expr(tree, children[2])?;
                let place = self.place_of(tree, children[2], production)?;
                self.symbols.note(&target);
                self.code.emit_assign(target, place);
                Ok(())
            }
            prod::STMT_IF => self.emit_if(tree, node),
            prod::STMT_WHILE => self.emit_while(tree, node),
            prod::COND_GT
            | prod::COND_LT
            | prod::COND_EQ
            | prod::COND_GE
            | prod::COND_LE
            | prod::COND_NE
            | prod::COND_PAREN => self.emit_cond(tree, node),
            other => Err(SdtError::UnexpectedProduction(other)),
        }
    }

    fn emit_if(&mut self, tree: &mut SyntaxTree, node: NodeId) -> Result<(), SdtError> {
        let children = tree.children(node).to_vec();
        if children.len() != 5 {
            return Err(SdtError::MalformedTree("S: if C then S N"));
        }
        let cond = children[1];
        let body = children[3];
        let else_tail = children[4];
        if tree.production_of(else_tail) == Some(prod::ELSE_TAIL) {
            let else_children = tree.children(else_tail).to_vec();
            if else_children.len() != 2 {
                return Err(SdtError::MalformedTree("N: else S"));
            }
            let true_label = self.new_label()?;
            let false_label = self.new_label()?;
            let next_label = self.new_label()?;
            {
                let attributes = tree.attributes_mut(cond);
                attributes.true_label = Some(true_label.clone());
                attributes.false_label = Some(false_label.clone());
            }
            tree.attributes_mut(node).next_label = Some(next_label.clone());
            self.emit_cond(tree, cond)?;
            self.code.emit_label(true_label);
            self.emit_node(tree, body)?;
            self.code.emit_goto(next_label.clone());
            self.code.emit_label(false_label);
            self.emit_node(tree, else_children[1])?;
            self.code.emit_label(next_label);
        } else {
            let true_label = self.new_label()?;
            let false_label = self.new_label()?;
            {
                let attributes = tree.attributes_mut(cond);
                attributes.true_label = Some(true_label.clone());
                attributes.false_label = Some(false_label.clone());
            }
            self.emit_cond(tree, cond)?;
            self.code.emit_label(true_label);
            self.emit_node(tree, body)?;
            self.code.emit_label(false_label);
        }
        Ok(())
    }

    fn emit_while(&mut self, tree: &mut SyntaxTree, node: NodeId) -> Result<(), SdtError> {
        let children = tree.children(node).to_vec();
        if children.len() != 4 {
            return Err(SdtError::MalformedTree("S: while C do S"));
        }
        let cond = children[1];
        let body = children[3];
        let begin_label = self.new_label()?;
        let true_label = self.new_label()?;
        let false_label = self.new_label()?;
        tree.attributes_mut(node).begin_label = Some(begin_label.clone());
        {
            let attributes = tree.attributes_mut(cond);
            attributes.true_label = Some(true_label.clone());
            attributes.false_label = Some(false_label.clone());
        }
        self.code.emit_label(begin_label.clone());
        self.emit_cond(tree, cond)?;
        self.code.emit_label(true_label);
        self.emit_node(tree, body)?;
        self.code.emit_goto(begin_label);
        self.code.emit_label(false_label);
        Ok(())
    }

    /// Ensures the node has jump targets (allocating them only when not
    /// inherited from the enclosing statement), then emits the conditional
    /// jump pair or pushes the targets into a parenthesised child.
    fn cond_labels(
        &mut self,
        tree: &mut SyntaxTree,
        node: NodeId,
    ) -> Result<(String, String), SdtError> {
        let true_label = match tree.attributes(node).and_then(|a| a.true_label.clone()) {
            Some(label) => label,
            None => {
                let label = self.new_label()?;
                tree.attributes_mut(node).true_label = Some(label.clone());
                label
            }
        };
        let false_label = match tree.attributes(node).and_then(|a| a.false_label.clone()) {
            Some(label) => label,
            None => {
                let label = self.new_label()?;
                tree.attributes_mut(node).false_label = Some(label.clone());
                label
            }
        };
        Ok((true_label, false_label))
    }

    fn emit_cond(&mut self, tree: &mut SyntaxTree, node: NodeId) -> Result<(), SdtError> {
        let production = tree
            .production_of(node)
            .ok_or(SdtError::MalformedTree("a condition node"))?;
        let (true_label, false_label) = self.cond_labels(tree, node)?;
        match production {
            prod::COND_PAREN => {
                let children = tree.children(node).to_vec();
                if children.len() != 3 {
                    return Err(SdtError::MalformedTree("C: ( C )"));
                }
                {
                    let attributes = tree.attributes_mut(children[1]);
                    attributes.true_label = Some(true_label);
                    attributes.false_label = Some(false_label);
                }
                self.emit_cond(tree, children[1])
            }
            prod::COND_GT
            | prod::COND_LT
            | prod::COND_EQ
            | prod::COND_GE
            | prod::COND_LE
            | prod::COND_NE => {
                let children = tree.children(node).to_vec();
                if children.len() != 3 {
                    return Err(SdtError::MalformedTree("C: E rel E"));
                }
                self.eval_expr(tree, children[0])?;
                self.eval_expr(tree, children[2])?;
                let left = self.place_of(tree, children[0], production)?;
                let right = self.place_of(tree, children[2], production)?;
                let op = match production {
                    prod::COND_GT => Op::Gt,
                    prod::COND_LT => Op::Lt,
                    prod::COND_EQ => Op::Eq,
                    prod::COND_GE => Op::Ge,
                    prod::COND_LE => Op::Le,
                    _ => Op::Ne,
                };
                self.code.emit_branch(op, true_label, left, right);
                self.code.emit_goto(false_label);
                Ok(())
            }
            other => Err(SdtError::UnexpectedProduction(other)),
        }
    }

    // E → R X: the term's place is threaded through the tail left-to-right
    fn eval_expr(&mut self, tree: &mut SyntaxTree, node: NodeId) -> Result<(), SdtError> {
        let production = tree
            .production_of(node)
            .ok_or(SdtError::MalformedTree("an expression node"))?;
        if production != prod::EXPR {
            return Err(SdtError::UnexpectedProduction(production));
        }
        let children = tree.children(node).to_vec();
        if children.len() != 2 {
            return Err(SdtError::MalformedTree("E: R X"));
        }
        self.eval_term(tree, children[0])?;
        let inherited = self.place_of(tree, children[0], production)?;
        let place = self.eval_expr_tail(tree, children[1], inherited)?;
        tree.attributes_mut(node).place = Some(place);
        Ok(())
    }

    fn eval_expr_tail(
        &mut self,
        tree: &mut SyntaxTree,
        node: NodeId,
        inherited: String,
    ) -> Result<String, SdtError> {
        let production = tree
            .production_of(node)
            .ok_or(SdtError::MalformedTree("an expression tail node"))?;
        match production {
            prod::EXPR_TAIL_EMPTY => {
                tree.attributes_mut(node).place = Some(inherited.clone());
                Ok(inherited)
            }
            prod::EXPR_TAIL_ADD | prod::EXPR_TAIL_SUB => {
                let children = tree.children(node).to_vec();
                if children.len() != 3 {
                    return Err(SdtError::MalformedTree("X: op R X"));
                }
                self.eval_term(tree, children[1])?;
                let operand = self.place_of(tree, children[1], production)?;
                let temp = self.new_temp()?;
                let op = if production == prod::EXPR_TAIL_ADD {
                    Op::Add
                } else {
                    Op::Sub
                };
                self.code.emit_binary(op, temp.clone(), inherited, operand);
                let place = self.eval_expr_tail(tree, children[2], temp)?;
                tree.attributes_mut(node).place = Some(place.clone());
                Ok(place)
            }
            other => Err(SdtError::UnexpectedProduction(other)),
        }
    }

    // R → F Y
    fn eval_term(&mut self, tree: &mut SyntaxTree, node: NodeId) -> Result<(), SdtError> {
        let production = tree
            .production_of(node)
            .ok_or(SdtError::MalformedTree("a term node"))?;
        if production != prod::TERM {
            return Err(SdtError::UnexpectedProduction(production));
        }
        let children = tree.children(node).to_vec();
        if children.len() != 2 {
            return Err(SdtError::MalformedTree("R: F Y"));
        }
        self.eval_factor(tree, children[0])?;
        let inherited = self.place_of(tree, children[0], production)?;
        let place = self.eval_term_tail(tree, children[1], inherited)?;
        tree.attributes_mut(node).place = Some(place);
        Ok(())
    }

    fn eval_term_tail(
        &mut self,
        tree: &mut SyntaxTree,
        node: NodeId,
        inherited: String,
    ) -> Result<String, SdtError> {
        let production = tree
            .production_of(node)
            .ok_or(SdtError::MalformedTree("a term tail node"))?;
        match production {
            prod::TERM_TAIL_EMPTY => {
                tree.attributes_mut(node).place = Some(inherited.clone());
                Ok(inherited)
            }
            prod::TERM_TAIL_MUL | prod::TERM_TAIL_DIV => {
                let children = tree.children(node).to_vec();
                if children.len() != 3 {
                    return Err(SdtError::MalformedTree("Y: op F Y"));
                }
                self.eval_factor(tree, children[1])?;
                let operand = self.place_of(tree, children[1], production)?;
                let temp = self.new_temp()?;
                let op = if production == prod::TERM_TAIL_MUL {
                    Op::Mul
                } else {
                    Op::Div
                };
                self.code.emit_binary(op, temp.clone(), inherited, operand);
                let place = self.eval_term_tail(tree, children[2], temp)?;
                tree.attributes_mut(node).place = Some(place.clone());
                Ok(place)
            }
            other => Err(SdtError::UnexpectedProduction(other)),
        }
    }

    // F → ( E ) | id | int8 | int10 | int16; literal places keep the
    // source spelling, evaluation is deferred to later stages
    fn eval_factor(&mut self, tree: &mut SyntaxTree, node: NodeId) -> Result<(), SdtError> {
        let production = tree
            .production_of(node)
            .ok_or(SdtError::MalformedTree("a factor node"))?;
        match production {
            prod::FACTOR_PAREN => {
                let children = tree.children(node).to_vec();
                if children.len() != 3 {
                    return Err(SdtError::MalformedTree("F: ( E )"));
                }
                self.eval_expr(tree, children[1])?;
                let place = self.place_of(tree, children[1], production)?;
                tree.attributes_mut(node).place = Some(place);
                Ok(())
            }
            prod::FACTOR_ID => {
                let lexeme = self.leaf_lexeme(tree, node)?;
                self.symbols.note(&lexeme);
                tree.attributes_mut(node).place = Some(lexeme);
                Ok(())
            }
            prod::FACTOR_OCT | prod::FACTOR_DEC | prod::FACTOR_HEX => {
                let lexeme = self.leaf_lexeme(tree, node)?;
                tree.attributes_mut(node).place = Some(lexeme);
                Ok(())
            }
            other => Err(SdtError::UnexpectedProduction(other)),
        }
    }

    fn leaf_lexeme(&self, tree: &SyntaxTree, node: NodeId) -> Result<String, SdtError> {
        let children = tree.children(node);
        let leaf = children
            .first()
            .copied()
            .ok_or(SdtError::MalformedTree("a leaf factor"))?;
        match tree.token(leaf) {
            Some(token) => Ok(token.lexeme().to_string()),
            None => Err(SdtError::MalformedTree("a terminal leaf")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paslex::{teaching_lexicon, TokenStream};
    use passyn::automaton::{Automaton, LrVariant};
    use passyn::driver::LrDriver;
    use passyn::grammar::teaching_grammar;
    use passyn::table::{ActionTable, ConflictPolicy};

    fn tac_for(text: &str) -> Translation {
        let grammar = teaching_grammar();
        let automaton = Automaton::build(&grammar, LrVariant::Lr1);
        let table = ActionTable::build(&grammar, &automaton, ConflictPolicy::PreferShift)
            .expect("prefer-shift filling cannot fail");
        let driver = LrDriver::new(&grammar, &table);
        let mut tokens = TokenStream::new(&teaching_lexicon(), text.to_string(), String::new());
        let mut output = driver.parse(&mut tokens).expect("the input must parse");
        translate(&mut output.tree).expect("the translation must succeed")
    }

    fn lines(translation: &Translation) -> Vec<String> {
        translation
            .code
            .to_text()
            .lines()
            .map(|line| line.trim().to_string())
            .collect()
    }

    #[test]
    fn simple_addition() {
        let translation = tac_for("x = 1 + 2;");
        assert_eq!(lines(&translation), vec!["t0 := 1 + 2", "x := t0"]);
    }

    #[test]
    fn precedence_threads_temporaries() {
        let translation = tac_for("x = a * b + c;");
        assert_eq!(
            lines(&translation),
            vec!["t0 := a * b", "t1 := t0 + c", "x := t1"]
        );
        let names: Vec<&String> = translation.symbols.names().collect();
        assert_eq!(names, vec!["a", "b", "c", "x"]);
    }

    #[test]
    fn if_statement_layout() {
        let translation = tac_for("if x > 0 then y = 1;");
        assert_eq!(
            lines(&translation),
            vec!["if x > 0 goto L0", "goto L1", "L0:", "y := 1", "L1:"]
        );
    }

    #[test]
    fn if_else_statement_layout() {
        let translation = tac_for("if x > 0 then y = 1 else y = 2;");
        assert_eq!(
            lines(&translation),
            vec![
                "if x > 0 goto L0",
                "goto L1",
                "L0:",
                "y := 1",
                "goto L2",
                "L1:",
                "y := 2",
                "L2:"
            ]
        );
    }

    #[test]
    fn while_statement_layout() {
        let translation = tac_for("while i < 10 do i = i + 1;");
        assert_eq!(
            lines(&translation),
            vec![
                "L0:",
                "if i < 10 goto L1",
                "goto L2",
                "L1:",
                "t0 := i + 1",
                "i := t0",
                "goto L0",
                "L2:"
            ]
        );
    }

    #[test]
    fn block_statements_run_in_sequence() {
        let translation = tac_for("begin x = 1; y = 2; end;");
        assert_eq!(lines(&translation), vec!["x := 1", "y := 2"]);
    }

    #[test]
    fn parenthesised_conditions_inherit_their_labels() {
        let translation = tac_for("if (x > 0) then y = 1;");
        assert_eq!(
            lines(&translation),
            vec!["if x > 0 goto L0", "goto L1", "L0:", "y := 1", "L1:"]
        );
    }

    #[test]
    fn literal_places_keep_their_source_spelling() {
        let translation = tac_for("x = 007 + 0xFF;");
        assert_eq!(
            lines(&translation),
            vec!["t0 := 007 + 0xFF", "x := t0"]
        );
    }

    #[test]
    fn every_jump_target_is_a_label_and_vice_versa() {
        use std::collections::BTreeSet;
        for text in [
            "if x > 0 then y = 1;",
            "if x > 0 then y = 1 else y = 2;",
            "while i < 10 do if i > 5 then i = i + 2 else i = i * 2;",
            "if (x <> y) then while x < y do x = x + 1;",
        ]
        .iter()
        .copied()
        {
            let translation = tac_for(text);
            let mut labels = BTreeSet::new();
            let mut targets = BTreeSet::new();
            for instruction in translation.code.instructions() {
                if instruction.op() == Op::Label {
                    labels.insert(instruction.result().unwrap().to_string());
                } else if instruction.op() == Op::Goto || instruction.op().is_relation() {
                    targets.insert(instruction.result().unwrap().to_string());
                }
            }
            assert_eq!(labels, targets, "orphan or dangling labels for {:?}", text);
        }
    }

    #[test]
    fn temporaries_are_defined_exactly_once() {
        let translation = tac_for("x = a * b + c / d - (e + f) * g;");
        let mut defined = std::collections::BTreeMap::new();
        for instruction in translation.code.instructions() {
            if instruction.op().is_arithmetic() {
                let result = instruction.result().unwrap().to_string();
                *defined.entry(result).or_insert(0) += 1;
            }
        }
        for (temp, count) in defined.iter() {
            assert_eq!(*count, 1, "{} defined {} times", temp, count);
        }
    }

    #[test]
    fn untranslatable_trees_are_rejected() {
        let mut tree = SyntaxTree::new();
        match translate(&mut tree) {
            Err(SdtError::MissingRoot) => (),
            other => panic!("expected a missing-root error, got {:?}", other),
        }
    }
}
