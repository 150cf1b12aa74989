// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::borrow::Cow;
use std::io;

use paslex::Token;

use crate::grammar::Grammar;
use crate::symbol::NonTerminal;

/// Index of a node in its owning `SyntaxTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Attributes decorating a node for syntax-directed translation, created
/// lazily on first use.
#[derive(Debug, Default, Clone)]
pub struct SdtAttributes {
    pub place: Option<String>,
    pub true_label: Option<String>,
    pub false_label: Option<String>,
    pub next_label: Option<String>,
    pub begin_label: Option<String>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Terminal(Token),
    NonTerminal {
        non_terminal: NonTerminal,
        production: u32,
        children: Vec<NodeId>,
    },
    Epsilon,
}

#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    attributes: Option<Box<SdtAttributes>>,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }
}

/// An arena-backed concrete syntax tree.  The tree owns its nodes and
/// their attributes; dropping it frees everything transitively.
#[derive(Debug, Default)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(64),
            root: None,
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let ident = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            attributes: None,
        });
        ident
    }

    pub fn terminal(&mut self, token: Token) -> NodeId {
        self.push(NodeKind::Terminal(token))
    }

    pub fn non_terminal(&mut self, non_terminal: NonTerminal, production: u32) -> NodeId {
        self.push(NodeKind::NonTerminal {
            non_terminal,
            production,
            children: vec![],
        })
    }

    pub fn epsilon(&mut self) -> NodeId {
        self.push(NodeKind::Epsilon)
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        match &mut self.nodes[parent.0].kind {
            NodeKind::NonTerminal { children, .. } => children.push(child),
            _ => panic!("only non-terminal nodes can have children"),
        }
    }

    /// One-shot root assignment.
    pub fn set_root(&mut self, root: NodeId) {
        assert!(self.root.is_none(), "the tree root has already been set");
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, ident: NodeId) -> &Node {
        &self.nodes[ident.0]
    }

    pub fn kind(&self, ident: NodeId) -> &NodeKind {
        &self.nodes[ident.0].kind
    }

    pub fn children(&self, ident: NodeId) -> &[NodeId] {
        match &self.nodes[ident.0].kind {
            NodeKind::NonTerminal { children, .. } => children,
            _ => &[],
        }
    }

    pub fn token(&self, ident: NodeId) -> Option<&Token> {
        match &self.nodes[ident.0].kind {
            NodeKind::Terminal(token) => Some(token),
            _ => None,
        }
    }

    pub fn production_of(&self, ident: NodeId) -> Option<u32> {
        match &self.nodes[ident.0].kind {
            NodeKind::NonTerminal { production, .. } => Some(*production),
            _ => None,
        }
    }

    pub fn non_terminal_of(&self, ident: NodeId) -> Option<NonTerminal> {
        match &self.nodes[ident.0].kind {
            NodeKind::NonTerminal { non_terminal, .. } => Some(*non_terminal),
            _ => None,
        }
    }

    pub fn attributes(&self, ident: NodeId) -> Option<&SdtAttributes> {
        self.nodes[ident.0].attributes.as_deref()
    }

    pub fn attributes_mut(&mut self, ident: NodeId) -> &mut SdtAttributes {
        self.nodes[ident.0]
            .attributes
            .get_or_insert_with(Default::default)
    }

    pub fn place(&self, ident: NodeId) -> Option<&str> {
        self.attributes(ident)?.place.as_deref()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Arena watermark for backtracking parsers.
    pub fn mark(&self) -> usize {
        self.nodes.len()
    }

    /// Drops every node created after `mark`.
    pub fn truncate(&mut self, mark: usize) {
        self.nodes.truncate(mark);
    }

    /// The tokens of the tree's terminal leaves in pre-order.
    pub fn terminal_sequence(&self) -> Vec<&Token> {
        self.preorder()
            .iter()
            .filter_map(|ident| self.token(*ident))
            .collect()
    }

    /// The production identifiers of the tree in pre-order: a leftmost
    /// derivation of the parsed sentence.
    pub fn derivation(&self) -> Vec<u32> {
        self.preorder()
            .iter()
            .filter_map(|ident| self.production_of(*ident))
            .collect()
    }

    fn preorder(&self) -> Vec<NodeId> {
        let mut idents = vec![];
        if let Some(root) = self.root {
            self.collect_preorder(root, &mut idents);
        }
        idents
    }

    fn collect_preorder(&self, ident: NodeId, idents: &mut Vec<NodeId>) {
        idents.push(ident);
        for child in self.children(ident) {
            self.collect_preorder(*child, idents);
        }
    }
}

#[derive(Clone)]
struct DisplayNode<'a> {
    tree: &'a SyntaxTree,
    grammar: &'a Grammar,
    ident: NodeId,
}

impl<'a> ptree::TreeItem for DisplayNode<'a> {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, _style: &ptree::Style) -> io::Result<()> {
        match self.tree.kind(self.ident) {
            NodeKind::Terminal(token) => {
                if token.kind() == paslex::TokenKind::Ident || token.kind().is_integer() {
                    write!(f, "{}({})", token.kind(), token.lexeme())
                } else {
                    write!(f, "{}", token.kind())
                }
            }
            NodeKind::NonTerminal { production, .. } => {
                write!(f, "{}", self.grammar.production(*production))
            }
            NodeKind::Epsilon => write!(f, "ε"),
        }
    }

    fn children(&self) -> Cow<[Self::Child]> {
        let children: Vec<Self> = self
            .tree
            .children(self.ident)
            .iter()
            .map(|child| DisplayNode {
                tree: self.tree,
                grammar: self.grammar,
                ident: *child,
            })
            .collect();
        Cow::Owned(children)
    }
}

/// Renders the tree with box-drawing branches.
pub fn write_tree<W: io::Write>(
    tree: &SyntaxTree,
    grammar: &Grammar,
    writer: &mut W,
) -> io::Result<()> {
    if let Some(root) = tree.root() {
        ptree::write_tree(
            &DisplayNode {
                tree,
                grammar,
                ident: root,
            },
            writer,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::prod;

    #[test]
    fn arena_truncation_backtracks() {
        let mut tree = SyntaxTree::new();
        let mark = tree.mark();
        let node = tree.non_terminal(NonTerminal::Stmt, prod::STMT_ASSIGN);
        let eps = tree.epsilon();
        tree.add_child(node, eps);
        assert_eq!(tree.len(), 2);
        tree.truncate(mark);
        assert!(tree.is_empty());
    }

    #[test]
    fn attributes_are_created_lazily() {
        let mut tree = SyntaxTree::new();
        let node = tree.non_terminal(NonTerminal::Expr, prod::EXPR);
        assert!(tree.attributes(node).is_none());
        tree.attributes_mut(node).place = Some("t0".to_string());
        assert_eq!(tree.place(node), Some("t0"));
    }

    #[test]
    fn derivation_is_preorder() {
        let mut tree = SyntaxTree::new();
        let program = tree.non_terminal(NonTerminal::Program, prod::PROGRAM);
        let line = tree.non_terminal(NonTerminal::StmtLine, prod::STMT_LINE);
        let tail = tree.non_terminal(NonTerminal::ProgramTail, prod::PROGRAM_TAIL_EMPTY);
        tree.add_child(program, line);
        tree.add_child(program, tail);
        tree.set_root(program);
        assert_eq!(
            tree.derivation(),
            vec![prod::PROGRAM, prod::STMT_LINE, prod::PROGRAM_TAIL_EMPTY]
        );
    }
}
