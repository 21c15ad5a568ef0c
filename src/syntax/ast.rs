//! Operation trees.
//!
//! Pure data produced by the parser and consumed by the dispatcher.

use serde::{Deserialize, Serialize};

use crate::model::Value;

/// Head symbol of the nested form that carries intent tokens.
pub const INTENT_FORM: &str = "intent";

/// One parenthesised form: `(operator operand ...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub operator: String,
    pub operands: Vec<Operand>,
    /// Byte offset of the opening parenthesis.
    pub position: usize,
}

impl Operation {
    pub fn new(operator: impl Into<String>) -> Self {
        Self { operator: operator.into(), operands: Vec::new(), position: 0 }
    }

    /// Builder helper, mostly for tests and embedding hosts.
    pub fn with(mut self, operand: impl Into<Operand>) -> Self {
        self.operands.push(operand.into());
        self
    }

    /// Gesture nesting depth of this tree (a leaf form is 0). Intent
    /// forms are metadata and do not count. Iterative, so any depth is safe.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((op, level)) = stack.pop() {
            deepest = deepest.max(level);
            for operand in &op.operands {
                match operand {
                    Operand::Tree(t) if !t.is_intent() => stack.push((t, level + 1)),
                    _ => {}
                }
            }
        }
        deepest
    }

    pub fn is_intent(&self) -> bool {
        self.operator == INTENT_FORM
    }
}

// Iterative teardown: dropping a deep tree never recurses.
impl Drop for Operation {
    fn drop(&mut self) {
        let mut pending: Vec<Operation> = Vec::new();
        detach_trees(&mut self.operands, &mut pending);
        while let Some(mut op) = pending.pop() {
            detach_trees(&mut op.operands, &mut pending);
        }
    }
}

fn detach_trees(operands: &mut Vec<Operand>, pending: &mut Vec<Operation>) {
    for operand in operands.drain(..) {
        if let Operand::Tree(t) = operand {
            pending.push(t);
        }
    }
}

/// Operand: an atom or a nested form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Atom(Atom),
    Tree(Operation),
}

/// Leaf values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Atom {
    String(String),
    Int(i64),
    /// Decimal with its source spelling, so `1.50` names `1.50`.
    Float { value: f64, lexeme: String },
    Symbol(String),
    /// `:key`: introduces an attribute override.
    Keyword(String),
}

impl Atom {
    /// Text used when the atom is a positional operand.
    pub fn to_text(&self) -> String {
        match self {
            Atom::String(s) | Atom::Symbol(s) => s.clone(),
            Atom::Int(i) => i.to_string(),
            Atom::Float { lexeme, .. } => lexeme.clone(),
            Atom::Keyword(k) => format!(":{k}"),
        }
    }

    /// Value used when the atom is an attribute override.
    pub fn to_value(&self) -> Value {
        match self {
            Atom::String(s) | Atom::Symbol(s) => Value::String(s.clone()),
            Atom::Int(i) => Value::Int(*i),
            Atom::Float { value, .. } => Value::Float(*value),
            Atom::Keyword(k) => Value::String(format!(":{k}")),
        }
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self { Operand::Atom(Atom::String(s.to_string())) }
}
impl From<String> for Operand {
    fn from(s: String) -> Self { Operand::Atom(Atom::String(s)) }
}
impl From<i64> for Operand {
    fn from(i: i64) -> Self { Operand::Atom(Atom::Int(i)) }
}
impl From<Atom> for Operand {
    fn from(a: Atom) -> Self { Operand::Atom(a) }
}
impl From<Operation> for Operand {
    fn from(op: Operation) -> Self { Operand::Tree(op) }
}
