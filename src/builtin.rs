use super::*;

use lazy_static::lazy_static;

/// The primitive gates every registry starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Builtin {
    Nand,
    Not,
    And,
    Or,
}

lazy_static! {
    static ref BINARY_GATE: Interface = Interface {
        inputs: vec!["a".to_string(), "b".to_string()],
        outputs: vec!["out".to_string()],
    };

    static ref UNARY_GATE: Interface = Interface {
        inputs: vec!["in".to_string()],
        outputs: vec!["out".to_string()],
    };
}

impl Builtin {
    pub fn all() -> [Builtin; 4] {
        [Builtin::Nand, Builtin::Not, Builtin::And, Builtin::Or]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Nand => "Nand",
            Builtin::Not => "Not",
            Builtin::And => "And",
            Builtin::Or => "Or",
        }
    }

    pub fn from_name(name: &str) -> Option<Builtin> {
        Builtin::all().into_iter().find(|builtin| builtin.name() == name)
    }

    pub fn interface(&self) -> &'static Interface {
        match self {
            Builtin::Not => &*UNARY_GATE,
            Builtin::Nand | Builtin::And | Builtin::Or => &*BINARY_GATE,
        }
    }

    /// Applies the gate to its inputs, given in the order of [`Builtin::interface`].
    /// Returns the outputs in the same fashion.
    pub fn apply(&self, inputs: &[bool]) -> Vec<bool> {
        let out = match (self, inputs) {
            (Builtin::Nand, [a, b]) => !(*a && *b),
            (Builtin::Not, [x]) => !*x,
            (Builtin::And, [a, b]) => *a && *b,
            (Builtin::Or, [a, b]) => *a || *b,
            _ => unreachable!("{} applied to {} inputs", self.name(), inputs.len()),
        };
        vec![out]
    }
}

impl std::fmt::Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
