use super::*;

use std::collections::BTreeSet;

pub type Name = String;

/// A [`ChipDef`] is a user-defined chip: its interface and its PARTS list.
///
/// Chip definitions only describe structure. Whether the wiring makes sense
/// (every pin exists, every signal is driven, nothing loops back on itself)
/// is checked by the [`Registry`] the first time the chip is evaluated.
#[derive(Debug, Clone)]
pub struct ChipDef {
    loc: Loc,
    name: Name,
    inputs: Vec<Name>,
    outputs: Vec<Name>,
    parts: Vec<Part>,
}

impl ChipDef {
    pub fn new(name: &str, inputs: &[&str], outputs: &[&str], parts: Vec<Part>) -> ChipDef {
        ChipDef {
            loc: Loc::unknown(),
            name: name.to_string(),
            inputs: inputs.iter().map(|pin| pin.to_string()).collect(),
            outputs: outputs.iter().map(|pin| pin.to_string()).collect(),
            parts,
        }
    }

    pub(crate) fn from_parsed(loc: Loc, name: Name, inputs: Vec<Name>, outputs: Vec<Name>, parts: Vec<Part>) -> ChipDef {
        ChipDef {
            loc,
            name,
            inputs,
            outputs,
            parts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[Name] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Name] {
        &self.outputs
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn interface(&self) -> Interface {
        Interface {
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
        }
    }

    pub fn is_input(&self, pin: &str) -> bool {
        self.inputs.iter().any(|input| input == pin)
    }

    pub fn is_output(&self, pin: &str) -> bool {
        self.outputs.iter().any(|output| output == pin)
    }

    /// The names of the chips instantiated in the PARTS list, without repeats.
    pub fn depends_on(&self) -> Vec<Name> {
        let names: BTreeSet<&str> = self.parts.iter().map(|part| part.chip_name()).collect();
        names.into_iter().map(|name| name.to_string()).collect()
    }
}

impl HasLoc for ChipDef {
    fn loc(&self) -> Loc {
        self.loc.clone()
    }
}

impl std::fmt::Display for ChipDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "CHIP {} {{", self.name)?;
        writeln!(f, "    IN {};", self.inputs.join(", "))?;
        writeln!(f, "    OUT {};", self.outputs.join(", "))?;
        writeln!(f, "    PARTS:")?;
        for part in &self.parts {
            writeln!(f, "    {part};")?;
        }
        write!(f, "}}")
    }
}

/// One instantiation of a chip inside another chip's PARTS list.
#[derive(Debug, Clone)]
pub struct Part {
    loc: Loc,
    chip_name: Name,
    connections: Vec<Connection>,
}

impl Part {
    /// Builds a part from `(formal, local)` pairs, eg, `Part::new("Not", &[("in", "a"), ("out", "nota")])`.
    pub fn new(chip_name: &str, connections: &[(&str, &str)]) -> Part {
        Part {
            loc: Loc::unknown(),
            chip_name: chip_name.to_string(),
            connections: connections.iter().map(|(formal, local)| Connection(formal.to_string(), local.to_string())).collect(),
        }
    }

    pub(crate) fn from_parsed(loc: Loc, chip_name: Name, connections: Vec<Connection>) -> Part {
        Part {
            loc,
            chip_name,
            connections,
        }
    }

    pub fn chip_name(&self) -> &str {
        &self.chip_name
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// The local signal wired to the formal pin `formal`, if any.
    pub fn local_for(&self, formal: &str) -> Option<&str> {
        self.connections
            .iter()
            .find(|connection| connection.formal() == formal)
            .map(|connection| connection.local())
    }
}

impl HasLoc for Part {
    fn loc(&self) -> Loc {
        self.loc.clone()
    }
}

impl std::fmt::Display for Part {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.chip_name)?;
        for (i, connection) in self.connections.iter().enumerate() {
            write!(f, "{connection}")?;
            if i + 1 < self.connections.len() {
                write!(f, ", ")?;
            }
        }
        write!(f, ")")
    }
}

/// A wire from a part's formal pin (left) to a signal of the enclosing chip (right).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection(pub Name, pub Name);

impl Connection {
    pub fn formal(&self) -> &str {
        &self.0
    }

    pub fn local(&self) -> &str {
        &self.1
    }
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.0, self.1)
    }
}

/// The declared pins of a chip, built-in or user-defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub inputs: Vec<Name>,
    pub outputs: Vec<Name>,
}

impl Interface {
    pub fn has_input(&self, pin: &str) -> bool {
        self.inputs.iter().any(|input| input == pin)
    }

    pub fn has_output(&self, pin: &str) -> bool {
        self.outputs.iter().any(|output| output == pin)
    }

    pub fn has_pin(&self, pin: &str) -> bool {
        self.has_input(pin) || self.has_output(pin)
    }
}

/// Pin values, kept in the order they were bound.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bindings(Vec<(Name, bool)>);

impl Bindings {
    pub fn empty() -> Bindings {
        Bindings(vec![])
    }

    pub fn get(&self, pin: &str) -> Option<bool> {
        for (name, value) in &self.0 {
            if name == pin {
                return Some(*value);
            }
        }
        None
    }

    /// Binds `pin`, replacing any earlier value for it.
    pub fn insert(&mut self, pin: &str, value: bool) {
        for (name, old_value) in self.0.iter_mut() {
            if name == pin {
                *old_value = value;
                return;
            }
        }
        self.0.push((pin.to_string(), value));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _value)| name.as_str())
    }
}

impl std::ops::Deref for Bindings {
    type Target = Vec<(Name, bool)>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Into<Name>> FromIterator<(S, bool)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Bindings {
        let mut bindings = Bindings::empty();
        for (name, value) in iter {
            let name: Name = name.into();
            bindings.insert(&name, value);
        }
        bindings
    }
}

impl<S: Into<Name>, const N: usize> From<[(S, bool); N]> for Bindings {
    fn from(pins: [(S, bool); N]) -> Bindings {
        pins.into_iter().collect()
    }
}

impl std::fmt::Display for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            write!(f, "{name}={}", *value as u8)?;
            if i + 1 < self.0.len() {
                write!(f, ", ")?;
            }
        }
        Ok(())
    }
}
