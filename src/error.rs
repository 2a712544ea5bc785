use super::*;

/// Points at one part inside a chip's PARTS list.
#[derive(Debug, Clone)]
pub struct PartRef {
    /// The enclosing chip.
    pub chip: Name,
    /// Position of the part in the PARTS list, counted from 0.
    pub index: usize,
    /// The chip the part instantiates.
    pub part_chip: Name,
    pub loc: Loc,
}

impl PartRef {
    pub fn new(chip: &ChipDef, index: usize) -> PartRef {
        let part = &chip.parts()[index];
        PartRef {
            chip: chip.name().to_string(),
            index,
            part_chip: part.chip_name().to_string(),
            loc: part.loc(),
        }
    }
}

impl std::fmt::Display for PartRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} part #{} ({})", self.chip, self.index, self.part_chip)
    }
}

#[derive(Debug, Clone)]
pub enum HdlError {
    DuplicateChip(Loc, Name),
    DuplicatePin(Loc, Name, Name),
    UnknownChip(Option<PartRef>, Name),
    /// A pin named on the interface of the second field, which does not declare it.
    UnknownPin(Option<PartRef>, Name, Name),
    MissingInput(Option<PartRef>, Name, Name),
    UnboundOutput(Name, Name),
    UnresolvedSignal(PartRef, Name),
    MultipleDrivers(PartRef, Name),
    CombinationalCycle(Loc, Name, Vec<String>),
    ParseError(Loc, String),
    TestVectorError(usize, String),
    Io(std::path::PathBuf, String),
}

impl HdlError {
    /// The chip the error was found in, if there is one.
    pub fn chip(&self) -> Option<&str> {
        match self {
            HdlError::DuplicateChip(_loc, name) => Some(name),
            HdlError::DuplicatePin(_loc, chip, _pin) => Some(chip),
            HdlError::UnknownChip(part, name) => Some(part.as_ref().map(|part| part.chip.as_str()).unwrap_or(name)),
            HdlError::UnknownPin(part, chip, _pin) => Some(part.as_ref().map(|part| part.chip.as_str()).unwrap_or(chip)),
            HdlError::MissingInput(part, chip, _pin) => Some(part.as_ref().map(|part| part.chip.as_str()).unwrap_or(chip)),
            HdlError::UnboundOutput(chip, _pin) => Some(chip),
            HdlError::UnresolvedSignal(part, _signal) => Some(&part.chip),
            HdlError::MultipleDrivers(part, _signal) => Some(&part.chip),
            HdlError::CombinationalCycle(_loc, chip, _members) => Some(chip),
            HdlError::ParseError(_loc, _message) => None,
            HdlError::TestVectorError(_line, _message) => None,
            HdlError::Io(_path, _message) => None,
        }
    }

    /// The index of the offending part, when the error is about one.
    pub fn part_index(&self) -> Option<usize> {
        match self {
            HdlError::UnknownChip(Some(part), _) |
            HdlError::UnknownPin(Some(part), _, _) |
            HdlError::MissingInput(Some(part), _, _) |
            HdlError::UnresolvedSignal(part, _) |
            HdlError::MultipleDrivers(part, _) => Some(part.index),
            _ => None,
        }
    }
}

impl std::fmt::Display for HdlError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            HdlError::DuplicateChip(_loc, name) => write!(f, "Duplicate chip: {name} is already registered"),
            HdlError::DuplicatePin(_loc, chip, pin) => write!(f, "Duplicate pin in {chip}: {pin}"),
            HdlError::UnknownChip(None, name) => write!(f, "Unknown chip: {name}"),
            HdlError::UnknownChip(Some(part), name) => write!(f, "{part}: Unknown chip: {name}"),
            HdlError::UnknownPin(None, chip, pin) => write!(f, "Unknown pin: {chip} has no input named {pin}"),
            HdlError::UnknownPin(Some(part), chip, pin) => write!(f, "{part}: Unknown pin: {chip} has no pin named {pin}"),
            HdlError::MissingInput(None, chip, pin) => write!(f, "Missing input: {chip}.{pin} is not bound"),
            HdlError::MissingInput(Some(part), chip, pin) => write!(f, "{part}: Missing input: {chip}.{pin} is not connected"),
            HdlError::UnboundOutput(chip, pin) => write!(f, "Unbound output: {chip}.{pin} is never written by any part"),
            HdlError::UnresolvedSignal(part, signal) => write!(f, "{part}: Unresolved signal: {signal} is not driven by any part"),
            HdlError::MultipleDrivers(part, signal) => write!(f, "{part}: Signal has multiple drivers: {signal}"),
            HdlError::CombinationalCycle(_loc, chip, members) => write!(f, "Combinational cycle in {chip}: {}", members.join(" -> ")),
            HdlError::ParseError(_loc, message) => write!(f, "{message}"),
            HdlError::TestVectorError(line, message) => write!(f, "Test vector line {line}: {message}"),
            HdlError::Io(path, message) => write!(f, "{}: {message}", path.display()),
        }
    }
}

impl std::error::Error for HdlError {}

impl HasLoc for HdlError {
    fn loc(&self) -> Loc {
        match self {
            HdlError::DuplicateChip(loc, _name) => loc.clone(),
            HdlError::DuplicatePin(loc, _chip, _pin) => loc.clone(),
            HdlError::UnknownChip(part, _name) => part.as_ref().map(|part| part.loc.clone()).unwrap_or_else(Loc::unknown),
            HdlError::UnknownPin(part, _chip, _pin) => part.as_ref().map(|part| part.loc.clone()).unwrap_or_else(Loc::unknown),
            HdlError::MissingInput(part, _chip, _pin) => part.as_ref().map(|part| part.loc.clone()).unwrap_or_else(Loc::unknown),
            HdlError::UnboundOutput(_chip, _pin) => Loc::unknown(),
            HdlError::UnresolvedSignal(part, _signal) => part.loc.clone(),
            HdlError::MultipleDrivers(part, _signal) => part.loc.clone(),
            HdlError::CombinationalCycle(loc, _chip, _members) => loc.clone(),
            HdlError::ParseError(loc, _message) => loc.clone(),
            HdlError::TestVectorError(_line, _message) => Loc::unknown(),
            HdlError::Io(_path, _message) => Loc::unknown(),
        }
    }
}
