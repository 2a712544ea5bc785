mod check;

pub(crate) use check::duplicate_pins;

use super::*;

use std::collections::BTreeMap;
use std::sync::Arc;

use log::*;
use once_cell::sync::OnceCell;

/// Anything that can be evaluated: a primitive gate or a user-defined chip.
#[derive(Debug, Clone)]
pub enum Chip {
    Builtin(Builtin),
    Composite(Arc<ChipDef>),
}

impl Chip {
    pub fn interface(&self) -> Interface {
        match self {
            Chip::Builtin(builtin) => builtin.interface().clone(),
            Chip::Composite(chipdef) => chipdef.interface(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Chip::Builtin(_))
    }
}

impl From<Builtin> for Chip {
    fn from(builtin: Builtin) -> Chip {
        Chip::Builtin(builtin)
    }
}

impl From<ChipDef> for Chip {
    fn from(chipdef: ChipDef) -> Chip {
        Chip::Composite(Arc::new(chipdef))
    }
}

impl From<Arc<ChipDef>> for Chip {
    fn from(chipdef: Arc<ChipDef>) -> Chip {
        Chip::Composite(chipdef)
    }
}

#[derive(Debug)]
struct Entry {
    chip: Chip,
    checked: OnceCell<Result<(), Vec<HdlError>>>,
}

/// A [`Registry`] maps chip names to chips.
///
/// Chips are only ever added. A user-defined chip is checked the first time
/// it is needed (see [`Registry::check`]) and the outcome is kept until the
/// next registration.
#[derive(Debug)]
pub struct Registry {
    entries: BTreeMap<Name, Entry>,
}

impl Registry {
    /// A registry holding Nand, Not, And, and Or.
    pub fn new() -> Registry {
        Registry::with_builtins(&Builtin::all())
    }

    /// A registry with nothing in it.
    pub fn empty() -> Registry {
        Registry {
            entries: BTreeMap::new(),
        }
    }

    pub fn with_builtins(builtins: &[Builtin]) -> Registry {
        let mut registry = Registry::empty();
        for builtin in builtins {
            let chip = Chip::Builtin(*builtin);
            registry.entries.insert(builtin.name().to_string(), Entry { chip, checked: OnceCell::new() });
        }
        registry
    }

    pub fn register<C: Into<Chip>>(&mut self, name: &str, chip: C) -> Result<(), HdlError> {
        let chip = chip.into();
        if self.entries.contains_key(name) {
            let loc = match &chip {
                Chip::Composite(chipdef) => chipdef.loc(),
                Chip::Builtin(_builtin) => Loc::unknown(),
            };
            return Err(HdlError::DuplicateChip(loc, name.to_string()));
        }

        info!("Registering chip {name}");
        // Cached results may have depended on this name being unknown.
        for entry in self.entries.values_mut() {
            entry.checked = OnceCell::new();
        }
        self.entries.insert(name.to_string(), Entry { chip, checked: OnceCell::new() });
        Ok(())
    }

    /// Registers a user-defined chip under its own name.
    pub fn add(&mut self, chipdef: ChipDef) -> Result<(), HdlError> {
        let name = chipdef.name().to_string();
        self.register(&name, chipdef)
    }

    pub fn lookup(&self, name: &str) -> Result<&Chip, HdlError> {
        match self.entries.get(name) {
            Some(entry) => Ok(&entry.chip),
            None => Err(HdlError::UnknownChip(None, name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn interface(&self, name: &str) -> Result<Interface, HdlError> {
        Ok(self.lookup(name)?.interface())
    }

    /// All registered names, in sorted order.
    pub fn chip_names(&self) -> Vec<&str> {
        self.entries.keys().map(|name| name.as_str()).collect()
    }

    /// Checks the wiring of the chip `name`.
    ///
    /// Built-in gates always pass.
    /// For a user-defined chip, every part must name a registered chip,
    /// connect only pins that chip declares, and connect all of its inputs.
    /// Every signal read must have exactly one driver, every output must be driven,
    /// and neither the parts nor the chips they instantiate may form a cycle.
    pub fn check(&self, name: &str) -> Result<(), Vec<HdlError>> {
        let entry = match self.entries.get(name) {
            Some(entry) => entry,
            None => return Err(vec![HdlError::UnknownChip(None, name.to_string())]),
        };

        match &entry.chip {
            Chip::Builtin(_builtin) => Ok(()),
            Chip::Composite(chipdef) => entry.checked.get_or_init(|| {
                debug!("Checking chip {name}");
                self.check_chip(name, chipdef)
            }).clone(),
        }
    }

    /// Checks every registered chip and returns all of the errors found.
    pub fn check_all(&self) -> Result<(), Vec<HdlError>> {
        let mut errors = vec![];
        for name in self.entries.keys() {
            if let Err(chip_errors) = self.check(name) {
                errors.extend(chip_errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for Registry {
    fn default() -> Registry {
        Registry::new()
    }
}
