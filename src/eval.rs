use super::*;

use std::collections::BTreeMap;

use log::*;

/// Evaluates chips from a [`Registry`].
///
/// Every call works on its own signal environment, so evaluating the same
/// chip twice with the same inputs always gives the same outputs.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'r> {
    registry: &'r Registry,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r Registry) -> Evaluator<'r> {
        Evaluator { registry }
    }

    /// Computes the outputs of the chip `chip_name`.
    ///
    /// `inputs` must bind exactly the chip's declared inputs.
    /// The result binds exactly its declared outputs, in declaration order.
    pub fn evaluate(&self, chip_name: &str, inputs: &Bindings) -> Result<Bindings, HdlError> {
        let chip = self.registry.lookup(chip_name)?;
        let interface = chip.interface();

        for pin in inputs.names() {
            if !interface.has_input(pin) {
                return Err(HdlError::UnknownPin(None, chip_name.to_string(), pin.to_string()));
            }
        }

        let mut values = vec![];
        for pin in &interface.inputs {
            match inputs.get(pin) {
                Some(value) => values.push(value),
                None => return Err(HdlError::MissingInput(None, chip_name.to_string(), pin.clone())),
            }
        }

        trace!("evaluate {chip_name}({inputs})");
        match chip {
            Chip::Builtin(builtin) => {
                let outputs = builtin.apply(&values);
                Ok(interface.outputs.iter().cloned().zip(outputs).collect())
            },
            Chip::Composite(chipdef) => {
                if let Err(errors) = self.registry.check(chip_name) {
                    // errors is never empty
                    return Err(errors[0].clone());
                }
                Invocation::new(*self, chipdef, inputs).run()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartState {
    Pending,
    InProgress,
    Done,
}

/// One call of a user-defined chip.
///
/// Parts are visited in PARTS order, but a part whose input is not ready yet
/// first evaluates whichever part drives that input. Outputs are written into
/// `env` as soon as a part finishes, so each part runs at most once per call.
struct Invocation<'a> {
    evaluator: Evaluator<'a>,
    chipdef: &'a ChipDef,
    env: BTreeMap<&'a str, bool>,
    drivers: BTreeMap<&'a str, usize>,
    states: Vec<PartState>,
    stack: Vec<usize>,
}

impl<'a> Invocation<'a> {
    fn new(evaluator: Evaluator<'a>, chipdef: &'a ChipDef, inputs: &Bindings) -> Invocation<'a> {
        let mut env = BTreeMap::new();
        for pin in chipdef.inputs() {
            if let Some(value) = inputs.get(pin) {
                env.insert(pin.as_str(), value);
            }
        }

        Invocation {
            evaluator,
            chipdef,
            env,
            drivers: evaluator.registry.drivers(chipdef),
            states: vec![PartState::Pending; chipdef.parts().len()],
            stack: vec![],
        }
    }

    fn run(mut self) -> Result<Bindings, HdlError> {
        for index in 0..self.chipdef.parts().len() {
            self.resolve_part(index)?;
        }

        let mut outputs = Bindings::empty();
        for pin in self.chipdef.outputs() {
            match self.env.get(pin.as_str()) {
                Some(value) => outputs.insert(pin, *value),
                None => return Err(HdlError::UnboundOutput(self.chipdef.name().to_string(), pin.clone())),
            }
        }
        Ok(outputs)
    }

    fn resolve_part(&mut self, index: usize) -> Result<(), HdlError> {
        match self.states[index] {
            PartState::Done => return Ok(()),
            PartState::InProgress => return Err(self.cycle_through(index)),
            PartState::Pending => (),
        }
        self.states[index] = PartState::InProgress;
        self.stack.push(index);

        let chipdef = self.chipdef;
        let part = &chipdef.parts()[index];
        let interface = self.evaluator.registry.lookup(part.chip_name())
            .map_err(|_error| HdlError::UnknownChip(Some(PartRef::new(chipdef, index)), part.chip_name().to_string()))?
            .interface();

        let mut part_inputs = Bindings::empty();
        for formal in &interface.inputs {
            let local = match part.local_for(formal) {
                Some(local) => local,
                None => return Err(HdlError::MissingInput(Some(PartRef::new(chipdef, index)), part.chip_name().to_string(), formal.clone())),
            };
            let value = self.signal(local, index)?;
            part_inputs.insert(formal, value);
        }

        trace!("    {} part #{index}: {part}", chipdef.name());
        let part_outputs = self.evaluator.evaluate(part.chip_name(), &part_inputs)?;

        for connection in part.connections() {
            if interface.has_input(connection.formal()) {
                continue;
            }
            match part_outputs.get(connection.formal()) {
                Some(value) => {
                    self.env.insert(connection.local(), value);
                },
                None => return Err(HdlError::UnknownPin(
                    Some(PartRef::new(chipdef, index)),
                    part.chip_name().to_string(),
                    connection.formal().to_string(),
                )),
            }
        }

        self.stack.pop();
        self.states[index] = PartState::Done;
        Ok(())
    }

    /// The value of the local signal `local`, as read by the part `reader`.
    fn signal(&mut self, local: &'a str, reader: usize) -> Result<bool, HdlError> {
        if let Some(value) = self.env.get(local) {
            return Ok(*value);
        }

        match self.drivers.get(local) {
            Some(driver) => {
                let driver = *driver;
                self.resolve_part(driver)?;
                match self.env.get(local) {
                    Some(value) => Ok(*value),
                    None => Err(HdlError::UnresolvedSignal(PartRef::new(self.chipdef, reader), local.to_string())),
                }
            },
            None => Err(HdlError::UnresolvedSignal(PartRef::new(self.chipdef, reader), local.to_string())),
        }
    }

    fn cycle_through(&self, index: usize) -> HdlError {
        let start = self.stack.iter().position(|i| *i == index).unwrap_or(0);
        let mut members: Vec<String> = self.stack[start..]
            .iter()
            .map(|i| format!("#{i} {}", self.chipdef.parts()[*i].chip_name()))
            .collect();
        members.push(format!("#{index} {}", self.chipdef.parts()[index].chip_name()));
        HdlError::CombinationalCycle(self.chipdef.loc(), self.chipdef.name().to_string(), members)
    }
}
