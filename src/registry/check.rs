use super::*;

use std::collections::BTreeSet;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};

impl Registry {
    pub(crate) fn check_chip(&self, name: &str, chipdef: &ChipDef) -> Result<(), Vec<HdlError>> {
        let mut errors = vec![];

        errors.extend(duplicate_pins(chipdef));
        errors.extend(self.check_parts_interfaces(chipdef));

        let drivers = self.drivers(chipdef);
        errors.extend(self.check_multiple_drivers(chipdef));
        errors.extend(self.check_unresolved_signals(chipdef, &drivers));
        errors.extend(self.check_unbound_outputs(chipdef, &drivers));
        errors.extend(self.check_part_cycles(chipdef, &drivers));
        errors.extend(self.check_instantiation_cycles(name, chipdef));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Maps each driven local signal to the first part that drives it.
    pub(crate) fn drivers<'a>(&self, chipdef: &'a ChipDef) -> BTreeMap<&'a str, usize> {
        let mut drivers = BTreeMap::new();
        for (index, part) in chipdef.parts().iter().enumerate() {
            let interface = match self.lookup(part.chip_name()) {
                Ok(chip) => chip.interface(),
                Err(_error) => continue,
            };
            for connection in part.connections() {
                if interface.has_output(connection.formal()) {
                    drivers.entry(connection.local()).or_insert(index);
                }
            }
        }
        drivers
    }

    fn check_parts_interfaces(&self, chipdef: &ChipDef) -> Vec<HdlError> {
        let mut errors = vec![];

        for (index, part) in chipdef.parts().iter().enumerate() {
            let interface = match self.lookup(part.chip_name()) {
                Ok(chip) => chip.interface(),
                Err(_error) => {
                    errors.push(HdlError::UnknownChip(Some(PartRef::new(chipdef, index)), part.chip_name().to_string()));
                    continue;
                },
            };

            let mut seen = BTreeSet::new();
            for connection in part.connections() {
                if !interface.has_pin(connection.formal()) {
                    errors.push(HdlError::UnknownPin(
                        Some(PartRef::new(chipdef, index)),
                        part.chip_name().to_string(),
                        connection.formal().to_string(),
                    ));
                } else if !seen.insert(connection.formal()) {
                    errors.push(HdlError::DuplicatePin(part.loc(), chipdef.name().to_string(), connection.formal().to_string()));
                }
            }

            for input in &interface.inputs {
                if part.local_for(input).is_none() {
                    errors.push(HdlError::MissingInput(Some(PartRef::new(chipdef, index)), part.chip_name().to_string(), input.clone()));
                }
            }
        }
        errors
    }

    /// A signal may be driven by several parts only when they are the same chip with the same connections.
    fn check_multiple_drivers(&self, chipdef: &ChipDef) -> Vec<HdlError> {
        let mut errors = vec![];
        let mut first_driver: BTreeMap<&str, &Part> = BTreeMap::new();

        for (index, part) in chipdef.parts().iter().enumerate() {
            let interface = match self.lookup(part.chip_name()) {
                Ok(chip) => chip.interface(),
                Err(_error) => continue,
            };
            for connection in part.connections() {
                if !interface.has_output(connection.formal()) {
                    continue;
                }
                let local = connection.local();
                if chipdef.is_input(local) {
                    errors.push(HdlError::MultipleDrivers(PartRef::new(chipdef, index), local.to_string()));
                    continue;
                }
                match first_driver.get(local) {
                    None => {
                        first_driver.insert(local, part);
                    },
                    Some(driver) if is_repeat_of(part, driver) => (),
                    Some(_driver) => {
                        errors.push(HdlError::MultipleDrivers(PartRef::new(chipdef, index), local.to_string()));
                    },
                }
            }
        }
        errors
    }

    fn check_unresolved_signals(&self, chipdef: &ChipDef, drivers: &BTreeMap<&str, usize>) -> Vec<HdlError> {
        let mut errors = vec![];

        for (index, part) in chipdef.parts().iter().enumerate() {
            let interface = match self.lookup(part.chip_name()) {
                Ok(chip) => chip.interface(),
                Err(_error) => continue,
            };
            for connection in part.connections() {
                if !interface.has_input(connection.formal()) {
                    continue;
                }
                let local = connection.local();
                if !chipdef.is_input(local) && !drivers.contains_key(local) {
                    errors.push(HdlError::UnresolvedSignal(PartRef::new(chipdef, index), local.to_string()));
                }
            }
        }
        errors
    }

    fn check_unbound_outputs(&self, chipdef: &ChipDef, drivers: &BTreeMap<&str, usize>) -> Vec<HdlError> {
        let mut errors = vec![];
        for output in chipdef.outputs() {
            if !drivers.contains_key(output.as_str()) {
                errors.push(HdlError::UnboundOutput(chipdef.name().to_string(), output.clone()));
            }
        }
        errors
    }

    /// Finds groups of parts which feed each other, including a part reading its own output.
    fn check_part_cycles(&self, chipdef: &ChipDef, drivers: &BTreeMap<&str, usize>) -> Vec<HdlError> {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..chipdef.parts().len()).map(|index| graph.add_node(index)).collect();

        for (reader, part) in chipdef.parts().iter().enumerate() {
            let interface = match self.lookup(part.chip_name()) {
                Ok(chip) => chip.interface(),
                Err(_error) => continue,
            };
            for connection in part.connections() {
                if !interface.has_input(connection.formal()) {
                    continue;
                }
                if let Some(driver) = drivers.get(connection.local()) {
                    graph.update_edge(nodes[*driver], nodes[reader], ());
                }
            }
        }

        let mut errors = vec![];
        for scc in kosaraju_scc(&graph) {
            let is_cycle = scc.len() > 1 || graph.contains_edge(scc[0], scc[0]);
            if is_cycle {
                let mut indexes: Vec<usize> = scc.iter().map(|node| graph[*node]).collect();
                indexes.sort();
                let members = indexes
                    .into_iter()
                    .map(|index| format!("#{index} {}", chipdef.parts()[index].chip_name()))
                    .collect();
                errors.push(HdlError::CombinationalCycle(chipdef.loc(), chipdef.name().to_string(), members));
            }
        }
        errors
    }

    /// A chip which (transitively) contains itself would never finish evaluating.
    fn check_instantiation_cycles(&self, name: &str, chipdef: &ChipDef) -> Vec<HdlError> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut nodes: BTreeMap<&str, NodeIndex> = BTreeMap::new();
        let start = graph.add_node(name);
        nodes.insert(name, start);

        let mut stack: Vec<(&str, Vec<&str>)> = vec![(name, chipdef.parts().iter().map(|part| part.chip_name()).collect())];
        while let Some((current, dependencies)) = stack.pop() {
            let from = nodes[current];
            for dependency in dependencies {
                let to = match nodes.get(dependency) {
                    Some(node) => *node,
                    None => {
                        let node = graph.add_node(dependency);
                        nodes.insert(dependency, node);
                        if let Some(Entry { chip: Chip::Composite(subdef), .. }) = self.entries.get(dependency) {
                            stack.push((dependency, subdef.parts().iter().map(|part| part.chip_name()).collect()));
                        }
                        node
                    },
                };
                graph.update_edge(from, to, ());
            }
        }

        let mut errors = vec![];
        for scc in kosaraju_scc(&graph) {
            let is_cycle = scc.len() > 1 || graph.contains_edge(scc[0], scc[0]);
            if is_cycle && scc.contains(&start) {
                let mut members: Vec<String> = scc.iter().map(|node| graph[*node].to_string()).collect();
                members.sort();
                errors.push(HdlError::CombinationalCycle(chipdef.loc(), name.to_string(), members));
            }
        }
        errors
    }
}

/// Reports pins declared twice, and pins declared as both input and output.
pub(crate) fn duplicate_pins(chipdef: &ChipDef) -> Vec<HdlError> {
    let mut errors = vec![];
    let mut seen = BTreeSet::new();
    for pin in chipdef.inputs().iter().chain(chipdef.outputs()) {
        if !seen.insert(pin.as_str()) {
            errors.push(HdlError::DuplicatePin(chipdef.loc(), chipdef.name().to_string(), pin.clone()));
        }
    }
    errors
}

fn is_repeat_of(part: &Part, other: &Part) -> bool {
    part.chip_name() == other.chip_name() && part.connections() == other.connections()
}
