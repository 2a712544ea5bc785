use super::*;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::*;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

/// Loads a chip file together with the chip files it depends on.
///
/// A part naming a chip that is neither built in nor defined in the same file
/// is looked up as `<Name>.hdl`, first next to the file that needs it and then
/// in each search directory, in order.
#[derive(Debug, Clone, Default)]
pub struct Library {
    search_dirs: Vec<PathBuf>,
}

impl Library {
    pub fn new(search_dirs: Vec<PathBuf>) -> Library {
        Library { search_dirs }
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Builds a registry holding the chips of `path` and everything they use.
    /// Returns it with the name of the first chip in the file.
    ///
    /// Built-in gates which the file defines itself are left out of the registry,
    /// so that, eg, a user's own `And.hdl` can be loaded and tested.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<(Registry, Name), Vec<HdlError>> {
        let path = path.as_ref();
        info!("Loading {}", path.display());
        let top_chips = load_chips_from_file(path)?;
        let top_name = top_chips[0].name().to_string();

        let builtins: Vec<Builtin> = Builtin::all()
            .into_iter()
            .filter(|builtin| {
                let shadowed = top_chips.iter().any(|chip| chip.name() == builtin.name());
                if shadowed {
                    info!("{} defines its own {builtin}", path.display());
                }
                !shadowed
            })
            .collect();
        let mut registry = Registry::with_builtins(&builtins);

        let mut loaded: BTreeMap<Name, ChipDef> = BTreeMap::new();
        let mut queue: Vec<(Name, PathBuf)> = vec![];
        let top_dir = parent_dir(path);
        for chip in top_chips {
            for dependency in chip.depends_on() {
                queue.push((dependency, top_dir.clone()));
            }
            loaded.insert(chip.name().to_string(), chip);
        }

        let mut errors = vec![];
        while let Some((name, from_dir)) = queue.pop() {
            if loaded.contains_key(&name) || registry.contains(&name) {
                continue;
            }

            let file = match self.find(&name, &from_dir) {
                Some(file) => file,
                None => {
                    // Left for the registry to report as an unknown chip.
                    warn!("No file found for chip {name}");
                    continue;
                },
            };

            info!("Loading {name} from {}", file.display());
            let chips = match load_chips_from_file(&file) {
                Ok(chips) => chips,
                Err(file_errors) => {
                    errors.extend(file_errors);
                    continue;
                },
            };

            let file_dir = parent_dir(&file);
            for chip in chips {
                if loaded.contains_key(chip.name()) {
                    errors.push(HdlError::DuplicateChip(chip.loc(), chip.name().to_string()));
                    continue;
                }
                for dependency in chip.depends_on() {
                    queue.push((dependency, file_dir.clone()));
                }
                loaded.insert(chip.name().to_string(), chip);
            }

            if !loaded.contains_key(&name) {
                warn!("{} does not define chip {name}", file.display());
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        for chip in in_dependency_order(loaded)? {
            let name = chip.name().to_string();
            if let Err(error) = registry.register(&name, chip) {
                errors.push(error);
            }
        }

        if errors.is_empty() {
            Ok((registry, top_name))
        } else {
            Err(errors)
        }
    }

    fn find(&self, name: &str, from_dir: &Path) -> Option<PathBuf> {
        let filename = format!("{name}.hdl");
        std::iter::once(from_dir)
            .chain(self.search_dirs.iter().map(|dir| dir.as_path()))
            .map(|dir| dir.join(&filename))
            .find(|candidate| candidate.is_file())
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_owned(),
        _ => PathBuf::from("."),
    }
}

/// Orders chips so each comes after the chips its parts instantiate.
fn in_dependency_order(mut chips: BTreeMap<Name, ChipDef>) -> Result<Vec<ChipDef>, Vec<HdlError>> {
    let mut graph: DiGraph<Name, ()> = DiGraph::new();
    let mut nodes: BTreeMap<Name, NodeIndex> = BTreeMap::new();
    for name in chips.keys() {
        nodes.insert(name.clone(), graph.add_node(name.clone()));
    }

    for (name, chip) in &chips {
        for dependency in chip.depends_on() {
            if let Some(dependency_node) = nodes.get(&dependency) {
                graph.update_edge(*dependency_node, nodes[name], ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order
            .into_iter()
            .filter_map(|node| chips.remove(&graph[node]))
            .collect()),
        Err(cycle) => {
            let name = graph[cycle.node_id()].clone();
            let loc = chips.get(&name).map(|chip| chip.loc()).unwrap_or_else(Loc::unknown);
            Err(vec![HdlError::CombinationalCycle(loc, name.clone(), vec![name])])
        },
    }
}
