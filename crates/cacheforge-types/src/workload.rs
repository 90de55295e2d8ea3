//! Workload types.
//!
//! A workload is a fixed evaluation scenario: a label, a free-text
//! description used in prompts, and the trace the harness replays.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Reserved workload label for the synthetic per-candidate aggregate trial.
pub const AGGREGATE_WORKLOAD: &str = "all";

/// A single evaluation scenario known to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    /// Short label stored in the `workload` column (e.g. "astar").
    pub name: String,
    /// Free-text characterization embedded in generation prompts.
    #[serde(default)]
    pub description: String,
    /// Trace file handed to the harness via `-traces`.
    pub trace: PathBuf,
}

impl Workload {
    pub fn new(name: impl Into<String>, description: impl Into<String>, trace: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            trace: trace.into(),
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.trace.display())
    }
}

/// The five CRC2 workloads the search evaluates against, in evaluation order.
pub fn default_workloads() -> Vec<Workload> {
    vec![
        Workload::new(
            "astar",
            "Path-finding over large graphs; irregular pointer chasing with moderate temporal reuse and frequent branch-dependent accesses.",
            "ChampSim_CRC2/traces/astar_313B.trace.gz",
        ),
        Workload::new(
            "lbm",
            "Lattice-Boltzmann fluid simulation; long streaming sweeps over large arrays with little reuse inside the LLC.",
            "ChampSim_CRC2/traces/lbm_564B.trace.gz",
        ),
        Workload::new(
            "mcf",
            "Network-simplex vehicle scheduling; memory-bound pointer chasing over a working set far larger than the LLC.",
            "ChampSim_CRC2/traces/mcf_250B.trace.gz",
        ),
        Workload::new(
            "milc",
            "Lattice QCD; strided accesses over large 4-D grids with phase changes between compute kernels.",
            "ChampSim_CRC2/traces/milc_409B.trace.gz",
        ),
        Workload::new(
            "omnetpp",
            "Discrete-event network simulation; heap-heavy with scattered object accesses and a mix of hot and cold lines.",
            "ChampSim_CRC2/traces/omnetpp_17B.trace.gz",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_workloads_order() {
        let names: Vec<String> = default_workloads().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["astar", "lbm", "mcf", "milc", "omnetpp"]);
    }

    #[test]
    fn test_default_workloads_never_use_reserved_label() {
        assert!(default_workloads().iter().all(|w| w.name != AGGREGATE_WORKLOAD));
    }

    #[test]
    fn test_workload_display() {
        let w = Workload::new("mcf", "pointer chasing", "traces/mcf.gz");
        assert_eq!(w.to_string(), "mcf (traces/mcf.gz)");
    }
}
