// ============================================================
// Layer 3 — Particle Species
// ============================================================
// The four beam particles simulated in the calorimeter.
// Their order here defines the class index the network
// learns to predict, so it must never change.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    Positron,
    Electron,
    PiPlus,
    PiMinus,
}

impl ParticleKind {
    /// All species in class-index order.
    pub const ALL: [ParticleKind; 4] = [
        ParticleKind::Positron,
        ParticleKind::Electron,
        ParticleKind::PiPlus,
        ParticleKind::PiMinus,
    ];

    /// Short symbol used in dataset file names and plots.
    pub fn symbol(self) -> &'static str {
        match self {
            ParticleKind::Positron => "e+",
            ParticleKind::Electron => "e-",
            ParticleKind::PiPlus   => "pi+",
            ParticleKind::PiMinus  => "pi-",
        }
    }

    pub fn class_index(self) -> usize {
        match self {
            ParticleKind::Positron => 0,
            ParticleKind::Electron => 1,
            ParticleKind::PiPlus   => 2,
            ParticleKind::PiMinus  => 3,
        }
    }

    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// File stem and HDF5 group name of a shower dataset,
    /// e.g. `e+_E1-100_2000`.
    pub fn dataset_stem(self, energy_tag: &str, events: usize) -> String {
        format!("{}_{}_{}", self.symbol(), energy_tag, events)
    }
}

impl fmt::Display for ParticleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_indices_follow_all_order() {
        for (i, p) in ParticleKind::ALL.iter().enumerate() {
            assert_eq!(p.class_index(), i);
            assert_eq!(ParticleKind::from_class_index(i), Some(*p));
        }
        assert_eq!(ParticleKind::from_class_index(4), None);
    }

    #[test]
    fn test_dataset_stem() {
        assert_eq!(
            ParticleKind::PiMinus.dataset_stem("E1-100", 2000),
            "pi-_E1-100_2000"
        );
        assert_eq!(ParticleKind::Positron.to_string(), "e+");
    }
}
