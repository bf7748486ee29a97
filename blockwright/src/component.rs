//! Components that can occupy a grid cell

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default beam pipe attenuation per block
pub const DEFAULT_ATTENUATION: f64 = 0.02;

fn default_attenuation() -> f64 {
    DEFAULT_ATTENUATION
}

/// Kind of a component together with its physical attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentKind {
    Air,
    Casing,
    Bearing,
    Coil {
        conductivity: f64,
    },
    Beam {
        #[serde(default = "default_attenuation")]
        attenuation: f64,
        #[serde(default)]
        heat: i64,
        #[serde(default)]
        power: i64,
    },
    Yoke,
    Cavity {
        voltage: i64,
        efficiency: f64,
        heat: i64,
        power: i64,
    },
    Magnet {
        strength: f64,
        efficiency: f64,
        heat: i64,
        power: i64,
    },
    Cooler {
        cooling: i64,
    },
    /// Plasma glass of a nucleosynthesis chamber
    Glass {
        heat: i64,
        power: i64,
    },
    Nozzle {
        heat: i64,
        power: i64,
    },
    /// Nucleosynthesis heater, absorbing `cooling` heat per tick
    Heater {
        cooling: i64,
    },
    Blade {
        efficiency: f64,
        expansion: f64,
    },
    Stator {
        expansion: f64,
    },
}

impl ComponentKind {
    /// Type name used by placement rules and catalog lookups
    pub fn type_name(&self) -> &'static str {
        match self {
            ComponentKind::Air => "air",
            ComponentKind::Casing => "casing",
            ComponentKind::Bearing => "bearing",
            ComponentKind::Coil { .. } => "coil",
            ComponentKind::Beam { .. } => "beam",
            ComponentKind::Yoke => "yoke",
            ComponentKind::Cavity { .. } => "cavity",
            ComponentKind::Magnet { .. } => "magnet",
            ComponentKind::Cooler { .. } => "cooler",
            ComponentKind::Glass { .. } => "glass",
            ComponentKind::Nozzle { .. } => "nozzle",
            ComponentKind::Heater { .. } => "heater",
            ComponentKind::Blade { .. } => "blade",
            ComponentKind::Stator { .. } => "stator",
        }
    }
}

/// A named, typed entity with an optional rule constraining its own neighbors
///
/// Identity is the `(name, type)` pair; unnamed components such as air or
/// casing use an empty name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub kind: ComponentKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub placement_rule: String,
}

impl Component {
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            placement_rule: String::new(),
        }
    }

    pub fn unnamed(kind: ComponentKind) -> Self {
        Self::new("", kind)
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.placement_rule = rule.into();
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// `"<name> <type>"`, or just the type for unnamed components
    pub fn full_name(&self) -> String {
        if self.name.is_empty() {
            self.type_name().to_string()
        } else {
            format!("{} {}", self.name, self.type_name())
        }
    }

    pub fn is_type(&self, type_name: &str) -> bool {
        self.type_name() == type_name
    }

    pub fn heat(&self) -> i64 {
        match self.kind {
            ComponentKind::Cavity { heat, .. }
            | ComponentKind::Magnet { heat, .. }
            | ComponentKind::Beam { heat, .. }
            | ComponentKind::Glass { heat, .. }
            | ComponentKind::Nozzle { heat, .. } => heat,
            _ => 0,
        }
    }

    pub fn power(&self) -> i64 {
        match self.kind {
            ComponentKind::Cavity { power, .. }
            | ComponentKind::Magnet { power, .. }
            | ComponentKind::Beam { power, .. }
            | ComponentKind::Glass { power, .. }
            | ComponentKind::Nozzle { power, .. } => power,
            _ => 0,
        }
    }

    pub fn efficiency(&self) -> f64 {
        match self.kind {
            ComponentKind::Cavity { efficiency, .. }
            | ComponentKind::Magnet { efficiency, .. }
            | ComponentKind::Blade { efficiency, .. } => efficiency,
            _ => 0.0,
        }
    }

    /// Steam expansion of a rotor part; any other component leaves it unchanged
    pub fn expansion(&self) -> f64 {
        match self.kind {
            ComponentKind::Blade { expansion, .. } | ComponentKind::Stator { expansion } => {
                expansion
            }
            _ => 1.0,
        }
    }

    pub fn voltage(&self) -> i64 {
        match self.kind {
            ComponentKind::Cavity { voltage, .. } => voltage,
            _ => 0,
        }
    }

    pub fn strength(&self) -> f64 {
        match self.kind {
            ComponentKind::Magnet { strength, .. } => strength,
            _ => 0.0,
        }
    }

    pub fn cooling(&self) -> i64 {
        match self.kind {
            ComponentKind::Cooler { cooling } | ComponentKind::Heater { cooling } => cooling,
            _ => 0,
        }
    }

    pub fn conductivity(&self) -> f64 {
        match self.kind {
            ComponentKind::Coil { conductivity } => conductivity,
            _ => 0.0,
        }
    }

    pub fn attenuation(&self) -> f64 {
        match self.kind {
            ComponentKind::Beam { attenuation, .. } => attenuation,
            _ => 0.0,
        }
    }

    /// Cavities and magnets draw power and count as accelerator parts
    pub fn is_powered(&self) -> bool {
        matches!(
            self.kind,
            ComponentKind::Cavity { .. } | ComponentKind::Magnet { .. }
        )
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}
