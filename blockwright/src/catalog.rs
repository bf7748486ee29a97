//! Ordered component catalogs
//!
//! A catalog's index space is the domain of every per-cell decision
//! variable, so indices stay stable for the lifetime of a design run.

use crate::component::Component;
use crate::error::DesignError;
use crate::rules::{parse_rule, PlacementRule};
use crate::DesignResult;
use std::collections::HashSet;

const TURBINE_DYNAMO_JSON: &str = include_str!("../catalogs/turbine_dynamo.json");
const ACCELERATOR_JSON: &str = include_str!("../catalogs/accelerator.json");
const NUCLEOSYNTHESIS_JSON: &str = include_str!("../catalogs/nucleosynthesis.json");
const TURBINE_ROTOR_JSON: &str = include_str!("../catalogs/turbine_rotor.json");

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    components: Vec<Component>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate `(name, type)` identities
    pub fn new(components: Vec<Component>) -> DesignResult<Self> {
        if components.is_empty() {
            return Err(DesignError::catalog("a catalog needs at least one component"));
        }
        let mut seen = HashSet::new();
        for component in &components {
            if !seen.insert((component.name.as_str(), component.type_name())) {
                return Err(DesignError::catalog(format!(
                    "duplicate component '{}'",
                    component.full_name()
                )));
            }
        }
        Ok(Self { components })
    }

    /// Decode a JSON array of components
    pub fn from_json(text: &str) -> DesignResult<Self> {
        let components: Vec<Component> = serde_json::from_str(text)
            .map_err(|e| DesignError::catalog(format!("invalid catalog JSON: {}", e)))?;
        Self::new(components)
    }

    pub fn to_json(&self) -> DesignResult<String> {
        serde_json::to_string_pretty(&self.components)
            .map_err(|e| DesignError::catalog(format!("cannot encode catalog: {}", e)))
    }

    /// Air, casing, bearing and the six overhauled dynamo coils
    pub fn turbine_dynamo() -> DesignResult<Self> {
        Self::from_json(TURBINE_DYNAMO_JSON)
    }

    /// Air, casing, yoke, beam pipe, cavities, magnets and coolers
    pub fn accelerator() -> DesignResult<Self> {
        Self::from_json(ACCELERATOR_JSON)
    }

    /// Chamber parts and the eight nucleosynthesis heaters
    pub fn nucleosynthesis() -> DesignResult<Self> {
        Self::from_json(NUCLEOSYNTHESIS_JSON)
    }

    /// The four rotor blades and the stator
    pub fn turbine_rotor() -> DesignResult<Self> {
        Self::from_json(TURBINE_ROTOR_JSON)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Indices of the components accepted by `pred`
    pub fn ids_where(&self, mut pred: impl FnMut(&Component) -> bool) -> Vec<i64> {
        self.components
            .iter()
            .enumerate()
            .filter(|(_, c)| pred(c))
            .map(|(i, _)| i as i64)
            .collect()
    }

    pub fn ids_of_type(&self, type_name: &str) -> Vec<i64> {
        self.ids_where(|c| c.is_type(type_name))
    }

    /// Like [`Catalog::ids_of_type`] but fails when the type is absent
    pub fn require_type(&self, type_name: &str) -> DesignResult<Vec<i64>> {
        let ids = self.ids_of_type(type_name);
        if ids.is_empty() {
            return Err(DesignError::catalog(format!(
                "catalog has no component of type '{}'",
                type_name
            )));
        }
        Ok(ids)
    }

    /// Index of the component whose full name is `full_name`
    pub fn find(&self, full_name: &str) -> DesignResult<usize> {
        self.components
            .iter()
            .position(|c| c.full_name() == full_name)
            .ok_or_else(|| DesignError::UnknownComponent(full_name.to_string()))
    }

    /// Per-index lookup table of one integer attribute
    pub fn attribute_table(&self, f: impl Fn(&Component) -> i64) -> Vec<i64> {
        self.components.iter().map(f).collect()
    }

    /// Parse every placement rule, in catalog order
    pub fn parse_rules(&self) -> DesignResult<Vec<PlacementRule>> {
        self.components
            .iter()
            .map(|c| parse_rule(&c.placement_rule))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}
