//! Evaluation of placement rules against concrete neighbors

use crate::component::Component;
use crate::error::DesignError;
use crate::rules::{Adjacency, Logic, MatchRule, PlacementRule};
use crate::DesignResult;

/// A concrete neighbor; inactive neighbors never match
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    pub component: &'a Component,
    pub active: bool,
}

impl<'a> Neighbor<'a> {
    pub fn new(component: &'a Component) -> Self {
        Self {
            component,
            active: true,
        }
    }

    pub fn inactive(component: &'a Component) -> Self {
        Self {
            component,
            active: false,
        }
    }
}

/// Corner triples of a 6-neighborhood, one neighbor per axis
pub(crate) fn vertex_triples() -> Vec<[usize; 3]> {
    let mut triples = Vec::with_capacity(8);
    for a in 0..2 {
        for b in 2..4 {
            for c in 4..6 {
                triples.push([a, b, c]);
            }
        }
    }
    triples
}

/// Pairs of neighbors on different axes, sharing an edge
pub(crate) fn edge_pairs(len: usize) -> Vec<[usize; 2]> {
    let axes = len / 2;
    let mut pairs = Vec::new();
    for i in 0..axes {
        for j in i + 1..axes {
            for a in 2 * i..2 * i + 2 {
                for b in 2 * j..2 * j + 2 {
                    pairs.push([a, b]);
                }
            }
        }
    }
    pairs
}

/// Reject neighbor lists the adjacency cannot be evaluated on
pub(crate) fn check_neighbor_count(rule: &MatchRule, len: usize) -> DesignResult<()> {
    if len % 2 != 0 {
        return Err(DesignError::invalid_rule(format!(
            "'{}' needs one neighbor per direction, got {} neighbors",
            rule, len
        )));
    }
    match rule.adjacency {
        Adjacency::Vertex if len != 6 => Err(DesignError::invalid_rule(format!(
            "vertex rule '{}' needs a three-axis neighborhood, got {} neighbors",
            rule, len
        ))),
        Adjacency::Edge if len != 4 && len != 6 => Err(DesignError::invalid_rule(format!(
            "edge rule '{}' needs a two- or three-axis neighborhood, got {} neighbors",
            rule, len
        ))),
        _ => Ok(()),
    }
}

impl MatchRule {
    fn matches(&self, neighbor: &Neighbor) -> bool {
        neighbor.active
            && neighbor.component.is_type(&self.type_name)
            && self
                .required_name()
                .map_or(true, |name| name == neighbor.component.name)
    }

    pub fn is_satisfied(&self, neighbors: &[Neighbor]) -> DesignResult<bool> {
        self.validate()?;
        check_neighbor_count(self, neighbors.len())?;
        let matched: Vec<bool> = neighbors.iter().map(|n| self.matches(n)).collect();
        let count = matched.iter().filter(|&&m| m).count();
        let amount = self.amount as usize;
        let opposite_pairs = (0..matched.len() / 2)
            .filter(|&i| matched[2 * i] && matched[2 * i + 1])
            .count();

        let mut satisfied = match self.adjacency {
            Adjacency::Standard => self.count.compare(count, amount),
            Adjacency::Axial => self.count.compare(opposite_pairs, amount / 2),
            Adjacency::Vertex => {
                vertex_triples()
                    .iter()
                    .any(|t| t.iter().all(|&i| matched[i]))
                    && self.count.compare(count, amount)
            }
            Adjacency::Edge => {
                edge_pairs(matched.len())
                    .iter()
                    .any(|p| matched[p[0]] && matched[p[1]])
                    && self.count.compare(count, amount)
            }
        };
        if self.axial {
            satisfied = satisfied && opposite_pairs > 0;
        }
        if self.different {
            let mut distinct = 0;
            for i in 0..neighbors.len() {
                for j in i + 1..neighbors.len() {
                    if matched[i]
                        && matched[j]
                        && neighbors[i].component.name != neighbors[j].component.name
                    {
                        distinct += 1;
                    }
                }
            }
            satisfied = satisfied && distinct >= amount * amount.saturating_sub(1) / 2;
        }
        Ok(satisfied)
    }
}

impl PlacementRule {
    /// Whether the rule holds for a cell with the given neighbors
    ///
    /// Neighbors come in opposite pairs: indices `2k` and `2k + 1` lie on
    /// either side of the cell along axis `k`.
    pub fn is_satisfied(&self, neighbors: &[Neighbor]) -> DesignResult<bool> {
        match self {
            PlacementRule::Empty => Ok(true),
            PlacementRule::Match(rule) => rule.is_satisfied(neighbors),
            PlacementRule::Compound { logic, rules } => {
                let mut results = Vec::with_capacity(rules.len());
                for rule in rules {
                    results.push(rule.is_satisfied(neighbors)?);
                }
                Ok(match logic {
                    Logic::And => results.iter().all(|&r| r),
                    Logic::Or => results.iter().any(|&r| r),
                })
            }
        }
    }
}
