//! Lowering of placement rules into solver constraints
//!
//! Every rule becomes a boolean variable that is true exactly when the rule
//! holds for the neighbor variables it was compiled against.

use crate::catalog::Catalog;
use crate::rules::evaluate::{check_neighbor_count, edge_pairs, vertex_triples};
use crate::rules::{Adjacency, CountType, Logic, MatchRule, PlacementRule};
use crate::solver::{BoolVar, Cmp, IntVar, LinearExpr, Lit, Model};
use crate::DesignResult;
use std::collections::HashMap;

/// A neighbor cell variable and the literal telling whether it takes part
#[derive(Debug, Clone, Copy)]
pub struct NeighborVar {
    pub cell: IntVar,
    pub active: Lit,
}

impl NeighborVar {
    pub fn new(cell: IntVar, active: Lit) -> Self {
        Self { cell, active }
    }
}

fn comparison(count: CountType) -> Cmp {
    match count {
        CountType::AtLeast => Cmp::Ge,
        CountType::Exactly => Cmp::Eq,
        CountType::AtMost => Cmp::Le,
    }
}

fn combine(model: &mut Model, logic: Logic, lits: &[Lit], name: &str) -> BoolVar {
    match (lits, logic) {
        ([only], _) if !only.is_negated() => BoolVar(only.var()),
        (_, Logic::And) => model.reify_all(lits, name),
        (_, Logic::Or) => model.reify_any(lits, name),
    }
}

impl MatchRule {
    pub fn compile(
        &self,
        model: &mut Model,
        neighbors: &[NeighborVar],
        catalog: &Catalog,
    ) -> DesignResult<BoolVar> {
        self.validate()?;
        check_neighbor_count(self, neighbors.len())?;
        let ids = catalog.ids_where(|c| {
            c.is_type(&self.type_name) && self.required_name().map_or(true, |n| n == c.name)
        });

        let matched: Vec<Lit> = neighbors
            .iter()
            .map(|n| {
                let identity = model.reify_in(n.cell, &ids, format!("is_{}", self.type_name));
                model
                    .reify_all(&[identity.lit(), n.active], "neighbor_matches")
                    .lit()
            })
            .collect();
        let amount = self.amount as i64;
        let cmp = comparison(self.count);
        let pair = |model: &mut Model, i: usize, j: usize| {
            model
                .reify_all(&[matched[i], matched[j]], "pair_matches")
                .lit()
        };

        let mut parts = Vec::new();
        match self.adjacency {
            Adjacency::Standard => {
                let count = LinearExpr::sum(matched.iter().map(|l| BoolVar(l.var())));
                parts.push(model.reify(count, cmp, amount, "count_holds").lit());
            }
            Adjacency::Axial => {
                let pairs: Vec<Lit> = (0..matched.len() / 2)
                    .map(|i| pair(model, 2 * i, 2 * i + 1))
                    .collect();
                let count = LinearExpr::sum(pairs.iter().map(|l| BoolVar(l.var())));
                parts.push(model.reify(count, cmp, amount / 2, "pair_count_holds").lit());
            }
            Adjacency::Vertex | Adjacency::Edge => {
                let shapes: Vec<Vec<usize>> = match self.adjacency {
                    Adjacency::Vertex => vertex_triples().iter().map(|t| t.to_vec()).collect(),
                    _ => edge_pairs(matched.len()).iter().map(|p| p.to_vec()).collect(),
                };
                let corners: Vec<Lit> = shapes
                    .iter()
                    .map(|s| {
                        let lits: Vec<Lit> = s.iter().map(|&i| matched[i]).collect();
                        model.reify_all(&lits, "shape_matches").lit()
                    })
                    .collect();
                parts.push(model.reify_any(&corners, "any_shape_matches").lit());
                let count = LinearExpr::sum(matched.iter().map(|l| BoolVar(l.var())));
                parts.push(model.reify(count, cmp, amount, "count_holds").lit());
            }
        }

        if self.axial {
            let pairs: Vec<Lit> = (0..matched.len() / 2)
                .map(|i| pair(model, 2 * i, 2 * i + 1))
                .collect();
            parts.push(model.reify_any(&pairs, "any_opposite_pair").lit());
        }

        if self.different {
            let mut interned: HashMap<&str, i64> = HashMap::new();
            let name_ids: Vec<i64> = catalog
                .iter()
                .map(|c| {
                    let next = interned.len() as i64;
                    *interned.entry(c.name.as_str()).or_insert(next)
                })
                .collect();
            let names: Vec<IntVar> = neighbors
                .iter()
                .map(|n| {
                    let id = model.new_int_var(0, interned.len() as i64, "neighbor_name");
                    model.add_element(id, n.cell, name_ids.clone());
                    id
                })
                .collect();
            let mut distinct = Vec::new();
            for i in 0..neighbors.len() {
                for j in i + 1..neighbors.len() {
                    let differ = model.reify(names[i], Cmp::Ne, names[j], "names_differ");
                    distinct.push(
                        model
                            .reify_all(&[matched[i], matched[j], differ.lit()], "distinct_pair")
                            .lit(),
                    );
                }
            }
            let count = LinearExpr::sum(distinct.iter().map(|l| BoolVar(l.var())));
            let needed = amount * (amount - 1).max(0) / 2;
            parts.push(model.reify(count, Cmp::Ge, needed, "enough_distinct").lit());
        }

        Ok(combine(model, Logic::And, &parts, "rule_holds"))
    }
}

impl PlacementRule {
    /// Compile into a boolean equivalent to [`PlacementRule::is_satisfied`]
    pub fn compile(
        &self,
        model: &mut Model,
        neighbors: &[NeighborVar],
        catalog: &Catalog,
    ) -> DesignResult<BoolVar> {
        match self {
            PlacementRule::Empty => Ok(model.constant_bool(true)),
            PlacementRule::Match(rule) => rule.compile(model, neighbors, catalog),
            PlacementRule::Compound { logic, rules } => {
                let mut lits = Vec::with_capacity(rules.len());
                for rule in rules {
                    lits.push(rule.compile(model, neighbors, catalog)?.lit());
                }
                let name = match logic {
                    Logic::And => "all_rules_hold",
                    Logic::Or => "any_rule_holds",
                };
                Ok(combine(model, *logic, &lits, name))
            }
        }
    }
}
