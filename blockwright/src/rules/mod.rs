//! Placement rule language
//!
//! A placement rule states what a component requires of its neighbors,
//! e.g. `"one bearing"`, `"exactly two different magnets"` or
//! `"one yoke && one cavity || one magnet"`. The same AST is evaluated
//! against concrete neighbors ([`PlacementRule::is_satisfied`]) and
//! compiled into solver constraints ([`PlacementRule::compile`]); the two
//! must agree for every assignment.

mod compile;
mod evaluate;
mod parser;

pub use compile::NeighborVar;
pub use evaluate::Neighbor;
pub use parser::parse_rule;

use crate::error::DesignError;
use crate::DesignResult;
use serde::Serialize;
use std::fmt;

/// Location in a rule string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn from_pest_span(span: pest::Span) -> Self {
        let (line, col) = span.start_pos().line_col();
        Self {
            start: span.start(),
            end: span.end(),
            line,
            col,
        }
    }
}

const QUANTITY_WORDS: [&str; 7] = ["zero", "one", "two", "three", "four", "five", "six"];

/// Largest quantity a rule can require: one per face of a cube
pub const MAX_AMOUNT: u8 = 6;

/// How the number of matching neighbors is compared with the amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountType {
    AtLeast,
    Exactly,
    AtMost,
}

impl CountType {
    pub fn compare(self, count: usize, amount: usize) -> bool {
        match self {
            CountType::AtLeast => count >= amount,
            CountType::Exactly => count == amount,
            CountType::AtMost => count <= amount,
        }
    }
}

/// Which neighbors are counted and which geometric pattern they must form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjacency {
    /// Every matching neighbor counts
    #[default]
    Standard,
    /// Count opposite pairs where both sides match, against `amount / 2`
    Axial,
    /// Three matches on three different axes, meeting at a corner
    Vertex,
    /// Two matches on two different axes, sharing an edge
    Edge,
}

/// Leaf rule matching neighbors by name and type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MatchRule {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "quantity")]
    pub amount: u8,
    pub count: CountType,
    pub adjacency: Adjacency,
    /// Additionally require one opposite pair of matches
    pub axial: bool,
    /// Additionally require `C(amount, 2)` pairs of matches with different names
    pub different: bool,
}

impl MatchRule {
    /// An `AtLeast`, standard-adjacency rule
    pub fn new(type_name: impl Into<String>, amount: u8) -> Self {
        Self {
            type_name: type_name.into(),
            name: None,
            amount,
            count: CountType::AtLeast,
            adjacency: Adjacency::Standard,
            axial: false,
            different: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_count(mut self, count: CountType) -> Self {
        self.count = count;
        self
    }

    pub fn with_adjacency(mut self, adjacency: Adjacency) -> Self {
        self.adjacency = adjacency;
        self
    }

    pub fn axial(mut self) -> Self {
        self.axial = true;
        self
    }

    pub fn different(mut self) -> Self {
        self.different = true;
        self
    }

    /// Name a match must carry; `different` rules match on type alone
    pub fn required_name(&self) -> Option<&str> {
        if self.different {
            None
        } else {
            self.name.as_deref()
        }
    }

    /// Check the invariants tying amount, comparison and adjacency together
    pub fn validate(&self) -> DesignResult<()> {
        let fail = |reason: &str| Err(DesignError::invalid_rule(format!("'{}': {}", self, reason)));
        if self.amount > MAX_AMOUNT {
            return fail("quantity cannot exceed six");
        }
        if self.amount == 0 && self.count != CountType::Exactly {
            return fail("quantity zero is only allowed with 'exactly'");
        }
        if self.axial && self.adjacency != Adjacency::Standard {
            return fail("'axial' cannot be combined with another adjacency");
        }
        match self.adjacency {
            Adjacency::Standard => Ok(()),
            Adjacency::Axial if self.amount % 2 != 0 => fail("opposing quantity must be even"),
            Adjacency::Axial => Ok(()),
            Adjacency::Vertex if self.amount != 3 => fail("vertex quantity must be three"),
            Adjacency::Edge if self.amount != 2 => fail("edge quantity must be two"),
            Adjacency::Vertex | Adjacency::Edge if self.count == CountType::AtMost => {
                fail("vertex and edge rules cannot use 'at most'")
            }
            Adjacency::Vertex | Adjacency::Edge => Ok(()),
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.count {
            CountType::AtLeast => {}
            CountType::Exactly => write!(f, "exactly ")?,
            CountType::AtMost => write!(f, "at most ")?,
        }
        match QUANTITY_WORDS.get(self.amount as usize) {
            Some(word) => write!(f, "{}", word)?,
            None => write!(f, "{}", self.amount)?,
        }
        if self.axial {
            write!(f, " axial")?;
        }
        match self.adjacency {
            Adjacency::Standard => {}
            Adjacency::Axial => write!(f, " opposing")?,
            Adjacency::Vertex => write!(f, " vertex")?,
            Adjacency::Edge => write!(f, " edge")?,
        }
        if self.different {
            write!(f, " different")?;
        }
        if let Some(name) = &self.name {
            write!(f, " {}", name)?;
        }
        if is_plural(self.amount, &self.type_name) {
            write!(f, " {}s", self.type_name)
        } else {
            write!(f, " {}", self.type_name)
        }
    }
}

fn is_plural(amount: u8, type_name: &str) -> bool {
    amount != 1 && type_name != "glass"
}

/// Strip the plural "s" of a type token
pub(crate) fn singularize(amount: u8, type_name: &str) -> &str {
    if is_plural(amount, type_name) {
        type_name.strip_suffix('s').unwrap_or(type_name)
    } else {
        type_name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Logic {
    And,
    Or,
}

/// Parsed placement rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PlacementRule {
    /// No requirement; always satisfied
    Empty,
    Match(MatchRule),
    Compound {
        #[serde(rename = "mode")]
        logic: Logic,
        rules: Vec<PlacementRule>,
    },
}

impl PlacementRule {
    pub fn and(rules: Vec<PlacementRule>) -> Self {
        Self::Compound {
            logic: Logic::And,
            rules,
        }
    }

    pub fn or(rules: Vec<PlacementRule>) -> Self {
        Self::Compound {
            logic: Logic::Or,
            rules,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PlacementRule::Empty)
    }

    /// Validate every leaf
    pub fn validate(&self) -> DesignResult<()> {
        match self {
            PlacementRule::Empty => Ok(()),
            PlacementRule::Match(rule) => rule.validate(),
            PlacementRule::Compound { rules, .. } => {
                if rules.is_empty() {
                    return Err(DesignError::invalid_rule("compound rule without sub-rules"));
                }
                rules.iter().try_for_each(PlacementRule::validate)
            }
        }
    }
}

impl From<MatchRule> for PlacementRule {
    fn from(rule: MatchRule) -> Self {
        PlacementRule::Match(rule)
    }
}

impl fmt::Display for PlacementRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementRule::Empty => Ok(()),
            PlacementRule::Match(rule) => write!(f, "{}", rule),
            PlacementRule::Compound { logic, rules } => {
                let separator = match logic {
                    Logic::And => " && ",
                    Logic::Or => " || ",
                };
                for (i, rule) in rules.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", separator)?;
                    }
                    // An `||` directly under `&&` needs no parentheses
                    let bare = match rule {
                        PlacementRule::Compound { logic: inner, .. } => {
                            *logic == Logic::And && *inner == Logic::Or
                        }
                        _ => true,
                    };
                    if bare {
                        write!(f, "{}", rule)?;
                    } else {
                        write!(f, "({})", rule)?;
                    }
                }
                Ok(())
            }
        }
    }
}
