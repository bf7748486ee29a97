use crate::error::DesignError;
use crate::rules::{singularize, CountType, Logic, MatchRule, PlacementRule, Span};
use crate::DesignResult;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "src/rules/placement.pest"]
struct RuleParser;

/// Parse a placement rule string
///
/// An empty or blank string is [`PlacementRule::Empty`]. Text that does not
/// match the grammar is a [`DesignError::RuleSyntax`]; well-formed rules
/// that break an adjacency invariant are a [`DesignError::InvalidRule`].
pub fn parse_rule(text: &str) -> DesignResult<PlacementRule> {
    let pairs = RuleParser::parse(Rule::placement_rule, text).map_err(|e| {
        let (start, end) = match e.location {
            pest::error::InputLocation::Pos(p) => (p, p),
            pest::error::InputLocation::Span((s, e)) => (s, e),
        };
        let (line, col) = match e.line_col {
            pest::error::LineColLocation::Pos(pos) => pos,
            pest::error::LineColLocation::Span(pos, _) => pos,
        };
        DesignError::rule_syntax(
            expected_message(&e.variant),
            Span {
                start,
                end,
                line,
                col,
            },
            text,
        )
    })?;

    let mut rule = PlacementRule::Empty;
    for pair in pairs.flatten() {
        if pair.as_rule() == Rule::conjunction {
            rule = parse_compound(pair, text)?;
            break;
        }
    }
    rule.validate()?;
    Ok(rule)
}

fn expected_message(variant: &pest::error::ErrorVariant<Rule>) -> String {
    match variant {
        pest::error::ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => {
            let expected: Vec<&str> = positives.iter().map(describe).collect();
            format!("expected {}", expected.join(" or "))
        }
        pest::error::ErrorVariant::ParsingError { .. } => "unexpected input".to_string(),
        pest::error::ErrorVariant::CustomError { message } => message.clone(),
    }
}

fn describe(rule: &Rule) -> &'static str {
    match rule {
        Rule::quantity => "a quantity word (zero to six)",
        Rule::type_name | Rule::name => "a component name or type",
        Rule::conjunction | Rule::disjunction | Rule::clause => "a rule",
        Rule::EOI => "end of rule",
        Rule::different => "'different'",
        Rule::axial | Rule::opposing | Rule::vertex | Rule::edge => "an adjacency keyword",
        Rule::exactly | Rule::at_most => "a comparison",
        _ => "valid rule text",
    }
}

/// Build a conjunction or disjunction, collapsing single-child nodes
fn parse_compound(pair: Pair<Rule>, text: &str) -> DesignResult<PlacementRule> {
    let logic = match pair.as_rule() {
        Rule::conjunction => Logic::And,
        _ => Logic::Or,
    };
    let mut rules = Vec::new();
    for inner in pair.into_inner() {
        let rule = match inner.as_rule() {
            Rule::conjunction | Rule::disjunction => parse_compound(inner, text)?,
            Rule::clause => PlacementRule::Match(parse_clause(inner, text)?),
            _ => continue,
        };
        rules.push(rule);
    }
    if rules.len() == 1 {
        if let Some(rule) = rules.pop() {
            return Ok(rule);
        }
    }
    Ok(PlacementRule::Compound { logic, rules })
}

fn parse_clause(pair: Pair<Rule>, text: &str) -> DesignResult<MatchRule> {
    let span = Span::from_pest_span(pair.as_span());
    let mut count = CountType::AtLeast;
    let mut amount = None;
    let mut rule = MatchRule::new("", 0);
    let mut raw_type = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::exactly => count = CountType::Exactly,
            Rule::at_most => count = CountType::AtMost,
            Rule::quantity => amount = Some(quantity_value(inner.as_str())),
            Rule::axial => rule.axial = true,
            Rule::opposing => rule.adjacency = super::Adjacency::Axial,
            Rule::vertex => rule.adjacency = super::Adjacency::Vertex,
            Rule::edge => rule.adjacency = super::Adjacency::Edge,
            Rule::different => rule.different = true,
            Rule::name => rule.name = Some(inner.as_str().to_string()),
            Rule::type_name => raw_type = Some(inner.as_str()),
            _ => {}
        }
    }
    let (Some(amount), Some(raw_type)) = (amount, raw_type) else {
        return Err(DesignError::rule_syntax(
            "incomplete rule clause",
            span,
            text,
        ));
    };
    rule.count = count;
    rule.amount = amount;
    rule.type_name = singularize(amount, raw_type).to_string();
    Ok(rule)
}

fn quantity_value(word: &str) -> u8 {
    super::QUANTITY_WORDS
        .iter()
        .position(|w| *w == word)
        .map_or(0, |p| p as u8)
}
