//! Parsing of the `vary` column.
//!
//! A `vary` cell is `y` (free), `n` (fixed) or a `<submodel>,<arg>` reference
//! tying the parameter to another one.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, value},
    sequence::{delimited, separated_pair},
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ParameterKey;

/// How a parameter behaves during the fit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaryRule {
    /// The solver adjusts the value.
    Free,
    /// The guess is held constant.
    Fixed,
    /// The value follows another parameter.
    Link(ParameterKey),
}

impl VaryRule {
    /// Parse a `vary` cell; `None` when the text is not a valid rule.
    ///
    /// ```
    /// use sheetfit::parameters::{ParameterKey, VaryRule};
    ///
    /// assert_eq!(VaryRule::parse("y"), Some(VaryRule::Free));
    /// assert_eq!(
    ///     VaryRule::parse("fwhmGauss#1, c"),
    ///     Some(VaryRule::Link(ParameterKey::new("fwhmGauss#1", "c")))
    /// );
    /// assert_eq!(VaryRule::parse("maybe"), None);
    /// ```
    pub fn parse(input: &str) -> Option<Self> {
        match vary_rule(input) {
            Ok((_, rule)) => Some(rule),
            Err(_) => None,
        }
    }
}

impl fmt::Display for VaryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaryRule::Free => write!(f, "y"),
            VaryRule::Fixed => write!(f, "n"),
            VaryRule::Link(key) => write!(f, "{}", key),
        }
    }
}

fn flag(input: &str) -> IResult<&str, VaryRule> {
    delimited(
        multispace0,
        alt((
            value(VaryRule::Free, tag("y")),
            value(VaryRule::Fixed, tag("n")),
        )),
        multispace0,
    )
    .parse(input)
}

fn token(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != ',' && !c.is_whitespace()).parse(input)
}

fn link(input: &str) -> IResult<&str, VaryRule> {
    map(
        delimited(
            multispace0,
            separated_pair(token, delimited(multispace0, char(','), multispace0), token),
            multispace0,
        ),
        |(submodel, arg)| VaryRule::Link(ParameterKey::new(submodel, arg)),
    )
    .parse(input)
}

fn vary_rule(input: &str) -> IResult<&str, VaryRule> {
    alt((all_consuming(flag), all_consuming(link))).parse(input)
}
