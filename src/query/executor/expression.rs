// Expression Evaluation Module
//
// Constants, field references, equality terms and conjunctive predicates.

use std::cmp::Ordering;
use std::fmt;

use crate::query::executor::operators::Scan;
use crate::query::executor::result::QueryResult;
use crate::query::planner::plan::Plan;
use crate::record::Schema;

/// A field value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constant {
    Int(i32),
    Str(String),
}

impl Constant {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Constant::Int(v) => Some(*v),
            Constant::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::Str(s) => Some(s.as_str()),
            Constant::Int(_) => None,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Str(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i32> for Constant {
    fn from(v: i32) -> Self {
        Constant::Int(v)
    }
}

impl From<&str> for Constant {
    fn from(s: &str) -> Self {
        Constant::Str(s.to_string())
    }
}

/// A constant or a field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Constant(Constant),
    Field(String),
}

impl Expression {
    pub fn evaluate(&self, scan: &dyn Scan) -> QueryResult<Constant> {
        match self {
            Expression::Constant(c) => Ok(c.clone()),
            Expression::Field(name) => scan.get_val(name),
        }
    }

    pub fn as_field(&self) -> Option<&str> {
        match self {
            Expression::Field(name) => Some(name.as_str()),
            Expression::Constant(_) => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expression::Constant(c) => Some(c),
            Expression::Field(_) => None,
        }
    }

    /// Constants apply to any schema; fields only to schemas that hold them
    pub fn applies_to(&self, schema: &Schema) -> bool {
        match self {
            Expression::Constant(_) => true,
            Expression::Field(name) => schema.has_field(name),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(c) => write!(f, "{}", c),
            Expression::Field(name) => write!(f, "{}", name),
        }
    }
}

/// Equality between two expressions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    lhs: Expression,
    rhs: Expression,
}

impl Term {
    pub fn new(lhs: Expression, rhs: Expression) -> Self {
        Self { lhs, rhs }
    }

    pub fn is_satisfied(&self, scan: &dyn Scan) -> QueryResult<bool> {
        let left = self.lhs.evaluate(scan)?;
        let right = self.rhs.evaluate(scan)?;
        Ok(left.cmp(&right) == Ordering::Equal)
    }

    /// Factor by which the term is expected to shrink the record count
    pub fn reduction_factor(&self, plan: &dyn Plan) -> u64 {
        match (self.lhs.as_field(), self.rhs.as_field()) {
            (Some(l), Some(r)) => plan.distinct_values(l).max(plan.distinct_values(r)),
            (Some(l), None) => plan.distinct_values(l),
            (None, Some(r)) => plan.distinct_values(r),
            (None, None) if self.lhs == self.rhs => 1,
            (None, None) => u64::MAX,
        }
    }

    /// The constant `field` is compared with, if the term has that shape
    pub fn equates_with_constant(&self, field: &str) -> Option<&Constant> {
        match (&self.lhs, &self.rhs) {
            (Expression::Field(f), Expression::Constant(c))
            | (Expression::Constant(c), Expression::Field(f))
                if f == field =>
            {
                Some(c)
            }
            _ => None,
        }
    }

    /// The other field `field` is compared with, if the term has that shape
    pub fn equates_with_field(&self, field: &str) -> Option<&str> {
        match (&self.lhs, &self.rhs) {
            (Expression::Field(l), Expression::Field(r)) if l == field => Some(r.as_str()),
            (Expression::Field(l), Expression::Field(r)) if r == field => Some(l.as_str()),
            _ => None,
        }
    }

    pub fn applies_to(&self, schema: &Schema) -> bool {
        self.lhs.applies_to(schema) && self.rhs.applies_to(schema)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

/// A conjunction of terms. The empty predicate is always true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    terms: Vec<Term>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_term(term: Term) -> Self {
        Self { terms: vec![term] }
    }

    pub fn conjoin_with(&mut self, other: Predicate) {
        self.terms.extend(other.terms);
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_satisfied(&self, scan: &dyn Scan) -> QueryResult<bool> {
        for term in &self.terms {
            if !term.is_satisfied(scan)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Product of the terms' reduction factors, saturating
    pub fn reduction_factor(&self, plan: &dyn Plan) -> u64 {
        self.terms
            .iter()
            .fold(1u64, |acc, t| acc.saturating_mul(t.reduction_factor(plan)))
    }

    /// Sub-predicate of the terms that only mention fields of `schema`
    pub fn select_sub_pred(&self, schema: &Schema) -> Option<Predicate> {
        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| t.applies_to(schema))
            .cloned()
            .collect();
        if terms.is_empty() { None } else { Some(Predicate { terms }) }
    }

    pub fn equates_with_constant(&self, field: &str) -> Option<&Constant> {
        self.terms.iter().find_map(|t| t.equates_with_constant(field))
    }

    pub fn equates_with_field(&self, field: &str) -> Option<&str> {
        self.terms.iter().find_map(|t| t.equates_with_field(field))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.terms.iter().map(|t| t.to_string()).collect();
        write!(f, "{}", parts.join(" and "))
    }
}
