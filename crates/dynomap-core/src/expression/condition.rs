//! Condition, filter, and key-condition compilation.

use std::collections::HashMap;

use dynomap_model::AttributeValue;

use super::alias::AliasScope;
use super::{Clause, ExpressionError, and_statements};

/// A comparison applied to one attribute path.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// `#p = :v`
    Eq(AttributeValue),
    /// `#p <> :v`
    Ne(AttributeValue),
    /// `#p <= :v`
    Le(AttributeValue),
    /// `#p < :v`
    Lt(AttributeValue),
    /// `#p >= :v`
    Ge(AttributeValue),
    /// `#p > :v`
    Gt(AttributeValue),
    /// `attribute_exists(#p)`
    Exists,
    /// `attribute_not_exists(#p)`
    NotExists,
    /// `contains(#p, :v)`
    Contains(AttributeValue),
    /// `NOT contains(#p, :v)`
    NotContains(AttributeValue),
    /// `begins_with(#p, :v)`
    BeginsWith(AttributeValue),
    /// `#p IN (:v, :v_2, ...)`
    In(Vec<AttributeValue>),
    /// `#p BETWEEN :v AND :v_2`
    Between(AttributeValue, AttributeValue),
}

impl Comparison {
    /// Short operator name used in diagnostics.
    #[must_use]
    pub fn operator_name(&self) -> &'static str {
        match self {
            Self::Eq(_) => "equals",
            Self::Ne(_) => "ne",
            Self::Le(_) => "lte",
            Self::Lt(_) => "lt",
            Self::Ge(_) => "gte",
            Self::Gt(_) => "gt",
            Self::Exists => "not_null",
            Self::NotExists => "null",
            Self::Contains(_) => "contains",
            Self::NotContains(_) => "not_contains",
            Self::BeginsWith(_) => "begins_with",
            Self::In(_) => "in",
            Self::Between(..) => "between",
        }
    }

    /// Whether the operator is legal in a key condition expression.
    #[must_use]
    pub fn is_key_operator(&self) -> bool {
        matches!(
            self,
            Self::Eq(_)
                | Self::Le(_)
                | Self::Lt(_)
                | Self::Ge(_)
                | Self::Gt(_)
                | Self::BeginsWith(_)
                | Self::Between(..)
        )
    }
}

/// Compile one comparison against the aliases already present in a request.
///
/// The returned clause carries every name alias the statement references and
/// the freshly allocated value aliases.
pub fn compile_condition(
    path: &str,
    comparison: &Comparison,
    existing_names: &HashMap<String, String>,
    existing_values: &HashMap<String, AttributeValue>,
) -> Result<Clause, ExpressionError> {
    let mut scope = AliasScope::new(existing_names, existing_values);
    let statement = render(&mut scope, path, comparison)?;
    let (attribute_names, attribute_values) = scope.into_parts();
    Ok(Clause {
        statement,
        attribute_names,
        attribute_values,
    })
}

fn render(
    scope: &mut AliasScope<'_>,
    path: &str,
    comparison: &Comparison,
) -> Result<String, ExpressionError> {
    let name = scope.name(path)?;
    let statement = match comparison {
        Comparison::Eq(v) => binary(scope, &name, "=", path, v)?,
        Comparison::Ne(v) => binary(scope, &name, "<>", path, v)?,
        Comparison::Le(v) => binary(scope, &name, "<=", path, v)?,
        Comparison::Lt(v) => binary(scope, &name, "<", path, v)?,
        Comparison::Ge(v) => binary(scope, &name, ">=", path, v)?,
        Comparison::Gt(v) => binary(scope, &name, ">", path, v)?,
        Comparison::Exists => format!("attribute_exists({name})"),
        Comparison::NotExists => format!("attribute_not_exists({name})"),
        Comparison::Contains(v) => {
            let value = scope.value(path, v.clone())?;
            format!("contains({name}, {value})")
        }
        Comparison::NotContains(v) => {
            let value = scope.value(path, v.clone())?;
            format!("NOT contains({name}, {value})")
        }
        Comparison::BeginsWith(v) => {
            let value = scope.value(path, v.clone())?;
            format!("begins_with({name}, {value})")
        }
        Comparison::In(list) => {
            if list.is_empty() {
                return Err(ExpressionError::EmptyInList {
                    path: path.to_owned(),
                });
            }
            let aliases = list
                .iter()
                .map(|v| scope.value(path, v.clone()))
                .collect::<Result<Vec<_>, _>>()?;
            format!("{name} IN ({})", aliases.join(", "))
        }
        Comparison::Between(low, high) => {
            let low = scope.value(path, low.clone())?;
            let high = scope.value(path, high.clone())?;
            format!("{name} BETWEEN {low} AND {high}")
        }
    };
    Ok(statement)
}

fn binary(
    scope: &mut AliasScope<'_>,
    name: &str,
    op: &str,
    path: &str,
    value: &AttributeValue,
) -> Result<String, ExpressionError> {
    let value = scope.value(path, value.clone())?;
    Ok(format!("{name} {op} {value}"))
}

// ---------------------------------------------------------------------------
// Expected
// ---------------------------------------------------------------------------

/// A guard on one attribute of the stored item.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// The attribute must (`true`) or must not (`false`) exist.
    Exists(bool),
    /// The attribute must differ from the value.
    NotEqual(AttributeValue),
    /// The attribute must equal the value.
    Equals(AttributeValue),
}

impl From<&Expectation> for Comparison {
    fn from(expectation: &Expectation) -> Self {
        match expectation {
            Expectation::Exists(true) => Self::Exists,
            Expectation::Exists(false) => Self::NotExists,
            Expectation::NotEqual(v) => Self::Ne(v.clone()),
            Expectation::Equals(v) => Self::Eq(v.clone()),
        }
    }
}

/// An ordered list of attribute guards for a conditional write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expected(Vec<(String, Expectation)>);

impl Expected {
    /// Create an empty guard list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a guard.
    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, expectation: Expectation) -> Self {
        self.0.push((attribute.into(), expectation));
        self
    }

    /// Require the attribute to exist.
    #[must_use]
    pub fn exists(self, attribute: impl Into<String>) -> Self {
        self.with(attribute, Expectation::Exists(true))
    }

    /// Require the attribute to be absent.
    #[must_use]
    pub fn not_exists(self, attribute: impl Into<String>) -> Self {
        self.with(attribute, Expectation::Exists(false))
    }

    /// Require the attribute to equal `value`.
    #[must_use]
    pub fn equals(self, attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.with(attribute, Expectation::Equals(value.into()))
    }

    /// Require the attribute to differ from `value`.
    #[must_use]
    pub fn not_equal(self, attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.with(attribute, Expectation::NotEqual(value.into()))
    }

    /// Whether no guard has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate guards in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(String, Expectation)> {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Expectation)> for Expected {
    fn from_iter<I: IntoIterator<Item = (K, Expectation)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, e)| (k.into(), e)).collect())
    }
}

/// Compile guards into one `AND`-joined condition, each statement wrapped in
/// parentheses.
///
/// Value aliases avoid both `existing_values` and the aliases allocated for
/// earlier guards in the list.
pub fn compile_expected(
    expected: &Expected,
    existing_names: &HashMap<String, String>,
    existing_values: &HashMap<String, AttributeValue>,
) -> Result<Clause, ExpressionError> {
    let mut scope = AliasScope::new(existing_names, existing_values);
    let mut statements = Vec::with_capacity(expected.0.len());
    for (attribute, expectation) in expected.iter() {
        statements.push(render(&mut scope, attribute, &Comparison::from(expectation))?);
    }
    let (attribute_names, attribute_values) = scope.into_parts();
    Ok(Clause {
        statement: and_statements(&statements).unwrap_or_default(),
        attribute_names,
        attribute_values,
    })
}
