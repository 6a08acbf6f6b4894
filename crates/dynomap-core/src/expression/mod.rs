//! Expression compilation.
//!
//! Turns attribute-level predicates and update values into DynamoDB
//! expression text with placeholder aliases. The pipeline is:
//!
//! 1. **Aliasing**: every attribute path segment gets a `#name` alias and every
//!    literal gets a `:value` alias that does not collide with the aliases
//!    already present in the request.
//! 2. **Rendering**: conditions render to a single statement, updates render to
//!    actions grouped by keyword.
//! 3. **Merging**: derived clauses are combined with caller-supplied fragments.

mod alias;
pub mod condition;
pub mod parser;
pub mod update;

use std::collections::HashMap;

use dynomap_model::AttributeValue;

pub use alias::AliasScope;
pub use condition::{Comparison, Expectation, Expected, compile_condition, compile_expected};
pub use parser::parse_update;
pub use update::{
    UpdateClauses, UpdateData, UpdateExpressions, UpdateKeyword, UpdateValue, compile_update,
    merge_update,
};

/// Errors produced while compiling or parsing expressions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// The attribute path was empty.
    #[error("Attribute path is empty")]
    EmptyPath,
    /// A path segment contained no word characters.
    #[error("Attribute path has no usable characters: {path}")]
    InvalidPath {
        /// The rejected path.
        path: String,
    },
    /// An `IN` comparison was given no values.
    #[error("IN requires at least one value for {path}")]
    EmptyInList {
        /// The attribute path of the comparison.
        path: String,
    },
    /// A projection was given no attributes.
    #[error("Projection requires at least one attribute")]
    EmptyProjection,
    /// An unexpected token was encountered.
    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        /// What was expected.
        expected: String,
        /// What was found.
        found: String,
    },
    /// Parentheses do not balance.
    #[error("Unbalanced parentheses in expression: {expression}")]
    UnbalancedParentheses {
        /// The offending expression.
        expression: String,
    },
    /// A keyword or comma was not followed by an action.
    #[error("Missing action after {keyword}")]
    EmptyAction {
        /// The keyword that opened the bucket.
        keyword: String,
    },
}

/// A compiled statement together with the aliases it references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clause {
    /// The rendered expression text.
    pub statement: String,
    /// Name aliases (`#x`) referenced by the statement.
    pub attribute_names: HashMap<String, String>,
    /// Value aliases (`:x`) referenced by the statement.
    pub attribute_values: HashMap<String, AttributeValue>,
}

/// Render a projection expression, reusing name aliases already bound in
/// `existing_names`. An empty attribute list is rejected.
pub fn compile_projection(
    attributes: &[String],
    existing_names: &HashMap<String, String>,
) -> Result<Clause, ExpressionError> {
    if attributes.is_empty() {
        return Err(ExpressionError::EmptyProjection);
    }
    let no_values = HashMap::new();
    let mut scope = AliasScope::new(existing_names, &no_values);
    let aliased = attributes
        .iter()
        .map(|attribute| scope.name(attribute))
        .collect::<Result<Vec<_>, _>>()?;
    let (attribute_names, _) = scope.into_parts();
    Ok(Clause {
        statement: aliased.join(", "),
        attribute_names,
        attribute_values: HashMap::new(),
    })
}

/// Join statements with `AND`, wrapping each one in parentheses.
///
/// Returns `None` when there is nothing to join.
#[must_use]
pub fn and_statements<S: AsRef<str>>(statements: &[S]) -> Option<String> {
    if statements.is_empty() {
        return None;
    }
    let joined = statements
        .iter()
        .map(|s| format!("({})", s.as_ref()))
        .collect::<Vec<_>>()
        .join(" AND ");
    Some(joined)
}
