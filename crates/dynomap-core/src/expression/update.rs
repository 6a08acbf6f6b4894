//! Update expression compilation and merging.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use dynomap_model::AttributeValue;

use super::ExpressionError;
use super::alias::AliasScope;
use super::parser::parse_update;
use crate::schema::Schema;

/// How one attribute changes in an update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    /// Replace the attribute.
    Set(AttributeValue),
    /// Add to a number or a set.
    Add(AttributeValue),
    /// Remove elements from a set.
    Delete(AttributeValue),
    /// Remove the attribute.
    Remove,
}

impl From<AttributeValue> for UpdateValue {
    /// `NULL` and the empty string remove the attribute; anything else sets it.
    fn from(value: AttributeValue) -> Self {
        if value.is_null() || value.is_empty_string() {
            Self::Remove
        } else {
            Self::Set(value)
        }
    }
}

/// Attribute changes keyed by attribute name, applied in name order.
pub type UpdateData = BTreeMap<String, UpdateValue>;

/// The four update keywords in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKeyword {
    /// `SET`
    Set,
    /// `ADD`
    Add,
    /// `REMOVE`
    Remove,
    /// `DELETE`
    Delete,
}

impl UpdateKeyword {
    /// All keywords in the order buckets are rendered.
    pub const ALL: [Self; 4] = [Self::Set, Self::Add, Self::Remove, Self::Delete];

    /// The keyword as it appears in expression text.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Add => "ADD",
            Self::Remove => "REMOVE",
            Self::Delete => "DELETE",
        }
    }

    /// Match a keyword case-insensitively.
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kw| kw.as_str().eq_ignore_ascii_case(word))
    }
}

impl fmt::Display for UpdateKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Update actions grouped by keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateExpressions {
    /// `SET` actions, e.g. `#a = :a`.
    pub set: Vec<String>,
    /// `ADD` actions, e.g. `#a :a`.
    pub add: Vec<String>,
    /// `REMOVE` actions, e.g. `#a`.
    pub remove: Vec<String>,
    /// `DELETE` actions, e.g. `#a :a`.
    pub delete: Vec<String>,
}

impl UpdateExpressions {
    /// Actions of one bucket.
    #[must_use]
    pub fn bucket(&self, keyword: UpdateKeyword) -> &[String] {
        match keyword {
            UpdateKeyword::Set => &self.set,
            UpdateKeyword::Add => &self.add,
            UpdateKeyword::Remove => &self.remove,
            UpdateKeyword::Delete => &self.delete,
        }
    }

    fn bucket_mut(&mut self, keyword: UpdateKeyword) -> &mut Vec<String> {
        match keyword {
            UpdateKeyword::Set => &mut self.set,
            UpdateKeyword::Add => &mut self.add,
            UpdateKeyword::Remove => &mut self.remove,
            UpdateKeyword::Delete => &mut self.delete,
        }
    }

    /// Append an action to a bucket.
    pub fn push(&mut self, keyword: UpdateKeyword, action: impl Into<String>) {
        self.bucket_mut(keyword).push(action.into());
    }

    /// Append every action of `other` after this one's, bucket by bucket.
    pub fn extend(&mut self, other: Self) {
        self.set.extend(other.set);
        self.add.extend(other.add);
        self.remove.extend(other.remove);
        self.delete.extend(other.delete);
    }

    /// Whether every bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        UpdateKeyword::ALL
            .into_iter()
            .all(|kw| self.bucket(kw).is_empty())
    }

    /// Render as `SET a, b ADD c REMOVE d DELETE e`, skipping empty buckets.
    #[must_use]
    pub fn stringify(&self) -> String {
        UpdateKeyword::ALL
            .into_iter()
            .filter(|kw| !self.bucket(*kw).is_empty())
            .map(|kw| format!("{kw} {}", self.bucket(kw).join(", ")))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for UpdateExpressions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify())
    }
}

/// A compiled update: actions plus the aliases they reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateClauses {
    /// Actions grouped by keyword.
    pub expressions: UpdateExpressions,
    /// Name aliases referenced by the actions.
    pub attribute_names: HashMap<String, String>,
    /// Value aliases referenced by the actions.
    pub attribute_values: HashMap<String, AttributeValue>,
}

impl UpdateClauses {
    /// The rendered `UpdateExpression`, or `None` when there is nothing to do.
    #[must_use]
    pub fn update_expression(&self) -> Option<String> {
        if self.expressions.is_empty() {
            None
        } else {
            Some(self.expressions.stringify())
        }
    }
}

/// Compile attribute changes into update actions.
///
/// The schema's hash and range key attributes never produce an action.
pub fn compile_update(
    schema: &dyn Schema,
    data: &UpdateData,
) -> Result<UpdateClauses, ExpressionError> {
    let no_names = HashMap::new();
    let no_values = HashMap::new();
    let mut scope = AliasScope::new(&no_names, &no_values);
    let mut expressions = UpdateExpressions::default();

    for (attribute, value) in data {
        if schema.is_key_attribute(attribute) {
            continue;
        }
        let name = scope.name(attribute)?;
        match value {
            UpdateValue::Remove => expressions.push(UpdateKeyword::Remove, name),
            UpdateValue::Set(v) => {
                let alias = scope.value(attribute, v.clone())?;
                expressions.push(UpdateKeyword::Set, format!("{name} = {alias}"));
            }
            UpdateValue::Add(v) => {
                let alias = scope.value(attribute, v.clone())?;
                expressions.push(UpdateKeyword::Add, format!("{name} {alias}"));
            }
            UpdateValue::Delete(v) => {
                let alias = scope.value(attribute, v.clone())?;
                expressions.push(UpdateKeyword::Delete, format!("{name} {alias}"));
            }
        }
    }

    let (attribute_names, attribute_values) = scope.into_parts();
    Ok(UpdateClauses {
        expressions,
        attribute_names,
        attribute_values,
    })
}

/// Merge a caller-supplied update expression into derived clauses.
///
/// Per bucket, derived actions come first. Caller names and values are merged
/// on top, replacing derived entries with the same alias.
pub fn merge_update(
    derived: UpdateClauses,
    fragment: Option<&str>,
    caller_names: &HashMap<String, String>,
    caller_values: &HashMap<String, AttributeValue>,
) -> Result<UpdateClauses, ExpressionError> {
    let UpdateClauses {
        mut expressions,
        mut attribute_names,
        mut attribute_values,
    } = derived;

    if let Some(fragment) = fragment {
        expressions.extend(parse_update(fragment)?);
    }
    attribute_names.extend(caller_names.iter().map(|(k, v)| (k.clone(), v.clone())));
    attribute_values.extend(caller_values.iter().map(|(k, v)| (k.clone(), v.clone())));

    Ok(UpdateClauses {
        expressions,
        attribute_names,
        attribute_values,
    })
}
