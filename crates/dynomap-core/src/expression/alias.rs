//! Placeholder alias allocation.

use std::collections::HashMap;

use dynomap_model::AttributeValue;

use super::ExpressionError;

/// Allocates `#name` and `:value` aliases against the aliases a request
/// already carries.
///
/// Name aliases are reused when the same real name is already bound to them,
/// so compiling one path twice yields one alias. Value aliases are never
/// reused: a taken alias gets a numeric suffix (`:age_2`, `:age_3`, ...).
#[derive(Debug)]
pub struct AliasScope<'a> {
    existing_names: &'a HashMap<String, String>,
    existing_values: &'a HashMap<String, AttributeValue>,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl<'a> AliasScope<'a> {
    /// Create a scope over the aliases already present in a request.
    #[must_use]
    pub fn new(
        existing_names: &'a HashMap<String, String>,
        existing_values: &'a HashMap<String, AttributeValue>,
    ) -> Self {
        Self {
            existing_names,
            existing_values,
            names: HashMap::new(),
            values: HashMap::new(),
        }
    }

    /// Alias every dot-separated segment of `path`, returning `#a.#b`.
    pub fn name(&mut self, path: &str) -> Result<String, ExpressionError> {
        if path.is_empty() {
            return Err(ExpressionError::EmptyPath);
        }
        let mut aliased = Vec::new();
        for segment in path.split('.') {
            let base = sanitize(segment);
            if base.is_empty() {
                return Err(ExpressionError::InvalidPath {
                    path: path.to_owned(),
                });
            }
            aliased.push(self.bind_name(&base, segment));
        }
        Ok(aliased.join("."))
    }

    /// Allocate a fresh value alias derived from `path` and bind `value` to it.
    pub fn value(&mut self, path: &str, value: AttributeValue) -> Result<String, ExpressionError> {
        if path.is_empty() {
            return Err(ExpressionError::EmptyPath);
        }
        let base = sanitize(&path.replace('.', "_"));
        if base.is_empty() {
            return Err(ExpressionError::InvalidPath {
                path: path.to_owned(),
            });
        }
        let mut alias = format!(":{base}");
        let mut suffix = 2;
        while self.value_taken(&alias) {
            alias = format!(":{base}_{suffix}");
            suffix += 1;
        }
        self.values.insert(alias.clone(), value);
        Ok(alias)
    }

    /// The aliases referenced through this scope.
    #[must_use]
    pub fn into_parts(self) -> (HashMap<String, String>, HashMap<String, AttributeValue>) {
        (self.names, self.values)
    }

    fn bind_name(&mut self, base: &str, real: &str) -> String {
        let mut alias = format!("#{base}");
        let mut suffix = 2;
        loop {
            match self.bound_name(&alias) {
                Some(bound) if bound == real => break,
                Some(_) => {
                    alias = format!("#{base}_{suffix}");
                    suffix += 1;
                }
                None => break,
            }
        }
        self.names.insert(alias.clone(), real.to_owned());
        alias
    }

    fn bound_name(&self, alias: &str) -> Option<&str> {
        self.names
            .get(alias)
            .or_else(|| self.existing_names.get(alias))
            .map(String::as_str)
    }

    fn value_taken(&self, alias: &str) -> bool {
        self.values.contains_key(alias) || self.existing_values.contains_key(alias)
    }
}

/// Strip everything but ASCII word characters.
fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
