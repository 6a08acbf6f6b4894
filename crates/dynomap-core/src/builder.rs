//! Fluent predicate objects shared by the query and scan builders.

use std::fmt;

use dynomap_model::AttributeValue;

use crate::expression::Comparison;

/// Where a finished comparison goes: the builder, the attribute, and the
/// comparison to append.
pub(crate) type Sink<B> = fn(B, String, Comparison) -> B;

/// A pending predicate on one attribute.
///
/// Created by `where_` or `filter`; every method compiles the comparison into
/// the builder it came from and hands the builder back.
pub struct Condition<B> {
    builder: B,
    attribute: String,
    sink: Sink<B>,
}

#[allow(clippy::should_implement_trait)]
impl<B> Condition<B> {
    pub(crate) fn new(builder: B, attribute: String, sink: Sink<B>) -> Self {
        Self {
            builder,
            attribute,
            sink,
        }
    }

    fn apply(self, comparison: Comparison) -> B {
        (self.sink)(self.builder, self.attribute, comparison)
    }

    /// `attribute = value`
    pub fn equals(self, value: impl Into<AttributeValue>) -> B {
        self.apply(Comparison::Eq(value.into()))
    }

    /// Alias of [`Condition::equals`].
    pub fn eq(self, value: impl Into<AttributeValue>) -> B {
        self.equals(value)
    }

    /// `attribute <> value`
    pub fn ne(self, value: impl Into<AttributeValue>) -> B {
        self.apply(Comparison::Ne(value.into()))
    }

    /// `attribute <= value`
    pub fn lte(self, value: impl Into<AttributeValue>) -> B {
        self.apply(Comparison::Le(value.into()))
    }

    /// `attribute < value`
    pub fn lt(self, value: impl Into<AttributeValue>) -> B {
        self.apply(Comparison::Lt(value.into()))
    }

    /// `attribute >= value`
    pub fn gte(self, value: impl Into<AttributeValue>) -> B {
        self.apply(Comparison::Ge(value.into()))
    }

    /// `attribute > value`
    pub fn gt(self, value: impl Into<AttributeValue>) -> B {
        self.apply(Comparison::Gt(value.into()))
    }

    /// The attribute is absent.
    pub fn null(self) -> B {
        self.apply(Comparison::NotExists)
    }

    /// The attribute is present.
    pub fn not_null(self) -> B {
        self.apply(Comparison::Exists)
    }

    /// The string or set contains `value`.
    pub fn contains(self, value: impl Into<AttributeValue>) -> B {
        self.apply(Comparison::Contains(value.into()))
    }

    /// The string or set does not contain `value`.
    pub fn not_contains(self, value: impl Into<AttributeValue>) -> B {
        self.apply(Comparison::NotContains(value.into()))
    }

    /// The attribute equals one of `values`.
    pub fn in_<I, V>(self, values: I) -> B
    where
        I: IntoIterator<Item = V>,
        V: Into<AttributeValue>,
    {
        self.apply(Comparison::In(values.into_iter().map(Into::into).collect()))
    }

    /// The string starts with `prefix`.
    pub fn begins_with(self, prefix: impl Into<AttributeValue>) -> B {
        self.apply(Comparison::BeginsWith(prefix.into()))
    }

    /// `low <= attribute <= high`
    pub fn between(self, low: impl Into<AttributeValue>, high: impl Into<AttributeValue>) -> B {
        self.apply(Comparison::Between(low.into(), high.into()))
    }
}

impl<B> fmt::Debug for Condition<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("attribute", &self.attribute)
            .finish_non_exhaustive()
    }
}
