//! Before/after hooks around writes.
//!
//! Each hook point is an ordered [`Pipeline`] of transform steps. A step
//! receives the payload and returns the payload to hand to the next step; the
//! first error stops the pipeline and the surrounding call.

use std::fmt;
use std::sync::Arc;

use dynomap_model::Item;

use crate::error::MapperResult;
use crate::expression::UpdateData;
use crate::record::Record;

type Step<T> = Arc<dyn Fn(T) -> MapperResult<T> + Send + Sync>;

/// An ordered list of transform steps over one payload type.
pub struct Pipeline<T> {
    steps: Vec<Step<T>>,
}

impl<T> Pipeline<T> {
    /// Append a step.
    pub fn push<F>(&mut self, step: F)
    where
        F: Fn(T) -> MapperResult<T> + Send + Sync + 'static,
    {
        self.steps.push(Arc::new(step));
    }

    /// Run every step in order.
    pub fn run(&self, mut payload: T) -> MapperResult<T> {
        for step in &self.steps {
            payload = step(payload)?;
        }
        Ok(payload)
    }

    /// Number of registered steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no step is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<T> Default for Pipeline<T> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<T> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Self {
            steps: self.steps.clone(),
        }
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.steps.len())
            .finish()
    }
}

/// Hook points of a table.
#[derive(Debug, Clone, Default)]
pub struct Hooks {
    /// Runs on the item about to be put.
    pub before_create: Pipeline<Item>,
    /// Runs on the stored record after a put.
    pub after_create: Pipeline<Record>,
    /// Runs on the attribute changes about to be sent.
    pub before_update: Pipeline<UpdateData>,
    /// Runs on the record returned by an update.
    pub after_update: Pipeline<Record>,
    /// Runs on the record returned by a delete.
    pub after_destroy: Pipeline<Record>,
}
