//! Feature vector assembly for mental-health model inference.
//!
//! Maps a user record onto the exact column layout the classifier was
//! trained with, one-hot expanding the categorical fields.

use crate::schema::FeatureSchema;
use crate::types::input::UserInput;
use serde::Serialize;
use std::ops::Index;

/// One unscaled row aligned to a [`FeatureSchema`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn width(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl Index<usize> for FeatureVector {
    type Output = f32;

    fn index(&self, idx: usize) -> &f32 {
        &self.0[idx]
    }
}

/// Builds schema-aligned feature vectors from user input.
///
/// Stateless: every call allocates its own vector, so one builder can be
/// shared across concurrent requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build a vector of `schema.width()` values.
    ///
    /// Numeric fields land on the column with the same name; missing columns
    /// are skipped. Each categorical field sets at most one `<field>_<value>`
    /// column to 1. A value with no matching column leaves its whole group at 0.
    pub fn build(&self, input: &UserInput, schema: &FeatureSchema) -> FeatureVector {
        let mut values = vec![0.0_f32; schema.width()];

        for (name, value) in input.numeric_fields() {
            if let Some(idx) = schema.index_of(name) {
                values[idx] = value;
            }
        }

        for (field, value) in input.categorical_fields() {
            if let Some(idx) = schema.one_hot_index(field, value) {
                values[idx] = 1.0;
            }
        }

        FeatureVector(values)
    }
}
