//! Ordered feature-column schema fixed at training time

use std::collections::HashMap;
use tracing::warn;

/// Ordered column names defining the width and positional meaning of every
/// feature vector the classifier accepts.
///
/// Lookups are precomputed when the schema is created: numeric columns by
/// exact name, one-hot columns by their lowercased `<field>_<value>` name.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
    one_hot: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Build a schema from training-time column names.
    ///
    /// Returns the offending name if a column appears twice.
    pub fn new(columns: Vec<String>) -> Result<Self, String> {
        let mut positions = HashMap::with_capacity(columns.len());
        let mut one_hot = HashMap::with_capacity(columns.len());

        for (idx, column) in columns.iter().enumerate() {
            if positions.insert(column.clone(), idx).is_some() {
                return Err(column.clone());
            }

            let key = column.to_lowercase();
            if let Some(&first) = one_hot.get(&key) {
                warn!(
                    column = %column,
                    kept = %columns[first],
                    "Columns collide case-insensitively, keeping the first"
                );
                continue;
            }
            one_hot.insert(key, idx);
        }

        Ok(Self {
            columns,
            positions,
            one_hot,
        })
    }

    /// Number of columns, i.e. the feature vector width
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column by exact name
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    /// Position of the one-hot column for `field` taking `value`,
    /// matched case-insensitively against `<field>_<value>`
    pub fn one_hot_index(&self, field: &str, value: &str) -> Option<usize> {
        let key = format!("{}_{}", field, value).to_lowercase();
        self.one_hot.get(&key).copied()
    }

    /// Columns belonging to a categorical group (`<field>_` prefix, any case)
    pub fn group_indices(&self, field: &str) -> Vec<usize> {
        let prefix = format!("{}_", field).to_lowercase();
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.to_lowercase().starts_with(&prefix))
            .map(|(i, _)| i)
            .collect()
    }
}
