//! Taxonomy axis registry.
//!
//! Each axis is an independent classification dimension with a small closed
//! vocabulary. Labels are validated against the registry and the trainer fits
//! one model per registered axis, in registry order.

use serde::{Deserialize, Serialize};

pub const COMPLEXITY: &str = "complexity";
pub const LATENCY: &str = "latency";
pub const PRIVACY: &str = "privacy";
pub const KNOWLEDGE: &str = "knowledge";
pub const DEVICE_LOAD: &str = "device_load";

/// One taxonomy axis and its allowed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub name: String,
    pub values: Vec<String>,
}

impl AxisSpec {
    pub fn new(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn allows(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// Ordered registry of taxonomy axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub axes: Vec<AxisSpec>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self {
            axes: vec![
                AxisSpec::new(COMPLEXITY, &["simple", "complex"]),
                AxisSpec::new(LATENCY, &["realtime", "relaxed"]),
                AxisSpec::new(PRIVACY, &["private", "public"]),
                AxisSpec::new(KNOWLEDGE, &["high", "low"]),
                AxisSpec::new(DEVICE_LOAD, &["light", "heavy"]),
            ],
        }
    }
}

impl Taxonomy {
    pub fn axis(&self, name: &str) -> Option<&AxisSpec> {
        self.axes.iter().find(|a| a.name == name)
    }

    /// Axis names in registry order.
    pub fn axis_names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|a| a.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }
}
