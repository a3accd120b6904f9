//! Field visitor shared by the capturing layers
//!
//! Flattens every field of a tracing event into a string map. The implicit
//! `message` field is recorded like any other field.

use std::collections::BTreeMap;
use tracing::field::{Field, Visit};

/// Collects event fields as strings, keyed by field name
#[derive(Debug, Default)]
pub struct FieldVisitor {
    pub fields: BTreeMap<String, String>,
}

impl FieldVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every field of `event` into a fresh visitor
    pub fn collect(event: &tracing::Event<'_>) -> Self {
        let mut visitor = Self::new();
        event.record(&mut visitor);
        visitor
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Remove and return a field
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    pub fn into_fields(self) -> BTreeMap<String, String> {
        self.fields
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }
}
