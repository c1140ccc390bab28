//! Mutable state of the form currently on screen.
//!
//! SYSTEM CONTEXT
//! ==============
//! The validation functions are pure; `FormState` is where their results
//! land. Errors only become visible for touched fields, so a user is not
//! shown complaints about inputs they have not reached yet.

use std::collections::{BTreeMap, BTreeSet};

use super::{FormValues, Schema, validate_field, validate_form};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub values: FormValues,
    pub errors: BTreeMap<String, String>,
    pub touched: BTreeSet<String>,
}

impl FormState {
    #[must_use]
    pub fn new(initial: FormValues) -> Self {
        Self { values: initial, errors: BTreeMap::new(), touched: BTreeSet::new() }
    }

    /// Build a form with every schema field present and empty.
    #[must_use]
    pub fn for_schema(schema: &Schema) -> Self {
        Self::new(schema.field_names().map(|n| (n.to_owned(), String::new())).collect())
    }

    #[must_use]
    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map_or("", String::as_str)
    }

    /// Store a new value. A pending error on the field is cleared, since the
    /// user is editing it.
    pub fn set_value(&mut self, field: &str, value: impl Into<String>) {
        self.values.insert(field.to_owned(), value.into());
        self.errors.remove(field);
    }

    pub fn blur(&mut self, field: &str) {
        self.touched.insert(field.to_owned());
    }

    /// Evaluate one field against the current values without storing the result.
    #[must_use]
    pub fn validate_field(&self, schema: &Schema, field: &str) -> Option<String> {
        validate_field(schema, field, self.value(field), &self.values)
    }

    /// Validate the whole form, replace the error map and mark every schema
    /// field touched. Returns whether the form is valid.
    pub fn validate(&mut self, schema: &Schema) -> bool {
        let result = validate_form(schema, &self.values);
        self.errors = result.errors;
        self.touched.extend(result.touched);
        result.is_valid
    }

    pub fn set_field_error(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        if message.is_empty() {
            self.errors.remove(field);
        } else {
            self.errors.insert(field.to_owned(), message);
        }
    }

    /// Replace values and forget all errors and touched marks.
    pub fn reset(&mut self, values: FormValues) {
        self.values = values;
        self.errors.clear();
        self.touched.clear();
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors.values().any(|e| !e.is_empty())
    }

    /// The error to display for `field`: present only once it has been touched.
    #[must_use]
    pub fn visible_error(&self, field: &str) -> Option<&str> {
        if !self.touched.contains(field) {
            return None;
        }
        self.errors.get(field).map(String::as_str)
    }
}

#[cfg(test)]
#[path = "form_test.rs"]
mod tests;
