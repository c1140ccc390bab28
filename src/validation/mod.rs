//! Declarative per-field form validation.
//!
//! DESIGN
//! ======
//! A `Schema` maps field names to `FieldRules`. Rules for one field are
//! evaluated in a fixed order (required, email, min length, custom) and the
//! first failure wins. Fields are evaluated independently, so a form-level
//! pass reports every failing field at once.
//!
//! Blank values (empty after trimming) only ever fail the `required` rule;
//! the remaining rules are skipped for them.

pub mod form;
pub mod schemas;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;

/// `local@domain.tld`, no whitespace, exactly one `@`.
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Current value of every form field, keyed by field name.
pub type FormValues = BTreeMap<String, String>;

/// Cross-field check. Receives the field value and every form value; returns
/// an error message, or `None` when the value is acceptable.
pub type CustomRule = Arc<dyn Fn(&str, &FormValues) -> Option<String> + Send + Sync>;

static EMAIL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

/// Check `email` against [`EMAIL_PATTERN`].
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX
        .get_or_init(|| Regex::new(EMAIL_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(email))
}

// =============================================================================
// RULES
// =============================================================================

/// Rule set for a single field.
#[derive(Clone, Default)]
pub struct FieldRules {
    required: Option<Option<String>>,
    email: Option<Option<String>>,
    min_length: Option<(usize, Option<String>)>,
    validate: Option<CustomRule>,
}

impl FieldRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail blank values with the default `"{field} is required"` message.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = Some(None);
        self
    }

    #[must_use]
    pub fn required_with(mut self, message: impl Into<String>) -> Self {
        self.required = Some(Some(message.into()));
        self
    }

    /// Fail values that do not match [`EMAIL_PATTERN`].
    #[must_use]
    pub fn email(mut self) -> Self {
        self.email = Some(None);
        self
    }

    #[must_use]
    pub fn email_with(mut self, message: impl Into<String>) -> Self {
        self.email = Some(Some(message.into()));
        self
    }

    /// Fail values whose trimmed character count is below `min`.
    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some((min, None));
        self
    }

    #[must_use]
    pub fn min_length_with(mut self, min: usize, message: impl Into<String>) -> Self {
        self.min_length = Some((min, Some(message.into())));
        self
    }

    /// Attach a custom check, run last and only on non-blank values.
    #[must_use]
    pub fn validate<F>(mut self, rule: F) -> Self
    where
        F: Fn(&str, &FormValues) -> Option<String> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(rule));
        self
    }

    /// Evaluate the rules for `field` in order; first failure wins.
    fn check(&self, field: &str, value: &str, values: &FormValues) -> Option<String> {
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return self
                .required
                .as_ref()
                .map(|msg| msg.clone().unwrap_or_else(|| format!("{field} is required")));
        }

        if let Some(msg) = &self.email {
            if !is_valid_email(value) {
                return Some(msg.clone().unwrap_or_else(|| "Invalid email format".to_owned()));
            }
        }

        if let Some((min, msg)) = &self.min_length {
            if trimmed.chars().count() < *min {
                return Some(msg.clone().unwrap_or_else(|| format!("Must be at least {min} characters")));
            }
        }

        self.validate
            .as_ref()
            .and_then(|rule| rule(value, values))
            .filter(|msg| !msg.is_empty())
    }
}

impl fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRules")
            .field("required", &self.required)
            .field("email", &self.email)
            .field("min_length", &self.min_length)
            .field("validate", &self.validate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

// =============================================================================
// SCHEMA
// =============================================================================

/// Ordered mapping from field name to its rules.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, FieldRules)>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the rules for `name`.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, rules: FieldRules) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = rules,
            None => self.fields.push((name, rules)),
        }
        self
    }

    #[must_use]
    pub fn rules(&self, name: &str) -> Option<&FieldRules> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// =============================================================================
// EVALUATION
// =============================================================================

/// Result of validating every schema field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValidation {
    pub is_valid: bool,
    /// Failing fields only.
    pub errors: BTreeMap<String, String>,
    /// Every schema field.
    pub touched: BTreeSet<String>,
}

/// Validate one field. Returns `None` when the value passes, or when the
/// field is not part of the schema.
#[must_use]
pub fn validate_field(schema: &Schema, field: &str, value: &str, values: &FormValues) -> Option<String> {
    schema.rules(field)?.check(field, value, values)
}

/// Validate every schema field against `values`. Missing values are treated
/// as empty strings.
#[must_use]
pub fn validate_form(schema: &Schema, values: &FormValues) -> FormValidation {
    let mut errors = BTreeMap::new();
    for (name, rules) in &schema.fields {
        let value = values.get(name).map_or("", String::as_str);
        if let Some(msg) = rules.check(name, value, values) {
            errors.insert(name.clone(), msg);
        }
    }

    FormValidation {
        is_valid: errors.is_empty(),
        errors,
        touched: schema.field_names().map(str::to_owned).collect(),
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
