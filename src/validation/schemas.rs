//! Schemas for the login and signup forms.

use super::{FieldRules, FormValues, Schema};

pub const FIELD_FULL_NAME: &str = "fullName";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PASSWORD: &str = "password";
pub const FIELD_CONFIRM_PASSWORD: &str = "confirmPassword";

pub const PASSWORD_MIN_LENGTH: usize = 6;

fn email_rules() -> FieldRules {
    FieldRules::new()
        .required_with("Email Address is required")
        .email_with("Email must be in a valid format")
}

#[must_use]
pub fn login_schema() -> Schema {
    Schema::new()
        .field(FIELD_EMAIL, email_rules())
        .field(FIELD_PASSWORD, FieldRules::new().required_with("Password is required"))
}

#[must_use]
pub fn signup_schema() -> Schema {
    Schema::new()
        .field(FIELD_FULL_NAME, FieldRules::new().required_with("Full Name is required"))
        .field(FIELD_EMAIL, email_rules())
        .field(
            FIELD_PASSWORD,
            FieldRules::new()
                .required_with("Password is required")
                .min_length_with(PASSWORD_MIN_LENGTH, "Password must be at least 6 characters"),
        )
        .field(
            FIELD_CONFIRM_PASSWORD,
            FieldRules::new()
                .required_with("Confirm Password is required")
                .validate(confirm_matches_password),
        )
}

fn confirm_matches_password(value: &str, values: &FormValues) -> Option<String> {
    let password = values.get(FIELD_PASSWORD).map_or("", String::as_str);
    (value != password).then(|| "Password and Confirm Password must match".to_owned())
}

#[cfg(test)]
#[path = "schemas_test.rs"]
mod tests;
