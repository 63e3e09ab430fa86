//! Field-level request validation.
//!
//! Services collect every problem with a payload into [`FieldErrors`] and turn
//! it into a single `AppError::Validation` before touching storage.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_USERNAME_LEN: usize = 150;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_PERSON_NAME_LEN: usize = 150;
pub const MAX_PRODUCT_NAME_LEN: usize = 255;
pub const PRICE_SCALE: u32 = 2;
/// Largest value a `NUMERIC(12, 2)` column holds.
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

const BODY_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }

    /// Returns `Err(AppError::Validation)` when anything was recorded.
    pub fn finish(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }

    /// Turns a body deserialization message such as
    /// ``missing field `count` at line 1 column 29`` or
    /// `product_id: UUID parsing failed ...` into a field entry.
    pub fn from_body_error(text: &str) -> Self {
        let text = text
            .strip_prefix(BODY_ERROR_PREFIX)
            .unwrap_or(text)
            .trim();
        let text = match text.rfind(" at line ") {
            Some(idx) => &text[..idx],
            None => text,
        };

        let mut errors = FieldErrors::default();
        if let Some(field) = text
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split_once('`'))
            .map(|(field, _)| field)
        {
            errors.add(field, "This field is required.");
            return errors;
        }

        let is_path = |p: &str| {
            !p.is_empty()
                && p.chars()
                    .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
        };
        match text.split_once(": ") {
            Some((path, message)) if is_path(path) => errors.add(path, message),
            _ => errors.add(NON_FIELD_ERRORS, text),
        }
        errors
    }

    /// Unwraps a field that a full update requires, recording it as missing otherwise.
    pub fn require<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.add(field, "This field is required.");
        }
        value
    }
}

pub fn check_username(errors: &mut FieldErrors, username: &str) {
    if username.is_empty() {
        errors.add("username", "This field may not be blank.");
        return;
    }
    check_max_len(errors, "username", username, MAX_USERNAME_LEN);
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        errors.add(
            "username",
            "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

pub fn check_email(errors: &mut FieldErrors, email: &str) {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .rsplit_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && tld.len() >= 2)
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        errors.add("email", "Enter a valid email address.");
    }
    check_max_len(errors, "email", email, MAX_EMAIL_LEN);
}

pub fn check_password(errors: &mut FieldErrors, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."),
        );
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password", "This password is entirely numeric.");
    } else {
        if !password.chars().any(|c| c.is_ascii_digit()) {
            errors.add("password", "The password must contain at least one digit.");
        }
        if !password.chars().any(char::is_alphabetic) {
            errors.add("password", "The password must contain at least one letter.");
        }
    }
}

pub fn check_not_blank(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "This field may not be blank.");
    }
}

pub fn check_max_len(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(
            field,
            format!("Ensure this field has no more than {max} characters."),
        );
    }
}

pub fn check_price(errors: &mut FieldErrors, price: Decimal) {
    if price.is_sign_negative() && !price.is_zero() {
        errors.add("price", "Ensure this value is greater than or equal to 0.");
    }
    if price > MAX_PRICE {
        errors.add(
            "price",
            format!("Ensure this value is less than or equal to {MAX_PRICE}."),
        );
    }
    if price.normalize().scale() > PRICE_SCALE {
        errors.add(
            "price",
            format!("Ensure that there are no more than {PRICE_SCALE} decimal places."),
        );
    }
}

pub fn check_count(errors: &mut FieldErrors, count: i32) {
    if count < 0 {
        errors.add("count", "Ensure this value is greater than or equal to 0.");
    }
}

pub fn check_quantity(errors: &mut FieldErrors, quantity: i32) {
    if quantity < 1 {
        errors.add("quantity", "Ensure this value is greater than or equal to 1.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn password_without_digits_is_rejected() {
        let mut errors = FieldErrors::default();
        check_password(&mut errors, "Password_without_numbers");
        assert_eq!(
            errors.get("password"),
            Some(&["The password must contain at least one digit.".to_string()][..])
        );
    }

    #[test]
    fn password_rules_accept_mixed_password() {
        let mut errors = FieldErrors::default();
        check_password(&mut errors, "Test_password1");
        assert!(errors.is_empty());
    }

    #[test]
    fn short_numeric_password_collects_every_message() {
        let mut errors = FieldErrors::default();
        check_password(&mut errors, "1234");
        let messages = errors.get("password").unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].contains("entirely numeric"));
    }

    #[test]
    fn email_shapes() {
        for ok in ["user@gmail.com", "admin+1@gmail.com", "a.b@sub.example.org"] {
            let mut errors = FieldErrors::default();
            check_email(&mut errors, ok);
            assert!(errors.is_empty(), "{ok} should be valid");
        }
        for bad in ["", "plain", "@example.com", "user@", "user@host", "us er@example.com"] {
            let mut errors = FieldErrors::default();
            check_email(&mut errors, bad);
            assert!(!errors.is_empty(), "{bad} should be invalid");
        }
    }

    #[test]
    fn username_charset() {
        let mut errors = FieldErrors::default();
        check_username(&mut errors, "test.user+shop@home");
        assert!(errors.is_empty());

        check_username(&mut errors, "no spaces");
        assert!(errors.get("username").is_some());
    }

    #[test]
    fn price_must_be_non_negative_with_two_places() {
        let mut errors = FieldErrors::default();
        check_price(&mut errors, Decimal::from_str("10.0").unwrap());
        check_price(&mut errors, Decimal::ZERO);
        check_price(&mut errors, Decimal::from_str("19.990").unwrap());
        assert!(errors.is_empty());

        check_price(&mut errors, Decimal::from_str("-0.01").unwrap());
        check_price(&mut errors, Decimal::from_str("1.001").unwrap());
        assert_eq!(errors.get("price").map(<[String]>::len), Some(2));
    }

    #[test]
    fn price_and_lengths_have_upper_bounds() {
        assert_eq!(MAX_PRICE, Decimal::from_str("9999999999.99").unwrap());

        let mut errors = FieldErrors::default();
        check_price(&mut errors, MAX_PRICE);
        check_max_len(&mut errors, "name", &"x".repeat(255), MAX_PRODUCT_NAME_LEN);
        assert!(errors.is_empty());

        check_price(&mut errors, Decimal::from_str("100000000000").unwrap());
        check_max_len(&mut errors, "name", &"x".repeat(300), MAX_PRODUCT_NAME_LEN);
        check_email(&mut errors, &format!("{}@example.com", "a".repeat(250)));
        assert!(errors.get("price").is_some());
        assert!(errors.get("name").is_some());
        assert!(errors.get("email").is_some());
    }

    #[test]
    fn body_errors_map_to_fields() {
        let errors = FieldErrors::from_body_error(
            "Failed to deserialize the JSON body into the target type: missing field `count` at line 1 column 29",
        );
        assert_eq!(
            errors.get("count"),
            Some(&["This field is required.".to_string()][..])
        );

        let errors = FieldErrors::from_body_error(
            "Failed to deserialize the JSON body into the target type: product_id: UUID parsing failed: invalid character at line 1 column 28",
        );
        assert!(errors.get("product_id").is_some());

        let errors = FieldErrors::from_body_error("invalid type: integer `5`, expected a map");
        assert!(errors.get(NON_FIELD_ERRORS).is_some());
    }

    #[test]
    fn finish_reports_validation_error() {
        let mut errors = FieldErrors::default();
        check_quantity(&mut errors, 0);
        check_count(&mut errors, -1);
        match errors.finish() {
            Err(AppError::Validation(errors)) => {
                let fields = errors.into_inner();
                assert!(fields.contains_key("quantity"));
                assert!(fields.contains_key("count"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn require_records_missing_fields() {
        let mut errors = FieldErrors::default();
        let name: Option<String> = errors.require("name", None);
        let count = errors.require("count", Some(3));
        assert!(name.is_none());
        assert_eq!(count, Some(3));
        assert_eq!(
            errors.get("name"),
            Some(&["This field is required.".to_string()][..])
        );
    }
}
