//! Field validators used by `#[validate(custom(...))]` on request types.

use rust_decimal::Decimal;
use std::sync::LazyLock;
use validator::ValidationError;

static DOMAIN: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$")
        .expect("domain pattern is valid")
});

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

pub fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(error("positive_amount", "Amount must be greater than zero"))
    }
}

pub fn non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO {
        Ok(())
    } else {
        Err(error("non_negative_amount", "Amount must not be negative"))
    }
}

/// ISO-4217 style code: exactly three ASCII uppercase letters.
pub fn currency_code(value: &str) -> Result<(), ValidationError> {
    if value.len() == 3 && value.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(error(
            "currency_code",
            "Currency must be a 3-letter ISO code such as INR",
        ))
    }
}

/// `#RRGGBB` color.
pub fn hex_color(value: &str) -> Result<(), ValidationError> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].bytes().all(|b| b.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(error("hex_color", "Color must be in #RRGGBB format"))
    }
}

/// Lowercase URL slug.
pub fn slug(value: &str) -> Result<(), ValidationError> {
    let valid = !value.is_empty()
        && !value.starts_with('-')
        && !value.ends_with('-')
        && value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(error(
            "slug",
            "Slug may only contain lowercase letters, digits and hyphens",
        ))
    }
}

/// Bare hostname such as `learn.example.com` (no scheme, port or path).
pub fn domain_name(value: &str) -> Result<(), ValidationError> {
    if DOMAIN.is_match(value) {
        Ok(())
    } else {
        Err(error("domain_name", "Domain must be a hostname like learn.example.com"))
    }
}
