//! Pure payload checks.
//!
//! Every validator returns either the normalized value or the first rule
//! the input broke. Fields are checked in declaration order, and within a
//! field the order is: present, minimum length, maximum length, pattern.

use crate::domain::entry::{Currency, EntryKind, EntryRequest, NewEntry};
use crate::domain::error::{DomainError, ValidationError};
use crate::domain::user::{
    Credentials, NewUser, SignInRequest, SignUpRequest, UpdateUserRequest, UserUpdate,
};
use email_address::EmailAddress;
use mongodb::bson::oid::ObjectId;
use std::str::FromStr;

const NAME_MIN: usize = 3;
const NAME_MAX: usize = 20;
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 15;

/// Accepts exactly 24 hexadecimal characters.
pub fn validate_user_id(input: &str) -> Result<ObjectId, DomainError> {
    if input.len() != 24 || !input.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DomainError::InvalidIdentifier);
    }
    ObjectId::parse_str(input).map_err(|_| DomainError::InvalidIdentifier)
}

pub fn validate_sign_up(input: SignUpRequest) -> Result<NewUser, ValidationError> {
    let full_name = full_name(input.full_name)?;
    let username = username(input.username)?;
    let email = email(input.email)?;
    let password = password(input.password)?;
    Ok(NewUser {
        full_name,
        username,
        email,
        password,
    })
}

pub fn validate_sign_in(input: SignInRequest) -> Result<Credentials, ValidationError> {
    let username = username(input.username)?;
    let password = password(input.password)?;
    Ok(Credentials { username, password })
}

pub fn validate_user_update(input: UpdateUserRequest) -> Result<UserUpdate, ValidationError> {
    if input.full_name.is_none() && input.username.is_none() {
        return Err(ValidationError::new(
            "body",
            "At least one of fullName or username must be provided",
        ));
    }
    let full_name = input.full_name.map(|v| full_name(Some(v))).transpose()?;
    let username = input.username.map(|v| username(Some(v))).transpose()?;
    Ok(UserUpdate {
        full_name,
        username,
    })
}

/// Checks an income or expense payload against the rules of `kind`.
pub fn validate_entry(kind: EntryKind, input: EntryRequest) -> Result<NewEntry, ValidationError> {
    let title = input
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ValidationError::required("title"))?;

    let description = input
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    if description.is_none() && kind.description_required() {
        return Err(ValidationError::required("description"));
    }

    let amount = input
        .amount
        .ok_or_else(|| ValidationError::required("amount"))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::new("amount", "Amount must be greater than 0"));
    }

    let tag = input.tag.ok_or_else(|| ValidationError::required("tag"))?;
    if !kind.tags().contains(&tag.as_str()) {
        return Err(ValidationError::new(
            "tag",
            format!(
                "Invalid tag. Expected one of: {}, received '{}'",
                kind.tags().join(", "),
                tag
            ),
        ));
    }

    let currency = match input.currency {
        None => Currency::default(),
        Some(code) => code.parse::<Currency>().map_err(|_| {
            ValidationError::new(
                "currency",
                format!(
                    "Invalid currency. Expected one of: ILS, USD, EUR, received '{}'",
                    code
                ),
            )
        })?,
    };

    Ok(NewEntry {
        title,
        description,
        amount,
        tag,
        currency,
    })
}

fn full_name(value: Option<String>) -> Result<String, ValidationError> {
    let value = value
        .map(|v| v.trim().to_string())
        .ok_or_else(|| ValidationError::required("fullName"))?;
    check_length("fullName", "Full name", &value, NAME_MIN, NAME_MAX)?;
    if !value
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
    {
        return Err(ValidationError::new(
            "fullName",
            "Full name must contain only letters and spaces",
        ));
    }
    Ok(value)
}

fn username(value: Option<String>) -> Result<String, ValidationError> {
    let value = value
        .map(|v| v.trim().to_string())
        .ok_or_else(|| ValidationError::required("username"))?;
    check_length("username", "Username", &value, NAME_MIN, NAME_MAX)?;
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::new(
            "username",
            "Username must contain only letters, numbers, and underscores",
        ));
    }
    Ok(value)
}

fn email(value: Option<String>) -> Result<String, ValidationError> {
    let value = value
        .map(|v| v.trim().to_string())
        .ok_or_else(|| ValidationError::required("email"))?;
    if !is_valid_email(&value) {
        return Err(ValidationError::new("email", "Invalid email"));
    }
    Ok(value)
}

// Passwords are taken verbatim, no trimming.
fn password(value: Option<String>) -> Result<String, ValidationError> {
    let value = value.ok_or_else(|| ValidationError::required("password"))?;
    check_length("password", "Password", &value, PASSWORD_MIN, PASSWORD_MAX)?;
    Ok(value)
}

fn check_length(
    field: &'static str,
    label: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::new(
            field,
            format!("{} must be at least {} characters long", label, min),
        ));
    }
    if len > max {
        return Err(ValidationError::new(
            field,
            format!("{} must be at most {} characters long", label, max),
        ));
    }
    Ok(())
}

/// RFC 5322 address syntax, bare (no display name or domain literal), with
/// a dotted domain ending in an alphabetic TLD.
fn is_valid_email(value: &str) -> bool {
    let Ok(address) = EmailAddress::from_str(value) else {
        return false;
    };
    if address.email() != value {
        return false;
    }

    let domain = address.domain();
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));
    labels_ok && tld_ok
}
