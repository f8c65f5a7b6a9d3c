//! Input rules shared by the server handlers and any client that wants to
//! pre-check a form before submitting it.

use std::sync::LazyLock;

use regex::Regex;

use crate::api::RegisterForm;
use crate::domain::{MAX_RATING, MIN_AGE, MIN_PASSWORD_LEN, MIN_RATING};

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name, email, password, and age are required")]
    MissingRegistrationFields,
    #[error("Age must be at least 13 years old")]
    AgeTooLow,
    #[error("Please provide a valid email address")]
    InvalidEmail,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,
    #[error("Reward points must be a non-negative number")]
    NegativeReward,
    #[error("Time limit must be a positive number (in minutes)")]
    InvalidTimeLimit,
    #[error("Passing score must be between 0 and 100")]
    PassingScoreOutOfRange,
    #[error("Invalid status. Must be: active, inactive, or archived")]
    InvalidStatus,
    #[error("At least one field is required to update")]
    EmptyUpdate,
    #[error("{0}")]
    Other(String),
}

/// A registration form that passed every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: i32,
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Checks run in the same order the registration page reports them: required
/// fields, age, email format, confirmation match, password length.
pub fn validate_registration(form: &RegisterForm) -> Result<NewAccount, ValidationError> {
    let (Some(name), Some(email), Some(age)) = (
        present(&form.name),
        present(&form.email),
        present(&form.age),
    ) else {
        return Err(ValidationError::MissingRegistrationFields);
    };
    let password = form.password.as_deref().unwrap_or_default();
    let confirm = form.password_confirm.as_deref().unwrap_or_default();
    if password.is_empty() || confirm.is_empty() {
        return Err(ValidationError::MissingRegistrationFields);
    }
    let age = parse_age(age)?;
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(NewAccount {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        age,
    })
}

pub fn parse_age(raw: &str) -> Result<i32, ValidationError> {
    let age = raw
        .trim()
        .parse::<i32>()
        .map_err(|_| ValidationError::AgeTooLow)?;
    validate_age(age)?;
    Ok(age)
}

pub fn validate_age(age: i32) -> Result<(), ValidationError> {
    if age < MIN_AGE {
        Err(ValidationError::AgeTooLow)
    } else {
        Ok(())
    }
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

pub fn validate_rating(rating: i32) -> Result<(), ValidationError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(ValidationError::RatingOutOfRange)
    }
}

pub fn validate_reward_points(points: i32) -> Result<(), ValidationError> {
    if points < 0 {
        Err(ValidationError::NegativeReward)
    } else {
        Ok(())
    }
}

pub fn validate_time_limit(minutes: i32) -> Result<(), ValidationError> {
    if minutes <= 0 {
        Err(ValidationError::InvalidTimeLimit)
    } else {
        Ok(())
    }
}

pub fn validate_passing_score(score: i32) -> Result<(), ValidationError> {
    if (0..=100).contains(&score) {
        Ok(())
    } else {
        Err(ValidationError::PassingScoreOutOfRange)
    }
}
