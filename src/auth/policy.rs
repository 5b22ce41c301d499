use std::{borrow::Cow, collections::HashSet};

use secrecy::{ExposeSecret, SecretString};
use validator::{ValidateLength, ValidationError, ValidationErrors};

/// Rules a new account must satisfy before the store accepts it.
#[derive(serde::Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct IdentityPolicy {
    pub password: PasswordPolicy,
    pub username: UserNamePolicy,
}

#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PasswordPolicy {
    pub required_length: u64,
    pub required_unique_chars: usize,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_non_alphanumeric: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            required_length: 6,
            required_unique_chars: 1,
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
            require_non_alphanumeric: true,
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct UserNamePolicy {
    pub max_length: u64,
    /// Empty means any character is allowed.
    pub allowed_characters: String,
}

impl Default for UserNamePolicy {
    fn default() -> Self {
        Self {
            max_length: 256,
            allowed_characters:
                "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-._@+".to_string(),
        }
    }
}

impl IdentityPolicy {
    #[tracing::instrument(name = "validate new user", skip_all)]
    pub fn validate(&self, username: &str, password: &SecretString) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        self.username.validate(username, &mut errors);
        self.password.validate(password.expose_secret(), &mut errors);

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

impl UserNamePolicy {
    fn validate(&self, username: &str, errors: &mut ValidationErrors) {
        if !username.validate_length(Some(1), Some(self.max_length), None) {
            errors.add(
                "username",
                ValidationError::new("username_length").with_message(Cow::from(format!(
                    "Username length must be between 1 and {}",
                    self.max_length
                ))),
            );
        }

        if !self.allowed_characters.is_empty()
            && username.chars().any(|c| !self.allowed_characters.contains(c))
        {
            errors.add(
                "username",
                ValidationError::new("username_characters")
                    .with_message(Cow::from("Username contains characters that are not allowed")),
            );
        }
    }
}

impl PasswordPolicy {
    fn validate(&self, password: &str, errors: &mut ValidationErrors) {
        if !password.validate_length(Some(self.required_length), None, None) {
            errors.add(
                "password",
                ValidationError::new("password_length").with_message(Cow::from(format!(
                    "Password must be at least {} characters",
                    self.required_length
                ))),
            );
        }

        let unique_chars = password.chars().collect::<HashSet<_>>().len();
        if unique_chars < self.required_unique_chars {
            errors.add(
                "password",
                ValidationError::new("password_unique_chars").with_message(Cow::from(format!(
                    "Password must use at least {} different characters",
                    self.required_unique_chars
                ))),
            );
        }

        let rules: [(bool, fn(char) -> bool, &'static str, &'static str); 4] = [
            (
                self.require_digit,
                |c| c.is_ascii_digit(),
                "password_requires_digit",
                "Password must contain a digit",
            ),
            (
                self.require_lowercase,
                |c| c.is_ascii_lowercase(),
                "password_requires_lower",
                "Password must contain a lowercase letter",
            ),
            (
                self.require_uppercase,
                |c| c.is_ascii_uppercase(),
                "password_requires_upper",
                "Password must contain an uppercase letter",
            ),
            (
                self.require_non_alphanumeric,
                |c| !c.is_ascii_alphanumeric(),
                "password_requires_non_alphanumeric",
                "Password must contain a non-alphanumeric character",
            ),
        ];

        for (required, predicate, code, message) in rules {
            if required && !password.chars().any(predicate) {
                errors.add(
                    "password",
                    ValidationError::new(code).with_message(Cow::from(message)),
                );
            }
        }
    }
}
