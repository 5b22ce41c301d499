use anyhow::Context;
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

use super::error::AuthError;

/// Verified in place of a stored hash when the user does not exist, so that
/// unknown names cost as much argon2 work as wrong passwords.
pub const UNKNOWN_USER_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=15000,t=2,p=1$PJ7Ng0X+XP5U90x/CBFAKg$o5FQg0RYBq/PkOLnJ2qIrnbrkUsUS2/48Bo0S26dfcw";

#[tracing::instrument(name = "compute password hash", skip_all)]
pub fn compute_password_hash(password: SecretString) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params::new(15000, 2, 1, None)
        .context("argon2 parameters")
        .map_err(Error::Other)?;

    let password_hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|e| Error::Auth(AuthError::PasswordError(e)))?
        .to_string();

    Ok(password_hash)
}

/// Parameters are read back from the PHC string, so hashes made with older
/// settings still verify.
///
/// A wrong password is `AuthError::IncorrectCredential`. An unreadable hash is
/// `AuthError::PasswordError`.
#[tracing::instrument(name = "verify password hash", skip_all)]
pub fn verify_password_hash(password_hashed: String, password: SecretString) -> Result<(), Error> {
    let expected_password_hash = PasswordHash::new(&password_hashed)
        .map_err(|e| Error::Auth(AuthError::PasswordError(e)))?;

    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &expected_password_hash)
        .map_err(|e| match e {
            argon2::password_hash::Error::Password => Error::Auth(AuthError::IncorrectCredential),
            e => Error::Auth(AuthError::PasswordError(e)),
        })
}
