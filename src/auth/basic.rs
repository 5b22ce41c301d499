use axum::{extract::FromRequestParts, http::request::Parts};
use base64::{Engine, engine::general_purpose::STANDARD};
use secrecy::SecretString;

use crate::error::Error;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("Authorization header is missing")]
    Missing,
    #[error("Authorization header is not valid text")]
    Encoding,
    #[error("Authorization scheme must be Basic")]
    Scheme,
    #[error("Authorization credentials are not valid base64")]
    Base64,
    #[error("Authorization credentials must be formatted as username:password")]
    Separator,
    #[error("Authorization username must not contain control characters")]
    ControlCharacter,
}

/// Username and password taken from an `Authorization: Basic ...` header.
#[derive(Debug)]
pub struct BasicCredentials {
    pub username: String,
    pub password: SecretString,
}

/// Parses `Basic base64(username:password)`.
///
/// The decoded bytes are read as ISO-8859-1 and split on the first colon.
/// Usernames carrying control characters (NUL included) are rejected.
pub fn parse_basic_credentials(header: &str) -> Result<BasicCredentials, CredentialsError> {
    let (scheme, encoded) = header
        .trim()
        .split_once(' ')
        .ok_or(CredentialsError::Scheme)?;

    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(CredentialsError::Scheme);
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| CredentialsError::Base64)?;

    // Every byte maps to the code point of the same value in ISO-8859-1.
    let decoded: String = decoded.into_iter().map(char::from).collect();

    let (username, password) = decoded
        .split_once(':')
        .ok_or(CredentialsError::Separator)?;

    if username.chars().any(char::is_control) {
        return Err(CredentialsError::ControlCharacter);
    }

    Ok(BasicCredentials {
        username: username.to_string(),
        password: SecretString::from(password),
    })
}

impl<S> FromRequestParts<S> for BasicCredentials
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .ok_or(Error::Credentials(CredentialsError::Missing))?
            .to_str()
            .map_err(|_| Error::Credentials(CredentialsError::Encoding))?;

        parse_basic_credentials(header).map_err(Error::Credentials)
    }
}
