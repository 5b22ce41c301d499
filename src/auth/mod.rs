pub mod basic;
pub mod error;
pub mod jwt;
pub mod password;
pub mod policy;
pub mod session;

pub use basic::{BasicCredentials, parse_basic_credentials};
pub use jwt::{Claims, decode_jwt, encode_jwt};
pub use password::{compute_password_hash, verify_password_hash};
