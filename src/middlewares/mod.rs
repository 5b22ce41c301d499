pub mod authenticate;

pub use authenticate::{MaybeCaller, authenticate_middleware, resolve_caller};
