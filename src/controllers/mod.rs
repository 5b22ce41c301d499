pub mod account;
pub mod home;
