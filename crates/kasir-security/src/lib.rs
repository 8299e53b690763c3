//! # Kasir Security
//!
//! Password hashing and temporary credential generation.

pub mod password;

pub use password::{PasswordError, PasswordService};
