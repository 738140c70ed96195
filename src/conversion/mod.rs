pub mod common;
pub mod converter;
pub mod error;
pub mod record;
