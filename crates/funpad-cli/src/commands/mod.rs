pub mod admin;
pub mod common;
pub mod query;
pub mod trade;
