//! HTTP middleware: authentication extractors, error mapping, rate
//! limiting.

pub mod auth;
pub mod error;
pub mod rate_limit;
