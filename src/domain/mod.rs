// Domain module - Shared types, configuration and errors
pub mod config;
pub mod credentials;
pub mod error;
