//! Route modules for the blob store server

pub mod files;
pub mod health;
