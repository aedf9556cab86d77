//! HTTP request handlers.

pub mod classify;
pub mod columns;
pub mod health;
