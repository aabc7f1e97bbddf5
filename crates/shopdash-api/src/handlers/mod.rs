//! HTTP request handlers organized by domain.

pub mod analytics;
pub mod auth;
pub mod crud;
pub mod export;
pub mod health;
pub mod screen;
pub mod tables;
