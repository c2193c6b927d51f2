/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, me)
/// - `tasks`: Task CRUD, toggle and export
/// - `analytics`: Per-user summary statistics
/// - `admin`: User administration (admin key required)

pub mod health;
pub mod auth;
pub mod tasks;
pub mod analytics;
pub mod admin;
