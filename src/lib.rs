//! SkillForge learning platform API.
//!
//! Accounts with role-based access, a course catalogue, enrollments with
//! progress tracking, per-role dashboards, an activity audit log and a
//! Gemini-backed analysis endpoint, served over axum on PostgreSQL.

pub mod auth;
pub mod core;
pub mod dashboards;
pub mod directory;
pub mod learn;
pub mod llm;
pub mod main_module;
pub mod security;

pub use crate::core::config::AppConfig;
pub use crate::core::error::{ApiError, ApiResult};
pub use crate::core::shared::state::AppState;
pub use crate::main_module::{build_router, run_server};
