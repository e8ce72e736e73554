//! HTTP request handlers
//!
//! This module organizes all API handlers into logical groups:
//! - `api` - Health check and credit balance endpoints
//! - `cast` - Cast roster management
//! - `generation` - Audio generation at block, chapter and project scope

pub mod api;
pub mod cast;
pub mod generation;
