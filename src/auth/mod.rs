pub mod api_secret;
pub mod context;

// Re-export commonly used items
pub use api_secret::match_api_secret_id;
pub use context::Principal;
