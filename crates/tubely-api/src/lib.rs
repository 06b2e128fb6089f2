//! Tubely API Library
//!
//! HTTP handlers, authentication, thumbnail assets and application setup around the
//! video ingestion pipeline.

mod api_doc;
pub mod assets;
pub mod auth;
pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use assets::AssetStore;
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
