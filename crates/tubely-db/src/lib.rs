//! Tubely metadata store
//!
//! Video records are reached through the [`VideoRepository`] trait so the HTTP layer and
//! the ingestion pipeline never depend on a concrete database.

pub mod db;

pub use db::{InMemoryVideoRepository, PgVideoRepository, VideoRepository, VideoRow};
