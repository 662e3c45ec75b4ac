// SDG Social Platform - Scoring Core
//
// This crate provides the event-driven pipeline that moderates and scores
// SDG post images uploaded to the platform's storage bucket.
//
// Architecture: trait-injected infrastructure in kernel/, business logic in
// domains/, HTTP surface (upload-notification webhook) in server/.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
