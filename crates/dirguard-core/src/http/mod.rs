//! HTTP clients for the GitHub REST API and GitHub Models

pub mod client;
pub mod models;

pub use client::{parse_next_link, GitHubApiClient};
pub use models::ModelsClient;
