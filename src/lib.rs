pub mod advisor;
pub mod api;
pub mod config;
pub mod crash;
pub mod error;
pub mod geo;
pub mod geocode;
pub mod request;
pub mod scoring;
pub mod state;
