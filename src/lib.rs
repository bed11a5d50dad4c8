//! Plugin Metrics - plugin usage telemetry backend
//!
//! Stores per-plugin server installations and hourly timelines, and serves
//! the joined servers/players coverage over HTTP.
//!
//! # Architecture
//! - `storage`: SeaORM backend and the plugin-scoped accessor
//! - `services`: coverage window, validation and timeline join
//! - `api`: actix-web handlers (coverage endpoint, health probes)
//! - `config`: TOML + environment configuration
//! - `runtime`: startup, server mode and shutdown
//! - `system`: logging setup

pub mod api;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
