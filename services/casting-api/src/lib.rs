//! Casting agency HTTP service library crate.
//!
//! # Purpose
//! Exposes the movie and actor API, the per-route authorization guard,
//! configuration, and storage backends for use by the binary and tests.
//!
//! # Notes
//! Token handling itself lives in `casting-authz`; this crate only decides
//! which permission each route needs and how rejections are rendered.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod model;
pub mod observability;
pub mod store;
