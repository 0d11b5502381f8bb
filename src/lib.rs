//! Authentication and session core for the chirp service
//!
//! Password hashing, signed access tokens, revocable refresh tokens and
//! request credential extraction.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;
pub mod telemetry;
