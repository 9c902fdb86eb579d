//! ZapManejo backend
//!
//! Livestock management records (animals, health events, payments) over
//! HTTP, backed by PostgreSQL, with JWT auth and a WhatsApp webhook.
//! Startup validates the environment, opens the pool, reconciles the schema
//! and seeds reference data before the listener comes up.

pub mod app_state;
pub mod config;
pub mod cors;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
