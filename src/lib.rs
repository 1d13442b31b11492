//! Campusbeat - backend for a college community news platform
//!
//! This library provides the core functionality for the Campusbeat service.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod realtime;
pub mod services;
