//! AI Registry - a catalog and registry service for AI modules
//!
//! This library provides the core functionality: users register AI
//! modules with metadata, tags, publications and files; visitors browse,
//! filter and export them; administrators moderate submissions.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
