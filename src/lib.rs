//! Clash of Clans Clan Viewer Library
//!
//! This module exposes the API, cache, and data layers for use in
//! integration tests.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
