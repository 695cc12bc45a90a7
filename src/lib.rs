// src/lib.rs

//! Stargazer Watch Library
//!
//! Incrementally tracks who starred a GitHub repository: collects the
//! newest stargazers page by page until it reaches known ones, enriches
//! the new accounts with profile data, and reports them.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
