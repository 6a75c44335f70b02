// src/lib.rs

//! eventsync library

pub mod error;
#[cfg(feature = "lambda")]
pub mod handler;
pub mod models;
pub mod pipeline;
pub mod reconcile;
pub mod services;
pub mod storage;
pub mod utils;
