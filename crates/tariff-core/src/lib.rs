//! Core types for the tariff dashboard.
//!
//! Record and filter models, the row normalizer that turns loosely-typed CSV
//! rows into [`models::TariffRecord`]s, date handling, display formatting,
//! command-line settings and the shared error type.

pub mod error;
pub mod formatting;
pub mod models;
pub mod normalizer;
pub mod settings;
pub mod time_utils;

pub use error::{Result, TariffError};
