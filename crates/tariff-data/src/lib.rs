//! Data layer for the tariff dashboard.
//!
//! Reads the tariff and reference CSV files, filters normalised records by a
//! selection, buckets them into chart series, computes the grouped summary
//! table, and runs the top-level analysis pipeline.

pub mod aggregator;
pub mod analysis;
pub mod catalog;
pub mod filter;
pub mod reader;
pub mod summary;

pub use tariff_core as core;
