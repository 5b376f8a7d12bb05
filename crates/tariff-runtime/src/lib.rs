//! Runtime layer for the tariff dashboard.
//!
//! Loads the datasets once, asynchronously, and drives filter selections
//! through a [`session::DashboardSession`].

pub mod data_manager;
pub mod session;

pub use tariff_core as core;
pub use tariff_data as data;
