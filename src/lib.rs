//! Core library for the ISMS-P compliance tracker.
//!
//! The checklist catalog is read from the standard's workbook by
//! [`io::excel_read`], per-round status lives in the SQLite-backed
//! [`store::StatusStore`], and [`reconcile::Tracker`] joins the two. Reports
//! are laid out by [`report`] and drawn by [`io::pdf`]; [`server`] exposes all
//! of it over HTTP.

pub mod config;
pub mod error;
pub mod export;
pub mod io;
pub mod model;
pub mod reconcile;
pub mod report;
pub mod server;
pub mod store;

pub use error::{Result, ToolError};
