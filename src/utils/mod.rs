//! Utility functions for clipfetch

pub mod url;

pub use url::*;
