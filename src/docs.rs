//! Guides for using this crate.

pub mod getting_started;
