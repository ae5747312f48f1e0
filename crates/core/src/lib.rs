//! Domain types shared by the stepwire crates.

pub mod domain;

pub use domain::*;
