//! Domain types for the TD Sequential engine.

pub mod bar;

pub use bar::Bar;
