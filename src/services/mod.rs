//! Service layer for image I/O
//!
//! Separates file and codec handling from the editing logic.

pub mod io;

pub use io::ImageIOService;
