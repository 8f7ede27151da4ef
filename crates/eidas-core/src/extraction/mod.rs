//! Recursive extraction of nested containers.

mod engine;

pub use engine::ExtractionEngine;
