//! Core types shared across the crate.

mod signed_item;

pub use signed_item::SignedItem;
