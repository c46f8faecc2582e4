// Record Store: one JSON document per user key under the data root.
// Writes go through a same-directory temp file and an atomic rename.

pub mod json_store;

pub use json_store::{JsonStore, StoreError};
