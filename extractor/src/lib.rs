// This file makes `extractor` into a rust library crate.

// It is useful for debugging.
// The file `main.rs` still exists to make `extractor` into an executable.

pub mod export_to_json;
pub mod extract;
pub mod extract_all;
pub mod import_obj;
pub mod import_ply;
pub mod mesh;
pub mod misc;
pub mod sampling;
pub mod texture_store;

pub use base;
pub use base::fpx;
