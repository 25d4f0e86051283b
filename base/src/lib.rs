pub mod defs;
pub mod fpx;
pub mod util;
