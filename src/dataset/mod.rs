pub mod error;
pub mod filter;
pub mod grid;
pub mod reader;
