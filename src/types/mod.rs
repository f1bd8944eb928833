pub mod identifier;
pub mod request;
pub mod resolution;
pub mod run;
