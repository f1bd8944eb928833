pub mod appender;
pub mod error;
