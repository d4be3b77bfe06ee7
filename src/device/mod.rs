pub mod connection;
pub mod constants;
pub mod decoder;
pub mod sample;
pub mod source;
