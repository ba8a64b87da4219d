pub mod command;
pub mod constants;
pub mod error;
pub mod header;
pub mod packet;
