//! Command implementations that don't need an open store.

pub mod init;
