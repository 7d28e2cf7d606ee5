//! Command handlers

pub mod bookmark;
pub mod config;
pub mod export;
pub mod sync;
pub mod tag;
