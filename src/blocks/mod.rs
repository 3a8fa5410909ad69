// src/blocks/mod.rs
pub mod common;
pub mod header_block;
pub mod parameter_block;
