//! C3D writer module for c3d-rs
//!
//! The writer lays out the header block, the parameter directory and the
//! frame records sequentially, patching fixed-size records in place once
//! their final values are known.

pub mod c3d_writer;
pub mod config;
pub mod rewrite;

pub use c3d_writer::{C3dWriter, PointSample};
pub use config::WriterConfig;
