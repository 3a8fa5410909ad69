pub mod blocks;
pub mod error;
pub mod event;
pub mod parameters;
pub mod writer;

pub mod parsing {
    pub mod c3d_file;
    pub mod decoder;
}

pub use blocks::parameter_block::ParameterValue;
pub use error::C3dError;
pub use event::{C3dEvent, EventContext};
pub use parsing::c3d_file::C3dReader;
pub use writer::{C3dWriter, PointSample, WriterConfig};
