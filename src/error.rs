use thiserror::Error;

#[derive(Debug, Error)]
pub enum C3dError {
    #[error("Buffer too small at {file}:{line}: need at least {expected} bytes, got {actual}")]
    TooShortBuffer {
        actual:   usize,
        expected: usize,
        file:     &'static str,
        line:     u32,
    },

    #[error("Invalid parameter section key: expected 0x50, found {0:#04x}")]
    FileIdentifierError(u8),

    #[error("Unsupported processor type {0:#04x}: only Intel (0x54) files are handled")]
    UnsupportedProcessor(u8),

    #[error("Wrong path format {0:?} (use GROUP:PARAMETER)")]
    InvalidPath(String),

    #[error("Lifecycle violation: {0}")]
    Lifecycle(String),

    #[error("Parameter {path} has shape {expected}, cannot store {found}")]
    ShapeMismatch {
        path:     String,
        expected: String,
        found:    String,
    },

    #[error("Number of channels in data ({actual}) differs from the declared analog channel count ({expected})")]
    ChannelCountMismatch {
        expected: usize,
        actual:   usize,
    },

    #[error("Writer is not open")]
    NotOpen,

    #[error("Events are not enabled for this writer")]
    EventsDisabled,

    #[error("Invalid file handling")]
    IOError(#[from] std::io::Error),

    #[error("Block serialization error: {0}")]
    BlockSerializationError(String),

    #[error("Invalid writer configuration")]
    ConfigError(#[from] serde_json::Error),
}
