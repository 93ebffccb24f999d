use std::io;

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] multer::Error),

    #[error("empty filename")]
    EmptyFileName,

    #[error("invalid value for {key}: {value:?}")]
    Config { key: &'static str, value: String },

    #[error("unable to start async runtime: {0}")]
    Runtime(io::Error),
}

pub type Result<T, E = SdkError> = std::result::Result<T, E>;
