use std::fmt;

#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    JsonParseError(serde_json::Error),
    ThreadSpawnError(std::io::Error),
    AlreadyInitialized
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IoError(error) => {
                write!(f, "I/O error: {}", error)
            }
            Error::JsonParseError(error) => {
                write!(f, "Failed to parse JSON: {}", error)
            }
            Error::ThreadSpawnError(error) => {
                write!(f, "Failed to spawn priority driver thread: {}", error)
            }
            Error::AlreadyInitialized => {
                write!(f, "ParamLib has already been initialized")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::JsonParseError(e)
    }
}
