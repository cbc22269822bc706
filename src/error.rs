use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Zip error writing {}: {source}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Zip entry {name} in {} is not unique", path.display())]
    DuplicateEntry { path: PathBuf, name: String },

    #[error("{} is the staging directory and cannot hold an archived copy", path.display())]
    ReservedArtifact { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Aborted by user")]
    UserAborted,
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn zip(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Zip {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
