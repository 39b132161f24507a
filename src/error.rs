// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Error type shared by every stage of an organize run.

use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  /// A file system operation failed on `path`.
  #[error("{}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  /// `ExifTool` could not be started, talked to, or reported a failure.
  #[error("ExifTool: {0}")]
  ExifTool(String),

  #[error("JSON: {0}")]
  Json(#[from] serde_json::Error),

  /// The Ctrl-C handler could not be installed.
  #[error("Signal handler: {0}")]
  Signal(#[from] ctrlc::Error),

  /// Invalid arguments or options.
  #[error("Invalid configuration: {0}")]
  Config(String),
}

impl Error {
  /// Wraps an `io::Error` with the path it happened on.
  pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}
