// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Settings for a single organize run.

use std::path::{Path, PathBuf};

use crate::{
  error::{Error, Result},
  path::Parts,
  place::Mode,
};

pub mod constants;

/// How a file gets to its destination in real mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Operation {
  #[default]
  Copy,
  Move,
}

#[derive(Clone, Debug)]
pub struct Config {
  pub source:         PathBuf,
  pub destination:    PathBuf,
  /// Lowercase, without the leading `.`. Empty allows every extension.
  pub extensions:     Vec<String>,
  /// Never empty after `validate`.
  pub date_tags:      Vec<String>,
  pub mode:           Mode,
  /// Write guessed dates back into the organized file (real mode only).
  pub write_metadata: bool,
  /// Name of the device being imported, for the last-file summary.
  pub device:         Option<String>,
}

impl Config {
  /// Dry run from `source` to `destination` with default extensions and tags.
  pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
    let mut config = Self {
      source:         source.into(),
      destination:    destination.into(),
      extensions:     Vec::new(),
      date_tags:      Vec::new(),
      mode:           Mode::DryRun,
      write_metadata: true,
      device:         None,
    };
    config.set_extensions(constants::DEFAULT_EXTENSIONS);
    config.set_date_tags(constants::DEFAULT_DATE_TAGS);
    config
  }

  /// Lowercases and strips any leading `.`. Duplicates are dropped.
  pub fn set_extensions<S: AsRef<str>>(&mut self, extensions: impl IntoIterator<Item = S>) {
    self.extensions = dedup(
      extensions
        .into_iter()
        .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty()),
    );
  }

  /// Duplicates are dropped, keeping the first occurrence's position.
  pub fn set_date_tags<S: AsRef<str>>(&mut self, tags: impl IntoIterator<Item = S>) {
    self.date_tags = dedup(
      tags
        .into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty()),
    );
  }

  /// Whether `file`'s extension is one to organize by date (case-insensitive).
  pub fn allows_extension(&self, file: &Path) -> bool {
    if self.extensions.is_empty() {
      return true;
    }

    let ext = Parts::of(file).ext.trim_start_matches('.').to_lowercase();
    !ext.is_empty() && self.extensions.contains(&ext)
  }

  pub fn validate(&self) -> Result<()> {
    if !self.source.is_dir() {
      return Err(Error::Config(format!(
        "{}: Source is not a directory.",
        self.source.display()
      )));
    }
    if self.destination.as_os_str().is_empty() {
      return Err(Error::Config("Destination is empty.".to_string()));
    }
    if self.date_tags.is_empty() {
      return Err(Error::Config("At least one date tag is required.".to_string()));
    }
    if let Some(device) = &self.device {
      if device.is_empty() || device.starts_with('.') || device.contains(['/', '\\']) {
        return Err(Error::Config(format!("Invalid device name: \"{device}\"")));
      }
    }
    Ok(())
  }

  /// The date tag written back into files whose date was guessed.
  pub fn write_tag(&self) -> Option<&str> {
    self.date_tags.first().map(String::as_str)
  }
}

fn dedup(values: impl Iterator<Item = String>) -> Vec<String> {
  let mut unique = Vec::new();
  for v in values {
    if !unique.contains(&v) {
      unique.push(v);
    }
  }
  unique
}
