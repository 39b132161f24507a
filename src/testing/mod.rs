// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Test-only utilities.

mod asserts;
mod test_dir;

use std::{
  collections::{HashMap, HashSet},
  path::{Path, PathBuf},
};

pub use test_dir::*;

use crate::{
  error::{Error, Result},
  exiftool::MetadataEngine,
  metadata::Metadata,
};
pub use crate::{assert_dir, assert_err, test_dir, test_path};

pub fn type_of<T>(_: T) -> &'static str {
  std::any::type_name::<T>()
}

/// In-memory stand-in for `ExifTool`.
#[derive(Default)]
pub struct FakeEngine {
  files:       HashMap<PathBuf, Metadata>,
  fail_reads:  HashSet<PathBuf>,
  fail_writes: bool,
  pub writes:  Vec<(PathBuf, Vec<(String, String)>)>,
  pub reads:   usize,
}

impl FakeEngine {
  pub fn new(files: HashMap<PathBuf, Metadata>) -> Self {
    Self {
      files,
      ..Default::default()
    }
  }

  /// Makes reading `file` return an error.
  pub fn fail_read(&mut self, file: impl AsRef<Path>) {
    self.fail_reads.insert(file.as_ref().to_path_buf());
  }

  /// Makes every write return an error.
  pub fn fail_writes(&mut self) {
    self.fail_writes = true;
  }
}

impl MetadataEngine for FakeEngine {
  fn read_metadata(&mut self, file: &Path) -> Result<Metadata> {
    self.reads += 1;
    if self.fail_reads.contains(file) {
      return Err(Error::ExifTool(format!("{}: read failed", file.display())));
    }
    Ok(self.files.get(file).cloned().unwrap_or_default())
  }

  fn write_metadata(&mut self, file: &Path, tags: &[(&str, &str)]) -> Result<()> {
    if self.fail_writes {
      return Err(Error::ExifTool(format!("{}: Failed to write metadata.", file.display())));
    }
    self.writes.push((
      file.to_path_buf(),
      tags
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect(),
    ));
    Ok(())
  }

  fn close(&mut self) -> Result<()> {
    Ok(())
  }
}
