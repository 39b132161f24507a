// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Splitting a path into directory, base name and extension, and putting it
//! back together with some of those parts replaced.

use std::path::{Path, PathBuf};

/// The parts of a file path. `ext` includes the leading `.`, or is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Parts {
  pub dir:  PathBuf,
  pub base: String,
  pub ext:  String,
}

/// Replacement values for any subset of [`Parts`]. `None` keeps the original.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartsOverride {
  pub dir:  Option<PathBuf>,
  pub base: Option<String>,
  pub ext:  Option<String>,
}

impl Parts {
  /// Decomposes `path`. Names that are not valid UTF-8 are converted lossily.
  pub fn of(path: impl AsRef<Path>) -> Self {
    let path = path.as_ref();

    Self {
      dir:  path.parent().map(Path::to_path_buf).unwrap_or_default(),
      base: path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default(),
      ext:  path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default(),
    }
  }

  /// File name, i.e. `base` followed by `ext`.
  pub fn file_name(&self) -> String {
    format!("{}{}", self.base, self.ext)
  }

  pub fn to_path(&self) -> PathBuf {
    self.dir.join(self.file_name())
  }

  fn apply(self, changes: PartsOverride) -> Self {
    Self {
      dir:  changes.dir.unwrap_or(self.dir),
      base: changes.base.unwrap_or(self.base),
      ext:  changes.ext.unwrap_or(self.ext),
    }
  }
}

/// Builds a new path from `path` by applying the overrides returned by `f`.
pub fn transform(path: impl AsRef<Path>, f: impl FnOnce(&Parts) -> PartsOverride) -> PathBuf {
  let parts = Parts::of(path);
  let changes = f(&parts);
  parts.apply(changes).to_path()
}

#[cfg(test)]
mod test_parts {
  use super::*;

  #[test]
  fn splits_dir_base_and_ext() {
    let p = Parts::of("/photos/2016/IMG_0415.JPG");

    assert_eq!(p.dir, PathBuf::from("/photos/2016"));
    assert_eq!(p.base, "IMG_0415");
    assert_eq!(p.ext, ".JPG");
  }

  #[test]
  fn no_extension_is_empty() {
    let p = Parts::of("dir/README");

    assert_eq!(p.base, "README");
    assert_eq!(p.ext, "");
  }

  #[test]
  fn dot_file_has_no_extension() {
    let p = Parts::of("dir/.profile");

    assert_eq!(p.base, ".profile");
    assert_eq!(p.ext, "");
  }

  #[test]
  fn only_last_extension_is_split() {
    let p = Parts::of("a/b.tar.gz");

    assert_eq!(p.base, "b.tar");
    assert_eq!(p.ext, ".gz");
  }

  #[test]
  fn bare_file_name_has_empty_dir() {
    let p = Parts::of("x.png");

    assert_eq!(p.dir, PathBuf::new());
    assert_eq!(p.to_path(), PathBuf::from("x.png"));
  }
}
