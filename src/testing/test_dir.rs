// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Helper for setting up test directories with source files and their
//! (simulated) metadata.

use std::{
  collections::{HashMap, HashSet, VecDeque},
  env,
  fs,
  path::{Path, PathBuf},
  sync::LazyLock,
};

use super::FakeEngine;
use crate::metadata::Metadata;

static TEST_ROOT: LazyLock<PathBuf> =
  LazyLock::new(|| env::temp_dir().join(format!("{}_tests", env!("CARGO_PKG_NAME"))));

/// Helper for creating directories for tests needing actual files.
///
/// Files are created under `src/`; organizing is expected to write to
/// `dest/`, which is not created up front.
pub struct TestDir {
  root:     PathBuf,
  metadata: HashMap<PathBuf, Metadata>,
}

impl TestDir {
  /// Creates a new directory under `TEST_ROOT` for tests involving file
  /// operations. Note: Prefer using `test_dir!()` macro.
  pub fn new(
    test_path: PathBuf,
    files: Vec<(&'static str, HashMap<&'static str, &'static str>)>,
  ) -> Self {
    let root_rel = TEST_ROOT.join(test_path);
    if root_rel.exists() {
      fs::remove_dir_all(&root_rel).unwrap();
    }
    fs::create_dir_all(root_rel.join("src")).unwrap();

    let root = root_rel.canonicalize().unwrap();

    let mut metadata = HashMap::new();
    for (file, tags) in files {
      let path = create_file(&root.join("src"), file);
      metadata.insert(path.clone(), make_metadata(&path, &tags));
    }

    Self { root, metadata }
  }

  /// A metadata engine answering with the tags each file was created with.
  pub fn engine(&self) -> FakeEngine {
    FakeEngine::new(self.metadata.clone())
  }

  /// All files under `dest/`.
  pub fn files_dest(&self) -> HashSet<PathBuf> {
    traverse_dir(self.dest())
  }

  /// All files under `src/`.
  pub fn files_src(&self) -> HashSet<PathBuf> {
    traverse_dir(self.src())
  }

  pub fn get_dest(&self, file: impl AsRef<Path>) -> PathBuf {
    self.dest().join(file)
  }

  pub fn get_path(&self, file: impl AsRef<Path>) -> PathBuf {
    self.src().join(file)
  }

  pub fn dest(&self) -> PathBuf {
    self.root.join("dest")
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn src(&self) -> PathBuf {
    self.root.join("src")
  }
}

impl Drop for TestDir {
  /// Removes the test directory once finished.
  fn drop(&mut self) {
    let _ = fs::remove_dir_all(&self.root);
  }
}

/// Creates `path` under `dir`, with its own relative path as contents so
/// copies can be told apart.
fn create_file(dir: &Path, path: &str) -> PathBuf {
  let full_path = dir.join(path);

  assert!(!full_path.exists(), "File already exists: {full_path:?}");
  fs::create_dir_all(full_path.parent().unwrap()).unwrap();
  fs::write(&full_path, path).unwrap();

  full_path
}

/// Every readable file gets the tags `ExifTool` always reports. An empty
/// `"Error"` tag instead marks the file as unreadable (no metadata at all).
fn make_metadata(path: &Path, tags: &HashMap<&str, &str>) -> Metadata {
  if tags.get("Error") == Some(&"") {
    return Metadata::default();
  }

  let file_name = path.file_name().unwrap().to_str().unwrap();
  let directory = path.parent().unwrap().to_str().unwrap();

  [
    ("SourceFile", path.to_str().unwrap()),
    ("FileName", file_name),
    ("Directory", directory),
  ]
  .into_iter()
  .chain(tags.iter().map(|(k, v)| (*k, *v)))
  .collect()
}

fn traverse_dir(root: impl AsRef<Path>) -> HashSet<PathBuf> {
  let mut dirs = VecDeque::from([root.as_ref().to_owned()]);
  let mut files = HashSet::new();

  if !root.as_ref().exists() {
    return files;
  }

  while let Some(dir) = dirs.pop_front() {
    for entry in fs::read_dir(dir).unwrap().map(Result::unwrap) {
      let file_type = entry.file_type().unwrap();
      if file_type.is_dir() {
        dirs.push_back(entry.path());
      } else if file_type.is_file() {
        files.insert(entry.path());
      } else {
        panic!("Unexpected file type: {file_type:?}");
      }
    }
  }

  files
}

#[macro_export]
macro_rules! test_path {
  () => {{
    // HACK: Get module hierarchy for caller.
    let mut function = $crate::testing::type_of(|| ()).rsplit("::");
    // 0th element is `{closure}`.
    let case = function.nth(1).unwrap();
    let suite = function.next().unwrap();
    let module = function.next().unwrap();

    std::path::PathBuf::from(format!("{module}/{suite}/{case}"))
  }};
}

#[macro_export]
macro_rules! test_dir {
  ($($file:literal: {$($key:literal: $value:literal),* $(,)?}),* $(,)?) => {{
    let files = vec![
      $(($file, std::collections::HashMap::from([$(($key, $value)),*]))),*
    ];
    TestDir::new(test_path!(), files)
  }};
}
