// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Tag name to value mapping, as read from a single file by `ExifTool`.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::Result;

/// Tag `ExifTool` sets when it could not read a file.
const TAG_ERROR: &str = "Error";

/// Metadata for one file. Names are from `ExifTool`'s tags:
/// <https://exiftool.org/TagNames/>.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata(HashMap<String, String>);

impl Metadata {
  /// Gets the value of `tag`, if present and not empty.
  pub fn get(&self, tag: &str) -> Option<&str> {
    self
      .0
      .get(tag)
      .map(String::as_str)
      .filter(|v| !v.trim().is_empty())
  }

  /// True if nothing was read, or `ExifTool` reported an error for the file.
  pub fn is_unreadable(&self) -> bool {
    self.0.is_empty() || self.get(TAG_ERROR).is_some()
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

/// Parses `ExifTool`'s `-json` output into one [`Metadata`] per file.
///
/// Values are flattened to strings: numbers and booleans use their JSON
/// representation, nested values their compact JSON text.
pub fn parse_vec(metadata: impl AsRef<[u8]>) -> Result<Vec<Metadata>> {
  // `serde_json` doesn't handle the empty case.
  if metadata.as_ref().iter().all(u8::is_ascii_whitespace) {
    return Ok(Vec::new());
  }

  let files: Vec<HashMap<String, Value>> = serde_json::from_slice(metadata.as_ref())?;

  Ok(
    files
      .into_iter()
      .map(|tags| {
        tags
          .into_iter()
          .map(|(k, v)| (k, value_to_string(v)))
          .collect()
      })
      .collect(),
  )
}

fn value_to_string(value: Value) -> String {
  match value {
    Value::String(s) => s,
    Value::Null => String::new(),
    other => other.to_string(),
  }
}
