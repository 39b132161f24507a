// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Deciding where a single file belongs, and putting it there.

use std::{
  fmt::{self, Display, Formatter},
  path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{
  config::{
    Config,
    constants::{UNKNOWN_DIR, UNSORTED_DIR},
  },
  date::{self, ResolvedDate},
  error::Result,
  exiftool::MetadataEngine,
  path::Parts,
  place::{Placement, Placer},
};

/// Groups outcomes are reported in, in the order they are reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
  Success,
  SuccessWithMetadataWrite,
  Unsorted,
  Unknown,
  Error,
}

impl Category {
  pub const ALL: [Category; 5] = [
    Category::Success,
    Category::SuccessWithMetadataWrite,
    Category::Unsorted,
    Category::Unknown,
    Category::Error,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Category::Success => "SUCCESS",
      Category::SuccessWithMetadataWrite => "SUCCESS_WITH_METADATA_WRITE",
      Category::Unsorted => "UNSORTED",
      Category::Unknown => "UNKNOWN",
      Category::Error => "ERROR",
    }
  }

  /// One line explanation, for the summary legend.
  pub fn description(self) -> &'static str {
    match self {
      Category::Success => "Sorted by a date from metadata.",
      Category::SuccessWithMetadataWrite => {
        "Sorted by a date from the file or directory name, which was written to the file."
      }
      Category::Unsorted => "Metadata was read, but no date was found.",
      Category::Unknown => "The file has no metadata, or its type is not organized.",
      Category::Error => "Could not be placed.",
    }
  }
}

impl Display for Category {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// What happened to one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
  Success(Placement),
  /// `warning` is set if writing the date back failed. The file is still
  /// placed.
  SuccessWithMetadataWrite {
    placement: Placement,
    warning:   Option<String>,
  },
  Unsorted(Placement),
  Unknown(Placement),
  Error {
    source:  PathBuf,
    message: String,
  },
}

impl Outcome {
  pub fn category(&self) -> Category {
    match self {
      Outcome::Success(_) => Category::Success,
      Outcome::SuccessWithMetadataWrite { .. } => Category::SuccessWithMetadataWrite,
      Outcome::Unsorted(_) => Category::Unsorted,
      Outcome::Unknown(_) => Category::Unknown,
      Outcome::Error { .. } => Category::Error,
    }
  }

  pub fn placement(&self) -> Option<&Placement> {
    match self {
      Outcome::Success(p)
      | Outcome::SuccessWithMetadataWrite { placement: p, .. }
      | Outcome::Unsorted(p)
      | Outcome::Unknown(p) => Some(p),
      Outcome::Error { .. } => None,
    }
  }

  pub fn source(&self) -> &Path {
    match self {
      Outcome::Error { source, .. } => source.as_path(),
      _ => self.placement().map_or(Path::new(""), |p| p.source.as_path()),
    }
  }

  pub fn destination(&self) -> Option<&Path> {
    self.placement().map(|p| p.destination.as_path())
  }

  /// Reports are ordered by destination; errors, having none, by source.
  pub fn sort_key(&self) -> &Path {
    self.destination().unwrap_or_else(|| self.source())
  }
}

/// Classifies and places files for one run.
pub struct Classifier<'a> {
  config: &'a Config,
  placer: Placer,
}

impl<'a> Classifier<'a> {
  pub fn new(config: &'a Config) -> Self {
    Self {
      config,
      placer: Placer::new(config.mode),
    }
  }

  /// Organizes `source`. Never fails: problems become [`Outcome::Error`].
  pub fn classify(&mut self, engine: &mut dyn MetadataEngine, source: &Path) -> Outcome {
    self
      .try_classify(engine, source)
      .unwrap_or_else(|e| {
        log::debug!("{}: {e}", source.display());
        Outcome::Error {
          source:  source.to_path_buf(),
          message: e.to_string(),
        }
      })
  }

  fn try_classify(&mut self, engine: &mut dyn MetadataEngine, source: &Path) -> Result<Outcome> {
    // The engine failing is not the same as the file having no metadata.
    let metadata = engine.read_metadata(source)?;

    if metadata.is_unreadable() {
      log::debug!("{}: No metadata.", source.display());
      return Ok(Outcome::Unknown(self.place_flat(source, UNKNOWN_DIR)?));
    }

    if !self.config.allows_extension(source) {
      log::debug!("{}: Extension not organized.", source.display());
      return Ok(Outcome::Unknown(self.place_flat(source, UNKNOWN_DIR)?));
    }

    let Some(date) = date::resolve(&metadata, source, &self.config.date_tags) else {
      log::debug!("{}: No date.", source.display());
      return Ok(Outcome::Unsorted(self.place_flat(source, UNSORTED_DIR)?));
    };
    log::debug!("{}: Dated {date}.", source.display());

    let desired = self
      .config
      .destination
      .join(date.dir_path())
      .join(format!("{}{}", date.file_stem(), Parts::of(source).ext));
    let placement = self.placer.place(source, &desired)?;

    let write_tag = self.config.write_tag().filter(|_| {
      !date.from_metadata() && self.config.write_metadata && self.placer.mode().is_real()
    });

    match write_tag {
      Some(tag) => {
        let warning = write_date(engine, &placement.destination, tag, &date);
        Ok(Outcome::SuccessWithMetadataWrite { placement, warning })
      }
      None => Ok(Outcome::Success(placement)),
    }
  }

  /// Places `source` directly in `bucket`, keeping its name.
  fn place_flat(&mut self, source: &Path, bucket: &str) -> Result<Placement> {
    let desired = self
      .config
      .destination
      .join(bucket)
      .join(source.file_name().unwrap_or_default());

    self.placer.place(source, &desired)
  }
}

/// Best effort. Returns the failure message, if any.
fn write_date(
  engine: &mut dyn MetadataEngine,
  file: &Path,
  tag: &str,
  date: &ResolvedDate,
) -> Option<String> {
  let value = date.exif_value();

  match engine.write_metadata(file, &[(tag, value.as_str())]) {
    Ok(()) => {
      log::debug!("{}: Wrote {tag} = {value}.", file.display());
      None
    }
    Err(e) => {
      log::warn!("{}: Failed to write {tag} ({e}).", file.display());
      Some(e.to_string())
    }
  }
}
