// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Organizing a whole source tree, one file at a time.

use std::{
  collections::BTreeMap,
  fs,
  path::{Path, PathBuf},
  sync::atomic::{AtomicBool, Ordering},
};

use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

use crate::{
  classify::{Category, Classifier, Outcome},
  config::{Config, constants::DEVICES_DIR},
  error::{Error, Result},
  exiftool::MetadataEngine,
};

/// Every outcome of a run, grouped by category. Each group is sorted by
/// destination (source for errors) once the run completes.
#[derive(Debug, Default)]
pub struct Report {
  groups:      BTreeMap<Category, Vec<Outcome>>,
  interrupted: bool,
}

impl Report {
  fn add(&mut self, outcome: Outcome) {
    self.groups.entry(outcome.category()).or_default().push(outcome);
  }

  fn sort(&mut self) {
    for outcomes in self.groups.values_mut() {
      outcomes.sort_by(|a, b| a.sort_key().as_os_str().cmp(b.sort_key().as_os_str()));
    }
  }

  pub fn get(&self, category: Category) -> &[Outcome] {
    self.groups.get(&category).map(Vec::as_slice).unwrap_or_default()
  }

  /// Non-empty groups, in [`Category`] order.
  pub fn groups(&self) -> impl Iterator<Item = (Category, &[Outcome])> {
    self
      .groups
      .iter()
      .filter(|(_, o)| !o.is_empty())
      .map(|(c, o)| (*c, o.as_slice()))
  }

  /// Total number of files handled.
  pub fn len(&self) -> usize {
    self.groups.values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Whether the run was stopped before every file was handled.
  pub fn interrupted(&self) -> bool {
    self.interrupted
  }

  /// The last file of each non-empty group.
  pub fn last_files(&self) -> LastFiles {
    LastFiles(
      self
        .groups()
        .filter_map(|(c, outcomes)| Some((c, LastFile::of(outcomes.last()?))))
        .collect(),
    )
  }
}

/// File names of the last file in each category, e.g. to see where a previous
/// import from a device stopped.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct LastFiles(pub BTreeMap<Category, LastFile>);

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct LastFile {
  pub source:      String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub destination: Option<String>,
}

impl LastFile {
  fn of(outcome: &Outcome) -> Self {
    let name = |p: &Path| {
      p.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
    };

    Self {
      source:      name(outcome.source()),
      destination: outcome.destination().map(name),
    }
  }
}

/// Organizes every regular, non-hidden file under `config.source`, strictly
/// one after another. `progress` is called with each outcome as it completes.
/// Setting `interrupted` stops the run after the current file.
pub fn run(
  config: &Config,
  engine: &mut dyn MetadataEngine,
  mut progress: impl FnMut(&Outcome),
  interrupted: &AtomicBool,
) -> Result<Report> {
  config.validate()?;

  log::info!(
    "Organizing {} into {}.",
    config.source.display(),
    config.destination.display()
  );

  let mut classifier = Classifier::new(config);
  let mut report = Report::default();

  for file in files(&config.source, &config.destination)? {
    if interrupted.load(Ordering::SeqCst) {
      log::warn!("Interrupted. Stopping early.");
      report.interrupted = true;
      break;
    }

    let outcome = classifier.classify(engine, &file);
    progress(&outcome);
    report.add(outcome);
  }

  report.sort();

  if let Some(device) = &config.device {
    if config.mode.is_real() {
      write_last_files(&config.destination, device, &report.last_files())?;
    }
  }

  log::info!("Organized {} files.", report.len());

  Ok(report)
}

/// Lazily lists regular files under `source`, sorted by name within each
/// directory. Hidden files and directories are skipped, as is `destination`
/// if it lies inside `source`.
fn files(source: &Path, destination: &Path) -> Result<impl Iterator<Item = PathBuf>> {
  let source = source.canonicalize().map_err(|e| Error::io(source, e))?;
  // If it doesn't exist yet, it can't be walked into either.
  let destination = destination.canonicalize().ok();

  let keep = move |e: &DirEntry| {
    e.depth() == 0 || (!is_hidden(e) && destination.as_deref() != Some(e.path()))
  };

  Ok(
    WalkDir::new(source)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(keep)
      .filter_map(|entry| match entry {
        Ok(e) if e.file_type().is_file() => Some(e.into_path()),
        Ok(e) => {
          if !e.file_type().is_dir() {
            log::debug!("{}: Not a regular file. Ignoring.", e.path().display());
          }
          None
        }
        Err(e) => {
          log::warn!("{e}");
          None
        }
      }),
  )
}

fn is_hidden(entry: &DirEntry) -> bool {
  entry.file_name().to_string_lossy().starts_with('.')
}

/// Writes `last` as `{destination}/.devices/{device}.json`.
fn write_last_files(destination: &Path, device: &str, last: &LastFiles) -> Result<()> {
  let dir = destination.join(DEVICES_DIR);
  fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

  let path = dir.join(format!("{device}.json"));
  let mut json = serde_json::to_string_pretty(last)?;
  json.push('\n');
  fs::write(&path, json).map_err(|e| Error::io(&path, e))?;

  log::info!("{}: Wrote last files.", path.display());
  Ok(())
}
