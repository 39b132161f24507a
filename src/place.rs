// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Copying or moving files without ever overwriting anything.
//!
//! Before the first attempt the destination name is cleaned of noise left by
//! earlier de-duplication (e.g. ` (1)`, ` #2`, ` a`). If the destination is
//! taken, ` 1` is appended to the base name, or an existing trailing number is
//! incremented, until a free name is found.

use std::{
  collections::HashSet,
  fs::{self, File, OpenOptions},
  io,
  path::{Path, PathBuf},
  sync::LazyLock,
};

use filetime::FileTime;
use regex::Regex;

use crate::{
  config::Operation,
  error::{Error, Result},
  path::{self, Parts, PartsOverride},
};

/// Tokens dropped from base names: `(2)`, `#2` or a single lowercase letter.
static RE_NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:\(\d+\)|#\d+|[a-z])$").unwrap());

/// A trailing disambiguation number, e.g. the ` 2` in `IMG_0415 2`.
static RE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" (\d+)$").unwrap());

/// Whether files are really copied / moved, or only simulated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
  Real(Operation),
  DryRun,
}

impl Mode {
  pub fn is_real(self) -> bool {
    matches!(self, Mode::Real(_))
  }
}

/// Where a file ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
  pub source:      PathBuf,
  pub destination: PathBuf,
}

/// Result of one attempt at a specific destination.
enum Attempt {
  Placed,
  Exists,
}

/// Places files for one run. In dry-run mode, remembers which destinations
/// were (virtually) used so later files collide with them.
pub struct Placer {
  mode:      Mode,
  simulated: HashSet<PathBuf>,
}

impl Placer {
  pub fn new(mode: Mode) -> Self {
    Self {
      mode,
      simulated: HashSet::new(),
    }
  }

  pub fn mode(&self) -> Mode {
    self.mode
  }

  /// Copies or moves `source` to `desired`, or the first free variant of it.
  /// Source access and modification times are kept.
  pub fn place(&mut self, source: &Path, desired: &Path) -> Result<Placement> {
    let mut destination = normalize_file_name(desired);

    loop {
      match self.attempt(source, &destination)? {
        Attempt::Placed => {
          log::debug!("{} --> {}", source.display(), destination.display());
          return Ok(Placement {
            source: source.to_path_buf(),
            destination,
          });
        }
        Attempt::Exists => {
          log::trace!("{}: Already exists.", destination.display());
          destination = next_file_name(&destination).ok_or_else(|| {
            Error::io(
              &destination,
              io::Error::new(io::ErrorKind::AlreadyExists, "No free file name left."),
            )
          })?;
        }
      }
    }
  }

  fn attempt(&mut self, source: &Path, destination: &Path) -> Result<Attempt> {
    match self.mode {
      Mode::Real(Operation::Copy) => copy_file(source, destination),
      Mode::Real(Operation::Move) => move_file(source, destination),
      Mode::DryRun => {
        let on_disk = destination
          .try_exists()
          .map_err(|e| Error::io(destination, e))?;

        if on_disk || !self.simulated.insert(destination.to_path_buf()) {
          Ok(Attempt::Exists)
        } else {
          Ok(Attempt::Placed)
        }
      }
    }
  }
}

/// Lowercases the extension (`.jpeg` becoming `.jpg`) and drops noise tokens
/// from the base name. Applying this twice changes nothing more.
pub fn normalize_file_name(file: impl AsRef<Path>) -> PathBuf {
  path::transform(file, |p| PartsOverride {
    base: Some(normalize_base(&p.base)),
    ext: Some(normalize_ext(&p.ext)),
    ..Default::default()
  })
}

fn normalize_ext(ext: &str) -> String {
  let ext = ext.to_lowercase();
  if ext == ".jpeg" { ".jpg".to_string() } else { ext }
}

fn normalize_base(base: &str) -> String {
  let kept = base
    .split(' ')
    .filter(|t| !t.is_empty() && !is_noise(t))
    .collect::<Vec<_>>();

  // Never leave a file without a name.
  if kept.is_empty() {
    base.to_string()
  } else {
    kept.join(" ")
  }
}

fn is_noise(token: &str) -> bool {
  RE_NOISE.is_match(token) || is_letter_run(token)
}

/// `aa`, `bbb`, ...
fn is_letter_run(token: &str) -> bool {
  let mut chars = token.chars();
  match chars.next() {
    Some(first) if first.is_ascii_lowercase() => token.len() >= 2 && chars.all(|c| c == first),
    _ => false,
  }
}

/// `name.jpg` -> `name 1.jpg`, `name 1.jpg` -> `name 2.jpg`. `None` once
/// the number can't grow any further.
pub fn next_file_name(file: impl AsRef<Path>) -> Option<PathBuf> {
  let base = Parts::of(&file).base;
  let numbered = RE_SUFFIX
    .captures(&base)
    .and_then(|c| Some((c.get(0)?.start(), c[1].parse::<u64>().ok()?)));

  let next = match numbered {
    Some((start, n)) => format!("{} {}", &base[..start], n.checked_add(1)?),
    None => format!("{base} 1"),
  };

  Some(path::transform(file, |_| PartsOverride {
    base: Some(next),
    ..Default::default()
  }))
}

fn create_parent(file: &Path) -> Result<()> {
  match file.parent() {
    Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir).map_err(|e| Error::io(dir, e)),
    _ => Ok(()),
  }
}

/// Copies `source` to `destination` unless it already exists, keeping
/// permissions and access / modification times.
fn copy_file(source: &Path, destination: &Path) -> Result<Attempt> {
  create_parent(destination)?;

  let mut reader = File::open(source).map_err(|e| Error::io(source, e))?;
  let metadata = reader.metadata().map_err(|e| Error::io(source, e))?;

  let mut writer = match OpenOptions::new()
    .write(true)
    .create_new(true)
    .open(destination)
  {
    Ok(f) => f,
    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(Attempt::Exists),
    Err(e) => return Err(Error::io(destination, e)),
  };

  let copied = io::copy(&mut reader, &mut writer)
    .and_then(|_| writer.set_permissions(metadata.permissions()));
  drop(writer);

  if let Err(e) = copied {
    // Don't leave a partial file behind to collide with the next attempt.
    let _ = fs::remove_file(destination);
    return Err(Error::io(destination, e));
  }

  filetime::set_file_times(
    destination,
    FileTime::from_last_access_time(&metadata),
    FileTime::from_last_modification_time(&metadata),
  )
  .map_err(|e| Error::io(destination, e))?;

  Ok(Attempt::Placed)
}

/// Moves `source` to `destination` unless it already exists. Hard links keep
/// the existence check atomic; where they aren't possible (other devices,
/// file systems without links) this falls back to copy then delete.
fn move_file(source: &Path, destination: &Path) -> Result<Attempt> {
  create_parent(destination)?;

  match fs::hard_link(source, destination) {
    Ok(()) => (),
    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(Attempt::Exists),
    Err(e) => {
      log::trace!("{}: Cannot hard link ({e}). Copying instead.", source.display());
      if let Attempt::Exists = copy_file(source, destination)? {
        return Ok(Attempt::Exists);
      }
    }
  }

  fs::remove_file(source).map_err(|e| Error::io(source, e))?;

  Ok(Attempt::Placed)
}

#[cfg(test)]
mod test_normalize_file_name {
  use super::*;

  fn normalize(s: &str) -> String {
    normalize_file_name(s).to_str().unwrap().to_string()
  }

  #[test]
  fn jpeg_becomes_jpg() {
    assert_eq!(normalize("/d/x.jpeg"), "/d/x.jpg");
    assert_eq!(normalize("/d/x.JPEG"), "/d/x.jpg");
    assert_eq!(normalize("/d/x.JpEg"), "/d/x.jpg");
  }

  #[test]
  fn extensions_are_lowercased() {
    assert_eq!(normalize("/d/x.PNG"), "/d/x.png");
    assert_eq!(normalize("/d/x.MOV"), "/d/x.mov");
  }

  #[test]
  fn drops_parenthesized_numbers() {
    assert_eq!(normalize("/d/IMG_0415 (1).jpg"), "/d/IMG_0415.jpg");
  }

  #[test]
  fn drops_hash_numbers() {
    assert_eq!(normalize("/d/Photo on #2.jpg"), "/d/Photo on.jpg");
  }

  #[test]
  fn drops_single_letters_and_letter_runs() {
    assert_eq!(normalize("/d/2016-01-01 12-22-45 a.jpg"), "/d/2016-01-01 12-22-45.jpg");
    assert_eq!(normalize("/d/2016-01-01 12-22-45 bb.jpg"), "/d/2016-01-01 12-22-45.jpg");
    assert_eq!(normalize("/d/IMG zzz (3).jpg"), "/d/IMG.jpg");
  }

  #[test]
  fn keeps_other_tokens() {
    assert_eq!(normalize("/d/Beach Day ab A 2.jpg"), "/d/Beach Day ab A 2.jpg");
  }

  #[test]
  fn collapses_spaces() {
    assert_eq!(normalize("/d/Beach  Day (1).jpg"), "/d/Beach Day.jpg");
  }

  #[test]
  fn keeps_name_made_only_of_noise() {
    assert_eq!(normalize("/d/a.jpg"), "/d/a.jpg");
    assert_eq!(normalize("/d/(1).jpg"), "/d/(1).jpg");
  }

  #[test]
  fn is_idempotent() {
    let names = [
      "/d/IMG_0415 (1).JPEG",
      "/d/Photo on 11-21-16 at 8.24 PM #2.jpg",
      "/d/a b  cc (2).png",
      "/d/x  y.jpg",
      "/d/.hidden",
      "/d/README",
    ];

    for name in names {
      let once = normalize_file_name(name);
      assert_eq!(normalize_file_name(&once), once, "{name}");
    }
  }
}
