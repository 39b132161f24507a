// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Program setup functions.

use std::{
  fs,
  io::Write,
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use env_logger::Builder;
use log::LevelFilter;

use crate::error::{Error, Result};

/// Sets up `env_logger` with the format "LEVEL\tmessage" (e.g. "WARN\tsomething went wrong").
///
/// Log levels:
/// Error: Program errors.
/// Warn: Removed files, metadata that could not be written, skipped entries.
/// Info: General program flow.
/// Debug: Per file decisions.
/// Trace: `ExifTool` commands and output.
pub fn configure_logging(verbosity: u8) {
  let level = match verbosity {
    0 => LevelFilter::Info,
    1 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  };

  Builder::new()
    .filter_level(level)
    .format(|buf, record| {
      let style = buf.default_level_style(record.level());
      writeln!(buf, "{style}{}{style:#}\t{}", record.level(), record.args())
    })
    .init();
}

/// Creates `destination` if needed. With `clean`, everything already in it is
/// removed first.
pub fn prepare_destination(destination: &Path, clean: bool) -> Result<()> {
  if destination.exists() && !destination.is_dir() {
    return Err(Error::Config(format!(
      "{}: Destination is not a directory.",
      destination.display()
    )));
  }

  fs::create_dir_all(destination).map_err(|e| Error::io(destination, e))?;

  if !clean {
    return Ok(());
  }

  log::info!("{}: Cleaning.", destination.display());

  for entry in fs::read_dir(destination).map_err(|e| Error::io(destination, e))? {
    let path = entry.map_err(|e| Error::io(destination, e))?.path();
    log::warn!("{}: Removing.", path.display());

    let removed = if path.is_dir() && !path.is_symlink() {
      fs::remove_dir_all(&path)
    } else {
      fs::remove_file(&path)
    };
    removed.map_err(|e| Error::io(&path, e))?;
  }

  Ok(())
}

/// Returns a flag raised on Ctrl-C, so a run can stop between files rather
/// than mid-copy.
pub fn interrupt_flag() -> Result<Arc<AtomicBool>> {
  let flag = Arc::new(AtomicBool::new(false));

  let handler_flag = Arc::clone(&flag);
  ctrlc::set_handler(move || {
    log::warn!("Ctrl-C received. Stopping after the current file.");
    handler_flag.store(true, Ordering::SeqCst);
  })?;

  Ok(flag)
}
