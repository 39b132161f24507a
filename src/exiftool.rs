// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Reading and writing metadata through a long running `ExifTool` process.
//!
//! `ExifTool` is started once with `-stay_open True -@ -`. Each command is
//! written to its stdin one argument per line, terminated by `-execute`, and
//! its output is read from stdout up to the `{ready}` marker. The process can
//! only serve one command at a time, which [`MetadataEngine`] enforces by
//! taking `&mut self`.

use std::{
  ffi::OsStr,
  io::{self, BufRead, BufReader, Write},
  path::Path,
  process::{Child, ChildStdin, ChildStdout, Command, Stdio},
};

use crate::{
  error::{Error, Result},
  metadata::{self, Metadata},
};

/// Minimum supported (tested) version of `ExifTool`.
const EXIFTOOL_MIN_VERSION: (u32, u32) = (10, 0);

/// Printed by `ExifTool` after every `-execute` in `-stay_open` mode.
const READY: &str = "{ready}";

/// Something that can read and write file metadata.
pub trait MetadataEngine {
  /// Reads all tags from `file`. An empty result means nothing was readable.
  fn read_metadata(&mut self, file: &Path) -> Result<Metadata>;

  /// Writes `tags` (name, value) into `file`, in place.
  fn write_metadata(&mut self, file: &Path, tags: &[(&str, &str)]) -> Result<()>;

  /// Releases the engine. Calling more than once is a no-op.
  fn close(&mut self) -> Result<()>;
}

/// A running `ExifTool` process in `-stay_open` mode.
pub struct ExifTool {
  child:  Child,
  stdin:  ChildStdin,
  stdout: BufReader<ChildStdout>,
  closed: bool,
}

impl ExifTool {
  /// Starts `ExifTool` and checks it is present and new enough.
  pub fn open() -> Result<Self> {
    Self::open_with(OsStr::new("exiftool"))
  }

  /// Starts the `ExifTool` executable at `program`.
  pub fn open_with(program: &OsStr) -> Result<Self> {
    let mut child = Command::new(program)
      .args(["-stay_open", "True", "-@", "-"])
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::null())
      .spawn()
      .map_err(|e| Error::ExifTool(format!("Failed to start {} ({e}).", program.display())))?;

    let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
      // Not reachable with piped stdio, but the child must not be left running.
      let _ = child.kill();
      return Err(Error::ExifTool("Failed to attach to stdin / stdout.".to_string()));
    };

    let mut exiftool = Self {
      child,
      stdin,
      stdout: BufReader::new(stdout),
      closed: false,
    };

    let version = exiftool.execute(&["-ver"])?;
    if let Err(e) = version_check(&version, EXIFTOOL_MIN_VERSION) {
      let _ = exiftool.close();
      return Err(e);
    }
    log::debug!("Using ExifTool {}.", version.trim());

    Ok(exiftool)
  }

  /// Runs a single command, returning everything printed before `{ready}`.
  fn execute(&mut self, args: &[&str]) -> Result<String> {
    if self.closed {
      return Err(Error::ExifTool("Process already closed.".to_string()));
    }
    if let Some(arg) = args.iter().find(|a| a.contains('\n')) {
      return Err(Error::ExifTool(format!(
        "Argument contains a line break: {arg:?}"
      )));
    }

    log::trace!("ExifTool args: {}", args.join(" "));

    let mut command = String::new();
    for arg in args {
      command.push_str(arg);
      command.push('\n');
    }
    command.push_str("-execute\n");

    self
      .stdin
      .write_all(command.as_bytes())
      .and_then(|()| self.stdin.flush())
      .map_err(|e| Error::ExifTool(format!("Failed to send command ({e}).")))?;

    let mut output = String::new();
    loop {
      let mut line = String::new();
      let read = self
        .stdout
        .read_line(&mut line)
        .map_err(|e| Error::ExifTool(format!("Failed to read output ({e}).")))?;

      if read == 0 {
        return Err(Error::ExifTool(format!(
          "Process exited unexpectedly.\nstdout:\n{output}"
        )));
      }
      if line.trim_end() == READY {
        break;
      }
      output.push_str(&line);
    }

    log::trace!("ExifTool output:\n{output}");
    Ok(output)
  }
}

impl MetadataEngine for ExifTool {
  fn read_metadata(&mut self, file: &Path) -> Result<Metadata> {
    let file = path_arg(file)?;
    let stdout = self.execute(&["-json", file])?;

    Ok(metadata::parse_vec(stdout)?.into_iter().next().unwrap_or_default())
  }

  fn write_metadata(&mut self, file: &Path, tags: &[(&str, &str)]) -> Result<()> {
    let file_arg = path_arg(file)?;

    let assignments = tags
      .iter()
      .map(|(tag, value)| format!("-{tag}={value}"))
      .collect::<Vec<_>>();

    let mut args = vec!["-overwrite_original"];
    args.extend(assignments.iter().map(String::as_str));
    args.push(file_arg);

    let stdout = self.execute(&args)?;

    if !matches!(updated_count(&stdout), Some(n) if n > 0) {
      return Err(Error::ExifTool(format!(
        "{}: Failed to write metadata.\nstdout:\n{stdout}",
        file.display()
      )));
    }

    Ok(())
  }

  fn close(&mut self) -> Result<()> {
    if self.closed {
      return Ok(());
    }
    self.closed = true;

    log::debug!("Closing ExifTool.");

    if let Ok(Some(status)) = self.child.try_wait() {
      log::debug!("ExifTool already exited ({status}).");
      return Ok(());
    }

    let sent = self
      .stdin
      .write_all(b"-stay_open\nFalse\n")
      .and_then(|()| self.stdin.flush());

    match sent {
      Ok(()) => {}
      // Exited between `try_wait` and the write.
      Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
        log::debug!("ExifTool already exited.");
      }
      Err(e) => {
        let _ = self.child.kill();
        let _ = self.child.wait();
        return Err(Error::ExifTool(format!("Failed to stop process ({e}).")));
      }
    }

    self
      .child
      .wait()
      .map_err(|e| Error::ExifTool(format!("Failed to wait for process ({e}).")))?;

    Ok(())
  }
}

impl Drop for ExifTool {
  fn drop(&mut self) {
    if let Err(e) = self.close() {
      log::error!("{e}");
    }
  }
}

fn path_arg(path: &Path) -> Result<&str> {
  path
    .to_str()
    .ok_or_else(|| Error::ExifTool(format!("{}: Path is not valid UTF-8.", path.display())))
}

/// Number of files `ExifTool` reports as updated, e.g. from
/// `    1 image files updated`.
fn updated_count(stdout: &str) -> Option<u32> {
  stdout.lines().find_map(|line| {
    line
      .trim()
      .strip_suffix("image files updated")
      .and_then(|n| n.trim().parse().ok())
  })
}

/// Returns whether `version` is as new or newer than `version_required_min`,
/// where `version` is from `ExifTool`'s stdout.
fn version_check(version: &str, version_required_min: (u32, u32)) -> Result<()> {
  let Some((major, minor)) = version.trim().split_once('.') else {
    return Err(Error::ExifTool(format!(
      "Unexpected version string: \"{}\"",
      version.trim()
    )));
  };

  let (Ok(major), Ok(minor)) = (major.parse::<u32>(), minor.parse::<u32>()) else {
    return Err(Error::ExifTool(format!("Unexpected version: {}", version.trim())));
  };

  if (major, minor) >= version_required_min {
    Ok(())
  } else {
    Err(Error::ExifTool(format!(
      "Version {major}.{minor} is too old (needs {}.{} or newer).",
      version_required_min.0, version_required_min.1
    )))
  }
}



/// These need `exiftool` on the `PATH`.
#[cfg(test)]
mod test_exiftool {
  use super::*;
  use crate::testing::*;

  #[test]
  #[ignore = "requires exiftool"]
  fn reads_missing_file_as_empty() {
    let d = test_dir!();
    let mut e = ExifTool::open().unwrap();

    let m = e.read_metadata(&d.get_path("missing.jpg")).unwrap();

    assert!(m.is_unreadable());
    e.close().unwrap();
  }

  #[test]
  #[ignore = "requires exiftool"]
  fn reads_plain_text_file() {
    let d = test_dir!("notes.txt": {});
    let mut e = ExifTool::open().unwrap();

    let m = e.read_metadata(&d.get_path("notes.txt")).unwrap();

    assert_eq!(m.get("FileName"), Some("notes.txt"));
    e.close().unwrap();
  }

  #[test]
  #[ignore = "requires exiftool"]
  fn write_to_text_file_fails() {
    let d = test_dir!("notes.txt": {});
    let mut e = ExifTool::open().unwrap();

    let r = e.write_metadata(&d.get_path("notes.txt"), &[("CreateDate", "2016:01:01 12:22:45")]);

    assert!(r.is_err());
    e.close().unwrap();
  }

  #[test]
  #[ignore = "requires exiftool"]
  fn close_is_idempotent() {
    let mut e = ExifTool::open().unwrap();

    e.close().unwrap();
    e.close().unwrap();
    assert!(e.read_metadata(Path::new("/x")).is_err());
  }
}
