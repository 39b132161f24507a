// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Sorts photos and videos into `YYYY/MM/DD/` directories by the date they were taken, acting as a
//! wrapper around `exiftool`.

use std::{
  env,
  path::{MAIN_SEPARATOR, Path, PathBuf},
  sync::atomic::AtomicBool,
};

use clap::{ArgAction, Parser};

use crate::{
  classify::{Category, Outcome},
  config::{Config, Operation, constants},
  error::{Error, Result},
  exiftool::{ExifTool, MetadataEngine},
  organize::Report,
  place::Mode,
};

mod classify;
mod config;
mod date;
mod error;
mod exiftool;
mod metadata;
mod organize;
mod path;
mod place;
mod setup;
#[cfg(test)]
mod testing;

#[derive(Parser)]
#[command(version, about)]
struct Args {
  /// Directory to read from.
  #[arg(long)]
  src: PathBuf,

  /// Directory to write to.
  #[arg(long)]
  dest: PathBuf,

  /// Device the files come from. The last files organized are recorded in `DEST/.devices/`.
  #[arg(long)]
  device: Option<String>,

  /// Only these extensions are organized by date. Anything else goes to `UNKNOWN`.
  #[arg(long, num_args = 1.., default_values = constants::DEFAULT_EXTENSIONS)]
  ext: Vec<String>,

  /// Tags to read the date from, most trusted first. Guessed dates are written to the first.
  #[arg(long, num_args = 1.., default_values = constants::DEFAULT_DATE_TAGS)]
  exif_date: Vec<String>,

  /// Actually change the file system. Otherwise, only shows what would happen.
  #[arg(long)]
  real: bool,

  /// Empty the destination first (with `--real`).
  #[arg(long)]
  clean: bool,

  /// How files get to the destination.
  #[arg(long, value_enum, default_value_t = Operation::Copy)]
  command: Operation,

  /// Don't write guessed dates back into organized files.
  #[arg(long)]
  no_write_metadata: bool,

  /// Verbosity level. Max: 2.
  #[arg(short, action = ArgAction::Count)]
  verbose: u8,

  /// List every file in the summary, not just counts.
  #[arg(long)]
  verbose_summary: bool,
}

impl Args {
  fn config(&self) -> Result<Config> {
    let absolute = |p: &Path| std::path::absolute(p).map_err(|e| Error::io(p, e));

    let mut config = Config::new(absolute(&self.src)?, absolute(&self.dest)?);
    config.set_extensions(&self.ext);
    config.set_date_tags(&self.exif_date);
    config.mode = if self.real {
      Mode::Real(self.command)
    } else {
      Mode::DryRun
    };
    config.write_metadata = !self.no_write_metadata;
    config.device.clone_from(&self.device);

    config.validate()?;
    Ok(config)
  }
}

fn main() {
  let args = Args::parse();
  setup::configure_logging(args.verbose);

  if let Err(e) = organize_photos(&args) {
    log::error!("{e}");
    std::process::exit(1);
  }
}

fn organize_photos(args: &Args) -> Result<()> {
  let config = args.config()?;
  let interrupted = setup::interrupt_flag()?;

  if !config.mode.is_real() {
    log::info!("Dry run. Pass --real to change files.");
    if args.clean {
      log::warn!("--clean has no effect without --real.");
    }
  }

  let mut exiftool = ExifTool::open()?;
  let organized = organize(&config, args.clean, &mut exiftool, &interrupted);
  let closed = exiftool.close();

  print_summary(&organized?, args.verbose_summary);

  // Files are already placed; a failed shutdown only warns.
  if let Err(e) = closed {
    log::warn!("{e}");
  }
  Ok(())
}

fn organize(
  config: &Config,
  clean: bool,
  engine: &mut dyn MetadataEngine,
  interrupted: &AtomicBool,
) -> Result<Report> {
  if config.mode.is_real() {
    setup::prepare_destination(&config.destination, clean)?;
  }

  let cwd = env::current_dir().unwrap_or_default();
  let mut count = 0;

  println!("{}\n", legend());

  organize::run(
    config,
    engine,
    |outcome| {
      count += 1;
      println!("({count}) {}", describe(outcome, &cwd));
    },
    interrupted,
  )
}

fn print_summary(report: &Report, verbose: bool) {
  let cwd = env::current_dir().unwrap_or_default();

  println!();
  if report.interrupted() {
    println!("Interrupted!\n");
  } else {
    println!("All done!\n");
  }

  if report.is_empty() {
    println!("No files found.");
  }

  for (category, outcomes) in report.groups() {
    if verbose {
      println!("{category}\n");
      for outcome in outcomes {
        println!("  {}", describe_paths(outcome, &cwd));
      }
      println!();
    } else {
      println!("{category}: {}", outcomes.len());
    }
  }
}

fn legend() -> String {
  Category::ALL
    .iter()
    .map(|c| format!("{c}: {}", c.description()))
    .collect::<Vec<_>>()
    .join("\n")
}

/// `CATEGORY src --> dest`, or `ERROR src: message`.
fn describe(outcome: &Outcome, cwd: &Path) -> String {
  format!("{} {}", outcome.category(), describe_paths(outcome, cwd))
}

fn describe_paths(outcome: &Outcome, cwd: &Path) -> String {
  let source = relative(outcome.source(), cwd);

  match outcome {
    Outcome::Error { message, .. } => format!("{source}: {message}"),
    Outcome::SuccessWithMetadataWrite {
      warning: Some(warning),
      ..
    } => format!(
      "{source} --> {} ({warning})",
      relative(outcome.sort_key(), cwd)
    ),
    _ => format!("{source} --> {}", relative(outcome.sort_key(), cwd)),
  }
}

/// `path` relative to `cwd` (as `./...`) if it is inside it.
fn relative(path: &Path, cwd: &Path) -> String {
  match path.strip_prefix(cwd) {
    Ok(rel) if !cwd.as_os_str().is_empty() => format!(".{MAIN_SEPARATOR}{}", rel.display()),
    _ => path.display().to_string(),
  }
}


#[cfg(test)]
mod test_describe {
  use super::*;
  use crate::place::Placement;

  #[test]
  fn relative_to_cwd() {
    let cwd = Path::new("/home/me");

    assert_eq!(relative(Path::new("/home/me/a/b.jpg"), cwd), "./a/b.jpg");
    assert_eq!(relative(Path::new("/elsewhere/b.jpg"), cwd), "/elsewhere/b.jpg");
  }

  #[test]
  fn describes_placement() {
    let o = Outcome::Unsorted(Placement {
      source:      PathBuf::from("/home/me/in/IMG_0415.jpg"),
      destination: PathBuf::from("/home/me/out/UNSORTED/IMG_0415.jpg"),
    });

    assert_eq!(
      describe(&o, Path::new("/home/me")),
      "UNSORTED ./in/IMG_0415.jpg --> ./out/UNSORTED/IMG_0415.jpg"
    );
  }

  #[test]
  fn describes_error() {
    let o = Outcome::Error {
      source:  PathBuf::from("/in/IMG_0415.jpg"),
      message: "denied".to_string(),
    };

    assert_eq!(describe(&o, Path::new("/home/me")), "ERROR /in/IMG_0415.jpg: denied");
  }
}
