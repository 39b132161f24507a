// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Working out when a file was captured.
//!
//! A date is taken from the first metadata tag present out of a prioritized
//! list. Without one, the file's name and its parent directory's name are
//! checked against a few well known patterns. The order of these attempts is
//! [`STRATEGIES`].

use std::{
  fmt::{self, Display, Formatter},
  path::Path,
  sync::LazyLock,
};

use chrono::{NaiveDate, NaiveTime};
use regex::{Captures, Regex};

use crate::{metadata::Metadata, path::Parts};

/// `2012:11:03 07:17:09`, as `ExifTool` formats dates. Trailing sub-seconds or
/// time zones are ignored.
static RE_METADATA: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(\d{4}):(\d{2}):(\d{2}) (\d{2}):(\d{2}):(\d{2})").unwrap()
});

/// macOS Photo Booth, e.g. `Photo on 11-21-16 at 8.24 PM`.
static RE_PHOTO_BOOTH: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^Photo on (\d{1,2})-(\d{1,2})-(\d{2}) at (\d{1,2})\.(\d{1,2}) ([AP]M)").unwrap()
});

/// macOS screenshots, e.g. `Screen Shot 2013-11-01 at 5.33.56 PM`.
static RE_SCREENSHOT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^Screen Shot (\d{4})-(\d{1,2})-(\d{1,2}) at (\d{1,2})\.(\d{1,2})\.(\d{1,2}) ([AP]M)")
    .unwrap()
});

/// `2016-01-01 12-22-45`, where all time parts are optional.
static RE_DATE_NAME: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2}) ?(\d{1,2})?-?(\d{1,2})?-?(\d{1,2})?$").unwrap()
});

/// `20121215.002106` or `20121215_002106`, at the end of a name.
static RE_DATE_COMPACT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(\d{4})(\d{2})(\d{2})[._](\d{2})(\d{2})(\d{2})$").unwrap()
});

/// One way of finding a date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
  /// First tag present from the priority list.
  Metadata,
  PhotoBooth,
  Screenshot,
  /// Name of the directory containing the file.
  Directory,
  /// The file's own base name.
  FileName,
}

/// Strategies in the order they are tried. The first match wins.
pub const STRATEGIES: [Strategy; 5] = [
  Strategy::Metadata,
  Strategy::PhotoBooth,
  Strategy::Screenshot,
  Strategy::Directory,
  Strategy::FileName,
];

impl Strategy {
  /// Whether dates found this way come from the file's own metadata.
  pub fn is_authoritative(self) -> bool {
    self == Strategy::Metadata
  }

  /// Tries to find a date for `file` this way.
  pub fn find(self, metadata: &Metadata, file: &Path, tags: &[String]) -> Option<ResolvedDate> {
    let from_metadata = self.is_authoritative();

    match self {
      Strategy::Metadata => {
        let value = tags.iter().find_map(|t| metadata.get(t))?;
        let c = RE_METADATA.captures(value)?;
        ResolvedDate::from_raw(&RawDate::from_captures(&c, [1, 2, 3, 4, 5, 6], None), from_metadata)
      }
      Strategy::PhotoBooth => {
        let base = Parts::of(file).base;
        let c = RE_PHOTO_BOOTH.captures(&base)?;
        // Month, day and two digit year, then hour and minute.
        ResolvedDate::from_raw(&RawDate::from_captures(&c, [3, 1, 2, 4, 5, 0], Some(6)), from_metadata)
      }
      Strategy::Screenshot => {
        let base = Parts::of(file).base;
        let c = RE_SCREENSHOT.captures(&base)?;
        ResolvedDate::from_raw(&RawDate::from_captures(&c, [1, 2, 3, 4, 5, 6], Some(7)), from_metadata)
      }
      Strategy::Directory => {
        let dir = file.parent()?.file_name()?.to_string_lossy();
        from_name(&dir)
      }
      Strategy::FileName => from_name(&Parts::of(file).base),
    }
  }
}

/// Matches `name` against the date-only name patterns.
fn from_name(name: &str) -> Option<ResolvedDate> {
  [&*RE_DATE_NAME, &*RE_DATE_COMPACT].into_iter().find_map(|re| {
    let c = re.captures(name)?;
    ResolvedDate::from_raw(&RawDate::from_captures(&c, [1, 2, 3, 4, 5, 6], None), false)
  })
}

/// Date parts as matched, before padding and validation.
#[derive(Debug, Default)]
struct RawDate<'a> {
  year:     &'a str,
  month:    &'a str,
  day:      &'a str,
  hour:     &'a str,
  minute:   &'a str,
  second:   &'a str,
  meridiem: &'a str,
}

impl<'a> RawDate<'a> {
  /// Takes year, month, day, hour, minute, second from the groups at
  /// `indices` (0 meaning absent), and the meridiem from `meridiem`.
  fn from_captures(c: &Captures<'a>, indices: [usize; 6], meridiem: Option<usize>) -> Self {
    let get = |i: usize| {
      if i == 0 {
        ""
      } else {
        c.get(i).map_or("", |m| m.as_str())
      }
    };

    Self {
      year:     get(indices[0]),
      month:    get(indices[1]),
      day:      get(indices[2]),
      hour:     get(indices[3]),
      minute:   get(indices[4]),
      second:   get(indices[5]),
      meridiem: meridiem.map_or("", get),
    }
  }
}

/// A capture date with every part zero padded (4 digits for the year, 2 for
/// everything else).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedDate {
  year:          String,
  month:         String,
  day:           String,
  hour:          String,
  minute:        String,
  second:        String,
  from_metadata: bool,
}

impl ResolvedDate {
  /// Normalizes `raw`, returning `None` unless it is a real date and time.
  fn from_raw(raw: &RawDate, from_metadata: bool) -> Option<Self> {
    let year = if raw.year.len() == 2 {
      format!("20{}", raw.year)
    } else {
      pad(raw.year, 4)
    };

    // Only PM is folded, so `12 AM` keeps hour 12.
    let mut hour = pad(raw.hour, 2);
    if raw.meridiem.eq_ignore_ascii_case("pm") && hour != "12" {
      hour = format!("{:02}", hour.parse::<u32>().ok()? + 12);
    }

    let date = Self {
      year,
      month: pad(raw.month, 2),
      day: pad(raw.day, 2),
      hour,
      minute: pad(raw.minute, 2),
      second: pad(raw.second, 2),
      from_metadata,
    };

    date.is_valid().then_some(date)
  }

  fn is_valid(&self) -> bool {
    let num = |s: &str| s.parse::<u32>().ok();

    let date = self
      .year
      .parse::<i32>()
      .ok()
      .zip(num(&self.month))
      .zip(num(&self.day))
      .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d));

    let time = num(&self.hour)
      .zip(num(&self.minute))
      .zip(num(&self.second))
      .and_then(|((h, m), s)| NaiveTime::from_hms_opt(h, m, s));

    date.is_some() && time.is_some()
  }

  /// True if taken from a metadata tag rather than a name.
  pub fn from_metadata(&self) -> bool {
    self.from_metadata
  }

  /// `YYYY/MM/DD`.
  pub fn dir_path(&self) -> String {
    format!("{}/{}/{}", self.year, self.month, self.day)
  }

  /// `YYYY-MM-DD HH-MM-SS`.
  pub fn file_stem(&self) -> String {
    format!(
      "{}-{}-{} {}-{}-{}",
      self.year, self.month, self.day, self.hour, self.minute, self.second
    )
  }

  /// `YYYY:MM:DD HH:MM:SS`, for writing back with `ExifTool`.
  pub fn exif_value(&self) -> String {
    format!(
      "{}:{}:{} {}:{}:{}",
      self.year, self.month, self.day, self.hour, self.minute, self.second
    )
  }
}

impl Display for ResolvedDate {
  /// `YYYY-MM-DD HH:MM:SS`.
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}-{}-{} {}:{}:{}",
      self.year, self.month, self.day, self.hour, self.minute, self.second
    )
  }
}

/// Left pads `value` with zeros to `width`. Empty becomes all zeros.
pub fn pad(value: &str, width: usize) -> String {
  format!("{value:0>width$}")
}

/// Finds the capture date of `file`, trying each of [`STRATEGIES`] in turn.
/// `tags` is the priority list of metadata tags holding a date.
pub fn resolve(metadata: &Metadata, file: &Path, tags: &[String]) -> Option<ResolvedDate> {
  STRATEGIES
    .iter()
    .find_map(|s| s.find(metadata, file, tags))
}
