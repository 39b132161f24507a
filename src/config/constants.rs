// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Default file types, date tags and bucket names.

/// Extensions processed by default. Anything else goes to `UNKNOWN_DIR`.
pub const DEFAULT_EXTENSIONS: [&str; 7] = ["gif", "jpg", "jpeg", "png", "mov", "mp4", "m4v"];

/// Tags consulted for a file's date, most trusted first. The first one is also
/// the tag written back when a date had to be guessed.
pub const DEFAULT_DATE_TAGS: [&str; 2] = ["CreationDate", "CreateDate"];

/// Files without readable metadata, or of an unexpected type.
pub const UNKNOWN_DIR: &str = "UNKNOWN";

/// Files with metadata, but no date to sort them by.
pub const UNSORTED_DIR: &str = "UNSORTED";

/// Per-device summaries of the last imported files, under the destination.
pub const DEVICES_DIR: &str = ".devices";
