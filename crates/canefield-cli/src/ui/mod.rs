//! Plain-text rendering of registry, harvest and analytics values.
//!
//! Every renderer returns a `String` so output can be printed, exported to
//! a file, or asserted on in tests.

pub mod farm_detail;
pub mod harvest_detail;
pub mod report;

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};

pub const WIDTH: usize = 72;

/// A titled section header.
pub fn heading(out: &mut String, title: &str) {
  let _ = writeln!(out, "{}", "=".repeat(WIDTH));
  let _ = writeln!(out, "{title:^WIDTH$}");
  let _ = writeln!(out, "{}", "=".repeat(WIDTH));
}

pub fn rule(out: &mut String) {
  let _ = writeln!(out, "{}", "-".repeat(WIDTH));
}

/// A left-aligned `label: value` line.
pub fn field(out: &mut String, label: &str, value: impl std::fmt::Display) {
  let _ = writeln!(out, "  {label:<22} {value}");
}

pub fn local_time(at: DateTime<Utc>) -> String {
  at.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string()
}

/// Wrap a rendered report with the export header and footer.
pub fn export(title: &str, body: &str, generated_at: DateTime<Utc>) -> String {
  let mut out = String::new();
  heading(&mut out, title);
  field(&mut out, "Generated", local_time(generated_at));
  out.push('\n');
  out.push_str(body);
  if !body.ends_with('\n') {
    out.push('\n');
  }
  rule(&mut out);
  let _ = writeln!(out, "End of report.");
  out
}
