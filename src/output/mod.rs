//! Output formatters for scan, dedupe and backup results.
//!
//! - [`text`] for terminals
//! - [`json`] for automation and scripting
//!
//! ```no_run
//! use arcdupe::duplicates::DuplicateFinder;
//! use arcdupe::error::ExitCode;
//! use arcdupe::output::JsonOutput;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, summary) = finder.find_duplicates(Vec::new(), false).unwrap();
//! let output = JsonOutput::new(&groups, &summary, ExitCode::Success);
//! output.write_to(&mut std::io::stdout(), true).unwrap();
//! ```

pub mod json;
pub mod text;

pub use json::{write_json, JsonDedupeOutput, JsonOutput, JsonOutputError};
