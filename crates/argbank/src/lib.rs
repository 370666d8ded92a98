//! Typed command-line argument registration and parsing.
//!
//! Arguments are declared on a [`Registry`]; each declaration returns a typed
//! [`ArgRef`] handle. [`parse`] matches the process arguments against the
//! declarations and returns a new, populated registry from which the handles
//! read their final values.
//!
//! ```
//! use argbank::{ParseOutcome, Registry};
//!
//! # fn main() -> argbank::Result<()> {
//! let mut args = Registry::new();
//! let batch_size = args.register_optional("--batch-size", Some(32), "Size of each batch")?;
//! let gpus = args.register_required::<u32>("-ll:gpus", "Number of GPUs")?;
//! let verbose = args.register_flag("--verbose", false, "Print verbose logs")?;
//!
//! let argv = ["train", "-ll:gpus", "4", "--verbose"];
//! let ParseOutcome::Parsed(parsed) = argbank::parse(&args, &argv)? else {
//!     unreachable!("no --help given");
//! };
//! assert_eq!(parsed.get(&batch_size)?, 32);
//! assert_eq!(parsed.get(&gpus)?, 4);
//! assert!(parsed.get(&verbose)?);
//! # Ok(())
//! # }
//! ```
//!
//! Only exact `--name` / `-name` keys with at most one value token are
//! supported. A token is taken as a value when it does not start with `-`,
//! so negative numbers cannot be passed as separate tokens.

pub mod convert;
mod error;
pub mod help;
pub mod key;
mod parse;
mod registry;

pub use convert::{ArgValue, convert};
pub use error::{Error, Result};
pub use parse::{ParseOutcome, parse, parse_with_summary, validate};
pub use registry::{ArgDescriptor, ArgRef, Registry};
