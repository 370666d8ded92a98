//! Matching command-line tokens against declared arguments.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::help;
use crate::key::{is_help_key, looks_like_key, normalize_key};
use crate::registry::Registry;

/// Result of a successful [`parse`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Every required argument was satisfied.
    Parsed(Registry),
    /// `--help`/`-h` was seen. Carries usage text rendered from the declarations.
    Help(String),
}

impl ParseOutcome {
    /// The parsed registry, or `None` if help was requested.
    pub fn into_registry(self) -> Option<Registry> {
        match self {
            Self::Parsed(registry) => Some(registry),
            Self::Help(_) => None,
        }
    }

    pub fn is_help(&self) -> bool {
        matches!(self, Self::Help(_))
    }
}

/// Parse `argv` against the `declared` registry.
///
/// `argv[0]` is the program name and is skipped. The declared registry is
/// left untouched; the returned registry is a fresh copy holding defaults,
/// values seen on the command line and flag presence.
///
/// A key consumes the next token as its value when that token does not start
/// with `-`. Flags never consume a value.
pub fn parse<S: AsRef<str>>(declared: &Registry, argv: &[S]) -> Result<ParseOutcome> {
    parse_with_summary(declared, argv, "")
}

/// Like [`parse`], with a one-line `summary` for the usage text of a help
/// request.
pub fn parse_with_summary<S: AsRef<str>>(
    declared: &Registry,
    argv: &[S],
    summary: &str,
) -> Result<ParseOutcome> {
    let program = argv.first().map(|s| s.as_ref()).unwrap_or_default();

    let mut result = Registry {
        args: declared.args.clone(),
        required_declared: declared.required_declared,
        required_satisfied: 0,
    };
    let mut satisfied: HashSet<String> = HashSet::new();

    let mut i = 1usize;
    while i < argv.len() {
        let key = normalize_key(argv[i].as_ref())?;
        if is_help_key(&key) {
            tracing::debug!(program, "help requested");
            return Ok(ParseOutcome::Help(help::render_with_summary(
                declared, program, summary,
            )));
        }

        let next = argv
            .get(i + 1)
            .map(|s| s.as_ref())
            .filter(|token| !looks_like_key(token));

        let Some(descriptor) = result.args.get_mut(&key) else {
            if next.is_some() {
                return Err(Error::UnknownArgument(key));
            }
            tracing::debug!(key = %key, "ignoring undeclared key without a value");
            i += 1;
            continue;
        };

        if descriptor.is_flag {
            descriptor.value = Some("true".to_string());
            descriptor.was_passed_as_flag = true;
            if descriptor.is_required() {
                satisfied.insert(key.clone());
            }
            tracing::trace!(key = %key, "flag set");
            i += 1;
            continue;
        }

        match next {
            Some(value) => {
                descriptor.value = Some(value.to_string());
                if descriptor.is_required() {
                    satisfied.insert(key.clone());
                }
                tracing::trace!(key = %key, value, "value set");
                i += 2;
            }
            None if descriptor.is_required() => return Err(Error::MissingValue(key)),
            // Optional argument without a value keeps its default.
            None => i += 1,
        }
    }

    result.required_satisfied = satisfied.len();
    tracing::debug!(
        declared = result.required_declared,
        satisfied = result.required_satisfied,
        "required arguments checked"
    );

    if result.required_satisfied != result.required_declared {
        let missing: Vec<String> = declared
            .required_keys()
            .filter(|key| !satisfied.contains(*key))
            .map(str::to_string)
            .collect();
        for key in &missing {
            tracing::warn!(key = %key, "missing required argument");
        }
        return Err(Error::MissingRequiredArguments(missing));
    }

    Ok(ParseOutcome::Parsed(result))
}

/// Parse `argv` and discard the result.
///
/// A help request counts as valid input.
pub fn validate<S: AsRef<str>>(declared: &Registry, argv: &[S]) -> Result<()> {
    parse(declared, argv).map(|_| ())
}
