use thiserror::Error;

/// Errors produced while registering, parsing or reading arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A token used as a key does not start with `-` or `--`.
    #[error("malformed argument key: '{0}' (expected --name or -name)")]
    MalformedKey(String),

    /// A key was followed by a value but was never declared.
    #[error("unknown argument: '{0}' does not exist")]
    UnknownArgument(String),

    /// A required value-taking argument had no value token after it.
    #[error("missing value for required argument '{0}'")]
    MissingValue(String),

    /// A stored string could not be converted to the requested type.
    #[error("cannot convert '{value}' to {type_name}")]
    Conversion {
        value: String,
        type_name: &'static str,
    },

    /// Required arguments that never appeared on the command line.
    #[error("missing required arguments: {}", .0.join(", "))]
    MissingRequiredArguments(Vec<String>),

    /// Lookup of an undeclared key, or of a key with neither value nor default.
    #[error("invalid argument: '{0}' has no value")]
    InvalidArgument(String),
}

impl Error {
    /// The key the error is about, when there is exactly one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::MalformedKey(k)
            | Self::UnknownArgument(k)
            | Self::MissingValue(k)
            | Self::InvalidArgument(k) => Some(k.as_str()),
            Self::Conversion { .. } | Self::MissingRequiredArguments(_) => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_lists_every_key() {
        let err = Error::MissingRequiredArguments(vec!["batch-size".into(), "-ll:gpus".into()]);
        assert_eq!(
            err.to_string(),
            "missing required arguments: batch-size, -ll:gpus"
        );
        assert_eq!(err.key(), None);
    }

    #[test]
    fn key_is_exposed_for_single_key_errors() {
        assert_eq!(Error::MissingValue("epoch".into()).key(), Some("epoch"));
        assert_eq!(Error::UnknownArgument("bogus".into()).key(), Some("bogus"));
    }
}
