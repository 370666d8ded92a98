//! Argument declarations and parse results.
//!
//! A [`Registry`] is built by registration calls and handed to
//! [`crate::parse`], which returns a *new* registry with the parse results.
//! Values are read back through the typed [`ArgRef`] handles returned at
//! registration time.

use indexmap::IndexMap;

use crate::convert::ArgValue;
use crate::error::{Error, Result};
use crate::key::normalize_key;

/// Stored metadata and state for one declared argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgDescriptor {
    pub(crate) value: Option<String>,
    pub(crate) description: String,
    pub(crate) has_default: bool,
    pub(crate) is_flag: bool,
    pub(crate) was_passed_as_flag: bool,
    pub(crate) is_optional: bool,
    pub(crate) value_type: &'static str,
}

impl ArgDescriptor {
    /// Raw value, either the stringified default or the token seen on the command line.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn has_default(&self) -> bool {
        self.has_default
    }

    pub fn is_flag(&self) -> bool {
        self.is_flag
    }

    /// Whether the flag actually appeared on the command line.
    ///
    /// Always `false` for value arguments and for a registry that was never parsed.
    pub fn was_passed_as_flag(&self) -> bool {
        self.was_passed_as_flag
    }

    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    pub fn is_required(&self) -> bool {
        !self.is_optional
    }

    /// Declared value type (`int`, `float`, `bool`, `string`).
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }
}

/// Typed capability to read one argument back out of a parsed [`Registry`].
///
/// The handle owns no parse state. `default` is what was supplied at
/// registration, `None` meaning "no default".
#[derive(Debug, Clone, PartialEq)]
pub struct ArgRef<T> {
    key: String,
    default: Option<T>,
}

impl<T> ArgRef<T> {
    fn new(key: String, default: Option<T>) -> Self {
        Self { key, default }
    }

    /// Normalized key this handle is bound to.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_value(&self) -> Option<&T> {
        self.default.as_ref()
    }
}

/// Declared arguments, keyed by normalized key, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    pub(crate) args: IndexMap<String, ArgDescriptor>,
    pub(crate) required_declared: usize,
    pub(crate) required_satisfied: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an argument that must appear on the command line with a value.
    pub fn register_required<T: ArgValue>(
        &mut self,
        key: &str,
        description: &str,
    ) -> Result<ArgRef<T>> {
        let key = normalize_key(key)?;
        self.insert(
            key.clone(),
            ArgDescriptor {
                description: description.to_string(),
                is_optional: false,
                value_type: T::TYPE_NAME,
                ..Default::default()
            },
        );
        Ok(ArgRef::new(key, None))
    }

    /// Declare an argument that may be omitted, optionally with a default.
    pub fn register_optional<T: ArgValue>(
        &mut self,
        key: &str,
        default: Option<T>,
        description: &str,
    ) -> Result<ArgRef<T>> {
        let key = normalize_key(key)?;
        self.insert(
            key.clone(),
            ArgDescriptor {
                value: default.as_ref().map(ArgValue::to_arg_string),
                description: description.to_string(),
                has_default: default.is_some(),
                is_optional: true,
                value_type: T::TYPE_NAME,
                ..Default::default()
            },
        );
        Ok(ArgRef::new(key, default))
    }

    /// Declare an optional flag.
    ///
    /// `default` is recorded for help output only. Reading the flag back
    /// always reports whether it was present on the command line.
    pub fn register_flag(
        &mut self,
        key: &str,
        default: bool,
        description: &str,
    ) -> Result<ArgRef<bool>> {
        let key = normalize_key(key)?;
        self.insert(
            key.clone(),
            ArgDescriptor {
                value: Some(default.to_arg_string()),
                description: description.to_string(),
                has_default: true,
                is_flag: true,
                is_optional: true,
                value_type: bool::TYPE_NAME,
                ..Default::default()
            },
        );
        Ok(ArgRef::new(key, Some(default)))
    }

    /// Declare a flag that must be present on the command line.
    pub fn register_required_flag(
        &mut self,
        key: &str,
        description: &str,
    ) -> Result<ArgRef<bool>> {
        let key = normalize_key(key)?;
        self.insert(
            key.clone(),
            ArgDescriptor {
                description: description.to_string(),
                is_flag: true,
                is_optional: false,
                value_type: bool::TYPE_NAME,
                ..Default::default()
            },
        );
        Ok(ArgRef::new(key, None))
    }

    // Last registration wins; keep the required counter in step with the map.
    fn insert(&mut self, key: String, descriptor: ArgDescriptor) {
        let required = descriptor.is_required();
        tracing::trace!(
            key = %key,
            required,
            flag = descriptor.is_flag,
            "registered argument"
        );
        if let Some(prev) = self.args.insert(key, descriptor) {
            if prev.is_required() {
                self.required_declared -= 1;
            }
        }
        if required {
            self.required_declared += 1;
        }
    }

    /// Read the final value for `handle`.
    ///
    /// Flags resolve to their presence on the command line. Other arguments
    /// convert their stored value (from the command line or the default).
    pub fn get<T: ArgValue>(&self, handle: &ArgRef<T>) -> Result<T> {
        let descriptor = self
            .args
            .get(handle.key())
            .ok_or_else(|| Error::InvalidArgument(handle.key().to_string()))?;

        if descriptor.is_flag {
            return T::from_presence(descriptor.was_passed_as_flag);
        }

        match descriptor.value.as_deref() {
            Some(raw) => T::convert(raw),
            None => Err(Error::InvalidArgument(handle.key().to_string())),
        }
    }

    pub fn descriptor(&self, key: &str) -> Option<&ArgDescriptor> {
        self.args.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.args.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgDescriptor)> {
        self.args.iter().map(|(k, d)| (k.as_str(), d))
    }

    /// Required keys in declaration order.
    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, d)| d.is_required())
            .map(|(k, _)| k)
    }

    pub fn required_declared(&self) -> usize {
        self.required_declared
    }

    /// Number of required arguments satisfied by the parse that produced this registry.
    pub fn required_satisfied(&self) -> usize {
        self.required_satisfied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_stores_stringified_default() {
        let mut reg = Registry::new();
        let batch = reg
            .register_optional("--batch-size", Some(32i32), "Size of each batch")
            .unwrap();
        assert_eq!(batch.key(), "batch-size");
        assert_eq!(batch.default_value(), Some(&32));

        let d = reg.descriptor("batch-size").unwrap();
        assert_eq!(d.value(), Some("32"));
        assert!(d.has_default());
        assert!(d.is_optional());
        assert!(!d.is_flag());
        assert_eq!(d.value_type(), "int");
        assert_eq!(reg.get(&batch).unwrap(), 32);
    }

    #[test]
    fn optional_without_default_has_no_value() {
        let mut reg = Registry::new();
        let gpus = reg
            .register_optional::<i32>("-ll:gpus", None, "Number of GPUs")
            .unwrap();
        assert_eq!(gpus.key(), "-ll:gpus");
        assert_eq!(gpus.default_value(), None);
        match reg.get(&gpus) {
            Err(Error::InvalidArgument(k)) => assert_eq!(k, "-ll:gpus"),
            other => panic!("expected InvalidArgument, got: {other:?}"),
        }
    }

    #[test]
    fn required_counts_and_has_no_value() {
        let mut reg = Registry::new();
        let gpus = reg.register_required::<i32>("-ll:gpus", "GPUs").unwrap();
        reg.register_required_flag("--fusion", "Enable fusion").unwrap();
        reg.register_optional("--lr", Some(0.001f32), "Learning rate")
            .unwrap();

        assert_eq!(reg.required_declared(), 2);
        assert_eq!(reg.required_satisfied(), 0);
        assert_eq!(reg.required_keys().collect::<Vec<_>>(), ["-ll:gpus", "fusion"]);
        assert!(reg.get(&gpus).is_err());
    }

    #[test]
    fn reregistering_overwrites_and_keeps_counts_consistent() {
        let mut reg = Registry::new();
        reg.register_required::<i32>("--epoch", "Epochs").unwrap();
        reg.register_required::<i32>("--epoch", "Epochs again").unwrap();
        assert_eq!(reg.required_declared(), 1);
        assert_eq!(reg.len(), 1);

        let epoch = reg.register_optional("--epoch", Some(3i32), "Epochs").unwrap();
        assert_eq!(reg.required_declared(), 0);
        assert_eq!(reg.descriptor("epoch").unwrap().description(), "Epochs");
        assert_eq!(reg.get(&epoch).unwrap(), 3);
    }

    #[test]
    fn flag_before_parse_reads_false_even_with_true_default() {
        let mut reg = Registry::new();
        let verbose = reg.register_flag("--verbose", true, "Verbose logs").unwrap();
        assert_eq!(verbose.default_value(), Some(&true));
        assert!(!reg.get(&verbose).unwrap());
    }

    #[test]
    fn malformed_key_is_rejected_at_registration() {
        let mut reg = Registry::new();
        match reg.register_optional::<i32>("batch-size", None, "") {
            Err(Error::MalformedKey(k)) => assert_eq!(k, "batch-size"),
            other => panic!("expected MalformedKey, got: {other:?}"),
        }
        assert!(reg.is_empty());
    }

    #[test]
    fn handle_for_unknown_key_is_invalid() {
        let mut other = Registry::new();
        let stray = other.register_optional("--stray", Some(1i32), "").unwrap();
        let reg = Registry::new();
        assert!(matches!(reg.get(&stray), Err(Error::InvalidArgument(_))));
    }
}
