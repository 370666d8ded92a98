use anyhow::{Context, Result, bail};
use argbank::{ArgRef, ArgValue, Registry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SCHEMA_NAME: &str = "argbank.json";
pub const SCHEMA_VERSION: u32 = 1;

/// Argument declarations for one program, stored as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Program name used as `argv[0]` and in usage text.
    pub program: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgSpec>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Int,
    Float,
    Bool,
    #[default]
    String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgSpec {
    /// `--name` or `-name` (e.g. `-ll:gpus`).
    pub key: String,

    #[serde(default, rename = "type")]
    pub value_type: ValueType,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub flag: bool,

    /// JSON string, number or bool; converted with the declared type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Handle for one declared argument, typed by its schema type.
#[derive(Debug, Clone)]
pub enum Handle {
    Int(ArgRef<i64>),
    Float(ArgRef<f64>),
    Bool(ArgRef<bool>),
    Str(ArgRef<String>),
}

impl Handle {
    pub fn key(&self) -> &str {
        match self {
            Self::Int(h) => h.key(),
            Self::Float(h) => h.key(),
            Self::Bool(h) => h.key(),
            Self::Str(h) => h.key(),
        }
    }

    pub fn resolve(&self, parsed: &Registry) -> argbank::Result<Value> {
        match self {
            Self::Int(h) => parsed.get(h).map(Value::from),
            Self::Float(h) => {
                let value = parsed.get(h)?;
                serde_json::Number::from_f64(value)
                    .map(Value::Number)
                    .ok_or_else(|| argbank::Error::Conversion {
                        value: value.to_string(),
                        type_name: "finite float",
                    })
            }
            Self::Bool(h) => parsed.get(h).map(Value::from),
            Self::Str(h) => parsed.get(h).map(Value::from),
        }
    }
}

/// A registry built from a schema, plus the handles to read it back.
#[derive(Debug, Clone)]
pub struct Declared {
    pub registry: Registry,
    pub handles: Vec<Handle>,
}

impl Schema {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read schema: {}", path.display()))?;
        let schema: Schema = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse schema JSON: {}", path.display()))?;
        schema
            .validate()
            .with_context(|| format!("invalid schema: {}", path.display()))?;
        Ok(schema)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            bail!(
                "unsupported schemaVersion {} (expected {SCHEMA_VERSION})",
                self.schema_version
            );
        }
        if self.program.trim().is_empty() {
            bail!("program must not be empty");
        }
        for spec in &self.args {
            if spec.required && spec.default.is_some() {
                bail!("'{}': a required argument cannot have a default", spec.key);
            }
            if spec.flag && spec.value_type != ValueType::Bool {
                bail!("'{}': flags must have type bool", spec.key);
            }
        }
        Ok(())
    }

    /// Register every argument on a fresh registry, in schema order.
    pub fn declare(&self) -> Result<Declared> {
        let mut registry = Registry::new();
        let mut handles = Vec::with_capacity(self.args.len());

        for spec in &self.args {
            let handle = match (spec.value_type, spec.flag) {
                (ValueType::Bool, true) => Handle::Bool(declare_flag(&mut registry, spec)?),
                (ValueType::Int, _) => Handle::Int(declare_value(&mut registry, spec)?),
                (ValueType::Float, _) => Handle::Float(declare_value(&mut registry, spec)?),
                (ValueType::Bool, false) => Handle::Bool(declare_value(&mut registry, spec)?),
                (ValueType::String, _) => Handle::Str(declare_value(&mut registry, spec)?),
            };
            if handles.iter().any(|h: &Handle| h.key() == handle.key()) {
                tracing::warn!(key = handle.key(), "argument declared twice; last one wins");
                handles.retain(|h| h.key() != handle.key());
            }
            handles.push(handle);
        }

        Ok(Declared { registry, handles })
    }

    /// Schema written by `argbank init`.
    pub fn sample() -> Self {
        let arg = |key: &str, value_type, default: Option<Value>, description: &str| ArgSpec {
            key: key.to_string(),
            value_type,
            default,
            description: description.to_string(),
            ..Default::default()
        };
        Self {
            schema_version: SCHEMA_VERSION,
            program: "train".to_string(),
            summary: "Train a model".to_string(),
            args: vec![
                arg(
                    "--batch-size",
                    ValueType::Int,
                    Some(32.into()),
                    "Size of each batch during training",
                ),
                arg(
                    "--learning-rate",
                    ValueType::Float,
                    Some(0.001.into()),
                    "Learning rate for the optimizer",
                ),
                arg("--epoch", ValueType::Int, Some(1.into()), "Number of epochs"),
                ArgSpec {
                    required: true,
                    ..arg(
                        "-ll:gpus",
                        ValueType::Int,
                        None,
                        "Number of GPUs to be used for training",
                    )
                },
                arg(
                    "--fusion",
                    ValueType::Bool,
                    Some(true.into()),
                    "Whether to use fusion or not",
                ),
                ArgSpec {
                    flag: true,
                    ..arg(
                        "--verbose",
                        ValueType::Bool,
                        Some(false.into()),
                        "Whether to print verbose logs",
                    )
                },
            ],
        }
    }
}

fn default_text(value: &Value, value_type: ValueType) -> String {
    match value {
        Value::String(s) => s.clone(),
        // `32.0` is a valid JSON default for an int.
        Value::Number(n) if value_type == ValueType::Int && n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn declare_value<T: ArgValue>(registry: &mut Registry, spec: &ArgSpec) -> Result<ArgRef<T>> {
    let description = spec.description.as_str();
    let handle = if spec.required {
        registry.register_required::<T>(&spec.key, description)
    } else {
        let default = spec
            .default
            .as_ref()
            .map(|v| T::convert(&default_text(v, spec.value_type)))
            .transpose()
            .with_context(|| format!("'{}': invalid default", spec.key))?;
        registry.register_optional(&spec.key, default, description)
    };
    handle.with_context(|| format!("failed to declare '{}'", spec.key))
}

fn declare_flag(registry: &mut Registry, spec: &ArgSpec) -> Result<ArgRef<bool>> {
    let description = spec.description.as_str();
    let handle = if spec.required {
        registry.register_required_flag(&spec.key, description)
    } else {
        let default = match &spec.default {
            Some(v) => bool::convert(&default_text(v, spec.value_type))?,
            None => false,
        };
        registry.register_flag(&spec.key, default, description)
    };
    handle.with_context(|| format!("failed to declare '{}'", spec.key))
}

/// Resolve the schema path: explicit paths must exist, otherwise look for
/// `argbank.json` in the current directory.
pub fn resolve_schema_path(explicit: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let path = match explicit {
        Some(p) => cwd.join(p),
        None => cwd.join(DEFAULT_SCHEMA_NAME),
    };
    if !path.exists() {
        bail!(
            "schema not found: {} (run `argbank init` to create one)",
            path.display()
        );
    }
    Ok(path)
}

pub fn write_sample_schema(dir: &Path, overwrite: bool) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;

    let dest = dir.join(DEFAULT_SCHEMA_NAME);
    if dest.exists() && !overwrite {
        bail!(
            "{} already exists in {} (use --force to overwrite)",
            DEFAULT_SCHEMA_NAME,
            dir.display()
        );
    }

    let json = serde_json::to_string_pretty(&Schema::sample())?;
    fs::write(&dest, json).with_context(|| format!("failed to write {}", dest.display()))?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_declares_every_argument() {
        let schema = Schema::sample();
        schema.validate().unwrap();
        let declared = schema.declare().unwrap();

        assert_eq!(declared.handles.len(), schema.args.len());
        assert_eq!(declared.registry.required_declared(), 1);
        let verbose = declared.registry.descriptor("verbose").unwrap();
        assert!(verbose.is_flag());
        let gpus = declared.registry.descriptor("-ll:gpus").unwrap();
        assert!(gpus.is_required());
        assert_eq!(gpus.value_type(), "int");
    }

    #[test]
    fn json_defaults_accept_strings_and_numbers() {
        let schema: Schema = serde_json::from_str(
            r#"{
                "program": "prog",
                "args": [
                    { "key": "--a", "type": "int", "default": "7" },
                    { "key": "--b", "type": "float", "default": 0.5 },
                    { "key": "--c", "type": "bool", "default": "yes" },
                    { "key": "--d", "default": "text" }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(schema.schema_version, SCHEMA_VERSION);
        let declared = schema.declare().unwrap();
        let values: Vec<Value> = declared
            .handles
            .iter()
            .map(|h| h.resolve(&declared.registry).unwrap())
            .collect();
        assert_eq!(
            values,
            vec![Value::from(7), Value::from(0.5), Value::from(true), Value::from("text")]
        );
    }

    #[test]
    fn bad_default_is_reported() {
        let schema: Schema = serde_json::from_str(
            r#"{ "program": "prog", "args": [{ "key": "--a", "type": "int", "default": "x" }] }"#,
        )
        .unwrap();
        let err = schema.declare().unwrap_err();
        assert!(format!("{err:#}").contains("invalid default"), "{err:#}");
    }

    #[test]
    fn whole_float_default_is_accepted_for_int() {
        let schema: Schema = serde_json::from_str(
            r#"{ "program": "prog", "args": [
                { "key": "--n", "type": "int", "default": 32.0 },
                { "key": "--m", "type": "int", "default": 2.5 }
            ] }"#,
        )
        .unwrap();
        let err = schema.declare().unwrap_err();
        assert!(format!("{err:#}").contains("'--m': invalid default"), "{err:#}");

        let mut schema = schema;
        schema.args.pop();
        let declared = schema.declare().unwrap();
        let value = declared.handles[0].resolve(&declared.registry).unwrap();
        assert_eq!(value, Value::from(32));
    }

    #[test]
    fn non_finite_float_is_rejected_on_resolve() {
        let declared = Schema::sample().declare().unwrap();
        let argv = ["train", "-ll:gpus", "1", "--learning-rate", "nan"];
        let parsed = argbank::parse(&declared.registry, &argv)
            .unwrap()
            .into_registry()
            .unwrap();
        let lr = declared
            .handles
            .iter()
            .find(|h| h.key() == "learning-rate")
            .unwrap();
        match lr.resolve(&parsed) {
            Err(argbank::Error::Conversion { value, .. }) => assert_eq!(value, "NaN"),
            other => panic!("expected Conversion, got: {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_inconsistent_specs() {
        let mut schema = Schema::sample();
        schema.args[3].default = Some(Value::from(2));
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("required argument cannot have a default"));

        let mut schema = Schema::sample();
        schema.args[0].flag = true;
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("flags must have type bool"));

        let mut schema = Schema::sample();
        schema.schema_version = 9;
        assert!(schema.validate().is_err());
    }

    #[test]
    fn duplicate_keys_keep_the_last_declaration() {
        let mut schema = Schema::sample();
        schema.args.push(ArgSpec {
            key: "--batch-size".to_string(),
            value_type: ValueType::Int,
            default: Some(Value::from(64)),
            ..Default::default()
        });
        let declared = schema.declare().unwrap();
        assert_eq!(declared.handles.len(), Schema::sample().args.len());
        let batch = declared
            .handles
            .iter()
            .find(|h| h.key() == "batch-size")
            .unwrap();
        assert_eq!(batch.resolve(&declared.registry).unwrap(), Value::from(64));
    }

    #[test]
    fn malformed_key_fails_to_declare() {
        let schema: Schema =
            serde_json::from_str(r#"{ "program": "prog", "args": [{ "key": "batch" }] }"#)
                .unwrap();
        assert!(schema.declare().is_err());
    }
}
