//! String to typed value conversion.

use crate::error::{Error, Result};

/// A type that can be stored in, and read back out of, an argument bank.
///
/// Values travel through the registry as raw strings. `to_arg_string` is used
/// when a default is recorded at registration time and `convert` when a value
/// is read back.
pub trait ArgValue: Sized {
    /// Short type name used in help output and conversion errors.
    const TYPE_NAME: &'static str;

    /// Parse a raw string. Numerals must parse completely.
    fn convert(raw: &str) -> Result<Self>;

    /// Stringify a default value so it can be stored like a CLI token.
    fn to_arg_string(&self) -> String;

    /// Resolve a flag to a value of this type from its presence alone.
    fn from_presence(present: bool) -> Result<Self> {
        Self::convert(if present { "true" } else { "false" })
    }
}

/// Convert `raw` to `T`.
pub fn convert<T: ArgValue>(raw: &str) -> Result<T> {
    T::convert(raw)
}

macro_rules! numeric_arg_value {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl ArgValue for $ty {
                const TYPE_NAME: &'static str = $name;

                fn convert(raw: &str) -> Result<Self> {
                    raw.parse::<$ty>().map_err(|_| Error::Conversion {
                        value: raw.to_string(),
                        type_name: Self::TYPE_NAME,
                    })
                }

                fn to_arg_string(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

numeric_arg_value! {
    i32 => "int",
    i64 => "int",
    u32 => "int",
    u64 => "int",
    usize => "int",
    f32 => "float",
    f64 => "float",
}

impl ArgValue for bool {
    const TYPE_NAME: &'static str = "bool";

    /// Case-sensitive: only `true`, `1` and `yes` are true. Never fails.
    fn convert(raw: &str) -> Result<Self> {
        Ok(matches!(raw, "true" | "1" | "yes"))
    }

    fn to_arg_string(&self) -> String {
        self.to_string()
    }

    fn from_presence(present: bool) -> Result<Self> {
        Ok(present)
    }
}

impl ArgValue for String {
    const TYPE_NAME: &'static str = "string";

    fn convert(raw: &str) -> Result<Self> {
        Ok(raw.to_string())
    }

    fn to_arg_string(&self) -> String {
        self.clone()
    }
}
