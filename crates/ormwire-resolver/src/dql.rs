//! Custom DQL function tables and mapping-type registry
//!
//! Each function family starts from a built-in table; user entries from
//! `orm.dql.<family>_functions` are upserted on top of it. Function names are
//! case-insensitive in queries, so table keys are stored upper-cased.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Function name to implementing class reference
pub type FunctionMap = BTreeMap<String, String>;

/// Built-in date/time functions
pub const DATETIME_FUNCTIONS: &[(&str, &str)] = &[
    ("DATE", "Dql\\Mysql\\Date"),
    ("DATEDIFF", "Dql\\Mysql\\DateDiff"),
    ("DATE_FORMAT", "Dql\\Mysql\\DateFormat"),
    ("DAY", "Dql\\Mysql\\Day"),
    ("HOUR", "Dql\\Mysql\\Hour"),
    ("MINUTE", "Dql\\Mysql\\Minute"),
    ("MONTH", "Dql\\Mysql\\Month"),
    ("NOW", "Dql\\Mysql\\Now"),
    ("WEEK", "Dql\\Mysql\\Week"),
    ("YEAR", "Dql\\Mysql\\Year"),
];

/// Built-in numeric functions
pub const NUMERIC_FUNCTIONS: &[(&str, &str)] = &[
    ("ACOS", "Dql\\Mysql\\Acos"),
    ("ASIN", "Dql\\Mysql\\Asin"),
    ("ATAN", "Dql\\Mysql\\Atan"),
    ("CEIL", "Dql\\Mysql\\Ceil"),
    ("COS", "Dql\\Mysql\\Cos"),
    ("FLOOR", "Dql\\Mysql\\Floor"),
    ("RAND", "Dql\\Mysql\\Rand"),
    ("ROUND", "Dql\\Mysql\\Round"),
    ("SIN", "Dql\\Mysql\\Sin"),
    ("TAN", "Dql\\Mysql\\Tan"),
];

/// Built-in string functions
pub const STRING_FUNCTIONS: &[(&str, &str)] = &[
    ("CONCAT_WS", "Dql\\Mysql\\ConcatWs"),
    ("FIELD", "Dql\\Mysql\\Field"),
    ("GROUP_CONCAT", "Dql\\Mysql\\GroupConcat"),
    ("IFNULL", "Dql\\Mysql\\IfNull"),
    ("REPLACE", "Dql\\Mysql\\Replace"),
    ("SOUNDEX", "Dql\\Mysql\\Soundex"),
];

/// Column types known before any `mapping_types` override
pub const BUILTIN_TYPES: &[(&str, &str)] = &[
    ("bigint", "Types\\BigIntType"),
    ("blob", "Types\\BlobType"),
    ("boolean", "Types\\BooleanType"),
    ("date", "Types\\DateType"),
    ("datetime", "Types\\DateTimeType"),
    ("decimal", "Types\\DecimalType"),
    ("float", "Types\\FloatType"),
    ("guid", "Types\\GuidType"),
    ("integer", "Types\\IntegerType"),
    ("json", "Types\\JsonType"),
    ("smallint", "Types\\SmallIntType"),
    ("string", "Types\\StringType"),
    ("text", "Types\\TextType"),
    ("time", "Types\\TimeType"),
];

/// Function family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionFamily {
    Datetime,
    Numeric,
    String,
}

impl FunctionFamily {
    /// Configuration key under `orm.dql`
    pub fn config_key(&self) -> &'static str {
        match self {
            FunctionFamily::Datetime => "datetime_functions",
            FunctionFamily::Numeric => "numeric_functions",
            FunctionFamily::String => "string_functions",
        }
    }

    fn builtins(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            FunctionFamily::Datetime => DATETIME_FUNCTIONS,
            FunctionFamily::Numeric => NUMERIC_FUNCTIONS,
            FunctionFamily::String => STRING_FUNCTIONS,
        }
    }
}

/// Custom DQL functions, one table per family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DqlFunctions {
    pub datetime: FunctionMap,
    pub numeric: FunctionMap,
    pub string: FunctionMap,
}

impl DqlFunctions {
    /// Tables seeded with the built-in functions
    pub fn builtin() -> Self {
        Self {
            datetime: seed(FunctionFamily::Datetime.builtins()),
            numeric: seed(FunctionFamily::Numeric.builtins()),
            string: seed(FunctionFamily::String.builtins()),
        }
    }

    /// Empty tables
    pub fn empty() -> Self {
        Self {
            datetime: FunctionMap::new(),
            numeric: FunctionMap::new(),
            string: FunctionMap::new(),
        }
    }

    /// Table for a family
    pub fn table(&self, family: FunctionFamily) -> &FunctionMap {
        match family {
            FunctionFamily::Datetime => &self.datetime,
            FunctionFamily::Numeric => &self.numeric,
            FunctionFamily::String => &self.string,
        }
    }

    fn table_mut(&mut self, family: FunctionFamily) -> &mut FunctionMap {
        match family {
            FunctionFamily::Datetime => &mut self.datetime,
            FunctionFamily::Numeric => &mut self.numeric,
            FunctionFamily::String => &mut self.string,
        }
    }

    /// Insert or replace a function; returns the class it replaced, if any
    pub fn upsert(
        &mut self,
        family: FunctionFamily,
        name: &str,
        class: impl Into<String>,
    ) -> Option<String> {
        let key = name.to_ascii_uppercase();
        let previous = self.table_mut(family).insert(key.clone(), class.into());
        if previous.is_some() {
            tracing::debug!("Overriding {} function '{}'", family.config_key(), key);
        }
        previous
    }

    /// Upsert every entry of `overrides`, in order
    pub fn merge<I, K, V>(&mut self, family: FunctionFamily, overrides: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, class) in overrides {
            self.upsert(family, name.as_ref(), class);
        }
    }
}

impl Default for DqlFunctions {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Registry of column mapping types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRegistry {
    types: BTreeMap<String, String>,
}

impl TypeRegistry {
    /// Registry seeded with [`BUILTIN_TYPES`]
    pub fn builtin() -> Self {
        Self {
            types: BUILTIN_TYPES
                .iter()
                .map(|(name, class)| (name.to_string(), class.to_string()))
                .collect(),
        }
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.types.get(name).map(String::as_str)
    }

    /// Override an existing type or add a new one
    pub fn register(&mut self, name: &str, class: impl Into<String>) {
        let class = class.into();
        if self.has_type(name) {
            tracing::debug!("Overriding mapping type '{}' with {}", name, class);
        } else {
            tracing::debug!("Adding mapping type '{}' as {}", name, class);
        }
        self.types.insert(name.to_string(), class);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.types.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn seed(entries: &[(&str, &str)]) -> FunctionMap {
    entries
        .iter()
        .map(|(name, class)| (name.to_string(), class.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_replaces_single_entry() {
        let mut functions = DqlFunctions::builtin();
        let before = functions.numeric.clone();

        let previous = functions.upsert(FunctionFamily::Numeric, "SIN", "App\\Dql\\Sin");

        assert_eq!(previous.as_deref(), Some("Dql\\Mysql\\Sin"));
        assert_eq!(functions.numeric.len(), before.len());
        assert_eq!(functions.numeric.get("SIN").map(String::as_str), Some("App\\Dql\\Sin"));
        for (name, class) in &before {
            if name != "SIN" {
                assert_eq!(functions.numeric.get(name), Some(class));
            }
        }
    }

    #[test]
    fn test_override_is_case_insensitive() {
        let mut functions = DqlFunctions::builtin();
        functions.upsert(FunctionFamily::Numeric, "sin", "App\\Dql\\Sin");

        assert_eq!(functions.numeric.keys().filter(|k| k.eq_ignore_ascii_case("sin")).count(), 1);
    }

    #[test]
    fn test_new_function_is_added() {
        let mut functions = DqlFunctions::builtin();
        let count = functions.string.len();

        let previous = functions.upsert(FunctionFamily::String, "MATCH_AGAINST", "App\\Dql\\Match");

        assert!(previous.is_none());
        assert_eq!(functions.string.len(), count + 1);
    }

    #[test]
    fn test_merge_keeps_order_last_wins() {
        let mut functions = DqlFunctions::empty();
        functions.merge(
            FunctionFamily::Datetime,
            vec![("DAY", "First"), ("day", "Second")],
        );

        assert_eq!(functions.datetime.len(), 1);
        assert_eq!(functions.datetime.get("DAY").map(String::as_str), Some("Second"));
    }

    #[test]
    fn test_type_registry_upsert() {
        let mut registry = TypeRegistry::builtin();
        let count = registry.len();

        registry.register("json", "App\\Types\\JsonbType");
        registry.register("uuid", "App\\Types\\UuidType");

        assert_eq!(registry.get("json"), Some("App\\Types\\JsonbType"));
        assert_eq!(registry.get("uuid"), Some("App\\Types\\UuidType"));
        assert_eq!(registry.len(), count + 1);
    }
}
