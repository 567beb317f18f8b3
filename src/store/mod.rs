//! Runtime store for declared configuration variables.
//!
//! An instance-owned counterpart to the declaration blocks the autodoc
//! scanner reads: the store holds the declared variables and their
//! current values, loads overrides from YAML files or prefixed
//! environment variables, and supports scoped overrides that restore the
//! previous values on every exit path.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ConfdocError, Result};

/// Values meaning "true" for [`ConfigStore::is_true`].
static TRUTHY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:true|1|yes|on)\s*$").expect("truthy pattern is valid"));

/// Holds the declared configuration variables and their current values.
///
/// Every accessor rejects undeclared keys with
/// [`ConfdocError::UnsupportedVariable`]; the set of variables is fixed
/// at construction.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    names: Vec<String>,
    defaults: HashMap<String, Option<String>>,
    values: HashMap<String, Option<String>>,
    deprecation_warnings: bool,
}

impl ConfigStore {
    /// Creates a store from the declared variables and their defaults.
    /// A `None` default mirrors a variable declared without a value.
    /// Declaration order is kept for [`ConfigStore::variables`]; a
    /// repeated key keeps its first position and last default.
    pub fn new<K, V>(defaults: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Option<String>>,
    {
        let mut names = Vec::new();
        let mut map: HashMap<String, Option<String>> = HashMap::new();
        for (key, value) in defaults {
            let key = key.into();
            if !map.contains_key(&key) {
                names.push(key.clone());
            }
            map.insert(key, value.into());
        }

        Self {
            names,
            values: map.clone(),
            defaults: map,
            deprecation_warnings: true,
        }
    }

    /// Current value of a declared variable.
    pub fn get(&self, key: &str) -> Result<Option<&str>> {
        self.values
            .get(key)
            .map(|v| v.as_deref())
            .ok_or_else(|| ConfdocError::UnsupportedVariable(key.to_string()))
    }

    /// Replaces the value of a declared variable.
    pub fn set(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        match self.values.get_mut(key) {
            Some(slot) => {
                *slot = value.map(|v| v.to_string());
                Ok(())
            }
            None => Err(ConfdocError::UnsupportedVariable(key.to_string())),
        }
    }

    /// True when the variable's value reads as affirmative
    /// (`true`, `1`, `yes` or `on`, case-insensitive).
    pub fn is_true(&self, key: &str) -> Result<bool> {
        Ok(matches!(self.get(key)?, Some(v) if TRUTHY_RE.is_match(v)))
    }

    /// Negation of [`ConfigStore::is_true`].
    pub fn is_false(&self, key: &str) -> Result<bool> {
        Ok(!self.is_true(key)?)
    }

    /// Names of all declared variables, in declaration order.
    pub fn variables(&self) -> Vec<&str> {
        self.names.iter().map(|k| k.as_str()).collect()
    }

    /// Snapshot of the current values. The map carries no ordering;
    /// iterate [`ConfigStore::variables`] for declaration order.
    pub fn dump(&self) -> HashMap<String, Option<String>> {
        self.values.clone()
    }

    /// Restores every variable to its declared default.
    pub fn reset(&mut self) {
        self.values = self.defaults.clone();
    }

    /// Loads values from a YAML file of key/value pairs. Scalars are
    /// stored as strings, explicit nulls clear the value, and undeclared
    /// keys are rejected.
    pub fn load_yaml(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let data: serde_yaml::Value = serde_yaml::from_str(&content)?;

        let mapping = data.as_mapping().ok_or_else(|| {
            ConfdocError::Initialization("bad YAML format, key/value pairs expected".to_string())
        })?;

        for (key, value) in mapping {
            let key = yaml_key(key)?;
            let value = yaml_scalar(value)?;
            self.set(&key, value.as_deref())?;
        }

        tracing::debug!(path = %path.display(), "configuration loaded from YAML");
        Ok(())
    }

    /// Loads values from environment variables carrying `prefix`. The
    /// remainder of each matching key, lowercased, must be a declared
    /// variable.
    pub fn load_env(&mut self, prefix: &str) -> Result<()> {
        for (key, value) in std::env::vars() {
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            self.set(&rest.to_lowercase(), Some(&value))?;
        }

        tracing::debug!(prefix, "configuration loaded from environment");
        Ok(())
    }

    /// Runs `f` with the given overrides applied, restoring the previous
    /// values on every exit path. A panic inside `f` is resumed after
    /// the restore.
    pub fn with_overrides<T, F>(&mut self, overrides: &[(&str, &str)], f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> T,
    {
        let saved = self.values.clone();

        for &(key, value) in overrides {
            if let Err(e) = self.set(key, Some(value)) {
                self.values = saved;
                return Err(e);
            }
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| f(self)));
        self.values = saved;

        match result {
            Ok(value) => Ok(value),
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Toggles whether [`ConfigStore::warn_deprecated`] emits anything.
    pub fn set_deprecation_warnings(&mut self, enabled: bool) {
        self.deprecation_warnings = enabled;
    }

    pub fn deprecation_warnings(&self) -> bool {
        self.deprecation_warnings
    }

    /// Emits a deprecation warning unless warnings are disabled.
    pub fn warn_deprecated(&self, message: &str) {
        if self.deprecation_warnings {
            tracing::warn!(deprecated = true, "{}", message);
        }
    }
}

fn yaml_key(key: &serde_yaml::Value) -> Result<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        // YAML casts bare yes/no/on/off keys to booleans; keep their text
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(ConfdocError::Initialization(format!(
            "unsupported YAML key: {:?}",
            other
        ))),
    }
}

fn yaml_scalar(value: &serde_yaml::Value) -> Result<Option<String>> {
    match value {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::Bool(b) => Ok(Some(b.to_string())),
        serde_yaml::Value::Number(n) => Ok(Some(n.to_string())),
        serde_yaml::Value::String(s) => Ok(Some(s.clone())),
        other => Err(ConfdocError::Initialization(format!(
            "scalar value expected, got {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ConfigStore {
        ConfigStore::new([
            ("my_var", Some("default value".to_string())),
            ("default_is_nil", None),
            ("flag", Some("on".to_string())),
        ])
    }

    #[test]
    fn test_get_returns_defaults() {
        let store = store();

        assert_eq!(store.get("my_var").unwrap(), Some("default value"));
        assert_eq!(store.get("default_is_nil").unwrap(), None);
    }

    #[test]
    fn test_get_unsupported_variable() {
        let store = store();

        assert!(matches!(
            store.get("do_not_exist"),
            Err(ConfdocError::UnsupportedVariable(name)) if name == "do_not_exist"
        ));
    }

    #[test]
    fn test_set_and_reset() {
        let mut store = store();

        store.set("my_var", Some("changed")).unwrap();
        assert_eq!(store.get("my_var").unwrap(), Some("changed"));

        store.reset();
        assert_eq!(store.get("my_var").unwrap(), Some("default value"));
    }

    #[test]
    fn test_set_unsupported_variable() {
        let mut store = store();

        assert!(store.set("nope", Some("x")).is_err());
    }

    #[test]
    fn test_truthiness() {
        let mut store = store();

        for value in ["true", "1", "yes", "on", " TRUE ", "Yes"] {
            store.set("flag", Some(value)).unwrap();
            assert!(store.is_true("flag").unwrap(), "{value:?} should be true");
        }

        for value in ["false", "0", "no", "off", "anything", ""] {
            store.set("flag", Some(value)).unwrap();
            assert!(store.is_false("flag").unwrap(), "{value:?} should be false");
        }

        store.set("flag", None).unwrap();
        assert!(store.is_false("flag").unwrap());
    }

    #[test]
    fn test_variables_in_declaration_order() {
        let store = ConfigStore::new([
            ("zeta", Some("z".to_string())),
            ("alpha", None),
            ("middle", Some("m".to_string())),
        ]);

        assert_eq!(store.variables(), ["zeta", "alpha", "middle"]);
    }

    #[test]
    fn test_variables_and_dump() {
        let store = store();

        assert_eq!(store.variables(), ["my_var", "default_is_nil", "flag"]);

        let dump = store.dump();
        assert_eq!(dump["my_var"].as_deref(), Some("default value"));
        assert_eq!(dump["default_is_nil"], None);
    }

    #[test]
    fn test_load_yaml() {
        use std::io::Write;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "my_var: from yaml").unwrap();
        writeln!(file, "flag: true").unwrap();
        writeln!(file, "default_is_nil: null").unwrap();

        let mut store = store();
        store.load_yaml(&path).unwrap();

        assert_eq!(store.get("my_var").unwrap(), Some("from yaml"));
        assert_eq!(store.get("flag").unwrap(), Some("true"));
        assert_eq!(store.get("default_is_nil").unwrap(), None);
    }

    #[test]
    fn test_load_yaml_rejects_undeclared_keys() {
        use std::io::Write;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "does_not_exist: boom").unwrap();

        let mut store = store();

        assert!(matches!(
            store.load_yaml(&path),
            Err(ConfdocError::UnsupportedVariable(_))
        ));
    }

    #[test]
    fn test_load_yaml_rejects_non_mapping() {
        use std::io::Write;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "- just").unwrap();
        writeln!(file, "- a list").unwrap();

        let mut store = store();

        assert!(matches!(
            store.load_yaml(&path),
            Err(ConfdocError::Initialization(_))
        ));
    }

    #[test]
    fn test_load_yaml_missing_file() {
        let mut store = store();

        assert!(matches!(
            store.load_yaml("/definitely/not/here.yaml"),
            Err(ConfdocError::Io(_))
        ));
    }

    #[test]
    fn test_load_env() {
        std::env::set_var("CONFDOC_STORE_TEST_MY_VAR", "from env");

        let mut store = store();
        store.load_env("CONFDOC_STORE_TEST_").unwrap();

        assert_eq!(store.get("my_var").unwrap(), Some("from env"));

        std::env::remove_var("CONFDOC_STORE_TEST_MY_VAR");
    }

    #[test]
    fn test_load_env_rejects_undeclared_keys() {
        std::env::set_var("CONFDOC_STORE_BAD_NO_SUCH_VAR", "boom");

        let mut store = store();
        let result = store.load_env("CONFDOC_STORE_BAD_");

        assert!(matches!(
            result,
            Err(ConfdocError::UnsupportedVariable(name)) if name == "no_such_var"
        ));

        std::env::remove_var("CONFDOC_STORE_BAD_NO_SUCH_VAR");
    }

    #[test]
    fn test_with_overrides_restores_values() {
        let mut store = store();

        let seen = store
            .with_overrides(&[("my_var", "scoped")], |s| {
                s.get("my_var").unwrap().map(|v| v.to_string())
            })
            .unwrap();

        assert_eq!(seen.as_deref(), Some("scoped"));
        assert_eq!(store.get("my_var").unwrap(), Some("default value"));
    }

    #[test]
    fn test_with_overrides_rejects_undeclared_keys() {
        let mut store = store();

        let result = store.with_overrides(&[("nope", "x")], |_| ());

        assert!(result.is_err());
        assert_eq!(store.get("my_var").unwrap(), Some("default value"));
    }

    #[test]
    fn test_with_overrides_restores_after_panic() {
        let mut store = store();

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
            store
                .with_overrides(&[("my_var", "scoped")], |_| panic!("inner failure"))
                .unwrap();
        }));

        assert!(outcome.is_err());
        assert_eq!(store.get("my_var").unwrap(), Some("default value"));
    }
}
