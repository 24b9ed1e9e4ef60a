//! Flat key/value job inputs.
//!
//! Translate requests arrive as a flat urlencoded form: typed fields and
//! engine detail fields side by side, every value a string. `RawInputs`
//! wraps that map and owns the string-to-type readings the settings builder
//! and rate-limit resolver need. Blank values are treated as absent, since
//! HTML forms submit empty strings for untouched fields.

use std::collections::BTreeMap;

/// Truthy tokens accepted for boolean fields (case-insensitive).
const TRUE_TOKENS: &[&str] = &["true", "1", "yes", "on"];
/// Falsy tokens accepted for boolean fields (case-insensitive).
const FALSE_TOKENS: &[&str] = &["false", "0", "no", "off"];

/// The flat key/value form a job-start request carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInputs(BTreeMap<String, String>);

impl RawInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw value for a key; blank (empty or whitespace-only) counts as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Whether a non-blank value is present for the key.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Integer reading; `None` when absent, `Some(None)` when present but not
    /// an integer. Callers decide which of the two is an error.
    pub fn get_i64(&self, key: &str) -> Option<Option<i64>> {
        self.get(key).map(|v| v.parse::<i64>().ok())
    }

    /// Float reading with the same present/parse split as [`get_i64`].
    ///
    /// [`get_i64`]: RawInputs::get_i64
    pub fn get_f64(&self, key: &str) -> Option<Option<f64>> {
        self.get(key).map(|v| v.parse::<f64>().ok())
    }

    /// Boolean reading accepting the common form tokens; `Some(None)` when
    /// present but not recognized.
    pub fn get_bool(&self, key: &str) -> Option<Option<bool>> {
        self.get(key).map(parse_bool_token)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// New map holding the `prefix`-stripped subset of keys, used to re-key
    /// `term_`-prefixed rate-limit inputs before resolution.
    pub fn strip_prefix(&self, prefix: &str) -> RawInputs {
        let mut out = RawInputs::new();
        for (key, value) in &self.0 {
            if let Some(stripped) = key.strip_prefix(prefix) {
                out.insert(stripped, value.clone());
            }
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawInputs {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut inputs = RawInputs::new();
        for (k, v) in iter {
            inputs.insert(k, v);
        }
        inputs
    }
}

/// Parse one boolean token; `None` for unrecognized input.
pub fn parse_bool_token(value: &str) -> Option<bool> {
    let lowered = value.to_ascii_lowercase();
    if TRUE_TOKENS.contains(&lowered.as_str()) {
        Some(true)
    } else if FALSE_TOKENS.contains(&lowered.as_str()) {
        Some(false)
    } else {
        None
    }
}
