//! Configuration properties.
//!
//! Tools receive a [`ConfigProperties`] map built from `-O` command-line options.
//! Each option is either a `key=value` pair or the path of a file in Java
//! properties format. Files are merged first, in the order given, then the
//! `key=value` pairs are applied on top; within each group the last value wins.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::debug;

use crate::errors::{CltoolError, Result};

/// Ordered string-keyed configuration map.
///
/// # Example
/// ```
/// use cltool_lib::config::ConfigProperties;
///
/// let mut props = ConfigProperties::parse("beam = 20\n# comment\ndebug: yes\n");
/// props.set("model", "pcfg");
///
/// assert_eq!(props.get_int("beam").unwrap(), 20);
/// assert!(props.get_bool("debug").unwrap());
/// assert_eq!(props.get_or("missing", "fallback"), "fallback");
/// assert_eq!(props.to_string(), "beam=20\ndebug=yes\nmodel=pcfg");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigProperties {
    values: BTreeMap<String, String>,
}

impl ConfigProperties {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the effective configuration from `-O` option values.
    ///
    /// A value is treated as a `key=value` pair when it contains `=` and does not
    /// name an existing file; otherwise it is loaded as a properties file.
    ///
    /// # Errors
    ///
    /// Returns an error if a properties file cannot be read.
    pub fn from_options<S: AsRef<str>>(options: &[S]) -> Result<Self> {
        let mut props = Self::new();
        let mut pairs = Vec::new();

        for option in options {
            let option = option.as_ref();
            match option.split_once('=') {
                Some((key, value)) if !Path::new(option).is_file() => {
                    pairs.push((key.trim(), value.trim()));
                }
                _ => props.merge_over(&Self::load(option)?),
            }
        }
        for (key, value) in pairs {
            props.set(key, value);
        }
        Ok(props)
    }

    /// Reads a properties file.
    ///
    /// # Errors
    ///
    /// Returns [`CltoolError::InputNotFound`] if the file does not exist and
    /// [`CltoolError::Input`] if it cannot be read.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CltoolError::InputNotFound {
                description: "Properties file".to_string(),
                path: path.display().to_string(),
            });
        }
        let text = fs::read_to_string(path).map_err(CltoolError::Input)?;
        let props = Self::parse(&text);
        debug!("Loaded {} properties from {}", props.len(), path.display());
        Ok(props)
    }

    /// Parses text in Java properties format.
    ///
    /// Supports `#` and `!` comments, `=`, `:` or whitespace separators, line
    /// continuation with a trailing backslash, and the usual escapes.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut props = Self::new();
        let mut logical = String::new();

        for raw in text.lines() {
            let line = raw.trim_start();
            if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
            {
                continue;
            }
            if ends_with_continuation(line) {
                logical.push_str(&line[..line.len() - 1]);
                continue;
            }
            logical.push_str(line);
            let (key, value) = split_entry(&logical);
            props.set(key, value);
            logical.clear();
        }
        if !logical.is_empty() {
            let (key, value) = split_entry(&logical);
            props.set(key, value);
        }
        props
    }

    /// Returns the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CltoolError::MissingProperty`] if the key is not set.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| CltoolError::MissingProperty { key: key.to_string() })
    }

    /// Returns the value for `key`, or `default` if it is not set.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values.get(key).map_or(default, String::as_str)
    }

    /// Parses the value for `key` as an integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or the value is not an integer.
    pub fn get_int(&self, key: &str) -> Result<i64> {
        self.parsed(key)
    }

    /// Parses the value for `key` as an integer, or returns `default` if unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is set but the value is not an integer.
    pub fn get_int_or(&self, key: &str, default: i64) -> Result<i64> {
        if self.contains_key(key) { self.get_int(key) } else { Ok(default) }
    }

    /// Parses the value for `key` as a float.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or the value is not a number.
    pub fn get_float(&self, key: &str) -> Result<f64> {
        self.parsed(key)
    }

    /// Parses the value for `key` as a float, or returns `default` if unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is set but the value is not a number.
    pub fn get_float_or(&self, key: &str, default: f64) -> Result<f64> {
        if self.contains_key(key) { self.get_float(key) } else { Ok(default) }
    }

    /// Parses the value for `key` as a boolean.
    ///
    /// Accepts `true/false`, `t/f`, `yes/no`, `on/off` and `1/0`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or the value is not a boolean.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get(key)?;
        parse_bool(value).ok_or_else(|| CltoolError::InvalidProperty {
            key: key.to_string(),
            reason: format!("'{value}' is not a boolean"),
        })
    }

    /// Parses the value for `key` as a boolean, or returns `default` if unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is set but the value is not a boolean.
    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        if self.contains_key(key) { self.get_bool(key) } else { Ok(default) }
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns true if `key` is set.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Copies every entry of `other` into `self`; values from `other` win.
    pub fn merge_over(&mut self, other: &ConfigProperties) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Copies entries of `other` whose keys are not already set.
    pub fn merge_under(&mut self, other: &ConfigProperties) {
        for (key, value) in &other.values {
            self.values.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no entries are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn parsed<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get(key)?.trim().parse().map_err(|e: T::Err| CltoolError::InvalidProperty {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigProperties {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut props = Self::new();
        for (key, value) in iter {
            props.set(key, value);
        }
        props
    }
}

/// Lists entries as sorted `key=value` lines without a trailing newline.
impl fmt::Display for ConfigProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.values.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// An odd number of trailing backslashes continues the line.
fn ends_with_continuation(line: &str) -> bool {
    line.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (String, String) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || c.is_whitespace() {
            key_end = i;
            break;
        }
    }

    let rest = line[key_end..].trim_start();
    let rest = rest.strip_prefix(['=', ':']).unwrap_or(rest).trim_start();
    (unescape(&line[..key_end]), unescape(rest))
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
