//! `key:value` tag tokens.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Split a tag at its first `:`.
///
/// The value keeps any further `:` characters. A tag without `:` is all key
/// and has an empty value.
///
/// ```
/// use dogapi_lib::split_tag;
///
/// assert_eq!(split_tag("env:production"), ("env", "production"));
/// assert_eq!(split_tag("region:us:east"), ("region", "us:east"));
/// assert_eq!(split_tag("standalone"), ("standalone", ""));
/// ```
pub fn split_tag(tag: &str) -> (&str, &str) {
    tag.split_once(':').unwrap_or((tag, ""))
}

/// Owned form of a tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl FromStr for Tag {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = split_tag(s);
        Ok(Tag::new(key, value))
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        let (key, value) = split_tag(s);
        Tag::new(key, value)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            f.write_str(&self.key)
        } else {
            write!(f, "{}:{}", self.key, self.value)
        }
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Tag::from(s.as_str()))
    }
}
