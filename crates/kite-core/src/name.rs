//! Hierarchical NDN names
//!
//! A [`Name`] is an ordered list of generic components. Components are kept
//! as strings; percent-escaped markers such as the `%FD` version prefix are
//! stored verbatim and interpreted by [`version_from_component`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NameError;

/// First component of names that must never leave the local host
pub const LOCALHOST: &str = "localhost";

/// Marker that prefixes a version component (`%FD%01` is version 1)
pub const VERSION_MARKER: &str = "%FD";

/// An NDN name
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Name {
    components: Vec<String>,
}

impl Name {
    /// The root name `/`
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a name from its URI form
    pub fn parse(uri: &str) -> Result<Self, NameError> {
        let path = uri.strip_prefix("ndn:").unwrap_or(uri);
        if !path.starts_with('/') {
            return Err(NameError::InvalidUri(uri.to_string()));
        }
        Ok(Self {
            components: path
                .split('/')
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }

    /// Build a name from an iterator of components
    pub fn from_components<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: components.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a component, consuming the name
    pub fn append(mut self, component: impl Into<String>) -> Self {
        self.components.push(component.into());
        self
    }

    /// Append a component in place
    pub fn push(&mut self, component: impl Into<String>) {
        self.components.push(component.into());
    }

    /// Append every component of `other`
    pub fn concat(mut self, other: &Name) -> Self {
        self.components.extend(other.components.iter().cloned());
        self
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether this is the root name
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component at `index`
    pub fn get(&self, index: usize) -> Option<&str> {
        self.components.get(index).map(String::as_str)
    }

    /// Iterate over components
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    /// The first `len` components (the whole name if `len` is larger)
    pub fn prefix(&self, len: usize) -> Name {
        Self {
            components: self.components[..len.min(self.components.len())].to_vec(),
        }
    }

    /// Components from `start` to the end
    pub fn sub_name(&self, start: usize) -> Name {
        Self {
            components: self.components[start.min(self.components.len())..].to_vec(),
        }
    }

    /// Index of the first component equal to `component`
    pub fn position(&self, component: &str) -> Option<usize> {
        self.components.iter().position(|c| c == component)
    }

    /// Whether this name is a prefix of (or equal to) `other`
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.len() <= other.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a == b)
    }

    /// Whether this name lives under `/localhost`
    pub fn is_localhost(&self) -> bool {
        self.get(0) == Some(LOCALHOST)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Encode `version` as a `%FD`-marked component
pub fn version_component(version: u64) -> String {
    let bytes = version.to_be_bytes();
    let width = match version {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFFFF_FFFF => 4,
        _ => 8,
    };
    let mut component = VERSION_MARKER.to_string();
    for byte in &bytes[8 - width..] {
        component.push_str(&format!("%{:02X}", byte));
    }
    component
}

/// Decode a `%FD`-marked version component
pub fn version_from_component(component: &str) -> Result<u64, NameError> {
    let invalid = || NameError::InvalidVersion(component.to_string());
    let digits = component.strip_prefix(VERSION_MARKER).ok_or_else(invalid)?;
    if digits.is_empty() || digits.len() % 3 != 0 || digits.len() / 3 > 8 {
        return Err(invalid());
    }
    let mut version = 0u64;
    for chunk in digits.as_bytes().chunks(3) {
        if chunk[0] != b'%' {
            return Err(invalid());
        }
        let hex = std::str::from_utf8(&chunk[1..]).map_err(|_| invalid())?;
        let byte = u8::from_str_radix(hex, 16).map_err(|_| invalid())?;
        version = (version << 8) | u64::from(byte);
    }
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let name = Name::parse("/rv/mp/data").unwrap();
        assert_eq!(name.len(), 3);
        assert_eq!(name.get(1), Some("mp"));
        assert_eq!(name.to_string(), "/rv/mp/data");

        assert_eq!(Name::parse("/").unwrap(), Name::root());
        assert_eq!(Name::root().to_string(), "/");
        assert_eq!(Name::parse("ndn:/a//b/").unwrap().to_string(), "/a/b");
        assert!(Name::parse("relative").is_err());
    }

    #[test]
    fn test_prefix_relations() {
        let mp = Name::parse("/mp").unwrap();
        let data = Name::parse("/mp/video/1").unwrap();

        assert!(mp.is_prefix_of(&data));
        assert!(data.is_prefix_of(&data));
        assert!(!data.is_prefix_of(&mp));
        assert!(Name::root().is_prefix_of(&mp));
        assert_eq!(data.prefix(2).to_string(), "/mp/video");
        assert_eq!(data.prefix(10), data);
        assert_eq!(data.sub_name(1).to_string(), "/video/1");
    }

    #[test]
    fn test_localhost() {
        assert!(Name::parse("/localhost/nfd").unwrap().is_localhost());
        assert!(!Name::parse("/mp/localhost").unwrap().is_localhost());
    }

    #[test]
    fn test_version_components() {
        assert_eq!(version_component(1), "%FD%01");
        assert_eq!(version_component(0x0102), "%FD%01%02");
        assert_eq!(version_from_component("%FD%01").unwrap(), 1);
        assert_eq!(version_from_component("%FD%01%02").unwrap(), 0x0102);
        assert_eq!(
            version_from_component(&version_component(u64::MAX)).unwrap(),
            u64::MAX
        );
        assert!(version_from_component("kite").is_err());
        assert!(version_from_component("%FD").is_err());
        assert!(version_from_component("%FD%ZZ").is_err());
    }
}
