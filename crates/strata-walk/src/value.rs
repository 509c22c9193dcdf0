//! Walkable value models
//!
//! [`Walkable`] is implemented for `serde_json::Value` and
//! `serde_yaml::Value`; other tree-shaped types can opt in.

use std::fmt::{self, Display, Formatter};

/// Address of a value inside its immediate container
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// Key within a mapping
    Key(String),
    /// Position within a sequence
    Index(usize),
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, ".{key}"),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Render a container path as `$.a[0].b`
#[must_use]
pub fn render_path(path: &[Location]) -> String {
    let mut out = String::from("$");
    for location in path {
        out.push_str(&location.to_string());
    }
    out
}

/// Mutable entries of a container
pub type Entries<'a, V> = Box<dyn Iterator<Item = (Location, &'a mut V)> + 'a>;

/// A nested mapping/sequence structure
pub trait Walkable: Sized {
    /// Entries of this value when it is a mapping or sequence, `None` otherwise
    ///
    /// Mapping keys appear only as [`Location::Key`]; they are never yielded
    /// as values.
    fn entries_mut(&mut self) -> Option<Entries<'_, Self>>;
}

impl Walkable for serde_json::Value {
    fn entries_mut(&mut self) -> Option<Entries<'_, Self>> {
        match self {
            Self::Object(map) => Some(Box::new(
                map.iter_mut()
                    .map(|(key, value)| (Location::Key(key.clone()), value)),
            )),
            Self::Array(items) => Some(Box::new(
                items
                    .iter_mut()
                    .enumerate()
                    .map(|(index, value)| (Location::Index(index), value)),
            )),
            _ => None,
        }
    }
}

/// Tagged YAML values (`!tag value`) are leaves: they are the usual
/// encoding of deferred values and are matched, not descended into.
impl Walkable for serde_yaml::Value {
    fn entries_mut(&mut self) -> Option<Entries<'_, Self>> {
        match self {
            Self::Mapping(map) => Some(Box::new(
                map.iter_mut()
                    .map(|(key, value)| (Location::Key(yaml_key(key)), value)),
            )),
            Self::Sequence(items) => Some(Box::new(
                items
                    .iter_mut()
                    .enumerate()
                    .map(|(index, value)| (Location::Index(index), value)),
            )),
            _ => None,
        }
    }
}

fn yaml_key(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "~".to_string(),
        other => format!("{other:?}"),
    }
}
