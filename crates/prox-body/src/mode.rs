//! The robot's discrete operating state.

use std::collections::BTreeMap;
use std::fmt;

/// An ordered mapping from string variables to string values, defining a mode
/// of operation (equivalently, the discrete state of a body).
///
/// The empty mapping is the "empty mode", used as the occupant of the
/// zeroth mode presence before the first real state arrives.
///
/// Modes are value types.  Equality is structural; the derived `Ord` is
/// lexicographic over the ordered `(variable, value)` pairs, which gives the
/// total order the predictor's mode maps rely on.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Mode {
    mapping: BTreeMap<String, String>,
}

impl Mode {
    /// The empty mode.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether there are no variables defined.
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// The values held.
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.mapping
    }
}

impl From<BTreeMap<String, String>> for Mode {
    fn from(mapping: BTreeMap<String, String>) -> Self {
        Self { mapping }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Mode {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            mapping: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Mode {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.mapping.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{k}|{v}")?;
        }
        write!(f, "}}")
    }
}
