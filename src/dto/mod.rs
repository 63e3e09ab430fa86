pub mod auth;
pub mod cart;
pub mod products;
pub mod sites;
pub mod social_apps;
pub mod users;

use serde::{Deserialize, Deserializer};

/// Keeps an explicit `null` apart from a missing key: missing is `None`,
/// `null` is `Some(None)`. Pair with `#[serde(default)]`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// PUT replaces every writable field, PATCH only the ones present in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Full,
    Partial,
}
