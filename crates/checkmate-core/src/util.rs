//! Small serde helpers shared by the input and output models.

use serde::{Deserialize, Deserializer};

/// Marks a key as present even when its value is `null`.
///
/// Pair with `#[serde(default)]` so an absent key stays `None` while an
/// explicit `null` becomes `Some(..)`.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
