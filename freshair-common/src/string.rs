use core::{borrow::Borrow, fmt::Display, ops::Deref};

use compact_str::{CompactString, ToCompactString};
use serde::{Deserialize, Serialize};

/// Home Assistant entity id, eg. `fan.living_room`
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(CompactString);

impl EntityId {
    pub const fn const_new(s: &'static str) -> Self {
        Self(CompactString::const_new(s))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Part before the first dot, eg. `fan` for `fan.living_room`
    pub fn domain(&self) -> Option<&str> {
        self.0.split_once('.').map(|(domain, _)| domain)
    }
}

impl<T: AsRef<str>> From<T> for EntityId {
    fn from(value: T) -> Self {
        EntityId(value.as_ref().to_compact_string())
    }
}

impl Deref for EntityId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl<T: AsRef<str> + ?Sized> PartialEq<T> for EntityId {
    fn eq(&self, other: &T) -> bool {
        self.0.as_str() == other.as_ref()
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}
