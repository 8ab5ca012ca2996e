use serde::{Deserialize, Serialize};
use std::{fmt::Display, ops::Deref};

/// Record id shared by lists and items. Freshly generated ids are ULIDs,
/// but any string coming back from the index is accepted as is.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct Eid(String);

impl Display for Eid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for Eid {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for Eid {
    fn from(fr: &str) -> Self {
        Eid(fr.to_string())
    }
}

impl From<String> for Eid {
    fn from(fr: String) -> Self {
        Eid(fr)
    }
}

impl Eid {
    #[inline]
    pub fn new() -> Eid {
        Eid(rusty_ulid::generate_ulid_string())
    }
}

impl Default for Eid {
    fn default() -> Self {
        Self::new()
    }
}
