use serde::{Deserialize, Serialize};

/// An entry of the known-user roster that anonymous callers may browse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
}
