use core::fmt;

/// Internal player identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A player, deduplicated by the remote service's stable user id.
///
/// `name` follows the remote service and may change between syncs;
/// `display_name` is a local override used when presenting rankings.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Player {
    pub id: PlayerId,
    pub metanet_id: u32,
    pub name: String,
    pub display_name: Option<String>,
}

impl Player {
    pub fn new(id: PlayerId, metanet_id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            metanet_id,
            name: name.into(),
            display_name: None,
        }
    }

    /// Name shown in rankings.
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}
