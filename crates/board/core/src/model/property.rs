/// Well-known keys of the process-wide property store.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GlobalKey {
    /// RFC 3339 time the next score sync is due.
    NextScoreSync,
    /// RFC 3339 time the next demo backfill is due.
    NextDemoSync,
    /// Credential that last produced a valid response.
    ActiveTicket,
}

/// Key/value pair used for scheduling bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalProperty {
    pub key: GlobalKey,
    pub value: String,
}
