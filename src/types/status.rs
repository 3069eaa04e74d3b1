/// Registration status from the voter file (`voter_status_desc`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VoterStatus {
    Active,
    Inactive,
    Removed,
    Denied,
    Temporary,
    Other(String),
}

impl VoterStatus {
    /// Parse a status description. Matching is exact: only `ACTIVE` is active.
    pub fn parse(desc: &str) -> Self {
        match desc {
            "ACTIVE" => VoterStatus::Active,
            "INACTIVE" => VoterStatus::Inactive,
            "REMOVED" => VoterStatus::Removed,
            "DENIED" => VoterStatus::Denied,
            "TEMPORARY" => VoterStatus::Temporary,
            other => VoterStatus::Other(other.to_string()),
        }
    }

    #[inline] pub fn is_active(&self) -> bool { matches!(self, VoterStatus::Active) }
}
