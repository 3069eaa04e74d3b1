/// Party affiliation code from the voter file (`party_cd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Party {
    Dem,    // Democratic
    Rep,    // Republican
    Una,    // Unaffiliated
    Other,  // Libertarian, Green, ...
}

impl Party {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "DEM" => Party::Dem,
            "REP" => Party::Rep,
            "UNA" => Party::Una,
            _ => Party::Other,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Party::Dem => "DEM",
            Party::Rep => "REP",
            Party::Una => "UNA",
            Party::Other => "OTHER",
        }
    }

    /// The three parties the analysis breaks out.
    pub fn main() -> [Party; 3] { [Party::Dem, Party::Rep, Party::Una] }

    #[inline] pub fn is_main(&self) -> bool { !matches!(self, Party::Other) }
}
