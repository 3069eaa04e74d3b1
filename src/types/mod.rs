mod party;
mod status;

pub use party::Party;
pub use status::VoterStatus;
