pub mod credential_set;
pub mod outcomes;

pub use credential_set::CredentialSet;
pub use outcomes::{AddOutcome, Committed, ConsumeOutcome, CredentialListing, RemoveOutcome};
