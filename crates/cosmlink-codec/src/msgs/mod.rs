//! Base Cosmos SDK message set

pub mod bank;
pub mod gov;
pub mod staking;

use crate::registry::{Registry, RegistryEntry};

pub use bank::MsgSend;
pub use gov::{MsgSubmitProposal, MsgVote, TextProposal, VoteOption};
pub use staking::MsgDelegate;

/// Registry entries for the base message set
pub fn base_entries() -> Vec<RegistryEntry> {
    vec![
        RegistryEntry::of::<MsgSend>(),
        RegistryEntry::of::<MsgDelegate>(),
        RegistryEntry::of::<MsgVote>(),
        RegistryEntry::of::<MsgSubmitProposal>(),
    ]
}

/// Registry holding the base message set
pub fn default_registry() -> Registry {
    Registry::builder().register_all(base_entries()).build()
}
