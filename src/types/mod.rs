mod node;
mod proposal;
mod role;
mod status;

pub use node::{NodeKind, NodeRecord};
pub use proposal::{Ballot, GovernanceAction, Proposal, ProposalStatus, VoteChoice};
pub use role::{RoleKind, RoleRecord};
pub use status::{ActionKind, EntityKind, GovernanceStatus};

pub type Address = String;
