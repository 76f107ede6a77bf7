//! Application services: session state, cached reads and invalidating writes.

pub mod marketplace;
pub mod mutations;
pub mod session;

pub use marketplace::Marketplace;
pub use mutations::{MutationCoordinator, MutationDescriptor, MutationKind};
pub use session::{Identity, Session};
