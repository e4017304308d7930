//! In-memory state of monitored nodes and their hosts
//!
//! Each setter compares the new observation with the previous one and raises
//! alerts on the transitions that matter. A value observed for the first time
//! is stored without alerting.

pub mod node;
pub mod system;

pub use node::{NodeIdentity, NodeSnapshot, NodeState};
pub use system::{SystemSnapshot, SystemState};
