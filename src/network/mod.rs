//! Network segmentation module.
//!
//! Builds the isolated network every other resource binds to: one public
//! and one private-with-egress subnet group, each spanning all configured
//! availability zones.

pub mod allocator;
pub mod types;

// Re-export commonly used types
pub use allocator::{build_network, build_network_with};
pub use types::{NetworkModel, Placement, Subnet, SubnetGroup, SubnetKind};
