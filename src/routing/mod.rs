//! Path-routed forwarding rules on the shared entry point.

pub mod pattern;
pub mod table;

pub use pattern::{PathPattern, MATCH_ALL};
pub use table::{
    DefaultAction, FinalizedRoutes, Priority, ResolvedRoute, RouteDeclaration, RouteEntry,
    RouteTarget, RoutingTable, MAX_PRIORITY,
};
