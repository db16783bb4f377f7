//! ServiceSpec to ServiceResource compilation.
//!
//! Each logical service becomes private compute with its own security
//! boundary, a DNS-addressable backend, a target group for the entry point
//! and a read policy over exactly the secrets it references.

pub mod compiler;
pub mod env;
pub mod types;

pub use compiler::{compile, compile_all, compile_with, container_port, CompileContext, ServicePlan};
pub use env::{interpolate, resolve_environment, BackendRegistry};
pub use types::{
    Backend, ComputeShape, HealthCheck, LogGroup, SecretBinding, SecretRef, ServiceId,
    ServiceResource, ServiceSpec, TargetGroup, TaskDefinition,
};
