//! # StackSynth - Deployment topology synthesizer for containerized service stacks
//!
//! This library turns a declarative stack file (services, secrets, data
//! stores and routes) into a fully connected deployment topology: an
//! isolated network, one security boundary per service, a single public
//! entry point with prioritized path routing, least-privilege secret access
//! and a resource manifest a provisioning backend can apply.
//!
//! ## Overview
//!
//! Synthesis runs as a linear state machine. Every phase either advances the
//! run or stops it with the last reached state and the partial graph:
//!
//! ```text
//! Init -> NetworkReady -> BoundariesDeclared -> EdgesApplied
//!      -> ServicesCompiled -> RoutesFinalized -> Emitted
//! ```
//!
//! ## Architecture
//!
//! - `config`: Stack file structures and validation
//! - `config_loader`: Stack file loading
//! - `network`: Address space partitioning into subnet groups
//! - `security`: Security boundaries and allow-edges
//! - `secrets`: Secret declarations, grants and read policies
//! - `service`: Service compilation and backend interpolation
//! - `datastore`: Private data stores and their client edges
//! - `entry_point`: The shared internet-facing entry point
//! - `routing`: Path patterns and the prioritized routing table
//! - `graph`: The synthesized topology and its outputs
//! - `manifest`: Resource manifest and outputs emission
//! - `orchestrator`: The synthesis state machine
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use stacksynth::{config_loader, manifest, orchestrator};
//!
//! let config = config_loader::load_config(Path::new("stack.yaml"))?;
//! let graph = orchestrator::synthesize_stack(&config)?;
//! manifest::write_artifacts(&graph, Path::new("stacksynth_output"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Stack File Format
//!
//! ```yaml
//! general:
//!   stack_name: atomic
//!   domain_name: app.example.com
//!
//! secrets:
//!   - name: DbCredentials
//!     mode: generated-structured-template
//!     template:
//!       username: app
//!     generate_key: password
//!
//! services:
//!   - name: web
//!     image: "web:latest"
//!     cpu: 256
//!     memory: 512
//!     port: 3000
//!     depends_on: [auth]
//!     environment:
//!       AUTH_URL: "${service:auth}"
//!   - name: auth
//!     image: "supertokens:9.0"
//!     cpu: 512
//!     memory: 1024
//!     port: 3567
//!     secrets:
//!       DB_PASSWORD: { name: DbCredentials, key: password }
//!
//! routes:
//!   - { path: "/v1/auth/*", service: auth }
//!   - { path: "/*", service: web }
//! ```
//!
//! ## Error Handling
//!
//! Synthesis errors are typed (`SynthError`, `SynthesisFailure`). File
//! loading and artifact writing use `color_eyre` for reports with context.

pub mod config;
pub mod config_loader;
pub mod datastore;
pub mod entry_point;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod network;
pub mod orchestrator;
pub mod routing;
pub mod secrets;
pub mod security;
pub mod service;
pub mod utils;

pub use config::{StackConfig, ValidationError};
pub use error::{SynthError, SynthResult};
pub use graph::{Output, OutputValue, TopologyGraph};
pub use orchestrator::{
    synthesize_stack, SynthesisFailure, SynthesisOptions, SynthesisState, TopologySynthesizer,
};
