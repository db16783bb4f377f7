//! ServiceSpec compilation.
//!
//! Compilation is split in two: `plan` validates a spec and derives every
//! resource that does not touch shared state, `register` then declares the
//! service's boundary and records its secret grants. Plans are independent
//! of each other, so `compile_all` can build them on the rayon pool and only
//! serializes the registrations.

use super::types::{
    Backend, LogGroup, SecretBinding, ServiceId, ServiceResource, ServiceSpec, TargetGroup,
    TaskDefinition,
};
use crate::error::{SynthError, SynthResult};
use crate::network::{NetworkModel, Placement, SubnetKind};
use crate::secrets::{compile_read_policy, SecretAccessMode, SecretStore};
use crate::security::{BoundaryOwner, SecurityGraph};
use crate::utils::{validate_env_var_name, validate_resource_name};
use rayon::prelude::*;
use std::sync::{Mutex, MutexGuard};

/// Target group names are limited by the platform
const MAX_TARGET_GROUP_NAME: usize = 32;
const MIN_THRESHOLD: u32 = 2;
const MAX_THRESHOLD: u32 = 10;

/// Read-only inputs shared by every compilation in one synthesis run
#[derive(Debug, Clone, Copy)]
pub struct CompileContext<'a> {
    pub network: &'a NetworkModel,
    /// Stack name; prefixes hostnames, log groups and target groups
    pub namespace: &'a str,
    pub access_mode: SecretAccessMode,
}

/// Everything derived from a spec before any shared store is touched
#[derive(Debug, Clone)]
pub struct ServicePlan {
    spec: ServiceSpec,
    port: u16,
    placement: Placement,
    backend: Backend,
    target_group: TargetGroup,
    log_group: LogGroup,
}

impl ServicePlan {
    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

/// Compile one spec with the default (minimal) secret access mode.
///
/// The returned resource carries its `Backend`; registering it under the
/// service's identifier is done with `BackendRegistry::register` once every
/// service is compiled, as the orchestrator does before resolving
/// environment references.
pub fn compile(
    spec: &ServiceSpec,
    network: &NetworkModel,
    security: &mut SecurityGraph,
    secrets: &mut SecretStore,
) -> SynthResult<ServiceResource> {
    let namespace = secrets.namespace().to_string();
    let ctx = CompileContext {
        network,
        namespace: &namespace,
        access_mode: SecretAccessMode::default(),
    };
    compile_with(spec, &ctx, security, secrets)
}

pub fn compile_with(
    spec: &ServiceSpec,
    ctx: &CompileContext<'_>,
    security: &mut SecurityGraph,
    secrets: &mut SecretStore,
) -> SynthResult<ServiceResource> {
    let plan = plan(spec, ctx)?;
    register(plan, ctx, security, secrets)
}

/// Compile every spec, returning resources in declaration order.
///
/// With `parallel` set, plans are built concurrently and registrations run
/// under a single-writer lock per store. The first failing spec in
/// declaration order is reported.
pub fn compile_all(
    specs: &[ServiceSpec],
    ctx: &CompileContext<'_>,
    security: &mut SecurityGraph,
    secrets: &mut SecretStore,
    parallel: bool,
) -> SynthResult<Vec<ServiceResource>> {
    if !parallel {
        return specs
            .iter()
            .map(|spec| compile_with(spec, ctx, security, secrets))
            .collect();
    }

    let plans = specs
        .par_iter()
        .map(|spec| plan(spec, ctx))
        .collect::<Vec<_>>()
        .into_iter()
        .collect::<SynthResult<Vec<_>>>()?;

    let shared_security = Mutex::new(std::mem::take(security));
    let shared_secrets = Mutex::new(std::mem::replace(secrets, SecretStore::new(ctx.namespace)));

    let results: Vec<SynthResult<ServiceResource>> = plans
        .into_par_iter()
        .map(|plan| register_locked(plan, ctx, &shared_security, &shared_secrets))
        .collect();

    *security = shared_security.into_inner().unwrap_or_else(|e| e.into_inner());
    *secrets = shared_secrets.into_inner().unwrap_or_else(|e| e.into_inner());

    results.into_iter().collect()
}

/// The spec's container port, or `InvalidSpec` when it is not a valid port
pub fn container_port(spec: &ServiceSpec) -> SynthResult<u16> {
    let invalid = |reason: String| SynthError::InvalidSpec {
        service: spec.name.clone(),
        reason,
    };
    if spec.port <= 0 {
        return Err(invalid(format!("container port must be positive (got {})", spec.port)));
    }
    u16::try_from(spec.port).map_err(|_| invalid(format!("container port {} exceeds 65535", spec.port)))
}

/// Validate a spec and derive its compute, backend and target group
pub fn plan(spec: &ServiceSpec, ctx: &CompileContext<'_>) -> SynthResult<ServicePlan> {
    let invalid = |reason: String| SynthError::InvalidSpec {
        service: spec.name.clone(),
        reason,
    };

    validate_resource_name(&spec.name).map_err(invalid)?;
    if spec.image.trim().is_empty() {
        return Err(invalid("image reference cannot be empty".to_string()));
    }
    spec.shape().validate().map_err(invalid)?;

    let port = container_port(spec)?;

    if spec.replicas == 0 {
        return Err(invalid("replicas must be at least 1".to_string()));
    }

    for key in spec.environment.keys().chain(spec.secrets.keys()) {
        validate_env_var_name(key).map_err(invalid)?;
    }
    if let Some(key) = spec.environment.keys().find(|k| spec.secrets.contains_key(*k)) {
        return Err(invalid(format!(
            "'{}' is set both as plain environment and as a secret",
            key
        )));
    }
    if spec.depends_on.iter().any(|d| d == &spec.name) {
        return Err(invalid("a service cannot depend on itself".to_string()));
    }

    let health = &spec.health_check;
    if !health.path.starts_with('/') {
        return Err(invalid(format!("health check path '{}' must start with '/'", health.path)));
    }
    if health.timeout.is_zero() || health.timeout >= health.interval {
        return Err(invalid(format!(
            "health check timeout ({:?}) must be non-zero and shorter than the interval ({:?})",
            health.timeout, health.interval
        )));
    }
    for threshold in [health.healthy_threshold, health.unhealthy_threshold] {
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&threshold) {
            return Err(invalid(format!(
                "health check thresholds must be between {} and {} (got {})",
                MIN_THRESHOLD, MAX_THRESHOLD, threshold
            )));
        }
    }

    // Services only ever land in the private group; the entry point is the
    // sole public resource.
    let placement = ctx
        .network
        .placement(SubnetKind::PrivateWithEgress)
        .ok_or_else(|| {
            SynthError::Configuration("network has no private-with-egress subnet group".to_string())
        })?;

    let namespace = ctx.namespace.to_lowercase();
    let backend = Backend {
        host: format!("{}.{}.internal", spec.name, namespace),
        port,
    };

    let mut tg_name = format!("{}-{}", namespace, spec.name);
    tg_name.truncate(MAX_TARGET_GROUP_NAME);
    let target_group = TargetGroup {
        name: tg_name.trim_end_matches('-').to_string(),
        port,
        protocol: "HTTP".to_string(),
        target_type: "ip".to_string(),
        health_check: spec.health_check.clone(),
    };

    let log_group = LogGroup {
        name: format!("/{}/services/{}", ctx.namespace, spec.name),
        retention_days: spec.log_retention_days,
    };

    Ok(ServicePlan {
        spec: spec.clone(),
        port,
        placement,
        backend,
        target_group,
        log_group,
    })
}

/// Declare the service boundary and bind its secrets
pub fn register(
    plan: ServicePlan,
    ctx: &CompileContext<'_>,
    security: &mut SecurityGraph,
    secrets: &mut SecretStore,
) -> SynthResult<ServiceResource> {
    let boundary = security.declare_boundary(plan.name(), BoundaryOwner::Service(plan.name().to_string()))?;
    let bindings = bind_secrets(&plan, secrets)?;
    let read_policy = compile_read_policy(secrets, plan.name(), ctx.access_mode);
    Ok(assemble(plan, boundary, bindings, read_policy))
}

fn register_locked(
    plan: ServicePlan,
    ctx: &CompileContext<'_>,
    security: &Mutex<SecurityGraph>,
    secrets: &Mutex<SecretStore>,
) -> SynthResult<ServiceResource> {
    let boundary = {
        let mut graph = lock(security);
        graph.declare_boundary(plan.name(), BoundaryOwner::Service(plan.name().to_string()))?
    };
    let mut store = lock(secrets);
    let bindings = bind_secrets(&plan, &mut store)?;
    let read_policy = compile_read_policy(&store, plan.name(), ctx.access_mode);
    drop(store);
    Ok(assemble(plan, boundary, bindings, read_policy))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn bind_secrets(plan: &ServicePlan, secrets: &mut SecretStore) -> SynthResult<Vec<SecretBinding>> {
    let service = plan.name();
    let mut bindings = Vec::with_capacity(plan.spec.secrets.len());
    for (env, reference) in &plan.spec.secrets {
        secrets.grant_read(reference.name(), service)?;
        let descriptor = secrets.get(reference.name()).ok_or_else(|| SynthError::UnknownSecret {
            secret: reference.name().to_string(),
            referenced_by: service.to_string(),
        })?;
        bindings.push(SecretBinding {
            env: env.clone(),
            secret: descriptor.name.clone(),
            secret_id: descriptor.id.clone(),
            key: reference.key().map(str::to_string),
        });
    }
    Ok(bindings)
}

fn assemble(
    plan: ServicePlan,
    boundary: crate::security::BoundaryId,
    bindings: Vec<SecretBinding>,
    read_policy: crate::secrets::SecretReadPolicy,
) -> ServiceResource {
    let ServicePlan {
        spec,
        port,
        placement,
        backend,
        target_group,
        log_group,
    } = plan;

    log::debug!(
        "Compiled service {} ({} cpu / {} MiB, {} replica(s)) at {}",
        spec.name,
        spec.cpu,
        spec.memory,
        spec.replicas,
        backend
    );

    ServiceResource {
        id: ServiceId::new(spec.name.clone()),
        boundary,
        placement,
        backend,
        replicas: spec.replicas,
        task: TaskDefinition {
            family: spec.name.clone(),
            image: spec.image,
            cpu: spec.cpu,
            memory: spec.memory,
            port,
            environment: spec.environment,
            secrets: bindings,
            log_group,
        },
        target_group,
        read_policy,
        depends_on: spec.depends_on,
    }
}
