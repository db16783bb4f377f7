//! Subnet allocation logic.
//!
//! Carves the network CIDR into `/24` blocks: one public and one
//! private-with-egress subnet per availability zone. Public blocks are
//! allocated first, then private ones, so `10.0.0.0/16` across two zones
//! yields `10.0.0.0/24`, `10.0.1.0/24` (public) and `10.0.2.0/24`,
//! `10.0.3.0/24` (private).

use super::types::{NetworkModel, Subnet, SubnetGroup, SubnetKind};
use crate::config::NetworkSettings;
use crate::error::{SynthError, SynthResult};
use crate::utils::Ipv4Cidr;

/// Prefix length of every carved subnet
pub const SUBNET_PREFIX: u8 = 24;
/// Fewer zones than this cannot survive a zone outage
pub const MIN_AZ_COUNT: usize = 2;
/// Zone suffixes available in a region
const ZONE_SUFFIXES: [char; 6] = ['a', 'b', 'c', 'd', 'e', 'f'];

/// Build a network with default region and NAT settings
pub fn build_network(cidr: &str, az_count: usize) -> SynthResult<NetworkModel> {
    let settings = NetworkSettings {
        cidr: cidr.to_string(),
        az_count,
        ..NetworkSettings::default()
    };
    build_network_with("network", &settings)
}

/// Build the immutable network model described by `settings`
pub fn build_network_with(id: &str, settings: &NetworkSettings) -> SynthResult<NetworkModel> {
    let az_count = settings.az_count;
    if az_count < MIN_AZ_COUNT {
        return Err(SynthError::Configuration(format!(
            "az_count must be at least {} (got {})",
            MIN_AZ_COUNT, az_count
        )));
    }
    if az_count > ZONE_SUFFIXES.len() {
        return Err(SynthError::Configuration(format!(
            "az_count must be at most {} (got {})",
            ZONE_SUFFIXES.len(),
            az_count
        )));
    }
    if settings.nat_gateways == 0 || settings.nat_gateways as usize > az_count {
        return Err(SynthError::Configuration(format!(
            "nat_gateways must be between 1 and az_count ({}), got {}",
            az_count, settings.nat_gateways
        )));
    }

    let cidr: Ipv4Cidr = settings
        .cidr
        .parse()
        .map_err(|e: String| SynthError::Configuration(format!("Invalid network cidr: {}", e)))?;

    let needed = (2 * az_count) as u64;
    let available = cidr.block_count(SUBNET_PREFIX).unwrap_or(0);
    if available < needed {
        return Err(SynthError::Configuration(format!(
            "{} holds {} /{} subnets but {} zones need {}",
            cidr, available, SUBNET_PREFIX, az_count, needed
        )));
    }
    if !cidr.is_private() {
        log::warn!("Network cidr {} is outside RFC 1918 private space", cidr);
    }

    let zones: Vec<String> = ZONE_SUFFIXES
        .iter()
        .take(az_count)
        .map(|suffix| format!("{}{}", settings.region, suffix))
        .collect();

    let mut next_block = 0u64;
    let mut groups = Vec::with_capacity(2);
    for kind in [SubnetKind::Public, SubnetKind::PrivateWithEgress] {
        let group_name = kind.as_str().to_string();
        let mut subnets = Vec::with_capacity(az_count);
        for zone in &zones {
            let block = cidr
                .subnet(SUBNET_PREFIX, next_block)
                .map_err(SynthError::Configuration)?;
            next_block += 1;
            log::debug!("Allocated {} subnet {} in {}", group_name, block, zone);
            subnets.push(Subnet {
                name: format!("{}-{}", group_name, zone),
                zone: zone.clone(),
                cidr: block,
            });
        }
        groups.push(SubnetGroup {
            name: group_name,
            kind,
            subnets,
        });
    }

    log::info!(
        "Built network {} across {} zones ({} subnets, {} NAT gateway(s))",
        cidr,
        az_count,
        next_block,
        settings.nat_gateways
    );

    Ok(NetworkModel::new(
        id.to_string(),
        cidr,
        zones,
        groups,
        settings.nat_gateways,
    ))
}
