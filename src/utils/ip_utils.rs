use serde::{Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// IPv4 CIDR block helpers used to carve the network into subnets

/// An IPv4 network in CIDR notation (e.g. `10.0.0.0/16`).
///
/// Host bits must be zero; `10.0.0.1/16` is rejected rather than silently
/// truncated so that typos in the stack file surface early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    pub fn new(network: Ipv4Addr, prefix: u8) -> Result<Self, String> {
        if prefix > 32 {
            return Err(format!("Prefix length /{} exceeds 32", prefix));
        }
        let bits = u32::from(network);
        if bits & !mask(prefix) != 0 {
            return Err(format!("{}/{} has host bits set", network, prefix));
        }
        Ok(Self { network, prefix })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Number of `/new_prefix` blocks that fit in this network
    pub fn block_count(&self, new_prefix: u8) -> Option<u64> {
        if new_prefix < self.prefix || new_prefix > 32 {
            return None;
        }
        Some(1u64 << (new_prefix - self.prefix))
    }

    /// The `index`-th `/new_prefix` block inside this network
    pub fn subnet(&self, new_prefix: u8, index: u64) -> Result<Ipv4Cidr, String> {
        let count = self
            .block_count(new_prefix)
            .ok_or_else(|| format!("Cannot carve /{} blocks out of {}", new_prefix, self))?;
        if index >= count {
            return Err(format!(
                "{} only holds {} /{} blocks (requested block #{})",
                self, count, new_prefix, index
            ));
        }
        let base = u64::from(u32::from(self.network)) + (index << (32 - u32::from(new_prefix)));
        Ipv4Cidr::new(Ipv4Addr::from(base as u32), new_prefix)
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & mask(self.prefix) == u32::from(self.network)
    }

    /// Check if the block lies inside RFC 1918 private space
    pub fn is_private(&self) -> bool {
        let octets = self.network.octets();
        let in_private_range =
            // 10.0.0.0/8
            octets[0] == 10 ||
            // 172.16.0.0/12
            (octets[0] == 172 && (16..=31).contains(&octets[1])) ||
            // 192.168.0.0/16
            (octets[0] == 192 && octets[1] == 168);
        let min_prefix = match octets[0] {
            10 => 8,
            172 => 12,
            _ => 16,
        };
        in_private_range && self.prefix >= min_prefix
    }
}

fn mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

impl FromStr for Ipv4Cidr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("'{}' is not in CIDR notation (expected a.b.c.d/n)", s))?;
        let network = addr
            .parse::<Ipv4Addr>()
            .map_err(|_| format!("Invalid IPv4 address '{}' in '{}'", addr, s))?;
        let prefix = prefix
            .parse::<u8>()
            .map_err(|_| format!("Invalid prefix length '{}' in '{}'", prefix, s))?;
        Ipv4Cidr::new(network, prefix)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl Serialize for Ipv4Cidr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
