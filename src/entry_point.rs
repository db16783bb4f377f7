//! The single internet-facing entry point.
//!
//! Only this resource lives in the public subnet group and only its
//! boundary may receive traffic from any address. With a domain name the
//! HTTPS listener serves the routing rules and plain HTTP is redirected;
//! without one, HTTP serves the rules directly.

use crate::error::{SynthError, SynthResult};
use crate::graph::OutputValue;
use crate::network::{NetworkModel, Placement, SubnetKind};
use crate::security::{BoundaryId, BoundaryOwner, EdgeSource, Protocol, SecurityGraph};
use serde::Serialize;

/// Boundary and logical id of the entry point
pub const ENTRY_POINT: &str = "entry-point";
pub const HTTP_PORT: u16 = 80;
pub const HTTPS_PORT: u16 = 443;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListenerProtocol {
    Http,
    Https,
}

impl ListenerProtocol {
    /// Prefix of the listener's stack output name
    pub fn output_prefix(&self) -> &'static str {
        match self {
            ListenerProtocol::Http => "Http",
            ListenerProtocol::Https => "Https",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListenerAction {
    /// Evaluate the finalized routing rules
    ServeRules,
    /// Permanent redirect to the HTTPS listener
    RedirectToHttps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listener {
    pub id: String,
    pub protocol: ListenerProtocol,
    pub port: u16,
    pub action: ListenerAction,
    /// Domain whose certificate the listener presents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryPoint {
    pub id: String,
    pub boundary: BoundaryId,
    pub placement: Placement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    pub listeners: Vec<Listener>,
}

impl EntryPoint {
    /// Provider-assigned host name, known only after provisioning
    pub fn dns_name(&self) -> OutputValue {
        OutputValue::reference(&self.id, "DnsName")
    }

    /// Public URL of the application
    pub fn application_endpoint(&self) -> String {
        match &self.domain_name {
            Some(domain) => format!("https://{}", domain),
            None => format!("http://{}", self.dns_name()),
        }
    }

    /// The listener whose default action is the routing rule set
    pub fn rules_listener(&self) -> Option<&Listener> {
        self.listeners
            .iter()
            .find(|l| l.action == ListenerAction::ServeRules)
    }
}

/// Declare the entry point boundary and place it in the public group
pub fn declare_entry_point(
    network: &NetworkModel,
    domain_name: Option<&str>,
    security: &mut SecurityGraph,
) -> SynthResult<EntryPoint> {
    let placement = network.placement(SubnetKind::Public).ok_or_else(|| {
        SynthError::Configuration("network has no public subnet group for the entry point".to_string())
    })?;
    let boundary = security.declare_boundary(ENTRY_POINT, BoundaryOwner::SharedEntryPoint)?;

    let listener = |protocol: ListenerProtocol, port: u16, action: ListenerAction| Listener {
        id: format!("{}-listener-{}", ENTRY_POINT, port),
        protocol,
        port,
        action,
        certificate_domain: match protocol {
            ListenerProtocol::Https => domain_name.map(str::to_string),
            ListenerProtocol::Http => None,
        },
    };
    let listeners = match domain_name {
        Some(_) => vec![
            listener(ListenerProtocol::Http, HTTP_PORT, ListenerAction::RedirectToHttps),
            listener(ListenerProtocol::Https, HTTPS_PORT, ListenerAction::ServeRules),
        ],
        None => vec![listener(ListenerProtocol::Http, HTTP_PORT, ListenerAction::ServeRules)],
    };

    log::debug!(
        "Declared entry point with {} listener(s){}",
        listeners.len(),
        domain_name.map(|d| format!(" for {}", d)).unwrap_or_default()
    );

    Ok(EntryPoint {
        id: ENTRY_POINT.to_string(),
        boundary,
        placement,
        domain_name: domain_name.map(str::to_string),
        listeners,
    })
}

/// Allow public traffic into the entry point on each listener port
pub fn open_public_ingress(entry_point: &EntryPoint, security: &mut SecurityGraph) -> SynthResult<()> {
    for listener in &entry_point.listeners {
        let reason = match listener.protocol {
            ListenerProtocol::Http => "public HTTP",
            ListenerProtocol::Https => "public HTTPS",
        };
        security.allow(
            EdgeSource::AnyIpv4,
            entry_point.boundary.as_str(),
            Protocol::Tcp,
            listener.port,
            reason,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::build_network;

    #[test]
    fn test_http_only_without_domain() {
        let network = build_network("10.0.0.0/16", 2).unwrap();
        let mut security = SecurityGraph::new();
        let entry = declare_entry_point(&network, None, &mut security).unwrap();
        open_public_ingress(&entry, &mut security).unwrap();

        assert_eq!(entry.placement.kind, SubnetKind::Public);
        assert_eq!(entry.listeners.len(), 1);
        assert_eq!(entry.rules_listener().unwrap().port, 80);
        assert_eq!(entry.application_endpoint(), "http://${entry-point.DnsName}");
        let ports: Vec<u16> = security.edges_into(ENTRY_POINT).iter().map(|e| e.port).collect();
        assert_eq!(ports, vec![80]);
    }

    #[test]
    fn test_https_with_domain_redirects_http() {
        let network = build_network("10.0.0.0/16", 2).unwrap();
        let mut security = SecurityGraph::new();
        let entry = declare_entry_point(&network, Some("app.example.com"), &mut security).unwrap();
        open_public_ingress(&entry, &mut security).unwrap();

        assert_eq!(entry.listeners[0].action, ListenerAction::RedirectToHttps);
        let rules = entry.rules_listener().unwrap();
        assert_eq!(rules.protocol, ListenerProtocol::Https);
        assert_eq!(rules.certificate_domain.as_deref(), Some("app.example.com"));
        assert_eq!(entry.application_endpoint(), "https://app.example.com");
        let prefixes: Vec<&str> = entry.listeners.iter().map(|l| l.protocol.output_prefix()).collect();
        assert_eq!(prefixes, vec!["Http", "Https"]);

        let inbound = security.edges_into(ENTRY_POINT);
        assert_eq!(inbound.len(), 2);
        assert!(inbound.iter().all(|e| e.from == EdgeSource::AnyIpv4));
    }

    #[test]
    fn test_entry_point_name_is_reserved() {
        let network = build_network("10.0.0.0/16", 2).unwrap();
        let mut security = SecurityGraph::new();
        security
            .declare_boundary(ENTRY_POINT, BoundaryOwner::Service(ENTRY_POINT.to_string()))
            .unwrap();
        assert!(matches!(
            declare_entry_point(&network, None, &mut security),
            Err(SynthError::Conflict { .. })
        ));
    }
}
