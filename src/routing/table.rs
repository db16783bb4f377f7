//! Route priority assignment.
//!
//! `finalize` turns the declared entries into the entry point's ordered
//! rule set:
//! 1. explicit priorities must be unique,
//! 2. `auto` entries take the lowest unused numbers in declaration order,
//! 3. whenever two patterns can match the same request, the more specific
//!    one must be evaluated first,
//! 4. the default action is appended as a match-all rule evaluated last.

use super::pattern::PathPattern;
use crate::error::{SynthError, SynthResult};
use crate::service::ServiceId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Highest rule priority the entry point accepts
pub const MAX_PRIORITY: u32 = 50_000;

/// Evaluation priority of a route entry; lower is evaluated first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Priority {
    #[default]
    Auto,
    Explicit(u32),
}

impl From<Option<u32>> for Priority {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Priority::Auto, Priority::Explicit)
    }
}

/// A route as written in the stack file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDeclaration {
    pub path: String,
    pub service: String,
    /// Omitted means `auto`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

fn default_status() -> u16 {
    404
}

fn default_content_type() -> String {
    "text/plain".to_string()
}

/// What the entry point does with a request no pattern matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DefaultAction {
    FixedResponse {
        #[serde(default = "default_status")]
        status: u16,
        #[serde(default = "default_content_type")]
        content_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<String>,
    },
    Forward {
        service: String,
    },
    Redirect {
        location: String,
        #[serde(default)]
        permanent: bool,
    },
}

impl Default for DefaultAction {
    fn default() -> Self {
        DefaultAction::FixedResponse {
            status: default_status(),
            content_type: default_content_type(),
            body: Some("Not Found".to_string()),
        }
    }
}

impl DefaultAction {
    pub fn fixed(status: u16) -> Self {
        DefaultAction::FixedResponse {
            status,
            content_type: default_content_type(),
            body: None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            DefaultAction::FixedResponse { status, .. } if !(200..=599).contains(status) => {
                Err(format!("fixed-response status {} is not an HTTP status", status))
            }
            DefaultAction::Forward { service } if service.is_empty() => {
                Err("forward default action needs a service".to_string())
            }
            DefaultAction::Redirect { location, .. } if location.is_empty() => {
                Err("redirect default action needs a location".to_string())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for DefaultAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultAction::FixedResponse { status, .. } => write!(f, "default-{}", status),
            DefaultAction::Forward { service } => write!(f, "default-forward:{}", service),
            DefaultAction::Redirect { location, .. } => write!(f, "default-redirect:{}", location),
        }
    }
}

/// Where a finalized rule sends matching requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RouteTarget {
    Service { service: ServiceId },
    Default { action: DefaultAction },
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::Service { service } => write!(f, "{}", service),
            RouteTarget::Default { action } => write!(f, "{}", action),
        }
    }
}

/// Declared (path pattern, target, priority) triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub pattern: PathPattern,
    pub target: ServiceId,
    pub priority: Priority,
}

/// One rule of the finalized rule set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRoute {
    pub priority: u32,
    pub pattern: PathPattern,
    pub target: RouteTarget,
}

impl ResolvedRoute {
    pub fn is_default(&self) -> bool {
        matches!(self.target, RouteTarget::Default { .. })
    }
}

/// Rules ordered by strictly increasing priority, default last
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FinalizedRoutes {
    routes: Vec<ResolvedRoute>,
}

impl FinalizedRoutes {
    pub fn routes(&self) -> &[ResolvedRoute] {
        &self.routes
    }

    /// The match-all fallback.
    ///
    /// It becomes the listener's default action rather than a numbered
    /// rule, so its priority (one past the last rule) only orders it last
    /// and may exceed `MAX_PRIORITY`.
    pub fn default_route(&self) -> Option<&ResolvedRoute> {
        self.routes.last().filter(|r| r.is_default())
    }

    /// First rule, in evaluation order, matching `path`
    pub fn resolve(&self, path: &str) -> Option<&ResolvedRoute> {
        self.routes.iter().find(|r| r.pattern.matches(path))
    }

    /// `(priority, pattern, target)` triples in evaluation order
    pub fn summary(&self) -> Vec<(u32, String, String)> {
        self.routes
            .iter()
            .map(|r| (r.priority, r.pattern.to_string(), r.target.to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: Vec<RouteEntry>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a route; entries keep declaration order
    pub fn add_route(&mut self, path: &str, target: &ServiceId, priority: Priority) -> SynthResult<()> {
        let pattern = PathPattern::parse(path)
            .map_err(|e| SynthError::Configuration(format!("Route to {}: {}", target, e)))?;
        if let Priority::Explicit(value) = priority {
            if !(1..=MAX_PRIORITY).contains(&value) {
                return Err(SynthError::Configuration(format!(
                    "Route '{}' priority {} is outside 1..={}",
                    path, value, MAX_PRIORITY
                )));
            }
        }
        self.entries.push(RouteEntry {
            pattern,
            target: target.clone(),
            priority,
        });
        Ok(())
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Assign priorities, check ordering and append the fallback
    pub fn finalize(&self, default_action: DefaultAction) -> SynthResult<FinalizedRoutes> {
        default_action.validate().map_err(SynthError::Configuration)?;

        let mut explicit: BTreeMap<u32, &RouteEntry> = BTreeMap::new();
        for entry in &self.entries {
            if let Priority::Explicit(value) = entry.priority {
                if let Some(first) = explicit.insert(value, entry) {
                    return Err(SynthError::DuplicatePriority {
                        priority: value,
                        first: first.pattern.to_string(),
                        second: entry.pattern.to_string(),
                    });
                }
            }
        }

        let mut used: BTreeSet<u32> = explicit.keys().copied().collect();
        let mut candidate = 1u32;
        let mut routes = Vec::with_capacity(self.entries.len() + 1);
        for entry in &self.entries {
            let priority = match entry.priority {
                Priority::Explicit(value) => value,
                Priority::Auto => {
                    while used.contains(&candidate) {
                        candidate += 1;
                    }
                    if candidate > MAX_PRIORITY {
                        return Err(SynthError::Configuration(format!(
                            "No priority left for route '{}'",
                            entry.pattern
                        )));
                    }
                    used.insert(candidate);
                    candidate
                }
            };
            log::debug!("Route {} -> {} at priority {}", entry.pattern, entry.target, priority);
            routes.push(ResolvedRoute {
                priority,
                pattern: entry.pattern.clone(),
                target: RouteTarget::Service {
                    service: entry.target.clone(),
                },
            });
        }
        routes.sort_by_key(|r| r.priority);

        // An earlier rule covering a later one makes the later one
        // unreachable for part (or all) of its paths.
        for (i, earlier) in routes.iter().enumerate() {
            for later in &routes[i + 1..] {
                if earlier.pattern.covers(&later.pattern) {
                    return Err(SynthError::AmbiguousRoute {
                        general: earlier.pattern.to_string(),
                        general_priority: earlier.priority,
                        specific: later.pattern.to_string(),
                        specific_priority: later.priority,
                    });
                }
            }
        }

        let fallback = routes.last().map_or(1, |r| r.priority + 1);
        routes.push(ResolvedRoute {
            priority: fallback,
            pattern: PathPattern::match_all(),
            target: RouteTarget::Default {
                action: default_action,
            },
        });

        log::info!("Finalized {} route(s) plus default", routes.len() - 1);
        Ok(FinalizedRoutes { routes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> ServiceId {
        ServiceId::new(name)
    }

    fn triple(priority: u32, pattern: &str, target: &str) -> (u32, String, String) {
        (priority, pattern.to_string(), target.to_string())
    }

    #[test]
    fn test_single_catch_all_route() {
        let mut table = RoutingTable::new();
        table.add_route("/*", &id("web"), Priority::Auto).unwrap();
        let routes = table.finalize(DefaultAction::fixed(404)).unwrap();
        assert_eq!(
            routes.summary(),
            vec![triple(1, "/*", "web"), triple(2, "*", "default-404")]
        );
    }

    #[test]
    fn test_specific_before_general() {
        let mut table = RoutingTable::new();
        table.add_route("/v1/auth/*", &id("auth"), Priority::Auto).unwrap();
        table.add_route("/*", &id("web"), Priority::Auto).unwrap();
        let routes = table.finalize(DefaultAction::fixed(404)).unwrap();
        assert_eq!(routes.routes()[0].priority, 1);
        assert_eq!(routes.routes()[0].target.to_string(), "auth");
        assert_eq!(routes.routes()[1].priority, 2);
        assert_eq!(routes.resolve("/v1/auth/login").unwrap().target.to_string(), "auth");
        assert_eq!(routes.resolve("/dashboard").unwrap().target.to_string(), "web");
    }

    #[test]
    fn test_general_before_specific_is_ambiguous() {
        let mut table = RoutingTable::new();
        table.add_route("/v1/*", &id("api"), Priority::Auto).unwrap();
        table.add_route("/v1/v2/*", &id("apiv2"), Priority::Auto).unwrap();
        let err = table.finalize(DefaultAction::fixed(404)).unwrap_err();
        assert_eq!(
            err,
            SynthError::AmbiguousRoute {
                general: "/v1/*".to_string(),
                general_priority: 1,
                specific: "/v1/v2/*".to_string(),
                specific_priority: 2,
            }
        );
    }

    #[test]
    fn test_explicit_priority_can_fix_order() {
        let mut table = RoutingTable::new();
        table.add_route("/v1/*", &id("api"), Priority::Explicit(20)).unwrap();
        table.add_route("/v1/v2/*", &id("apiv2"), Priority::Explicit(10)).unwrap();
        let routes = table.finalize(DefaultAction::fixed(404)).unwrap();
        assert_eq!(
            routes.summary(),
            vec![
                triple(10, "/v1/v2/*", "apiv2"),
                triple(20, "/v1/*", "api"),
                triple(21, "*", "default-404")
            ]
        );
    }

    #[test]
    fn test_duplicate_explicit_priority() {
        let mut table = RoutingTable::new();
        table.add_route("/a/*", &id("a"), Priority::Explicit(5)).unwrap();
        table.add_route("/b/*", &id("b"), Priority::Explicit(5)).unwrap();
        let err = table.finalize(DefaultAction::fixed(404)).unwrap_err();
        assert!(matches!(err, SynthError::DuplicatePriority { priority: 5, first, second }
            if first == "/a/*" && second == "/b/*"));
    }

    #[test]
    fn test_auto_fills_gaps_around_explicit() {
        let mut table = RoutingTable::new();
        table.add_route("/a/*", &id("a"), Priority::Explicit(1)).unwrap();
        table.add_route("/b/*", &id("b"), Priority::Auto).unwrap();
        table.add_route("/c/*", &id("c"), Priority::Explicit(3)).unwrap();
        table.add_route("/d/*", &id("d"), Priority::Auto).unwrap();
        table.add_route("/e/*", &id("e"), Priority::Auto).unwrap();
        let priorities: Vec<(u32, String)> = table
            .finalize(DefaultAction::fixed(404))
            .unwrap()
            .routes()
            .iter()
            .map(|r| (r.priority, r.pattern.to_string()))
            .collect();
        assert_eq!(
            priorities,
            vec![
                (1, "/a/*".to_string()),
                (2, "/b/*".to_string()),
                (3, "/c/*".to_string()),
                (4, "/d/*".to_string()),
                (5, "/e/*".to_string()),
                (6, "*".to_string()),
            ]
        );
    }

    #[test]
    fn test_priorities_strictly_increase_and_default_is_last() {
        let mut table = RoutingTable::new();
        let paths = [
            "/v1/auth/*",
            "/v1/graphql/*",
            "/v1/functions/*",
            "/v1/oauth/*",
            "/v1/handshake/*",
            "/*",
        ];
        for (i, path) in paths.iter().enumerate() {
            let priority = if *path == "/*" {
                Priority::Explicit(100)
            } else if i % 2 == 0 {
                Priority::Auto
            } else {
                Priority::Explicit(40 + i as u32)
            };
            table.add_route(path, &id(&format!("svc{}", i)), priority).unwrap();
        }
        let routes = table.finalize(DefaultAction::default()).unwrap();
        let numbers: Vec<u32> = routes.routes().iter().map(|r| r.priority).collect();
        assert!(numbers.windows(2).all(|w| w[0] < w[1]), "{:?}", numbers);
        assert!(routes.default_route().is_some());
        assert_eq!(routes.routes().iter().filter(|r| r.is_default()).count(), 1);
    }

    #[test]
    fn test_identical_patterns_are_ambiguous() {
        let mut table = RoutingTable::new();
        table.add_route("/api/*", &id("a"), Priority::Auto).unwrap();
        table.add_route("/api/*", &id("b"), Priority::Auto).unwrap();
        assert!(matches!(
            table.finalize(DefaultAction::fixed(404)),
            Err(SynthError::AmbiguousRoute { .. })
        ));
    }

    #[test]
    fn test_priority_bounds() {
        let mut table = RoutingTable::new();
        assert!(table.add_route("/a/*", &id("a"), Priority::Explicit(0)).is_err());
        assert!(table.add_route("/a/*", &id("a"), Priority::Explicit(MAX_PRIORITY + 1)).is_err());
        assert!(table.add_route("/a/*", &id("a"), Priority::Explicit(MAX_PRIORITY)).is_ok());
    }

    #[test]
    fn test_default_after_max_priority_is_not_a_numbered_rule() {
        let mut table = RoutingTable::new();
        table.add_route("/a/*", &id("a"), Priority::Explicit(MAX_PRIORITY)).unwrap();
        let routes = table.finalize(DefaultAction::default()).unwrap();

        let numbered: Vec<u32> = routes
            .routes()
            .iter()
            .filter(|r| !r.is_default())
            .map(|r| r.priority)
            .collect();
        assert_eq!(numbered, vec![MAX_PRIORITY]);
        let fallback = routes.default_route().unwrap();
        assert_eq!(fallback.priority, MAX_PRIORITY + 1);
        assert_eq!(routes.resolve("/b").unwrap(), fallback);
    }

    #[test]
    fn test_empty_table_has_only_default() {
        let routes = RoutingTable::new()
            .finalize(DefaultAction::Redirect {
                location: "https://example.com".to_string(),
                permanent: true,
            })
            .unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes.routes()[0].priority, 1);
        assert!(routes.resolve("/anything").unwrap().is_default());
    }

    #[test]
    fn test_default_action_yaml() {
        let action: DefaultAction = serde_yaml::from_str("type: forward\nservice: web\n").unwrap();
        assert_eq!(action, DefaultAction::Forward { service: "web".to_string() });

        let action: DefaultAction = serde_yaml::from_str("type: fixed-response\n").unwrap();
        assert!(matches!(action, DefaultAction::FixedResponse { status: 404, .. }));

        assert!(RoutingTable::new().finalize(DefaultAction::fixed(99)).is_err());
    }
}
