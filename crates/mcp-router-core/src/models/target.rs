//! Backend identities and routing targets

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the two fixed backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    /// The vendor-maintained backend, preferred for reads
    Official,
    /// The in-house backend, system of record for writes
    Custom,
}

impl BackendId {
    /// Both backends, in a stable order
    pub const ALL: [BackendId; 2] = [BackendId::Official, BackendId::Custom];

    /// The alternate backend used for failover
    pub fn other(self) -> Self {
        match self {
            BackendId::Official => BackendId::Custom,
            BackendId::Custom => BackendId::Official,
        }
    }

    /// Lowercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            BackendId::Official => "official",
            BackendId::Custom => "custom",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "official" => Ok(BackendId::Official),
            "custom" => Ok(BackendId::Custom),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}

/// Caller's choice of backend, as sent in the `target` request field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteTarget {
    /// Let the routing decision engine choose
    #[default]
    Auto,
    /// Force a specific backend as the primary
    Explicit(BackendId),
}

impl RouteTarget {
    /// Parse the optional request field. Absent means [`RouteTarget::Auto`].
    pub fn parse(value: Option<&str>) -> Result<Self, String> {
        match value {
            None => Ok(RouteTarget::Auto),
            Some(s) => s.parse(),
        }
    }
}

impl FromStr for RouteTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(RouteTarget::Auto),
            other => other
                .parse::<BackendId>()
                .map(RouteTarget::Explicit)
                .map_err(|_| {
                    format!(
                        "invalid target '{}': expected \"official\", \"custom\" or \"auto\"",
                        other
                    )
                }),
        }
    }
}

/// The primary backend chosen for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteDecision {
    /// Backend to call first
    pub backend: BackendId,
    /// True when the caller named the backend explicitly
    pub explicit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_is_an_involution() {
        for id in BackendId::ALL {
            assert_ne!(id.other(), id);
            assert_eq!(id.other().other(), id);
        }
    }

    #[test]
    fn parse_targets() {
        assert_eq!(RouteTarget::parse(None), Ok(RouteTarget::Auto));
        assert_eq!(RouteTarget::parse(Some("auto")), Ok(RouteTarget::Auto));
        assert_eq!(
            RouteTarget::parse(Some("official")),
            Ok(RouteTarget::Explicit(BackendId::Official))
        );
        assert_eq!(
            RouteTarget::parse(Some("custom")),
            Ok(RouteTarget::Explicit(BackendId::Custom))
        );
        assert!(RouteTarget::parse(Some("OFFICIAL")).is_err());
        assert!(RouteTarget::parse(Some("")).is_err());
    }

    #[test]
    fn backend_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(BackendId::Custom).unwrap(),
            serde_json::json!("custom")
        );
    }
}
