//! Routing decision engine.
//!
//! Picks the primary backend for a tool call from the tool name and the
//! current catalog snapshot. Everything here is a pure function of its
//! arguments so the policy can be tested without any network.

use crate::catalog::Catalog;
use crate::models::{BackendId, RouteDecision, RouteTarget};

/// Verb markers that classify a tool as a write, matched case-insensitively
/// anywhere in the tool name.
pub const WRITE_MARKERS: [&str; 6] = ["create", "update", "append", "patch", "delete", "post"];

/// Whether `tool_name` looks like a mutating operation
///
/// ```
/// # use mcp_router_core::routing::is_write_tool;
/// assert!(is_write_tool("notion_create_page"));
/// assert!(is_write_tool("API-post-page"));
/// assert!(is_write_tool("BlockAppendChildren"));
/// assert!(!is_write_tool("notion_search"));
/// ```
pub fn is_write_tool(tool_name: &str) -> bool {
    let lowered = tool_name.to_ascii_lowercase();
    WRITE_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Choose the backend for `tool_name`.
///
/// Reads go to official when it has the tool; writes go to custom when it
/// has the tool; otherwise whichever backend has it (official first); tools
/// unknown to both default to custom.
pub fn decide_target(tool_name: &str, catalog: &Catalog) -> BackendId {
    let has_official = catalog.contains(BackendId::Official, tool_name);
    let has_custom = catalog.contains(BackendId::Custom, tool_name);
    let is_write = is_write_tool(tool_name);

    if has_official && !is_write {
        return BackendId::Official;
    }
    if is_write && has_custom {
        return BackendId::Custom;
    }
    if has_official {
        return BackendId::Official;
    }
    BackendId::Custom
}

/// Resolve the caller's target choice into a [`RouteDecision`]
pub fn resolve(target: RouteTarget, tool_name: &str, catalog: &Catalog) -> RouteDecision {
    match target {
        RouteTarget::Explicit(backend) => RouteDecision {
            backend,
            explicit: true,
        },
        RouteTarget::Auto => RouteDecision {
            backend: decide_target(tool_name, catalog),
            explicit: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{tool_map, ToolDefinition, ToolMap};

    fn tools(names: &[&str]) -> ToolMap {
        tool_map(names.iter().map(|n| ToolDefinition::named(*n)))
    }

    fn catalog(official: &[&str], custom: &[&str]) -> Catalog {
        Catalog::new(tools(official), tools(custom))
    }

    #[test]
    fn write_only_in_custom_goes_custom() {
        let cat = catalog(&[], &["notion_create_page"]);
        assert_eq!(decide_target("notion_create_page", &cat), BackendId::Custom);
    }

    #[test]
    fn read_only_in_official_goes_official() {
        let cat = catalog(&["notion_search"], &[]);
        assert_eq!(decide_target("notion_search", &cat), BackendId::Official);
    }

    #[test]
    fn unknown_tool_defaults_to_custom() {
        let cat = catalog(&["a"], &["b"]);
        assert_eq!(decide_target("mystery", &cat), BackendId::Custom);
        assert_eq!(decide_target("mystery", &Catalog::default()), BackendId::Custom);
    }

    #[test]
    fn read_in_both_prefers_official() {
        let cat = catalog(&["get_page"], &["get_page"]);
        assert_eq!(decide_target("get_page", &cat), BackendId::Official);
    }

    #[test]
    fn write_in_both_prefers_custom() {
        let cat = catalog(&["update_page"], &["update_page"]);
        assert_eq!(decide_target("update_page", &cat), BackendId::Custom);
    }

    #[test]
    fn write_only_in_official_goes_official() {
        let cat = catalog(&["API-patch-page"], &[]);
        assert_eq!(decide_target("API-patch-page", &cat), BackendId::Official);
    }

    #[test]
    fn read_only_in_custom_goes_custom() {
        let cat = catalog(&[], &["list_users"]);
        assert_eq!(decide_target("list_users", &cat), BackendId::Custom);
    }

    #[test]
    fn write_markers_match_case_insensitively() {
        for name in ["CreateThing", "x_UPDATE_y", "AppendBlock", "PATCH", "deleteAll", "Post"] {
            assert!(is_write_tool(name), "{} should be a write", name);
        }
        for name in ["search", "retrieve_page", "list", "query_database"] {
            assert!(!is_write_tool(name), "{} should be a read", name);
        }
    }

    #[test]
    fn decisions_are_deterministic() {
        let cat = catalog(&["a", "create_x"], &["create_x", "b"]);
        for name in ["a", "b", "create_x", "zzz", "post_it"] {
            let first = decide_target(name, &cat);
            for _ in 0..10 {
                assert_eq!(decide_target(name, &cat), first);
            }
        }
    }

    #[test]
    fn explicit_target_overrides_policy() {
        let cat = catalog(&["notion_search"], &[]);
        let decision = resolve(
            RouteTarget::Explicit(BackendId::Custom),
            "notion_search",
            &cat,
        );
        assert_eq!(decision.backend, BackendId::Custom);
        assert!(decision.explicit);

        let auto = resolve(RouteTarget::Auto, "notion_search", &cat);
        assert_eq!(auto.backend, BackendId::Official);
        assert!(!auto.explicit);
    }
}
