//! Path routing with authentication guards.
//!
//! The router is pure: it maps a path plus the current auth state to either
//! a handler to dispatch or a path to redirect to. Dispatch is driven by the
//! path-change stream of a [`Navigator`]; navigating never invokes a handler
//! directly.

mod navigator;

use std::collections::BTreeMap;

pub use navigator::{HistoryNavigator, Navigator, PathChanges};

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Parameters bound from `:name` segments.
pub type RouteParams = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A registered path pattern such as `/session/:id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split_segments(pattern)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();
        Self {
            raw: normalize(pattern),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| matches!(segment, Segment::Literal(_)))
    }

    fn bind(&self, segments: &[&str]) -> Option<RouteParams> {
        if segments.len() != self.segments.len() {
            return None;
        }
        let mut params = RouteParams::new();
        for (pattern, actual) in self.segments.iter().zip(segments) {
            match pattern {
                Segment::Literal(literal) if literal == actual => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), (*actual).to_string());
                }
            }
        }
        Some(params)
    }
}

/// Outcome of routing one path.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a, H> {
    Dispatch { handler: &'a H, params: RouteParams },
    Redirect(&'static str),
}

/// Route table in registration order.
pub struct Router<H> {
    routes: Vec<(RoutePattern, H)>,
    public: Vec<String>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Router<H> {
    /// Creates an empty table whose public paths are login and register.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            public: vec![LOGIN_PATH.to_string(), REGISTER_PATH.to_string()],
        }
    }

    #[must_use]
    pub fn route(mut self, pattern: &str, handler: H) -> Self {
        self.add_route(pattern, handler);
        self
    }

    pub fn add_route(&mut self, pattern: &str, handler: H) {
        self.routes.push((RoutePattern::parse(pattern), handler));
    }

    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize(path);
        self.public.iter().any(|public| *public == path)
    }

    /// Finds the handler for `path` without applying guards.
    ///
    /// An exact match against a static pattern wins; otherwise the first
    /// pattern (in registration order) that binds the path is selected.
    pub fn match_path(&self, path: &str) -> Option<(&H, RouteParams)> {
        let normalized = normalize(path);
        if let Some((_, handler)) = self
            .routes
            .iter()
            .find(|(pattern, _)| pattern.is_static() && pattern.raw == normalized)
        {
            return Some((handler, RouteParams::new()));
        }

        let segments: Vec<&str> = split_segments(path).collect();
        self.routes
            .iter()
            .find_map(|(pattern, handler)| pattern.bind(&segments).map(|params| (handler, params)))
    }

    /// Applies the guard policy and matching to `path`.
    pub fn resolve(&self, path: &str, authenticated: bool) -> Resolution<'_, H> {
        let normalized = normalize(path);

        if !authenticated && !self.is_public(&normalized) {
            return Resolution::Redirect(LOGIN_PATH);
        }
        if authenticated && normalized == LOGIN_PATH {
            return Resolution::Redirect(DASHBOARD_PATH);
        }

        match self.match_path(&normalized) {
            Some((handler, params)) => Resolution::Dispatch { handler, params },
            None if authenticated => Resolution::Redirect(DASHBOARD_PATH),
            None => Resolution::Redirect(LOGIN_PATH),
        }
    }
}

/// Strips the query string and fragment and drops empty segments.
fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|segment| !segment.is_empty())
}

/// Canonical form used for exact matching: `/a/b`, or `/` for the root.
pub fn normalize(path: &str) -> String {
    let joined = split_segments(path).collect::<Vec<_>>().join("/");
    format!("/{joined}")
}
