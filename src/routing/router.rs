//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes, global headers and fallback responses
//! - Resolve method + path to exactly one response definition
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) pattern scan in configured order (acceptable for typical rule counts)
//! - A path match without a method match is MethodNotAllowed, never NotFound
//! - Unset fallbacks resolve to a plain 200 with no body

use std::collections::HashMap;
use std::fmt;

use axum::http::HeaderMap;

use crate::config::schema::{HeaderValueConfig, ResponseConfig, ResponsesFile};
use crate::http::headers::HeaderValues;
use crate::routing::pattern::PathPattern;
use crate::routing::rules::{
    compile_headers, compile_response, compile_route, ResponseDefinition, Route, RuleError, RuleLocation,
};

/// Every error found while compiling a rule set.
#[derive(Debug)]
pub struct RuleSetError {
    pub errors: Vec<RuleError>,
}

impl fmt::Display for RuleSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid responses: ")?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for RuleSetError {}

/// Outcome of resolving a request.
#[derive(Debug, Clone, Copy)]
pub enum Resolution<'a> {
    /// A configured route accepted the request.
    Matched(&'a Route),
    /// No route's path matched.
    NotFound(&'a ResponseDefinition),
    /// A route's path matched but none accepted the method.
    MethodNotAllowed(&'a ResponseDefinition),
}

impl<'a> Resolution<'a> {
    pub fn response(&self) -> &'a ResponseDefinition {
        match self {
            Resolution::Matched(route) => route.response(),
            Resolution::NotFound(response) | Resolution::MethodNotAllowed(response) => response,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Resolution::Matched(_) => "matched",
            Resolution::NotFound(_) => "not_found",
            Resolution::MethodNotAllowed(_) => "method_not_allowed",
        }
    }
}

/// Immutable set of routed canned responses.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    routes: Vec<Route>,
    global_headers: HeaderMap,
    not_found: ResponseDefinition,
    method_not_allowed: ResponseDefinition,
}

impl RuleSet {
    /// Compile a responses file, reporting every invalid entry.
    pub fn compile(file: &ResponsesFile) -> Result<Self, RuleSetError> {
        let mut errors = Vec::new();

        let routes: Vec<Route> = file
            .responses
            .iter()
            .enumerate()
            .filter_map(|(index, config)| compile_route(index, config, &mut errors))
            .collect();

        let global_headers = compile_headers(&RuleLocation::GlobalHeaders, &file.headers, &mut errors);
        let not_found = compile_fallback(RuleLocation::NotFound, file.not_found.as_ref(), &mut errors);
        let method_not_allowed =
            compile_fallback(RuleLocation::MethodNotAllowed, file.method_not_allowed.as_ref(), &mut errors);

        find_conflicts(file, &mut errors);

        if !errors.is_empty() {
            return Err(RuleSetError { errors });
        }

        Ok(Self {
            routes,
            global_headers,
            not_found,
            method_not_allowed,
        })
    }

    /// Rule set answering every request with the same response.
    pub fn canned(status: u16, body: Option<String>, headers: &HeaderValues) -> Result<Self, RuleSetError> {
        let file = ResponsesFile {
            responses: vec![ResponseConfig {
                path: "/*".to_string(),
                status,
                body,
                ..Default::default()
            }],
            headers: headers
                .iter()
                .map(|(name, values)| (name.clone(), HeaderValueConfig::from(values.clone())))
                .collect(),
            ..Default::default()
        };
        Self::compile(&file)
    }

    /// Resolve a request to the response it should receive.
    pub fn resolve(&self, method: &str, path: &str) -> Resolution<'_> {
        let mut path_matched = false;

        for route in &self.routes {
            if !route.pattern().matches(path) {
                continue;
            }
            path_matched = true;
            if route.accepts(method) {
                return Resolution::Matched(route);
            }
        }

        if path_matched {
            Resolution::MethodNotAllowed(&self.method_not_allowed)
        } else {
            Resolution::NotFound(&self.not_found)
        }
    }

    /// Headers applied to every response before per-rule headers.
    pub fn global_headers(&self) -> &HeaderMap {
        &self.global_headers
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

fn compile_fallback(
    at: RuleLocation,
    config: Option<&ResponseConfig>,
    errors: &mut Vec<RuleError>,
) -> ResponseDefinition {
    config
        .and_then(|config| compile_response(at, config, errors))
        .unwrap_or_default()
}

/// Two responses with the same method and the same pattern shape can never
/// both be reached; reject the later one.
fn find_conflicts(file: &ResponsesFile, errors: &mut Vec<RuleError>) {
    let mut seen: HashMap<(String, String), usize> = HashMap::new();

    for (index, config) in file.responses.iter().enumerate() {
        // Invalid patterns are already reported by `compile_route`.
        let Ok(pattern) = PathPattern::parse(&config.path) else {
            continue;
        };
        let method = config
            .method
            .as_deref()
            .filter(|method| !method.is_empty())
            .map_or_else(|| "*".to_string(), str::to_ascii_uppercase);

        let key = (method, pattern.shape().to_string());
        if let Some(first) = seen.get(&key) {
            errors.push(RuleError::Conflict {
                at: RuleLocation::Response(index),
                first: RuleLocation::Response(*first),
                method: key.0,
                path: config.path.clone(),
            });
            continue;
        }
        seen.insert(key, index);
    }
}
