//! Compiled routing rules.
//!
//! # Responsibilities
//! - Turn configured responses into validated, ready-to-emit definitions
//! - Report every invalid field, not just the first one
//!
//! # Design Decisions
//! - Methods compare case-insensitively; stored upper-cased
//! - Status 0 means 200
//! - Empty `body` / `file` strings count as unset

use std::fmt;
use std::path::PathBuf;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

use crate::config::schema::{HeaderConfig, ResponseConfig};
use crate::routing::pattern::{PathPattern, PatternError};

/// A fully resolved canned response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseDefinition {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub file: Option<PathBuf>,
}

/// One compiled method/path → response mapping.
#[derive(Debug, Clone)]
pub struct Route {
    method: Option<String>,
    pattern: PathPattern,
    response: ResponseDefinition,
}

impl Route {
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn response(&self) -> &ResponseDefinition {
        &self.response
    }

    /// True when the route has no method or the same one, ignoring case.
    pub fn accepts(&self, method: &str) -> bool {
        self.method
            .as_deref()
            .map_or(true, |expected| expected.eq_ignore_ascii_case(method))
    }
}

/// Where in the responses file an error was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleLocation {
    Response(usize),
    NotFound,
    MethodNotAllowed,
    GlobalHeaders,
}

impl fmt::Display for RuleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleLocation::Response(index) => write!(f, "responses[{}]", index),
            RuleLocation::NotFound => write!(f, "notFound"),
            RuleLocation::MethodNotAllowed => write!(f, "methodNotAllowed"),
            RuleLocation::GlobalHeaders => write!(f, "headers"),
        }
    }
}

/// A single invalid rule field.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("{at}: invalid path '{path}': {source}")]
    Pattern {
        at: RuleLocation,
        path: String,
        #[source]
        source: PatternError,
    },

    #[error("{at}: invalid method '{method}'")]
    Method { at: RuleLocation, method: String },

    #[error("{at}: invalid status {status}")]
    Status { at: RuleLocation, status: u16 },

    #[error("{at}: invalid header name '{name}'")]
    HeaderName { at: RuleLocation, name: String },

    #[error("{at}: invalid value for header '{name}'")]
    HeaderValue { at: RuleLocation, name: String },

    #[error("{at}: {method} {path} is already handled by {first}")]
    Conflict {
        at: RuleLocation,
        first: RuleLocation,
        method: String,
        path: String,
    },
}

/// Compile one configured response into a route.
pub(crate) fn compile_route(index: usize, config: &ResponseConfig, errors: &mut Vec<RuleError>) -> Option<Route> {
    let at = RuleLocation::Response(index);

    let pattern = match PathPattern::parse(&config.path) {
        Ok(pattern) => Some(pattern),
        Err(source) => {
            errors.push(RuleError::Pattern {
                at: at.clone(),
                path: config.path.clone(),
                source,
            });
            None
        }
    };

    let method = match config.method.as_deref().filter(|method| !method.is_empty()) {
        None => Some(None),
        Some(method) => match Method::from_bytes(method.as_bytes()) {
            Ok(_) => Some(Some(method.to_ascii_uppercase())),
            Err(_) => {
                errors.push(RuleError::Method {
                    at: at.clone(),
                    method: method.to_string(),
                });
                None
            }
        },
    };

    let response = compile_response(at, config, errors);

    Some(Route {
        method: method?,
        pattern: pattern?,
        response: response?,
    })
}

/// Compile the response half of a configured rule.
pub(crate) fn compile_response(
    at: RuleLocation,
    config: &ResponseConfig,
    errors: &mut Vec<RuleError>,
) -> Option<ResponseDefinition> {
    let before = errors.len();

    let status = match config.status {
        0 => StatusCode::OK,
        code => StatusCode::from_u16(code).unwrap_or_else(|_| {
            errors.push(RuleError::Status {
                at: at.clone(),
                status: code,
            });
            StatusCode::OK
        }),
    };
    let headers = compile_headers(&at, &config.headers, errors);

    if errors.len() > before {
        return None;
    }

    Some(ResponseDefinition {
        status,
        headers,
        body: config.body.clone().filter(|body| !body.is_empty()),
        file: config.file.clone().filter(|file| !file.as_os_str().is_empty()),
    })
}

/// Compile configured headers into a multi-value header map.
pub(crate) fn compile_headers(at: &RuleLocation, config: &HeaderConfig, errors: &mut Vec<RuleError>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for (name, values) in config {
        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            errors.push(RuleError::HeaderName {
                at: at.clone(),
                name: name.clone(),
            });
            continue;
        };
        for value in values.values() {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.append(header_name.clone(), value);
                }
                Err(_) => errors.push(RuleError::HeaderValue {
                    at: at.clone(),
                    name: name.clone(),
                }),
            }
        }
    }

    headers
}
