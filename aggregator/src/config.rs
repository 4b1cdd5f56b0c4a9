use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::handler::Query;
use crate::paginate::DEFAULT_PAGE_SIZE;
use crate::predicate::FieldPath;
use crate::relation::parse_record_id;

/// Paths answered by the router itself.
pub const BUILTIN_PATHS: &[&str] = &["/ping", "/version"];

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Upstream timeout cannot be 0")]
    InvalidTimeout,

    #[error("Route path must start with '/': {0}")]
    InvalidPath(String),

    #[error("Route path must not end with '/': {0}")]
    TrailingSlash(String),

    #[error("Duplicate route path: {0}")]
    DuplicatePath(String),

    #[error("Route path is reserved: {0}")]
    ReservedPath(String),

    #[error("Empty source name on route {0}")]
    EmptySourceName(String),

    #[error("Parent and child source share the name {name} on route {route}")]
    DuplicateSourceName { route: String, name: String },

    #[error("Empty foreign key on route {0}")]
    EmptyForeignKey(String),

    #[error("Empty field path on route {0}")]
    EmptyFieldPath(String),

    #[error("Fixed id on route {route} is not an integer: {id}")]
    InvalidFixedId { route: String, id: String },

    #[error("Empty parameter on route {0}")]
    EmptyParam(String),

    #[error("Default page size must be at least 1 on route {0}")]
    InvalidPageSize(String),
}

/// Deployment environment; decides how much error detail clients get to see.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    #[default]
    Development,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Aggregator configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for incoming requests
    #[serde(default)]
    pub listener: Listener,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub upstream: UpstreamSettings,
    /// Routes served in addition to the built-in `/ping` and `/version`
    pub routes: Vec<RouteConfig>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;

        if self.upstream.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        let mut paths = HashSet::new();
        for route in &self.routes {
            if !route.path.starts_with('/') {
                return Err(ValidationError::InvalidPath(route.path.clone()));
            }

            // Requests are matched with any trailing slash removed
            if route.path.len() > 1 && route.path.ends_with('/') {
                return Err(ValidationError::TrailingSlash(route.path.clone()));
            }

            if BUILTIN_PATHS.contains(&route.path.as_str()) {
                return Err(ValidationError::ReservedPath(route.path.clone()));
            }

            if !paths.insert(&route.path) {
                return Err(ValidationError::DuplicatePath(route.path.clone()));
            }

            route.action.validate(&route.path)?;
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 8040,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct UpstreamSettings {
    /// Applies to each upstream request as a whole
    pub timeout_secs: u64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        UpstreamSettings { timeout_secs: 30 }
    }
}

/// An upstream collection
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SourceConfig {
    /// Name used to report failures of this source
    pub name: String,
    pub url: Url,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RouteConfig {
    pub path: String,
    pub action: RouteAction,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteAction {
    /// Fetch one source and return a page of it
    Paginate {
        source: SourceConfig,
        #[serde(default = "default_page_size")]
        default_size: usize,
    },
    /// Return one parent record and its children
    Aggregate {
        parent: SourceConfig,
        child: SourceConfig,
        foreign_key: String,
        id: ParamRule,
    },
    /// Return the children of every parent whose `field` contains the value
    Filter {
        parent: SourceConfig,
        child: SourceConfig,
        foreign_key: String,
        field: String,
        value: ParamRule,
    },
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl RouteAction {
    fn validate(&self, route: &str) -> Result<(), ValidationError> {
        match self {
            RouteAction::Paginate {
                source,
                default_size,
            } => {
                validate_source(route, source)?;
                if *default_size == 0 {
                    return Err(ValidationError::InvalidPageSize(route.to_string()));
                }
            }
            RouteAction::Aggregate {
                parent,
                child,
                foreign_key,
                id,
            } => {
                validate_relation(route, parent, child, foreign_key)?;
                id.validate(route)?;
                if let ParamRule::Fixed { fixed } = id
                    && parse_record_id(fixed).is_none()
                {
                    return Err(ValidationError::InvalidFixedId {
                        route: route.to_string(),
                        id: fixed.clone(),
                    });
                }
            }
            RouteAction::Filter {
                parent,
                child,
                foreign_key,
                field,
                value,
            } => {
                validate_relation(route, parent, child, foreign_key)?;
                if FieldPath::parse(field).is_empty() {
                    return Err(ValidationError::EmptyFieldPath(route.to_string()));
                }
                value.validate(route)?;
            }
        }
        Ok(())
    }
}

fn validate_source(route: &str, source: &SourceConfig) -> Result<(), ValidationError> {
    if source.name.is_empty() {
        return Err(ValidationError::EmptySourceName(route.to_string()));
    }
    Ok(())
}

fn validate_relation(
    route: &str,
    parent: &SourceConfig,
    child: &SourceConfig,
    foreign_key: &str,
) -> Result<(), ValidationError> {
    validate_source(route, parent)?;
    validate_source(route, child)?;

    if parent.name == child.name {
        return Err(ValidationError::DuplicateSourceName {
            route: route.to_string(),
            name: parent.name.clone(),
        });
    }

    if foreign_key.is_empty() {
        return Err(ValidationError::EmptyForeignKey(route.to_string()));
    }

    Ok(())
}

/// Where a route takes its input value from.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamRule {
    /// Read from the named query parameter
    Query { query: String },
    /// Always use this value, ignoring the query string
    Fixed { fixed: String },
}

impl ParamRule {
    pub fn resolve<'a>(&'a self, query: &'a Query) -> Option<&'a str> {
        match self {
            ParamRule::Query { query: name } => query.get(name),
            ParamRule::Fixed { fixed } => Some(fixed),
        }
    }

    /// Name of the query parameter, if the value comes from the query string.
    pub fn query_param(&self) -> Option<&str> {
        match self {
            ParamRule::Query { query } => Some(query),
            ParamRule::Fixed { .. } => None,
        }
    }

    fn validate(&self, route: &str) -> Result<(), ValidationError> {
        let value = match self {
            ParamRule::Query { query } => query,
            ParamRule::Fixed { fixed } => fixed,
        };
        if value.is_empty() {
            return Err(ValidationError::EmptyParam(route.to_string()));
        }
        Ok(())
    }
}
