use crate::domain::model::{Instance, Server};
use crate::domain::operation::Operation;
use crate::domain::ports::Router;
use crate::utils::error::{OrchestraError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Route lookups already done during the current request, per backend.
#[derive(Debug, Default)]
pub struct RouteCache {
    routes: HashMap<String, Vec<Route>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, backend: &str) -> bool {
        self.routes.contains_key(backend)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Cached routes for `backend`, running `load` on the first lookup only.
    pub fn get_or_load<F>(&mut self, backend: &str, load: F) -> &[Route]
    where
        F: FnOnce() -> Vec<Route>,
    {
        self.routes.entry(backend.to_string()).or_insert_with(load)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Eq(String, serde_json::Value),
    Ne(String, serde_json::Value),
}

/// Predicate deciding whether a route applies to an instance.
///
/// Accepts `True`, `False`, `*`, or `field == literal` / `field != literal`
/// clauses joined by `and`. Literals are JSON; `'single quoted'` strings are allowed.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteMatch {
    Always,
    Never,
    All(Vec<Clause>),
}

fn clause_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(==|!=)\s*(.+?)\s*$").expect("valid clause regex")
    })
}

fn and_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+and\s+").expect("valid separator regex"))
}

/// Splits on `and` separators that are not inside a quoted literal.
fn split_clauses(expression: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for sep in and_regex().find_iter(expression) {
        if expression[..sep.start()].matches('\'').count() % 2 == 0 {
            parts.push(&expression[start..sep.start()]);
            start = sep.end();
        }
    }
    parts.push(&expression[start..]);
    parts
}

impl RouteMatch {
    pub fn parse(expression: &str) -> Result<Self> {
        let trimmed = expression.trim();
        match trimmed {
            "" | "*" | "True" | "true" => return Ok(RouteMatch::Always),
            "False" | "false" => return Ok(RouteMatch::Never),
            _ => {}
        }

        let mut clauses = Vec::new();
        for part in split_clauses(trimmed) {
            let caps = clause_regex()
                .captures(part)
                .ok_or_else(|| OrchestraError::RouteMatchError {
                    expression: expression.to_string(),
                    reason: format!("cannot parse clause '{}'", part.trim()),
                })?;
            let field = caps[1].to_string();
            let value = parse_literal(&caps[3]).ok_or_else(|| OrchestraError::RouteMatchError {
                expression: expression.to_string(),
                reason: format!("invalid literal '{}'", &caps[3]),
            })?;
            clauses.push(match &caps[2] {
                "==" => Clause::Eq(field, value),
                _ => Clause::Ne(field, value),
            });
        }
        Ok(RouteMatch::All(clauses))
    }

    pub fn matches(&self, instance: &Instance) -> bool {
        match self {
            RouteMatch::Always => true,
            RouteMatch::Never => false,
            RouteMatch::All(clauses) => clauses.iter().all(|clause| match clause {
                Clause::Eq(field, value) => instance.get(field).as_ref() == Some(value),
                Clause::Ne(field, value) => instance.get(field).as_ref() != Some(value),
            }),
        }
    }
}

fn parse_literal(raw: &str) -> Option<serde_json::Value> {
    let raw = raw.trim();
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Some(serde_json::Value::String(raw[1..raw.len() - 1].to_string()));
    }
    match raw {
        "True" => return Some(serde_json::Value::Bool(true)),
        "False" => return Some(serde_json::Value::Bool(false)),
        "None" => return Some(serde_json::Value::Null),
        _ => {}
    }
    serde_json::from_str(raw).ok()
}

/// Route definition as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub backend: String,
    pub host: String,
    #[serde(default = "default_match", rename = "match")]
    pub match_expr: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_match() -> String {
    "True".to_string()
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct Route {
    pub backend: String,
    pub host: Server,
    pub matcher: RouteMatch,
    pub is_active: bool,
}

impl Route {
    pub fn matches(&self, instance: &Instance) -> bool {
        self.matcher.matches(instance)
    }
}

/// Static routing table: `backend → [(server, match)]`.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn from_config(routes: &[RouteConfig], servers: &[Server]) -> Result<Self> {
        let mut table = Vec::with_capacity(routes.len());
        for route in routes {
            let host = servers
                .iter()
                .find(|s| s.name == route.host)
                .cloned()
                .ok_or_else(|| OrchestraError::InvalidConfigValueError {
                    field: "routes.host".to_string(),
                    value: route.host.clone(),
                    reason: "Unknown server".to_string(),
                })?;
            table.push(Route {
                backend: route.backend.clone(),
                host,
                matcher: RouteMatch::parse(&route.match_expr)?,
                is_active: route.is_active,
            });
        }
        Ok(Self::new(table))
    }

    pub fn active_routes(&self, backend: &str) -> Vec<Route> {
        self.routes
            .iter()
            .filter(|r| r.is_active && r.backend == backend)
            .cloned()
            .collect()
    }
}

impl Router for RouteTable {
    fn get_servers(&self, operation: &Operation, cache: &mut RouteCache) -> Vec<Server> {
        let backend = operation.backend_name();
        let routes = cache.get_or_load(backend, || {
            tracing::trace!("Loading routes for backend {}", backend);
            self.active_routes(backend)
        });

        let mut servers: Vec<Server> = Vec::new();
        for route in routes {
            if route.matches(&operation.instance) && !servers.contains(&route.host) {
                servers.push(route.host.clone());
            }
        }
        servers
    }
}
