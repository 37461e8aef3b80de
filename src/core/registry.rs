use serde_json::Value;

use super::runner::{CommandRunner, CommandSpec};
use super::status::{Fault, FaultResult};

/// One hardware capability: a fixed command and the parser for its output.
pub trait Handle: Send + Sync {
    fn name(&self) -> &'static str;
    fn command(&self) -> &CommandSpec;
    fn call(&self, runner: &dyn CommandRunner) -> FaultResult<Value>;
}

struct Route {
    fragment: String,
    handle: Box<dyn Handle>,
}

/// Ordered path-fragment table, built once at startup and read-only after.
#[derive(Default)]
pub struct Registry {
    routes: Vec<Route>,
}

impl Registry {
    /// Routes are tried in registration order.
    pub fn register_route<H>(&mut self, fragment: &str, handle: H)
    where
        H: Handle + 'static,
    {
        self.routes.push(Route {
            fragment: fragment.to_string(),
            handle: Box::new(handle),
        });
    }

    /// `(fragment, handle name, command line)` in priority order.
    pub fn list_routes(&self) -> Vec<(String, &'static str, String)> {
        self.routes
            .iter()
            .map(|r| (r.fragment.clone(), r.handle.name(), r.handle.command().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// First handle whose fragment occurs anywhere in `path`.
    pub fn resolve(&self, path: &str) -> FaultResult<&dyn Handle> {
        self.routes
            .iter()
            .find(|r| path.contains(r.fragment.as_str()))
            .map(|r| r.handle.as_ref())
            .ok_or_else(|| Fault::routing(path))
    }
}
