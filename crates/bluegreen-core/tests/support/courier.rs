//! Scripted, recording courier for orchestration tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use bluegreen_core::courier::{Courier, CourierError, CourierResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Login,
    Rename,
    Push,
    MapRoute,
    Delete,
    Logs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login { url: String, username: String, skip_ssl: bool },
    Rename { from: String, to: String },
    Push { app: String, path: PathBuf, instances: u16 },
    MapRoute { app: String, domain: String },
    Delete { app: String },
    Exists { app: String },
    Logs { app: String },
    CleanUp,
}

/// Answers each operation from a queue of scripted results.
///
/// Operations without a scripted result succeed with empty output.
#[derive(Debug, Default)]
pub struct FakeCourier {
    calls: RefCell<Vec<Call>>,
    responses: RefCell<HashMap<Op, VecDeque<CourierResult>>>,
    existing: RefCell<HashSet<String>>,
    clean_up_error: Option<String>,
}

impl FakeCourier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an app as present on the foundation.
    pub fn with_app(self, app: &str) -> Self {
        self.existing.borrow_mut().insert(app.to_string());
        self
    }

    pub fn succeed(self, op: Op, output: &str) -> Self {
        self.script(op, Ok(output.as_bytes().to_vec()))
    }

    pub fn fail(self, op: Op, message: &str, output: &str) -> Self {
        self.script(op, Err(CourierError::with_output(message, output.as_bytes())))
    }

    pub fn fail_clean_up(mut self, message: &str) -> Self {
        self.clean_up_error = Some(message.to_string());
        self
    }

    fn script(self, op: Op, result: CourierResult) -> Self {
        self.responses
            .borrow_mut()
            .entry(op)
            .or_default()
            .push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| matches(c)).count()
    }

    pub fn pushed(&self) -> bool {
        self.count(|c| matches!(c, Call::Push { .. })) > 0
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn respond(&self, op: Op) -> CourierResult {
        self.responses
            .borrow_mut()
            .get_mut(&op)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

impl Courier for FakeCourier {
    fn login(
        &self,
        url: &str,
        username: &str,
        _password: &str,
        _org: &str,
        _space: &str,
        skip_ssl: bool,
    ) -> CourierResult {
        self.record(Call::Login {
            url: url.to_string(),
            username: username.to_string(),
            skip_ssl,
        });
        self.respond(Op::Login)
    }

    fn rename(&self, app_name: &str, new_name: &str) -> CourierResult {
        self.record(Call::Rename {
            from: app_name.to_string(),
            to: new_name.to_string(),
        });
        self.respond(Op::Rename)
    }

    fn push(&self, app_name: &str, app_path: &Path, instances: u16) -> CourierResult {
        self.record(Call::Push {
            app: app_name.to_string(),
            path: app_path.to_path_buf(),
            instances,
        });
        self.respond(Op::Push)
    }

    fn map_route(&self, app_name: &str, domain: &str) -> CourierResult {
        self.record(Call::MapRoute {
            app: app_name.to_string(),
            domain: domain.to_string(),
        });
        self.respond(Op::MapRoute)
    }

    fn delete(&self, app_name: &str) -> CourierResult {
        self.record(Call::Delete {
            app: app_name.to_string(),
        });
        self.respond(Op::Delete)
    }

    fn exists(&self, app_name: &str) -> bool {
        self.record(Call::Exists {
            app: app_name.to_string(),
        });
        self.existing.borrow().contains(app_name)
    }

    fn logs(&self, app_name: &str) -> CourierResult {
        self.record(Call::Logs {
            app: app_name.to_string(),
        });
        self.respond(Op::Logs)
    }

    fn clean_up(&self) -> Result<(), CourierError> {
        self.record(Call::CleanUp);
        match &self.clean_up_error {
            Some(message) => Err(CourierError::new(message.clone())),
            None => Ok(()),
        }
    }
}
