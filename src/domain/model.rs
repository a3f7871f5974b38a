use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field values of an instance, also used as the rendering context of a backend.
pub type Context = BTreeMap<String, serde_json::Value>;

/// `(model, pk)` identity of a model instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId {
    pub model: String,
    pub pk: i64,
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.model, self.pk)
    }
}

/// A model instance as handed over by the data-access layer.
///
/// Relations are resolved by the caller: `relations["account"]` holds the
/// instances reachable through the `account` relation at the time of the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub model: String,
    pub pk: i64,
    #[serde(default)]
    pub fields: Context,
    #[serde(default)]
    pub relations: BTreeMap<String, Vec<Instance>>,
}

impl Instance {
    pub fn new(model: impl Into<String>, pk: i64) -> Self {
        Self {
            model: model.into(),
            pk,
            fields: Context::new(),
            relations: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_relation(mut self, name: impl Into<String>, related: Vec<Instance>) -> Self {
        self.relations.insert(name.into(), related);
        self
    }

    pub fn id(&self) -> InstanceId {
        InstanceId {
            model: self.model.clone(),
            pk: self.pk,
        }
    }

    /// Field lookup; `pk` is always available.
    pub fn get(&self, field: &str) -> Option<serde_json::Value> {
        if field == "pk" || field == "id" {
            return Some(serde_json::Value::from(self.pk));
        }
        self.fields.get(field).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Save,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Save => write!(f, "save"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum M2mAction {
    PreAdd,
    PostAdd,
    PreRemove,
    PostRemove,
    PreClear,
    PostClear,
}

/// What happened to an instance, as reported by the data-access layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    /// `update_fields: None` means every field may have changed;
    /// `Some(vec![])` forces backend execution.
    Saved {
        #[serde(default)]
        update_fields: Option<Vec<String>>,
    },
    Deleted,
    M2mChanged {
        action: M2mAction,
        #[serde(default)]
        added: Vec<Instance>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub instance: Instance,
    #[serde(flatten)]
    pub kind: ChangeKind,
}

impl Change {
    pub fn saved(instance: Instance) -> Self {
        Self {
            instance,
            kind: ChangeKind::Saved { update_fields: None },
        }
    }

    pub fn saved_fields<I, S>(instance: Instance, update_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            instance,
            kind: ChangeKind::Saved {
                update_fields: Some(update_fields.into_iter().map(Into::into).collect()),
            },
        }
    }

    pub fn deleted(instance: Instance) -> Self {
        Self {
            instance,
            kind: ChangeKind::Deleted,
        }
    }

    pub fn m2m_added(instance: Instance, added: Vec<Instance>) -> Self {
        Self {
            instance,
            kind: ChangeKind::M2mChanged {
                action: M2mAction::PostAdd,
                added,
            },
        }
    }

    pub fn update_fields(&self) -> Option<&[String]> {
        match &self.kind {
            ChangeKind::Saved { update_fields } => update_fields.as_deref(),
            _ => None,
        }
    }

    /// `false` when every declared field is ignored by the backend.
    /// An explicitly empty list always executes.
    pub fn touches_fields_outside(&self, ignore_fields: &[String]) -> bool {
        match self.update_fields() {
            None | Some([]) => true,
            Some(fields) => fields.iter().any(|f| !ignore_fields.contains(f)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Server {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogState {
    Success,
    Failure,
    Error,
}

/// Outcome of one script run for one `(server, backend)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendLog {
    pub backend: String,
    pub server: String,
    pub state: LogState,
    pub script: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub operations: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl BackendLog {
    pub fn is_success(&self) -> bool {
        self.state == LogState::Success
    }
}

/// Raw result of running a script on a server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default = "default_method")]
    pub method: String,
    pub path: String,
}

fn default_method() -> String {
    "POST".to_string()
}

impl Request {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self { status }
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Success,
    Error,
}

/// Notification shown to the acting user of an admin request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    pub level: MessageLevel,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_fields_filtering() {
        let ignore = vec!["last_login".to_string()];
        let user = Instance::new("users.User", 1);

        assert!(Change::saved(user.clone()).touches_fields_outside(&ignore));
        assert!(Change::saved_fields(user.clone(), Vec::<String>::new()).touches_fields_outside(&ignore));
        assert!(!Change::saved_fields(user.clone(), ["last_login"]).touches_fields_outside(&ignore));
        assert!(Change::saved_fields(user, ["last_login", "shell"]).touches_fields_outside(&ignore));
    }

    #[test]
    fn test_change_from_toml() {
        let change: Change = toml::from_str(
            r#"
kind = "saved"
update_fields = ["shell"]

[instance]
model = "users.User"
pk = 3
fields = { username = "rata_palida" }
"#,
        )
        .unwrap();

        assert_eq!(change.instance.id().to_string(), "users.User#3");
        assert_eq!(change.update_fields(), Some(&["shell".to_string()][..]));
    }
}
