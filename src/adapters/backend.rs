use crate::domain::model::{Action, Context, Instance};
use crate::domain::ports::{BackendOperations, Related};
use crate::utils::error::{OrchestraError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// How changes of another model reach instances of the backend's main model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedConfig {
    pub model: String,
    /// Relation name on the related instance pointing to main-model instances.
    pub relation: String,
    #[serde(default)]
    pub many: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub ignore_fields: Vec<String>,
    #[serde(default)]
    pub related: Vec<RelatedConfig>,
    /// Command templates; `{field}` is replaced with the instance value.
    #[serde(default)]
    pub save: Vec<String>,
    #[serde(default)]
    pub delete: Vec<String>,
}

/// Backend whose behaviour is fully described by configuration.
#[derive(Debug, Clone)]
pub struct ConfiguredBackend {
    config: BackendConfig,
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"))
}

impl ConfiguredBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn substitute(&self, template: &str, instance: &Instance, context: &Context) -> Result<String> {
        let mut missing = None;
        let rendered = placeholder_regex().replace_all(template, |caps: &regex::Captures| {
            let field = &caps[1];
            let value = match field {
                "pk" | "id" => Some(serde_json::Value::from(instance.pk)),
                _ => context.get(field).cloned(),
            };
            match value {
                Some(serde_json::Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => {
                    missing.get_or_insert_with(|| field.to_string());
                    String::new()
                }
            }
        });

        match missing {
            Some(field) => Err(OrchestraError::RenderError {
                backend: self.config.name.clone(),
                message: format!("unknown field '{}' for {}", field, instance.id()),
            }),
            None => Ok(rendered.into_owned()),
        }
    }
}

impl BackendOperations for ConfiguredBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn is_main(&self, instance: &Instance) -> bool {
        instance.model == self.config.model
    }

    fn get_related(&self, instance: &Instance) -> Related {
        let Some(related) = self.config.related.iter().find(|r| r.model == instance.model) else {
            return Related::None;
        };
        match instance.relations.get(&related.relation) {
            Some(candidates) if related.many => Related::Many(candidates.clone()),
            Some(candidates) => match candidates.first() {
                Some(candidate) => Related::One(candidate.clone()),
                None => Related::None,
            },
            None => Related::None,
        }
    }

    fn ignore_fields(&self) -> &[String] {
        &self.config.ignore_fields
    }

    fn render(&self, action: Action, instance: &Instance, context: &Context) -> Result<Vec<String>> {
        let templates = match action {
            Action::Save => &self.config.save,
            Action::Delete => &self.config.delete,
        };
        templates
            .iter()
            .map(|template| self.substitute(template, instance, context))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailbox_backend() -> ConfiguredBackend {
        ConfiguredBackend::new(BackendConfig {
            name: "mailbox".to_string(),
            model: "mailboxes.Mailbox".to_string(),
            ignore_fields: vec!["last_login".to_string()],
            related: vec![RelatedConfig {
                model: "accounts.Account".to_string(),
                relation: "mailboxes".to_string(),
                many: true,
            }],
            save: vec!["mkdir -p /home/{name}/Maildir".to_string()],
            delete: vec!["rm -rf /home/{name}/Maildir # {pk}".to_string()],
        })
    }

    #[test]
    fn test_render_templates() {
        let backend = mailbox_backend();
        let mailbox = Instance::new("mailboxes.Mailbox", 12).with_field("name", "pangea");

        let save = backend.render(Action::Save, &mailbox, &mailbox.fields).unwrap();
        assert_eq!(save, vec!["mkdir -p /home/pangea/Maildir"]);
        let delete = backend.render(Action::Delete, &mailbox, &mailbox.fields).unwrap();
        assert_eq!(delete, vec!["rm -rf /home/pangea/Maildir # 12"]);

        let unnamed = Instance::new("mailboxes.Mailbox", 13);
        assert!(backend.render(Action::Save, &unnamed, &unnamed.fields).is_err());
    }

    #[test]
    fn test_get_related() {
        let backend = mailbox_backend();
        let mailboxes = vec![
            Instance::new("mailboxes.Mailbox", 1),
            Instance::new("mailboxes.Mailbox", 2),
        ];
        let account = Instance::new("accounts.Account", 1).with_relation("mailboxes", mailboxes.clone());

        assert!(!backend.is_main(&account));
        assert_eq!(backend.get_related(&account), Related::Many(mailboxes));
        assert_eq!(backend.get_related(&Instance::new("users.User", 1)), Related::None);
        assert_eq!(backend.get_related(&Instance::new("accounts.Account", 2)), Related::None);
    }
}
