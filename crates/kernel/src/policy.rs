//! Authorization policies.
//!
//! Each resource type maps to a [`PolicyRules`] entry: which actions are
//! allowed, which includes may be requested and which attributes may be
//! written. Types without an entry get the default policy, which denies
//! everything except showing records already visible in scope.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collection::CollectionHandle;
use crate::error::{AppError, AppResult};

/// Controller actions subject to authorization.
///
/// Policy files name actions the way routes do, so `new` and `edit` are
/// accepted as aliases (see [`Action::from_name`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Action {
    Index,
    Show,
    Create,
    Update,
    Destroy,
}

impl Action {
    /// `new` and `edit` authorize as `create` and `update`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "index" => Some(Action::Index),
            "show" => Some(Action::Show),
            "create" | "new" => Some(Action::Create),
            "update" | "edit" => Some(Action::Update),
            "destroy" => Some(Action::Destroy),
            _ => None,
        }
    }
}

impl TryFrom<String> for Action {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Action::from_name(&name).ok_or_else(|| format!("unknown action `{name}`"))
    }
}

/// The party a request acts on behalf of.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Subject {
    #[default]
    Anonymous,
    User(String),
}

impl Subject {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Subject::Anonymous)
    }
}

/// Authorization-policy contract for one resource type.
pub trait ResourcePolicy: Send + Sync {
    /// Include paths a client may request.
    fn permitted_include_paths(&self) -> HashSet<String>;

    /// Attributes a client may write on create.
    fn permitted_attributes(&self) -> HashSet<String>;

    /// Allow or deny `action` for `subject`.
    fn authorize(&self, subject: &Subject, action: Action) -> AppResult<()>;

    /// Base collection visible to `subject`. Defaults to everything.
    fn scope<C: CollectionHandle>(&self, subject: &Subject, base: C) -> C {
        let _ = subject;
        base
    }
}

/// Data-driven policy for one resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRules {
    /// Actions allowed for every subject.
    #[serde(default = "default_actions")]
    pub actions: HashSet<Action>,

    /// Actions additionally allowed for authenticated subjects.
    #[serde(default)]
    pub authenticated_actions: HashSet<Action>,

    #[serde(default)]
    pub permitted_includes: Vec<String>,

    #[serde(default)]
    pub permitted_attributes: Vec<String>,
}

fn default_actions() -> HashSet<Action> {
    HashSet::from([Action::Show])
}

impl Default for PolicyRules {
    fn default() -> Self {
        Self {
            actions: default_actions(),
            authenticated_actions: HashSet::new(),
            permitted_includes: Vec::new(),
            permitted_attributes: Vec::new(),
        }
    }
}

impl PolicyRules {
    pub fn allows(&self, subject: &Subject, action: Action) -> bool {
        self.actions.contains(&action)
            || (!subject.is_anonymous() && self.authenticated_actions.contains(&action))
    }
}

impl ResourcePolicy for PolicyRules {
    fn permitted_include_paths(&self) -> HashSet<String> {
        self.permitted_includes.iter().cloned().collect()
    }

    fn permitted_attributes(&self) -> HashSet<String> {
        self.permitted_attributes.iter().cloned().collect()
    }

    fn authorize(&self, subject: &Subject, action: Action) -> AppResult<()> {
        if self.allows(subject, action) {
            Ok(())
        } else {
            debug!(?subject, ?action, "policy denied action");
            Err(AppError::Unauthorized)
        }
    }
}

/// Policy lookup by resource type name.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    rules: HashMap<String, Arc<PolicyRules>>,
    fallback: Arc<PolicyRules>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML document mapping resource type names to rules.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let rules: HashMap<String, PolicyRules> =
            serde_yml::from_str(yaml).context("invalid policy document")?;
        Ok(Self {
            rules: rules.into_iter().map(|(k, v)| (k, Arc::new(v))).collect(),
            fallback: Arc::new(PolicyRules::default()),
        })
    }

    /// Load a YAML policy file.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read policy file {}", path.display()))?;
        Self::from_yaml(&yaml)
    }

    /// Rules for a resource type, or the default policy.
    pub fn policy_for(&self, resource_type: &str) -> Arc<PolicyRules> {
        self.rules
            .get(resource_type)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
