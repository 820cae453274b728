//! Resource actions.
//!
//! A [`ResourceController`] ties one resource type's store, policy, directive
//! hooks and serializer together and exposes the index / show / create /
//! update / destroy actions. Authorization always runs before any mutation or
//! rendering.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::collection::{ResourceFinder, ResourceStore};
use crate::directive::{DirectiveAssembler, DirectiveHooks, DirectiveParams, RequestOptions};
use crate::error::{AppError, AppResult};
use crate::loader::load_resource;
use crate::policy::{Action, PolicyRules, ResourcePolicy, Subject};
use crate::record::Record;
use crate::serialize::{DocumentSerializer, JsonApiSerializer};

/// Actions for one resource type.
pub struct ResourceController<S: ResourceStore, P = PolicyRules> {
    name: String,
    store: S,
    policy: Arc<P>,
    hooks: DirectiveHooks<S::Collection>,
    serializer: JsonApiSerializer,
}

impl<S, P> ResourceController<S, P>
where
    S: ResourceStore,
    S::Collection: ResourceFinder<Resource = Record>,
    P: ResourcePolicy,
{
    pub fn new(name: impl Into<String>, store: S, policy: Arc<P>) -> Self {
        Self {
            name: name.into(),
            store,
            policy,
            hooks: DirectiveHooks::default(),
            serializer: JsonApiSerializer,
        }
    }

    pub fn with_hooks(mut self, hooks: DirectiveHooks<S::Collection>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn scope(&self, subject: &Subject) -> S::Collection {
        self.policy.scope(subject, self.store.collection())
    }

    /// Render the collection shaped by `params`.
    pub fn index(&self, subject: &Subject, params: &DirectiveParams) -> AppResult<Value> {
        let permitted = self.policy.permitted_include_paths();
        let assembler = DirectiveAssembler::new(&permitted, &self.hooks);
        let (options, collection) = assembler.assemble(self.scope(subject), params)?;

        self.policy.authorize(subject, Action::Index)?;

        let records = collection.fetch();
        debug!(resource = %self.name, count = records.len(), "rendering collection");
        Ok(self.serializer.render_many(&records, &options))
    }

    /// Render one resource resolved by id or slug.
    pub fn show(&self, subject: &Subject, id: &str, params: &DirectiveParams) -> AppResult<Value> {
        let permitted = self.policy.permitted_include_paths();
        let assembler = DirectiveAssembler::new(&permitted, &self.hooks);
        let options = assembler.member_options(params)?;

        let record = load_resource(&self.scope(subject), id)?;
        self.policy.authorize(subject, Action::Show)?;

        Ok(self.serializer.render_one(&record, &options))
    }

    /// Build a resource from `data.attributes`, keeping only permitted
    /// attributes, and persist it.
    pub fn create(&self, subject: &Subject, payload: &Value) -> AppResult<Value> {
        let data = payload.get("data").unwrap_or(&Value::Null);
        let record = self.build_record(data);

        self.policy.authorize(subject, Action::Create)?;

        let record = self
            .store
            .insert(record)
            .map_err(AppError::ValidationFailed)?;
        info!(resource = %self.name, id = %record.id, "created resource");

        Ok(self.serializer.render_one(&record, &RequestOptions::member()))
    }

    /// Merge permitted `data.attributes` into a resource resolved by id or
    /// slug and persist it.
    pub fn update(&self, subject: &Subject, id: &str, payload: &Value) -> AppResult<Value> {
        let mut record = load_resource(&self.scope(subject), id)?;
        self.policy.authorize(subject, Action::Update)?;

        let data = payload.get("data").unwrap_or(&Value::Null);
        record.attributes.extend(self.permitted_attributes(data));

        let record = self
            .store
            .update(record)
            .map_err(AppError::ValidationFailed)?;
        info!(resource = %self.name, id = %record.id, "updated resource");

        Ok(self.serializer.render_one(&record, &RequestOptions::member()))
    }

    /// Remove a resource resolved by id or slug.
    pub fn destroy(&self, subject: &Subject, id: &str) -> AppResult<()> {
        let record = load_resource(&self.scope(subject), id)?;
        self.policy.authorize(subject, Action::Destroy)?;

        if !self.store.delete(&record.id) {
            return Err(AppError::NotFound);
        }
        info!(resource = %self.name, id = %record.id, "destroyed resource");
        Ok(())
    }

    /// `data.attributes` restricted to the policy's writable attributes.
    fn permitted_attributes(&self, data: &Value) -> Map<String, Value> {
        let permitted = self.policy.permitted_attributes();
        data.get("attributes")
            .and_then(Value::as_object)
            .map(|attrs| {
                attrs
                    .iter()
                    .filter(|(name, _)| permitted.contains(*name))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn build_record(&self, data: &Value) -> Record {
        let attributes = self.permitted_attributes(data);

        let id = data
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::now_v7().to_string());

        Record {
            attributes,
            ..Record::new(self.name.clone(), id)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::memory::{MemoryCollection, MemoryStore};
    use crate::policy::PolicyRules;
    use serde_json::json;
    use std::collections::HashSet;

    fn controller(rules: PolicyRules) -> ResourceController<MemoryStore> {
        let store = MemoryStore::new("articles")
            .with_required_attributes(["title"])
            .with_records(vec![
                Record::new("articles", "1").with_attribute("title", json!("One")),
            ]);
        ResourceController::new("articles", store, Arc::new(rules))
    }

    fn writer() -> PolicyRules {
        PolicyRules {
            actions: HashSet::from([Action::Index, Action::Show, Action::Create]),
            permitted_attributes: vec!["title".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn create_drops_unpermitted_attributes() {
        let controller = controller(writer());
        let doc = controller
            .create(
                &Subject::Anonymous,
                &json!({"data": {"attributes": {"title": "Two", "admin": true}}}),
            )
            .unwrap();

        assert_eq!(doc["data"]["attributes"]["title"], "Two");
        assert!(doc["data"]["attributes"].get("admin").is_none());
        assert_eq!(controller.store().len(), 2);
    }

    #[test]
    fn create_surfaces_validation_errors() {
        let controller = controller(writer());
        let err = controller
            .create(&Subject::Anonymous, &json!({"data": {"attributes": {}}}))
            .unwrap_err();

        match err {
            AppError::ValidationFailed(errors) => {
                assert_eq!(errors.get("title").to_vec(), vec!["can't be blank".to_string()]);
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn create_is_authorized_before_saving() {
        let controller = controller(PolicyRules::default());
        let err = controller
            .create(&Subject::Anonymous, &json!({"data": {"attributes": {"title": "x"}}}))
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized));
        assert_eq!(controller.store().len(), 1);
    }

    #[test]
    fn update_merges_permitted_attributes() {
        let rules = PolicyRules {
            actions: HashSet::from([Action::Update]),
            ..writer()
        };
        let controller = controller(rules);
        let doc = controller
            .update(
                &Subject::Anonymous,
                "1",
                &json!({"data": {"attributes": {"title": "Uno", "admin": true}}}),
            )
            .unwrap();

        assert_eq!(doc["data"]["attributes"]["title"], "Uno");
        assert!(doc["data"]["attributes"].get("admin").is_none());
    }

    #[test]
    fn update_is_authorized_before_saving() {
        let controller = controller(writer());
        let err = controller
            .update(&Subject::Anonymous, "1", &json!({"data": {"attributes": {"title": "x"}}}))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));

        let record = load_resource(&controller.store().collection(), "1").unwrap();
        assert_eq!(record.attributes["title"], "One");
    }

    #[test]
    fn destroy_denied_by_default_policy() {
        let controller = controller(PolicyRules::default());
        assert!(matches!(
            controller.destroy(&Subject::User("ada".to_string()), "1"),
            Err(AppError::Unauthorized)
        ));
        assert_eq!(controller.store().len(), 1);
    }

    #[test]
    fn index_with_filter_hook() {
        let hooks: DirectiveHooks<MemoryCollection> = DirectiveHooks::new().with_filter(
            |collection: MemoryCollection, raw: &str| -> AppResult<MemoryCollection> {
                let wanted = raw.to_string();
                Ok(collection.retain(move |r| r.attributes.get("title") == Some(&json!(wanted))))
            },
        );
        let controller = controller(writer()).with_hooks(hooks);

        let params = DirectiveParams {
            filter: Some("missing".to_string()),
            ..Default::default()
        };
        let doc = controller.index(&Subject::Anonymous, &params).unwrap();
        assert_eq!(doc["data"], json!([]));
    }

    #[test]
    fn show_missing_is_not_found() {
        let controller = controller(writer());
        assert!(matches!(
            controller.show(&Subject::Anonymous, "42", &DirectiveParams::default()),
            Err(AppError::NotFound)
        ));
    }
}
