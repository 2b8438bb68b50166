//! The per-model CRUD surface.
//!
//! [`ModelStore`] owns the processed schema, the record tables, the
//! graph store, and the change buffer, and orchestrates them under a
//! transactional batching rule: every public mutation runs to
//! completion, including nested creates and cascaded disconnections,
//! then the change buffer is flushed to the listener exactly once.
//!
//! Validation runs before any mutation commits: a create (or update)
//! that fails required-field or input-shape validation leaves no partial
//! record visible.

use indexmap::IndexMap;

use relata_core::{
    IdAllocator, RecordId, SequentialIds, StoreError, StoreResult, Value,
};

use crate::changes::{ChangeBuffer, ChangeEvent, ChangeKind};
use crate::commands::Command;
use crate::graph::GraphStore;
use crate::schema::{Field, FieldKind, ModelDefs, Relation, Role, Schema};
use crate::store::{FieldValue, Record, RecordTable, StoredRecord};
use crate::values::{FieldInput, Values};

/// Callback invoked once per public mutation with the coalesced events.
pub type ChangeListener = Box<dyn FnMut(&[ChangeEvent])>;

/// The store facade: one instance per processed schema.
pub struct ModelStore {
    pub(crate) schema: Schema,
    pub(crate) records: RecordTable,
    pub(crate) graph: GraphStore,
    pub(crate) changes: ChangeBuffer,
    ids: Box<dyn IdAllocator>,
    listener: Option<ChangeListener>,
}

impl ModelStore {
    /// Process `defs` and build a store with sequential id allocation.
    pub fn new(defs: ModelDefs) -> StoreResult<Self> {
        Self::with_allocator(defs, SequentialIds::new())
    }

    /// Process `defs` with an explicit id allocator.
    pub fn with_allocator(
        defs: ModelDefs,
        allocator: impl IdAllocator + 'static,
    ) -> StoreResult<Self> {
        let schema = Schema::process(defs)?;
        let records = RecordTable::with_models(schema.model_names());
        Ok(ModelStore {
            schema,
            records,
            graph: GraphStore::new(),
            changes: ChangeBuffer::new(),
            ids: Box::new(allocator),
            listener: None,
        })
    }

    /// Install the change notification callback.
    pub fn set_listener(&mut self, listener: impl FnMut(&[ChangeEvent]) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// The processed schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The per-model API for `model`.
    pub fn model(&mut self, model: &str) -> StoreResult<ModelHandle<'_>> {
        if !self.schema.has_model(model) {
            return Err(StoreError::not_found(format!("model '{}'", model)));
        }
        Ok(ModelHandle {
            model: model.to_string(),
            store: self,
        })
    }

    // =========================================================================
    // Internal orchestration (no flushing: the handle owns the batch)
    // =========================================================================

    fn relation_of(&self, field: &Field) -> StoreResult<Relation> {
        let ref_name = field.relation_ref.as_deref().ok_or_else(|| {
            StoreError::schema(format!("field '{}' has no relation", field.name))
        })?;
        self.schema
            .relation(ref_name)
            .cloned()
            .ok_or_else(|| StoreError::schema(format!("unknown relation '{}'", ref_name)))
    }

    fn target_of(&self, field: &Field) -> StoreResult<String> {
        field.related_to.clone().ok_or_else(|| {
            StoreError::schema(format!("field '{}' has no target model", field.name))
        })
    }

    fn model_fields(&self, model: &str) -> StoreResult<Vec<Field>> {
        Ok(self
            .schema
            .fields(model)
            .ok_or_else(|| StoreError::not_found(format!("model '{}'", model)))?
            .values()
            .cloned()
            .collect())
    }

    /// Pre-mutation validation of one create call, recursing into inline
    /// many2one values and nested `create` commands. `seen` tracks
    /// explicit ids claimed earlier in the same batch.
    fn validate_create(
        &self,
        model: &str,
        values: &Values,
        seen: &mut Vec<(String, RecordId)>,
    ) -> StoreResult<()> {
        let fields = self
            .schema
            .fields(model)
            .ok_or_else(|| StoreError::not_found(format!("model '{}'", model)))?;
        if let Some(id) = values.id() {
            let claim = (model.to_string(), id.clone());
            if self.records.contains(model, id) || seen.contains(&claim) {
                return Err(StoreError::validation(format!(
                    "record '{}:{}' already exists",
                    model, id
                )));
            }
            seen.push(claim);
        }
        for (name, field) in fields {
            if field.required && !values.contains(name) {
                return Err(StoreError::validation(format!(
                    "'{}' field is required when creating '{}' record",
                    name, model
                )));
            }
        }
        for (name, input) in values.iter() {
            let field = match fields.get(name) {
                Some(f) => f,
                None => continue,
            };
            self.validate_input(model, field, input, seen)?;
        }
        Ok(())
    }

    fn validate_input(
        &self,
        model: &str,
        field: &Field,
        input: &FieldInput,
        seen: &mut Vec<(String, RecordId)>,
    ) -> StoreResult<()> {
        match (field.kind, input) {
            (FieldKind::Scalar, FieldInput::Scalar(_)) => Ok(()),
            (FieldKind::Many2One, FieldInput::Id(_) | FieldInput::Unset) => Ok(()),
            (FieldKind::Many2One, FieldInput::Inline(nested)) => {
                let target = self.target_of(field)?;
                self.validate_create(&target, nested, seen)
            }
            (FieldKind::One2Many | FieldKind::Many2Many, FieldInput::Commands(cmds)) => {
                let target = self.target_of(field)?;
                for cmd in cmds {
                    if let Command::Create(list) = cmd {
                        for nested in list {
                            self.validate_create(&target, nested, seen)?;
                        }
                    }
                }
                Ok(())
            }
            (FieldKind::Scalar, _) => Err(StoreError::validation(format!(
                "field '{}.{}' expects a scalar value",
                model, field.name
            ))),
            (FieldKind::Many2One, _) => Err(StoreError::reference(format!(
                "field '{}.{}' expects an id, inline values, or unset",
                model, field.name
            ))),
            (FieldKind::One2Many | FieldKind::Many2Many, _) => {
                Err(StoreError::reference(format!(
                    "field '{}.{}' expects a command sequence",
                    model, field.name
                )))
            }
        }
    }

    /// Instantiate a record. Input must already be validated.
    fn create_record(&mut self, model: &str, values: &Values) -> StoreResult<RecordId> {
        let fields = self.model_fields(model)?;
        let id = match values.id() {
            Some(id) => id.clone(),
            None => loop {
                let id = self.ids.allocate(model);
                if !self.records.contains(model, &id) {
                    break id;
                }
            },
        };

        let mut scalars: IndexMap<String, Value> = IndexMap::new();
        for (name, input) in values.iter() {
            let is_scalar = fields
                .iter()
                .any(|f| f.name == name && !f.is_relational());
            if !is_scalar {
                continue;
            }
            if let FieldInput::Scalar(v) = input {
                scalars.insert(name.to_string(), v.clone());
            }
        }
        let payload = Value::Object(scalars.clone().into_iter().collect());
        self.records.insert(
            model,
            StoredRecord {
                id: id.clone(),
                scalars,
            },
        );
        tracing::debug!(target: "relata::store", model, id = %id, "create record");
        self.changes.add(ChangeEvent::record(
            ChangeKind::Created,
            model,
            id.as_str(),
            Some(payload),
        ));

        // One node per relational field, dummy fields included.
        for field in &fields {
            if !field.is_relational() {
                continue;
            }
            let rel = self.relation_of(field)?;
            let slot = field.slot(model);
            self.graph.create_node(&rel, &slot, &id, &mut self.changes);
        }

        for (name, input) in values.iter() {
            let field = match fields.iter().find(|f| f.name == name) {
                Some(f) if f.is_relational() => f,
                _ => continue,
            };
            let rel = self.relation_of(field)?;
            let slot = field.slot(model);
            let target_model = self.target_of(field)?;
            match input {
                FieldInput::Id(target) => {
                    // Non-existent ids are filtered, not errors.
                    if self.records.contains(&target_model, target) {
                        self.graph
                            .connect(&rel, &slot, &id, target, &mut self.changes);
                    }
                }
                FieldInput::Inline(nested) => {
                    let target_id = self.create_record(&target_model, nested)?;
                    self.graph
                        .connect(&rel, &slot, &id, &target_id, &mut self.changes);
                }
                FieldInput::Commands(cmds) => {
                    self.apply_commands(model, field, &rel, &id, cmds)?;
                }
                FieldInput::Unset | FieldInput::Scalar(_) => {}
            }
        }
        Ok(id)
    }

    fn apply_commands(
        &mut self,
        model: &str,
        field: &Field,
        rel: &Relation,
        owner_id: &RecordId,
        cmds: &[Command],
    ) -> StoreResult<()> {
        let slot = field.slot(model);
        let target_model = self.target_of(field)?;
        for cmd in cmds {
            match cmd {
                Command::Link(ids) => {
                    for target in ids {
                        if self.records.contains(&target_model, target) {
                            self.graph
                                .connect(rel, &slot, owner_id, target, &mut self.changes);
                        }
                    }
                }
                Command::Unlink(ids) => {
                    for target in ids {
                        self.graph
                            .disconnect(rel, &slot, owner_id, target, &mut self.changes);
                    }
                }
                Command::Create(list) => {
                    for nested in list {
                        let target_id = self.create_record(&target_model, nested)?;
                        self.graph
                            .connect(rel, &slot, owner_id, &target_id, &mut self.changes);
                    }
                }
                Command::Clear => {
                    self.graph
                        .clear(rel, &slot, owner_id, false, &mut self.changes);
                }
            }
        }
        Ok(())
    }

    fn update_record(&mut self, model: &str, id: &RecordId, values: &Values) -> StoreResult<()> {
        let fields = self.model_fields(model)?;
        for (name, input) in values.iter() {
            let field = match fields.iter().find(|f| f.name == name) {
                Some(f) => f,
                None => continue,
            };
            if !field.is_relational() {
                if let FieldInput::Scalar(v) = input {
                    if let Some(record) = self.records.get_mut(model, id) {
                        record.scalars.insert(name.to_string(), v.clone());
                    }
                }
                continue;
            }
            let rel = self.relation_of(field)?;
            let slot = field.slot(model);
            let target_model = self.target_of(field)?;
            match input {
                FieldInput::Id(target) => {
                    if self.records.contains(&target_model, target) {
                        self.graph
                            .connect(&rel, &slot, id, target, &mut self.changes);
                    }
                }
                FieldInput::Inline(nested) => {
                    let target_id = self.create_record(&target_model, nested)?;
                    self.graph
                        .connect(&rel, &slot, id, &target_id, &mut self.changes);
                }
                FieldInput::Unset => {
                    if let Some(current) = self.graph.linked_one(&rel, &slot, id) {
                        self.graph
                            .disconnect(&rel, &slot, id, &current.id, &mut self.changes);
                    }
                }
                FieldInput::Commands(cmds) => {
                    self.apply_commands(model, field, &rel, id, cmds)?;
                }
                FieldInput::Scalar(_) => {}
            }
        }
        let payload = self
            .records
            .get(model, id)
            .map(|r| Value::Object(r.scalars.clone().into_iter().collect()));
        self.changes.add(ChangeEvent::record(
            ChangeKind::Modified,
            model,
            id.as_str(),
            payload,
        ));
        Ok(())
    }

    fn delete_record(&mut self, model: &str, id: &RecordId) -> StoreResult<()> {
        let fields = self.model_fields(model)?;
        for field in &fields {
            if !field.is_relational() {
                continue;
            }
            let rel = self.relation_of(field)?;
            let slot = field.slot(model);
            self.graph.clear(&rel, &slot, id, true, &mut self.changes);
        }
        self.records.remove(model, id);
        tracing::debug!(target: "relata::store", model, id = %id, "delete record");
        self.changes.add(ChangeEvent::record(
            ChangeKind::Deleted,
            model,
            id.as_str(),
            None,
        ));
        Ok(())
    }

    /// Build the read view of one record: scalars from the record table,
    /// relational fields resolved through the graph store.
    pub(crate) fn materialize(&self, model: &str, id: &RecordId) -> Option<Record> {
        let stored = self.records.get(model, id)?;
        let fields = self.schema.fields(model)?;
        let mut out: IndexMap<String, FieldValue> = IndexMap::new();
        for (name, field) in fields {
            if field.is_relational() {
                let rel = match field
                    .relation_ref
                    .as_deref()
                    .and_then(|r| self.schema.relation(r))
                {
                    Some(r) => r,
                    None => continue,
                };
                let slot = field.slot(model);
                let value = match rel.role_of(&slot.model, &slot.field) {
                    Role::Single => FieldValue::One(
                        self.graph.linked_one(rel, &slot, id).map(|r| r.id),
                    ),
                    Role::Multi => FieldValue::Many(
                        self.graph
                            .linked(rel, &slot, id)
                            .into_iter()
                            .map(|r| r.id)
                            .collect(),
                    ),
                };
                out.insert(name.clone(), value);
            } else if let Some(v) = stored.scalars.get(name) {
                out.insert(name.clone(), FieldValue::Scalar(v.clone()));
            }
        }
        Some(Record::new(model.to_string(), id.clone(), out))
    }

    /// Flush the batch to the listener. One notification per public
    /// call, regardless of internal fan-out.
    fn commit(&mut self) {
        let events = self.changes.flush();
        if let Some(listener) = self.listener.as_mut() {
            listener(&events);
        }
    }

    /// Discard a failed batch without notifying.
    fn abort(&mut self) {
        self.changes.flush();
    }
}

/// Per-model CRUD API borrowed from a [`ModelStore`].
pub struct ModelHandle<'a> {
    store: &'a mut ModelStore,
    model: String,
}

impl std::fmt::Debug for ModelHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ModelHandle<'_> {
    /// The model this handle operates on.
    pub fn name(&self) -> &str {
        &self.model
    }

    /// Create one record and return its read view.
    pub fn create(&mut self, values: Values) -> StoreResult<Record> {
        let mut seen = Vec::new();
        self.store.validate_create(&self.model, &values, &mut seen)?;
        let id = match self.store.create_record(&self.model, &values) {
            Ok(id) => id,
            Err(e) => {
                self.store.abort();
                return Err(e);
            }
        };
        self.store.commit();
        self.store
            .materialize(&self.model, &id)
            .ok_or_else(|| StoreError::not_found(format!("record '{}:{}'", self.model, id)))
    }

    /// Create several records inside one batch (one notification).
    pub fn create_many(&mut self, list: Vec<Values>) -> StoreResult<Vec<Record>> {
        let mut seen = Vec::new();
        for values in &list {
            self.store.validate_create(&self.model, values, &mut seen)?;
        }
        let mut ids = Vec::with_capacity(list.len());
        for values in &list {
            match self.store.create_record(&self.model, values) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    self.store.abort();
                    return Err(e);
                }
            }
        }
        self.store.commit();
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self
                .store
                .materialize(&self.model, &id)
                .ok_or_else(|| StoreError::not_found(format!("record '{}:{}'", self.model, id)))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Apply a field-sparse update and return the refreshed read view.
    /// Fields absent from `values` are left untouched.
    pub fn update(&mut self, id: &RecordId, values: Values) -> StoreResult<Record> {
        if !self.store.records.contains(&self.model, id) {
            return Err(StoreError::not_found(format!(
                "record '{}:{}'",
                self.model, id
            )));
        }
        let mut seen = Vec::new();
        let fields = self.store.model_fields(&self.model)?;
        for (name, input) in values.iter() {
            if let Some(field) = fields.iter().find(|f| f.name == name) {
                self.store.validate_input(&self.model, field, input, &mut seen)?;
            }
        }
        match self.store.update_record(&self.model, id, &values) {
            Ok(()) => {
                self.store.commit();
                self.store
                    .materialize(&self.model, id)
                    .ok_or_else(|| StoreError::not_found(format!("record '{}:{}'", self.model, id)))
            }
            Err(e) => {
                self.store.abort();
                Err(e)
            }
        }
    }

    /// Delete one record, cascading disconnection of every relation it
    /// participates in.
    pub fn delete(&mut self, id: &RecordId) -> StoreResult<()> {
        if !self.store.records.contains(&self.model, id) {
            return Err(StoreError::not_found(format!(
                "record '{}:{}'",
                self.model, id
            )));
        }
        self.store.delete_record(&self.model, id)?;
        self.store.commit();
        Ok(())
    }

    /// Delete several records inside one batch (one notification).
    pub fn delete_many(&mut self, ids: &[RecordId]) -> StoreResult<()> {
        for id in ids {
            if !self.store.records.contains(&self.model, id) {
                return Err(StoreError::not_found(format!(
                    "record '{}:{}'",
                    self.model, id
                )));
            }
        }
        for id in ids {
            if let Err(e) = self.store.delete_record(&self.model, id) {
                self.store.abort();
                return Err(e);
            }
        }
        self.store.commit();
        Ok(())
    }

    /// Read one record.
    pub fn read(&self, id: &RecordId) -> Option<Record> {
        self.store.materialize(&self.model, id)
    }

    /// Read every record of the model, in creation order.
    pub fn read_all(&self) -> Vec<Record> {
        let ids: Vec<RecordId> = self
            .store
            .records
            .all(&self.model)
            .map(|r| r.id.clone())
            .collect();
        ids.iter()
            .filter_map(|id| self.store.materialize(&self.model, id))
            .collect()
    }

    /// Read the records named by `ids`, position-aligned.
    pub fn read_many(&self, ids: &[RecordId]) -> Vec<Option<Record>> {
        ids.iter()
            .map(|id| self.store.materialize(&self.model, id))
            .collect()
    }

    /// First record matching the predicate. Linear scan.
    pub fn find(&self, mut predicate: impl FnMut(&Record) -> bool) -> Option<Record> {
        let ids: Vec<RecordId> = self
            .store
            .records
            .all(&self.model)
            .map(|r| r.id.clone())
            .collect();
        ids.iter()
            .filter_map(|id| self.store.materialize(&self.model, id))
            .find(|r| predicate(r))
    }

    /// Every record matching the predicate. Linear scan.
    pub fn find_all(&self, mut predicate: impl FnMut(&Record) -> bool) -> Vec<Record> {
        let ids: Vec<RecordId> = self
            .store
            .records
            .all(&self.model)
            .map(|r| r.id.clone())
            .collect();
        ids.iter()
            .filter_map(|id| self.store.materialize(&self.model, id))
            .filter(|r| predicate(r))
            .collect()
    }
}
