//! Schema normalization: inverse-relation inference and synthesis.
//!
//! [`Schema::process`] turns raw [`ModelDefs`] into a closed, fully
//! bidirectional schema. Every relational field ends up paired with
//! exactly one inverse field on the target model (declared explicitly,
//! or synthesized as a `dummy` field when the schema omitted it), and
//! every pair is registered as one [`Relation`] keyed by its
//! `relation_ref`.
//!
//! Schema processing is fatal on failure: a malformed schema is rejected
//! with [`StoreError::Schema`] before any record exists.

pub mod def;

pub use def::{FieldDef, FieldKind, ModelDefs};

use std::collections::HashSet;

use indexmap::IndexMap;
use relata_core::{StoreError, StoreResult};

/// One end of a relation: a named field on a named model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSlot {
    /// Model the field lives on.
    pub model: String,
    /// Field name.
    pub field: String,
}

impl FieldSlot {
    /// Create a field slot.
    pub fn new(model: impl Into<String>, field: impl Into<String>) -> Self {
        FieldSlot {
            model: model.into(),
            field: field.into(),
        }
    }

    fn is(&self, model: &str, field: &str) -> bool {
        self.model == model && self.field == field
    }
}

/// Cardinality of one relation end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Holds at most one link.
    Single,
    /// Holds an unordered set of links.
    Multi,
}

/// The unified description of two fields sharing a `relation_ref`.
///
/// Always has exactly two participating fields, one per model; a model
/// may relate to itself, in which case both fields live on the same
/// model under different names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// `many2many` on both sides; no ordering preference between ends.
    Symmetric {
        /// Grouping key.
        ref_name: String,
        /// First declared end.
        a: FieldSlot,
        /// Second declared end.
        b: FieldSlot,
    },
    /// `many2one` / `one2many` pair.
    Asymmetric {
        /// Grouping key.
        ref_name: String,
        /// The `many2one` end: holds at most one link.
        single: FieldSlot,
        /// The `one2many` end.
        many: FieldSlot,
    },
}

impl Relation {
    /// The `relation_ref` grouping key.
    pub fn ref_name(&self) -> &str {
        match self {
            Relation::Symmetric { ref_name, .. } | Relation::Asymmetric { ref_name, .. } => ref_name,
        }
    }

    /// Both ends of the relation.
    pub fn ends(&self) -> [&FieldSlot; 2] {
        match self {
            Relation::Symmetric { a, b, .. } => [a, b],
            Relation::Asymmetric { single, many, .. } => [single, many],
        }
    }

    /// The end paired with the given field.
    pub fn inverse_of(&self, model: &str, field: &str) -> &FieldSlot {
        let [a, b] = self.ends();
        if a.is(model, field) {
            b
        } else {
            a
        }
    }

    /// Cardinality of the given field's end.
    pub fn role_of(&self, model: &str, field: &str) -> Role {
        match self {
            Relation::Symmetric { .. } => Role::Multi,
            Relation::Asymmetric { single, .. } => {
                if single.is(model, field) {
                    Role::Single
                } else {
                    Role::Multi
                }
            }
        }
    }
}

/// A field after processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Field kind.
    pub kind: FieldKind,
    /// Target model for relational kinds.
    pub related_to: Option<String>,
    /// Grouping key pairing this field with its inverse.
    pub relation_ref: Option<String>,
    /// Whether the field must be present on create.
    pub required: bool,
    /// Synthesized inverse the raw schema omitted.
    pub dummy: bool,
}

impl Field {
    /// Whether this field participates in a relation.
    pub fn is_relational(&self) -> bool {
        self.kind.is_relational()
    }

    /// This field as a relation end on `model`.
    pub fn slot(&self, model: &str) -> FieldSlot {
        FieldSlot::new(model, &self.name)
    }
}

/// A processed schema: every relational field paired, every relation
/// registered.
#[derive(Debug, Clone)]
pub struct Schema {
    models: IndexMap<String, IndexMap<String, Field>>,
    relations: IndexMap<String, Relation>,
}

impl Schema {
    /// Normalize raw definitions into a closed schema.
    ///
    /// 1. Relational fields lacking a matching inverse on the target
    ///    model get a synthesized `dummy` inverse of the structurally
    ///    opposite kind, with a generated unique name.
    /// 2. Relational fields are grouped by `relation_ref`; each group
    ///    must contain exactly two fields.
    /// 3. One [`Relation`] is built per group, recording which field
    ///    occupies the single-valued role for asymmetric pairs.
    pub fn process(defs: ModelDefs) -> StoreResult<Schema> {
        let mut defs = defs;
        let declared: Vec<(String, String)> = defs
            .iter()
            .flat_map(|(model, fields)| {
                fields
                    .keys()
                    .map(move |name| (model.clone(), name.clone()))
            })
            .collect();

        // Validate relational descriptors and resolve explicit one2many
        // back-references into a shared relation_ref.
        for (model, name) in &declared {
            let field = match defs.get(model).and_then(|f| f.get(name)) {
                Some(f) => f.clone(),
                None => continue,
            };
            if !field.kind.is_relational() {
                continue;
            }
            let target = match &field.related_to {
                Some(t) => t.clone(),
                None => {
                    return Err(StoreError::schema(format!(
                        "relational field '{}.{}' is missing related_to",
                        model, name
                    )))
                }
            };
            if !defs.contains_key(&target) {
                return Err(StoreError::schema(format!(
                    "field '{}.{}' references unknown model '{}'",
                    model, name, target
                )));
            }
            if field.kind == FieldKind::One2Many {
                if let Some(inv_name) = &field.inverse {
                    let inv = defs
                        .get(&target)
                        .and_then(|f| f.get(inv_name))
                        .cloned()
                        .ok_or_else(|| {
                            StoreError::schema(format!(
                                "field '{}.{}' names inverse '{}.{}' which does not exist",
                                model, name, target, inv_name
                            ))
                        })?;
                    if inv.kind != FieldKind::Many2One
                        || inv.related_to.as_deref() != Some(model.as_str())
                    {
                        return Err(StoreError::schema(format!(
                            "inverse '{}.{}' must be a many2one back to '{}'",
                            target, inv_name, model
                        )));
                    }
                    let ref_name = match (&field.relation_ref, &inv.relation_ref) {
                        (Some(a), Some(b)) if a != b => {
                            return Err(StoreError::schema(format!(
                                "fields '{}.{}' and '{}.{}' disagree on relation_ref",
                                model, name, target, inv_name
                            )))
                        }
                        (Some(a), _) => a.clone(),
                        (None, Some(b)) => b.clone(),
                        (None, None) => format!("{}_{}__{}_{}", model, name, target, inv_name),
                    };
                    if let Some(f) = defs.get_mut(model).and_then(|f| f.get_mut(name)) {
                        f.relation_ref = Some(ref_name.clone());
                    }
                    if let Some(f) = defs.get_mut(&target).and_then(|f| f.get_mut(inv_name)) {
                        f.relation_ref = Some(ref_name);
                    }
                    continue;
                }
            }
            if field.relation_ref.is_none() {
                return Err(StoreError::schema(format!(
                    "relational field '{}.{}' is missing relation_ref",
                    model, name
                )));
            }
        }

        // Synthesize dummy inverses. Only declared fields are scanned;
        // dummies always have their inverse by construction.
        let mut dummies: HashSet<(String, String)> = HashSet::new();
        for (model, name) in &declared {
            let field = match defs.get(model).and_then(|f| f.get(name)) {
                Some(f) => f.clone(),
                None => continue,
            };
            if !field.kind.is_relational() {
                continue;
            }
            let (target, ref_name) = match (&field.related_to, &field.relation_ref) {
                (Some(t), Some(r)) => (t.clone(), r.clone()),
                _ => continue,
            };
            let target_fields = match defs.get(&target) {
                Some(f) => f,
                None => continue,
            };
            // A field never matches itself as its own inverse.
            let has_inverse = target_fields.iter().any(|(n, d)| {
                d.kind.is_relational()
                    && d.related_to.as_deref() == Some(model.as_str())
                    && d.relation_ref.as_deref() == Some(ref_name.as_str())
                    && !(&target == model && n == name)
            });
            if has_inverse {
                continue;
            }
            let dummy_kind = match field.kind.inverse() {
                Some(k) => k,
                None => continue,
            };
            let suffix = if dummy_kind == FieldKind::Many2One {
                "id"
            } else {
                "ids"
            };
            let mut dummy_name = format!("dummy_{}_{}", model, suffix);
            if target_fields.contains_key(&dummy_name) {
                dummy_name = format!("dummy_{}_{}_{}", model, ref_name, suffix);
            }
            let dummy = FieldDef {
                kind: dummy_kind,
                related_to: Some(model.clone()),
                relation_ref: Some(ref_name),
                required: false,
                inverse: None,
            };
            if let Some(fields) = defs.get_mut(&target) {
                fields.insert(dummy_name.clone(), dummy);
            }
            dummies.insert((target, dummy_name));
        }

        // Group by relation_ref and build the registry.
        let mut groups: IndexMap<String, Vec<(FieldSlot, FieldKind)>> = IndexMap::new();
        for (model, fields) in &defs {
            for (name, field) in fields {
                if !field.kind.is_relational() {
                    continue;
                }
                let ref_name = match &field.relation_ref {
                    Some(r) => r.clone(),
                    None => {
                        return Err(StoreError::schema(format!(
                            "relational field '{}.{}' is missing relation_ref",
                            model, name
                        )))
                    }
                };
                groups
                    .entry(ref_name)
                    .or_default()
                    .push((FieldSlot::new(model, name), field.kind));
            }
        }

        let mut relations = IndexMap::new();
        for (ref_name, group) in groups {
            if group.len() != 2 {
                return Err(StoreError::schema(format!(
                    "relation '{}' must have exactly one inverse (found {} fields)",
                    ref_name,
                    group.len()
                )));
            }
            let (s0, k0) = group[0].clone();
            let (s1, k1) = group[1].clone();
            let targets_match = defs
                .get(&s0.model)
                .and_then(|f| f.get(&s0.field))
                .and_then(|f| f.related_to.as_deref())
                == Some(s1.model.as_str())
                && defs
                    .get(&s1.model)
                    .and_then(|f| f.get(&s1.field))
                    .and_then(|f| f.related_to.as_deref())
                    == Some(s0.model.as_str());
            if !targets_match {
                return Err(StoreError::schema(format!(
                    "relation '{}' endpoints do not reference each other",
                    ref_name
                )));
            }
            let relation = match (k0, k1) {
                (FieldKind::Many2Many, FieldKind::Many2Many) => Relation::Symmetric {
                    ref_name: ref_name.clone(),
                    a: s0,
                    b: s1,
                },
                (FieldKind::Many2One, FieldKind::One2Many) => Relation::Asymmetric {
                    ref_name: ref_name.clone(),
                    single: s0,
                    many: s1,
                },
                (FieldKind::One2Many, FieldKind::Many2One) => Relation::Asymmetric {
                    ref_name: ref_name.clone(),
                    single: s1,
                    many: s0,
                },
                _ => {
                    return Err(StoreError::schema(format!(
                        "relation '{}' pairs incompatible kinds {:?} and {:?}",
                        ref_name, k0, k1
                    )))
                }
            };
            relations.insert(ref_name, relation);
        }

        let models = defs
            .into_iter()
            .map(|(model, fields)| {
                let processed = fields
                    .into_iter()
                    .map(|(name, def)| {
                        let field = Field {
                            name: name.clone(),
                            kind: def.kind,
                            related_to: def.related_to,
                            relation_ref: def.relation_ref,
                            required: def.required,
                            dummy: dummies.contains(&(model.clone(), name.clone())),
                        };
                        (name, field)
                    })
                    .collect();
                (model, processed)
            })
            .collect();

        Ok(Schema { models, relations })
    }

    /// Whether the schema declares `model`.
    pub fn has_model(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    /// Declared model names, in declaration order.
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(|s| s.as_str())
    }

    /// All fields of `model`, dummies included.
    pub fn fields(&self, model: &str) -> Option<&IndexMap<String, Field>> {
        self.models.get(model)
    }

    /// A single field.
    pub fn field(&self, model: &str, name: &str) -> Option<&Field> {
        self.models.get(model).and_then(|f| f.get(name))
    }

    /// The relation registered under `ref_name`.
    pub fn relation(&self, ref_name: &str) -> Option<&Relation> {
        self.relations.get(ref_name)
    }

    /// The full relation registry.
    pub fn relations(&self) -> &IndexMap<String, Relation> {
        &self.relations
    }
}
