//! The indexed object store.
//!
//! [`Database`] owns the backing store and the per-label lock table and
//! hands out [`ObjectDb`] handles, one per record type. An `ObjectDb` keeps
//! three structures under its label in sync:
//!
//! - `ids`: id -> serialized object
//! - `names`: name -> id, enforcing unique names among live objects
//! - `nextid`: the id watermark, strictly above every id ever assigned
//!
//! `save` and `delete` run their read-check-write sequence under the label's
//! mutex. Reads take no label lock.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use objdb_store::{DataPath, FileJsonStore, JsonStore, StoreResult, WriteMode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DbConfig;
use crate::error::{DbError, DbResult};
use crate::locks::LabelLocks;
use crate::outcome::{OpResult, Rejection};
use crate::paths::IndexPaths;
use crate::record::{Record, TypeDescriptor};

/// Shared backing store plus the lock table all handles coordinate on.
pub struct Database<S> {
    store: Arc<S>,
    locks: Arc<LabelLocks>,
    config: DbConfig,
}

impl Database<FileJsonStore> {
    /// Open the JSON file described by `config.store`.
    pub fn open(config: DbConfig) -> DbResult<Self> {
        let store = FileJsonStore::open(config.store.clone())?;
        Ok(Self::new(store, config))
    }
}

impl<S: JsonStore> Database<S> {
    pub fn new(store: S, config: DbConfig) -> Self {
        Self::from_shared(Arc::new(store), Arc::new(LabelLocks::new()), config)
    }

    /// Build over a store that is already shared.
    ///
    /// Every `Database` over the same store must be given the same `locks`,
    /// otherwise their saves are not serialized against each other. Cloning
    /// an existing `Database` shares both.
    pub fn from_shared(store: Arc<S>, locks: Arc<LabelLocks>, config: DbConfig) -> Self {
        Self {
            store,
            locks,
            config,
        }
    }

    /// Handle for `R`, labelled by `R::default()`.
    pub fn objects<R>(&self) -> DbResult<ObjectDb<R, S>>
    where
        R: Record + Default + 'static,
    {
        self.with_descriptor(TypeDescriptor::of())
    }

    /// Handle bound to an explicit descriptor.
    pub fn with_descriptor<R>(&self, descriptor: TypeDescriptor<R>) -> DbResult<ObjectDb<R, S>>
    where
        R: Record + 'static,
    {
        ObjectDb::bind(
            Arc::clone(&self.store),
            Arc::clone(&self.locks),
            descriptor,
            self.config.debug,
        )
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn locks(&self) -> &Arc<LabelLocks> {
        &self.locks
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn persist(&self) -> DbResult<()> {
        Ok(self.store.persist()?)
    }

    pub fn reload(&self) -> DbResult<()> {
        Ok(self.store.reload()?)
    }
}

impl<S> Clone for Database<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
            config: self.config.clone(),
        }
    }
}

impl<S> fmt::Debug for Database<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("labels_locked", &self.locks.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Object-level CRUD for one record type.
pub struct ObjectDb<R, S> {
    store: Arc<S>,
    locks: Arc<LabelLocks>,
    descriptor: TypeDescriptor<R>,
    paths: IndexPaths,
    label_lock: Arc<Mutex<()>>,
    debug: bool,
}

impl<R, S> ObjectDb<R, S>
where
    R: Record + 'static,
    S: JsonStore,
{
    fn bind(
        store: Arc<S>,
        locks: Arc<LabelLocks>,
        descriptor: TypeDescriptor<R>,
        debug: bool,
    ) -> DbResult<Self> {
        let paths = IndexPaths::for_label(descriptor.label())?;
        let label_lock = locks.handle(descriptor.label())?;
        if debug {
            debug!(label = %paths.label(), by_id = %paths.by_id, "configured object store");
        }
        Ok(Self {
            store,
            locks,
            descriptor,
            paths,
            label_lock,
            debug,
        })
    }

    /// Rebind to another record type (or another label of the same type).
    ///
    /// Every later operation addresses the new label's namespace; objects
    /// stored under the old label are left where they are.
    pub fn configure<T>(self, descriptor: TypeDescriptor<T>) -> DbResult<ObjectDb<T, S>>
    where
        T: Record + 'static,
    {
        ObjectDb::bind(self.store, self.locks, descriptor, self.debug)
    }

    pub fn label(&self) -> &str {
        self.paths.label()
    }

    pub fn paths(&self) -> &IndexPaths {
        &self.paths
    }

    pub fn descriptor(&self) -> &TypeDescriptor<R> {
        &self.descriptor
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn trace(&self, args: fmt::Arguments<'_>) {
        if self.debug {
            debug!(label = %self.paths.label(), "{args}");
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, ()>> {
        self.label_lock.lock().map_err(|_| DbError::LockPoisoned {
            label: self.paths.label().to_string(),
        })
    }

    fn read_u64(&self, path: &DataPath) -> DbResult<Option<u64>> {
        match self.store.try_get(path)? {
            None => Ok(None),
            Some(value) => value.as_u64().map(Some).ok_or_else(|| DbError::CorruptIndex {
                path: path.to_string(),
                reason: format!("expected a non-negative integer, found {value}"),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Unique constraint declaration
    // -----------------------------------------------------------------------

    /// Declare the attributes that jointly form a unique key, replacing any
    /// earlier declaration. Existing data is not re-validated.
    pub fn set_unique_constraint<A: AsRef<str>>(&self, attributes: &[A]) -> DbResult<()> {
        let attributes: Vec<Value> = attributes
            .iter()
            .map(|a| Value::String(a.as_ref().to_string()))
            .collect();
        self.trace(format_args!(
            "set_unique_constraint({attributes:?}) -> {}",
            self.paths.unique
        ));
        self.store
            .set(&self.paths.unique, Value::Array(attributes), WriteMode::Overwrite)?;
        Ok(())
    }

    /// The declared unique attributes, or `None` if nothing was declared.
    pub fn unique_constraint(&self) -> DbResult<Option<Vec<String>>> {
        let Some(value) = self.store.try_get(&self.paths.unique)? else {
            return Ok(None);
        };
        let attributes: Option<Vec<String>> = value.as_array().and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect()
        });
        attributes.map(Some).ok_or_else(|| DbError::CorruptIndex {
            path: self.paths.unique.to_string(),
            reason: format!("expected a list of attribute names, found {value}"),
        })
    }

    /// Find a live object other than `obj` matching it on every declared
    /// unique attribute. Missing attributes compare as `null`.
    fn unique_conflict(&self, obj: &R) -> DbResult<Option<Rejection>> {
        let attributes = match self.unique_constraint()? {
            Some(attributes) if !attributes.is_empty() => attributes,
            _ => return Ok(None),
        };
        let Some(Value::Object(entries)) = self.store.try_get(&self.paths.by_id)? else {
            return Ok(None);
        };

        let candidate = serde_json::to_value(obj)?;
        let key: Vec<(String, Value)> = attributes
            .into_iter()
            .map(|attr| {
                let value = candidate.get(&attr).cloned().unwrap_or(Value::Null);
                (attr, value)
            })
            .collect();

        let own_id = obj.id();
        for (stored_id, stored) in &entries {
            if own_id.is_some() && stored_id.parse::<u64>().ok() == own_id {
                continue;
            }
            let matches = key
                .iter()
                .all(|(attr, value)| stored.get(attr).unwrap_or(&Value::Null) == value);
            if matches {
                return Ok(Some(Rejection::UniqueViolation { key }));
            }
        }
        Ok(None)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create or update `obj`.
    ///
    /// A missing id is assigned from the watermark and written back into
    /// `obj`. A supplied id at or above the watermark pushes the watermark
    /// past it. Renaming an existing object drops its old name entry.
    pub fn save(&self, obj: &mut R) -> DbResult<OpResult> {
        let _guard = self.lock()?;
        let name = obj.name().to_string();
        let name_path = self.paths.name_entry(&name)?;

        if let Some(owner) = self.read_u64(&name_path)? {
            if obj.id() != Some(owner) {
                self.trace(format_args!("save(obj name={name}) NAME ALREADY EXISTS"));
                return Ok(OpResult::rejected(
                    Rejection::DuplicateName { name },
                    obj.id(),
                ));
            }
        }
        if let Some(rejection) = self.unique_conflict(obj)? {
            self.trace(format_args!("save(obj name={name}) UNIQUE KEY ALREADY EXISTS"));
            return Ok(OpResult::rejected(rejection, obj.id()));
        }

        let exhausted = || DbError::IdSpaceExhausted {
            label: self.paths.label().to_string(),
        };
        let (id, watermark) = match (self.read_u64(&self.paths.next_id)?, obj.id()) {
            (None, requested) => {
                let id = requested.unwrap_or(1);
                self.trace(format_args!("save(obj name={name}) INIT MAXID id={id}"));
                (id, Some(id.checked_add(1).ok_or_else(exhausted)?))
            }
            (Some(next), None) => {
                self.trace(format_args!("save(obj name={name}) NEW OBJECT id={next}"));
                (next, Some(next.checked_add(1).ok_or_else(exhausted)?))
            }
            (Some(next), Some(id)) if id >= next => {
                self.trace(format_args!(
                    "save(obj name={name}) NEW OBJECT WITH id={id} >= MAXID"
                ));
                (id, Some(id.checked_add(1).ok_or_else(exhausted)?))
            }
            (Some(_), Some(id)) => (id, None),
        };
        obj.set_id(id);

        let id_path = self.paths.id_entry(id)?;
        let previous = match self.store.try_get(&id_path)? {
            Some(value) => Some(self.descriptor.build(value)?),
            None => None,
        };

        let mut writes = vec![(id_path, Some(serde_json::to_value(&*obj)?))];
        match previous {
            Some(previous) => {
                self.trace(format_args!("save(obj name={name}) UPDATE id={id}"));
                if previous.name() != name {
                    if let Some(stale) = self.owned_name_entry(previous.name(), id)? {
                        writes.push((stale, None));
                    }
                }
            }
            None => self.trace(format_args!("save(obj name={name}) CREATE id={id}")),
        }
        writes.push((name_path, Some(Value::from(id))));
        if let Some(next) = watermark {
            writes.push((self.paths.next_id.clone(), Some(Value::from(next))));
        }

        self.apply(writes)?;
        if let Some(next) = watermark {
            self.trace(format_args!("save() UPDATE MAXID = {next}"));
        }
        Ok(OpResult::success(id))
    }

    /// Remove the live object `id` and its name entry.
    pub fn delete(&self, id: u64) -> DbResult<OpResult> {
        let _guard = self.lock()?;
        let Some(obj) = self.get_for_id(id)? else {
            self.trace(format_args!("delete({id}) NOT FOUND"));
            return Ok(OpResult::rejected(Rejection::NotFound { id }, Some(id)));
        };

        let mut writes = Vec::with_capacity(2);
        if let Some(path) = self.owned_name_entry(obj.name(), id)? {
            writes.push((path, None));
        }
        writes.push((self.paths.id_entry(id)?, None));

        self.apply(writes)?;
        self.trace(format_args!("delete({id}) OK"));
        Ok(OpResult::success(id))
    }

    /// Path of `names/<name>` if it still points at `id`.
    fn owned_name_entry(&self, name: &str, id: u64) -> DbResult<Option<DataPath>> {
        let path = self.paths.name_entry(name)?;
        Ok((self.read_u64(&path)? == Some(id)).then_some(path))
    }

    /// Write each `(path, value)` in order; `None` removes the node.
    ///
    /// If a step fails, the paths touched so far are restored to what they
    /// held before the first step and the failure is returned.
    fn apply(&self, writes: Vec<(DataPath, Option<Value>)>) -> DbResult<()> {
        let priors = writes
            .iter()
            .map(|(path, _)| self.store.try_get(path))
            .collect::<StoreResult<Vec<_>>>()?;

        let mut touched = Vec::with_capacity(writes.len());
        for ((path, value), prior) in writes.into_iter().zip(priors) {
            let result = match value {
                Some(value) => self.store.set(&path, value, WriteMode::Overwrite),
                None => self.store.remove(&path),
            };
            touched.push((path, prior));
            if let Err(err) = result {
                self.rollback(touched);
                return Err(err.into());
            }
        }
        Ok(())
    }

    fn rollback(&self, touched: Vec<(DataPath, Option<Value>)>) {
        for (path, prior) in touched.into_iter().rev() {
            let result = match prior {
                Some(value) => self.store.set(&path, value, WriteMode::Overwrite),
                None => match self.store.remove(&path) {
                    Err(e) if e.is_not_found() => Ok(()),
                    other => other,
                },
            };
            if let Err(err) = result {
                warn!(label = %self.paths.label(), path = %path, error = %err, "rollback failed");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Every live object, in backing-store order.
    ///
    /// `None` means nothing of this type was ever saved; once objects have
    /// been saved and all deleted the result is an empty vector.
    pub fn get_all(&self) -> DbResult<Option<Vec<R>>> {
        let Some(data) = self.store.try_get(&self.paths.by_id)? else {
            self.trace(format_args!("get_all() NOT FOUND"));
            return Ok(None);
        };
        let Value::Object(entries) = data else {
            return Err(DbError::CorruptIndex {
                path: self.paths.by_id.to_string(),
                reason: "expected an object keyed by id".into(),
            });
        };

        let objects = entries
            .into_iter()
            .map(|(_, value)| self.descriptor.build(value))
            .collect::<DbResult<Vec<R>>>()?;
        self.trace(format_args!("get_all() OK {} FOUND", objects.len()));
        Ok(Some(objects))
    }

    pub fn get_for_id(&self, id: u64) -> DbResult<Option<R>> {
        let found = match self.store.try_get(&self.paths.id_entry(id)?)? {
            Some(value) => Some(self.descriptor.build(value)?),
            None => None,
        };
        self.trace(format_args!(
            "get_for_id({id}) {}",
            if found.is_some() { "OK" } else { "NOT FOUND" }
        ));
        Ok(found)
    }

    /// Id owning `name`. Names that can never be stored (empty, or
    /// containing `/`) are simply absent.
    pub fn get_id_for_name(&self, name: &str) -> DbResult<Option<u64>> {
        let Ok(path) = self.paths.name_entry(name) else {
            return Ok(None);
        };
        let found = self.read_u64(&path)?;
        self.trace(format_args!(
            "get_id_for_name({name}) {}",
            if found.is_some() { "OK" } else { "NOT FOUND" }
        ));
        Ok(found)
    }

    pub fn get_for_name(&self, name: &str) -> DbResult<Option<R>> {
        match self.get_id_for_name(name)? {
            Some(id) => self.get_for_id(id),
            None => Ok(None),
        }
    }

    /// Current id watermark, or `None` before the first save.
    pub fn next_id(&self) -> DbResult<Option<u64>> {
        self.read_u64(&self.paths.next_id)
    }
}

impl<R, S> Clone for ObjectDb<R, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
            descriptor: self.descriptor.clone(),
            paths: self.paths.clone(),
            label_lock: Arc::clone(&self.label_lock),
            debug: self.debug,
        }
    }
}

impl<R, S> fmt::Debug for ObjectDb<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDb")
            .field("label", &self.paths.label())
            .field("debug", &self.debug)
            .finish()
    }
}


#[cfg(test)]
mod properties {
    use super::*;
    use crate::record::Document;
    use objdb_store::InMemoryJsonStore;
    use proptest::prelude::*;
    use std::collections::HashSet;

    const NAMES: &[&str] = &["ada", "bob", "cy", "dee"];

    #[derive(Clone, Debug)]
    enum Op {
        Create(usize),
        Update(u64, usize),
        Delete(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..NAMES.len()).prop_map(Op::Create),
            (1u64..12, 0..NAMES.len()).prop_map(|(id, n)| Op::Update(id, n)),
            (1u64..12).prop_map(Op::Delete),
        ]
    }

    fn names_index(store: &InMemoryJsonStore) -> serde_json::Map<String, Value> {
        store
            .try_get(&"/doc/names".into())
            .unwrap()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default()
    }

    proptest! {
        #[test]
        fn names_stay_unique_and_watermark_stays_ahead(ops in prop::collection::vec(op(), 1..40)) {
            let db = Database::new(InMemoryJsonStore::new(), DbConfig::default());
            let docs = db.with_descriptor(Document::descriptor("doc")).unwrap();
            let mut max_assigned = 0u64;
            let mut last_watermark = 0u64;

            for op in ops {
                let result = match op {
                    Op::Create(n) => docs.save(&mut Document::new("doc").with_name(NAMES[n])).unwrap(),
                    Op::Update(id, n) => docs
                        .save(&mut Document::new("doc").with_name(NAMES[n]).with_id(id))
                        .unwrap(),
                    Op::Delete(id) => docs.delete(id).unwrap(),
                };
                if result.is_success() {
                    max_assigned = max_assigned.max(result.id.unwrap());
                }

                let live = docs.get_all().unwrap().unwrap_or_default();
                let names: HashSet<&str> = live.iter().map(|d| d.name.as_str()).collect();
                prop_assert_eq!(names.len(), live.len());

                let index = names_index(db.store());
                prop_assert_eq!(index.len(), live.len());
                for doc in &live {
                    prop_assert_eq!(docs.get_id_for_name(&doc.name).unwrap(), doc.id);
                }

                let watermark = docs.next_id().unwrap().unwrap_or(0);
                prop_assert!(watermark >= last_watermark);
                if max_assigned > 0 {
                    prop_assert!(watermark > max_assigned);
                }
                last_watermark = watermark;
            }
        }
    }
}
