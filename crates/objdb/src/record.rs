//! Stored object types and the descriptors that bind them to a namespace.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DbResult;

/// An object that can be kept in an [`ObjectDb`](crate::ObjectDb).
///
/// The store only interprets `id` and `name`; every other serialized field
/// is carried through opaquely. `set_from_json` must accept the shape that
/// `Serialize` produces.
pub trait Record: Serialize {
    /// Namespace of this type inside the backing store. Must be stable for
    /// the lifetime of the stored data.
    fn label(&self) -> &str;

    /// The store-assigned id, or `None` before the first save.
    fn id(&self) -> Option<u64>;

    fn set_id(&mut self, id: u64);

    /// Uniqueness key among live objects of the same type.
    fn name(&self) -> &str;

    /// Populate `self` from a serialized object.
    fn set_from_json(&mut self, value: Value) -> DbResult<()>;
}

/// Replace `target` with the deserialized `value`.
///
/// Convenience for [`Record::set_from_json`] on plain serde types.
pub fn replace_from_json<T: DeserializeOwned>(target: &mut T, value: Value) -> DbResult<()> {
    *target = serde_json::from_value(value)?;
    Ok(())
}

/// Binds a record type to its label and to a factory for empty instances.
///
/// The label is taken from a freshly built instance when the descriptor is
/// created and does not change afterwards.
pub struct TypeDescriptor<R> {
    label: String,
    factory: Arc<dyn Fn() -> R + Send + Sync>,
}

impl<R: Record + 'static> TypeDescriptor<R> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        let label = factory().label().to_string();
        Self {
            label,
            factory: Arc::new(factory),
        }
    }

    /// Descriptor using `R::default()` as the factory.
    pub fn of() -> Self
    where
        R: Default,
    {
        Self::new(R::default)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// A new empty instance.
    pub fn create(&self) -> R {
        (self.factory)()
    }

    /// A new instance populated from a serialized object.
    pub fn build(&self, value: Value) -> DbResult<R> {
        let mut obj = self.create();
        obj.set_from_json(value)?;
        Ok(obj)
    }
}

impl<R> Clone for TypeDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<R> fmt::Debug for TypeDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Schemaless record with a runtime label.
///
/// Anything besides `id` and `name` lands in `fields`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(skip)]
    label: String,
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Descriptor producing empty documents under `label`.
    pub fn descriptor(label: impl Into<String>) -> TypeDescriptor<Document> {
        let label = label.into();
        TypeDescriptor::new(move || Document::new(label.clone()))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl Record for Document {
    fn label(&self) -> &str {
        &self.label
    }

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_from_json(&mut self, value: Value) -> DbResult<()> {
        let label = std::mem::take(&mut self.label);
        let result = replace_from_json(self, value);
        self.label = label;
        result
    }
}
