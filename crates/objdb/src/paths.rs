//! Derived index paths for one label.
//!
//! ```text
//! /<label>/ids/<id>      -> serialized object
//! /<label>/names/<name>  -> id
//! /<label>/nextid        -> next unassigned id
//! /<label>/unique        -> declared unique attribute names
//! ```

use objdb_store::DataPath;

use crate::error::DbResult;

/// The four paths an [`ObjectDb`](crate::ObjectDb) maintains under its label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexPaths {
    label: String,
    pub by_id: DataPath,
    pub by_name: DataPath,
    pub next_id: DataPath,
    pub unique: DataPath,
}

impl IndexPaths {
    /// Compute the paths for `label`. The label must be a single path segment.
    pub fn for_label(label: &str) -> DbResult<Self> {
        let base = DataPath::root().join(label)?;
        Ok(Self {
            label: label.to_string(),
            by_id: base.join("ids")?,
            by_name: base.join("names")?,
            next_id: base.join("nextid")?,
            unique: base.join("unique")?,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn id_entry(&self, id: u64) -> DbResult<DataPath> {
        Ok(self.by_id.join(id.to_string())?)
    }

    pub fn name_entry(&self, name: &str) -> DbResult<DataPath> {
        Ok(self.by_name.join(name)?)
    }
}
