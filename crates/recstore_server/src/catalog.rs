//! In-memory collections and their equality indexes.

use crate::error::{ServerError, ServerResult};
use parking_lot::RwLock;
use recstore_codec::{Record, Value};
use recstore_protocol::{
    validate_field_path, CompiledFilter, Filter, Namespace, PatternSyntax, RecordId, StoredRecord,
};
use std::collections::{BTreeMap, HashMap};

/// Index key; only scalar values are indexed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum IndexKey {
    Integer(i64),
    Text(String),
}

impl IndexKey {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(n) => Some(IndexKey::Integer(*n)),
            Value::Text(s) => Some(IndexKey::Text(s.clone())),
            Value::Record(_) => None,
        }
    }
}

/// Positions of records by field value.
#[derive(Debug, Default)]
struct FieldIndex {
    entries: HashMap<IndexKey, Vec<usize>>,
}

impl FieldIndex {
    fn add(&mut self, field: &str, position: usize, record: &Record) {
        if let Some(key) = record.get_path(field).and_then(IndexKey::from_value) {
            self.entries.entry(key).or_default().push(position);
        }
    }

    /// Candidate positions for `value`, or `None` if the index cannot answer.
    fn lookup(&self, value: &Value) -> Option<&[usize]> {
        let key = IndexKey::from_value(value)?;
        Some(self.entries.get(&key).map(Vec::as_slice).unwrap_or(&[]))
    }
}

/// Records of one collection, in insertion order.
#[derive(Debug, Default)]
struct CollectionData {
    records: Vec<StoredRecord>,
    indexes: BTreeMap<String, FieldIndex>,
}

impl CollectionData {
    fn ensure_index(&mut self, field: &str) -> bool {
        if self.indexes.contains_key(field) {
            return false;
        }
        let mut index = FieldIndex::default();
        for (position, stored) in self.records.iter().enumerate() {
            index.add(field, position, &stored.record);
        }
        self.indexes.insert(field.to_string(), index);
        true
    }

    fn insert(&mut self, record: Record) -> RecordId {
        let id = RecordId::generate();
        let position = self.records.len();
        for (field, index) in &mut self.indexes {
            index.add(field, position, &record);
        }
        self.records.push(StoredRecord::new(id, record));
        id
    }

    fn select(
        &self,
        filter: &Filter,
        compiled: &CompiledFilter,
    ) -> ServerResult<Vec<StoredRecord>> {
        let candidates: Box<dyn Iterator<Item = &StoredRecord> + '_> = match filter
            .equality_lookup()
            .and_then(|(field, value)| self.indexes.get(field)?.lookup(value))
        {
            Some(positions) => Box::new(positions.iter().map(|&p| &self.records[p])),
            None => Box::new(self.records.iter()),
        };

        let mut selected = Vec::new();
        for stored in candidates {
            let matched = compiled
                .matches(&stored.record)
                .map_err(|e| ServerError::Query(e.to_string()))?;
            if matched {
                selected.push(stored.clone());
            }
        }
        Ok(selected)
    }
}

/// All collections held by a server.
///
/// Databases and collections come into existence on their first write.
#[derive(Debug, Default)]
pub struct Catalog {
    collections: RwLock<BTreeMap<Namespace, CollectionData>>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an index on `field`; returns false if it already existed.
    pub fn ensure_index(&self, namespace: &Namespace, field: &str) -> ServerResult<bool> {
        validate_namespace(namespace)?;
        validate_field_path(field).map_err(|e| ServerError::Store(e.to_string()))?;
        let mut collections = self.collections.write();
        Ok(collections
            .entry(namespace.clone())
            .or_default()
            .ensure_index(field))
    }

    /// Indexed fields of a collection, sorted.
    pub fn indexes(&self, namespace: &Namespace) -> Vec<String> {
        self.collections
            .read()
            .get(namespace)
            .map(|c| c.indexes.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Appends a record.
    pub fn insert(&self, namespace: &Namespace, record: Record) -> ServerResult<RecordId> {
        validate_namespace(namespace)?;
        validate_record(&record)?;
        let mut collections = self.collections.write();
        Ok(collections
            .entry(namespace.clone())
            .or_default()
            .insert(record))
    }

    /// Number of records in a collection (0 if it does not exist).
    pub fn count(&self, namespace: &Namespace) -> u64 {
        self.collections
            .read()
            .get(namespace)
            .map(|c| c.records.len() as u64)
            .unwrap_or(0)
    }

    /// Evaluates a filter, returning matches in insertion order.
    pub fn query(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        syntax: PatternSyntax,
    ) -> ServerResult<Vec<StoredRecord>> {
        let compiled = filter
            .compile(syntax)
            .map_err(|e| ServerError::Query(e.to_string()))?;
        match self.collections.read().get(namespace) {
            Some(collection) => collection.select(filter, &compiled),
            None => Ok(Vec::new()),
        }
    }

    /// Names of the collections that exist in `database`, sorted.
    pub fn collection_names(&self, database: &str) -> Vec<String> {
        self.collections
            .read()
            .keys()
            .filter(|ns| ns.database == database)
            .map(|ns| ns.collection.clone())
            .collect()
    }
}

fn validate_namespace(namespace: &Namespace) -> ServerResult<()> {
    if namespace.database.is_empty() || namespace.collection.is_empty() {
        return Err(ServerError::Store(format!(
            "invalid namespace {:?}: names must not be empty",
            namespace.to_string()
        )));
    }
    if namespace.database.contains('.') {
        return Err(ServerError::Store(format!(
            "invalid database name {:?}: must not contain '.'",
            namespace.database
        )));
    }
    Ok(())
}

fn validate_record(record: &Record) -> ServerResult<()> {
    for (field, value) in record.iter() {
        if field.is_empty() || field.starts_with('$') {
            return Err(ServerError::Store(format!(
                "invalid field name {:?} in record",
                field
            )));
        }
        if let Value::Record(nested) = value {
            validate_record(nested)?;
        }
    }
    Ok(())
}
