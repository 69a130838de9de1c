//! Record declarations and column discovery
//!
//! A record type lists its fields once, in declaration order, through
//! [`Record::FIELDS`]. Discovery walks that list to produce the column set for a
//! statement, splicing nested records in place.
//!
//! ```
//! use rust_record_table::core::record::{discover_columns, Field, Record};
//! use rust_record_table::DatabaseValue;
//!
//! struct Address {
//!     city: String,
//! }
//!
//! impl Record for Address {
//!     const FIELDS: &'static [Field] = &[Field::qualified("city", "city", "addr")];
//!
//!     fn value(&self, column: &str) -> Option<DatabaseValue> {
//!         match column {
//!             "city" => Some(self.city.clone().into()),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! struct User {
//!     id: i64,
//!     name: String,
//!     meta: Address,
//! }
//!
//! impl Record for User {
//!     const FIELDS: &'static [Field] = &[
//!         Field::column("id", "id"),
//!         Field::column("name", "name"),
//!         Field::nested::<Address>("meta"),
//!     ];
//!
//!     fn value(&self, column: &str) -> Option<DatabaseValue> {
//!         match column {
//!             "id" => Some(self.id.into()),
//!             "name" => Some(self.name.clone().into()),
//!             other => self.meta.value(other),
//!         }
//!     }
//! }
//!
//! assert_eq!(discover_columns::<User>(false), ["id", "name", "addr.city"]);
//! assert_eq!(discover_columns::<User>(true), ["name", "city"]);
//! ```

use super::error::{DatabaseError, Result};
use super::scalar::Decode;
use super::value::{DatabaseRow, DatabaseValue};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Conventional primary-key column
pub const KEY_COLUMN: &str = "id";

/// One declared field of a record type
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// Source field name, used for descriptor paths
    pub name: &'static str,
    /// Column identifier; `None` means the field is not persisted directly
    pub column: Option<&'static str>,
    /// Table qualifier applied in read contexts
    pub table: Option<&'static str>,
    /// Fields of an embedded record, spliced in when `column` is `None`
    pub nested: Option<&'static [Field]>,
}

impl Field {
    /// A field persisted as `column`
    pub const fn column(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column: Some(column),
            table: None,
            nested: None,
        }
    }

    /// A field persisted as `column`, read as `table.column`
    pub const fn qualified(name: &'static str, column: &'static str, table: &'static str) -> Self {
        Self {
            name,
            column: Some(column),
            table: Some(table),
            nested: None,
        }
    }

    /// An embedded record whose columns are flattened into the parent
    pub const fn nested<T: Record>(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            table: None,
            nested: Some(T::FIELDS),
        }
    }

    /// A field that is never persisted
    pub const fn skipped(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            table: None,
            nested: None,
        }
    }
}

/// A type whose fields map to the columns of a table
///
/// `value` serves named placeholders (`:column`) when the record is the source of
/// an insert or update. Embedded records should delegate unknown columns to the
/// nested value.
pub trait Record: Send + Sync {
    /// Declared fields, in declaration order
    const FIELDS: &'static [Field];

    /// Value bound to the `:column` placeholder
    fn value(&self, column: &str) -> Option<DatabaseValue>;
}

impl<T: Record> Record for Vec<T> {
    const FIELDS: &'static [Field] = T::FIELDS;

    fn value(&self, _column: &str) -> Option<DatabaseValue> {
        None
    }
}

impl<T: Record> Record for Option<T> {
    const FIELDS: &'static [Field] = T::FIELDS;

    fn value(&self, column: &str) -> Option<DatabaseValue> {
        self.as_ref().and_then(|inner| inner.value(column))
    }
}

impl<T: Record> Record for Box<T> {
    const FIELDS: &'static [Field] = T::FIELDS;

    fn value(&self, column: &str) -> Option<DatabaseValue> {
        (**self).value(column)
    }
}

impl<T: Record> Record for Arc<T> {
    const FIELDS: &'static [Field] = T::FIELDS;

    fn value(&self, column: &str) -> Option<DatabaseValue> {
        (**self).value(column)
    }
}

/// Walk `fields` and emit the column identifiers in declaration order
///
/// With `exclude_key` the key column is skipped and table qualifiers are ignored,
/// which is the shape insert and update statements need.
pub fn discover_fields(fields: &[Field], exclude_key: bool) -> Vec<String> {
    let mut columns = Vec::with_capacity(fields.len());
    collect(fields, exclude_key, &mut columns);
    columns
}

fn collect(fields: &[Field], exclude_key: bool, out: &mut Vec<String>) {
    for field in fields {
        match (field.column, field.nested) {
            (Some(column), _) => {
                if exclude_key && column == KEY_COLUMN {
                    continue;
                }
                match field.table {
                    Some(table) if !exclude_key => out.push(format!("{}.{}", table, column)),
                    _ => out.push(column.to_string()),
                }
            }
            (None, Some(nested)) => collect(nested, exclude_key, out),
            (None, None) => {}
        }
    }
}

/// Discover the columns of `T`
pub fn discover_columns<T: Record>(exclude_key: bool) -> Vec<String> {
    discover_fields(T::FIELDS, exclude_key)
}

type ColumnCache = RwLock<HashMap<(TypeId, bool), Arc<[String]>>>;

fn column_cache() -> &'static ColumnCache {
    static CACHE: OnceLock<ColumnCache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Memoized [`discover_columns`], keyed by type and key exclusion
pub fn cached_columns<T: Record + 'static>(exclude_key: bool) -> Arc<[String]> {
    let key = (TypeId::of::<T>(), exclude_key);
    if let Some(columns) = column_cache().read().get(&key) {
        return Arc::clone(columns);
    }

    let columns: Arc<[String]> = discover_columns::<T>(exclude_key).into();
    column_cache()
        .write()
        .entry(key)
        .or_insert(columns)
        .clone()
}

/// One flattened entry of a [`RecordDescriptor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEntry {
    /// Column identifier as written in a read statement
    pub column: String,
    /// Dotted path of source field names, e.g. `meta.city`
    pub path: String,
    /// Whether the column came from an embedded record
    pub nested: bool,
}

/// Flattened view of a record type's persisted columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDescriptor {
    entries: Vec<ColumnEntry>,
}

impl RecordDescriptor {
    /// Build the descriptor for `T`
    pub fn of<T: Record>() -> Self {
        let mut entries = Vec::new();
        describe(T::FIELDS, None, &mut entries);
        Self { entries }
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[ColumnEntry] {
        &self.entries
    }

    /// Column identifiers in declaration order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.column.as_str())
    }

    /// Check that no column identifier appears twice
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.column.as_str()) {
                return Err(DatabaseError::other(format!(
                    "duplicate column '{}' declared at {}",
                    entry.column, entry.path
                )));
            }
        }
        Ok(())
    }
}

fn describe(fields: &[Field], parent: Option<&str>, out: &mut Vec<ColumnEntry>) {
    for field in fields {
        let path = match parent {
            Some(parent) => format!("{}.{}", parent, field.name),
            None => field.name.to_string(),
        };
        match (field.column, field.nested) {
            (Some(column), _) => out.push(ColumnEntry {
                column: match field.table {
                    Some(table) => format!("{}.{}", table, column),
                    None => column.to_string(),
                },
                path,
                nested: parent.is_some(),
            }),
            (None, Some(nested)) => describe(nested, Some(&path), out),
            (None, None) => {}
        }
    }
}

/// Decode a result row into a record
pub trait FromRow: Sized {
    /// Build `Self` from one row
    fn from_row(row: &DatabaseRow) -> Result<Self>;
}

/// Decode the value of `column` from `row`
///
/// Qualified identifiers (`addr.city`) also match the bare column name, since
/// most drivers report result columns unqualified. An absent column decodes like
/// NULL; types that reject NULL report it as [`DatabaseError::ColumnNotFound`].
pub fn decode_column<T: Decode>(row: &DatabaseRow, column: &str) -> Result<T> {
    let value = row.get(column).or_else(|| {
        column
            .rsplit_once('.')
            .and_then(|(_, bare)| row.get(bare))
    });

    match value {
        Some(value) => T::decode(value),
        None => T::decode(&DatabaseValue::Null)
            .map_err(|_| DatabaseError::ColumnNotFound(column.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Address;

    impl Record for Address {
        const FIELDS: &'static [Field] = &[
            Field::qualified("city", "city", "addr"),
            Field::column("zip", "zip"),
        ];

        fn value(&self, _column: &str) -> Option<DatabaseValue> {
            None
        }
    }

    struct User;

    impl Record for User {
        const FIELDS: &'static [Field] = &[
            Field::column("id", "id"),
            Field::column("name", "name"),
            Field::nested::<Address>("meta"),
            Field::skipped("cache"),
            Field::column("email", "email"),
        ];

        fn value(&self, _column: &str) -> Option<DatabaseValue> {
            None
        }
    }

    struct Bare;

    impl Record for Bare {
        const FIELDS: &'static [Field] = &[Field::skipped("a"), Field::skipped("b")];

        fn value(&self, _column: &str) -> Option<DatabaseValue> {
            None
        }
    }

    #[test]
    fn test_discover_read_context() {
        assert_eq!(
            discover_columns::<User>(false),
            ["id", "name", "addr.city", "zip", "email"]
        );
    }

    #[test]
    fn test_discover_insert_context() {
        assert_eq!(
            discover_columns::<User>(true),
            ["name", "city", "zip", "email"]
        );
    }

    #[test]
    fn test_discover_unwraps_containers() {
        assert_eq!(
            discover_columns::<Vec<User>>(false),
            discover_columns::<User>(false)
        );
        assert_eq!(
            discover_columns::<Box<Option<User>>>(true),
            discover_columns::<User>(true)
        );
    }

    #[test]
    fn test_discover_without_annotations_is_empty() {
        assert!(discover_columns::<Bare>(false).is_empty());
        assert!(discover_columns::<Bare>(true).is_empty());
    }

    #[test]
    fn test_cached_columns_match_discovery() {
        let first = cached_columns::<User>(true);
        let second = cached_columns::<User>(true);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(&*first, discover_columns::<User>(true).as_slice());
        assert_eq!(&*cached_columns::<User>(false), ["id", "name", "addr.city", "zip", "email"]);
    }

    #[test]
    fn test_descriptor_paths() {
        let descriptor = RecordDescriptor::of::<User>();
        let entries = descriptor.entries();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[2].column, "addr.city");
        assert_eq!(entries[2].path, "meta.city");
        assert!(entries[2].nested);
        assert!(!entries[0].nested);
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn test_descriptor_rejects_duplicates() {
        struct Twice;
        impl Record for Twice {
            const FIELDS: &'static [Field] =
                &[Field::column("a", "name"), Field::column("b", "name")];
            fn value(&self, _column: &str) -> Option<DatabaseValue> {
                None
            }
        }
        assert!(RecordDescriptor::of::<Twice>().validate().is_err());
    }

    #[test]
    fn test_decode_column_falls_back_to_bare_name() {
        let mut row = DatabaseRow::new();
        row.insert("city".to_string(), DatabaseValue::String("Oslo".into()));

        let city: String = decode_column(&row, "addr.city").unwrap();
        assert_eq!(city, "Oslo");

        let missing = decode_column::<String>(&row, "name");
        assert!(matches!(missing, Err(DatabaseError::ColumnNotFound(_))));

        let lazy: crate::core::scalar::SafeString = decode_column(&row, "name").unwrap();
        assert_eq!(lazy.as_str(), "");
    }
}
