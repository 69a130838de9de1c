//! SQL statement rendering
//!
//! Statements are assembled from a resolved column set and a caller-supplied
//! options fragment. Column identifiers come from record declarations or from
//! the caller's code, never from end-user input; values always travel as bound
//! parameters.
//!
//! The options fragment is appended verbatim. It is not parsed, validated or
//! escaped.

use super::error::{DatabaseError, Result};
use super::record::{cached_columns, Record};

/// Columns requested for one operation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Columns {
    /// Every declared column of the record type (`*`)
    #[default]
    All,
    /// An explicit list
    List(Vec<String>),
}

/// Whether the statement reads rows or writes them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// SELECT: key included, table qualifiers applied
    Read,
    /// INSERT / UPDATE: key excluded, bare column names
    Write,
}

impl Columns {
    /// Build a list; a single entry containing commas is split into parts
    pub fn list<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.len() == 1 {
            columns = split(&columns[0]);
        }
        Columns::List(columns)
    }

    /// Resolve to concrete identifiers for record type `T`
    ///
    /// Reads discover every column for [`Columns::All`]. Writes discover the
    /// non-key columns for [`Columns::All`] and for an empty list. An empty result
    /// is [`DatabaseError::NoColumns`].
    pub fn resolve<T: Record + 'static>(&self, access: Access) -> Result<Vec<String>> {
        let columns = match (self, access) {
            (Columns::All, Access::Read) => cached_columns::<T>(false).to_vec(),
            (Columns::All, Access::Write) => cached_columns::<T>(true).to_vec(),
            (Columns::List(list), Access::Write) if list.is_empty() => {
                cached_columns::<T>(true).to_vec()
            }
            (Columns::List(list), _) => list.clone(),
        };

        if columns.is_empty() {
            return Err(DatabaseError::NoColumns);
        }
        Ok(columns)
    }
}

fn split(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

impl From<&str> for Columns {
    fn from(columns: &str) -> Self {
        if columns.trim() == "*" {
            Columns::All
        } else {
            Columns::List(split(columns))
        }
    }
}

impl From<String> for Columns {
    fn from(columns: String) -> Self {
        Columns::from(columns.as_str())
    }
}

impl From<Vec<String>> for Columns {
    fn from(columns: Vec<String>) -> Self {
        Columns::list(columns)
    }
}

impl From<&[&str]> for Columns {
    fn from(columns: &[&str]) -> Self {
        Columns::list(columns.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Columns {
    fn from(columns: [&str; N]) -> Self {
        Columns::list(columns)
    }
}

/// `a=:a,b=:b`
pub fn assignment_pairs<S: AsRef<str>>(columns: &[S]) -> String {
    columns
        .iter()
        .map(|c| {
            let c = c.as_ref();
            format!("{}=:{}", c, c)
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// `a=VALUES(a),b=VALUES(b)`, for `ON DUPLICATE KEY UPDATE`
pub fn conflict_pairs<S: AsRef<str>>(columns: &[S]) -> String {
    columns
        .iter()
        .map(|c| {
            let c = c.as_ref();
            format!("{}=VALUES({})", c, c)
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Names of the `:name` placeholders in `sql`, in first-use order, without
/// duplicates
///
/// Quoted literals and identifiers are skipped, as are `::` casts.
pub fn placeholder_names(sql: &str) -> Vec<String> {
    let bytes = sql.as_bytes();
    let mut names: Vec<String> = Vec::new();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b':' if bytes.get(i + 1) == Some(&b':') => {
                i += 2;
                continue;
            }
            b':' => {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                if end > start {
                    let name = &sql[start..end];
                    if !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                    i = end;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }

    names
}

/// Renders statements for one table
///
/// The table name is kept padded with a space on each side so it can sit
/// directly between keywords.
///
/// # Example
///
/// ```
/// use rust_record_table::core::statement::StatementBuilder;
///
/// let users = StatementBuilder::new("users");
/// let cols = ["name".to_string(), "email".to_string()];
/// assert_eq!(
///     users.insert(&cols, ""),
///     "INSERT INTO users SET name=:name,email=:email"
/// );
/// assert_eq!(users.delete("WHERE id=7"), "DELETE FROM users WHERE id=7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementBuilder {
    table: String,
}

impl StatementBuilder {
    /// Create a builder for `table`
    pub fn new(table: &str) -> Self {
        Self {
            table: format!(" {} ", table.trim()),
        }
    }

    /// The table name as it is embedded in statements, padding included
    pub fn padded_table(&self) -> &str {
        &self.table
    }

    /// The bare table name
    pub fn table(&self) -> &str {
        self.table.trim()
    }

    /// Options fragment selecting one row by key
    pub fn by_id(id: i64) -> String {
        format!("WHERE id={}", id)
    }

    /// `SELECT <cols> FROM <table> <options>`
    pub fn select<S: AsRef<str>>(&self, columns: &[S], options: &str) -> String {
        format!(
            "SELECT {} FROM{}{}",
            join(columns, ","),
            self.table,
            options.trim_start()
        )
        .trim_end()
        .to_string()
    }

    /// `INSERT INTO <table> SET <col=:col,...> <options>`
    pub fn insert<S: AsRef<str>>(&self, columns: &[S], options: &str) -> String {
        format!(
            "INSERT INTO{}SET {} {}",
            self.table,
            assignment_pairs(columns),
            options.trim_start()
        )
        .trim_end()
        .to_string()
    }

    /// `INSERT INTO <table> (<cols>) VALUES (<:cols>) RETURNING id`
    pub fn insert_returning<S: AsRef<str>>(&self, columns: &[S]) -> String {
        format!(
            "INSERT INTO{}({}) VALUES (:{}) RETURNING id",
            self.table,
            join(columns, ","),
            join(columns, ",:")
        )
    }

    /// `INSERT INTO <table> SET <pairs> ON DUPLICATE KEY UPDATE <conflicts> <options>`
    pub fn upsert<S: AsRef<str>>(&self, columns: &[S], options: &str) -> String {
        format!(
            "INSERT INTO{}SET {} ON DUPLICATE KEY UPDATE {} {}",
            self.table,
            assignment_pairs(columns),
            conflict_pairs(columns),
            options.trim_start()
        )
        .trim_end()
        .to_string()
    }

    /// `UPDATE <table> SET <col=:col,...> <options>`
    pub fn update<S: AsRef<str>>(&self, columns: &[S], options: &str) -> String {
        format!(
            "UPDATE{}SET {} {}",
            self.table,
            assignment_pairs(columns),
            options.trim_start()
        )
        .trim_end()
        .to_string()
    }

    /// `DELETE FROM <table> <options>`
    pub fn delete(&self, options: &str) -> String {
        format!("DELETE FROM{}{}", self.table, options.trim_start())
            .trim_end()
            .to_string()
    }
}

fn join<S: AsRef<str>>(columns: &[S], separator: &str) -> String {
    columns
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(separator)
}
