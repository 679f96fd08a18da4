//! Tuples and tuple descriptors.
//!
//! A [`TupleDesc`] is the ordered schema of a row; a [`Tuple`] is one row
//! of values conforming to it. Every field type is fixed-width, so a
//! descriptor fully determines the size of a tuple slot on disk.

pub mod codec;

use crate::error::{DbError, Result};
use crate::types::{Field, RecordId, Type, STRING_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One named, typed column of a descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: Option<String>,
    pub field_type: Type,
}

/// Ordered schema of a tuple.
///
/// Two descriptors are equal when their type sequences match; names are
/// only used for display and lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TupleDesc {
    columns: Vec<Column>,
}

impl TupleDesc {
    /// Create a descriptor from `(name, type)` pairs
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = (S, Type)>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, field_type)| Column {
                    name: Some(name.into()),
                    field_type,
                })
                .collect(),
        }
    }

    /// Create a descriptor with anonymous columns
    pub fn unnamed(types: &[Type]) -> Self {
        Self {
            columns: types
                .iter()
                .map(|&field_type| Column {
                    name: None,
                    field_type,
                })
                .collect(),
        }
    }

    /// Concatenate two descriptors, `a`'s columns first
    pub fn merge(a: &TupleDesc, b: &TupleDesc) -> Self {
        let mut columns = a.columns.clone();
        columns.extend(b.columns.iter().cloned());
        Self { columns }
    }

    /// Copy of this descriptor with every name prefixed by `alias.`
    pub fn with_prefix(&self, alias: &str) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: Some(format!("{}.{}", alias, c.name.as_deref().unwrap_or("null"))),
                    field_type: c.field_type,
                })
                .collect(),
        }
    }

    pub fn num_fields(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn field_type(&self, index: usize) -> Option<Type> {
        self.columns.get(index).map(|c| c.field_type)
    }

    pub fn field_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).and_then(|c| c.name.as_deref())
    }

    /// Index of the first column with the given name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.as_deref() == Some(name))
    }

    /// Size in bytes of one encoded tuple
    pub fn byte_size(&self) -> usize {
        self.columns.iter().map(|c| c.field_type.byte_len()).sum()
    }

    pub fn types(&self) -> impl Iterator<Item = Type> + '_ {
        self.columns.iter().map(|c| c.field_type)
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.types().eq(other.types())
    }
}

impl Eq for TupleDesc {}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}({})", c.name.as_deref().unwrap_or("null"), c.field_type)?;
        }
        Ok(())
    }
}

/// One row of field values
#[derive(Debug, Clone)]
pub struct Tuple {
    desc: Arc<TupleDesc>,
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Build a tuple, checking that `fields` conform to `desc`.
    ///
    /// Text longer than the stored text width is truncated here, so a tuple
    /// reads the same before and after a trip through a page on disk.
    pub fn new(desc: Arc<TupleDesc>, fields: Vec<Field>) -> Result<Self> {
        let conforms = fields.len() == desc.num_fields()
            && fields.iter().zip(desc.types()).all(|(f, t)| f.field_type() == t);
        if !conforms {
            let found = TupleDesc::unnamed(&fields.iter().map(Field::field_type).collect::<Vec<_>>());
            return Err(DbError::schema_mismatch(&*desc, found));
        }
        let fields = fields
            .into_iter()
            .map(|field| match field {
                Field::Text(s) if s.len() > STRING_LEN => Field::Text(codec::truncate_text(&s).to_string()),
                other => other,
            })
            .collect();
        Ok(Self {
            desc,
            fields,
            record_id: None,
        })
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }

    /// Where this tuple is stored, if it has been persisted
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }

    /// Concatenate two tuples into one conforming to `desc`
    pub fn join(desc: Arc<TupleDesc>, left: &Tuple, right: &Tuple) -> Self {
        let mut fields = left.fields.clone();
        fields.extend(right.fields.iter().cloned());
        Self {
            desc,
            fields,
            record_id: None,
        }
    }
}

/// Tuples compare by value; the record location is not part of equality.
impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for Tuple {}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc() -> Arc<TupleDesc> {
        Arc::new(TupleDesc::new([("id", Type::Int), ("name", Type::Text)]))
    }

    #[test]
    fn test_desc_equality_ignores_names() {
        let a = TupleDesc::new([("x", Type::Int), ("y", Type::Text)]);
        let b = TupleDesc::unnamed(&[Type::Int, Type::Text]);
        let c = TupleDesc::unnamed(&[Type::Text, Type::Int]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_desc_lookup_and_size() {
        let d = desc();
        assert_eq!(d.index_of("name"), Some(1));
        assert_eq!(d.index_of("missing"), None);
        assert_eq!(d.byte_size(), 4 + 132);
        assert_eq!(d.to_string(), "id(INT), name(TEXT)");
    }

    #[test]
    fn test_prefix_and_merge() {
        let d = desc();
        let scanned = d.with_prefix("t");
        assert_eq!(scanned.field_name(0), Some("t.id"));
        let merged = TupleDesc::merge(&scanned, &d.with_prefix("u"));
        assert_eq!(merged.num_fields(), 4);
        assert_eq!(merged.field_name(3), Some("u.name"));
    }

    #[test]
    fn test_tuple_rejects_wrong_shape() {
        let d = desc();
        assert!(Tuple::new(d.clone(), vec![Field::Int(1)]).is_err());
        assert!(matches!(
            Tuple::new(d.clone(), vec![Field::from("a"), Field::Int(1)]),
            Err(DbError::SchemaMismatch { .. })
        ));
        let t = Tuple::new(d, vec![Field::Int(1), Field::from("a")]).unwrap();
        assert_eq!(t.to_string(), "1\ta");
        assert!(t.record_id().is_none());
    }

    #[test]
    fn test_long_text_truncated_on_construction() -> Result<()> {
        let long = "é".repeat(STRING_LEN);
        let t = Tuple::new(desc(), vec![Field::Int(1), Field::Text(long)])?;
        let Some(Field::Text(stored)) = t.field(1) else {
            panic!("expected a text field");
        };
        assert_eq!(stored.len(), STRING_LEN);
        assert_eq!(stored.chars().count(), STRING_LEN / 2);
        Ok(())
    }
}
