//! Runtime relation descriptors and line parsing.

use crate::page::Record;

use super::error::SchemaError;
use super::registry::{fields, FieldDesc, FieldKind, TableTag};

/// Prefix TPC-H data generators emit for supplier keys in some columns
/// (`"Supplier#000000042"`). Stripped before integer parsing when the field
/// is declared integral.
const SUPPLIER_KEY_PREFIX: &str = "Supplier#";

/// Ordered field descriptor of a base table or a join result.
///
/// A relation built [`from_tag`](Relation::from_tag) mirrors the registry's
/// static field list. Joining two relations concatenates their field lists
/// (left first), matching how executors concatenate record fields — this is
/// how fields are resolved against intermediate join outputs, which have no
/// table tag.
#[derive(Debug, Clone)]
pub struct Relation {
    fields: Vec<FieldDesc>,
}

impl Relation {
    /// Builds the relation declared for a TPC-H table.
    pub fn from_tag(tag: TableTag) -> Self {
        Self {
            fields: fields(tag).to_vec(),
        }
    }

    /// Returns the descriptor of this relation joined with `right`.
    pub fn join(&self, right: &Relation) -> Relation {
        let mut fields = Vec::with_capacity(self.fields.len() + right.fields.len());
        fields.extend_from_slice(&self.fields);
        fields.extend_from_slice(&right.fields);
        Relation { fields }
    }

    /// Returns the declared number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns the declared kind of the field at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range; callers resolve indices through
    /// [`field_index`](Self::field_index) first.
    pub fn field_kind(&self, index: usize) -> FieldKind {
        self.fields[index].kind
    }

    /// Returns the position of the named field.
    ///
    /// When a join result declares the same name on both sides (every TPC-H
    /// table has a `comment`), the leftmost occurrence wins.
    pub fn field_index(&self, name: &str) -> Result<usize, SchemaError> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| SchemaError::UnknownField {
                field: name.to_string(),
            })
    }

    /// Extracts the integer join key stored in the named field of `record`.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownField`] if the field is not declared.
    /// - [`SchemaError::NotIntegral`] if the field's kind is not `Int`.
    /// - [`SchemaError::FieldCount`] if the record is shorter than declared.
    /// - [`SchemaError::KeyParse`] if the text does not parse as an integer.
    pub fn int_key(&self, record: &Record, name: &str) -> Result<i64, SchemaError> {
        self.int_key_at(record, self.field_index(name)?)
    }

    /// Extracts an integer join key by field position.
    ///
    /// Join results declare the same field name on both sides (every TPC-H
    /// table has a `comment`), so multi-table plans address key fields by
    /// position instead of by name.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range for the relation.
    pub fn int_key_at(&self, record: &Record, index: usize) -> Result<i64, SchemaError> {
        let desc = &self.fields[index];
        if desc.kind != FieldKind::Int {
            return Err(SchemaError::NotIntegral {
                field: desc.name.to_string(),
                kind: desc.kind,
            });
        }

        let text = record.field(index).ok_or(SchemaError::FieldCount {
            expected: self.fields.len(),
            actual: record.field_count(),
        })?;

        let digits = text.strip_prefix(SUPPLIER_KEY_PREFIX).unwrap_or(text);
        digits.parse::<i64>().map_err(|_| SchemaError::KeyParse {
            field: desc.name.to_string(),
            value: text.to_string(),
        })
    }
}

/// Extracts an integer join key by table tag, without building a relation.
pub fn extract_int_key(record: &Record, tag: TableTag, name: &str) -> Result<i64, SchemaError> {
    Relation::from_tag(tag).int_key(record, name)
}

/// Parses one pipe-delimited text line into a record for `tag`.
///
/// Trailing whitespace is trimmed and one trailing `|` is allowed, as emitted
/// by the TPC-H `dbgen` tool. Fields keep their text verbatim; no type
/// conversion happens here.
///
/// # Errors
///
/// Returns [`SchemaError::FieldCount`] if the number of fields does not match
/// the tag's declared count.
pub fn parse_line(tag: TableTag, line: &str) -> Result<Record, SchemaError> {
    let line = line.trim_end();
    let line = line.strip_suffix('|').unwrap_or(line);

    let fields: Vec<String> = line.split('|').map(str::to_string).collect();
    let expected = self::fields(tag).len();
    if fields.len() != expected {
        return Err(SchemaError::FieldCount {
            expected,
            actual: fields.len(),
        });
    }

    Ok(Record::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part_line() -> &'static str {
        "1|Part 1|Mfgr#1|Brand#11|STANDARD|7|JUMBO PKG|901.00|final comment|"
    }

    #[test]
    fn test_parse_line_with_trailing_pipe() {
        let record = parse_line(TableTag::Part, part_line()).unwrap();
        assert_eq!(record.field_count(), 9);
        assert_eq!(record.field(0), Some("1"));
        assert_eq!(record.field(8), Some("final comment"));
    }

    #[test]
    fn test_parse_line_without_trailing_pipe() {
        let record = parse_line(TableTag::Region, "0|AFRICA|special deposits").unwrap();
        assert_eq!(record.field_count(), 3);
        assert_eq!(record.field(1), Some("AFRICA"));
    }

    #[test]
    fn test_parse_line_wrong_field_count() {
        let err = parse_line(TableTag::Nation, "0|ALGERIA|0").unwrap_err();
        assert!(matches!(
            err,
            SchemaError::FieldCount {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_int_key_extraction() {
        let record = parse_line(TableTag::Part, part_line()).unwrap();
        let relation = Relation::from_tag(TableTag::Part);
        assert_eq!(relation.int_key(&record, "partkey").unwrap(), 1);
        assert_eq!(relation.int_key(&record, "size").unwrap(), 7);
    }

    #[test]
    fn test_int_key_rejects_non_integral_field() {
        let record = parse_line(TableTag::Part, part_line()).unwrap();
        let relation = Relation::from_tag(TableTag::Part);
        assert!(matches!(
            relation.int_key(&record, "retailprice"),
            Err(SchemaError::NotIntegral { .. })
        ));
    }

    #[test]
    fn test_int_key_unknown_field() {
        let record = parse_line(TableTag::Part, part_line()).unwrap();
        let relation = Relation::from_tag(TableTag::Part);
        assert!(matches!(
            relation.int_key(&record, "suppkey"),
            Err(SchemaError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_int_key_parse_failure() {
        let record = Record::new(vec!["not-a-number".to_string(); 5]);
        let relation = Relation::from_tag(TableTag::PartSupp);
        assert!(matches!(
            relation.int_key(&record, "partkey"),
            Err(SchemaError::KeyParse { .. })
        ));
    }

    #[test]
    fn test_supplier_prefix_alias() {
        let record = Record::new(vec![
            "Supplier#000000042".to_string(),
            "Supplier#000000042".to_string(),
            "address".to_string(),
            "3".to_string(),
            "phone".to_string(),
            "100.00".to_string(),
            "comment".to_string(),
        ]);
        let relation = Relation::from_tag(TableTag::Supplier);

        // The alias applies to integral fields only; the name field keeps
        // its text and is simply not a valid key.
        assert_eq!(relation.int_key(&record, "suppkey").unwrap(), 42);
        assert!(matches!(
            relation.int_key(&record, "name"),
            Err(SchemaError::NotIntegral { .. })
        ));
    }

    #[test]
    fn test_joined_relation_resolves_both_sides() {
        let joined =
            Relation::from_tag(TableTag::Part).join(&Relation::from_tag(TableTag::PartSupp));
        assert_eq!(joined.field_count(), 14);

        // partkey resolves to the left (PART) occurrence.
        assert_eq!(joined.field_index("partkey").unwrap(), 0);
        // suppkey only exists on the PARTSUPP side.
        assert_eq!(joined.field_index("suppkey").unwrap(), 10);
    }
}
