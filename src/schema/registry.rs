//! Static field lists for the TPC-H tables.

use std::fmt;
use std::str::FromStr;

use super::error::SchemaError;

/// Declared kind of a field.
///
/// The engine stores every field as text; kinds gate which fields may serve
/// as join keys (`Int`) and document the TPC-H column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Base-10 signed integer.
    Int,
    /// Fixed-point decimal, kept as text.
    Decimal,
    /// Free-form text.
    Text,
    /// `YYYY-MM-DD` date, kept as text.
    Date,
}

/// A field's name and declared kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDesc {
    /// Column name, lower-case as TPC-H names them (`partkey`, `comment`).
    pub name: &'static str,
    /// Declared kind.
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldDesc {
    FieldDesc { name, kind }
}

/// One of the eight TPC-H tables this engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableTag {
    Part,
    PartSupp,
    Supplier,
    Customer,
    Orders,
    Lineitem,
    Nation,
    Region,
}

impl TableTag {
    /// All recognized tags, in TPC-H order.
    pub const ALL: [TableTag; 8] = [
        TableTag::Part,
        TableTag::PartSupp,
        TableTag::Supplier,
        TableTag::Customer,
        TableTag::Orders,
        TableTag::Lineitem,
        TableTag::Nation,
        TableTag::Region,
    ];

    /// The canonical upper-case name used on the CLI and in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            TableTag::Part => "PART",
            TableTag::PartSupp => "PARTSUPP",
            TableTag::Supplier => "SUPPLIER",
            TableTag::Customer => "CUSTOMER",
            TableTag::Orders => "ORDERS",
            TableTag::Lineitem => "LINEITEM",
            TableTag::Nation => "NATION",
            TableTag::Region => "REGION",
        }
    }
}

impl fmt::Display for TableTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TableTag {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableTag::ALL
            .into_iter()
            .find(|tag| tag.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| SchemaError::UnknownTable(s.to_string()))
    }
}

use FieldKind::{Date, Decimal, Int, Text};

static PART: [FieldDesc; 9] = [
    field("partkey", Int),
    field("name", Text),
    field("mfgr", Text),
    field("brand", Text),
    field("type", Text),
    field("size", Int),
    field("container", Text),
    field("retailprice", Decimal),
    field("comment", Text),
];

static PARTSUPP: [FieldDesc; 5] = [
    field("partkey", Int),
    field("suppkey", Int),
    field("availqty", Int),
    field("supplycost", Decimal),
    field("comment", Text),
];

static SUPPLIER: [FieldDesc; 7] = [
    field("suppkey", Int),
    field("name", Text),
    field("address", Text),
    field("nationkey", Int),
    field("phone", Text),
    field("acctbal", Decimal),
    field("comment", Text),
];

static CUSTOMER: [FieldDesc; 8] = [
    field("custkey", Int),
    field("name", Text),
    field("address", Text),
    field("nationkey", Int),
    field("phone", Text),
    field("acctbal", Decimal),
    field("mktsegment", Text),
    field("comment", Text),
];

static ORDERS: [FieldDesc; 9] = [
    field("orderkey", Int),
    field("custkey", Int),
    field("orderstatus", Text),
    field("totalprice", Decimal),
    field("orderdate", Date),
    field("orderpriority", Text),
    field("clerk", Text),
    field("shippriority", Int),
    field("comment", Text),
];

static LINEITEM: [FieldDesc; 16] = [
    field("orderkey", Int),
    field("partkey", Int),
    field("suppkey", Int),
    field("linenumber", Int),
    field("quantity", Decimal),
    field("extendedprice", Decimal),
    field("discount", Decimal),
    field("tax", Decimal),
    field("returnflag", Text),
    field("linestatus", Text),
    field("shipdate", Date),
    field("commitdate", Date),
    field("receiptdate", Date),
    field("shipinstruct", Text),
    field("shipmode", Text),
    field("comment", Text),
];

static NATION: [FieldDesc; 4] = [
    field("nationkey", Int),
    field("name", Text),
    field("regionkey", Int),
    field("comment", Text),
];

static REGION: [FieldDesc; 3] = [
    field("regionkey", Int),
    field("name", Text),
    field("comment", Text),
];

/// Returns the ordered field list declared for `tag`.
pub fn fields(tag: TableTag) -> &'static [FieldDesc] {
    match tag {
        TableTag::Part => &PART,
        TableTag::PartSupp => &PARTSUPP,
        TableTag::Supplier => &SUPPLIER,
        TableTag::Customer => &CUSTOMER,
        TableTag::Orders => &ORDERS,
        TableTag::Lineitem => &LINEITEM,
        TableTag::Nation => &NATION,
        TableTag::Region => &REGION,
    }
}
