//! Declared table schemas and the export catalog.
//!
//! The catalog is an explicitly ordered, immutable list of table specs known
//! at startup. Tables are exported in catalog order, so ordering is a visible
//! contract rather than an artifact of a map's iteration order.

/// Closed set of declared column types understood by the caster.
///
/// Tags outside this set fall back to `String` rather than erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Bigint,
    Int,
    Double,
    Date,
    Timestamp,
    String,
}

impl ColumnType {
    /// Parse a type tag. Unrecognized tags default to string-cast.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "bigint" => ColumnType::Bigint,
            "int" => ColumnType::Int,
            "double" => ColumnType::Double,
            "date" => ColumnType::Date,
            "timestamp" => ColumnType::Timestamp,
            _ => ColumnType::String,
        }
    }
}

/// One declared column: name plus target semantic type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnSchema {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
        }
    }
}

/// One exported table: source name, destination key prefix, and its declared
/// columns in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub table: String,
    pub destination_prefix: String,
    pub columns: Vec<ColumnSchema>,
}

/// The fixed, ordered set of tables to export.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    tables: Vec<TableSpec>,
}

impl SchemaCatalog {
    pub fn new(tables: Vec<TableSpec>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    /// The production catalog: dashboard tables published for Athena.
    pub fn builtin() -> Self {
        use ColumnType::*;
        Self::new(vec![
            TableSpec {
                table: "dashboard_data".to_string(),
                destination_prefix: "dashboard_data/".to_string(),
                columns: vec![
                    ColumnSchema::new("id", Bigint),
                    ColumnSchema::new("admin_id", Bigint),
                    ColumnSchema::new("date_posted", Date),
                    ColumnSchema::new("engagement", Double),
                    ColumnSchema::new("likes", Int),
                    ColumnSchema::new("post_id", String),
                    ColumnSchema::new("posturl", String),
                    ColumnSchema::new("used_hash_tag", String),
                    ColumnSchema::new("username_tiktok_account", String),
                    ColumnSchema::new("views", Int),
                    ColumnSchema::new("publication_id", Bigint),
                ],
            },
            TableSpec {
                table: "dashboard_published_data".to_string(),
                destination_prefix: "dashboard_published_data/".to_string(),
                columns: vec![ColumnSchema::new("id", Bigint)],
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tags() {
        assert_eq!(ColumnType::parse("bigint"), ColumnType::Bigint);
        assert_eq!(ColumnType::parse("int"), ColumnType::Int);
        assert_eq!(ColumnType::parse("double"), ColumnType::Double);
        assert_eq!(ColumnType::parse("date"), ColumnType::Date);
        assert_eq!(ColumnType::parse("timestamp"), ColumnType::Timestamp);
        assert_eq!(ColumnType::parse("string"), ColumnType::String);
    }

    /// Unknown type tags must not error; they degrade to string-cast.
    #[test]
    fn test_parse_unknown_tag_defaults_to_string() {
        assert_eq!(ColumnType::parse("decimal(10,2)"), ColumnType::String);
        assert_eq!(ColumnType::parse(""), ColumnType::String);
    }

    #[test]
    fn test_builtin_catalog_order() {
        let catalog = SchemaCatalog::builtin();
        let names: Vec<&str> = catalog.tables().iter().map(|t| t.table.as_str()).collect();
        assert_eq!(names, vec!["dashboard_data", "dashboard_published_data"]);
    }

    #[test]
    fn test_builtin_prefixes_end_with_slash() {
        for spec in SchemaCatalog::builtin().tables() {
            assert!(spec.destination_prefix.ends_with('/'));
        }
    }
}
