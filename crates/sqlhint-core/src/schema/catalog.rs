//! Schema snapshot - stores table and column definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{is_json_storage, ColumnType};

/// A named database: an immutable snapshot of its tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(with = "table_list")]
    pub tables: IndexMap<String, Table>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: IndexMap::new(),
        }
    }

    /// Load a snapshot from JSON, as emitted by an introspection tool.
    ///
    /// Tables are a list: `{"name": "app", "tables": [{"name": "users", "columns": [...]}]}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder-style table insertion
    pub fn with_table(mut self, table: Table) -> Self {
        self.add_table(table);
        self
    }

    /// Add a table, replacing any table with the same name
    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Look up a table by its exact declared name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub(crate) fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    /// Get all table names, in declaration order
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(|s| s.as_str()).collect()
    }
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(with = "column_list")]
    pub columns: IndexMap<String, Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
        }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.add_column(column);
        self
    }

    pub fn add_column(&mut self, column: Column) {
        self.columns.insert(column.name.clone(), column);
    }

    /// Get a column by its exact declared name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    /// Get all column names, in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|s| s.as_str()).collect()
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub declared_type: ColumnType,
    /// Storage type name as the database reports it (`varchar(255)`, `json`, ...)
    pub storage_type: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub has_index: bool,
}

impl Column {
    /// Create a nullable, unindexed column whose declared type follows its storage type
    pub fn new(name: impl Into<String>, storage_type: impl Into<String>) -> Self {
        let storage_type = storage_type.into();
        Self {
            name: name.into(),
            declared_type: ColumnType::from_storage_type(&storage_type),
            storage_type,
            optional: true,
            has_index: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.optional = false;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.has_index = true;
        self
    }

    pub fn with_declared_type(mut self, declared_type: ColumnType) -> Self {
        self.declared_type = declared_type;
        self
    }

    pub fn is_json(&self) -> bool {
        is_json_storage(&self.storage_type)
    }
}

macro_rules! named_list {
    ($module:ident, $item:ty) => {
        mod $module {
            use indexmap::IndexMap;
            use serde::{Deserialize, Deserializer, Serializer};

            pub fn serialize<S: Serializer>(
                map: &IndexMap<String, $item>,
                serializer: S,
            ) -> Result<S::Ok, S::Error> {
                serializer.collect_seq(map.values())
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(
                deserializer: D,
            ) -> Result<IndexMap<String, $item>, D::Error> {
                let items = Vec::<$item>::deserialize(deserializer)?;
                Ok(items
                    .into_iter()
                    .map(|item| (item.name.clone(), item))
                    .collect())
            }
        }
    };
}

named_list!(table_list, super::Table);
named_list!(column_list, super::Column);
