//! References collected from a parsed statement

use crate::error::Span;
use crate::types::ValueType;

/// Index of a reference within its statement's [`References`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefId(usize);

/// Clause a column or value appears in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clause {
    /// SELECT projection
    Select,
    /// INSERT column list
    Fields,
    /// One row of INSERT ... VALUES
    Values { row: usize },
    /// UPDATE ... SET
    Set,
    Where,
    /// JOIN ... ON / USING
    Join,
    GroupBy,
    Having,
    OrderBy,
}

/// A table name as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReference {
    pub name: String,
    pub span: Span,
}

/// A column name, attributed to the table reference that owns it.
///
/// `table` is `None` when the owner cannot be determined from the statement
/// alone (unknown qualifier, derived table, or an unqualified name with more
/// than one table in scope).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReference {
    pub name: String,
    pub table: Option<RefId>,
    pub clause: Clause,
    pub span: Span,
}

/// A value: a literal, or any expression in an INSERT row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueReference {
    /// `None` for expressions whose type is not inferred (placeholders, function calls, ...)
    pub value_type: Option<ValueType>,
    /// Unquoted text of string literals
    pub text: Option<String>,
    pub clause: Clause,
    /// The column this value is assigned to or compared with
    pub column: Option<RefId>,
    pub span: Span,
}

/// An alias bound to a table or column reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasReference {
    pub alias: String,
    pub target: RefId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Table(TableReference),
    Column(ColumnReference),
    Value(ValueReference),
    Alias(AliasReference),
}

impl Reference {
    pub fn span(&self) -> Span {
        match self {
            Reference::Table(table) => table.span,
            Reference::Column(column) => column.span,
            Reference::Value(value) => value.span,
            Reference::Alias(alias) => alias.span,
        }
    }

    /// Name this reference contributes when an alias points at it
    fn name(&self) -> Option<&str> {
        match self {
            Reference::Table(table) => Some(&table.name),
            Reference::Column(column) => Some(&column.name),
            Reference::Value(_) | Reference::Alias(_) => None,
        }
    }
}

/// All references of one statement, in collection order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    items: Vec<Reference>,
}

impl References {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reference: Reference) -> RefId {
        self.items.push(reference);
        RefId(self.items.len() - 1)
    }

    pub fn get(&self, id: RefId) -> Option<&Reference> {
        self.items.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RefId, &Reference)> {
        self.items.iter().enumerate().map(|(i, r)| (RefId(i), r))
    }

    pub fn tables(&self) -> impl Iterator<Item = (RefId, &TableReference)> {
        self.iter().filter_map(|(id, r)| match r {
            Reference::Table(table) => Some((id, table)),
            _ => None,
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = (RefId, &ColumnReference)> {
        self.iter().filter_map(|(id, r)| match r {
            Reference::Column(column) => Some((id, column)),
            _ => None,
        })
    }

    pub fn values(&self) -> impl Iterator<Item = (RefId, &ValueReference)> {
        self.iter().filter_map(|(id, r)| match r {
            Reference::Value(value) => Some((id, value)),
            _ => None,
        })
    }

    pub fn aliases(&self) -> impl Iterator<Item = (RefId, &AliasReference)> {
        self.iter().filter_map(|(id, r)| match r {
            Reference::Alias(alias) => Some((id, alias)),
            _ => None,
        })
    }

    /// Name of the table or column an alias stands for
    pub fn alias_target_name(&self, alias: &AliasReference) -> Option<&str> {
        self.get(alias.target).and_then(Reference::name)
    }
}
