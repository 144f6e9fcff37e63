//! Schema builder - converts DDL to a Schema snapshot

use sqlparser::ast::{
    AlterTableOperation, ColumnDef, ColumnOption, CreateIndex, CreateTable, Expr, Ident,
    ObjectName, ObjectType, Statement, TableConstraint,
};
use sqlparser::parser::Parser;
use tracing::{debug, warn};

use crate::dialect::SqlDialect;
use crate::error::{Error, Result};
use crate::parser::{SqlSplitter, StatementSplitter};
use crate::schema::{Column, Schema, Table};

/// Builder for constructing a [`Schema`] from `CREATE TABLE` / `CREATE INDEX` /
/// `ALTER TABLE` statements
pub struct SchemaBuilder {
    schema: Schema,
    dialect: SqlDialect,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: Schema::new(name),
            dialect: SqlDialect::default(),
        }
    }

    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Parse DDL and apply it to the schema.
    ///
    /// Statements the parser cannot handle (procedures, triggers, ...) are
    /// skipped one by one. Fails only when nothing in `sql` parses.
    pub fn parse(&mut self, sql: &str) -> Result<()> {
        let dialect = self.dialect.parser_dialect();

        // Try parsing the entire SQL first (fast path)
        let first_error = match Parser::parse_sql(dialect.as_ref(), sql) {
            Ok(statements) => {
                for stmt in &statements {
                    self.process_statement(stmt);
                }
                return Ok(());
            }
            Err(e) => e,
        };

        // Fall back to statement-by-statement parsing to skip unsupported syntax
        let mut parsed = 0;
        let mut skipped = 0;
        for raw in SqlSplitter::new(self.dialect).split(sql) {
            match Parser::parse_sql(dialect.as_ref(), raw.text) {
                Ok(statements) => {
                    parsed += 1;
                    for stmt in &statements {
                        self.process_statement(stmt);
                    }
                }
                Err(e) => {
                    skipped += 1;
                    warn!(start = raw.span.start, error = %e, "skipping unparseable DDL statement");
                }
            }
        }

        if parsed == 0 && skipped > 0 {
            return Err(Error::Schema {
                message: first_error.to_string(),
            });
        }
        Ok(())
    }

    fn process_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::CreateTable(create) => self.process_create_table(create),
            Statement::CreateIndex(index) => self.process_create_index(index),
            Statement::AlterTable {
                name, operations, ..
            } => self.process_alter_table(name, operations),
            Statement::Drop {
                object_type: ObjectType::Table,
                names,
                ..
            } => {
                for name in names {
                    if let Some(name) = table_name(name) {
                        self.schema.tables.shift_remove(name);
                    }
                }
            }
            _ => {}
        }
    }

    fn process_create_table(&mut self, create: &CreateTable) {
        let Some(name) = table_name(&create.name) else {
            return;
        };
        let mut table = Table::new(name);

        for column in &create.columns {
            table.add_column(column_from_def(column));
        }

        for constraint in &create.constraints {
            apply_constraint(&mut table, constraint);
        }

        debug!(table = %table.name, columns = table.columns.len(), "table defined");
        self.schema.add_table(table);
    }

    fn process_create_index(&mut self, index: &CreateIndex) {
        let Some(table) = table_name(&index.table_name).and_then(|n| self.schema.table_mut(n))
        else {
            return;
        };
        // Only the leading column of a composite index serves lookups on its own
        if let Some(Expr::Identifier(ident)) = index.columns.first().map(|c| &c.expr) {
            mark_indexed(table, ident);
        }
    }

    fn process_alter_table(&mut self, name: &ObjectName, operations: &[AlterTableOperation]) {
        let Some(target) = table_name(name) else {
            return;
        };
        let Some(table) = self.schema.table_mut(target) else {
            warn!(table = target, "ALTER TABLE on a table that was never created");
            return;
        };

        for operation in operations {
            match operation {
                AlterTableOperation::AddColumn { column_def, .. } => {
                    table.add_column(column_from_def(column_def));
                }
                AlterTableOperation::DropColumn { column_name, .. } => {
                    table.columns.shift_remove(&column_name.value);
                }
                AlterTableOperation::RenameColumn {
                    old_column_name,
                    new_column_name,
                } => {
                    if let Some(mut column) = table.columns.shift_remove(&old_column_name.value) {
                        column.name = new_column_name.value.clone();
                        table.add_column(column);
                    }
                }
                AlterTableOperation::AddConstraint(constraint) => {
                    apply_constraint(table, constraint);
                }
                _ => {
                    // Other ALTER TABLE operations do not affect lookups
                }
            }
        }
    }

    /// Consume the builder and return the schema
    pub fn build(self) -> Schema {
        self.schema
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Unqualified table name: `app.users` -> `users`
fn table_name(name: &ObjectName) -> Option<&str> {
    name.0.last().map(|ident| ident.value.as_str())
}

fn column_from_def(def: &ColumnDef) -> Column {
    let mut column = Column::new(&def.name.value, def.data_type.to_string().to_lowercase());

    for option in &def.options {
        match &option.option {
            ColumnOption::Null => column.optional = true,
            ColumnOption::NotNull => column.optional = false,
            ColumnOption::Unique { is_primary, .. } => {
                column.has_index = true;
                if *is_primary {
                    column.optional = false;
                }
            }
            _ => {}
        }
    }

    column
}

/// Apply a table-level constraint. Key constraints index their leading column.
fn apply_constraint(table: &mut Table, constraint: &TableConstraint) {
    let columns = match constraint {
        TableConstraint::PrimaryKey { columns, .. } => {
            for ident in columns {
                if let Some(column) = table.column_mut(&ident.value) {
                    column.optional = false;
                }
            }
            columns
        }
        TableConstraint::Unique { columns, .. }
        | TableConstraint::Index { columns, .. }
        | TableConstraint::FulltextOrSpatial { columns, .. }
        | TableConstraint::ForeignKey { columns, .. } => columns,
        _ => return,
    };

    if let Some(ident) = columns.first() {
        mark_indexed(table, ident);
    }
}

fn mark_indexed(table: &mut Table, ident: &Ident) {
    if let Some(column) = table.column_mut(&ident.value) {
        column.has_index = true;
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new("")
    }
}
