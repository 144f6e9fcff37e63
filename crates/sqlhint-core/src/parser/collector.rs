//! AST walk that turns parsed statements into [`References`]

use std::ops::ControlFlow;

use sqlparser::ast::{
    visit_expressions, Assignment, AssignmentTarget, BinaryOperator, DataType, Delete, Expr,
    FromTable, FunctionArg, FunctionArgExpr, FunctionArgumentClause, FunctionArguments,
    GroupByExpr, Ident, Insert, JoinConstraint, JoinOperator, ObjectName, Query, Select,
    SelectItem, SetExpr, Spanned, Statement, TableAlias, TableFactor, TableWithJoins,
    UnaryOperator, Value, Visit,
};
use tracing::trace;

use crate::error::Span;
use crate::types::ValueType;

use super::location::{LineIndex, Literal, LiteralLocator};
use super::references::{
    AliasReference, Clause, ColumnReference, RefId, Reference, References, TableReference,
    ValueReference,
};

/// One FROM item visible to column references
#[derive(Debug, Default)]
struct ScopeEntry {
    /// Names usable as a qualifier: the table name and its alias
    names: Vec<String>,
    /// `None` for derived tables, CTEs and table functions
    table: Option<RefId>,
}

#[derive(Debug, Default)]
struct Scope {
    entries: Vec<ScopeEntry>,
    /// Select-list aliases of non-column expressions
    output_aliases: Vec<String>,
}

#[derive(Debug, Clone)]
struct LiteralValue {
    value_type: ValueType,
    text: Option<String>,
    span: Span,
}

/// What an expression turned out to be, as far as value linking cares
#[derive(Debug, Clone)]
enum Operand {
    Column(RefId),
    Literal(LiteralValue),
    Other,
}

pub(crate) struct ReferenceCollector<'l> {
    lines: &'l LineIndex,
    literals: LiteralLocator,
    refs: References,
    scopes: Vec<Scope>,
    /// CTE names visible at the current point of the walk
    ctes: Vec<String>,
}

impl<'l> ReferenceCollector<'l> {
    pub(crate) fn new(lines: &'l LineIndex, literals: LiteralLocator) -> Self {
        Self {
            lines,
            literals,
            refs: References::new(),
            scopes: Vec::new(),
            ctes: Vec::new(),
        }
    }

    pub(crate) fn collect(&mut self, statement: &Statement) {
        self.scopes.clear();
        self.ctes.clear();

        match statement {
            Statement::Query(query) => self.walk_query(query),
            Statement::Insert(insert) => self.collect_insert(insert),
            Statement::Update {
                table,
                assignments,
                from,
                selection,
                ..
            } => self.collect_update(table, assignments, from.as_ref(), selection.as_ref()),
            Statement::Delete(delete) => self.collect_delete(delete),
            _ => {}
        }
    }

    pub(crate) fn finish(self) -> References {
        trace!(count = self.refs.len(), "collected references");
        self.refs
    }

    fn collect_insert(&mut self, insert: &Insert) {
        self.scopes.push(Scope::default());
        let entry = self.table_entry(&insert.table_name, None);
        let table = entry.table;
        self.enter(entry);

        let fields: Vec<RefId> = insert
            .columns
            .iter()
            .map(|ident| self.push_column(ident, table, Clause::Fields))
            .collect();

        if let Some(source) = &insert.source {
            match source.body.as_ref() {
                SetExpr::Values(values) => {
                    for (row, exprs) in values.rows.iter().enumerate() {
                        for (i, expr) in exprs.iter().enumerate() {
                            self.insert_value(expr, fields.get(i).copied(), Clause::Values { row });
                        }
                    }
                }
                _ => self.walk_query(source),
            }
        }

        self.scopes.pop();
    }

    /// Every expression of a VALUES row is a value, typed only when it is a literal
    fn insert_value(&mut self, expr: &Expr, column: Option<RefId>, clause: Clause) {
        let value = match self.literal_operand(expr) {
            Some(literal) => ValueReference {
                value_type: Some(literal.value_type),
                text: literal.text,
                clause,
                column,
                span: literal.span,
            },
            None => {
                self.skip_literals(expr);
                ValueReference {
                    value_type: None,
                    text: None,
                    clause,
                    column,
                    span: self.lines.span(&expr.span()).unwrap_or(Span::at(0)),
                }
            }
        };
        self.refs.push(Reference::Value(value));
    }

    fn collect_update(
        &mut self,
        table: &TableWithJoins,
        assignments: &[Assignment],
        from: Option<&TableWithJoins>,
        selection: Option<&Expr>,
    ) {
        self.scopes.push(Scope::default());
        self.register_table_with_joins(table);
        if let Some(from) = from {
            self.register_table_with_joins(from);
        }

        for assignment in assignments {
            let target = match &assignment.target {
                AssignmentTarget::ColumnName(name) => match name.0.as_slice() {
                    [column] => self.column(None, column, Clause::Set),
                    [.., qualifier, column] => self.column(Some(qualifier), column, Clause::Set),
                    [] => Operand::Other,
                },
                AssignmentTarget::Tuple(_) => Operand::Other,
            };
            let value = self.walk_expr(&assignment.value, Clause::Set);
            self.link(target, value, Clause::Set);
        }

        self.walk_table_with_joins(table);
        if let Some(from) = from {
            self.walk_table_with_joins(from);
        }
        if let Some(selection) = selection {
            self.walk_expr(selection, Clause::Where);
        }
        self.scopes.pop();
    }

    fn collect_delete(&mut self, delete: &Delete) {
        let tables = match &delete.from {
            FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
        };
        let using = delete.using.as_deref().unwrap_or_default();

        self.scopes.push(Scope::default());
        for table in tables.iter().chain(using) {
            self.register_table_with_joins(table);
        }
        for table in tables.iter().chain(using) {
            self.walk_table_with_joins(table);
        }
        if let Some(selection) = &delete.selection {
            self.walk_expr(selection, Clause::Where);
        }
        self.scopes.pop();
    }

    fn walk_query(&mut self, query: &Query) {
        let visible_ctes = self.ctes.len();
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                let name = cte.alias.name.value.clone();
                if with.recursive {
                    self.ctes.push(name);
                    self.walk_query(&cte.query);
                } else {
                    self.walk_query(&cte.query);
                    self.ctes.push(name);
                }
            }
        }

        self.scopes.push(Scope::default());
        self.walk_set_expr(&query.body);
        if let Some(order_by) = &query.order_by {
            for ob in &order_by.exprs {
                self.walk_expr(&ob.expr, Clause::OrderBy);
            }
        }
        self.scopes.pop();
        self.ctes.truncate(visible_ctes);
    }

    /// A plain SELECT fills the current scope; each side of a set operation gets its own
    fn walk_set_expr(&mut self, set_expr: &SetExpr) {
        match set_expr {
            SetExpr::Select(select) => self.walk_select(select),
            SetExpr::Query(query) => self.walk_query(query),
            SetExpr::SetOperation { left, right, .. } => {
                for side in [left, right] {
                    self.scopes.push(Scope::default());
                    self.walk_set_expr(side);
                    self.scopes.pop();
                }
            }
            SetExpr::Values(values) => {
                for expr in values.rows.iter().flatten() {
                    self.walk_expr(expr, Clause::Select);
                }
            }
            _ => {}
        }
    }

    fn walk_select(&mut self, select: &Select) {
        // FROM first so the projection can see its tables
        for table_with_joins in &select.from {
            self.register_table_with_joins(table_with_joins);
        }

        for item in &select.projection {
            self.walk_select_item(item);
        }

        for table_with_joins in &select.from {
            self.walk_table_with_joins(table_with_joins);
        }

        if let Some(selection) = &select.selection {
            self.walk_expr(selection, Clause::Where);
        }

        match &select.group_by {
            GroupByExpr::All(_) => {}
            GroupByExpr::Expressions(exprs, _) => {
                for expr in exprs {
                    self.walk_expr(expr, Clause::GroupBy);
                }
            }
        }

        if let Some(having) = &select.having {
            self.walk_expr(having, Clause::Having);
        }
    }

    fn walk_select_item(&mut self, item: &SelectItem) {
        match item {
            SelectItem::UnnamedExpr(expr) => {
                self.walk_expr(expr, Clause::Select);
            }
            SelectItem::ExprWithAlias { expr, alias } => {
                match self.walk_expr(expr, Clause::Select) {
                    Operand::Column(target) => {
                        let span = self.span(alias);
                        self.refs.push(Reference::Alias(AliasReference {
                            alias: alias.value.clone(),
                            target,
                            span,
                        }));
                    }
                    _ => {
                        if let Some(scope) = self.scopes.last_mut() {
                            scope.output_aliases.push(alias.value.clone());
                        }
                    }
                }
            }
            SelectItem::QualifiedWildcard(..) | SelectItem::Wildcard(_) => {}
        }
    }

    fn register_table_with_joins(&mut self, table: &TableWithJoins) {
        self.register_table_factor(&table.relation);
        for join in &table.joins {
            self.register_table_factor(&join.relation);
        }
    }

    fn register_table_factor(&mut self, factor: &TableFactor) {
        let entry = match factor {
            TableFactor::Table {
                name, alias, args, ..
            } => {
                // Table-valued function call
                if args.is_some() {
                    ScopeEntry {
                        names: alias.iter().map(|a| a.name.value.clone()).collect(),
                        table: None,
                    }
                } else {
                    self.table_entry(name, alias.as_ref())
                }
            }
            TableFactor::Derived { alias, .. } => ScopeEntry {
                names: alias.iter().map(|a| a.name.value.clone()).collect(),
                table: None,
            },
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => {
                self.register_table_with_joins(table_with_joins);
                return;
            }
            _ => ScopeEntry::default(),
        };
        self.enter(entry);
    }

    /// Push the table (and alias) references for a named FROM item
    fn table_entry(&mut self, name: &ObjectName, alias: Option<&TableAlias>) -> ScopeEntry {
        let Some(ident) = name.0.last() else {
            return ScopeEntry::default();
        };

        let is_cte = name.0.len() == 1
            && self
                .ctes
                .iter()
                .any(|cte| cte.eq_ignore_ascii_case(&ident.value));
        if is_cte {
            let name = alias.map_or(&ident.value, |a| &a.name.value);
            return ScopeEntry {
                names: vec![name.clone()],
                table: None,
            };
        }

        let span = self.span(ident);
        let table = self.refs.push(Reference::Table(TableReference {
            name: ident.value.clone(),
            span,
        }));

        let mut names = vec![ident.value.clone()];
        if let Some(alias) = alias {
            let span = self.span(&alias.name);
            self.refs.push(Reference::Alias(AliasReference {
                alias: alias.name.value.clone(),
                target: table,
                span,
            }));
            names.push(alias.name.value.clone());
        }

        ScopeEntry {
            names,
            table: Some(table),
        }
    }

    fn enter(&mut self, entry: ScopeEntry) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.entries.push(entry);
        }
    }

    /// Walk subqueries and join conditions of a FROM item
    fn walk_table_with_joins(&mut self, table: &TableWithJoins) {
        self.walk_table_factor(&table.relation);

        for join in &table.joins {
            self.walk_table_factor(&join.relation);
            self.walk_join_condition(&join.join_operator);
        }
    }

    fn walk_table_factor(&mut self, factor: &TableFactor) {
        match factor {
            TableFactor::Derived { subquery, .. } => self.walk_query(subquery),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.walk_table_with_joins(table_with_joins),
            _ => {}
        }
    }

    fn walk_join_condition(&mut self, join_op: &JoinOperator) {
        use JoinOperator::*;

        let constraint = match join_op {
            Inner(c) | LeftOuter(c) | RightOuter(c) | FullOuter(c) | LeftSemi(c) | RightSemi(c)
            | LeftAnti(c) | RightAnti(c) => Some(c),
            CrossJoin | CrossApply | OuterApply | AsOf { .. } | Anti(_) | Semi(_) => None,
        };

        match constraint {
            Some(JoinConstraint::On(expr)) => {
                self.walk_expr(expr, Clause::Join);
            }
            Some(JoinConstraint::Using(columns)) => {
                for column in columns {
                    self.column(None, column, Clause::Join);
                }
            }
            _ => {}
        }
    }

    fn walk_expr(&mut self, expr: &Expr, clause: Clause) -> Operand {
        match expr {
            Expr::Identifier(ident) => self.column(None, ident, clause),
            Expr::CompoundIdentifier(idents) => match idents.as_slice() {
                [qualifier, column] | [_, qualifier, column] => {
                    self.column(Some(qualifier), column, clause)
                }
                _ => Operand::Other,
            },
            Expr::Value(_) | Expr::TypedString { .. } => self.literal_or_other(expr),
            Expr::UnaryOp {
                op: UnaryOperator::Minus | UnaryOperator::Plus,
                expr: inner,
            } if matches!(inner.as_ref(), Expr::Value(Value::Number(..))) => {
                self.literal_or_other(expr)
            }
            Expr::Nested(inner) => self.walk_expr(inner, clause),
            Expr::BinaryOp { left, op, right } => {
                let left = self.walk_expr(left, clause);
                let right = self.walk_expr(right, clause);
                if is_comparison(op) {
                    self.link(left, right, clause);
                }
                Operand::Other
            }
            Expr::InList { expr, list, .. } => {
                let target = self.walk_expr(expr, clause);
                for item in list {
                    let value = self.walk_expr(item, clause);
                    self.link(target.clone(), value, clause);
                }
                Operand::Other
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                let target = self.walk_expr(expr, clause);
                for bound in [low, high] {
                    let value = self.walk_expr(bound, clause);
                    self.link(target.clone(), value, clause);
                }
                Operand::Other
            }
            Expr::Like { expr, pattern, .. } | Expr::ILike { expr, pattern, .. } => {
                let target = self.walk_expr(expr, clause);
                let value = self.walk_expr(pattern, clause);
                self.link(target, value, clause);
                Operand::Other
            }
            Expr::UnaryOp { expr, .. }
            | Expr::IsNull(expr)
            | Expr::IsNotNull(expr)
            | Expr::IsTrue(expr)
            | Expr::IsFalse(expr)
            | Expr::IsNotTrue(expr)
            | Expr::IsNotFalse(expr)
            | Expr::IsUnknown(expr)
            | Expr::IsNotUnknown(expr)
            | Expr::Cast { expr, .. }
            | Expr::Extract { expr, .. }
            | Expr::Collate { expr, .. }
            | Expr::Ceil { expr, .. }
            | Expr::Floor { expr, .. } => {
                self.walk_expr(expr, clause);
                Operand::Other
            }
            Expr::IsDistinctFrom(a, b) | Expr::IsNotDistinctFrom(a, b) => {
                self.walk_expr(a, clause);
                self.walk_expr(b, clause);
                Operand::Other
            }
            Expr::Function(func) => {
                match &func.args {
                    FunctionArguments::List(list) => {
                        for arg in &list.args {
                            match arg {
                                FunctionArg::Unnamed(FunctionArgExpr::Expr(e))
                                | FunctionArg::Named {
                                    arg: FunctionArgExpr::Expr(e),
                                    ..
                                }
                                | FunctionArg::ExprNamed {
                                    arg: FunctionArgExpr::Expr(e),
                                    ..
                                } => {
                                    self.walk_expr(e, clause);
                                }
                                _ => {}
                            }
                        }
                        for arg_clause in &list.clauses {
                            match arg_clause {
                                FunctionArgumentClause::Separator(value) => {
                                    self.literal(value);
                                }
                                other => self.skip_literals(other),
                            }
                        }
                    }
                    FunctionArguments::Subquery(query) => self.walk_query(query),
                    FunctionArguments::None => {}
                }
                if let Some(filter) = &func.filter {
                    self.walk_expr(filter, clause);
                }
                self.skip_literals(&func.within_group);
                self.skip_literals(&func.over);
                Operand::Other
            }
            Expr::Case {
                operand,
                conditions,
                results,
                else_result,
            } => {
                if let Some(operand) = operand {
                    self.walk_expr(operand, clause);
                }
                for (condition, result) in conditions.iter().zip(results) {
                    self.walk_expr(condition, clause);
                    self.walk_expr(result, clause);
                }
                if let Some(else_result) = else_result {
                    self.walk_expr(else_result, clause);
                }
                Operand::Other
            }
            Expr::InSubquery { expr, subquery, .. } => {
                self.walk_expr(expr, clause);
                self.walk_query(subquery);
                Operand::Other
            }
            Expr::Subquery(query) | Expr::Exists {
                subquery: query, ..
            } => {
                self.walk_query(query);
                Operand::Other
            }
            Expr::Tuple(exprs) => {
                for e in exprs {
                    self.walk_expr(e, clause);
                }
                Operand::Other
            }
            other => {
                self.skip_literals(other);
                Operand::Other
            }
        }
    }

    /// Claim the tokens of literals the walk does not look at, so they are
    /// not handed to a later literal with the same text
    fn skip_literals<V: Visit>(&mut self, node: &V) {
        let _ = visit_expressions(node, |expr| {
            match expr {
                Expr::Value(value) => {
                    self.literal(value);
                }
                Expr::TypedString { .. } => {
                    self.literals.claim_string();
                }
                _ => {}
            }
            ControlFlow::<()>::Continue(())
        });
    }

    fn literal_or_other(&mut self, expr: &Expr) -> Operand {
        self.literal_operand(expr)
            .map_or(Operand::Other, Operand::Literal)
    }

    /// Type and locate a literal expression
    fn literal_operand(&mut self, expr: &Expr) -> Option<LiteralValue> {
        match expr {
            Expr::Value(value) => self.literal(value),
            Expr::Nested(inner) => self.literal_operand(inner),
            Expr::UnaryOp {
                op: UnaryOperator::Minus | UnaryOperator::Plus,
                expr: inner,
            } if matches!(inner.as_ref(), Expr::Value(Value::Number(..))) => {
                self.literal_operand(inner)
            }
            Expr::TypedString { data_type, .. } => {
                let (text, span) = self.literals.claim_string()?;
                let value_type = if is_temporal(data_type) {
                    ValueType::Date
                } else {
                    ValueType::String
                };
                Some(LiteralValue {
                    value_type,
                    text: Some(text),
                    span,
                })
            }
            _ => None,
        }
    }

    fn literal(&mut self, value: &Value) -> Option<LiteralValue> {
        let (literal, value_type, text) = match value {
            Value::Number(n, _) => (Literal::Number(n.clone()), ValueType::Number, None),
            Value::SingleQuotedString(s)
            | Value::DoubleQuotedString(s)
            | Value::NationalStringLiteral(s)
            | Value::EscapedStringLiteral(s) => {
                (Literal::String(s.clone()), ValueType::String, Some(s.clone()))
            }
            Value::Boolean(b) => (Literal::Boolean(*b), ValueType::Boolean, None),
            Value::Null => (Literal::Null, ValueType::Null, None),
            _ => return None,
        };
        let span = self.literals.claim(&literal)?;
        Some(LiteralValue {
            value_type,
            text,
            span,
        })
    }

    /// Record a value reference when one side is a column and the other a literal
    fn link(&mut self, a: Operand, b: Operand, clause: Clause) {
        let (column, literal) = match (a, b) {
            (Operand::Column(column), Operand::Literal(literal))
            | (Operand::Literal(literal), Operand::Column(column)) => (column, literal),
            _ => return,
        };
        self.refs.push(Reference::Value(ValueReference {
            value_type: Some(literal.value_type),
            text: literal.text,
            clause,
            column: Some(column),
            span: literal.span,
        }));
    }

    fn column(&mut self, qualifier: Option<&Ident>, ident: &Ident, clause: Clause) -> Operand {
        // ORDER BY / GROUP BY / HAVING may name an expression alias from the select list
        if qualifier.is_none()
            && matches!(clause, Clause::OrderBy | Clause::GroupBy | Clause::Having)
            && self.scopes.last().is_some_and(|scope| {
                scope
                    .output_aliases
                    .iter()
                    .any(|a| a.eq_ignore_ascii_case(&ident.value))
            })
        {
            return Operand::Other;
        }

        let table = self.owner(qualifier);
        Operand::Column(self.push_column(ident, table, clause))
    }

    fn push_column(&mut self, ident: &Ident, table: Option<RefId>, clause: Clause) -> RefId {
        let span = self.span(ident);
        self.refs.push(Reference::Column(ColumnReference {
            name: ident.value.clone(),
            table,
            clause,
            span,
        }))
    }

    /// Table reference owning a column: the scope entry named by the
    /// qualifier (innermost first), or the sole FROM item of the current scope
    fn owner(&self, qualifier: Option<&Ident>) -> Option<RefId> {
        match qualifier {
            Some(qualifier) => self
                .scopes
                .iter()
                .rev()
                .find_map(|scope| {
                    scope.entries.iter().find(|entry| {
                        entry
                            .names
                            .iter()
                            .any(|n| n.eq_ignore_ascii_case(&qualifier.value))
                    })
                })?
                .table,
            None => match self.scopes.last()?.entries.as_slice() {
                [entry] => entry.table,
                _ => None,
            },
        }
    }

    fn span(&self, ident: &Ident) -> Span {
        self.lines.span(&ident.span).unwrap_or(Span::at(0))
    }
}

fn is_comparison(op: &BinaryOperator) -> bool {
    matches!(
        op,
        BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Lt
            | BinaryOperator::LtEq
            | BinaryOperator::Gt
            | BinaryOperator::GtEq
            | BinaryOperator::Spaceship
    )
}

fn is_temporal(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Date | DataType::Datetime(_) | DataType::Timestamp(..) | DataType::Time(..)
    )
}
