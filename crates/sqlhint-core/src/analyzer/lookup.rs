//! Table and column lookup with one level of alias indirection

use tracing::trace;

use crate::parser::References;
use crate::schema::{Column, Schema, Table};

/// Find a table by exact name, or through an alias that stands for one
pub fn resolve_table<'s>(name: &str, schema: &'s Schema, refs: &References) -> Option<&'s Table> {
    resolve(name, refs, |n| schema.table(n))
}

/// Find a column by exact name, or through an alias that stands for one
pub fn resolve_column<'t>(name: &str, table: &'t Table, refs: &References) -> Option<&'t Column> {
    resolve(name, refs, |n| table.column(n))
}

fn resolve<'a, T>(
    name: &str,
    refs: &References,
    lookup: impl Fn(&str) -> Option<&'a T>,
) -> Option<&'a T> {
    if let Some(found) = lookup(name) {
        return Some(found);
    }

    let target = refs
        .aliases()
        .filter(|(_, alias)| alias.alias == name)
        .find_map(|(_, alias)| refs.alias_target_name(alias))?;
    trace!(alias = name, resolved = target, "resolving through alias");
    lookup(target)
}
