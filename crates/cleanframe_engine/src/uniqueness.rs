//! Column-wide uniqueness.

use crate::{CleanError, DropMask};
use cleanframe_core::{ColumnRule, DuplicateGroup, DuplicateResolver, Report, RowId, Table};
use indexmap::IndexMap;

/// Marks every duplicate row except the one chosen to survive.
///
/// Without a resolver the first row of each group (in table order) survives.
/// A resolver picks the survivor by row identity. If it fails, or picks a row
/// outside the group, nothing is marked for the column.
pub fn resolve_uniqueness(
    table: &mut Table,
    column: &str,
    rule: &ColumnRule,
    report: &mut Report,
) -> DropMask {
    let len = table.len();
    if !rule.unique {
        return DropMask::new(len);
    }

    let groups = duplicate_groups(table, column);
    if groups.is_empty() {
        return DropMask::new(len);
    }

    let participating: usize = groups.iter().map(Vec::len).sum();
    report.warn(format!(
        "Found {} duplicate(s) in column '{}'.",
        participating, column
    ));

    let mut mask = DropMask::new(len);
    for positions in groups {
        let group = DuplicateGroup::new(table, column, positions);
        let keep = match &rule.resolve_duplicates {
            None => None,
            Some(resolver) => match resolve(resolver, &group) {
                Ok(id) => Some(id),
                Err(err) => {
                    report.error(format!(
                        "Error resolving duplicates in '{}': {}",
                        column, err
                    ));
                    return DropMask::new(len);
                }
            },
        };
        for (offset, row) in group.rows().enumerate() {
            let survives = match keep {
                Some(id) => row.id() == id,
                None => offset == 0,
            };
            if !survives {
                mask.set(row.position());
            }
        }
    }

    report.info(format!(
        "Marked {} duplicate row(s) in column '{}' for removal.",
        mask.count(),
        column
    ));
    mask
}

/// Positions of rows sharing a value, per value, for values seen more than once.
///
/// Groups appear in order of first occurrence. Nulls form one group.
pub fn duplicate_groups(table: &Table, column: &str) -> Vec<Vec<usize>> {
    let Some(col) = table.column(column) else {
        return Vec::new();
    };

    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (position, value) in col.values().iter().enumerate() {
        groups.entry(value.group_key()).or_default().push(position);
    }

    groups
        .into_values()
        .filter(|positions| positions.len() > 1)
        .collect()
}

fn resolve(resolver: &DuplicateResolver, group: &DuplicateGroup<'_>) -> Result<RowId, CleanError> {
    let keep = resolver.resolve(group).map_err(CleanError::Callback)?;
    if group.position_of(keep).is_none() {
        return Err(CleanError::ForeignRow(keep));
    }
    Ok(keep)
}
