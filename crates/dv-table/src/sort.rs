//! Column sort order over the full row set

use dv_core::{ascending, descending, Value};
use serde::{Deserialize, Serialize};

use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortMode {
    Ascending,
    Descending,
    Unsort,
}

/// Sort metadata of a table. `sort_order` is a permutation of all row indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    pub sort_column: Option<(String, SortMode)>,
    pub sort_order: Option<Vec<usize>>,
}

/// Sort every row of `table` by `column`, ignoring the current filters.
///
/// `Unsort` clears the sort. An unknown column leaves the table's current
/// sort state as it is.
pub fn sort_table_by_column(table: &Table, column: &str, mode: SortMode) -> SortState {
    if mode == SortMode::Unsort {
        return SortState::default();
    }

    let Some(field) = table.column_field(column) else {
        return table.sort_state().clone();
    };

    let rows = table.rows();
    let values: Vec<Value> = rows.iter().map(|row| field.value(row)).collect();
    let compare = match mode {
        SortMode::Descending => descending,
        _ => ascending,
    };

    let mut order: Vec<usize> = table.all_indices().to_vec();
    // stable, so equal values keep row order
    order.sort_by(|&a, &b| compare(&values[a], &values[b]));

    SortState {
        sort_column: Some((column.to_string(), mode)),
        sort_order: Some(order),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;
    use crate::field::FieldSpec;
    use crate::table::TableInfo;
    use dv_core::FieldType;

    fn table() -> Table {
        Table::new(
            TableInfo::with_id("t"),
            vec![
                FieldSpec::new("name", FieldType::String),
                FieldSpec::new("score", FieldType::Real),
            ],
            vec![
                vec!["b".into(), Value::Real(2.0)],
                vec!["a".into(), Value::Null],
                vec!["c".into(), Value::Real(1.0)],
                vec!["d".into(), Value::Real(2.0)],
            ],
            &TableConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_sort_ascending_and_descending() {
        let table = table();

        let state = sort_table_by_column(&table, "score", SortMode::Ascending);
        assert_eq!(state.sort_order, Some(vec![2, 0, 3, 1]));
        assert_eq!(state.sort_column, Some(("score".to_string(), SortMode::Ascending)));

        let state = sort_table_by_column(&table, "score", SortMode::Descending);
        assert_eq!(state.sort_order, Some(vec![0, 3, 2, 1]));

        let state = sort_table_by_column(&table, "name", SortMode::Descending);
        assert_eq!(state.sort_order, Some(vec![3, 2, 0, 1]));
    }

    #[test]
    fn test_unsort_clears() {
        let mut table = table();
        table.apply_sort("score", SortMode::Ascending);
        assert!(table.sort_state().sort_order.is_some());

        let state = sort_table_by_column(&table, "score", SortMode::Unsort);
        assert_eq!(state, SortState::default());
        assert!(state.sort_column.is_none());

        table.apply_sort("whatever", SortMode::Unsort);
        assert_eq!(table.sort_state(), &SortState::default());
    }

    #[test]
    fn test_sort_ignores_filters() {
        use dv_core::{FilterDescriptor, FilterType, FilterValue};

        let mut table = table();
        let filter = FilterDescriptor::new("f", FilterType::Range, FilterValue::Range([1.5, 3.0]))
            .for_table("t", "score", Some(1));
        table.filter_table(&[filter], &[], Default::default());
        assert_eq!(table.filtered_indices(), &[0, 3]);

        let state = sort_table_by_column(&table, "score", SortMode::Ascending);
        assert_eq!(state.sort_order.map(|o| o.len()), Some(4));
    }

    #[test]
    fn test_unknown_column_keeps_state() {
        let mut table = table();
        table.apply_sort("name", SortMode::Ascending);
        let state = sort_table_by_column(&table, "missing", SortMode::Descending);
        assert_eq!(&state, table.sort_state());
    }
}
