//! The table model
//!
//! A [`Table`] owns the loaded rows and fields and keeps two filtered index
//! sets: `filtered_indices` for rendering and `filtered_indices_for_domain`
//! for scale domains. They are recomputed in place by [`Table::filter_table`],
//! and only for the filter groups that changed since the last call.

use ahash::{AHashMap, AHashSet};
use dv_core::{generate_id, FilterDescriptor, LayerInfo, Row, Value};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::sync::Arc;

use crate::config::{FilterOptions, TableConfig};
use crate::domain::{
    linear_domain, log_domain, ordinal_domain, quantile_domain, Domain, FilterProps, ScaleType,
};
use crate::field::{Field, FieldSpec};
use crate::filter::{
    apply_filters, build_predicate, FilterChanges, FilterRecord, FilterServices, GpuFilterState,
    Predicate, PredicateGroups,
};
use crate::point_pairs::{find_point_field_pairs, PointFieldPair};
use crate::sort::{sort_table_by_column, SortMode, SortState};
use crate::{Result, TableError};

/// Label of tables constructed without one
pub const DEFAULT_LABEL: &str = "new dataset";

const PALETTE: &[[u8; 3]] = &[
    [18, 147, 154],
    [231, 89, 53],
    [255, 193, 7],
    [83, 109, 254],
    [136, 198, 56],
    [227, 26, 124],
];

fn default_color(id: &str) -> [u8; 3] {
    let hash = id.bytes().fold(0usize, |acc, b| acc.wrapping_add(b as usize));
    PALETTE[hash % PALETTE.len()]
}

/// Optional identity of a table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl TableInfo {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Raw fields and rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub fields: Vec<FieldSpec>,
    pub rows: Vec<Row>,
}

/// Full construction input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInput {
    #[serde(default)]
    pub info: TableInfo,
    pub data: TableData,
    #[serde(default)]
    pub color: Option<[u8; 3]>,
    #[serde(default)]
    pub metadata: Map<String, serde_json::Value>,
}

/// An in-memory table with dual-track filter state
#[derive(Debug, Clone)]
pub struct Table {
    pub id: String,
    pub label: String,
    pub color: [u8; 3],
    pub metadata: Map<String, serde_json::Value>,

    rows: Arc<Vec<Row>>,
    fields: Arc<Vec<Field>>,
    config: Arc<TableConfig>,
    services: FilterServices,

    all_indices: Arc<[usize]>,
    filtered_indices: Arc<[usize]>,
    filtered_indices_for_domain: Arc<[usize]>,
    filter_record: FilterRecord,
    changed_filters: FilterChanges,
    gpu_filter: GpuFilterState,

    filtered_indices_cpu: Option<Arc<[usize]>>,
    filter_record_cpu: Option<FilterRecord>,

    sort: SortState,
    point_pairs: Vec<PointFieldPair>,
}

impl Table {
    /// Build a table from field descriptions and rows.
    ///
    /// Every row must have one cell per field and field names must be unique.
    pub fn new(info: TableInfo, fields: Vec<FieldSpec>, rows: Vec<Row>, config: &TableConfig) -> Result<Self> {
        let mut names = AHashSet::new();
        for spec in &fields {
            if !names.insert(spec.name.as_str()) {
                return Err(TableError::DuplicateField(spec.name.clone()));
            }
        }

        for (index, row) in rows.iter().enumerate() {
            if row.len() != fields.len() {
                return Err(TableError::RowArity {
                    row: index,
                    expected: fields.len(),
                    found: row.len(),
                });
            }
        }

        let rows: Vec<Row> = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| config.null_config.normalize(cell)).collect())
            .collect();
        let fields: Vec<Field> = fields
            .into_iter()
            .enumerate()
            .map(|(index, spec)| Field::new(spec, index))
            .collect();

        let id = info.id.unwrap_or_else(generate_id);
        let all_indices: Arc<[usize]> = (0..rows.len()).collect();
        let point_pairs = if config.detect_point_pairs {
            find_point_field_pairs(&fields)
        } else {
            Vec::new()
        };

        tracing::debug!(
            "Created table '{}' with {} rows and {} fields",
            id,
            rows.len(),
            fields.len()
        );

        Ok(Self {
            color: default_color(&id),
            label: info.label.unwrap_or_else(|| DEFAULT_LABEL.to_string()),
            id,
            metadata: Map::new(),
            rows: Arc::new(rows),
            fields: Arc::new(fields),
            config: Arc::new(config.clone()),
            services: FilterServices::default(),
            filtered_indices: Arc::clone(&all_indices),
            filtered_indices_for_domain: Arc::clone(&all_indices),
            all_indices,
            filter_record: FilterRecord::default(),
            changed_filters: FilterChanges::default(),
            gpu_filter: GpuFilterState::default(),
            filtered_indices_cpu: None,
            filter_record_cpu: None,
            sort: SortState::default(),
            point_pairs,
        })
    }

    /// Build a table from the full construction input
    pub fn from_input(input: TableInput, config: &TableConfig) -> Result<Self> {
        let mut table = Self::new(input.info, input.data.fields, input.data.rows, config)?;
        if let Some(color) = input.color {
            table.color = color;
        }
        table.metadata = input.metadata;
        Ok(table)
    }

    /// Build a table from construction input encoded as JSON
    pub fn from_json(json: &str, config: &TableConfig) -> Result<Self> {
        let input: TableInput = serde_json::from_str(json)?;
        Self::from_input(input, config)
    }

    /// Replace the field resolver and gpu filter builder
    pub fn with_services(mut self, services: FilterServices) -> Self {
        self.services = services;
        self
    }

    /// A copy sharing rows and fields with this table but owning its own
    /// filter state
    pub fn shadow_copy(&self) -> Self {
        self.clone()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn all_indices(&self) -> &[usize] {
        &self.all_indices
    }

    /// Row indices to render
    pub fn filtered_indices(&self) -> &[usize] {
        &self.filtered_indices
    }

    /// Row indices scale domains are computed over
    pub fn filtered_indices_for_domain(&self) -> &[usize] {
        &self.filtered_indices_for_domain
    }

    /// Result of the last CPU shadow filtering, if any
    pub fn filtered_indices_cpu(&self) -> Option<&[usize]> {
        self.filtered_indices_cpu.as_deref()
    }

    pub fn filter_record(&self) -> &FilterRecord {
        &self.filter_record
    }

    pub fn filter_record_cpu(&self) -> Option<&FilterRecord> {
        self.filter_record_cpu.as_ref()
    }

    /// Changes detected by the last `filter_table` call
    pub fn changed_filters(&self) -> &FilterChanges {
        &self.changed_filters
    }

    pub fn gpu_filter(&self) -> &GpuFilterState {
        &self.gpu_filter
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn point_field_pairs(&self) -> &[PointFieldPair] {
        &self.point_pairs
    }

    /// Field by exact, case-sensitive name
    pub fn column_field(&self, name: &str) -> Option<&Field> {
        self.column_field_index(name).map(|index| &self.fields[index])
    }

    /// Index of the field with this exact, case-sensitive name
    pub fn column_field_index(&self, name: &str) -> Option<usize> {
        let index = self.fields.iter().position(|f| f.name == name);
        if index.is_none() {
            tracing::warn!("Column '{}' not found in table '{}'", name, self.id);
        }
        index
    }

    /// Typed value of a column in one row; `None` when the column or row does not exist
    pub fn value(&self, name: &str, row_index: usize) -> Option<Value> {
        let field = self.column_field(name)?;
        let row = self.rows.get(row_index)?;
        Some(field.value(row))
    }

    /// Typed values of a column over every row
    pub fn column_values(&self, name: &str) -> Option<Vec<Value>> {
        let field = self.column_field(name)?;
        Some(self.rows.iter().map(|row| field.value(row)).collect())
    }

    /// Typed values of a column over the rendered rows
    pub fn filtered_values(&self, name: &str) -> Option<Vec<Value>> {
        let field = self.column_field(name)?;
        Some(
            self.filtered_indices
                .iter()
                .map(|&i| field.value(&self.rows[i]))
                .collect(),
        )
    }

    /// Replace the field at `index`. Rows and other fields are untouched;
    /// tables sharing the field list keep the previous one.
    ///
    /// When the replacement reads cells differently, the filter records are
    /// cleared so the next `filter_table` call rescans with the new accessor.
    pub fn update_column_field(&mut self, index: usize, mut field: Field) -> bool {
        if index >= self.fields.len() {
            tracing::warn!(
                "Cannot update field {} of table '{}': it has {} fields",
                index,
                self.id,
                self.fields.len()
            );
            return false;
        }

        field.index = index;
        let previous = &self.fields[index];
        if previous.field_type != field.field_type || previous.format != field.format {
            self.filter_record = FilterRecord::default();
            self.filter_record_cpu = None;
        }
        Arc::make_mut(&mut self.fields)[index] = field;
        if self.config.detect_point_pairs {
            self.point_pairs = find_point_field_pairs(&self.fields);
        }
        true
    }

    /// Filter props of a column over all rows, computed once and cached on the field
    pub fn column_filter_props(&self, name: &str) -> Option<&FilterProps> {
        let field = self.column_field(name)?;
        Some(field.filter_props_or_init(|| {
            FilterProps::compute(field, &self.all_indices, |i| field.value(&self.rows[i]), &self.config)
        }))
    }

    /// Filter domain of a column, see [`Table::column_filter_props`]
    pub fn column_filter_domain(&self, name: &str) -> Option<&Domain> {
        self.column_filter_props(name).map(|props| &props.domain)
    }

    /// Domain of `field` for a layer scale.
    ///
    /// Ordinal and point scales always use every row so category legends stay
    /// put while filters move; the rest use `filtered_indices_for_domain`.
    pub fn column_layer_domain(&self, field: &Field, scale_type: ScaleType) -> Domain {
        let value = |i: usize| {
            self.rows
                .get(i)
                .map(|row| field.value(row))
                .unwrap_or(Value::Null)
        };

        match scale_type {
            ScaleType::Ordinal | ScaleType::Point => {
                Domain::Values(ordinal_domain(&self.all_indices, value))
            }
            ScaleType::Quantile => Domain::Values(quantile_domain(
                &self.filtered_indices_for_domain,
                value,
                |a: &Value, b: &Value| field.compare_values(a, b),
            )),
            ScaleType::Log => Domain::Extent(log_domain(&self.filtered_indices_for_domain, value)),
            ScaleType::Quantize
            | ScaleType::Linear
            | ScaleType::Sqrt
            | ScaleType::Identity
            | ScaleType::Threshold => {
                Domain::Extent(linear_domain(&self.filtered_indices_for_domain, value))
            }
        }
    }

    /// [`Table::column_layer_domain`] for a scale type given by name;
    /// `None` for unknown scale types
    pub fn column_layer_domain_by_name(&self, field: &Field, scale_type: &str) -> Option<Domain> {
        match scale_type.parse::<ScaleType>() {
            Ok(scale_type) => Some(self.column_layer_domain(field, scale_type)),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }

    /// Apply `filters` to the table.
    ///
    /// The filters are classified and diffed against the previous
    /// application; only the index sets whose filter group changed are
    /// rescanned. Gpu filter parameters are rebuilt every time unless
    /// `options.cpu_only` is set; gpu-flagged filters that get no device
    /// channel are filtered on the CPU.
    pub fn filter_table(
        &mut self,
        filters: &[FilterDescriptor],
        layers: &[LayerInfo],
        options: FilterOptions,
    ) -> &mut Self {
        self.gpu_filter = if options.cpu_only {
            GpuFilterState::default()
        } else {
            self.services.gpu.build(filters, &self.id, &self.fields)
        };
        let filter_record = FilterRecord::classify(&self.id, filters, options, &self.gpu_filter);
        self.changed_filters = filter_record.diff(&self.filter_record);
        self.filter_record = filter_record;

        if filters.is_empty() {
            self.filtered_indices = Arc::clone(&self.all_indices);
            self.filtered_indices_for_domain = Arc::clone(&self.all_indices);
            return self;
        }

        let calc_domain = self.changed_filters.dynamic_domain_changed();
        let calc_render = self.changed_filters.cpu_changed();
        if !calc_domain && !calc_render {
            tracing::debug!("Filters of table '{}' unchanged", self.id);
            return self;
        }

        let result = {
            let fields = self.fields.as_slice();
            let record = &self.filter_record;

            let mut predicates: AHashMap<&str, Predicate<'_>> = AHashMap::new();
            let needed = calc_domain
                .then_some(&record.dynamic_domain)
                .into_iter()
                .chain(calc_render.then_some(&record.cpu))
                .flatten();
            for filter in needed {
                if predicates.contains_key(filter.id.as_str()) {
                    continue;
                }
                let field = self
                    .services
                    .resolver
                    .resolve(&self.id, filter)
                    .and_then(|index| fields.get(index));
                predicates.insert(
                    filter.id.as_str(),
                    build_predicate(field, &self.id, filter, layers, fields),
                );
            }

            let lookup = |group: &[FilterDescriptor]| {
                group
                    .iter()
                    .filter_map(|f| predicates.get(f.id.as_str()))
                    .collect::<Vec<_>>()
            };
            let groups = PredicateGroups {
                dynamic_domain: calc_domain.then(|| lookup(&record.dynamic_domain)),
                cpu: calc_render.then(|| lookup(&record.cpu)),
            };
            apply_filters(&self.all_indices, &self.rows, &groups)
        };

        if let Some(indices) = result.filtered_indices {
            self.filtered_indices = indices.into();
        }
        if let Some(indices) = result.filtered_indices_for_domain {
            self.filtered_indices_for_domain = indices.into();
        }
        self
    }

    /// Filter every filter on the CPU, for consumers that cannot run the gpu
    /// filters on the device.
    ///
    /// Returns a shadow copy whose `filtered_indices` hold the CPU result and
    /// caches that result on this table as `filtered_indices_cpu`. The
    /// table's own filtered indices are never touched.
    pub fn filter_table_cpu(&mut self, filters: &[FilterDescriptor], layers: &[LayerInfo]) -> Table {
        let options = FilterOptions::cpu_shadow();

        let device = self.services.gpu.build(filters, &self.id, &self.fields);
        if filters.is_empty() || device.active_channels() == 0 {
            // without gpu filters the regular render set is already the CPU result
            let indices = if filters.is_empty() {
                Arc::clone(&self.all_indices)
            } else {
                Arc::clone(&self.filtered_indices)
            };
            self.filtered_indices_cpu = Some(Arc::clone(&indices));
            self.filter_record_cpu = Some(FilterRecord::classify(
                &self.id,
                filters,
                options,
                &GpuFilterState::default(),
            ));

            let mut shadow = self.shadow_copy();
            shadow.filtered_indices = indices;
            return shadow;
        }

        let mut shadow = self.shadow_copy();
        shadow.filter_record = self.filter_record_cpu.clone().unwrap_or_default();
        shadow.filtered_indices = self
            .filtered_indices_cpu
            .clone()
            .unwrap_or_else(|| Arc::clone(&self.all_indices));
        shadow.filter_table(filters, layers, options);

        self.filtered_indices_cpu = Some(Arc::clone(&shadow.filtered_indices));
        self.filter_record_cpu = Some(shadow.filter_record.clone());
        shadow
    }

    /// Sort by a column and keep the result on the table
    pub fn apply_sort(&mut self, column: &str, mode: SortMode) -> &SortState {
        self.sort = sort_table_by_column(self, column, mode);
        &self.sort
    }
}
