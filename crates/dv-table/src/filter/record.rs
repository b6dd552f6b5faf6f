//! Classification of active filters and change detection between applications

use dv_core::FilterDescriptor;
use std::collections::BTreeMap;

use crate::config::FilterOptions;
use crate::filter::gpu::GpuFilterState;

/// The groups a filter is sorted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterGroup {
    /// Filters that drive domain recomputation
    DynamicDomain,
    /// Filters whose range is fixed and never moves the domain
    FixedDomain,
    /// Filters evaluated on the CPU
    Cpu,
    /// Filters evaluated on the device only
    Gpu,
}

/// Active filters of one table, by group. A filter appears in exactly one of
/// `dynamic_domain`/`fixed_domain` and exactly one of `cpu`/`gpu`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRecord {
    pub dynamic_domain: Vec<FilterDescriptor>,
    pub fixed_domain: Vec<FilterDescriptor>,
    pub cpu: Vec<FilterDescriptor>,
    pub gpu: Vec<FilterDescriptor>,
}

impl FilterRecord {
    /// Sort the valid filters that name `table_id` into groups.
    ///
    /// A gpu-flagged filter only lands in `gpu` when `device` holds a channel
    /// for it; every other filter is evaluated on the CPU.
    pub fn classify(
        table_id: &str,
        filters: &[FilterDescriptor],
        options: FilterOptions,
        device: &GpuFilterState,
    ) -> Self {
        let mut record = Self::default();

        for filter in filters
            .iter()
            .filter(|f| f.is_valid() && f.applies_to(table_id))
        {
            if filter.fixed_domain || options.ignore_domain {
                record.fixed_domain.push(filter.clone());
            } else {
                record.dynamic_domain.push(filter.clone());
            }

            if filter.gpu && !options.cpu_only && device.has_channel(&filter.id) {
                record.gpu.push(filter.clone());
            } else {
                record.cpu.push(filter.clone());
            }
        }

        record
    }

    pub fn group(&self, group: FilterGroup) -> &[FilterDescriptor] {
        match group {
            FilterGroup::DynamicDomain => &self.dynamic_domain,
            FilterGroup::FixedDomain => &self.fixed_domain,
            FilterGroup::Cpu => &self.cpu,
            FilterGroup::Gpu => &self.gpu,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dynamic_domain.is_empty() && self.fixed_domain.is_empty()
    }

    /// What changed, group by group, since `old` was applied
    pub fn diff(&self, old: &FilterRecord) -> FilterChanges {
        FilterChanges {
            dynamic_domain: diff_group(&self.dynamic_domain, &old.dynamic_domain),
            fixed_domain: diff_group(&self.fixed_domain, &old.fixed_domain),
            cpu: diff_group(&self.cpu, &old.cpu),
            gpu: diff_group(&self.gpu, &old.gpu),
        }
    }
}

/// How a single filter differs from its previous application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterChange {
    Added,
    Deleted,
    DataIdChanged,
    NameChanged,
    ValueChanged,
    /// Field index, layers or missing-value handling changed
    ConfigChanged,
}

fn compare_filters(new: &FilterDescriptor, old: &FilterDescriptor) -> Option<FilterChange> {
    if new.data_id != old.data_id {
        Some(FilterChange::DataIdChanged)
    } else if new.name != old.name {
        Some(FilterChange::NameChanged)
    } else if new.value != old.value || new.filter_type != old.filter_type {
        Some(FilterChange::ValueChanged)
    } else if new.field_idx != old.field_idx
        || new.layer_id != old.layer_id
        || new.include_missing != old.include_missing
    {
        Some(FilterChange::ConfigChanged)
    } else {
        None
    }
}

fn diff_group(new: &[FilterDescriptor], old: &[FilterDescriptor]) -> BTreeMap<String, FilterChange> {
    let mut changes = BTreeMap::new();

    for filter in new {
        match old.iter().find(|f| f.id == filter.id) {
            None => {
                changes.insert(filter.id.clone(), FilterChange::Added);
            }
            Some(previous) => {
                if let Some(change) = compare_filters(filter, previous) {
                    changes.insert(filter.id.clone(), change);
                }
            }
        }
    }

    for previous in old {
        if !new.iter().any(|f| f.id == previous.id) {
            changes.insert(previous.id.clone(), FilterChange::Deleted);
        }
    }

    changes
}

/// Per-group changes keyed by filter id; an empty map means the group is unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChanges {
    pub dynamic_domain: BTreeMap<String, FilterChange>,
    pub fixed_domain: BTreeMap<String, FilterChange>,
    pub cpu: BTreeMap<String, FilterChange>,
    pub gpu: BTreeMap<String, FilterChange>,
}

impl FilterChanges {
    pub fn dynamic_domain_changed(&self) -> bool {
        !self.dynamic_domain.is_empty()
    }

    pub fn cpu_changed(&self) -> bool {
        !self.cpu.is_empty()
    }

    pub fn group(&self, group: FilterGroup) -> &BTreeMap<String, FilterChange> {
        match group {
            FilterGroup::DynamicDomain => &self.dynamic_domain,
            FilterGroup::FixedDomain => &self.fixed_domain,
            FilterGroup::Cpu => &self.cpu,
            FilterGroup::Gpu => &self.gpu,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dynamic_domain.is_empty()
            && self.fixed_domain.is_empty()
            && self.cpu.is_empty()
            && self.gpu.is_empty()
    }
}
