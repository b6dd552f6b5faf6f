//! Single-pass scan producing the render and domain index sets

use dv_core::Row;

use super::evaluator::Predicate;

/// Predicates to evaluate, per output. `None` means the output is not
/// recomputed and the caller keeps its previous value.
#[derive(Debug, Default)]
pub struct PredicateGroups<'p, 'a> {
    /// Drives `filtered_indices_for_domain`
    pub dynamic_domain: Option<Vec<&'p Predicate<'a>>>,
    /// Drives `filtered_indices`
    pub cpu: Option<Vec<&'p Predicate<'a>>>,
}

/// Recomputed index sets; `None` for outputs whose group was not requested
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterResult {
    pub filtered_indices: Option<Vec<usize>>,
    pub filtered_indices_for_domain: Option<Vec<usize>>,
}

/// Scan `candidates` once, keeping each index in an output when every
/// predicate of that output's group matches. Order of `candidates` is kept.
pub fn apply_filters(candidates: &[usize], rows: &[Row], groups: &PredicateGroups<'_, '_>) -> FilterResult {
    if groups.dynamic_domain.is_none() && groups.cpu.is_none() {
        return FilterResult::default();
    }

    let mut for_domain = groups.dynamic_domain.as_ref().map(|_| Vec::new());
    let mut for_render = groups.cpu.as_ref().map(|_| Vec::new());

    for &index in candidates {
        let Some(row) = rows.get(index) else {
            continue;
        };

        if let (Some(predicates), Some(out)) = (&groups.dynamic_domain, for_domain.as_mut()) {
            if predicates.iter().all(|p| p.matches(row)) {
                out.push(index);
            }
        }

        if let (Some(predicates), Some(out)) = (&groups.cpu, for_render.as_mut()) {
            if predicates.iter().all(|p| p.matches(row)) {
                out.push(index);
            }
        }
    }

    tracing::debug!(
        "Filtered {} candidates: {:?} for render, {:?} for domain",
        candidates.len(),
        for_render.as_ref().map(Vec::len),
        for_domain.as_ref().map(Vec::len)
    );

    FilterResult {
        filtered_indices: for_render,
        filtered_indices_for_domain: for_domain,
    }
}
