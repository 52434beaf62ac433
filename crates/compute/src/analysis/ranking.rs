use foundation::EntityId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub id: EntityId,
    pub value: f64,
}

/// Effective bar count for a requested limit: `0` means all, otherwise
/// clamped to `[1, available]`.
pub fn effective_limit(requested: usize, available: usize) -> usize {
    if requested == 0 {
        available
    } else {
        requested.clamp(1, available.max(1)).min(available)
    }
}

/// Descending by value, missing values excluded. Ties keep input order.
pub fn rank(values: &[(EntityId, f64)], limit: usize) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = values
        .iter()
        .filter(|(_, v)| !v.is_nan())
        .map(|(id, v)| RankedEntry {
            id: id.clone(),
            value: *v,
        })
        .collect();
    ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
    ranked.truncate(effective_limit(limit, ranked.len()));
    ranked
}
