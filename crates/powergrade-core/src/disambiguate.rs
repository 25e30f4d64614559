//! Candidate selection.
//!
//! Tiers, first non-empty wins: candidates whose role equals the desired role,
//! then `unknown` candidates, then every candidate. Within a tier the value
//! closest to the oracle is chosen; equal distances go to the earliest offset.

use crate::domain::{Candidate, Role};

/// Select the best candidate, or `None` when there are no candidates.
pub fn resolve(candidates: &[Candidate], desired: Role, oracle: f64) -> Option<&Candidate> {
    let tiers: [&dyn Fn(&Candidate) -> bool; 3] = [
        &|c: &Candidate| c.role == desired,
        &|c: &Candidate| c.role == Role::Unknown,
        &|_: &Candidate| true,
    ];

    tiers.iter().find_map(|in_tier| {
        candidates
            .iter()
            .filter(|c| in_tier(*c))
            .min_by(|a, b| {
                (a.value - oracle)
                    .abs()
                    .total_cmp(&(b.value - oracle).abs())
                    .then(a.offset.cmp(&b.offset))
            })
    })
}
