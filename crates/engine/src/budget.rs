// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fair division of the per-cycle scan budget

/// Split `budget` across containers
///
/// `demands[i]` is how many objects container `i` still expects to inspect,
/// `None` when unknown. Known demands are granted in full first, smallest
/// first, as long as every other container that wants objects can still
/// get at least one; a container whose remaining sweep fits the budget then
/// finishes in the same cycle it would alone. What is left is split by
/// max-min fairness: each container receives at most its demand and the
/// unused remainder is shared among the rest. When fewer objects remain
/// than containers, single-object shares go round-robin starting at
/// `rotation`.
pub fn fair_shares(budget: usize, demands: &[Option<usize>], rotation: usize) -> Vec<usize> {
    let mut shares = vec![0; demands.len()];
    let mut wanted: Vec<usize> = demands.iter().map(|d| d.unwrap_or(usize::MAX)).collect();
    let mut remaining = budget;

    let mut known: Vec<usize> = (0..demands.len())
        .filter(|&i| matches!(demands[i], Some(d) if d > 0))
        .collect();
    known.sort_by_key(|&i| wanted[i]);
    let mut unserved = wanted.iter().filter(|&&w| w > 0).count();
    for i in known {
        let others = unserved - 1;
        match wanted[i].checked_add(others) {
            Some(needed) if needed <= remaining => {
                shares[i] = wanted[i];
                remaining -= wanted[i];
                wanted[i] = 0;
                unserved -= 1;
            }
            _ => break,
        }
    }

    let mut active: Vec<usize> = (0..demands.len()).collect();
    loop {
        active.retain(|&i| wanted[i] > 0);
        if active.is_empty() || remaining == 0 {
            break;
        }

        let share = remaining / active.len();
        if share == 0 {
            let start = rotation % active.len();
            for k in 0..remaining {
                shares[active[(start + k) % active.len()]] += 1;
            }
            break;
        }

        for &i in &active {
            let give = share.min(wanted[i]);
            shares[i] += give;
            wanted[i] -= give;
            remaining -= give;
        }
    }

    shares
}

#[cfg(test)]
#[path = "budget_tests.rs"]
mod tests;
