//! Assigning slot values so every key constraint holds.
//!
//! The elimination order from peeling is replayed in reverse: each step
//! owns a pivot slot no later-eliminated constraint touches, so setting
//! `storage[pivot] = target - combine(rest)` can never invalidate a
//! constraint that was already satisfied. The residual hyperedges of the
//! dense-band strategy are solved first by Gaussian elimination over GF(2),
//! since their position sets overlap arbitrarily.
use crate::{algebra::ValueAlgebra, error::Error, graph::Hypergraph};

/// Replay `order` in reverse, assigning each pivot so the hyperedge's
/// constraint is met against the current storage content.
pub(crate) fn back_substitute<A: ValueAlgebra>(
    algebra: &A,
    storage: &mut [A::Value],
    graph: &Hypergraph,
    order: &[(u32, u32)],
    targets: &[A::Value],
) {
    for &(e, v) in order.iter().rev() {
        let mut partial = algebra.identity();
        for u in graph.positions(e).iter() {
            if u != v {
                partial = algebra.combine(&partial, &storage[u as usize]);
            }
        }
        storage[v as usize] =
            algebra.combine(&targets[e as usize], &algebra.invert(&partial));
    }
}

/// Combine the stored values at the positions of `e`. Shared by the decode
/// path and post-substitution verification.
pub(crate) fn combine_positions<A: ValueAlgebra>(
    algebra: &A,
    storage: &[A::Value],
    graph: &Hypergraph,
    e: u32,
) -> A::Value {
    let mut acc = algebra.identity();
    for u in graph.positions(e).iter() {
        acc = algebra.combine(&acc, &storage[u as usize]);
    }
    acc
}

/// Solve the residual sub-system by Gaussian elimination over GF(2) and
/// write the solution into `storage`.
///
/// Constraint coefficients are 0/1 (a slot is in a position set or not),
/// so row combination is XOR of position masks plus `combine` of the
/// right-hand sides. That is only a valid row operation in self-inverse
/// domains, which the engine configuration guarantees before ever
/// selecting this path. Unconstrained unknowns keep whatever the storage
/// already holds.
pub(crate) fn gaussian_solve<A: ValueAlgebra>(
    algebra: &A,
    storage: &mut [A::Value],
    graph: &Hypergraph,
    residual: &[u32],
    targets: &[A::Value],
) -> Result<(), Error> {
    if residual.is_empty() {
        return Ok(());
    }
    debug_assert!(algebra.self_inverse());

    // Local indexing of the unknowns touched by the residual.
    let mut unknowns: Vec<u32> = residual
        .iter()
        .flat_map(|&e| graph.positions(e).iter())
        .collect();
    unknowns.sort_unstable();
    unknowns.dedup();
    let column_of = |v: u32| {
        unknowns
            .binary_search(&v)
            .expect("residual vertex is an unknown")
    };

    let words = unknowns.len().div_ceil(64);
    // Gauss-Jordan: kept rows never contain another row's pivot column.
    let mut rows: Vec<(Vec<u64>, A::Value)> = Vec::with_capacity(residual.len());
    let mut row_pivot: Vec<usize> = Vec::with_capacity(residual.len());
    let mut column_owner: Vec<Option<usize>> = vec![None; unknowns.len()];

    for &e in residual {
        let mut mask = vec![0_u64; words];
        for u in graph.positions(e).iter() {
            let c = column_of(u);
            mask[c / 64] |= 1 << (c % 64);
        }
        let mut rhs = targets[e as usize].clone();
        // Clear every owned column, ascending. A kept row holds its own
        // pivot and free columns only, so reductions never introduce a
        // column that would need clearing.
        for c in 0..unknowns.len() {
            if mask[c / 64] & (1 << (c % 64)) == 0 {
                continue;
            }
            if let Some(r) = column_owner[c] {
                let (other_mask, other_rhs) = &rows[r];
                for (w, o) in mask.iter_mut().zip(other_mask) {
                    *w ^= o;
                }
                rhs = algebra.combine(&rhs, other_rhs);
            }
        }
        let pivot = set_bits(&mask).next();
        match pivot {
            Some(pivot) => {
                // Knock the fresh pivot out of every earlier row.
                for (other_mask, other_rhs) in rows.iter_mut() {
                    if other_mask[pivot / 64] & (1 << (pivot % 64)) != 0 {
                        for (o, w) in other_mask.iter_mut().zip(&mask) {
                            *o ^= w;
                        }
                        *other_rhs = algebra.combine(other_rhs, &rhs);
                    }
                }
                column_owner[pivot] = Some(rows.len());
                row_pivot.push(pivot);
                rows.push((mask, rhs));
            }
            None => {
                // Linearly dependent constraint: consistent only if the
                // reduced right-hand side vanished too.
                if rhs != algebra.identity() {
                    return Err(Error::ConstructionFailure {
                        residual: residual.len(),
                    });
                }
            }
        }
    }

    // Every non-pivot column of a kept row is free and never written, so
    // each pivot slot is its row's right-hand side folded with the current
    // contents of those columns.
    for ((mask, rhs), pivot) in rows.iter().zip(&row_pivot) {
        let mut value = rhs.clone();
        for c in set_bits(mask) {
            if c != *pivot {
                value = algebra.combine(&value, &storage[unknowns[c] as usize]);
            }
        }
        storage[unknowns[*pivot] as usize] = value;
    }
    Ok(())
}

/// Indices of the set bits of a multi-word mask, ascending.
fn set_bits(mask: &[u64]) -> impl Iterator<Item = usize> + '_ {
    mask.iter().enumerate().flat_map(|(w, &bits)| {
        let mut bits = bits;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let b = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(w * 64 + b)
        })
    })
}
