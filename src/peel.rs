//! Peeling-based elimination ordering.
//!
//! Degree-1 peeling removes hyperedges that own a vertex no other live
//! hyperedge touches; each removal can free further vertices, so the loop
//! runs off a queue of degree-1 vertices. What survives is the 2-core:
//! every remaining vertex lies on at least two live hyperedges. The [`Okvs`]
//! configuration picks one [`ResidualStrategy`] to deal with that core.
//!
//! [`Okvs`]: crate::Okvs
use crate::{error::Error, graph::Hypergraph};

/// How the residual 2-core left over after degree-1 peeling is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidualStrategy {
    /// Fail encoding whenever the residual is non-empty. For parameter
    /// choices where an empty 2-core is overwhelmingly likely, retrying
    /// with a fresh seed is cheaper than any recovery machinery.
    TwoCoreFail,
    /// Give every key an extra coordinate in a wide dense band. Band
    /// vertices are near-unique per key, so residual hyperedges usually
    /// become singletons there and peel like any other edge; whatever still
    /// remains is solved by Gaussian elimination over the small residual
    /// sub-system. Requires a self-inverse value domain.
    DenseBand,
    /// Walk residual cycle components depth-first, pivoting each hyperedge
    /// on the vertex through which the walk enters it. The closing
    /// constraint of each cycle is re-checked after back-substitution and
    /// fails encoding (recoverably) when the cycle is inconsistent.
    DfsCycle,
}

/// A total elimination order plus the residual work the back-substitution
/// phase has to do before replaying it.
#[derive(Debug)]
pub(crate) struct Elimination {
    /// `(hyperedge, pivot vertex)` pairs in elimination order. Back-
    /// substitution replays this in reverse.
    pub(crate) order: Vec<(u32, u32)>,
    /// Residual hyperedges handed to the dense Gaussian solve, which runs
    /// before the reverse replay of `order`.
    pub(crate) gaussian: Vec<u32>,
    /// Hyperedges whose constraints must be re-checked once storage is
    /// fully built (cycle closings are not implied by the order).
    pub(crate) verify: Vec<u32>,
}

/// Per-call peeling state: mutable degrees, the degree-1 queue and the
/// pivot bookkeeping. One instance per encode call, never shared.
pub(crate) struct Peeler<'g> {
    graph: &'g Hypergraph,
    degree: Vec<u32>,
    peeled: Vec<bool>,
    is_pivot: Vec<bool>,
    queue: Vec<u32>,
}

impl<'g> Peeler<'g> {
    pub(crate) fn new(graph: &'g Hypergraph) -> Self {
        let degree = graph.degrees().to_vec();
        let queue = (0..graph.vertex_count() as u32)
            .filter(|&v| degree[v as usize] == 1)
            .collect();
        Self {
            graph,
            degree,
            peeled: vec![false; graph.edge_count()],
            is_pivot: vec![false; graph.vertex_count()],
            queue,
        }
    }

    /// Compute the elimination order, resolving the residual core with
    /// `strategy`.
    pub(crate) fn run(mut self, strategy: ResidualStrategy) -> Result<Elimination, Error> {
        let mut order = Vec::with_capacity(self.graph.edge_count());
        self.peel(&mut order);

        let residual: Vec<u32> = (0..self.graph.edge_count() as u32)
            .filter(|&e| !self.peeled[e as usize])
            .collect();
        let mut gaussian = Vec::new();
        let mut verify = Vec::new();
        if !residual.is_empty() {
            match strategy {
                ResidualStrategy::TwoCoreFail => {
                    return Err(Error::ConstructionFailure {
                        residual: residual.len(),
                    });
                }
                ResidualStrategy::DenseBand => gaussian = residual,
                ResidualStrategy::DfsCycle => {
                    self.walk_cycles(&residual, &mut order, &mut verify)?;
                }
            }
        }
        Ok(Elimination {
            order,
            gaussian,
            verify,
        })
    }

    /// Degree-1 peeling.
    fn peel(&mut self, order: &mut Vec<(u32, u32)>) {
        while let Some(v) = self.queue.pop() {
            if self.degree[v as usize] != 1 {
                // Stale queue entry, the vertex lost its last edge meanwhile.
                continue;
            }
            let e = self
                .graph
                .incident(v)
                .iter()
                .copied()
                .find(|&e| !self.peeled[e as usize])
                .expect("degree-1 vertex has exactly one live edge");
            self.take(e, v);
            order.push((e, v));
            for u in self.graph.positions(e).iter() {
                if u != v && self.degree[u as usize] == 1 {
                    self.queue.push(u);
                }
            }
        }
    }

    /// Resolve residual cycle components by a depth-first walk. Every edge
    /// taken here lands on the verify list; a component without a fresh
    /// pivot for one of its edges cannot be ordered at all.
    fn walk_cycles(
        &mut self,
        residual: &[u32],
        order: &mut Vec<(u32, u32)>,
        verify: &mut Vec<u32>,
    ) -> Result<(), Error> {
        for &start in residual {
            if self.peeled[start as usize] {
                continue;
            }
            let Some(mut v) = self
                .graph
                .positions(start)
                .iter()
                .find(|&v| !self.is_pivot[v as usize])
            else {
                let unresolved = residual
                    .iter()
                    .filter(|&&e| !self.peeled[e as usize])
                    .count();
                return Err(Error::ConstructionFailure {
                    residual: unresolved,
                });
            };
            let mut e = start;
            loop {
                self.take(e, v);
                order.push((e, v));
                verify.push(e);
                let next = self.graph.positions(e).iter().find_map(|u| {
                    if u == v || self.is_pivot[u as usize] {
                        return None;
                    }
                    self.graph
                        .incident(u)
                        .iter()
                        .copied()
                        .find(|&e2| !self.peeled[e2 as usize])
                        .map(|e2| (e2, u))
                });
                match next {
                    Some((e2, u)) => {
                        e = e2;
                        v = u;
                    }
                    None => break,
                }
            }
        }
        let unresolved = residual
            .iter()
            .filter(|&&e| !self.peeled[e as usize])
            .count();
        if unresolved > 0 {
            return Err(Error::ConstructionFailure {
                residual: unresolved,
            });
        }
        Ok(())
    }

    /// Mark `e` eliminated with pivot `v` and update degrees.
    fn take(&mut self, e: u32, v: u32) {
        self.peeled[e as usize] = true;
        self.is_pivot[v as usize] = true;
        for u in self.graph.positions(e).iter() {
            self.degree[u as usize] -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::PositionSet;

    fn graph(edges: &[&[u32]], vertices: usize) -> Hypergraph {
        let edges = edges.iter().map(|e| PositionSet::from_slice(e)).collect();
        Hypergraph::build(edges, vertices)
    }

    /// Every edge exactly once, pivot among its own positions, and no
    /// non-pivot vertex of an edge is the pivot of an earlier edge.
    fn assert_valid_order(graph: &Hypergraph, order: &[(u32, u32)], skip_freshness: &[u32]) {
        let mut seen_edges = vec![false; graph.edge_count()];
        let mut pivot_index = vec![usize::MAX; graph.vertex_count()];
        for (i, &(e, v)) in order.iter().enumerate() {
            assert!(!seen_edges[e as usize], "edge {e} ordered twice");
            seen_edges[e as usize] = true;
            assert!(graph.positions(e).contains(v), "pivot {v} not in edge {e}");
            assert_eq!(usize::MAX, pivot_index[v as usize], "vertex {v} pivoted twice");
            pivot_index[v as usize] = i;
        }
        assert!(seen_edges.iter().all(|&s| s), "order is not a permutation");
        for (i, &(e, v)) in order.iter().enumerate() {
            if skip_freshness.contains(&e) {
                continue;
            }
            for u in graph.positions(e).iter() {
                if u != v && pivot_index[u as usize] != usize::MAX {
                    assert!(
                        pivot_index[u as usize] > i,
                        "edge {e}: vertex {u} pivoted before it"
                    );
                }
            }
        }
    }

    #[test]
    fn test_peels_acyclic_system_completely() {
        // a:{0,3}, b:{1,3}, c:{1,4} over 6 vertices peels in full.
        let graph = graph(&[&[0, 3], &[1, 3], &[1, 4]], 6);
        let elim = Peeler::new(&graph).run(ResidualStrategy::TwoCoreFail).unwrap();
        assert_eq!(3, elim.order.len());
        assert!(elim.gaussian.is_empty());
        assert!(elim.verify.is_empty());
        assert_valid_order(&graph, &elim.order, &[]);
    }

    #[test]
    fn test_two_core_fail_on_cycle() {
        let graph = graph(&[&[0, 1], &[1, 2], &[2, 0]], 3);
        let err = Peeler::new(&graph).run(ResidualStrategy::TwoCoreFail).unwrap_err();
        assert!(matches!(err, Error::ConstructionFailure { residual: 3 }));
    }

    #[test]
    fn test_dfs_orders_cycle_for_verification() {
        let graph = graph(&[&[0, 1], &[1, 2], &[2, 0]], 3);
        let elim = Peeler::new(&graph).run(ResidualStrategy::DfsCycle).unwrap();
        assert_eq!(3, elim.order.len());
        assert_eq!(3, elim.verify.len());
        assert_valid_order(&graph, &elim.order, &elim.verify);
    }

    #[test]
    fn test_dfs_peels_tail_then_walks_core() {
        // Edge 3 hangs off the cycle through vertex 3 and peels first.
        let graph = graph(&[&[0, 1], &[1, 2], &[2, 0], &[0, 3]], 4);
        let elim = Peeler::new(&graph).run(ResidualStrategy::DfsCycle).unwrap();
        assert_eq!(4, elim.order.len());
        assert_eq!((3, 3), elim.order[0]);
        assert_eq!(3, elim.verify.len());
        assert_valid_order(&graph, &elim.order, &elim.verify);
    }

    #[test]
    fn test_dense_band_singletons_peel() {
        // The sparse pairs form a cycle, but distinct dense coordinates
        // (vertices 3..6) break it without any Gaussian work.
        let graph = graph(&[&[0, 1, 3], &[1, 2, 4], &[2, 0, 5]], 6);
        let elim = Peeler::new(&graph).run(ResidualStrategy::DenseBand).unwrap();
        assert_eq!(3, elim.order.len());
        assert!(elim.gaussian.is_empty());
        assert_valid_order(&graph, &elim.order, &[]);
    }

    #[test]
    fn test_dense_band_collision_goes_to_gaussian() {
        // All three keys collide on dense vertex 3, so nothing peels.
        let graph = graph(&[&[0, 1, 3], &[1, 2, 3], &[2, 0, 3]], 4);
        let elim = Peeler::new(&graph).run(ResidualStrategy::DenseBand).unwrap();
        assert!(elim.order.is_empty());
        assert_eq!(vec![0, 1, 2], elim.gaussian);
    }

    #[test]
    fn test_duplicate_position_pair_two_core() {
        // Two keys hashing to the same sparse pair form a length-2 cycle.
        let graph = graph(&[&[0, 1], &[0, 1]], 2);
        let err = Peeler::new(&graph).run(ResidualStrategy::TwoCoreFail).unwrap_err();
        assert!(matches!(err, Error::ConstructionFailure { residual: 2 }));
    }
}
