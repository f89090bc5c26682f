//! Bipartite constraint structure between keys and storage slots.
//!
//! Each key becomes one hyperedge over the vertices (slots) it hashes to.
//! The graph is stored flat: a per-vertex degree array plus a CSR incidence
//! list (offsets into one shared edge-id buffer), built in a single O(n·k)
//! pass.
use std::collections::HashSet;

use crate::{error::Error, hashing::PositionSet};

/// Hyperedges of an encode call over `vertices` storage slots.
pub(crate) struct Hypergraph {
    vertices: usize,
    edges: Vec<PositionSet>,
    degree: Vec<u32>,
    offsets: Vec<u32>,
    incident: Vec<u32>,
}

impl Hypergraph {
    /// Build degree and incidence arrays from per-edge position sets.
    pub(crate) fn build(edges: Vec<PositionSet>, vertices: usize) -> Self {
        let mut degree = vec![0_u32; vertices];
        for edge in &edges {
            for v in edge.iter() {
                degree[v as usize] += 1;
            }
        }
        let mut offsets = vec![0_u32; vertices + 1];
        for v in 0..vertices {
            offsets[v + 1] = offsets[v] + degree[v];
        }
        let mut cursor = offsets[..vertices].to_vec();
        let mut incident = vec![0_u32; offsets[vertices] as usize];
        for (e, edge) in edges.iter().enumerate() {
            for v in edge.iter() {
                incident[cursor[v as usize] as usize] = e as u32;
                cursor[v as usize] += 1;
            }
        }
        Self {
            vertices,
            edges,
            degree,
            offsets,
            incident,
        }
    }

    pub(crate) fn vertex_count(&self) -> usize {
        self.vertices
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Initial degree of every vertex (number of incident hyperedges).
    pub(crate) fn degrees(&self) -> &[u32] {
        &self.degree
    }

    /// Ids of the hyperedges incident to `v`.
    pub(crate) fn incident(&self, v: u32) -> &[u32] {
        let lo = self.offsets[v as usize] as usize;
        let hi = self.offsets[v as usize + 1] as usize;
        &self.incident[lo..hi]
    }

    /// Positions of hyperedge `e`.
    pub(crate) fn positions(&self, e: u32) -> &PositionSet {
        &self.edges[e as usize]
    }
}

/// Reject oversized maps and duplicate keys before any hashing work is
/// spent on them.
pub(crate) fn validate_keys<K: AsRef<[u8]>>(keys: &[K], capacity: usize) -> Result<(), Error> {
    if keys.len() > capacity {
        return Err(Error::Capacity {
            capacity,
            got: keys.len(),
        });
    }
    let mut seen = HashSet::with_capacity(keys.len());
    for key in keys {
        if !seen.insert(key.as_ref()) {
            return Err(Error::Configuration(
                "keys of one encode call must be pairwise distinct".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_degrees_and_incidence() {
        // Edges a:{0,3}, b:{1,3}, c:{1,4} over 6 vertices.
        let edges = vec![
            PositionSet::from_slice(&[0, 3]),
            PositionSet::from_slice(&[1, 3]),
            PositionSet::from_slice(&[1, 4]),
        ];
        let graph = Hypergraph::build(edges, 6);
        assert_eq!(&[1, 2, 0, 2, 1, 0], graph.degrees());
        assert_eq!(&[0], graph.incident(0));
        assert_eq!(&[1, 2], graph.incident(1));
        assert_eq!(&[0, 1], graph.incident(3));
        assert_eq!(&[2], graph.incident(4));
        assert!(graph.incident(2).is_empty());
        assert_eq!(3, graph.edge_count());
        assert_eq!(6, graph.vertex_count());
    }

    #[test]
    fn test_validate_rejects_over_capacity() {
        let keys = [b"a", b"b", b"c"];
        assert!(matches!(
            validate_keys(&keys, 2),
            Err(Error::Capacity { capacity: 2, got: 3 })
        ));
        assert!(validate_keys(&keys, 3).is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let keys = [b"a".to_vec(), b"b".to_vec(), b"a".to_vec()];
        assert!(matches!(
            validate_keys(&keys, 10),
            Err(Error::Configuration(_))
        ));
    }
}
