//! Dependency graph between cells.
//!
//! Edges are kept in both directions: `precedents` (the cells a formula
//! reads) and `dependents` (the cells that read a given position). The two
//! maps are mirrors and only [`DependencyGraph::set_precedents`] writes them.
//!
//! Dependents are keyed by position, not by cell, so a reader of a cleared
//! position is still found when that position gets new content.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use tabula_engine::formula::Position;

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    precedents: HashMap<Position, BTreeSet<Position>>,
    dependents: HashMap<Position, BTreeSet<Position>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positions `pos` reads from, in row-major order.
    pub fn precedents(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        self.precedents.get(&pos).into_iter().flatten().copied()
    }

    /// Positions that read from `pos`, in row-major order.
    pub fn dependents(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        self.dependents.get(&pos).into_iter().flatten().copied()
    }

    /// Replace the outgoing edges of `pos` with `refs`, updating the mirror
    /// edges of only those targets that were added or dropped.
    pub fn set_precedents(&mut self, pos: Position, refs: &[Position]) {
        let new: BTreeSet<Position> = refs.iter().copied().collect();
        let old = self.precedents.remove(&pos).unwrap_or_default();

        for &added in new.difference(&old) {
            self.dependents.entry(added).or_default().insert(pos);
        }
        for &dropped in old.difference(&new) {
            if let Some(readers) = self.dependents.get_mut(&dropped) {
                readers.remove(&pos);
                if readers.is_empty() {
                    self.dependents.remove(&dropped);
                }
            }
        }

        if !new.is_empty() {
            self.precedents.insert(pos, new);
        }
    }

    /// Drop every outgoing edge of `pos`. Edges into `pos` are kept.
    pub fn remove_precedents(&mut self, pos: Position) {
        self.set_precedents(pos, &[]);
    }

    /// `pos` followed by every position that transitively reads from it,
    /// breadth-first, each exactly once.
    pub fn affected_by(&self, pos: Position) -> Vec<Position> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([pos]);
        let mut order = Vec::new();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            order.push(current);
            queue.extend(self.dependents(current).filter(|d| !visited.contains(d)));
        }

        order
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.precedents.values().map(BTreeSet::len).sum()
    }

    /// Whether the two edge maps mirror each other exactly.
    pub fn is_consistent(&self) -> bool {
        let backward_len: usize = self.dependents.values().map(BTreeSet::len).sum();

        backward_len == self.edge_count()
            && self.precedents.iter().all(|(from, tos)| {
                tos.iter().all(|to| {
                    self.dependents
                        .get(to)
                        .is_some_and(|readers| readers.contains(from))
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn test_set_precedents_mirrors_edges() {
        let mut graph = DependencyGraph::new();
        graph.set_precedents(p(0, 0), &[p(1, 0), p(2, 0)]);

        assert_eq!(graph.precedents(p(0, 0)).collect::<Vec<_>>(), vec![p(1, 0), p(2, 0)]);
        assert_eq!(graph.dependents(p(1, 0)).collect::<Vec<_>>(), vec![p(0, 0)]);
        assert_eq!(graph.dependents(p(2, 0)).collect::<Vec<_>>(), vec![p(0, 0)]);
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_set_precedents_diffs_old_and_new() {
        let mut graph = DependencyGraph::new();
        graph.set_precedents(p(0, 0), &[p(1, 0), p(2, 0)]);
        graph.set_precedents(p(0, 1), &[p(2, 0)]);

        graph.set_precedents(p(0, 0), &[p(2, 0), p(3, 0)]);

        assert_eq!(graph.dependents(p(1, 0)).count(), 0);
        assert_eq!(
            graph.dependents(p(2, 0)).collect::<Vec<_>>(),
            vec![p(0, 0), p(0, 1)]
        );
        assert_eq!(graph.dependents(p(3, 0)).collect::<Vec<_>>(), vec![p(0, 0)]);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_remove_precedents_keeps_incoming_edges() {
        let mut graph = DependencyGraph::new();
        graph.set_precedents(p(0, 0), &[p(1, 0)]); // A1 reads A2
        graph.set_precedents(p(1, 0), &[p(2, 0)]); // A2 reads A3

        graph.remove_precedents(p(1, 0));

        assert_eq!(graph.precedents(p(1, 0)).count(), 0);
        assert_eq!(graph.dependents(p(2, 0)).count(), 0);
        assert_eq!(graph.dependents(p(1, 0)).collect::<Vec<_>>(), vec![p(0, 0)]);
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_affected_by_visits_each_once() {
        // Diamond: B1 and C1 read A1, D1 reads both.
        let mut graph = DependencyGraph::new();
        graph.set_precedents(p(0, 1), &[p(0, 0)]);
        graph.set_precedents(p(0, 2), &[p(0, 0)]);
        graph.set_precedents(p(0, 3), &[p(0, 1), p(0, 2)]);

        let affected = graph.affected_by(p(0, 0));
        assert_eq!(affected, vec![p(0, 0), p(0, 1), p(0, 2), p(0, 3)]);
    }
}
