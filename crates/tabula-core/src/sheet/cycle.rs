//! Circular dependency detection for formula cells.
//!
//! When a formula is entered, we must verify it doesn't create a cycle
//! (e.g., A1 references B1, B1 references C1, C1 references A1).
//! This module uses an iterative depth-first search so that long reference
//! chains cannot overflow the stack.

use std::collections::HashMap;

use tabula_engine::formula::Position;

use super::Cell;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current DFS path.
    Active,
    /// Fully explored; reaching it again is a diamond, not a cycle.
    Done,
}

/// Detect circular dependencies reachable from `start`.
///
/// Referenced positions with no cell get an empty placeholder cell; each one
/// created is recorded in `placeholders` so a rejected edit can remove them.
/// Returns `Some(cycle_path)` if a cycle is found, `None` otherwise. The path
/// starts and ends at the same position.
pub fn detect_cycle(
    start: Position,
    cells: &mut HashMap<Position, Cell>,
    placeholders: &mut Vec<Position>,
) -> Option<Vec<Position>> {
    let mut marks = HashMap::from([(start, Mark::Active)]);
    // Each frame is a position and the index of the next reference to follow.
    let mut path: Vec<(Position, usize)> = vec![(start, 0)];

    while let Some(frame) = path.last_mut() {
        let (current, index) = *frame;
        let next = cells
            .get(&current)
            .and_then(|cell| cell.referenced_cells().get(index).copied());

        let Some(next) = next else {
            marks.insert(current, Mark::Done);
            path.pop();
            continue;
        };
        frame.1 += 1;

        match marks.get(&next) {
            Some(Mark::Active) => {
                let mut cycle: Vec<Position> = path
                    .iter()
                    .map(|(pos, _)| *pos)
                    .skip_while(|pos| *pos != next)
                    .collect();
                cycle.push(next);
                return Some(cycle);
            }
            Some(Mark::Done) => {}
            None => {
                if !cells.contains_key(&next) {
                    cells.insert(next, Cell::new_empty());
                    placeholders.push(next);
                }
                marks.insert(next, Mark::Active);
                path.push((next, 0));
            }
        }
    }

    None
}
