//! Pairs the processes of two id-sorted snapshots.
//!
//! This is a forward-only merge, linear in the size of both inputs. Both
//! sides must be ascending by id; with unsorted input the cursor skips past
//! valid matches. [`Snapshot`](crate::sample::Snapshot) guarantees the order.

use crate::sample::{ProcessId, ProcessSample};

/// Anything carrying an optional process identity. Entries without one are
/// skipped on both sides.
pub trait Identified {
    fn identity(&self) -> Option<ProcessId>;
}

impl Identified for ProcessSample {
    fn identity(&self) -> Option<ProcessId> {
        Some(self.id())
    }
}

impl<T: Identified> Identified for Option<T> {
    fn identity(&self) -> Option<ProcessId> {
        self.as_ref().and_then(Identified::identity)
    }
}

/// A current entry and the previous entry with the same id, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aligned<'a, T> {
    pub current: &'a T,
    pub previous: Option<&'a T>,
}

/// Cursor over the previous snapshot. It only ever moves forward.
#[derive(Debug)]
pub struct Aligner<'a, T> {
    previous: &'a [T],
    cursor: usize,
}

impl<'a, T: Identified> Aligner<'a, T> {
    pub fn new(previous: &'a [T]) -> Self {
        Self {
            previous,
            cursor: 0,
        }
    }

    /// Find the previous entry for `id`. Ids must be asked for in ascending
    /// order; once the cursor is past the end every lookup misses.
    pub fn find(&mut self, id: ProcessId) -> Option<&'a T> {
        while let Some(candidate) = self.previous.get(self.cursor) {
            match candidate.identity() {
                Some(prev) if prev > id => return None,
                Some(prev) if prev == id => {
                    self.cursor += 1;
                    return Some(candidate);
                }
                _ => self.cursor += 1,
            }
        }
        None
    }
}

/// Align every identified entry of `current` against `previous`.
pub fn align<'a, T: Identified>(current: &'a [T], previous: &'a [T]) -> Vec<Aligned<'a, T>> {
    let mut aligner = Aligner::new(previous);
    current
        .iter()
        .filter_map(|entry| {
            let id = entry.identity()?;
            Some(Aligned {
                current: entry,
                previous: aligner.find(id),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(ids: &[u32]) -> Vec<ProcessSample> {
        ids.iter()
            .map(|&id| ProcessSample::new(id, format!("p{id}")))
            .collect()
    }

    fn pairs(aligned: &[Aligned<'_, ProcessSample>]) -> Vec<(u32, Option<u32>)> {
        aligned
            .iter()
            .map(|a| (a.current.id().0, a.previous.map(|p| p.id().0)))
            .collect()
    }

    macro_rules! align_tests {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (current, previous, expected): (&[u32], &[u32], Vec<(u32, Option<u32>)>) = $value;
                    let current = samples(current);
                    let previous = samples(previous);
                    let aligned = align(&current, &previous);
                    assert_eq!(pairs(&aligned), expected, stringify!($name));
                }
            )*
        }
    }

    align_tests! {
        identical_snapshots: (
            &[1, 2, 3],
            &[1, 2, 3],
            vec![(1, Some(1)), (2, Some(2)), (3, Some(3))],
        ),
        empty_previous_makes_everything_new: (
            &[1, 2],
            &[],
            vec![(1, None), (2, None)],
        ),
        empty_current: (
            &[],
            &[1, 2],
            vec![],
        ),
        exited_processes_are_ignored: (
            &[2, 5],
            &[1, 2, 3, 4, 5, 6],
            vec![(2, Some(2)), (5, Some(5))],
        ),
        new_processes_in_gaps: (
            &[1, 2, 4, 7],
            &[1, 3, 4, 6],
            vec![(1, Some(1)), (2, None), (4, Some(4)), (7, None)],
        ),
        cursor_past_the_end: (
            &[10, 20, 30],
            &[5, 10],
            vec![(10, Some(10)), (20, None), (30, None)],
        ),
        disjoint: (
            &[2, 4],
            &[1, 3, 5],
            vec![(2, None), (4, None)],
        ),
    }

    #[test]
    fn every_shared_id_matches_exactly_once() {
        let current = samples(&[0, 3, 4, 8, 9, 15, 16, 23]);
        let previous = samples(&[1, 3, 4, 5, 9, 10, 16, 22, 23, 40]);
        let aligned = align(&current, &previous);
        for a in &aligned {
            let in_previous = previous.iter().any(|p| p.id() == a.current.id());
            assert_eq!(a.previous.is_none(), !in_previous, "pid {}", a.current.id());
            if let Some(p) = a.previous {
                assert_eq!(p.id(), a.current.id());
            }
        }
        let matched = aligned.iter().filter(|a| !a.previous.is_none()).count();
        assert_eq!(matched, 5);
    }

    #[test]
    fn absent_entries_are_skipped() {
        let current = vec![
            Some(ProcessSample::new(1, "a")),
            None,
            Some(ProcessSample::new(3, "c")),
        ];
        let previous = vec![None, Some(ProcessSample::new(1, "a")), Some(ProcessSample::new(3, "c"))];
        let aligned = align(&current, &previous);
        assert_eq!(aligned.len(), 2);
        assert!(aligned.iter().all(|a| !a.previous.is_none()));
    }

    #[test]
    fn unsorted_current_misses_matches() {
        // Sorting is the caller's job; this pins down what happens otherwise.
        let current = samples(&[3, 1]);
        let previous = samples(&[1, 3]);
        let aligned = align(&current, &previous);
        assert_eq!(pairs(&aligned), vec![(3, Some(3)), (1, None)]);
    }
}
