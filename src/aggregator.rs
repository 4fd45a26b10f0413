use std::cmp::Ordering;
use std::collections::BinaryHeap;

use parking_lot::Mutex;

use crate::query::{CancelToken, SearchItem};

/// Total ranking order for finished result lists: descending score, then
/// ascending path, line number and start column.
///
/// Paths compare as plain strings (byte order of the OS string), not
/// component by component, so `a-b/x.txt` sorts before `a/x.txt`.
pub(crate) fn rank(a: &SearchItem, b: &SearchItem) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| path_bytes(a).cmp(path_bytes(b)))
        .then_with(|| a.line_number.cmp(&b.line_number))
        .then_with(|| a.column_start.cmp(&b.column_start))
}

fn path_bytes(item: &SearchItem) -> &[u8] {
    item.path.as_os_str().as_encoded_bytes()
}

/// Heap wrapper whose maximum is the worst-ranked item.
struct Ranked(SearchItem);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        rank(&self.0, &other.0) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        rank(&self.0, &other.0)
    }
}

struct Collected {
    best:    BinaryHeap<Ranked>,
    offered: usize,
}

/// Collects the matches of one session and keeps the best `cap` of them.
///
/// Workers offer batches tagged with the generation they were produced for;
/// batches from any other generation, or arriving after the session was
/// superseded, are dropped. Because only the worst item is evicted when the
/// cap overflows, the final list holds the highest-ranked matches regardless
/// of the order files were discovered in.
pub(crate) struct ResultAggregator {
    token: CancelToken,
    cap: usize,
    inner: Mutex<Collected>,
}

impl ResultAggregator {
    pub fn new(token: CancelToken, cap: usize) -> Self {
        Self {
            token,
            cap,
            inner: Mutex::new(Collected {
                best:    BinaryHeap::with_capacity(cap.saturating_add(1).min(4096)),
                offered: 0,
            }),
        }
    }

    /// Returns `false` when the batch was dropped as stale.
    pub fn offer(&self, items: Vec<SearchItem>, generation: u64) -> bool {
        if generation != self.token.generation() || self.token.is_cancelled() {
            return false;
        }
        if items.is_empty() {
            return true;
        }

        let mut inner = self.inner.lock();
        inner.offered += items.len();
        for item in items {
            if self.cap == 0 {
                break;
            }
            if inner.best.len() < self.cap {
                inner.best.push(Ranked(item));
                continue;
            }
            let beats_worst = inner
                .best
                .peek()
                .is_some_and(|worst| rank(&item, &worst.0) == Ordering::Less);
            if beats_worst {
                inner.best.pop();
                inner.best.push(Ranked(item));
            }
        }
        true
    }

    /// Matches offered so far, including ones evicted by the cap.
    pub fn offered(&self) -> usize {
        self.inner.lock().offered
    }

    /// The ranked, capped list.
    pub fn finish(self) -> Vec<SearchItem> {
        let inner = self.inner.into_inner();
        inner
            .best
            .into_sorted_vec()
            .into_iter()
            .map(|Ranked(item)| item)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::GenerationClock;
    use std::path::PathBuf;

    fn item(path: &str, line: usize, col: usize, score: i64) -> SearchItem {
        SearchItem {
            path:         PathBuf::from(path),
            line_number:  line,
            column_start: col,
            column_end:   col + 1,
            line_text:    String::new(),
            score,
        }
    }

    fn key(items: &[SearchItem]) -> Vec<(String, usize, usize, i64)> {
        items
            .iter()
            .map(|i| {
                (
                    i.path.to_string_lossy().into_owned(),
                    i.line_number,
                    i.column_start,
                    i.score,
                )
            })
            .collect()
    }

    #[test]
    fn orders_by_score_then_path_line_column() {
        let clock = GenerationClock::new();
        let agg = ResultAggregator::new(clock.token(clock.advance()), 10);
        agg.offer(
            vec![
                item("b.txt", 1, 0, 5),
                item("a.txt", 2, 0, 5),
                item("a.txt", 1, 3, 5),
                item("a.txt", 1, 1, 5),
                item("z.txt", 9, 9, 7),
            ],
            1,
        );

        assert_eq!(
            key(&agg.finish()),
            [
                (String::from("z.txt"), 9, 9, 7),
                (String::from("a.txt"), 1, 1, 5),
                (String::from("a.txt"), 1, 3, 5),
                (String::from("a.txt"), 2, 0, 5),
                (String::from("b.txt"), 1, 0, 5),
            ]
        );
    }

    #[test]
    fn path_ties_break_on_the_full_path_string() {
        let clock = GenerationClock::new();
        let agg = ResultAggregator::new(clock.token(clock.advance()), 10);
        agg.offer(
            vec![
                item("a/x.txt", 1, 0, 3),
                item("a-b/x.txt", 1, 0, 3),
                item("a.txt", 1, 0, 3),
            ],
            1,
        );

        let paths: Vec<String> = key(&agg.finish()).into_iter().map(|k| k.0).collect();
        assert_eq!(paths, ["a-b/x.txt", "a.txt", "a/x.txt"]);
    }

    #[test]
    fn cap_keeps_the_best_not_the_first() {
        let clock = GenerationClock::new();
        let agg = ResultAggregator::new(clock.token(clock.advance()), 3);
        for score in 0..20 {
            agg.offer(vec![item("f.txt", score as usize + 1, 0, score)], 1);
        }

        assert_eq!(agg.offered(), 20);
        let scores: Vec<i64> = agg.finish().iter().map(|i| i.score).collect();
        assert_eq!(scores, [19, 18, 17]);
    }

    #[test]
    fn stale_generations_are_dropped() {
        let clock = GenerationClock::new();
        let generation = clock.advance();
        let agg = ResultAggregator::new(clock.token(generation), 10);

        assert!(!agg.offer(vec![item("old.txt", 1, 0, 1)], generation - 1));
        assert!(agg.offer(vec![item("new.txt", 1, 0, 1)], generation));

        clock.advance();
        assert!(!agg.offer(vec![item("late.txt", 1, 0, 1)], generation));

        let items = agg.finish();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].path, PathBuf::from("new.txt"));
    }

    #[test]
    fn zero_cap_collects_nothing() {
        let clock = GenerationClock::new();
        let agg = ResultAggregator::new(clock.token(clock.advance()), 0);
        agg.offer(vec![item("a.txt", 1, 0, 1)], 1);
        assert!(agg.finish().is_empty());
    }
}
