use crate::event::Occurrence;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Merges streams already sorted by start time into one sorted stream.
/// Equal start times come out in stream order.
pub fn merge<I>(streams: impl IntoIterator<Item = I>) -> impl Iterator<Item = Occurrence>
where
    I: Iterator<Item = Occurrence>,
{
    let mut min_heap: BinaryHeap<_> = streams
        .into_iter()
        .enumerate()
        .filter_map(|(source, mut iter)| {
            iter.next()
                .map(|cursor| Reverse(IterHolder { cursor, source, iter }))
        })
        .collect();

    std::iter::from_fn(move || {
        let Reverse(IterHolder {
            cursor,
            source,
            mut iter,
        }) = min_heap.pop()?;

        if let Some(next) = iter.next() {
            min_heap.push(Reverse(IterHolder {
                cursor: next,
                source,
                iter,
            }));
        }

        Some(cursor)
    })
}

/// Holds an iterator and the latest occurrence that came out of it
struct IterHolder<I> {
    cursor: Occurrence,
    source: usize,
    iter: I,
}

impl<I> IterHolder<I> {
    fn key(&self) -> (chrono::DateTime<chrono::Utc>, usize) {
        (self.cursor.start_time(), self.source)
    }
}

impl<I> Eq for IterHolder<I> {}

impl<I> PartialEq for IterHolder<I> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<I> PartialOrd for IterHolder<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I> Ord for IterHolder<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}
