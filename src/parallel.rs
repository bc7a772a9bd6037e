//! Scoped-thread execution over contiguous batches.
//!
//! Build and query both partition work across a caller-chosen number of OS
//! threads: `workers` contiguous batches of `total / workers` items, with
//! the last batch absorbing the remainder. `std::thread::scope` keeps the
//! borrows alive without a pool or any allocation beyond the join handles.

/// Bounds `[start, end)` of batch `w` out of `workers` over `total` items.
#[inline]
#[must_use]
pub fn batch_bounds(total: usize, workers: usize, w: usize) -> (usize, usize) {
    let batch = total / workers;
    let start = w * batch;
    let end = if w + 1 == workers { total } else { start + batch };
    (start, end)
}

/// Run `f(worker, start, end)` on every batch, one OS thread per batch, and
/// collect the per-batch results in worker order.
///
/// With a single worker the closure runs inline on the caller's thread.
pub fn map_batches<R, F>(total: usize, workers: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize, usize, usize) -> R + Sync,
{
    if workers <= 1 {
        return vec![f(0, 0, total)];
    }
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|w| {
                let (start, end) = batch_bounds(total, workers, w);
                let f = &f;
                s.spawn(move || f(w, start, end))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

/// Split `out` into one contiguous sub-slice per worker and run
/// `f(worker, offset, sub_slice)` on each, one OS thread per batch.
///
/// Each worker owns its sub-slice exclusively, so result writes need no
/// synchronization. With a single worker the closure runs inline.
pub fn for_each_batch_mut<R, F>(out: &mut [R], workers: usize, f: F)
where
    R: Send,
    F: Fn(usize, usize, &mut [R]) + Sync,
{
    let total = out.len();
    if workers <= 1 || total == 0 {
        f(0, 0, out);
        return;
    }
    let batch = total / workers;
    std::thread::scope(|s| {
        let mut rest = out;
        for w in 0..workers {
            let take = if w + 1 == workers { rest.len() } else { batch };
            let (head, tail) = rest.split_at_mut(take);
            rest = tail;
            let f = &f;
            s.spawn(move || f(w, w * batch, head));
        }
    });
}
