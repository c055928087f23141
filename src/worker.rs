use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{bounded, unbounded};
use tracing::warn;

/// Fixed-size worker pool over independent jobs.
///
/// Jobs are handed out by index over a bounded channel; results come back on a
/// second channel and are returned in job order. After the first failure no new
/// job is started and jobs already running finish. The error returned is the
/// lowest-index one among the jobs that ran; queued jobs skipped after the stop
/// never run, so a lower-index job that would also have failed may not be seen.
pub fn run_ordered<J, T, E, F>(jobs: &[J], workers: usize, work: F) -> Result<Vec<T>, E>
where
    J: Sync,
    T: Send,
    E: Send,
    F: Fn(&J) -> Result<T, E> + Sync,
{
    if jobs.is_empty() {
        return Ok(Vec::new());
    }
    let workers = workers.clamp(1, jobs.len());
    let (job_tx, job_rx) = bounded::<usize>(workers * 2);
    let (result_tx, result_rx) = unbounded::<(usize, Result<T, E>)>();
    let stop = AtomicBool::new(false);

    let mut slots: Vec<Option<Result<T, E>>> = Vec::with_capacity(jobs.len());
    slots.resize_with(jobs.len(), || None);

    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let stop = &stop;
            let work = &work;
            scope.spawn(move || {
                while let Ok(idx) = job_rx.recv() {
                    // Keep draining so the feeder never blocks on a full queue.
                    if stop.load(Ordering::SeqCst) {
                        continue;
                    }
                    let out = work(&jobs[idx]);
                    if out.is_err() {
                        stop.store(true, Ordering::SeqCst);
                    }
                    if result_tx.send((idx, out)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(result_tx);

        for idx in 0..jobs.len() {
            if stop.load(Ordering::SeqCst) {
                warn!(target: "worker", "stopping after failure; {} jobs not started", jobs.len() - idx);
                break;
            }
            if job_tx.send(idx).is_err() {
                break;
            }
        }
        drop(job_tx);

        for (idx, out) in result_rx.iter() {
            slots[idx] = Some(out);
        }
    });

    let mut results = Vec::with_capacity(slots.len());
    let mut first_err = None;
    for slot in slots {
        match slot {
            Some(Ok(v)) if first_err.is_none() => results.push(v),
            Some(Err(e)) if first_err.is_none() => first_err = Some(e),
            _ => {}
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(results),
    }
}
