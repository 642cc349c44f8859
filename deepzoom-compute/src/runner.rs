//! Session orchestration.
//!
//! One render session: validate the config, carve the image into boards,
//! and drive them with a pool of worker threads. Each worker owns its own
//! [`ReferenceOrbitEngine`]; boards at rest live in a shared pool, and a
//! worker checks one out, advances it by a bounded slice, and checks it
//! back in. Every check-in is a safe suspension point, so migration and
//! cancellation never observe a board mid-slice.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use deepzoom_core::{PixelRect, ProgressEvent, ProgressSink, SessionConfig};

use crate::backend::{select_backend, BackendKind, GpuCaps, PIXEL_STATE_BYTES};
use crate::board::Board;
use crate::cancel::CancelToken;
use crate::error::{OrbitError, SessionError};
use crate::pixel::{PixelResult, Tolerances};
use crate::reference_orbit::ReferenceOrbitEngine;
use crate::scheduler::WorkScheduler;

/// Iterations per pixel per slice. Bounds how long a board can stay
/// checked out, which bounds migration and cancellation latency.
const SLICE_BUDGET: u64 = 256;

/// Completed render: per-pixel results in row-major order.
#[derive(Debug)]
pub struct RenderOutput {
    pub width: u32,
    pub height: u32,
    pub backend: BackendKind,
    pub pixels: Vec<PixelResult>,
}

/// Run one session to completion.
///
/// `gpu` carries the capability envelope of an external GPU layer, or
/// `None` when there is none; the choice only affects the reported
/// backend since the delta arithmetic is identical on both paths.
/// Cancellation is observed between slices and reported as
/// [`SessionError::Cancelled`].
pub fn render(
    config: &SessionConfig,
    gpu: Option<&GpuCaps>,
    sink: &dyn ProgressSink,
    cancel: &CancelToken,
) -> Result<RenderOutput, SessionError> {
    config.validate().map_err(SessionError::InvalidConfig)?;
    if cancel.is_cancelled() {
        return Err(SessionError::Cancelled);
    }

    let center = config.center().map_err(SessionError::InvalidConfig)?;
    let pixel_size = config
        .pixel_size_value()
        .map_err(SessionError::InvalidConfig)?
        .to_f64();
    let backend = select_backend((config.width, config.height), PIXEL_STATE_BYTES, gpu);
    let workers = if config.worker_count == 0 {
        num_cpus::get().max(1)
    } else {
        config.worker_count
    };
    let tol = Tolerances::for_pixel_size(pixel_size);

    let mut scheduler = WorkScheduler::new(workers);
    let mut boards: HashMap<u32, Board> = HashMap::new();
    for (i, rect) in PixelRect::grid(config.width, config.height, config.board_size)
        .into_iter()
        .enumerate()
    {
        let id = i as u32;
        let board = Board::new(id, rect, (config.width, config.height), pixel_size);
        scheduler.assign(id, board.initial_effort(config.iteration_cap));
        boards.insert(id, board);
    }
    log::info!(
        "session start: {}x{} px, {} boards, {} workers, {:?} backend, {} orbit bits",
        config.width,
        config.height,
        boards.len(),
        workers,
        backend,
        center.precision_bits()
    );

    let scheduler = Mutex::new(scheduler);
    let pool = Mutex::new(boards);
    let finished: Mutex<Vec<(PixelRect, Vec<PixelResult>)>> = Mutex::new(Vec::new());
    let fatal: Mutex<Option<OrbitError>> = Mutex::new(None);
    let started = Instant::now();

    crossbeam::scope(|spawner| {
        for worker in 0..workers {
            let center = center.clone();
            let scheduler = &scheduler;
            let pool = &pool;
            let finished = &finished;
            let fatal = &fatal;
            spawner.spawn(move |_| {
                let mut orbit = ReferenceOrbitEngine::new(center, config.exponent);
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let Some(mut board) = checkout(scheduler, pool, worker) else {
                        if scheduler.lock().expect("scheduler poisoned").is_drained() {
                            break;
                        }
                        // Nothing of ours at rest; see if the imbalance can
                        // be fixed, then back off briefly.
                        try_rebalance(scheduler, pool);
                        std::thread::sleep(Duration::from_millis(1));
                        continue;
                    };

                    let report =
                        match board.step_slice(&mut orbit, &tol, config.iteration_cap, SLICE_BUDGET)
                        {
                            Ok(report) => report,
                            Err(e) => {
                                *fatal.lock().expect("fatal flag poisoned") = Some(e);
                                cancel.cancel();
                                break;
                            }
                        };

                    sink.on_progress(&ProgressEvent {
                        board: board.id(),
                        worker,
                        pixels_resolved: report.pixels_resolved,
                        iterations_computed: report.iterations_computed,
                        elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
                    });

                    let mut sched = scheduler.lock().expect("scheduler poisoned");
                    sched.report_progress(board.id(), report.effort_consumed);
                    if board.is_done() {
                        sched.complete(board.id());
                        drop(sched);
                        finished
                            .lock()
                            .expect("results poisoned")
                            .push((board.rect(), board.results()));
                    } else {
                        drop(sched);
                        // Check-in: the board is at rest again.
                        pool.lock().expect("pool poisoned").insert(board.id(), board);
                    }
                }
            });
        }
    })
    .expect("worker thread panicked");

    if let Some(e) = fatal.into_inner().expect("fatal flag poisoned") {
        return Err(SessionError::Orbit(e));
    }
    if cancel.is_cancelled() {
        return Err(SessionError::Cancelled);
    }

    let mut pixels =
        vec![PixelResult::default(); config.width as usize * config.height as usize];
    for (rect, results) in finished.into_inner().expect("results poisoned") {
        for (i, result) in results.into_iter().enumerate() {
            let px = rect.x + i as u32 % rect.width;
            let py = rect.y + i as u32 / rect.width;
            pixels[py as usize * config.width as usize + px as usize] = result;
        }
    }
    log::info!(
        "session done in {:.0} ms",
        started.elapsed().as_secs_f64() * 1000.0
    );
    Ok(RenderOutput {
        width: config.width,
        height: config.height,
        backend,
        pixels,
    })
}

/// Take the first of this worker's boards that is at rest in the pool.
/// The scheduler and pool locks are taken in sequence, never nested.
fn checkout(
    scheduler: &Mutex<WorkScheduler>,
    pool: &Mutex<HashMap<u32, Board>>,
    worker: usize,
) -> Option<Board> {
    let mine = scheduler.lock().expect("scheduler poisoned").boards_for(worker);
    let mut pool = pool.lock().expect("pool poisoned");
    mine.into_iter().find_map(|id| pool.remove(&id))
}

/// One rebalance cycle against a snapshot of the at-rest set. A board that
/// leaves the pool between snapshot and migration is harmless: its current
/// holder finishes the in-flight slice and checks it in, and only the new
/// owner can check it out after that.
fn try_rebalance(scheduler: &Mutex<WorkScheduler>, pool: &Mutex<HashMap<u32, Board>>) {
    let resting: HashSet<u32> = pool
        .lock()
        .expect("pool poisoned")
        .keys()
        .copied()
        .collect();
    scheduler
        .lock()
        .expect("scheduler poisoned")
        .rebalance(|board| resting.contains(&board));
}
