use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Receives transect completion counts while a swath is generated.
pub trait Progress {
    /// Called once per finished transect, in order, with the number
    /// done so far and the total.
    fn update(&self, done: usize, total: usize);
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn update(&self, _done: usize, _total: usize) {}
}

impl<F> Progress for F
where
    F: Fn(usize, usize),
{
    fn update(&self, done: usize, total: usize) {
        self(done, total);
    }
}

/// Shared flag a caller sets to abandon an in-flight build.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
