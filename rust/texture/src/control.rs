// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cooperative cancellation and progress reporting

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

type ProgressFn = dyn Fn(usize, usize) + Send + Sync;

/// Handle shared between a running bake and its caller
///
/// The bake polls the flag once per triangle and per rasterized row. Work
/// finished before cancellation is kept; the rest keeps the neutral fill.
#[derive(Clone, Default)]
pub struct BakeControl {
    cancelled: Arc<AtomicBool>,
    progress: Option<Arc<ProgressFn>>,
}

impl BakeControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a `(done, total)` progress callback
    pub fn with_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(f));
        self
    }

    /// Flag that can be set from another thread
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn report(&self, done: usize, total: usize) {
        if let Some(cb) = &self.progress {
            cb(done, total);
        }
    }
}

impl fmt::Debug for BakeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BakeControl")
            .field("cancelled", &self.is_cancelled())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Work-item counter feeding the progress callback from parallel code
pub(crate) struct Progress<'a> {
    control: &'a BakeControl,
    total: usize,
    done: AtomicUsize,
}

impl<'a> Progress<'a> {
    pub(crate) fn new(control: &'a BakeControl, total: usize) -> Self {
        Self {
            control,
            total,
            done: AtomicUsize::new(0),
        }
    }

    pub(crate) fn step(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        self.control.report(done, self.total);
    }
}
