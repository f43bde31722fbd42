//! Background path searches on the tokio blocking pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use glam::Vec3;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::path::NavPath;
use super::pathfinder::PathFinder;
use super::settings::PathFinderSettings;
use crate::core::error::Error;
use crate::core::trace::NavTrace;
use crate::core::types::Result;
use crate::svo::data::SvoData;
use crate::svo::link::Link;

/// Resolved endpoints of one search
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathRequest {
    pub start: Link,
    pub goal: Link,
    pub start_location: Vec3,
    pub goal_location: Vec3,
}

/// Handle to a search running off the calling thread.
///
/// The search owns a snapshot of the store, so regenerating the volume
/// meanwhile does not affect it. The result is written before the completion
/// flag is raised, and the flag is raised exactly once. There is no
/// cancellation.
pub struct FindPathTask {
    complete: Arc<AtomicBool>,
    result: Arc<Mutex<Option<Result<NavPath>>>>,
    handle: JoinHandle<()>,
}

impl FindPathTask {
    pub fn spawn(
        runtime: &Handle,
        data: Arc<SvoData>,
        request: PathRequest,
        settings: PathFinderSettings,
        trace: Arc<dyn NavTrace>,
    ) -> Self {
        let complete = Arc::new(AtomicBool::new(false));
        let result = Arc::new(Mutex::new(None));

        let worker_complete = Arc::clone(&complete);
        let worker_result = Arc::clone(&result);
        let handle = runtime.spawn_blocking(move || {
            let path = PathFinder::new(&data, &settings)
                .with_trace(trace.as_ref())
                .find_path(request.start, request.goal, request.start_location, request.goal_location);
            *worker_result.lock().unwrap_or_else(PoisonError::into_inner) = Some(path);
            worker_complete.store(true, Ordering::Release);
        });

        Self { complete, result, handle }
    }

    /// True once the result is available
    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    /// Take the result if the search has finished. Returns `None` while it is
    /// still running or after the result was already taken.
    pub fn take_result(&self) -> Option<Result<NavPath>> {
        if !self.is_complete() {
            return None;
        }
        self.result.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Wait for the search and return its result
    pub async fn wait(self) -> Result<NavPath> {
        if let Err(e) = self.handle.await {
            if e.is_panic() {
                std::panic::resume_unwind(e.into_panic());
            }
            return Err(Error::TaskFailed(e.to_string()));
        }
        self.result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_else(|| Err(Error::TaskFailed("result already taken".to_string())))
    }
}
