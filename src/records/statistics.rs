//! Dashboard statistics and the performance report.
//!
//! Statistics can be computed on a worker thread. The worker opens its own
//! connection and never touches the caches or the session; the result is
//! handed back over a channel and picked up by the caller.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use super::{Records, RecordsError};
use crate::authorization::Capability;
use crate::db::repository::{dashboard_statistics, DashboardStatistics};
use crate::db::DatabaseError;
use crate::performance::{load_report, PerformanceReport};
use crate::session::Session;

/// Handle to a statistics computation running on its own thread.
pub struct StatisticsTask {
    receiver: Receiver<Result<DashboardStatistics, DatabaseError>>,
    handle: Option<JoinHandle<()>>,
}

impl StatisticsTask {
    /// Block until the worker reports.
    pub fn wait(mut self) -> Result<DashboardStatistics, RecordsError> {
        let outcome = self.receiver.recv();
        self.join();
        match outcome {
            Ok(result) => Ok(result?),
            Err(_) => Err(RecordsError::WorkerLost),
        }
    }

    /// Poll without blocking. `None` while the worker is still running.
    pub fn try_take(&mut self) -> Option<Result<DashboardStatistics, RecordsError>> {
        match self.receiver.try_recv() {
            Ok(result) => {
                self.join();
                Some(result.map_err(RecordsError::from))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.join();
                Some(Err(RecordsError::WorkerLost))
            }
        }
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Statistics worker panicked");
            }
        }
    }
}

impl Drop for StatisticsTask {
    fn drop(&mut self) {
        self.join();
    }
}

impl Records {
    /// Compute dashboard statistics on the caller's thread.
    pub fn dashboard_statistics(
        &self,
        session: &Session,
    ) -> Result<DashboardStatistics, RecordsError> {
        self.run(session, Capability::ViewDashboard, "Dashboard Statistics", || {
            let conn = self.connect()?;
            Ok(dashboard_statistics(&conn)?)
        })
    }

    /// Start computing dashboard statistics on a worker thread.
    ///
    /// The capability is checked here, before the worker starts.
    pub fn spawn_dashboard_statistics(
        &self,
        session: &Session,
    ) -> Result<StatisticsTask, RecordsError> {
        session.require(Capability::ViewDashboard)?;
        let db = self.db.clone();
        let (sender, receiver) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("dashboard-statistics".into())
            .spawn(move || {
                let result = db.connect().and_then(|conn| dashboard_statistics(&conn));
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "Dashboard statistics failed");
                }
                // The caller may have dropped the task already
                let _ = sender.send(result);
            })?;

        Ok(StatisticsTask {
            receiver,
            handle: Some(handle),
        })
    }

    /// Timings recorded in the performance sidecar, newest first.
    /// Empty when no sidecar is configured or nothing was recorded yet.
    /// The read itself is recorded after it completes, so it shows up in the next report.
    pub fn performance_report(
        &self,
        session: &Session,
    ) -> Result<PerformanceReport, RecordsError> {
        self.run(session, Capability::ViewPerformance, "Performance Report", || {
            match self.recorder.sidecar_path() {
                Some(path) => Ok(load_report(path)?),
                None => Ok(PerformanceReport::default()),
            }
        })
    }
}
