// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-target monitor cycle and the sweep loop over all targets.
//!
//! Every target owns its [`RotationTracker`] and [`ProcessedLines`]; targets
//! share nothing, so a sweep runs their cycles as independent tasks.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::batch::{pack, NotificationMessage};
use crate::config::Target;
use crate::dedup::ProcessedLines;
use crate::error::TransportError;
use crate::parser::{is_candidate, parse_line};
use crate::rotation::RotationTracker;
use crate::sink::BatchSink;
use crate::source::LogSource;

/// Outcome of one completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub identity: String,
    pub rotated: bool,
    pub new_lines: usize,
    pub parse_errors: usize,
    pub suspected_events: usize,
    pub batches_delivered: usize,
    pub batches_failed: usize,
}

#[derive(Debug)]
pub struct TargetMonitor {
    target: Target,
    rotation: RotationTracker,
    processed: ProcessedLines,
}

impl TargetMonitor {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            rotation: RotationTracker::new(),
            processed: ProcessedLines::new(),
        }
    }

    pub fn current_log(&self) -> Option<&str> {
        self.rotation.current()
    }

    pub fn processed_lines(&self) -> usize {
        self.processed.len()
    }

    /// Runs one fetch, filter, parse, batch and deliver pass.
    ///
    /// A log source failure aborts the cycle before any state changes.
    /// Malformed preload lines and failed deliveries are logged and skipped.
    pub async fn run_cycle(
        &mut self,
        source: &dyn LogSource,
        sink: &dyn BatchSink,
    ) -> Result<CycleReport, TransportError> {
        let service_id = self.target.service_id;
        info!("Parsing RPT log file for {service_id}");

        let snapshot = source
            .fetch_current_log(&self.target)
            .await
            .inspect_err(|err| error!("Failed to fetch RPT log file for {service_id}: {err}"))?;

        let rotated = self.rotation.observe(&snapshot.identity).is_rotation;
        if rotated {
            info!(
                "Log file of {service_id} rotated to {}, forgetting {} processed lines",
                snapshot.identity,
                self.processed.len()
            );
            self.processed.reset();
        }

        let content = String::from_utf8_lossy(&snapshot.content);
        let unseen = self
            .processed
            .filter_unseen(content.lines().filter(|line| is_candidate(line)));

        let mut report = CycleReport {
            identity: snapshot.identity.clone(),
            rotated,
            new_lines: unseen.len(),
            ..Default::default()
        };

        let mut events = Vec::new();
        for line in &unseen {
            self.processed.mark_seen(line);
            match parse_line(line) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(err) => {
                    report.parse_errors += 1;
                    warn!(
                        "Skipping malformed preload line in {}: {err}: {line:?}",
                        snapshot.identity
                    );
                }
            }
        }
        report.suspected_events = events.len();

        let messages = events.iter().map(NotificationMessage::from_event).collect();
        for batch in pack(messages).iter().filter(|batch| !batch.is_empty()) {
            match sink.deliver(batch, &self.target.webhook_url).await {
                Ok(()) => report.batches_delivered += 1,
                Err(err) => {
                    report.batches_failed += 1;
                    error!(
                        "Failed to deliver {} alerts for {service_id}: {err}",
                        batch.len()
                    );
                }
            }
        }

        info!(
            "Finished parsing RPT log file for {service_id}. Found {} suspected glitch {}",
            report.suspected_events,
            if report.suspected_events == 1 {
                "event"
            } else {
                "events"
            }
        );
        Ok(report)
    }
}

/// Aggregated outcome of one sweep over all targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub completed: usize,
    pub failed: usize,
    pub suspected_events: usize,
    pub batches_delivered: usize,
    pub batches_failed: usize,
}

pub struct Monitor {
    targets: Vec<Arc<Mutex<TargetMonitor>>>,
    source: Arc<dyn LogSource>,
    sink: Arc<dyn BatchSink>,
    poll_interval: Duration,
}

impl Monitor {
    pub fn new(
        targets: Vec<Target>,
        source: Arc<dyn LogSource>,
        sink: Arc<dyn BatchSink>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            targets: targets
                .into_iter()
                .map(|target| Arc::new(Mutex::new(TargetMonitor::new(target))))
                .collect(),
            source,
            sink,
            poll_interval,
        }
    }

    pub fn targets(&self) -> &[Arc<Mutex<TargetMonitor>>] {
        &self.targets
    }

    /// Runs one cycle per target concurrently and waits for all of them.
    /// Neither an error nor a panic in one target affects the others.
    pub async fn sweep(&self) -> SweepSummary {
        let mut tasks = JoinSet::new();
        for target in &self.targets {
            let target = Arc::clone(target);
            let source = Arc::clone(&self.source);
            let sink = Arc::clone(&self.sink);
            tasks.spawn(async move {
                let mut monitor = target.lock().await;
                monitor.run_cycle(source.as_ref(), sink.as_ref()).await
            });
        }

        let mut summary = SweepSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(report)) => {
                    summary.completed += 1;
                    summary.suspected_events += report.suspected_events;
                    summary.batches_delivered += report.batches_delivered;
                    summary.batches_failed += report.batches_failed;
                }
                Ok(Err(_)) => summary.failed += 1,
                Err(err) => {
                    summary.failed += 1;
                    error!("Unhandled failure when running a monitor cycle: {err}");
                }
            }
        }
        summary
    }

    /// Sweeps, then idles for the poll interval, until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            let summary = self.sweep().await;
            debug!("Sweep finished: {summary:?}");

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Monitor loop stopped");
                    return;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}
