//! Job scheduling
//!
//! Drives every job of a run through the [`JobExecutor`], either one after
//! another in enumeration order or on a bounded pool of blocking workers.
//!
//! Fail-fast only stops new jobs from starting. A job that is already
//! running is never interrupted, so in concurrent mode the jobs in flight
//! when the first failure arrives still finish and are reported.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;

use crate::config::defaults::EXECUTION_FAULT_EXIT;
use crate::core::executor::JobExecutor;
use crate::core::job::{BuildJob, JobResult};
use crate::core::report::{summarize, RunSummary};

/// Default worker count for a host with `cores` logical CPUs
pub fn default_workers(cores: usize) -> usize {
    cores.max(1)
}

/// Clamp a requested worker count to at least one
pub fn clamp_workers(requested: i64) -> usize {
    usize::try_from(requested).map_or(1, |n| n.max(1))
}

/// How jobs are run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePolicy {
    /// Run jobs on a worker pool instead of one by one
    pub concurrent: bool,
    /// Worker pool size (always at least 1)
    pub max_workers: usize,
    /// Stop starting jobs after the first non-success
    pub fail_fast: bool,
}

impl SchedulePolicy {
    /// One job at a time
    pub fn sequential(fail_fast: bool) -> Self {
        Self {
            concurrent: false,
            max_workers: 1,
            fail_fast,
        }
    }

    /// Up to `max_workers` jobs at a time
    pub fn concurrent(max_workers: usize, fail_fast: bool) -> Self {
        Self {
            concurrent: true,
            max_workers: max_workers.max(1),
            fail_fast,
        }
    }

    /// Effective pool size
    pub fn workers(&self) -> usize {
        if self.concurrent {
            self.max_workers.max(1)
        } else {
            1
        }
    }
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self::concurrent(default_workers(num_cpus::get()), false)
    }
}

type ResultObserver = Arc<dyn Fn(&JobResult) + Send + Sync>;

/// Runs a list of jobs under a [`SchedulePolicy`]
pub struct Scheduler {
    executor: Arc<JobExecutor>,
    policy: SchedulePolicy,
    observer: Option<ResultObserver>,
}

impl Scheduler {
    /// Create a scheduler
    pub fn new(executor: Arc<JobExecutor>, policy: SchedulePolicy) -> Self {
        Self {
            executor,
            policy,
            observer: None,
        }
    }

    /// Call `observer` once for every finished job
    #[must_use]
    pub fn with_observer(mut self, observer: impl Fn(&JobResult) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Get the scheduling policy
    pub fn policy(&self) -> &SchedulePolicy {
        &self.policy
    }

    /// Run all jobs and summarize the results
    ///
    /// Jobs never started because of fail-fast are absent from the summary.
    pub async fn run(&self, jobs: Vec<BuildJob>) -> RunSummary {
        let start = Instant::now();
        tracing::info!(
            "Scheduling {} jobs ({}, {} workers, fail-fast {})",
            jobs.len(),
            if self.policy.concurrent { "concurrent" } else { "sequential" },
            self.policy.workers(),
            if self.policy.fail_fast { "on" } else { "off" }
        );

        let results = if self.policy.concurrent {
            self.run_concurrent(jobs).await
        } else {
            self.run_sequential(jobs).await
        };

        summarize(&results, start.elapsed())
    }

    fn observe(&self, result: &JobResult) {
        if let Some(observer) = &self.observer {
            observer(result);
        }
    }

    async fn run_sequential(&self, jobs: Vec<BuildJob>) -> Vec<JobResult> {
        let mut results = Vec::with_capacity(jobs.len());
        for job in jobs {
            let result = execute_blocking(Arc::clone(&self.executor), job).await;
            self.observe(&result);
            let stop = self.policy.fail_fast && !result.is_success();
            results.push(result);
            if stop {
                tracing::info!("Fail-fast: stopping after first failure");
                break;
            }
        }
        results
    }

    async fn run_concurrent(&self, jobs: Vec<BuildJob>) -> Vec<JobResult> {
        let workers = self.policy.workers();
        let mut pending = jobs.into_iter();
        let mut in_flight: JoinSet<JobResult> = JoinSet::new();
        let mut started = Started::default();
        let mut results = Vec::with_capacity(pending.len());
        let mut halted = false;

        loop {
            while !halted && in_flight.len() < workers {
                let Some(job) = pending.next() else { break };
                started.push(job.clone());
                in_flight.spawn(execute_blocking(Arc::clone(&self.executor), job));
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            let result = match joined {
                Ok(result) => {
                    started.finish(&result.job);
                    result
                }
                Err(e) => {
                    tracing::error!("Job task failed to join: {e}");
                    halted |= self.policy.fail_fast;
                    continue;
                }
            };
            self.observe(&result);
            if self.policy.fail_fast && !result.is_success() && !halted {
                halted = true;
                tracing::info!(
                    "Fail-fast: not starting {} remaining jobs, waiting for {} in flight",
                    pending.len(),
                    in_flight.len()
                );
            }
            results.push(result);
        }

        for result in started.into_unreported("job task failed to join") {
            self.observe(&result);
            results.push(result);
        }
        results
    }
}

/// Jobs started on the pool that have not reported yet
#[derive(Debug, Default)]
struct Started {
    jobs: Vec<BuildJob>,
}

impl Started {
    fn push(&mut self, job: BuildJob) {
        self.jobs.push(job);
    }

    fn finish(&mut self, job: &BuildJob) {
        if let Some(pos) = self.jobs.iter().position(|j| j == job) {
            self.jobs.swap_remove(pos);
        }
    }

    /// Error results for every job that never reported
    fn into_unreported(self, detail: &str) -> Vec<JobResult> {
        self.jobs
            .into_iter()
            .map(|job| JobResult::error(job, EXECUTION_FAULT_EXIT, detail))
            .collect()
    }
}

/// Run one job on the blocking pool
///
/// The executor already turns pipeline faults into results; a join error
/// here is converted the same way so every started job yields a result.
async fn execute_blocking(executor: Arc<JobExecutor>, job: BuildJob) -> JobResult {
    let fallback = job.clone();
    match tokio::task::spawn_blocking(move || executor.execute(job)).await {
        Ok(result) => result,
        Err(e) => JobResult::error(fallback, EXECUTION_FAULT_EXIT, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::enumerator::{enumerate, OptionSpace};
    use crate::core::executor::PipelineRequest;
    use crate::core::job::{Arch, BuildType, JobStatus, Platform};
    use crate::core::report::ExitPolicy;
    use crate::test_utils::stubs::{executor, Outcome, RecordingPipeline, StubToolchains};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn five_jobs() -> Vec<BuildJob> {
        enumerate(
            &["linux", "mingw"],
            &["x86_64", "arm64"],
            &["debug", "release"],
            &OptionSpace::new(),
        )
        .unwrap()
        .into_iter()
        .take(5)
        .collect()
    }

    fn is_job(req: &PipelineRequest, job: &BuildJob) -> bool {
        let debug = if job.build_type.is_debug() { "TRUE" } else { "FALSE" };
        req.definition("TARGET_OS_NAME") == Some(job.platform.name())
            && req.definition("TARGET_ARCH") == Some(job.arch.name())
            && req.definition("BUILD_DEBUG") == Some(debug)
    }

    fn fail_when(job: BuildJob) -> impl Fn(&PipelineRequest) -> Outcome {
        move |req| {
            if is_job(req, &job) {
                Outcome::Exit(1)
            } else {
                Outcome::Exit(0)
            }
        }
    }

    #[tokio::test]
    async fn test_sequential_preserves_order() {
        let jobs = five_jobs();
        let pipeline = Arc::new(RecordingPipeline::succeeding());
        let scheduler = Scheduler::new(
            executor(pipeline.clone(), StubToolchains::default()),
            SchedulePolicy::sequential(false),
        );

        let summary = scheduler.run(jobs.clone()).await;
        let order: Vec<BuildJob> = summary.succeeded.iter().map(|r| r.job.clone()).collect();
        assert_eq!(order, jobs);
        assert_eq!(summary.exit_code(ExitPolicy::FailureCount), 0);
    }

    #[tokio::test]
    async fn test_sequential_fail_fast_stops_after_second_job() {
        let jobs = five_jobs();
        let pipeline = Arc::new(RecordingPipeline::new(fail_when(jobs[1].clone())));
        let scheduler = Scheduler::new(
            executor(pipeline.clone(), StubToolchains::default()),
            SchedulePolicy::sequential(true),
        );

        let summary = scheduler.run(jobs.clone()).await;
        assert_eq!(pipeline.call_count(), 2);
        assert_eq!(summary.succeeded.len(), 1);
        assert_eq!(summary.succeeded[0].job, jobs[0]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].job, jobs[1]);
        assert_eq!(summary.total(), 2);
    }

    #[tokio::test]
    async fn test_sequential_without_fail_fast_runs_everything() {
        let jobs = five_jobs();
        let pipeline = Arc::new(RecordingPipeline::new(fail_when(jobs[1].clone())));
        let scheduler = Scheduler::new(
            executor(pipeline.clone(), StubToolchains::default()),
            SchedulePolicy::sequential(false),
        );

        let summary = scheduler.run(jobs).await;
        assert_eq!(pipeline.call_count(), 5);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.exit_code(ExitPolicy::FailureCount), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_respects_worker_bound() {
        let jobs = enumerate(
            &["linux", "windows", "mingw"],
            &["x86_64", "arm64"],
            &["debug", "release"],
            &OptionSpace::new(),
        )
        .unwrap();
        let pipeline =
            Arc::new(RecordingPipeline::succeeding().with_delay(Duration::from_millis(20)));
        let scheduler = Scheduler::new(
            executor(pipeline.clone(), StubToolchains::default()),
            SchedulePolicy::concurrent(3, false),
        );

        let summary = scheduler.run(jobs.clone()).await;
        assert_eq!(summary.succeeded.len(), jobs.len());
        assert!(pipeline.peak.load(Ordering::SeqCst) <= 3);
        assert!(pipeline.peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_concurrent_fail_fast_stops_new_submissions() {
        let jobs = five_jobs();
        let pipeline = Arc::new(
            RecordingPipeline::new(fail_when(jobs[0].clone()))
                .with_delay(Duration::from_millis(20)),
        );
        let scheduler = Scheduler::new(
            executor(pipeline.clone(), StubToolchains::default()),
            SchedulePolicy::concurrent(2, true),
        );

        let summary = scheduler.run(jobs).await;
        // Jobs 0 and 1 start together; at most one more starts before job 0 reports.
        assert!(pipeline.call_count() <= 3);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.total(), pipeline.call_count());
    }

    #[tokio::test]
    async fn test_concurrent_fail_fast_with_single_worker() {
        let jobs = five_jobs();
        let pipeline = Arc::new(RecordingPipeline::new(fail_when(jobs[0].clone())));
        let scheduler = Scheduler::new(
            executor(pipeline.clone(), StubToolchains::default()),
            SchedulePolicy::concurrent(1, true),
        );

        let summary = scheduler.run(jobs).await;
        assert_eq!(pipeline.call_count(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.succeeded.is_empty());
    }

    #[tokio::test]
    async fn test_faults_do_not_stop_siblings() {
        let jobs = five_jobs();
        let target = jobs[2].clone();
        let pipeline = Arc::new(RecordingPipeline::new(move |req| {
            if is_job(req, &target) {
                Outcome::Panic
            } else {
                Outcome::Exit(0)
            }
        }));
        let scheduler = Scheduler::new(
            executor(pipeline.clone(), StubToolchains::default()),
            SchedulePolicy::concurrent(4, false),
        );

        let summary = scheduler.run(jobs).await;
        assert_eq!(summary.succeeded.len(), 4);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].status, JobStatus::Error);
    }

    #[tokio::test]
    async fn test_observer_sees_every_result() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let scheduler = Scheduler::new(
            executor(Arc::new(RecordingPipeline::succeeding()), StubToolchains::default()),
            SchedulePolicy::concurrent(2, false),
        )
        .with_observer(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        scheduler.run(five_jobs()).await;
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_empty_job_list() {
        let scheduler = Scheduler::new(
            executor(Arc::new(RecordingPipeline::succeeding()), StubToolchains::default()),
            SchedulePolicy::default(),
        );
        let summary = scheduler.run(Vec::new()).await;
        assert_eq!(summary.total(), 0);
        assert_eq!(summary.exit_code(ExitPolicy::FailureCount), 0);
    }

    #[test]
    fn test_unjoined_jobs_still_get_a_result() {
        let jobs = five_jobs();
        let mut started = Started::default();
        for job in &jobs[..3] {
            started.push(job.clone());
        }
        started.finish(&jobs[1]);

        let unreported = started.into_unreported("job task failed to join");
        assert_eq!(unreported.len(), 2);
        assert!(unreported.iter().all(|r| r.status == JobStatus::Error));
        assert!(unreported.iter().all(|r| r.exit_code == EXECUTION_FAULT_EXIT));
        let missing: Vec<&BuildJob> = unreported.iter().map(|r| &r.job).collect();
        assert!(missing.contains(&&jobs[0]));
        assert!(missing.contains(&&jobs[2]));
    }

    #[tokio::test]
    async fn test_concurrent_run_leaves_nothing_unreported() {
        let jobs = five_jobs();
        let scheduler = Scheduler::new(
            executor(Arc::new(RecordingPipeline::succeeding()), StubToolchains::default()),
            SchedulePolicy::concurrent(3, false),
        );
        let summary = scheduler.run(jobs.clone()).await;
        assert_eq!(summary.total(), jobs.len());
        assert!(summary.failed.is_empty());
    }

    #[test]
    fn test_worker_defaults_and_clamping() {
        assert_eq!(default_workers(0), 1);
        assert_eq!(default_workers(8), 8);
        assert_eq!(clamp_workers(0), 1);
        assert_eq!(clamp_workers(-4), 1);
        assert_eq!(clamp_workers(6), 6);
        assert_eq!(SchedulePolicy::concurrent(0, false).workers(), 1);
        assert_eq!(SchedulePolicy::sequential(true).workers(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_clamped_workers_are_positive(requested in any::<i64>()) {
            prop_assert!(clamp_workers(requested) >= 1);
        }

        #[test]
        fn prop_concurrent_counts(n in 1usize..12, fail_mask in any::<u16>()) {
            let jobs: Vec<BuildJob> = (0..n)
                .map(|i| BuildJob::new(Platform::Linux, Arch::X86_64, BuildType::Debug)
                    .with_option("INDEX", i.to_string()))
                .collect();
            let failing: Vec<String> = (0..n)
                .filter(|i| fail_mask & (1 << i) != 0)
                .map(|i| i.to_string())
                .collect();
            let m = failing.len();
            let pipeline = Arc::new(RecordingPipeline::new(move |req| {
                if req.definition("INDEX").is_some_and(|v| failing.iter().any(|f| f == v)) {
                    Outcome::Exit(2)
                } else {
                    Outcome::Exit(0)
                }
            }));
            let scheduler = Scheduler::new(
                executor(pipeline, StubToolchains::default()),
                SchedulePolicy::concurrent(4, false),
            );

            let runtime = tokio::runtime::Runtime::new().unwrap();
            let summary = runtime.block_on(scheduler.run(jobs));
            prop_assert_eq!(summary.succeeded.len(), n - m);
            prop_assert_eq!(summary.failed.len(), m);
            prop_assert_eq!(summary.exit_code(ExitPolicy::FailureCount), i32::try_from(m).unwrap());
        }
    }
}
