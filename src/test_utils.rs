//! Test utilities for property-based testing
//!
//! This module provides generators for proptest and stub collaborators for
//! driving the executor and scheduler without a real build tool.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    use crate::core::job::{Arch, BuildType, Platform};

    fn names<const N: usize>(all: [&'static str; N]) -> impl Strategy<Value = Vec<String>> {
        prop::sample::subsequence(all.to_vec(), 1..=N)
            .prop_map(|v| v.into_iter().map(ToString::to_string).collect())
    }

    /// Generate a nonempty ordered subset of platform names
    pub fn platform_names() -> impl Strategy<Value = Vec<String>> {
        names(Platform::ALL.map(|p| p.name()))
    }

    /// Generate a nonempty ordered subset of architecture names
    pub fn arch_names() -> impl Strategy<Value = Vec<String>> {
        names(Arch::ALL.map(|a| a.name()))
    }

    /// Generate a nonempty ordered subset of build type names
    pub fn build_type_names() -> impl Strategy<Value = Vec<String>> {
        names(BuildType::ALL.map(|b| b.name()))
    }
}

#[cfg(test)]
pub mod stubs {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::core::executor::{
        BuildPipeline, ExecutorSettings, JobExecutor, PipelineRequest, Toolchain, ToolchainLookup,
    };
    use crate::core::job::Platform;
    use crate::error::PipelineError;
    use crate::infra::dirs::BuildDirs;

    /// Toolchain lookup that supports every target except the listed ones
    #[derive(Debug, Default)]
    pub struct StubToolchains {
        pub unsupported: Vec<Platform>,
    }

    impl ToolchainLookup for StubToolchains {
        fn lookup(&self, _host: Platform, target: Platform) -> Option<Toolchain> {
            if self.unsupported.contains(&target) {
                None
            } else {
                Some(Toolchain {
                    name: target.name().to_string(),
                    file: PathBuf::from(format!("/toolchains/{target}.cmake")),
                })
            }
        }
    }

    /// Behaviour of a stubbed pipeline call
    #[derive(Debug, Clone)]
    pub enum Outcome {
        Exit(i32),
        Fault,
        Panic,
    }

    type Decide = dyn Fn(&PipelineRequest) -> Outcome + Send + Sync;

    /// Pipeline that records every request and answers from a closure
    pub struct RecordingPipeline {
        decide: Box<Decide>,
        delay: Duration,
        pub calls: Mutex<Vec<PipelineRequest>>,
        running: AtomicUsize,
        pub peak: AtomicUsize,
    }

    impl RecordingPipeline {
        pub fn new(decide: impl Fn(&PipelineRequest) -> Outcome + Send + Sync + 'static) -> Self {
            Self {
                decide: Box::new(decide),
                delay: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }

        pub fn succeeding() -> Self {
            Self::new(|_| Outcome::Exit(0))
        }

        #[must_use]
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl BuildPipeline for RecordingPipeline {
        fn run(&self, request: &PipelineRequest) -> Result<i32, PipelineError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.lock().unwrap().push(request.clone());
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            self.running.fetch_sub(1, Ordering::SeqCst);

            match (self.decide)(request) {
                Outcome::Exit(code) => Ok(code),
                Outcome::Fault => Err(PipelineError::ToolNotFound {
                    tool: "cmake".to_string(),
                }),
                Outcome::Panic => panic!("pipeline blew up"),
            }
        }
    }

    /// Executor settings rooted at a fake project directory
    pub fn settings() -> ExecutorSettings {
        ExecutorSettings::new(Platform::Linux, PathBuf::from("/project"))
            .with_dirs(BuildDirs::new(PathBuf::from("/project/out")))
    }

    /// Executor wired to the given pipeline and toolchains
    pub fn executor(
        pipeline: Arc<RecordingPipeline>,
        toolchains: StubToolchains,
    ) -> Arc<JobExecutor> {
        Arc::new(JobExecutor::new(settings(), Arc::new(toolchains), pipeline))
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    use crate::core::job::{Arch, BuildType, Platform};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_platform_names_generator(names in platform_names()) {
            prop_assert!(!names.is_empty());
            for name in &names {
                prop_assert!(name.parse::<Platform>().is_ok());
            }
        }

        #[test]
        fn test_arch_names_generator(names in arch_names()) {
            prop_assert!(!names.is_empty());
            for name in &names {
                prop_assert!(name.parse::<Arch>().is_ok());
            }
        }

        #[test]
        fn test_build_type_names_generator(names in build_type_names()) {
            prop_assert!(names.len() <= 2);
            for name in &names {
                prop_assert!(name.parse::<BuildType>().is_ok());
            }
        }
    }
}
