//! Default configuration values

/// Exit code for errors discovered before any job ran
pub const CONFIGURATION_ERROR_EXIT: i32 = -1;

/// Exit code recorded on a job whose target has no toolchain
pub const TOOLCHAIN_NOT_FOUND_EXIT: i32 = -1;

/// Exit code recorded on a job that faulted instead of finishing
pub const EXECUTION_FAULT_EXIT: i32 = -2;

/// Largest failure count reported as an exit code
///
/// One below 255, which is how a process reports the -1 sentinels.
pub const MAX_EXIT_CODE: i32 = 254;

/// Settings file looked up in the source directory
pub const SETTINGS_FILE_NAME: &str = "buildmatrix.toml";

/// Default output root, relative to the source directory
pub const DEFAULT_OUT_DIR: &str = "out";

/// Build directory name under the output root
pub const BUILD_SUBDIR: &str = "build";

/// Install directory name under the output root
pub const INSTALL_SUBDIR: &str = "install";

/// Default LLVM install location on Windows hosts
pub const DEFAULT_WINDOWS_LLVM_DIR: &str = "C:/Program Files/LLVM";

/// Toolchain files directory, relative to the source directory
pub const TOOLCHAINS_SUBDIR: &str = "src/build/cmake/toolchains";

/// Per-job log file written inside the build directory
pub const BUILD_LOG_FILE: &str = "buildmatrix.log";

/// CMake generator used for every configuration
pub const CMAKE_GENERATOR: &str = "Ninja";

/// Number of hex digits kept from the option-set digest in directory names
pub const OPTIONS_KEY_LEN: usize = 12;

/// Option space expanded in `all_options_matrix` mode when no settings file
/// declares one. Only `ENABLE_XRAY` and `ENABLE_SANITIZERS` vary.
pub const DEFAULT_OPTION_SPACE: &[(&str, &[&str])] = &[
    ("BUILD_SHARED", &["true"]),
    ("BUILD_TESTING", &["true"]),
    ("BUILD_CORE_SHARED", &["true"]),
    ("ENABLE_LTO", &["false"]),
    ("ENABLE_NATIVE_ARCH", &["false"]),
    ("ENABLE_BUILD_REPORT", &["true"]),
    ("ENABLE_PROFILE", &["true"]),
    ("ENABLE_OPTIMIZATION_REPORT", &["true"]),
    ("ENABLE_XRAY", &["false", "true"]),
    ("ENABLE_SANITIZERS", &["false", "true"]),
    ("ENABLE_RUN_APP_POST_BUILD", &["true"]),
    ("ENABLE_RUN_TESTS_POST_BUILD", &["true"]),
    ("WARNINGS_AS_ERRORS", &["true"]),
];

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
