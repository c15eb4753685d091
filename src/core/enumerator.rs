//! Configuration enumeration
//!
//! Expands requested platforms, architectures and build types (and, in matrix
//! mode, every combination of option values) into an ordered list of
//! [`BuildJob`]s.
//!
//! Ordering is platform outer, then architecture, then build type, then
//! option combinations with the first declared option varying slowest. The
//! same inputs always give the same list.

use std::collections::HashSet;
use std::hash::Hash;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::config::defaults::DEFAULT_OPTION_SPACE;
use crate::core::job::{Arch, BuildJob, BuildType, JobOption, Platform};
use crate::error::ConfigurationError;

/// Ordered mapping of option name to candidate values
pub type OptionSpace = IndexMap<String, Vec<String>>;

/// The option space expanded when none is configured
pub fn default_option_space() -> OptionSpace {
    DEFAULT_OPTION_SPACE
        .iter()
        .map(|(name, values)| {
            (
                (*name).to_string(),
                values.iter().map(|v| (*v).to_string()).collect(),
            )
        })
        .collect()
}

/// Split a comma-separated list, dropping empty entries
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// N-ary Cartesian product
///
/// The first axis varies slowest. No axes yields a single empty combination,
/// any empty axis yields no combinations.
pub fn cartesian_product<T: Clone>(axes: &[Vec<T>]) -> Vec<Vec<T>> {
    axes.iter().fold(vec![Vec::new()], |acc, axis| {
        acc.iter()
            .flat_map(|prefix| {
                axis.iter().map(move |value| {
                    let mut combo = prefix.clone();
                    combo.push(value.clone());
                    combo
                })
            })
            .collect()
    })
}

/// Number of jobs [`enumerate`] produces for already-deduplicated inputs
pub fn job_count(platforms: usize, archs: usize, build_types: usize, space: &OptionSpace) -> usize {
    platforms * archs * build_types * space.values().map(Vec::len).product::<usize>()
}

fn parse_unique<T>(names: &[impl AsRef<str>]) -> Result<Vec<T>, ConfigurationError>
where
    T: FromStr<Err = ConfigurationError> + Eq + Hash + Copy,
{
    let mut seen = HashSet::new();
    let mut values = Vec::with_capacity(names.len());
    for name in names {
        let value = name.as_ref().parse::<T>()?;
        if seen.insert(value) {
            values.push(value);
        }
    }
    Ok(values)
}

fn is_valid_option_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check every option has a usable name and at least one candidate value
pub fn validate_option_space(space: &OptionSpace) -> Result<(), ConfigurationError> {
    for (name, values) in space {
        if !is_valid_option_name(name) {
            return Err(ConfigurationError::InvalidOptionName { name: name.clone() });
        }
        if values.is_empty() {
            return Err(ConfigurationError::EmptyOptionValues { name: name.clone() });
        }
    }
    Ok(())
}

/// Expand the requested configuration sets into build jobs
///
/// Every name is validated before any job is produced. Duplicate input
/// names are collapsed to their first occurrence, as are duplicate option
/// values. An empty `option_space` gives jobs without options.
pub fn enumerate(
    platforms: &[impl AsRef<str>],
    archs: &[impl AsRef<str>],
    build_types: &[impl AsRef<str>],
    option_space: &OptionSpace,
) -> Result<Vec<BuildJob>, ConfigurationError> {
    let platforms: Vec<Platform> = parse_unique(platforms)?;
    let archs: Vec<Arch> = parse_unique(archs)?;
    let build_types: Vec<BuildType> = parse_unique(build_types)?;
    validate_option_space(option_space)?;

    let names: Vec<&String> = option_space.keys().collect();
    let value_axes: Vec<Vec<String>> = option_space
        .values()
        .map(|values| {
            let mut seen = HashSet::new();
            values
                .iter()
                .filter(|v| seen.insert(v.as_str()))
                .cloned()
                .collect()
        })
        .collect();
    let combinations = cartesian_product(&value_axes);

    let mut jobs = Vec::with_capacity(
        platforms.len() * archs.len() * build_types.len() * combinations.len(),
    );
    for &platform in &platforms {
        for &arch in &archs {
            for &build_type in &build_types {
                for combo in &combinations {
                    jobs.push(BuildJob {
                        platform,
                        arch,
                        build_type,
                        options: names
                            .iter()
                            .zip(combo)
                            .map(|(name, value)| JobOption {
                                name: (*name).clone(),
                                value: value.clone(),
                            })
                            .collect(),
                    });
                }
            }
        }
    }

    tracing::debug!(
        "Enumerated {} platforms x {} arch x {} build types x {} option combinations = {} jobs",
        platforms.len(),
        archs.len(),
        build_types.len(),
        combinations.len(),
        jobs.len()
    );

    Ok(jobs)
}
