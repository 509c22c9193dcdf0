//! Name formatting helpers
//!
//! Pure string transforms used for display and for the names stacks get
//! on the provider side.

use crate::path::SEPARATOR;
use heck::ToSnakeCase;

/// Split a stack or group name into its path segments
///
/// `"dev/ew1/jump-host"` → `["dev", "ew1", "jump-host"]`
#[must_use]
pub fn name_segments(name: &str) -> Vec<&str> {
    name.split(SEPARATOR).collect()
}

/// Name a stack is given on the provider side
///
/// `("prj", "dev/ew1/jump-host")` → `"prj-dev-ew1-jump-host"`
#[must_use]
pub fn external_stack_name(project_code: &str, stack_name: &str) -> String {
    format!("{project_code}-{}", stack_name.replace(SEPARATOR, "-"))
}

/// Mask all but the last four characters of `key` with `*`
///
/// Keys of four characters or fewer are returned as-is.
#[must_use]
pub fn mask_key(key: &str) -> String {
    let masked = key.chars().count().saturating_sub(4);
    key.chars()
        .enumerate()
        .map(|(i, c)| if i < masked { '*' } else { c })
        .collect()
}

/// `"ASGScalingProcesses"` → `"asg_scaling_processes"`
#[must_use]
pub fn camel_to_snake_case(name: &str) -> String {
    name.to_snake_case()
}
