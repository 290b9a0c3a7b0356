//! Validated build parameters.

use std::fmt;
use std::str::FromStr;

use crate::error::{BuildError, Result};

/// Supported devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    A51,
    F41,
    M31s,
    M31,
    M21,
}

impl Target {
    pub const ALL: [Target; 5] = [
        Target::A51,
        Target::F41,
        Target::M31s,
        Target::M31,
        Target::M21,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Target::A51 => "a51",
            Target::F41 => "f41",
            Target::M31s => "m31s",
            Target::M31 => "m31",
            Target::M21 => "m21",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        Target::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let supported = Target::ALL
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join("/");
                BuildError::InvalidRequest(format!(
                    "unsupported target '{}'; expected one of: {}",
                    s, supported
                ))
            })
    }
}

/// Software distribution the kernel is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Baseline; adds no extra fragment.
    OneUi,
    Aosp,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::OneUi => "OneUI",
            Variant::Aosp => "AOSP",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub target: Target,
    pub variant: Variant,
    pub include_root_support: bool,
    pub allow_dirty_output: bool,
}

impl BuildRequest {
    /// Validate raw selector values.
    ///
    /// Exactly one of `oneui` / `aosp` must be set and `target` must name a
    /// supported device.
    pub fn new(
        target: &str,
        oneui: bool,
        aosp: bool,
        include_root_support: bool,
        allow_dirty_output: bool,
    ) -> Result<Self> {
        let variant = match (oneui, aosp) {
            (true, false) => Variant::OneUi,
            (false, true) => Variant::Aosp,
            (true, true) => {
                return Err(BuildError::InvalidRequest(
                    "variants OneUI and AOSP are mutually exclusive; pick one".to_string(),
                ))
            }
            (false, false) => {
                return Err(BuildError::InvalidRequest(
                    "please specify one of the following variants: --oneui or --aosp".to_string(),
                ))
            }
        };
        let target = target.parse()?;

        Ok(Self {
            target,
            variant,
            include_root_support,
            allow_dirty_output,
        })
    }
}
