//! Policy Evaluation - Pure Rule Checks
//!
//! Rule checks produce structured violations; the resolver maps them to an
//! Allowance. No I/O happens here, so the policy semantics are testable
//! without a filesystem fixture.

use std::fmt;

use serde::Serialize;

use crate::rules::{Downloadable, RepositoryRule};

/// Why one image variant was rejected.
///
/// Serialized to the short tags the report format uses: `forbidden`,
/// `max-width:N`, `max-dpi:N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Archive does not permit downloads at all.
    Forbidden,
    /// Variant is wider than the archive allows.
    MaxWidth(u32),
    /// Variant's resolution exceeds the archive's cap.
    MaxDpi(u32),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Forbidden => write!(f, "forbidden"),
            Violation::MaxWidth(limit) => write!(f, "max-width:{limit}"),
            Violation::MaxDpi(limit) => write!(f, "max-dpi:{limit}"),
        }
    }
}

impl RepositoryRule {
    /// Check one variant's width and dpi against this rule set.
    ///
    /// Fixed precedence, first match wins. Absent limits are unconstrained,
    /// and a value exactly equal to a limit is allowed.
    pub fn check(&self, width: u32, dpi: u32) -> Option<Violation> {
        if self.downloadable != Downloadable::Yes {
            return Some(Violation::Forbidden);
        }
        if let Some(max_width) = self.max_width {
            if width > max_width {
                return Some(Violation::MaxWidth(max_width));
            }
        }
        if let Some(max_dpi) = self.max_dpi {
            if dpi > max_dpi {
                return Some(Violation::MaxDpi(max_dpi));
            }
        }
        None
    }
}

/// Outcome of resolving one page.
///
/// `reason` carries the violation tag of the last *rejected* variant. It may
/// be non-empty even when a download was found: the scan records why the
/// next-larger variant was refused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Allowance {
    /// Filename of the chosen variant, relative to the image root.
    pub download: Option<String>,
    /// Chosen variant index, 0 (master) to 8.
    pub variant: Option<u32>,
    /// Violation tag of the last rejected attempt, or empty.
    pub reason: String,
    /// Chosen variant's pixel width, when discovered by scanning.
    pub width: Option<u32>,
    /// Chosen variant's dpi, when discovered by scanning.
    pub dpi: Option<u32>,
}

impl Allowance {
    /// A resolution that found no downloadable variant.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            ..Self::default()
        }
    }

    /// The fixed reduced-resolution override. Width and dpi stay unreported
    /// since the variant was dictated by policy, not discovered.
    pub fn reduced(path: &str) -> Self {
        Self {
            download: Some(format!("{path}_{}.jpg", crate::REDUCED_VARIANT)),
            variant: Some(crate::REDUCED_VARIANT),
            ..Self::default()
        }
    }

    /// A variant found by the ascending scan.
    pub fn found(
        filename: String,
        variant: u32,
        last_violation: Option<Violation>,
        width: u32,
        dpi: u32,
    ) -> Self {
        Self {
            download: Some(filename),
            variant: Some(variant),
            reason: last_violation.map(|v| v.to_string()).unwrap_or_default(),
            width: Some(width),
            dpi: Some(dpi),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.download.is_some()
    }
}
