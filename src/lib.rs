//! Facsimile Core - Download Eligibility Resolver
//!
//! Decides, for every facsimile page of the edition, which resolution-scaled
//! image variant (if any) the holding archive's policy allows us to publish
//! for download.
//!
//! # The Ground Rules
//! 1. Archives Own Their Policy (archives.xml is authoritative)
//! 2. Highest Allowed Resolution Wins (ascending variant scan)
//! 3. Missing Policy Means No Download
//! 4. Missing Images Never Abort The Batch

pub mod rules;
pub mod policy;
pub mod inspect;
pub mod resolver;
pub mod metadata;
pub mod report;

pub use rules::{Downloadable, RepositoryRule, RuleError, RuleStore};
pub use policy::{Allowance, Violation};
pub use inspect::{FsInspector, ImageInspector};
pub use resolver::find_allowed_facsimile;
pub use metadata::{MetadataError, PageRecord};
pub use report::{write_report, AllowanceRow};

/// Variant indices run from 0 (master) to 8 (smallest rendition).
pub const MAX_VARIANT: u32 = 8;
/// Variant forced by the "reduced" resolution policy.
pub const REDUCED_VARIANT: u32 = 2;
/// Assumed DPI when an image carries no resolution metadata.
pub const DEFAULT_DPI: u32 = 300;
