//! Rule Store - Per-Archive Download Policies
//!
//! Policies come from the edition's archives.xml. Each `archive` element may
//! carry one `facsimile` child whose attributes are the policy.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::warn;

/// Namespace of the edition's XML vocabulary.
pub const FAUST_NS: &str = "http://www.faustedition.net/ns";

/// Archive id used for reproductions of print sources, which are
/// licensing-unencumbered by convention.
pub const PRINT_ARCHIVE: &str = "print";

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Failed to read archives file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse archives XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Archive {archive}: invalid {attribute} value {value:?}")]
    InvalidLimit {
        archive: String,
        attribute: &'static str,
        value: String,
    },
}

/// Whether an archive permits facsimile downloads at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Downloadable {
    Yes,
    No,
    /// Absent or unrecognized policy. Treated as not-yes.
    #[default]
    Unknown,
}

impl Downloadable {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("yes") => Downloadable::Yes,
            Some("no") => Downloadable::No,
            _ => Downloadable::Unknown,
        }
    }
}

/// One archive's facsimile-distribution policy.
///
/// The default rule (everything unset) permits nothing, so an unknown
/// repository id can safely resolve against `RepositoryRule::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryRule {
    pub downloadable: Downloadable,
    pub resolution: Option<String>,
    pub max_width: Option<u32>,
    pub max_dpi: Option<u32>,
}

impl RepositoryRule {
    /// Rule for archives that forbid or never stated a policy.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Rule synthesized for the `print` pseudo-archive.
    pub fn print_default() -> Self {
        Self {
            downloadable: Downloadable::Yes,
            ..Self::default()
        }
    }

    /// Whether the fixed reduced-resolution variant is forced.
    pub fn reduced(&self) -> bool {
        self.resolution.as_deref() == Some("reduced")
    }
}

/// Maps archive ids to their download policy. Loaded once per run, immutable
/// afterwards.
#[derive(Debug)]
pub struct RuleStore {
    rules: HashMap<String, RepositoryRule>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Load the store from an archives.xml file on disk.
    pub fn from_archives_file(path: &Path) -> Result<Self, RuleError> {
        let text = fs::read_to_string(path)?;
        Self::from_archives_xml(&text)
    }

    /// Parse the store from archives.xml text.
    ///
    /// An archive without a `facsimile` element gets an Unknown rule and a
    /// warning; malformed numeric limits are fatal since they indicate a
    /// data-entry mistake that must be fixed at the source.
    pub fn from_archives_xml(text: &str) -> Result<Self, RuleError> {
        let doc = roxmltree::Document::parse(text)?;
        let mut store = Self::new();

        for archive in doc
            .descendants()
            .filter(|n| n.has_tag_name((FAUST_NS, "archive")))
        {
            let Some(id) = archive.attribute("id") else {
                continue;
            };
            let facsimile = archive
                .children()
                .find(|n| n.has_tag_name((FAUST_NS, "facsimile")));
            let rule = match facsimile {
                Some(el) => parse_rule(id, &el)?,
                None => {
                    warn!(archive = id, "No facsimile element, assuming unknown policy");
                    RepositoryRule::unknown()
                }
            };
            store.rules.insert(id.to_string(), rule);
        }

        if !store.rules.contains_key(PRINT_ARCHIVE) {
            store
                .rules
                .insert(PRINT_ARCHIVE.to_string(), RepositoryRule::print_default());
        }

        Ok(store)
    }

    /// Look up one archive's rule. Missing archives resolve to the
    /// permit-nothing default.
    pub fn get(&self, archive: &str) -> RepositoryRule {
        self.rules.get(archive).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_rule(archive: &str, el: &roxmltree::Node) -> Result<RepositoryRule, RuleError> {
    Ok(RepositoryRule {
        downloadable: Downloadable::parse(el.attribute("downloadable")),
        resolution: el.attribute("resolution").map(str::to_string),
        max_width: parse_limit(archive, "max-width", el.attribute("max-width"))?,
        max_dpi: parse_limit(archive, "max-dpi", el.attribute("max-dpi"))?,
    })
}

fn parse_limit(
    archive: &str,
    attribute: &'static str,
    value: Option<&str>,
) -> Result<Option<u32>, RuleError> {
    match value {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|_| RuleError::InvalidLimit {
                archive: archive.to_string(),
                attribute,
                value: raw.to_string(),
            }),
    }
}
