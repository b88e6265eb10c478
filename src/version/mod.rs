// src/version/mod.rs

//! Version parsing and ordering for repository coordinates
//!
//! Versions parse into a numeric `VersionNumber` (major.minor.revision plus
//! an optional qualifier) when they fit the strict numeric grammar, and fall
//! back to `GenericVersion` (alternating digit/alphabetic run comparison)
//! otherwise. Both kinds share one total ordering through the `Version` enum,
//! and that ordering is what conflict resolution and metadata selection use.

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

mod resolution;
pub use resolution::VersionResolution;

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:([.-])(.*[^.-]))?$").unwrap()
});

/// Qualifier ranks, low to high. Recognized tokens compare by rank alone;
/// unrecognized tokens share `RANK_OTHER` and break ties lexicographically.
const RANK_ALPHA: u8 = 1;
const RANK_BETA: u8 = 2;
const RANK_MILESTONE: u8 = 3;
const RANK_RC: u8 = 4;
const RANK_SNAPSHOT: u8 = 5;
const RANK_OTHER: u8 = 6;
const RANK_RELEASE: u8 = 7;
const RANK_SP: u8 = 8;

fn qualifier_rank(qualifier: &str) -> u8 {
    match qualifier.to_lowercase().as_str() {
        "alpha" => RANK_ALPHA,
        "beta" => RANK_BETA,
        "milestone" => RANK_MILESTONE,
        "rc" | "cr" => RANK_RC,
        "snapshot" => RANK_SNAPSHOT,
        "" | "release" | "final" | "ga" => RANK_RELEASE,
        "sp" => RANK_SP,
        _ => RANK_OTHER,
    }
}

/// A numeric version: major.minor.revision plus an optional qualifier
///
/// Missing minor/revision components are distinct from zero for rendering
/// (`1.0` round-trips as `1.0`, not `1.0.0`) but compare as zero, so
/// `1.0 == 1.0.0`. The separator preceding the qualifier (`.` or `-`) is
/// preserved for rendering and ignored for comparison.
#[derive(Debug, Clone)]
pub struct VersionNumber {
    pub major: u64,
    pub minor: Option<u64>,
    pub revision: Option<u64>,
    pub qualifier: Option<String>,
    pub separator: char,
}

impl VersionNumber {
    /// Sentinel for "no declared version"
    pub const UNKNOWN: VersionNumber = VersionNumber {
        major: 0,
        minor: Some(0),
        revision: Some(0),
        qualifier: None,
        separator: '-',
    };

    pub fn new(major: u64, minor: Option<u64>, revision: Option<u64>) -> Self {
        Self {
            major,
            minor,
            revision,
            qualifier: None,
            separator: '-',
        }
    }

    pub fn with_qualifier(
        major: u64,
        minor: Option<u64>,
        revision: Option<u64>,
        qualifier: &str,
    ) -> Self {
        Self {
            major,
            minor,
            revision,
            qualifier: if qualifier.is_empty() {
                None
            } else {
                Some(qualifier.to_string())
            },
            separator: '-',
        }
    }

    /// Parse the strict numeric grammar
    ///
    /// Accepts `major[.minor[.revision]][sep qualifier]` where `sep` is `.`
    /// or `-` and the qualifier does not end in a separator. Anything else,
    /// including underscore-joined segments like "1_2", is rejected and left
    /// to the generic fallback.
    pub fn parse(version: &str) -> Option<Self> {
        let captures = VERSION_PATTERN.captures(version)?;

        let major = captures.get(1)?.as_str().parse::<u64>().ok()?;
        let minor = match captures.get(2) {
            Some(m) => Some(m.as_str().parse::<u64>().ok()?),
            None => None,
        };
        let revision = match captures.get(3) {
            Some(m) => Some(m.as_str().parse::<u64>().ok()?),
            None => None,
        };
        let separator = captures
            .get(4)
            .and_then(|m| m.as_str().chars().next())
            .unwrap_or('-');
        let qualifier = captures.get(5).map(|m| m.as_str().to_string());

        Some(Self {
            major,
            minor,
            revision,
            qualifier,
            separator,
        })
    }

    pub fn is_unknown(&self) -> bool {
        self.compare(&Self::UNKNOWN) == Ordering::Equal
    }

    /// Whether the qualifier marks a snapshot build
    pub fn is_snapshot(&self) -> bool {
        self.qualifier
            .as_deref()
            .is_some_and(|q| q.to_uppercase().ends_with("SNAPSHOT"))
    }

    fn qualifier_str(&self) -> &str {
        self.qualifier.as_deref().unwrap_or("")
    }

    /// Compare two numeric versions
    ///
    /// Major, minor, revision first (missing components count as zero), then
    /// the qualifier rank ladder: alpha < beta < milestone < rc/cr <
    /// snapshot < unrecognized < none/release/final/ga < sp. Unrecognized
    /// qualifiers of equal rank compare case-insensitively.
    pub fn compare(&self, other: &VersionNumber) -> Ordering {
        match self.major.cmp(&other.major) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.minor.unwrap_or(0).cmp(&other.minor.unwrap_or(0)) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.revision.unwrap_or(0).cmp(&other.revision.unwrap_or(0)) {
            Ordering::Equal => {}
            ord => return ord,
        }

        let rank = qualifier_rank(self.qualifier_str());
        let other_rank = qualifier_rank(other.qualifier_str());
        match rank.cmp(&other_rank) {
            Ordering::Equal if rank == RANK_OTHER => self
                .qualifier_str()
                .to_lowercase()
                .cmp(&other.qualifier_str().to_lowercase()),
            ord => ord,
        }
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{}", minor)?;
        }
        if let Some(revision) = self.revision {
            write!(f, ".{}", revision)?;
        }
        if let Some(ref qualifier) = self.qualifier {
            write!(f, "{}{}", self.separator, qualifier)?;
        }
        Ok(())
    }
}

impl PartialEq for VersionNumber {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for VersionNumber {}

impl Hash for VersionNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.unwrap_or(0).hash(state);
        self.revision.unwrap_or(0).hash(state);
        let rank = qualifier_rank(self.qualifier_str());
        rank.hash(state);
        if rank == RANK_OTHER {
            self.qualifier_str().to_lowercase().hash(state);
        }
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One run of a generic version string, either digits or everything else
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Run {
    /// Lowest; stands in for missing trailing runs
    Empty,
    /// Lowercased alphabetic run
    Alpha(String),
    /// Digit run with leading zeros trimmed, compared by (length, digits)
    Numeric(String),
}

impl Run {
    fn numeric(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            Run::Numeric("0".to_string())
        } else {
            Run::Numeric(trimmed.to_string())
        }
    }

    fn compare(&self, other: &Run) -> Ordering {
        match (self, other) {
            (Run::Numeric(a), Run::Numeric(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            _ => self.cmp(other),
        }
    }
}

fn tokenize_runs(version: &str) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut current = String::new();
    let mut numeric = false;
    for c in version.chars() {
        if c.is_ascii_digit() {
            if !current.is_empty() && !numeric {
                runs.push(Run::Alpha(current.to_lowercase()));
                current = String::new();
            }
            numeric = true;
            current.push(c);
        } else if c.is_alphanumeric() {
            if !current.is_empty() && numeric {
                runs.push(Run::numeric(&current));
                current = String::new();
            }
            numeric = false;
            current.push(c);
        } else if !current.is_empty() {
            // Separator ends the current run
            if numeric {
                runs.push(Run::numeric(&current));
            } else {
                runs.push(Run::Alpha(current.to_lowercase()));
            }
            current = String::new();
        }
    }
    if !current.is_empty() {
        if numeric {
            runs.push(Run::numeric(&current));
        } else {
            runs.push(Run::Alpha(current.to_lowercase()));
        }
    }
    runs
}

fn compare_runs(left: &[Run], right: &[Run]) -> Ordering {
    let len = left.len().max(right.len());
    for i in 0..len {
        let l = left.get(i).unwrap_or(&Run::Empty);
        let r = right.get(i).unwrap_or(&Run::Empty);
        match l.compare(r) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }
    Ordering::Equal
}

/// Fallback for versions the numeric grammar rejects
///
/// Comparison segments the string into alternating digit/alphabetic runs:
/// digit runs compare numerically, alphabetic runs case-insensitively, a
/// digit run outranks an alphabetic one at the same position, and a shorter
/// sequence is padded with lowest-ranked empty runs.
#[derive(Debug, Clone)]
pub struct GenericVersion {
    version: String,
    runs: Vec<Run>,
}

impl GenericVersion {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            runs: tokenize_runs(version),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        self.version.to_uppercase().ends_with("SNAPSHOT")
    }

    pub fn compare(&self, other: &GenericVersion) -> Ordering {
        compare_runs(&self.runs, &other.runs)
    }
}

impl fmt::Display for GenericVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}

impl PartialEq for GenericVersion {
    fn eq(&self, other: &Self) -> bool {
        self.runs == other.runs
    }
}

impl Eq for GenericVersion {}

impl Hash for GenericVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.runs.hash(state);
    }
}

impl Ord for GenericVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for GenericVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A parsed version of either kind, with one total ordering
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    Number(VersionNumber),
    Generic(GenericVersion),
}

impl Version {
    /// Parse a version string
    ///
    /// Blank input yields the `UNKNOWN` sentinel; input the numeric grammar
    /// rejects yields a generic version.
    pub fn parse(version: &str) -> Self {
        let trimmed = version.trim();
        if trimmed.is_empty() {
            return Version::Number(VersionNumber::UNKNOWN);
        }
        match VersionNumber::parse(trimmed) {
            Some(number) => Version::Number(number),
            None => Version::Generic(GenericVersion::new(trimmed)),
        }
    }

    pub fn unknown() -> Self {
        Version::Number(VersionNumber::UNKNOWN)
    }

    pub fn is_unknown(&self) -> bool {
        match self {
            Version::Number(n) => n.is_unknown(),
            Version::Generic(_) => false,
        }
    }

    pub fn is_snapshot(&self) -> bool {
        match self {
            Version::Number(n) => n.is_snapshot(),
            Version::Generic(g) => g.is_snapshot(),
        }
    }

    pub fn compare(&self, other: &Version) -> Ordering {
        match (self, other) {
            (Version::Number(a), Version::Number(b)) => a.compare(b),
            (Version::Generic(a), Version::Generic(b)) => a.compare(b),
            // Mixed kinds compare by run segmentation of the rendered
            // strings; numeric sorts first on an exact run tie so the order
            // stays total.
            (a, b) => {
                let runs_a = tokenize_runs(&a.to_string());
                let runs_b = tokenize_runs(&b.to_string());
                match compare_runs(&runs_a, &runs_b) {
                    Ordering::Equal => match a {
                        Version::Number(_) => Ordering::Less,
                        Version::Generic(_) => Ordering::Greater,
                    },
                    ord => ord,
                }
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Number(n) => n.fmt(f),
            Version::Generic(g) => g.fmt(f),
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_parse_major_only() {
        let v = VersionNumber::parse("1").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, None);
        assert_eq!(v.revision, None);
        assert_eq!(v.qualifier, None);
    }

    #[test]
    fn test_parse_full_triple() {
        let v = VersionNumber::parse("1.2.3").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, Some(2));
        assert_eq!(v.revision, Some(3));
        assert_eq!(v.qualifier, None);
    }

    #[test]
    fn test_parse_with_qualifier() {
        let v = VersionNumber::parse("1.0-SNAPSHOT").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, Some(0));
        assert_eq!(v.revision, None);
        assert_eq!(v.qualifier, Some("SNAPSHOT".to_string()));
        assert_eq!(v.separator, '-');
    }

    #[test]
    fn test_parse_multi_segment_qualifier() {
        let v = VersionNumber::parse("1.2.3.4-rc1-SNAPSHOT").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, Some(2));
        assert_eq!(v.revision, Some(3));
        assert_eq!(v.separator, '.');
        assert_eq!(v.qualifier, Some("4-rc1-SNAPSHOT".to_string()));
    }

    #[test]
    fn test_parse_rejects_underscore() {
        assert!(VersionNumber::parse("1_2").is_none());
        assert!(matches!(Version::parse("1_2"), Version::Generic(_)));
    }

    #[test]
    fn test_parse_rejects_trailing_separator() {
        assert!(VersionNumber::parse("1.2.3-").is_none());
    }

    #[test]
    fn test_parse_blank_is_unknown() {
        assert!(Version::parse("").is_unknown());
        assert!(Version::parse("   ").is_unknown());
        assert_eq!(VersionNumber::UNKNOWN.to_string(), "0.0.0");
    }

    #[test]
    fn test_display_round_trip() {
        for s in [
            "1",
            "1.0",
            "1.0.0",
            "1.2.3",
            "1.0-SNAPSHOT",
            "2.1.0.beta",
            "1.2.3.4-rc1-SNAPSHOT",
            "11.0.14",
        ] {
            let v = Version::parse(s);
            assert_eq!(v.to_string(), s);
            assert_eq!(Version::parse(&v.to_string()), v);
        }
    }

    #[test]
    fn test_missing_components_compare_as_zero() {
        let a = Version::parse("1.0");
        let b = Version::parse("1.0.0");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert!(Version::parse("1.0") < Version::parse("1.0.1"));
        assert!(Version::parse("1") < Version::parse("1.1"));
    }

    #[test]
    fn test_qualifier_ladder() {
        let ladder = [
            "1.1.1-alpha",
            "1.1.1-beta",
            "1.1.1-milestone",
            "1.1.1-rc",
            "1.1.1-SNAPSHOT",
            "1.1.1-zeta",
            "1.1.1",
            "1.1.1-sp",
        ];
        for pair in ladder.windows(2) {
            let lower = Version::parse(pair[0]);
            let higher = Version::parse(pair[1]);
            assert!(lower < higher, "{} should sort below {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_qualifier_rank_ties_are_equal() {
        let rc = Version::parse("1.0-rc");
        let cr = Version::parse("1.0-CR");
        assert_eq!(rc, cr);
        assert_eq!(hash_of(&rc), hash_of(&cr));

        let plain = Version::parse("1.1.1");
        for alias in ["1.1.1-RELEASE", "1.1.1-final", "1.1.1-ga"] {
            let v = Version::parse(alias);
            assert_eq!(plain, v);
            assert_eq!(hash_of(&plain), hash_of(&v));
        }
    }

    #[test]
    fn test_unrecognized_qualifiers_compare_lexically() {
        assert!(Version::parse("1.0-aardvark") < Version::parse("1.0-zebra"));
        assert_eq!(Version::parse("1.0-Custom"), Version::parse("1.0-custom"));
    }

    #[test]
    fn test_no_qualifier_outranks_prerelease() {
        assert!(Version::parse("1.1.1-rc") < Version::parse("1.1.1"));
        assert!(Version::parse("1.1.1") < Version::parse("1.1.1-sp"));
        assert!(Version::parse("1.1.1-alpha") < Version::parse("1.1.1-RELEASE"));
    }

    #[test]
    fn test_ordering_transitive_with_numbers() {
        let a = Version::parse("1.0.9");
        let b = Version::parse("1.1.0-beta");
        let c = Version::parse("1.1.0");
        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
    }

    #[test]
    fn test_generic_run_comparison() {
        assert!(Version::parse("1_2") < Version::parse("1_10"));
        assert!(Version::parse("build-a") < Version::parse("build-b"));
        // Digit run outranks alphabetic run at the same position
        assert!(Version::parse("1_a") < Version::parse("1_2"));
        // Shorter sequence pads with lowest
        assert!(Version::parse("1_2") < Version::parse("1_2_1"));
    }

    #[test]
    fn test_generic_numeric_runs_ignore_leading_zeros() {
        let a = Version::parse("1_02");
        let b = Version::parse("1_2");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_mixed_kind_comparison() {
        // Generic "1_5" against numeric shapes
        assert!(Version::parse("1_5") < Version::parse("1.10"));
        assert!(Version::parse("1.2") < Version::parse("1_5"));
    }

    #[test]
    fn test_snapshot_detection() {
        assert!(Version::parse("1.0-SNAPSHOT").is_snapshot());
        assert!(Version::parse("1.2.3.4-rc1-SNAPSHOT").is_snapshot());
        assert!(!Version::parse("1.0").is_snapshot());
        assert!(!Version::parse("1.0-rc").is_snapshot());
        assert!(Version::parse("experimental-SNAPSHOT").is_snapshot());
    }

    #[test]
    fn test_max_of_versions() {
        let mut versions: Vec<Version> = ["1.0", "2.0-beta", "1.9.9", "2.0-alpha"]
            .iter()
            .map(|s| Version::parse(s))
            .collect();
        versions.sort();
        assert_eq!(versions.last().map(|v| v.to_string()).as_deref(), Some("2.0-beta"));
    }
}
