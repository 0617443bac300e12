use crate::error::{ReleaseError, Result};
use regex::{Captures, Regex};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::sync::OnceLock;

/// Matches the authoritative `version = "..." # auto` line of the primary manifest.
const MANIFEST_VERSION_PATTERN: &str = r#"(?m)^version = "(?P<value>(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(?P<marker>-rc)?(?P<rc>\d*)(?P<suffix>[^"]*))" # auto"#;

/// Matches a bare version string such as `1.2.3` or `1.2.3-rc4`.
const BARE_VERSION_PATTERN: &str = r#"^(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(?P<marker>-rc)?(?P<rc>\d*)(?P<suffix>[^"]*)$"#;

fn manifest_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MANIFEST_VERSION_PATTERN).expect("valid manifest version regex"))
}

fn bare_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(BARE_VERSION_PATTERN).expect("valid bare version regex"))
}

/// Version components in bump order.
///
/// Bumping a component resets every component after it to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum Component {
    Major,
    Minor,
    Patch,
    Rc,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Major,
        Component::Minor,
        Component::Patch,
        Component::Rc,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Component::Major => "major",
            Component::Minor => "minor",
            Component::Patch => "patch",
            Component::Rc => "rc",
        }
    }

    /// Whether bumping this component produces a pre-release
    pub fn is_prerelease(&self) -> bool {
        matches!(self, Component::Rc)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Component {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Component::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ReleaseError::parse(format!(
                    "Unknown version component '{}' - expected one of major, minor, patch, rc",
                    s
                ))
            })
    }
}

/// Semantic version with a single release-candidate track.
///
/// `rc == 0` is a stable release; any other value renders as a `-rc{n}` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub rc: u32,
}

impl Version {
    /// Create a stable version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
            rc: 0,
        }
    }

    /// Create a release candidate
    pub fn with_rc(major: u32, minor: u32, patch: u32, rc: u32) -> Self {
        Version {
            major,
            minor,
            patch,
            rc,
        }
    }

    pub fn is_prerelease(&self) -> bool {
        self.rc > 0
    }

    /// Increment `component` and zero every component after it.
    ///
    /// Fails when the component is already at `u32::MAX`.
    pub fn increment(&self, component: Component) -> Result<Self> {
        let field = match component {
            Component::Major => self.major,
            Component::Minor => self.minor,
            Component::Patch => self.patch,
            Component::Rc => self.rc,
        };
        let bumped = field.checked_add(1).ok_or_else(|| ReleaseError::InvalidVersion {
            version: self.to_string(),
            reason: format!("{} component cannot be incremented past {}", component, u32::MAX),
        })?;

        Ok(match component {
            Component::Major => Version::new(bumped, 0, 0),
            Component::Minor => Version::new(self.major, bumped, 0),
            Component::Patch => Version::new(self.major, self.minor, bumped),
            Component::Rc => Version { rc: bumped, ..*self },
        })
    }

    /// Release tag for this version (e.g. `v1.2.3-rc1`)
    pub fn tag(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.rc > 0 {
            write!(f, "-rc{}", self.rc)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ReleaseError;

    /// Parse bare version text with the same tolerance as manifest parsing.
    fn from_str(s: &str) -> Result<Self> {
        let caps = bare_regex().captures(s.trim()).ok_or_else(|| {
            ReleaseError::parse(format!(
                "Invalid version format: '{}' - expected X.Y.Z or X.Y.Z-rcN",
                s
            ))
        })?;
        let (version, _) = decode(&caps);
        Ok(version)
    }
}

/// Non-fatal observations made while parsing a manifest version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A numeric field could not be read and was coerced to zero
    Coerced { component: Component, raw: String },
    /// Text after the version inside the quotes, dropped on rewrite
    DiscardedSuffix(String),
    /// Another `# auto` version line that is ignored
    DuplicateField { line: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Coerced { component, raw } => write!(
                f,
                "{} component '{}' is not a valid number; treating it as 0",
                component, raw
            ),
            Diagnostic::DiscardedSuffix(suffix) => write!(
                f,
                "version suffix '{}' is not understood and will be dropped",
                suffix
            ),
            Diagnostic::DuplicateField { line } => write!(
                f,
                "additional auto-managed version field on line {} is ignored",
                line
            ),
        }
    }
}

/// Version found in a manifest, with the byte span of its quoted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVersion {
    pub version: Version,
    /// Byte range of the text between the quotes
    pub span: Range<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedVersion {
    /// Original text of the version value
    pub fn raw<'a>(&self, manifest_text: &'a str) -> &'a str {
        &manifest_text[self.span.clone()]
    }
}

/// Numeric field that tolerates malformed input by coercing it to zero.
fn coerce(caps: &Captures, group: &str, component: Component, diags: &mut Vec<Diagnostic>) -> u32 {
    let raw = caps.name(group).map(|m| m.as_str()).unwrap_or("");
    match raw.parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            // Empty rc digits without the marker is just a stable version.
            let marker = caps.name("marker").is_some();
            if !(component == Component::Rc && raw.is_empty() && !marker) {
                diags.push(Diagnostic::Coerced {
                    component,
                    raw: raw.to_string(),
                });
            }
            0
        }
    }
}

fn decode(caps: &Captures) -> (Version, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let version = Version {
        major: coerce(caps, "major", Component::Major, &mut diagnostics),
        minor: coerce(caps, "minor", Component::Minor, &mut diagnostics),
        patch: coerce(caps, "patch", Component::Patch, &mut diagnostics),
        rc: coerce(caps, "rc", Component::Rc, &mut diagnostics),
    };
    if let Some(suffix) = caps.name("suffix").filter(|m| !m.as_str().is_empty()) {
        diagnostics.push(Diagnostic::DiscardedSuffix(suffix.as_str().to_string()));
    }
    (version, diagnostics)
}

/// Locate the auto-managed version field in manifest text.
///
/// The first `version = "..." # auto` line wins. Malformed numbers are read as
/// zero and reported through [`ParsedVersion::diagnostics`].
///
/// # Example
/// ```
/// use bump_release::version::{parse, Version};
///
/// let parsed = parse("[package]\nversion = \"1.2.3-rc2\" # auto\n").unwrap();
/// assert_eq!(parsed.version, Version::with_rc(1, 2, 3, 2));
/// ```
pub fn parse(manifest_text: &str) -> Result<ParsedVersion> {
    let mut matches = manifest_regex().captures_iter(manifest_text);

    let caps = matches.next().ok_or_else(|| {
        ReleaseError::parse("no line matching `version = \"X.Y.Z\" # auto` found in manifest")
    })?;
    let value = caps
        .name("value")
        .ok_or_else(|| ReleaseError::parse("version value not captured"))?;
    let (version, mut diagnostics) = decode(&caps);

    for extra in matches {
        if let Some(m) = extra.get(0) {
            let line = manifest_text[..m.start()].matches('\n').count() + 1;
            diagnostics.push(Diagnostic::DuplicateField { line });
        }
    }

    Ok(ParsedVersion {
        version,
        span: value.range(),
        diagnostics,
    })
}

/// Compute the next version for `component`.
pub fn increment(version: &Version, component: Component) -> Result<Version> {
    version.increment(component)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(value: &str) -> String {
        format!(
            "[workspace.package]\nversion = \"{}\" # auto\nedition = \"2021\"\n",
            value
        )
    }

    fn parsed(value: &str) -> Version {
        parse(&manifest(value)).unwrap().version
    }

    #[test]
    fn test_parse_stable() {
        let p = parse(&manifest("1.2.3")).unwrap();
        assert_eq!(p.version, Version::new(1, 2, 3));
        assert!(p.diagnostics.is_empty());
    }

    #[test]
    fn test_parse_release_candidate() {
        assert_eq!(parsed("1.9.9-rc2"), Version::with_rc(1, 9, 9, 2));
    }

    #[test]
    fn test_parse_span_covers_quoted_value() {
        let text = manifest("10.20.30-rc4");
        let p = parse(&text).unwrap();
        assert_eq!(p.raw(&text), "10.20.30-rc4");
    }

    #[test]
    fn test_parse_missing_field() {
        let err = parse("[package]\nversion = \"1.2.3\"\n").unwrap_err();
        assert!(matches!(err, ReleaseError::Parse(_)));
    }

    #[test]
    fn test_parse_requires_line_start() {
        assert!(parse("  version = \"1.2.3\" # auto\n").is_err());
    }

    #[test]
    fn test_format_parse_round_trip() {
        for s in ["0.0.0", "1.2.3", "10.0.7", "1.2.3-rc1", "4.5.6-rc12"] {
            assert_eq!(parsed(s).to_string(), s);
            assert_eq!(s.parse::<Version>().unwrap().to_string(), s);
        }
    }

    // Malformed numbers are read as zero instead of failing the parse.
    #[test]
    fn test_rc_marker_without_digits_coerces_to_zero() {
        let p = parse(&manifest("1.2.3-rc")).unwrap();
        assert_eq!(p.version, Version::new(1, 2, 3));
        assert_eq!(
            p.diagnostics,
            vec![Diagnostic::Coerced {
                component: Component::Rc,
                raw: String::new(),
            }]
        );
    }

    #[test]
    fn test_overflowing_number_coerces_to_zero() {
        let p = parse(&manifest("1.99999999999999999999.3")).unwrap();
        assert_eq!(p.version, Version::new(1, 0, 3));
        assert!(matches!(
            p.diagnostics.as_slice(),
            [Diagnostic::Coerced {
                component: Component::Minor,
                ..
            }]
        ));
    }

    #[test]
    fn test_unknown_suffix_is_reported() {
        let p = parse(&manifest("1.2.3-beta.1")).unwrap();
        assert_eq!(p.version, Version::new(1, 2, 3));
        assert_eq!(
            p.diagnostics,
            vec![Diagnostic::DiscardedSuffix("-beta.1".to_string())]
        );
    }

    #[test]
    fn test_duplicate_field_uses_first() {
        let text = "version = \"1.0.0\" # auto\nversion = \"2.0.0\" # auto\n";
        let p = parse(text).unwrap();
        assert_eq!(p.version, Version::new(1, 0, 0));
        assert_eq!(p.diagnostics, vec![Diagnostic::DuplicateField { line: 2 }]);
    }

    #[test]
    fn test_increment_patch() {
        assert_eq!(increment(&parsed("1.2.3"), Component::Patch).unwrap(), parsed("1.2.4"));
    }

    #[test]
    fn test_increment_minor() {
        assert_eq!(increment(&parsed("1.2.3"), Component::Minor).unwrap(), parsed("1.3.0"));
    }

    #[test]
    fn test_increment_major_clears_rc() {
        assert_eq!(increment(&parsed("1.9.9-rc2"), Component::Major).unwrap(), parsed("2.0.0"));
    }

    #[test]
    fn test_increment_rc() {
        assert_eq!(increment(&parsed("1.2.3"), Component::Rc).unwrap(), parsed("1.2.3-rc1"));
        assert_eq!(increment(&parsed("1.2.3-rc1"), Component::Rc).unwrap(), parsed("1.2.3-rc2"));
    }

    #[test]
    fn test_increment_patch_clears_rc() {
        assert_eq!(increment(&parsed("1.2.3-rc5"), Component::Patch).unwrap(), parsed("1.2.4"));
    }

    #[test]
    fn test_increment_at_u32_max_fails() {
        let p = parse(&manifest("4294967295.0.0")).unwrap();
        assert!(p.diagnostics.is_empty());

        let err = increment(&p.version, Component::Major).unwrap_err();
        assert!(matches!(err, ReleaseError::InvalidVersion { ref version, .. } if version == "4294967295.0.0"));

        let max_rc = Version::with_rc(1, 2, 3, u32::MAX);
        assert!(increment(&max_rc, Component::Rc).is_err());
        assert_eq!(increment(&max_rc, Component::Patch).unwrap(), Version::new(1, 2, 4));
    }

    #[test]
    fn test_component_from_str() {
        assert_eq!("major".parse::<Component>().unwrap(), Component::Major);
        assert_eq!("RC".parse::<Component>().unwrap(), Component::Rc);
        assert!("build".parse::<Component>().is_err());
    }

    #[test]
    fn test_tag_prefix() {
        assert_eq!(Version::with_rc(2, 0, 0, 1).tag("v"), "v2.0.0-rc1");
    }

    #[test]
    fn test_bare_version_invalid() {
        assert!("1.2".parse::<Version>().is_err());
        assert!("v1.2.3".parse::<Version>().is_err());
    }
}
