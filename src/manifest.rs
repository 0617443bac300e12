//! Primary manifest rewriting.
//!
//! The version value is replaced through the byte span captured at parse time,
//! so the rest of the file (comments, ordering, line endings) is untouched.

use crate::error::{ReleaseError, Result};
use crate::version::{ParsedVersion, Version};
use std::fs;
use std::path::Path;

/// Replace the parsed version value with the canonical text of `version`.
///
/// # Example
/// ```
/// use bump_release::manifest::rewrite;
/// use bump_release::version::{parse, Version};
///
/// let text = "[package]\r\nversion = \"0.9.1\" # auto\r\n";
/// let parsed = parse(text).unwrap();
/// let updated = rewrite(text, &parsed, &Version::new(1, 0, 0)).unwrap();
/// assert_eq!(updated, "[package]\r\nversion = \"1.0.0\" # auto\r\n");
/// ```
pub fn rewrite(manifest_text: &str, parsed: &ParsedVersion, version: &Version) -> Result<String> {
    let span = parsed.span.clone();
    if span.end > manifest_text.len()
        || !manifest_text.is_char_boundary(span.start)
        || !manifest_text.is_char_boundary(span.end)
    {
        return Err(ReleaseError::parse(format!(
            "version span {:?} does not belong to this manifest",
            span
        )));
    }

    let rendered = version.to_string();
    let mut out = String::with_capacity(manifest_text.len() - span.len() + rendered.len());
    out.push_str(&manifest_text[..span.start]);
    out.push_str(&rendered);
    out.push_str(&manifest_text[span.end..]);
    Ok(out)
}

/// Read a manifest file as UTF-8 text
pub fn read_manifest(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        ReleaseError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot read manifest {}: {}", path.display(), e),
        ))
    })
}

/// Write manifest text back to disk unchanged apart from the caller's edits
pub fn write_manifest(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|e| {
        ReleaseError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot write manifest {}: {}", path.display(), e),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{parse, Component};

    const WORKSPACE_MANIFEST: &str = r#"[workspace]
members = ["cpp-linter", "bindings/node"]

[workspace.package]
# the release script owns this line
version = "2.0.0-rc3" # auto
authors = ["someone"]
description = "version = \"9.9.9\" # auto is only matched at line start"
"#;

    #[test]
    fn test_rewrite_replaces_only_version() {
        let parsed = parse(WORKSPACE_MANIFEST).unwrap();
        let next = parsed.version.increment(Component::Rc).unwrap();
        let updated = rewrite(WORKSPACE_MANIFEST, &parsed, &next).unwrap();

        assert_eq!(
            updated,
            WORKSPACE_MANIFEST.replace("\"2.0.0-rc3\" # auto", "\"2.0.0-rc4\" # auto")
        );
    }

    #[test]
    fn test_rewrite_drops_rc_suffix_for_stable() {
        let parsed = parse(WORKSPACE_MANIFEST).unwrap();
        let next = parsed.version.increment(Component::Patch).unwrap();
        let updated = rewrite(WORKSPACE_MANIFEST, &parsed, &next).unwrap();

        assert!(updated.contains("\nversion = \"2.0.1\" # auto\n"));
        assert_eq!(parse(&updated).unwrap().version, next);
    }

    #[test]
    fn test_rewrite_drops_unknown_suffix() {
        let text = "version = \"1.2.3-beta.1+abc\" # auto\n";
        let parsed = parse(text).unwrap();
        let updated = rewrite(text, &parsed, &Version::new(1, 2, 4)).unwrap();
        assert_eq!(updated, "version = \"1.2.4\" # auto\n");
    }

    #[test]
    fn test_rewrite_rejects_foreign_span() {
        let parsed = parse(WORKSPACE_MANIFEST).unwrap();
        assert!(rewrite("short", &parsed, &Version::new(1, 0, 0)).is_err());
    }

    #[test]
    fn test_read_write_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        write_manifest(&path, WORKSPACE_MANIFEST).unwrap();
        assert_eq!(read_manifest(&path).unwrap(), WORKSPACE_MANIFEST);
    }

    #[test]
    fn test_read_missing_manifest_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_manifest(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
    }
}
