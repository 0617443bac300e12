use regex::Regex;
use std::sync::OnceLock;

/// Heading that opens one release section, e.g. `## [1.2.3-rc1] - 2024-01-01`.
const SECTION_HEADING_PATTERN: &str = r"^## \[(\d+\.\d+\.\d+(?:-rc)?\d*)\]";

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SECTION_HEADING_PATTERN).expect("valid changelog heading regex"))
}

/// Release notes extracted from a changelog section.
///
/// An empty `title` means no section matched the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNote {
    pub tag: String,
    pub title: String,
    pub body: String,
}

impl ReleaseNote {
    pub fn is_found(&self) -> bool {
        !self.title.is_empty()
    }
}

/// Extract the section for `tag` from changelog text.
///
/// The title is the tag followed by whatever trails the closing bracket of the
/// heading. The body is every line up to the next release heading. A leading
/// `v` on the tag is ignored when matching.
///
/// # Example
/// ```
/// use bump_release::changelog::extract;
///
/// let log = "## [1.2.3] - 2024-01-01\nNotes here\n## [1.2.2] - 2023-12-01\nOld\n";
/// let note = extract(log, "1.2.3");
/// assert_eq!(note.title, "1.2.3 - 2024-01-01");
/// assert_eq!(note.body, "Notes here");
/// ```
pub fn extract(changelog_text: &str, tag: &str) -> ReleaseNote {
    let wanted = tag.strip_prefix('v').unwrap_or(tag);
    let mut title = String::new();
    let mut body = String::new();
    let mut capturing = false;

    for line in changelog_text.split_inclusive('\n') {
        if let Some(caps) = heading_regex().captures(line) {
            if capturing {
                break;
            }
            let (Some(heading), Some(version)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if version.as_str() == wanted {
                title = format!("{}{}", wanted, &line[heading.end()..]);
                capturing = true;
            }
        } else if capturing {
            body.push_str(line);
        }
    }

    ReleaseNote {
        tag: wanted.to_string(),
        title: title.trim().to_string(),
        body: body.trim().to_string(),
    }
}
