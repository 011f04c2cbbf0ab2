//! Eligibility predicate: which paths count as drainable images.

use std::path::Path;

/// Extensions accepted for draining, compared case-insensitively.
pub const ELIGIBLE_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];

/// Whether a path names an eligible image.
///
/// The extension is the suffix after the last dot of the file name, so a
/// bare dotfile like `.jpg` counts. Pure predicate; the scanner separately
/// guards against directories, which are never drained regardless of name.
#[must_use]
pub fn is_eligible(path: &Path) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy();
    let Some(idx) = name.rfind('.') else {
        return false;
    };
    let ext = &name[idx + 1..];
    ELIGIBLE_EXTENSIONS
        .iter()
        .any(|eligible| ext.eq_ignore_ascii_case(eligible))
}
