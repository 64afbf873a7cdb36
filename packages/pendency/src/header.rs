//! Page ownership header lookup.
//!
//! Every report page names the group, task and officer it belongs to on
//! three fixed lines. Cover sheets, blank pages and pages from other
//! templates lack those lines; for them the header is simply absent.

use epf_pendency_models::PageHeader;

use crate::config::HeaderProfile;

/// Reads the page header at the positions given by `profile`.
///
/// Returns `None` when a header line is missing, lacks its separator, or
/// yields an empty field. The officer name loses one trailing comma.
#[must_use]
pub fn locate_header(lines: &[String], profile: &HeaderProfile) -> Option<PageHeader> {
    let group = second_segment(lines.get(profile.group_line)?, ": ")?;
    let task = second_segment(lines.get(profile.task_line)?, ":")?.trim();
    let name = second_segment(lines.get(profile.name_line)?, ": ")?.trim();
    let name = name.strip_suffix(',').unwrap_or(name);

    if group.is_empty() || task.is_empty() || name.is_empty() {
        return None;
    }

    Some(PageHeader {
        group: group.to_owned(),
        task: task.to_owned(),
        officer_name: name.to_owned(),
    })
}

/// The text between the first and second occurrence of `separator`.
fn second_segment<'a>(line: &'a str, separator: &str) -> Option<&'a str> {
    line.split(separator).nth(1)
}
