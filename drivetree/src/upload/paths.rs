/// Splits a client-relative file path into its directory segments.
///
/// Both separator styles are accepted. The final component is the file itself
/// and is dropped, as are empty and `.` components.
pub fn folder_segments(relative_path: &str) -> Vec<String> {
    let normalized = relative_path.replace('\\', "/");
    let trimmed = normalized.trim_end_matches('/');
    let Some((dir, _file)) = trimmed.rsplit_once('/') else {
        return Vec::new();
    };

    dir.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .map(str::to_string)
        .collect()
}
