use std::time::Duration;

/// Turns a search query into a folder/file name
pub fn sanitize_filename(query: &str) -> String {
    let name: String = query
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '?' | '*' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(100)
        .collect();

    // "." and ".." would escape the output folder
    if name.is_empty() || name.chars().all(|c| c == '.') {
        "query".to_string()
    } else {
        name
    }
}

/// Formats a duration as `H:MM:SS`, rounded to whole seconds
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64().round() as u64;
    format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}
