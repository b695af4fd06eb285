/// Renders `value` with the middle elided, keeping `prefix` characters from
/// the front and `suffix` from the back. Values too short to hide anything
/// come back as `"***"` so the diagnostics output never echoes a whole
/// secret.
pub fn preview(value: &str, prefix: usize, suffix: usize) -> String {
    let total = value.chars().count();
    if total <= prefix + suffix {
        return "***".to_string();
    }
    let head: String = value.chars().take(prefix).collect();
    let tail: String = value
        .chars()
        .skip(total - suffix)
        .collect();
    format!("{head}...{tail}")
}
