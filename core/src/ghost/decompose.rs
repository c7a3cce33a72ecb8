/// Splits an assistant reply into candidate commands: one per line, trimmed,
/// blank lines dropped, order kept.
pub fn decompose(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
