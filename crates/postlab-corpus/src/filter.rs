//! Cleanup of combined-document lists.

/// Drop entries that are empty or whitespace-only, keeping the order of the rest.
pub fn filter_empty<I, S>(strings: I) -> Vec<S>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    strings
        .into_iter()
        .filter(|s| !s.as_ref().trim().is_empty())
        .collect()
}
