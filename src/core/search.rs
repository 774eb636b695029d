/// Index of the last element `<= value` in an ascending slice, or `None`
/// when `value` precedes every element.
#[must_use]
pub fn search_last_at_or_before(haystack: &[f64], value: f64) -> Option<usize> {
    haystack
        .partition_point(|&candidate| candidate <= value)
        .checked_sub(1)
}
