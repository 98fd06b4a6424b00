use activity_core::Interval;

/// The newest interval starting at or below `cursor`.
pub fn closest_interval<'a, C: Ord>(
    intervals: &'a [Interval<C>],
    cursor: Option<&C>,
) -> Option<&'a Interval<C>> {
    intervals
        .iter()
        .filter(|interval| interval.starts_at_or_below(cursor))
        .max_by(|a, b| match (&a.upper_bound, &b.upper_bound) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (Some(_), None) => std::cmp::Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b),
        })
}

/// Replaces every interval overlapping `new` with `new`. Keeps the set
/// ordered newest first.
pub fn splice_interval<C: Ord>(intervals: &mut Vec<Interval<C>>, new: Interval<C>) {
    intervals.retain(|existing| !existing.overlaps(new.upper_bound.as_ref(), &new.lower_bound));
    intervals.push(new);
    intervals.sort_by(|a, b| match (&a.upper_bound, &b.upper_bound) {
        (None, None) => b.lower_bound.cmp(&a.lower_bound),
        (None, Some(_)) => std::cmp::Ordering::Less,
        (Some(_), None) => std::cmp::Ordering::Greater,
        (Some(a), Some(b)) => b.cmp(a),
    });
}
