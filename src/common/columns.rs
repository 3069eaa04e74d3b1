use log::warn;

/// Pick a source column for a logical field.
///
/// An explicitly configured name is used when present in `names`. Otherwise the
/// first name accepted by `matches` is chosen, and a warning lists the other
/// candidates when the choice is ambiguous.
pub(crate) fn select_column<'a, S: AsRef<str>>(
    names: &'a [S],
    configured: Option<&str>,
    label: &str,
    matches: impl Fn(&str) -> bool,
) -> Option<&'a str> {
    if let Some(name) = configured {
        if let Some(found) = names.iter().map(|n| n.as_ref()).find(|n| *n == name) {
            return Some(found);
        }
        warn!("configured {label} column {name:?} not found; falling back to name matching");
    }

    let candidates = names.iter().map(|n| n.as_ref()).filter(|n| matches(n)).collect::<Vec<_>>();
    if candidates.len() > 1 {
        warn!("ambiguous {label} column: {candidates:?}; using {:?}", candidates[0]);
    }
    candidates.first().copied()
}

/// Heuristic for a property-value column: name contains "parval" or "value".
pub(crate) fn is_value_column(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("parval") || lower.contains("value")
}

/// Heuristic for a reference address column: name contains "ADDR", "STREET" or "FULL".
pub(crate) fn is_address_column(name: &str) -> bool {
    let upper = name.to_uppercase();
    ["ADDR", "STREET", "FULL"].iter().any(|key| upper.contains(key))
}
