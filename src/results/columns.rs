use super::ResultSet;

/// Boolean false-positive flag fields that never appear as table columns.
pub const EXCLUDED_COLUMNS: [&str; 4] = [
    "koi_fpflag_nt",
    "koi_fpflag_ss",
    "koi_fpflag_co",
    "koi_fpflag_ec",
];

/// Column keys for the results table, in first-row order, minus the flag fields.
pub fn derive_feature_columns(result_set: &ResultSet) -> Vec<String> {
    result_set
        .schema()
        .keys()
        .iter()
        .filter(|key| !EXCLUDED_COLUMNS.contains(&key.as_str()))
        .cloned()
        .collect()
}
