//! Display names for the KOI feature vocabulary.

/// Known feature keys and their chart labels.
const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("koi_period", "Orbital Period"),
    ("koi_duration", "Transit Duration"),
    ("koi_depth", "Transit Depth"),
    ("koi_impact", "Impact Parameter"),
    ("koi_model_snr", "Signal-to-Noise Ratio"),
    ("koi_num_transits", "Number of Transits"),
    ("koi_steff", "Stellar Temperature"),
    ("koi_slogg", "Stellar Surface Gravity"),
    ("koi_smet", "Stellar Metallicity"),
    ("koi_srad", "Stellar Radius"),
    ("koi_ror", "Planet/Star Radius Ratio"),
    ("koi_prad", "Planetary Radius"),
    ("koi_teq", "Equilibrium Temperature"),
    ("koi_insol", "Insolation Flux"),
    ("koi_fpflag_nt", "Not Transit-Like Flag"),
    ("koi_fpflag_ss", "Stellar Eclipse Flag"),
    ("koi_fpflag_co", "Centroid Offset Flag"),
    ("koi_fpflag_ec", "Ephemeris Match Flag"),
];

/// Chart label for `feature_key`, or the key itself when it is not in the vocabulary.
pub fn resolve_display_name(feature_key: &str) -> &str {
    DISPLAY_NAMES
        .iter()
        .find(|(key, _)| *key == feature_key)
        .map(|(_, name)| *name)
        .unwrap_or(feature_key)
}
