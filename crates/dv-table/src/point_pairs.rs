//! Detection of lat/lng column pairs

use serde::{Deserialize, Serialize};

use crate::field::Field;

/// Suffix conventions tried in order, `(lat suffix, lng suffix)`
pub const POINT_SUFFIX_PAIRS: &[(&str, &str)] = &[
    ("lat", "lng"),
    ("lat", "lon"),
    ("lat", "long"),
    ("latitude", "longitude"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointFieldRef {
    pub field_index: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointPair {
    pub lat: PointFieldRef,
    pub lng: PointFieldRef,
}

/// A detected position column pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointFieldPair {
    /// Label for the pair, e.g. `pickup` for `pickup_lat`/`pickup_lng`
    pub default_name: String,
    pub pair: PointPair,
    pub suffix: (String, String),
}

/// Find lat/lng column pairs by name suffix, case-insensitively.
/// Each field is matched against the first suffix pair whose partner exists.
pub fn find_point_field_pairs(fields: &[Field]) -> Vec<PointFieldPair> {
    let names: Vec<String> = fields.iter().map(|f| f.name.to_lowercase()).collect();
    let mut pairs = Vec::new();

    for (index, name) in names.iter().enumerate() {
        for &(lat_suffix, lng_suffix) in POINT_SUFFIX_PAIRS {
            let Some(prefix) = name.strip_suffix(lat_suffix) else {
                continue;
            };
            let partner = format!("{}{}", prefix, lng_suffix);
            let Some(partner_index) = names.iter().position(|n| *n == partner) else {
                continue;
            };

            pairs.push(PointFieldPair {
                default_name: remove_suffix_and_delimiters(name, lat_suffix),
                pair: PointPair {
                    lat: PointFieldRef {
                        field_index: index,
                        name: fields[index].name.clone(),
                    },
                    lng: PointFieldRef {
                        field_index: partner_index,
                        name: fields[partner_index].name.clone(),
                    },
                },
                suffix: (lat_suffix.to_string(), lng_suffix.to_string()),
            });
            break;
        }
    }

    pairs
}

/// Remove every case-insensitive occurrence of `suffix`, turn runs of `_`,
/// `,` and `.` into single spaces and trim.
pub fn remove_suffix_and_delimiters(name: &str, suffix: &str) -> String {
    let stripped = remove_ignore_case(name, suffix);
    let mut out = String::with_capacity(stripped.len());
    let mut in_delimiter = false;

    for c in stripped.chars() {
        if matches!(c, '_' | ',' | '.') {
            if !in_delimiter {
                out.push(' ');
                in_delimiter = true;
            }
        } else {
            out.push(c);
            in_delimiter = false;
        }
    }

    out.trim().to_string()
}

fn remove_ignore_case(haystack: &str, needle: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    // ascii lowercasing keeps byte offsets aligned with `haystack`
    let lower = haystack.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();

    let mut out = String::with_capacity(haystack.len());
    let mut pos = 0;
    while let Some(found) = lower[pos..].find(&needle) {
        out.push_str(&haystack[pos..pos + found]);
        pos += found + needle.len();
    }
    out.push_str(&haystack[pos..]);
    out
}
