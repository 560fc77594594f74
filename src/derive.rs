//! Derivation pipeline: the pure filter + sort projection from a raw alert
//! collection to the ordered list the dashboard displays.
//!
//! Re-derivation is cheap and recomputed whenever any input changes; it
//! never touches the network.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::Alert;

/// Direction flag applied uniformly to every comparator branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Earlier instants / lower severities / lexicographically smaller text first.
    Asc,
    /// The reverse. Default: newest alerts first.
    #[default]
    Desc,
}

impl SortDirection {
    /// Parse the wire form, "asc" or "desc".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Filter a raw collection.
///
/// Test-status alerts are dropped unconditionally; the severity and urgency
/// filters are exact-match intersections, skipped when empty. An alert whose
/// severity or urgency is outside the documented vocabulary never matches a
/// non-empty filter.
pub fn filter_alerts(alerts: &[Alert], severity: &str, urgency: &str) -> Vec<Alert> {
    alerts
        .iter()
        .filter(|alert| !alert.properties.is_test())
        .filter(|alert| severity.is_empty() || alert.properties.severity == severity)
        .filter(|alert| urgency.is_empty() || alert.properties.urgency == urgency)
        .cloned()
        .collect()
}

/// Order a filtered collection by `sort_by`.
///
/// - `sent` / `effective` / `expires`: by the field parsed as an instant;
///   missing or unparseable timestamps sort as epoch 0.
/// - `severity`: by the severity weight table.
/// - anything else: by the named property coerced to lowercase text, with
///   missing values treated as the empty string. This branch accepts
///   arbitrary property names and never panics.
pub fn sort_alerts(mut alerts: Vec<Alert>, sort_by: &str, direction: SortDirection) -> Vec<Alert> {
    alerts.sort_by(|a, b| {
        let ordering = compare(a, b, sort_by);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    alerts
}

fn compare(a: &Alert, b: &Alert, sort_by: &str) -> Ordering {
    match sort_by {
        "sent" | "effective" | "expires" => a
            .properties
            .instant_millis(sort_by)
            .cmp(&b.properties.instant_millis(sort_by)),
        "severity" => a
            .properties
            .severity_weight()
            .cmp(&b.properties.severity_weight()),
        other => {
            let left = a
                .properties
                .field_text(other)
                .unwrap_or_default()
                .to_lowercase();
            let right = b
                .properties
                .field_text(other)
                .unwrap_or_default()
                .to_lowercase();
            left.cmp(&right)
        }
    }
}

/// The composed pipeline: filter, then order.
///
/// Pure function of its inputs; deriving twice on the same inputs yields an
/// identical list.
pub fn derive(
    raw: &[Alert],
    severity: &str,
    urgency: &str,
    sort_by: &str,
    direction: SortDirection,
) -> Vec<Alert> {
    sort_alerts(filter_alerts(raw, severity, urgency), sort_by, direction)
}
