//! Data models for stormwatch.
//!
//! # Wire Format
//!
//! The NWS API returns GeoJSON-style collection wrappers: a `features` array
//! whose entries carry the record of interest in a `properties` object.
//! The types here mirror that shape directly.
//!
//! Enumerated wire fields (`status`, `severity`, `urgency`, ...) are carried
//! as plain strings rather than Rust enums: the API contract allows values
//! outside the documented vocabulary, and those must degrade to "absent"
//! (sort weight 0, excluded by exact-match filters) instead of failing
//! deserialization. The weight table and helper predicates below encode the
//! documented vocabulary.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Sort weight for a severity string: Extreme(4) > Severe(3) > Moderate(2)
/// > Minor(1) > Unknown/anything else(0).
pub fn severity_weight(severity: &str) -> u8 {
    match severity {
        "Extreme" => 4,
        "Severe" => 3,
        "Moderate" => 2,
        "Minor" => 1,
        _ => 0,
    }
}

/// Parse an ISO-8601 instant into epoch milliseconds.
///
/// A missing or unparseable timestamp sorts as epoch 0, so this never fails.
pub fn parse_instant_millis(raw: &str) -> i64 {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

/// An alert collection response: the `features` array of
/// `GET /alerts/active`, `GET /alerts?area=...`, or
/// `GET /alerts/active/zone/...`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertCollection {
    /// Alert features returned by the query.
    #[serde(default)]
    pub features: Vec<Alert>,
}

/// A single alert feature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Alert {
    /// Feature identifier (an alert URN).
    #[serde(default)]
    pub id: String,

    /// Feature type tag, always "Feature" in practice.
    #[serde(default, rename = "type")]
    pub feature_type: String,

    /// The alert record itself.
    #[serde(default)]
    pub properties: AlertProperties,
}

/// The alert record carried in a feature's `properties` object.
///
/// Every field defaults when absent; unknown wire properties are retained in
/// [`AlertProperties::extra`] so they stay addressable by name (the generic
/// sort fallback relies on this).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertProperties {
    /// Alert identifier, unique within a fetch result.
    #[serde(default)]
    pub id: String,

    /// Free-text description of the affected area, possibly empty.
    #[serde(default, rename = "areaDesc")]
    pub area_desc: String,

    /// When the alert was sent.
    #[serde(default)]
    pub sent: String,

    /// When the alert becomes effective.
    #[serde(default)]
    pub effective: String,

    /// Expected onset of the hazard.
    #[serde(default)]
    pub onset: String,

    /// When the alert expires.
    #[serde(default)]
    pub expires: String,

    /// When the hazard is expected to end, if stated.
    #[serde(default)]
    pub ends: Option<String>,

    /// Alert status: "Actual", "Test", "Exercise", or "System".
    ///
    /// "Test" alerts are never displayed, unconditionally.
    #[serde(default)]
    pub status: String,

    /// Message type: "Alert", "Update", "Cancel", or "Ack".
    #[serde(default, rename = "messageType")]
    pub message_type: String,

    /// Event category, e.g. "Met".
    #[serde(default)]
    pub category: String,

    /// Severity: "Extreme", "Severe", "Moderate", "Minor", or "Unknown".
    #[serde(default)]
    pub severity: String,

    /// Certainty: "Observed", "Likely", "Possible", or "Unlikely".
    #[serde(default)]
    pub certainty: String,

    /// Urgency: "Immediate", "Expected", "Future", "Past", or "Unknown".
    #[serde(default)]
    pub urgency: String,

    /// Event name used as the display label, e.g. "Flood Warning".
    #[serde(default)]
    pub event: String,

    /// Issuing office identifier.
    #[serde(default)]
    pub sender: String,

    /// Human-readable issuing office name.
    #[serde(default, rename = "senderName")]
    pub sender_name: String,

    /// One-line summary of the alert.
    #[serde(default)]
    pub headline: String,

    /// Long-form description. May embed `WHAT...` and `IMPACTS...`
    /// sub-sections; see [`AlertProperties::what_section`].
    #[serde(default)]
    pub description: String,

    /// Recommended protective action text.
    #[serde(default)]
    pub instruction: String,

    /// Recommended response type, e.g. "Shelter".
    #[serde(default)]
    pub response: String,

    /// Wire properties not modelled above, kept addressable by name.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

static WHAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)WHAT\.\.\.(.*?)(\n\*|$)").expect("valid regex"));
static IMPACTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)IMPACTS\.\.\.(.*?)(\n\*|$)").expect("valid regex"));

impl AlertProperties {
    /// Whether this is a test alert. Test alerts are excluded from display.
    pub fn is_test(&self) -> bool {
        self.status == "Test"
    }

    /// Sort weight of this alert's severity (0 for unrecognized values).
    pub fn severity_weight(&self) -> u8 {
        severity_weight(&self.severity)
    }

    /// The `WHAT...` sub-section of the description, or empty if absent.
    ///
    /// Runs from the literal `WHAT...` marker up to the next line starting
    /// with `*`, or end of text.
    pub fn what_section(&self) -> String {
        extract_section(&WHAT_RE, &self.description)
    }

    /// The `IMPACTS...` sub-section of the description, or empty if absent.
    pub fn impacts_section(&self) -> String {
        extract_section(&IMPACTS_RE, &self.description)
    }

    /// Look up a property by its wire name, coerced to text.
    ///
    /// Resolves the typed fields first and falls back to [`Self::extra`].
    /// Returns `None` for names absent in both, which callers coerce to the
    /// empty string.
    pub fn field_text(&self, name: &str) -> Option<String> {
        let typed = match name {
            "id" => &self.id,
            "areaDesc" => &self.area_desc,
            "sent" => &self.sent,
            "effective" => &self.effective,
            "onset" => &self.onset,
            "expires" => &self.expires,
            "ends" => return self.ends.clone(),
            "status" => &self.status,
            "messageType" => &self.message_type,
            "category" => &self.category,
            "severity" => &self.severity,
            "certainty" => &self.certainty,
            "urgency" => &self.urgency,
            "event" => &self.event,
            "sender" => &self.sender,
            "senderName" => &self.sender_name,
            "headline" => &self.headline,
            "description" => &self.description,
            "instruction" => &self.instruction,
            "response" => &self.response,
            _ => return self.extra.get(name).map(json_to_text),
        };
        Some(typed.clone())
    }

    /// Parse the named timestamp field into epoch milliseconds (0 when
    /// missing or unparseable).
    pub fn instant_millis(&self, name: &str) -> i64 {
        self.field_text(name)
            .map(|raw| parse_instant_millis(&raw))
            .unwrap_or(0)
    }
}

fn extract_section(re: &Regex, text: &str) -> String {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn json_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A zone collection response: the `features` array of `GET /zones?area=...`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneCollection {
    /// Zone features belonging to the queried area.
    #[serde(default)]
    pub features: Vec<ZoneFeature>,
}

/// A single zone feature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneFeature {
    /// Feature identifier (a zone URL).
    #[serde(default)]
    pub id: String,

    /// The zone record itself.
    #[serde(default)]
    pub properties: ZoneProperties,
}

/// The zone record carried in a feature's `properties` object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneProperties {
    /// Zone identifier, e.g. "CAZ043".
    #[serde(default)]
    pub id: String,

    /// Zone kind, "land" or "marine".
    #[serde(default, rename = "type")]
    pub zone_type: String,

    /// Display name of the zone.
    #[serde(default)]
    pub name: String,
}

/// A zone as consumed by the presentation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone identifier used to scope alert queries.
    pub id: String,

    /// Display name.
    pub name: String,
}

impl ZoneCollection {
    /// Flatten the collection into `{id, name}` pairs for display.
    pub fn into_zones(self) -> Vec<Zone> {
        self.features
            .into_iter()
            .map(|feature| Zone {
                id: feature.properties.id,
                name: feature.properties.name,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert_with_description(description: &str) -> AlertProperties {
        AlertProperties {
            description: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_severity_weights() {
        assert_eq!(severity_weight("Extreme"), 4);
        assert_eq!(severity_weight("Severe"), 3);
        assert_eq!(severity_weight("Moderate"), 2);
        assert_eq!(severity_weight("Minor"), 1);
        assert_eq!(severity_weight("Unknown"), 0);
        assert_eq!(severity_weight(""), 0);
        assert_eq!(severity_weight("Catastrophic"), 0);
    }

    #[test]
    fn test_parse_instant_millis() {
        assert_eq!(parse_instant_millis("1970-01-01T00:00:01+00:00"), 1000);
        // Offset timestamps as sent by the NWS API
        assert!(parse_instant_millis("2024-01-15T10:30:00-06:00") > 0);
        assert_eq!(parse_instant_millis(""), 0);
        assert_eq!(parse_instant_millis("not a timestamp"), 0);
    }

    #[test]
    fn test_what_and_impacts_extraction() {
        let props =
            alert_with_description("* WHAT...Flooding expected\n* IMPACTS...Roads closed");

        assert_eq!(props.what_section(), "Flooding expected");
        assert_eq!(props.impacts_section(), "Roads closed");
    }

    #[test]
    fn test_section_runs_to_end_of_text() {
        let props = alert_with_description("* IMPACTS...Power outages likely.");

        assert_eq!(props.impacts_section(), "Power outages likely.");
        assert_eq!(props.what_section(), "");
    }

    #[test]
    fn test_section_absent_marker() {
        let props = alert_with_description("Heavy snow through Tuesday.");

        assert_eq!(props.what_section(), "");
        assert_eq!(props.impacts_section(), "");
    }

    #[test]
    fn test_section_spans_lines_until_bullet() {
        let props =
            alert_with_description("* WHAT...Wind gusts\nto 60 mph\n* WHERE...Ridge tops");

        assert_eq!(props.what_section(), "Wind gusts\nto 60 mph");
    }

    #[test]
    fn test_field_text_typed_and_extra() {
        let mut props = AlertProperties {
            event: "Flood Warning".to_string(),
            area_desc: "Larimer County".to_string(),
            ..Default::default()
        };
        props.extra.insert(
            "web".to_string(),
            serde_json::Value::String("https://example.gov".to_string()),
        );
        props
            .extra
            .insert("geocodeCount".to_string(), serde_json::json!(3));

        assert_eq!(props.field_text("event").as_deref(), Some("Flood Warning"));
        assert_eq!(
            props.field_text("areaDesc").as_deref(),
            Some("Larimer County")
        );
        assert_eq!(
            props.field_text("web").as_deref(),
            Some("https://example.gov")
        );
        assert_eq!(props.field_text("geocodeCount").as_deref(), Some("3"));
        assert_eq!(props.field_text("noSuchProperty"), None);
    }

    #[test]
    fn test_collection_deserializes_wire_shape() {
        let body = serde_json::json!({
            "features": [
                {
                    "id": "urn:oid:2.49.0.1.840.0.123",
                    "type": "Feature",
                    "properties": {
                        "id": "urn:oid:2.49.0.1.840.0.123",
                        "areaDesc": "Coastal Los Angeles County",
                        "event": "High Surf Advisory",
                        "status": "Actual",
                        "severity": "Moderate",
                        "urgency": "Expected",
                        "sent": "2024-01-15T10:30:00-08:00",
                        "effective": "2024-01-15T10:30:00-08:00",
                        "expires": "2024-01-16T04:00:00-08:00"
                    }
                }
            ]
        });

        let collection: AlertCollection = serde_json::from_value(body).unwrap();
        assert_eq!(collection.features.len(), 1);

        let props = &collection.features[0].properties;
        assert_eq!(props.event, "High Surf Advisory");
        assert_eq!(props.severity_weight(), 2);
        assert!(!props.is_test());
        assert!(props.ends.is_none());
    }

    #[test]
    fn test_zone_collection_into_zones() {
        let body = serde_json::json!({
            "features": [
                {
                    "id": "https://api.weather.gov/zones/forecast/CAZ043",
                    "properties": {
                        "id": "CAZ043",
                        "type": "land",
                        "name": "San Francisco Bay Shoreline"
                    }
                }
            ]
        });

        let collection: ZoneCollection = serde_json::from_value(body).unwrap();
        let zones = collection.into_zones();

        assert_eq!(
            zones,
            vec![Zone {
                id: "CAZ043".to_string(),
                name: "San Francisco Bay Shoreline".to_string(),
            }]
        );
    }
}
