//! Shared domain models.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

/// A transport route as served by the routes endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Unique identifier. Accepts JSON numbers or numeric strings.
    #[serde(deserialize_with = "deserialize_route_id")]
    pub id: u64,
    /// Display name (e.g. `Route 101`).
    #[serde(default)]
    pub route: String,
    /// Category label such as `Bus` or `Metro`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Departure endpoint.
    #[serde(default)]
    pub from: String,
    /// Arrival endpoint.
    #[serde(default)]
    pub to: String,
    /// Typical journey time.
    #[serde(default)]
    pub duration: String,
    /// Fare label.
    #[serde(default)]
    pub price: String,
    /// Service frequency label.
    #[serde(default)]
    pub frequency: String,
    /// Operational status label.
    #[serde(default)]
    pub status: String,
    /// Image URL.
    #[serde(default)]
    pub image: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Operating company.
    #[serde(default)]
    pub operator: String,
    /// Departure times in service order.
    #[serde(default)]
    pub schedule: Vec<String>,
}

impl Route {
    /// Known transport category, if the label matches one.
    pub fn transport_type(&self) -> Option<TransportType> {
        TransportType::from_label(&self.kind)
    }

    /// Returns a label combining the route name and its category.
    pub fn display_name(&self) -> String {
        if self.kind.is_empty() {
            self.route.clone()
        } else {
            format!("{} · {}", self.route, self.kind)
        }
    }

    /// Short `from → to` summary.
    pub fn endpoints(&self) -> String {
        format!("{} → {}", self.from, self.to)
    }

    /// Case-insensitive match against name, category, endpoints and operator.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        [
            &self.route,
            &self.kind,
            &self.from,
            &self.to,
            &self.operator,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Transport categories offered by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportType {
    /// Road bus.
    Bus,
    /// Heavy rail.
    Train,
    /// Urban rapid transit.
    Metro,
    /// Passenger boat.
    Ferry,
}

impl TransportType {
    /// All known categories in display order.
    pub const ALL: [TransportType; 4] = [Self::Bus, Self::Train, Self::Metro, Self::Ferry];

    /// Canonical label used in route payloads.
    pub fn label(self) -> &'static str {
        match self {
            Self::Bus => "Bus",
            Self::Train => "Train",
            Self::Metro => "Metro",
            Self::Ferry => "Ferry",
        }
    }

    /// Parse a category label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn deserialize_route_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid route id `{text}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_remote_payload_with_string_ids() {
        let route: Route = serde_json::from_value(json!({
            "id": "7",
            "route": "Harbour Shuttle",
            "type": "ferry",
            "from": "Pier 1",
            "to": "Island",
            "schedule": ["9:00 AM"]
        }))
        .expect("route should decode");

        assert_eq!(route.id, 7);
        assert_eq!(route.transport_type(), Some(TransportType::Ferry));
        assert_eq!(route.endpoints(), "Pier 1 → Island");
        assert!(route.price.is_empty());
        assert_eq!(route.schedule, vec!["9:00 AM".to_string()]);

        let encoded = serde_json::to_value(&route).expect("route should encode");
        assert_eq!(encoded["id"], json!(7));
        assert_eq!(encoded["type"], json!("ferry"));
    }

    #[test]
    fn one_sparse_record_does_not_fail_the_list() {
        let routes: Vec<Route> = serde_json::from_value(json!([
            {"id": 1, "route": "Route 101", "type": "Bus"},
            {"id": "2", "type": "Metro"}
        ]))
        .expect("routes should decode");

        assert_eq!(routes.len(), 2);
        assert!(routes[1].route.is_empty());
        assert_eq!(routes[1].transport_type(), Some(TransportType::Metro));
    }

    #[test]
    fn rejects_non_numeric_ids() {
        let result = serde_json::from_value::<Route>(json!({"id": "abc", "route": "X"}));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_categories_have_no_transport_type() {
        assert_eq!(TransportType::from_label(" Metro "), Some(TransportType::Metro));
        assert_eq!(TransportType::from_label("Tram"), None);
        assert_eq!(TransportType::Train.to_string(), "Train");
    }
}
