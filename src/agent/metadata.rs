//! Device metadata sent by the front end with every prompt.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-request device state: contacts, installed apps and GPS fix.
///
/// Every field is optional on the wire; unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Contact name to phone number
    #[serde(default)]
    pub contacts: BTreeMap<String, Option<String>>,

    /// Package identifiers, e.g. `com.whatsapp`
    #[serde(default)]
    pub installed_apps: Vec<String>,

    #[serde(default)]
    pub gps_position: Option<GpsPosition>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsPosition {
    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,
}

impl GpsPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// Both coordinates, if the device reported them
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

impl Metadata {
    pub fn with_contact(mut self, name: impl Into<String>, phone: impl Into<String>) -> Self {
        self.contacts.insert(name.into(), Some(phone.into()));
        self
    }

    pub fn with_app(mut self, package: impl Into<String>) -> Self {
        self.installed_apps.push(package.into());
        self
    }

    pub fn with_gps(mut self, latitude: f64, longitude: f64) -> Self {
        self.gps_position = Some(GpsPosition::new(latitude, longitude));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_front_end_shape() {
        let metadata: Metadata = serde_json::from_value(json!({
            "contacts": {"John Doe": "+99012345678"},
            "installedApps": ["com.whatsapp", "com.google.android.youtube"],
            "gpsPosition": {"latitude": 12.34, "longitude": 34.56},
            "locale": "en-US"
        }))
        .unwrap();

        assert_eq!(metadata.contacts["John Doe"].as_deref(), Some("+99012345678"));
        assert_eq!(metadata.installed_apps.len(), 2);
        assert_eq!(metadata.gps_position.unwrap().coordinates(), Some((12.34, 34.56)));
        assert_eq!(metadata.extra["locale"], json!("en-US"));
    }

    #[test]
    fn test_empty_object_is_default() {
        let metadata: Metadata = serde_json::from_value(json!({})).unwrap();
        assert_eq!(metadata, Metadata::default());
    }

    #[test]
    fn test_partial_gps_has_no_coordinates() {
        let gps: GpsPosition = serde_json::from_value(json!({"latitude": 1.0})).unwrap();
        assert_eq!(gps.coordinates(), None);
    }
}
