//! Data models for devtrack
//!
//! Defines the device record exchanged with the backend and held by the
//! [`Directory`](crate::directory::Directory).

use serde::{Deserialize, Serialize};

/// Identity, position and presentation state of one tracked device
///
/// The public endpoint omits the private settings (`is_hidden`, `nickname`,
/// `color`), so those decode to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DeviceRecord {
    /// Stable identity key
    pub device_id: String,
    /// Label reported by the tracking provider
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// Last known heading in degrees
    pub angle: f64,
    /// Suppressed from visible output
    #[serde(default)]
    pub is_hidden: bool,
    /// User-assigned label override
    #[serde(default)]
    pub nickname: String,
    /// User-assigned display color
    #[serde(default)]
    pub color: String,
}

impl DeviceRecord {
    /// Create a record with the given identity at the origin
    pub fn new(device_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    /// Builder-style position setter
    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    /// Name to show: the nickname when set, otherwise the display name
    pub fn label(&self) -> &str {
        if self.nickname.is_empty() {
            &self.display_name
        } else {
            &self.nickname
        }
    }

    /// Whether any owner-only setting differs from its default
    pub fn has_private_settings(&self) -> bool {
        self.is_hidden || !self.nickname.is_empty() || !self.color.is_empty()
    }
}

/// Body of `GET /profile`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_private_record() {
        let json = r#"{
            "device_id": "a",
            "display_name": "Bike1",
            "latitude": 1.0,
            "longitude": 2.0,
            "altitude": 0,
            "angle": 0,
            "is_hidden": true,
            "nickname": "Red Bike",
            "color": "red"
        }"#;

        let record: DeviceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.device_id, "a");
        assert_eq!(record.latitude, 1.0);
        assert!(record.is_hidden);
        assert_eq!(record.label(), "Red Bike");
        assert!(record.has_private_settings());
    }

    #[test]
    fn test_decode_public_record_defaults_private_fields() {
        let json = r#"{
            "device_id": "b",
            "display_name": "Van",
            "latitude": 47.6,
            "longitude": -122.3,
            "altitude": 12.5,
            "angle": 270
        }"#;

        let record: DeviceRecord = serde_json::from_str(json).unwrap();
        assert!(!record.is_hidden);
        assert!(record.nickname.is_empty());
        assert!(record.color.is_empty());
        assert_eq!(record.label(), "Van");
        assert!(!record.has_private_settings());
    }

    #[test]
    fn test_decode_rejects_missing_identity() {
        let json = r#"{"display_name": "Van", "latitude": 0, "longitude": 0, "altitude": 0, "angle": 0}"#;
        assert!(serde_json::from_str::<DeviceRecord>(json).is_err());
    }

    #[test]
    fn test_builder() {
        let record = DeviceRecord::new("c", "Truck").at(10.0, 20.0);
        assert_eq!(record.latitude, 10.0);
        assert_eq!(record.longitude, 20.0);
        assert_eq!(record.angle, 0.0);
    }
}
