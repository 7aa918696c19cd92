//! Geofenced attendance: decides whether a presence claim is inside the
//! configured area and, if so, builds the exempt transaction recording it.

use crate::transaction::{Amount, Metadata, Transaction, ATTESTATION_KEY};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Recipient of every attendance transaction.
pub const ATTENDANCE_RECIPIENT: &str = "attendance_contract";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceArea {
    pub latitude: f64,
    pub longitude: f64,
    pub tolerance_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRequest {
    pub student_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttendanceError {
    #[error("Attendance area is not configured")]
    NotConfigured,
    #[error("Outside the area ({distance_m:.1} m)")]
    OutsideArea { distance_m: f64 },
}

/// Great-circle distance in metres between two points given in degrees.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// The currently configured attendance area, replaceable at runtime.
#[derive(Debug, Default)]
pub struct Geofence {
    area: RwLock<Option<GeofenceArea>>,
}

impl Geofence {
    pub fn new(area: Option<GeofenceArea>) -> Self {
        Self {
            area: RwLock::new(area),
        }
    }

    pub fn configure(&self, area: GeofenceArea) {
        *self.area.write() = Some(area);
    }

    pub fn area(&self) -> Option<GeofenceArea> {
        *self.area.read()
    }

    /// Distance from the area centre, or an error when unconfigured or out of range.
    pub fn check(&self, request: &AttendanceRequest) -> Result<f64, AttendanceError> {
        let area = self.area().ok_or(AttendanceError::NotConfigured)?;
        let distance_m = haversine_distance(
            request.latitude,
            request.longitude,
            area.latitude,
            area.longitude,
        );
        if distance_m > area.tolerance_m {
            return Err(AttendanceError::OutsideArea { distance_m });
        }
        Ok(distance_m)
    }

    /// Check the request and build the exempt transaction recording the presence.
    pub fn attest(&self, request: &AttendanceRequest) -> Result<Transaction, AttendanceError> {
        self.check(request)?;
        Ok(attendance_transaction(request))
    }
}

/// Zero-amount, unsigned transaction carrying the location and identity claim.
pub fn attendance_transaction(request: &AttendanceRequest) -> Transaction {
    let now = chrono::Utc::now();
    let timestamp = now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1e6;

    let mut metadata = Metadata::new();
    metadata.insert("latitude".to_string(), json!(request.latitude));
    metadata.insert("longitude".to_string(), json!(request.longitude));
    metadata.insert("timestamp".to_string(), json!(timestamp));
    metadata.insert(ATTESTATION_KEY.to_string(), json!(request.student_id));

    Transaction::new(request.student_id.clone(), ATTENDANCE_RECIPIENT, Amount::ZERO)
        .with_metadata(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(lat: f64, lon: f64) -> AttendanceRequest {
        AttendanceRequest {
            student_id: "s-2024-001".to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn test_haversine_known_distances() {
        assert_eq!(haversine_distance(10.0, 20.0, 10.0, 20.0), 0.0);
        // one degree of longitude on the equator
        let d = haversine_distance(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_194.93).abs() < 0.1, "got {}", d);
        // symmetric
        let ab = haversine_distance(-23.5613, -46.6565, -22.9068, -43.1729);
        let ba = haversine_distance(-22.9068, -43.1729, -23.5613, -46.6565);
        assert!((ab - ba).abs() < 1e-6);
        assert!((ab - 363_297.0).abs() < 1.0, "got {}", ab);
    }

    #[test]
    fn test_unconfigured_geofence() {
        let fence = Geofence::default();
        assert_eq!(fence.check(&request(0.0, 0.0)), Err(AttendanceError::NotConfigured));
    }

    #[test]
    fn test_inside_and_outside() {
        let fence = Geofence::new(Some(GeofenceArea {
            latitude: 0.0,
            longitude: 0.0,
            tolerance_m: 100.0,
        }));
        // ~55 m north
        assert!(fence.check(&request(0.0005, 0.0)).is_ok());
        // ~111 m north
        match fence.check(&request(0.001, 0.0)) {
            Err(AttendanceError::OutsideArea { distance_m }) => assert!(distance_m > 100.0),
            other => panic!("expected OutsideArea, got {:?}", other),
        }
    }

    #[test]
    fn test_reconfigure_replaces_area() {
        let fence = Geofence::default();
        let area = GeofenceArea {
            latitude: 1.0,
            longitude: 2.0,
            tolerance_m: 5.0,
        };
        fence.configure(area);
        assert_eq!(fence.area(), Some(area));
    }

    #[test]
    fn test_attested_transaction_is_exempt() {
        let fence = Geofence::new(Some(GeofenceArea {
            latitude: 0.0,
            longitude: 0.0,
            tolerance_m: 10.0,
        }));
        let tx = fence.attest(&request(0.0, 0.0)).unwrap();
        assert_eq!(tx.sender, "s-2024-001");
        assert_eq!(tx.recipient, ATTENDANCE_RECIPIENT);
        assert_eq!(tx.amount, Amount::ZERO);
        assert!(tx.signature.is_empty());
        assert!(tx.is_exempt());
        assert!(tx.is_admissible());
        for key in ["latitude", "longitude", "timestamp", "student_id"] {
            assert!(tx.metadata.contains_key(key), "missing {}", key);
        }
    }

    #[test]
    fn test_outside_error_message() {
        let err = AttendanceError::OutsideArea { distance_m: 123.456 };
        assert_eq!(err.to_string(), "Outside the area (123.5 m)");
    }
}
