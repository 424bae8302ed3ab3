//! Calculador de disponibilidad
//!
//! Cálculo por vehículo, sin estado compartido: dado el vehículo, sus
//! reservas candidatas (status en {confirmed, active}, end_date >= now)
//! y el instante actual, determina si está comprometido por una reserva
//! que contiene "ahora" y proyecta la próxima fecha disponible.

use chrono::{DateTime, Duration, Utc};

use crate::dto::vehicle_dto::{VehicleAvailabilityResponse, VehicleResponse};
use crate::models::booking::Booking;
use crate::models::vehicle::{Vehicle, VehicleStatus};

/// Buffer fijo de limpieza/entrega tras el fin de una reserva
pub const CLEANING_BUFFER_HOURS: i64 = 10;

/// Radio por defecto del filtro de proximidad, en kilómetros
pub const DEFAULT_RADIUS_KM: f64 = 50.0;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distancia haversine entre dos puntos, en kilómetros
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * a.sqrt().asin()
}

/// Verifica si el vehículo cae dentro del radio de búsqueda
pub fn within_radius(vehicle: &Vehicle, lat: f64, lng: f64, radius_km: f64) -> bool {
    haversine_km(vehicle.current_lat, vehicle.current_lng, lat, lng) <= radius_km
}

/// Evalúa la disponibilidad de un vehículo contra sus reservas candidatas.
///
/// `bookings` ya viene filtrado por status en {confirmed, active} y
/// end_date >= now; acá solo se busca la que contiene el instante actual.
/// `renter_name` se resuelve por booking desde la query con JOIN.
pub fn assess_vehicle(
    vehicle: Vehicle,
    bookings: &[(Booking, String)],
    now: DateTime<Utc>,
) -> VehicleAvailabilityResponse {
    let current = bookings
        .iter()
        .find(|(b, _)| b.vehicle_id == vehicle.id && b.contains(now));

    match current {
        Some((booking, renter_name)) => {
            let next_available = booking.end_date + Duration::hours(CLEANING_BUFFER_HOURS);
            let mut response = VehicleResponse::from(vehicle);
            // El vehículo se reporta como rentado aunque el status
            // persistido todavía diga otra cosa
            response.status = VehicleStatus::Rented.as_str().to_string();

            VehicleAvailabilityResponse {
                vehicle: response,
                is_available: false,
                next_available_date: Some(next_available),
                current_renter: Some(renter_name.clone()),
            }
        }
        None => VehicleAvailabilityResponse {
            vehicle: VehicleResponse::from(vehicle),
            is_available: true,
            next_available_date: None,
            current_renter: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn test_vehicle(lat: f64, lng: f64) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            make: "Toyota".to_string(),
            model: "Corolla".to_string(),
            vehicle_type: "car".to_string(),
            license_plate: "ABC-123".to_string(),
            price_per_hour: Decimal::new(1500, 2),
            description: None,
            images: vec![],
            status: "available".to_string(),
            current_lat: lat,
            current_lng: lng,
            geo_fence_id: None,
            created_at: Utc::now(),
        }
    }

    fn booking_for(
        vehicle_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: &str,
    ) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            vehicle_id,
            start_date: start,
            end_date: end,
            total_price: Decimal::new(100, 0),
            status: status.to_string(),
            payment_status: "paid".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_vehicle_with_no_bookings_is_available() {
        let vehicle = test_vehicle(0.0, 0.0);
        let result = assess_vehicle(vehicle, &[], Utc::now());

        assert!(result.is_available);
        assert!(result.next_available_date.is_none());
        assert!(result.current_renter.is_none());
    }

    #[test]
    fn test_overlapping_booking_marks_unavailable_with_buffer() {
        let now = Utc::now();
        let vehicle = test_vehicle(0.0, 0.0);
        let end = now + Duration::hours(3);
        let booking = booking_for(vehicle.id, now - Duration::hours(1), end, "active");
        let bookings = vec![(booking, "Jane Renter".to_string())];

        let result = assess_vehicle(vehicle, &bookings, now);

        assert!(!result.is_available);
        assert_eq!(
            result.next_available_date,
            Some(end + Duration::hours(CLEANING_BUFFER_HOURS))
        );
        assert_eq!(result.current_renter.as_deref(), Some("Jane Renter"));
        assert_eq!(result.vehicle.status, "rented");
    }

    #[test]
    fn test_future_booking_leaves_vehicle_available_now() {
        let now = Utc::now();
        let vehicle = test_vehicle(0.0, 0.0);
        let booking = booking_for(
            vehicle.id,
            now + Duration::hours(5),
            now + Duration::hours(8),
            "confirmed",
        );
        let bookings = vec![(booking, "Jane Renter".to_string())];

        let result = assess_vehicle(vehicle, &bookings, now);

        assert!(result.is_available);
    }

    #[test]
    fn test_booking_of_other_vehicle_is_ignored() {
        let now = Utc::now();
        let vehicle = test_vehicle(0.0, 0.0);
        let other = booking_for(
            Uuid::new_v4(),
            now - Duration::hours(1),
            now + Duration::hours(1),
            "active",
        );
        let bookings = vec![(other, "Someone Else".to_string())];

        let result = assess_vehicle(vehicle, &bookings, now);

        assert!(result.is_available);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Madrid -> Barcelona, ~505 km
        let d = haversine_km(40.4168, -3.7038, 41.3874, 2.1686);
        assert!((d - 505.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn test_within_default_radius() {
        let vehicle = test_vehicle(40.4168, -3.7038);
        // mismo punto
        assert!(within_radius(&vehicle, 40.4168, -3.7038, DEFAULT_RADIUS_KM));
        // Barcelona queda fuera de 50 km
        assert!(!within_radius(&vehicle, 41.3874, 2.1686, DEFAULT_RADIUS_KM));
    }
}
