use serde::{Deserialize, Serialize};

/// WGS84 point, latitude/longitude in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Continental Chile plus coastal islands. Anything a geocoder returns
/// outside this box is treated as a failed resolution, not a valid hit.
pub const CHILE_BOUNDS: BoundingBox =
    BoundingBox { min_lat: -56.1, max_lat: -17.4, min_lon: -76.0, max_lon: -66.0 };

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: Coordinate) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn within_chile(&self) -> bool {
        CHILE_BOUNDS.contains(*self)
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_m(&self, other: Coordinate) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::Coordinate;

    #[test]
    fn santiago_is_within_chile() {
        assert!(Coordinate::new(-33.4489, -70.6693).within_chile());
    }

    #[test]
    fn buenos_aires_is_outside_chile() {
        assert!(!Coordinate::new(-34.6037, -58.3816).within_chile());
    }

    #[test]
    fn haversine_distance_matches_known_pair() {
        // Plaza de Armas to Plaza Italia is roughly 1.5 km.
        let plaza_armas = Coordinate::new(-33.4378, -70.6505);
        let plaza_italia = Coordinate::new(-33.4366, -70.6344);
        let distance = plaza_armas.distance_m(plaza_italia);
        assert!(distance > 1_300.0 && distance < 1_700.0, "got {distance}");
    }

    #[test]
    fn distance_to_self_is_zero() {
        let point = Coordinate::new(-33.5, -70.7);
        assert!(point.distance_m(point) < 1e-6);
    }
}
