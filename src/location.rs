const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
#[error("coordinates ({latitude}, {longitude}) are outside the valid ranges")]
pub struct InvalidLocation {
    latitude: f64,
    longitude: f64,
}

/// Validated pair of coordinates received from a chat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    latitude: f64,
    longitude: f64,
    live: bool,
}

impl Location {
    /// Rejects non-finite values and values outside [-90, 90] / [-180, 180].
    pub fn new(latitude: f64, longitude: f64, live: bool) -> Result<Self, InvalidLocation> {
        if !LATITUDE_RANGE.contains(&latitude) || !LONGITUDE_RANGE.contains(&longitude) {
            return Err(InvalidLocation {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
            live,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Instruction sent to the generation model. Same coordinates always
    /// produce the same prompt.
    pub fn prompt(&self) -> String {
        format!(
            "Coordinates: {:.6}, {:.6}\n\
            \n\
            Find a notable place near these coordinates and share one engaging \
            fact about it. The fact must be:\n\
            - unusual and little known\n\
            - historically or culturally interesting\n\
            - no longer than 3-4 sentences\n\
            \n\
            Start with the name of the place and a short description of it, \
            then tell the fact.",
            self.latitude, self.longitude
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_coordinates_within_ranges() {
        assert!(Location::new(55.7558, 37.6176, false).is_ok());
        assert!(Location::new(-90.0, -180.0, false).is_ok());
        assert!(Location::new(90.0, 180.0, true).is_ok());
        assert!(Location::new(0.0, 0.0, false).is_ok());
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(Location::new(200.0, 37.6176, false).is_err());
        assert!(Location::new(-90.1, 0.0, false).is_err());
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        assert!(Location::new(55.7558, 180.5, false).is_err());
        assert!(Location::new(0.0, -181.0, false).is_err());
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        assert!(Location::new(f64::NAN, 0.0, false).is_err());
        assert!(Location::new(0.0, f64::NAN, false).is_err());
        assert!(Location::new(f64::INFINITY, 0.0, false).is_err());
    }

    #[test]
    fn prompt_embeds_coordinates() {
        let location = Location::new(55.7558, 37.6176, false).unwrap();
        let prompt = location.prompt();

        assert!(!prompt.is_empty());
        assert!(prompt.contains("55.755800"));
        assert!(prompt.contains("37.617600"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let location = Location::new(48.858370, 2.294481, false).unwrap();

        assert_eq!(location.prompt(), location.prompt());
    }

    #[test]
    fn live_flag_is_preserved() {
        assert!(Location::new(1.0, 2.0, true).unwrap().is_live());
        assert!(!Location::new(1.0, 2.0, false).unwrap().is_live());
    }
}
