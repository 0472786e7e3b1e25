#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BoundingBoxError {
    #[error("half width must be a non-negative number of degrees, got {0}")]
    InvalidHalfWidth(f64),
}

/// Latitude/longitude rectangle `[lat - w, lat + w] x [lon - w, lon + w]`.
///
/// Both ranges are inclusive. This is a flat-degree approximation of
/// "nearby"; no geodesic distance is involved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn around(latitude: f64, longitude: f64, half_width: f64) -> Result<Self, BoundingBoxError> {
        if !half_width.is_finite() || half_width < 0.0 {
            return Err(BoundingBoxError::InvalidHalfWidth(half_width));
        }

        Ok(Self {
            min_latitude: latitude - half_width,
            max_latitude: latitude + half_width,
            min_longitude: longitude - half_width,
            max_longitude: longitude + half_width,
        })
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_latitude
            && latitude <= self.max_latitude
            && longitude >= self.min_longitude
            && longitude <= self.max_longitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_edges_are_inclusive() {
        let bbox = BoundingBox::around(32.0, -111.0, 2.0).unwrap();
        assert!(bbox.contains(34.0, -113.0));
        assert!(bbox.contains(30.0, -109.0));
        assert!(!bbox.contains(34.0001, -111.0));
    }

    #[test]
    fn box_matches_on_both_axes_only() {
        let bbox = BoundingBox::around(32.0, -111.0, 2.0).unwrap();
        assert!(bbox.contains(33.5, -112.5));
        assert!(!bbox.contains(35.0, -111.0));
        assert!(!bbox.contains(32.0, -114.0));
    }

    #[test]
    fn corner_outside_a_circle_is_still_inside_the_box() {
        // (r, r) away from the centre is ~1.41r in flat distance.
        let bbox = BoundingBox::around(0.0, 0.0, 1.0).unwrap();
        assert!(bbox.contains(1.0, 1.0));
    }

    #[test]
    fn negative_or_nan_half_width_is_rejected() {
        assert!(matches!(
            BoundingBox::around(0.0, 0.0, -1.0),
            Err(BoundingBoxError::InvalidHalfWidth(_))
        ));
        assert!(BoundingBox::around(0.0, 0.0, f64::NAN).is_err());
        assert!(BoundingBox::around(0.0, 0.0, 0.0).is_ok());
    }
}
