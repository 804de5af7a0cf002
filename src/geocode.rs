use crate::geo::Coordinate;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeocodeError {
    #[error("location not found: {0:?}")]
    LocationNotFound(String),
}

/// Resolves a free-text location to a coordinate.
pub trait Geocoder: Send + Sync + std::fmt::Debug {
    fn resolve(&self, location: &str) -> Result<Coordinate, GeocodeError>;
}

/// A named place in a gazetteer table, as written in `[[geocoder.places]]`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

const SAN_JOSE_PLACES: &[(&str, f64, f64)] = &[
    ("downtown san jose", 37.3382, -121.8863),
    ("santana row", 37.3209, -121.9476),
    ("sjsu", 37.3352, -121.8811),
    ("airport", 37.3639, -121.9289),
    ("willow glen", 37.3094, -121.8990),
    ("japantown", 37.3480, -121.8950),
    ("east san jose", 37.3509, -121.8121),
    ("north san jose", 37.3871, -121.9334),
    ("south san jose", 37.2424, -121.8747),
    ("west san jose", 37.3239, -121.9769),
    ("city hall", 37.3374, -121.8862),
    ("winchester mystery house", 37.3184, -121.9511),
    ("valley fair mall", 37.3261, -121.9465),
    ("communications hill", 37.2924, -121.8583),
    ("alum rock", 37.3772, -121.8244),
];

/// Static name → coordinate lookup.
///
/// Matching is case-insensitive: an exact name wins, otherwise the first
/// entry whose name contains the query (or is contained in it) is used.
#[derive(Debug, Clone)]
pub struct GazetteerGeocoder {
    entries: Vec<(String, Coordinate)>,
}

impl GazetteerGeocoder {
    pub fn new(entries: Vec<(String, Coordinate)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(name, coordinate)| (name.trim().to_lowercase(), coordinate))
            .filter(|(name, coordinate)| !name.is_empty() && coordinate.is_valid())
            .collect();
        Self { entries }
    }

    pub fn from_places(places: &[Place]) -> Self {
        Self::new(
            places
                .iter()
                .map(|place| {
                    (
                        place.name.clone(),
                        Coordinate::new(place.latitude, place.longitude),
                    )
                })
                .collect(),
        )
    }

    pub fn san_jose_default() -> Self {
        Self::new(
            SAN_JOSE_PLACES
                .iter()
                .map(|(name, lat, lon)| (name.to_string(), Coordinate::new(*lat, *lon)))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Geocoder for GazetteerGeocoder {
    fn resolve(&self, location: &str) -> Result<Coordinate, GeocodeError> {
        let query = location.trim().to_lowercase();
        if query.is_empty() {
            return Err(GeocodeError::LocationNotFound(location.to_string()));
        }

        self.entries
            .iter()
            .find(|(name, _)| *name == query)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(name, _)| name.contains(&query) || query.contains(name.as_str()))
            })
            .map(|(_, coordinate)| *coordinate)
            .ok_or_else(|| GeocodeError::LocationNotFound(location.to_string()))
    }
}
