use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::core::GeoPoint;
use crate::foundation::error::{TripReelError, TripReelResult};

/// A visited place. Coordinates are optional at the boundary because the surrounding
/// application may not have geocoded every stop; a stop without both cannot be scheduled.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stop {
    /// Stable identity, also used to key transport modes.
    pub id: String,
    /// Display title used for labels and status text.
    pub title: String,
    /// Latitude in degrees.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude in degrees.
    #[serde(default)]
    pub lon: Option<f64>,
}

impl Stop {
    /// Resolved coordinate, if both components are present and valid.
    pub fn coord(&self) -> Option<GeoPoint> {
        let p = GeoPoint::new(self.lon?, self.lat?);
        p.is_valid().then_some(p)
    }
}

/// A photo shown in a stop's carousel.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Photo {
    /// Stable identity.
    pub id: String,
    /// Source URL resolved by the configured [`crate::ImageSource`].
    pub url: String,
    /// Optional caption drawn under the photo.
    #[serde(default)]
    pub caption: Option<String>,
}

/// A stop paired with its photos in display order.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StopGroup {
    /// The stop.
    pub stop: Stop,
    /// Photos in display order.
    #[serde(default)]
    pub photos: Vec<Photo>,
}

/// Closed set of transport modes. Selects the overlay icon only; never affects timing.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Flight.
    Air,
    /// Train.
    Rail,
    /// Car, bus or any road vehicle.
    #[default]
    Road,
    /// Boat or ferry.
    Sea,
}

impl TransportMode {
    /// Glyph used in progress status text.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Air => "\u{2708}\u{fe0f}",
            Self::Rail => "\u{1f686}",
            Self::Road => "\u{1f697}",
            Self::Sea => "\u{1f6a2}",
        }
    }

    /// Lowercase name, matching the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            Self::Air => "air",
            Self::Rail => "rail",
            Self::Road => "road",
            Self::Sea => "sea",
        }
    }
}

/// Synthetic origin shown before the first stop.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StartingLocation {
    /// Display title.
    pub title: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Transport mode of the leg to the first stop.
    #[serde(default)]
    pub mode: TransportMode,
}

impl StartingLocation {
    /// Resolved coordinate, if valid.
    pub fn coord(&self) -> Option<GeoPoint> {
        let p = GeoPoint::new(self.lon, self.lat);
        p.is_valid().then_some(p)
    }
}

/// Everything a generation run consumes from the surrounding application.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripInput {
    /// Overall title shown on the opening slide.
    pub title: String,
    /// Stop groups in route order.
    pub groups: Vec<StopGroup>,
    /// Per-leg transport modes keyed by `"<fromStopId>-<toStopId>"`.
    #[serde(default)]
    pub transport: BTreeMap<String, TransportMode>,
    /// Optional synthetic starting location.
    #[serde(default)]
    pub start: Option<StartingLocation>,
}

impl TripInput {
    /// Parse a trip from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> TripReelResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| TripReelError::validation(format!("parse trip JSON: {e}")))
    }

    /// Parse a trip from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> TripReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            TripReelError::validation(format!("open trip JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Transport mode between two stops, `Road` when unspecified.
    pub fn mode_between(&self, from_id: &str, to_id: &str) -> TransportMode {
        self.transport
            .get(&leg_key(from_id, to_id))
            .copied()
            .unwrap_or_default()
    }

    /// Total photo count across all groups.
    pub fn photo_count(&self) -> usize {
        self.groups.iter().map(|g| g.photos.len()).sum()
    }

    /// Reject inputs that cannot be scheduled.
    ///
    /// Runs before any surface or encoder is allocated.
    pub fn validate(&self) -> TripReelResult<()> {
        if self.groups.is_empty() {
            return Err(TripReelError::config("trip has no stops"));
        }
        for (i, g) in self.groups.iter().enumerate() {
            if g.stop.coord().is_none() {
                return Err(TripReelError::config(format!(
                    "stop #{i} '{}' ({}) has no valid coordinate",
                    g.stop.title, g.stop.id
                )));
            }
        }
        if let Some(start) = self.start.as_ref()
            && start.coord().is_none()
        {
            return Err(TripReelError::config(format!(
                "starting location '{}' has no valid coordinate",
                start.title
            )));
        }
        Ok(())
    }
}

/// Key used in [`TripInput::transport`].
pub fn leg_key(from_id: &str, to_id: &str) -> String {
    format!("{from_id}-{to_id}")
}

#[cfg(test)]
#[path = "../../tests/unit/trip/model.rs"]
mod tests;
