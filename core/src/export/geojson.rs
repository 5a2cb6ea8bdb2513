use crate::prelude::GeoPoint;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Which of the two exported point sets a group belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointGroupKind {
    AllPoints,
    MostLikely,
}

impl PointGroupKind {
    pub fn display_name(self) -> &'static str {
        match self {
            PointGroupKind::AllPoints => "Various Points",
            PointGroupKind::MostLikely => "Most Likely TX Location",
        }
    }

    pub fn marker_color(self) -> &'static str {
        match self {
            PointGroupKind::AllPoints => "#FF0000",
            PointGroupKind::MostLikely => "#00FF00",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointGroup {
    pub kind: PointGroupKind,
    pub points: Vec<GeoPoint>,
}

/// Named point groups produced by the export pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportArtifact {
    pub groups: Vec<PointGroup>,
}

impl ExportArtifact {
    pub fn group(&self, kind: PointGroupKind) -> Option<&PointGroup> {
        self.groups.iter().find(|group| group.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            kind: "FeatureCollection",
            features: self
                .groups
                .iter()
                .map(|group| Feature {
                    kind: "Feature",
                    properties: FeatureProperties {
                        name: group.kind.display_name(),
                        marker_color: group.kind.marker_color(),
                    },
                    geometry: MultiPoint {
                        kind: "MultiPoint",
                        // GeoJSON positions are [longitude, latitude]
                        coordinates: group
                            .points
                            .iter()
                            .map(|p| [p.longitude, p.latitude])
                            .collect(),
                    },
                })
                .collect(),
        }
    }

    pub fn to_geojson_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_feature_collection())
    }

    pub fn write_geojson(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let body = self
            .to_geojson_string()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, body)
    }
}

#[derive(Debug, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    properties: FeatureProperties,
    geometry: MultiPoint,
}

#[derive(Debug, Serialize)]
struct FeatureProperties {
    name: &'static str,
    #[serde(rename = "marker-color")]
    marker_color: &'static str,
}

#[derive(Debug, Serialize)]
struct MultiPoint {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: Vec<[f64; 2]>,
}
