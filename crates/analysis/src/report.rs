//! Decoded analysis records
//!
//! Field names follow the JSON the HTTP surface returns; unit-bearing keys
//! keep the tool's unit spelling.

use serde::Serialize;

/// Largest included, free, and included-along-free sphere diameters (Å)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoreDiameters {
    pub included_diameter: f64,
    pub free_diameter: f64,
    pub included_along_free: f64,
}

/// One area measurement in three units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaValues {
    #[serde(rename = "A2")]
    pub a2: f64,
    #[serde(rename = "m2/cm3")]
    pub m2_per_cm3: f64,
    #[serde(rename = "m2/g")]
    pub m2_per_g: f64,
}

/// Accessible and non-accessible surface area
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceArea {
    pub unitcell_volume: f64,
    pub density: f64,
    pub asa: AreaValues,
    pub nasa: AreaValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pockets: Option<u32>,
}

/// One volume measurement in three units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeValues {
    #[serde(rename = "A3")]
    pub a3: f64,
    pub volume_fraction: f64,
    #[serde(rename = "cm3/g")]
    pub cm3_per_g: f64,
}

/// Accessible (or probe-occupiable) and non-accessible volume
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Volume {
    pub unitcell_volume: f64,
    pub density: f64,
    pub av: VolumeValues,
    pub nav: VolumeValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelEntry {
    pub id: u32,
    pub included_diameter: f64,
    pub free_diameter: f64,
    pub included_along_free: f64,
}

/// Channel count, dimensionality and per-channel diameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channels {
    pub num_channels: u32,
    pub dimensionality: u32,
    pub channels: Vec<ChannelEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameworkEntry {
    pub id: u32,
    pub dimensionality: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureInfo {
    pub molecules: u32,
    pub frameworks: Vec<FrameworkEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenMetalSites {
    pub oms_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockingSphere {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockingSpheres {
    pub count: usize,
    pub spheres: Vec<BlockingSphere>,
}

/// Output returned verbatim (Voronoi network, XYZ conversion)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    pub content: String,
}

/// Decoded result of any operation; serializes as the bare record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisReport {
    PoreDiameters(PoreDiameters),
    SurfaceArea(SurfaceArea),
    Volume(Volume),
    Channels(Channels),
    StructureInfo(StructureInfo),
    OpenMetalSites(OpenMetalSites),
    BlockingSpheres(BlockingSpheres),
    Text(TextContent),
}
