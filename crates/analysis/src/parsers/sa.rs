use super::{labelled_value, required_value};
use crate::report::{AreaValues, SurfaceArea};
use zeorun_core::Result;

const FORMAT: &str = "sa";

/// Labelled `-sa` output; labels may share a line or be split across lines
pub fn parse_sa(text: &str) -> Result<SurfaceArea> {
    Ok(SurfaceArea {
        unitcell_volume: required_value(text, "Unitcell_volume:", FORMAT)?,
        density: required_value(text, "Density:", FORMAT)?,
        asa: area(text, "ASA")?,
        nasa: area(text, "NASA")?,
        channels: labelled_value(text, "Number_of_channels:").map(|v| v as u32),
        pockets: labelled_value(text, "Number_of_pockets:").map(|v| v as u32),
    })
}

fn area(text: &str, prefix: &str) -> Result<AreaValues> {
    Ok(AreaValues {
        a2: required_value(text, &format!("{prefix}_A^2:"), FORMAT)?,
        m2_per_cm3: required_value(text, &format!("{prefix}_m^2/cm^3:"), FORMAT)?,
        m2_per_g: required_value(text, &format!("{prefix}_m^2/g:"), FORMAT)?,
    })
}
