use super::required_value;
use crate::report::{Volume, VolumeValues};
use zeorun_core::Result;

/// Which labels a volume file uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeFlavor {
    /// `-vol`: `AV_*` / `NAV_*`
    Accessible,
    /// `-volpo`: `POAV_*` / `PONAV_*`
    ProbeOccupiable,
}

impl VolumeFlavor {
    fn prefixes(self) -> (&'static str, &'static str) {
        match self {
            VolumeFlavor::Accessible => ("AV", "NAV"),
            VolumeFlavor::ProbeOccupiable => ("POAV", "PONAV"),
        }
    }

    fn format(self) -> &'static str {
        match self {
            VolumeFlavor::Accessible => "vol",
            VolumeFlavor::ProbeOccupiable => "volpo",
        }
    }
}

pub fn parse_vol(text: &str, flavor: VolumeFlavor) -> Result<Volume> {
    let (accessible, non_accessible) = flavor.prefixes();
    let format = flavor.format();
    Ok(Volume {
        unitcell_volume: required_value(text, "Unitcell_volume:", format)?,
        density: required_value(text, "Density:", format)?,
        av: values(text, accessible, format)?,
        nav: values(text, non_accessible, format)?,
    })
}

fn values(text: &str, prefix: &str, format: &str) -> Result<VolumeValues> {
    Ok(VolumeValues {
        a3: required_value(text, &format!("{prefix}_A^3:"), format)?,
        volume_fraction: required_value(text, &format!("{prefix}_Volume_fraction:"), format)?,
        cm3_per_g: required_value(text, &format!("{prefix}_cm^3/g:"), format)?,
    })
}
