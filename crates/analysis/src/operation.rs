//! The closed set of supported analyses

use crate::parsers::{
    parse_block, parse_chan, parse_oms, parse_res, parse_sa, parse_strinfo, parse_vol,
    VolumeFlavor,
};
use crate::report::{AnalysisReport, TextContent};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use zeorun_core::{Error, ExecutionResult, Result, ToolArguments, STAGED_INPUT_STEM};
use zeorun_runner::OperationDescriptor;

/// Identifier-level view of an operation, without parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    PoreDiameter,
    SurfaceArea,
    AccessibleVolume,
    ProbeVolume,
    ChannelAnalysis,
    StructureInfo,
    OpenMetalSites,
    VoronoiNetwork,
    ConvertXyz,
    BlockingSpheres,
}

impl OperationKind {
    pub const ALL: [OperationKind; 10] = [
        OperationKind::PoreDiameter,
        OperationKind::SurfaceArea,
        OperationKind::AccessibleVolume,
        OperationKind::ProbeVolume,
        OperationKind::ChannelAnalysis,
        OperationKind::StructureInfo,
        OperationKind::OpenMetalSites,
        OperationKind::VoronoiNetwork,
        OperationKind::ConvertXyz,
        OperationKind::BlockingSpheres,
    ];

    /// Stable identifier used in routes and cache keys
    pub fn id(self) -> &'static str {
        match self {
            OperationKind::PoreDiameter => "pore_diameter",
            OperationKind::SurfaceArea => "surface_area",
            OperationKind::AccessibleVolume => "accessible_volume",
            OperationKind::ProbeVolume => "probe_volume",
            OperationKind::ChannelAnalysis => "channel_analysis",
            OperationKind::StructureInfo => "structure_info",
            OperationKind::OpenMetalSites => "oms_detection",
            OperationKind::VoronoiNetwork => "voronoi_network",
            OperationKind::ConvertXyz => "convert_xyz",
            OperationKind::BlockingSpheres => "blocking_spheres",
        }
    }

    /// File the tool writes for this operation
    pub fn output_file(self) -> &'static str {
        match self {
            OperationKind::PoreDiameter => "result.res",
            OperationKind::SurfaceArea => "result.sa",
            OperationKind::AccessibleVolume => "result.vol",
            OperationKind::ProbeVolume => "result.volpo",
            OperationKind::ChannelAnalysis => "result.chan",
            OperationKind::StructureInfo => "result.strinfo",
            OperationKind::OpenMetalSites => "result.oms",
            OperationKind::VoronoiNetwork => "result.nt2",
            OperationKind::ConvertXyz => "result.xyz",
            OperationKind::BlockingSpheres => "result.block",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            OperationKind::PoreDiameter => "largest included and free sphere diameters",
            OperationKind::SurfaceArea => "accessible surface area (Monte Carlo)",
            OperationKind::AccessibleVolume => "accessible volume (Monte Carlo)",
            OperationKind::ProbeVolume => "probe-occupiable volume (Monte Carlo)",
            OperationKind::ChannelAnalysis => "channel count and dimensionality",
            OperationKind::StructureInfo => "framework and molecule identification",
            OperationKind::OpenMetalSites => "open metal site detection",
            OperationKind::VoronoiNetwork => "Voronoi network export",
            OperationKind::ConvertXyz => "conversion to XYZ",
            OperationKind::BlockingSpheres => "blocking spheres for inaccessible pockets",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for OperationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| Error::invalid_input("operation", format!("unknown operation '{s}'")))
    }
}

/// Monte Carlo sampling parameters shared by the area and volume analyses
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub chan_radius: f64,
    pub probe_radius: f64,
    pub samples: u32,
    pub high_accuracy: bool,
}

/// A fully parameterised analysis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    PoreDiameter {
        high_accuracy: bool,
    },
    SurfaceArea(SamplingParams),
    AccessibleVolume(SamplingParams),
    ProbeVolume(SamplingParams),
    ChannelAnalysis {
        probe_radius: f64,
        high_accuracy: bool,
    },
    StructureInfo,
    OpenMetalSites,
    VoronoiNetwork {
        use_radii: bool,
    },
    ConvertXyz,
    BlockingSpheres {
        probe_radius: f64,
        samples: u32,
        high_accuracy: bool,
    },
}

/// Loosely typed parameters as they arrive from flags or form fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationParams {
    /// High accuracy mode (`-ha`); defaults to on
    pub high_accuracy: Option<bool>,
    pub chan_radius: Option<f64>,
    pub probe_radius: Option<f64>,
    pub samples: Option<u32>,
    /// Use atomic radii (`-r`) instead of point atoms (`-nor`); defaults to on
    pub use_radii: Option<bool>,
}

impl Operation {
    /// Build and validate an operation of `kind` from loose parameters
    pub fn from_params(kind: OperationKind, params: &OperationParams) -> Result<Self> {
        let high_accuracy = params.high_accuracy.unwrap_or(true);
        let operation = match kind {
            OperationKind::PoreDiameter => Operation::PoreDiameter { high_accuracy },
            OperationKind::SurfaceArea => Operation::SurfaceArea(sampling(params)?),
            OperationKind::AccessibleVolume => Operation::AccessibleVolume(sampling(params)?),
            OperationKind::ProbeVolume => Operation::ProbeVolume(sampling(params)?),
            OperationKind::ChannelAnalysis => Operation::ChannelAnalysis {
                probe_radius: required(params.probe_radius, "probe_radius")?,
                high_accuracy,
            },
            OperationKind::StructureInfo => Operation::StructureInfo,
            OperationKind::OpenMetalSites => Operation::OpenMetalSites,
            OperationKind::VoronoiNetwork => Operation::VoronoiNetwork {
                use_radii: params.use_radii.unwrap_or(true),
            },
            OperationKind::ConvertXyz => Operation::ConvertXyz,
            OperationKind::BlockingSpheres => Operation::BlockingSpheres {
                probe_radius: required(params.probe_radius, "probe_radius")?,
                samples: required(params.samples, "samples")?,
                high_accuracy,
            },
        };
        operation.validate()?;
        Ok(operation)
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::PoreDiameter { .. } => OperationKind::PoreDiameter,
            Operation::SurfaceArea(_) => OperationKind::SurfaceArea,
            Operation::AccessibleVolume(_) => OperationKind::AccessibleVolume,
            Operation::ProbeVolume(_) => OperationKind::ProbeVolume,
            Operation::ChannelAnalysis { .. } => OperationKind::ChannelAnalysis,
            Operation::StructureInfo => OperationKind::StructureInfo,
            Operation::OpenMetalSites => OperationKind::OpenMetalSites,
            Operation::VoronoiNetwork { .. } => OperationKind::VoronoiNetwork,
            Operation::ConvertXyz => OperationKind::ConvertXyz,
            Operation::BlockingSpheres { .. } => OperationKind::BlockingSpheres,
        }
    }

    /// Reject radii that are negative or not finite and zero sample counts
    pub fn validate(&self) -> Result<()> {
        match *self {
            Operation::SurfaceArea(p) | Operation::AccessibleVolume(p) | Operation::ProbeVolume(p) => {
                check_radius(p.chan_radius, "chan_radius")?;
                check_radius(p.probe_radius, "probe_radius")?;
                check_samples(p.samples)
            }
            Operation::ChannelAnalysis { probe_radius, .. } => {
                check_radius(probe_radius, "probe_radius")
            }
            Operation::BlockingSpheres {
                probe_radius,
                samples,
                ..
            } => {
                check_radius(probe_radius, "probe_radius")?;
                check_samples(samples)
            }
            Operation::PoreDiameter { .. }
            | Operation::StructureInfo
            | Operation::OpenMetalSites
            | Operation::VoronoiNetwork { .. }
            | Operation::ConvertXyz => Ok(()),
        }
    }

    /// Decode this operation's output file from a successful result
    pub fn decode(&self, result: &ExecutionResult) -> Result<AnalysisReport> {
        let text = result.output_text(self.kind().output_file())?;
        let report = match self {
            Operation::PoreDiameter { .. } => AnalysisReport::PoreDiameters(parse_res(text)?),
            Operation::SurfaceArea(_) => AnalysisReport::SurfaceArea(parse_sa(text)?),
            Operation::AccessibleVolume(_) => {
                AnalysisReport::Volume(parse_vol(text, VolumeFlavor::Accessible)?)
            }
            Operation::ProbeVolume(_) => {
                AnalysisReport::Volume(parse_vol(text, VolumeFlavor::ProbeOccupiable)?)
            }
            Operation::ChannelAnalysis { .. } => AnalysisReport::Channels(parse_chan(text)?),
            Operation::StructureInfo => AnalysisReport::StructureInfo(parse_strinfo(text)?),
            Operation::OpenMetalSites => AnalysisReport::OpenMetalSites(parse_oms(text)?),
            Operation::BlockingSpheres { .. } => {
                AnalysisReport::BlockingSpheres(parse_block(text)?)
            }
            Operation::VoronoiNetwork { .. } | Operation::ConvertXyz => {
                AnalysisReport::Text(TextContent {
                    content: text.to_string(),
                })
            }
        };
        Ok(report)
    }
}

impl OperationDescriptor for Operation {
    fn id(&self) -> &'static str {
        self.kind().id()
    }

    fn arguments(&self, staged_input: &str) -> ToolArguments {
        let output = self.kind().output_file();
        let mut args = ToolArguments::new();

        match *self {
            Operation::PoreDiameter { high_accuracy } => {
                push_ha(&mut args, high_accuracy);
                args.extend(["-res", output]);
            }
            Operation::SurfaceArea(p) => push_sampling(&mut args, "-sa", p, output),
            Operation::AccessibleVolume(p) => push_sampling(&mut args, "-vol", p, output),
            Operation::ProbeVolume(p) => push_sampling(&mut args, "-volpo", p, output),
            Operation::ChannelAnalysis {
                probe_radius,
                high_accuracy,
            } => {
                push_ha(&mut args, high_accuracy);
                args.push("-chan");
                args.push(probe_radius.to_string());
                args.push(output);
            }
            Operation::StructureInfo => args.extend(["-strinfo", output]),
            Operation::OpenMetalSites => args.extend(["-oms", output]),
            Operation::VoronoiNetwork { use_radii } => {
                args.push(if use_radii { "-r" } else { "-nor" });
                args.extend(["-nt2", output]);
            }
            Operation::ConvertXyz => args.extend(["-xyz", output]),
            Operation::BlockingSpheres {
                probe_radius,
                samples,
                high_accuracy,
            } => {
                push_ha(&mut args, high_accuracy);
                args.push("-block");
                args.push(probe_radius.to_string());
                args.push(samples.to_string());
                args.push(output);
            }
        }

        args.push(staged_input);
        args
    }

    fn output_files(&self) -> BTreeSet<String> {
        BTreeSet::from([self.kind().output_file().to_string()])
    }
}

/// Canonical workspace name for an upload: `structure.<ext>`.
///
/// The tool picks its reader from the extension, so only that part of the
/// upload name survives; identical bytes uploaded under different names
/// therefore run with identical arguments.
pub fn staged_input_name(upload_name: &str) -> Result<String> {
    let ext = Path::new(upload_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .ok_or_else(|| {
            Error::invalid_input(
                "structure_file",
                format!("'{upload_name}' has no usable file extension"),
            )
        })?;
    Ok(format!("{STAGED_INPUT_STEM}.{}", ext.to_ascii_lowercase()))
}

fn push_ha(args: &mut ToolArguments, high_accuracy: bool) {
    if high_accuracy {
        args.push("-ha");
    }
}

fn push_sampling(args: &mut ToolArguments, flag: &str, p: SamplingParams, output: &str) {
    push_ha(args, p.high_accuracy);
    args.push(flag);
    args.push(p.chan_radius.to_string());
    args.push(p.probe_radius.to_string());
    args.push(p.samples.to_string());
    args.push(output);
}

fn sampling(params: &OperationParams) -> Result<SamplingParams> {
    Ok(SamplingParams {
        chan_radius: required(params.chan_radius, "chan_radius")?,
        probe_radius: required(params.probe_radius, "probe_radius")?,
        samples: required(params.samples, "samples")?,
        high_accuracy: params.high_accuracy.unwrap_or(true),
    })
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| Error::invalid_input(field, "is required"))
}

fn check_radius(value: f64, field: &str) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_input(
            field,
            format!("must be a finite, non-negative number, got {value}"),
        ))
    }
}

fn check_samples(samples: u32) -> Result<()> {
    if samples >= 1 {
        Ok(())
    } else {
        Err(Error::invalid_input("samples", "must be at least 1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn sampling_params() -> OperationParams {
        OperationParams {
            chan_radius: Some(1.2),
            probe_radius: Some(1.2),
            samples: Some(2000),
            ..Default::default()
        }
    }

    fn args(op: &Operation) -> Vec<String> {
        op.arguments("structure.cif").into_inner()
    }

    fn result_with(name: &str, content: &str) -> ExecutionResult {
        let mut outputs = BTreeMap::new();
        outputs.insert(name.to_string(), content.as_bytes().to_vec());
        ExecutionResult::completed(Some(0), String::new(), outputs, None, Duration::ZERO)
    }

    #[test]
    fn test_kind_round_trips_through_id() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.id().parse::<OperationKind>().unwrap(), kind);
            assert!(kind.output_file().starts_with("result."));
        }
        assert!("pore".parse::<OperationKind>().is_err());
    }

    #[test]
    fn test_argument_templates() {
        let params = OperationParams::default();
        let pore = Operation::from_params(OperationKind::PoreDiameter, &params).unwrap();
        assert_eq!(args(&pore), ["-ha", "-res", "result.res", "structure.cif"]);

        let sa = Operation::from_params(OperationKind::SurfaceArea, &sampling_params()).unwrap();
        assert_eq!(
            args(&sa),
            ["-ha", "-sa", "1.2", "1.2", "2000", "result.sa", "structure.cif"]
        );

        let volpo = Operation::from_params(
            OperationKind::ProbeVolume,
            &OperationParams {
                high_accuracy: Some(false),
                ..sampling_params()
            },
        )
        .unwrap();
        assert_eq!(
            args(&volpo),
            ["-volpo", "1.2", "1.2", "2000", "result.volpo", "structure.cif"]
        );

        let chan = Operation::ChannelAnalysis {
            probe_radius: 1.5,
            high_accuracy: true,
        };
        assert_eq!(
            args(&chan),
            ["-ha", "-chan", "1.5", "result.chan", "structure.cif"]
        );

        assert_eq!(
            args(&Operation::StructureInfo),
            ["-strinfo", "result.strinfo", "structure.cif"]
        );
        assert_eq!(
            args(&Operation::OpenMetalSites),
            ["-oms", "result.oms", "structure.cif"]
        );
        assert_eq!(
            args(&Operation::VoronoiNetwork { use_radii: false }),
            ["-nor", "-nt2", "result.nt2", "structure.cif"]
        );
        assert_eq!(
            args(&Operation::ConvertXyz),
            ["-xyz", "result.xyz", "structure.cif"]
        );
        assert_eq!(
            args(&Operation::BlockingSpheres {
                probe_radius: 1.86,
                samples: 50,
                high_accuracy: false
            }),
            ["-block", "1.86", "50", "result.block", "structure.cif"]
        );
    }

    #[test]
    fn test_descriptor_metadata() {
        let op = Operation::OpenMetalSites;
        assert_eq!(OperationDescriptor::id(&op), "oms_detection");
        assert_eq!(
            op.output_files(),
            BTreeSet::from(["result.oms".to_string()])
        );
        assert_eq!(op.timeout(), None);
    }

    #[test]
    fn test_missing_and_invalid_parameters() {
        let err = Operation::from_params(OperationKind::SurfaceArea, &OperationParams::default())
            .unwrap_err();
        assert!(err.is_caller_error());
        assert!(err.to_string().contains("chan_radius"));

        let negative = OperationParams {
            probe_radius: Some(-1.0),
            ..sampling_params()
        };
        assert!(Operation::from_params(OperationKind::SurfaceArea, &negative).is_err());

        let nan = OperationParams {
            probe_radius: Some(f64::NAN),
            samples: Some(10),
            ..Default::default()
        };
        assert!(Operation::from_params(OperationKind::BlockingSpheres, &nan).is_err());

        let zero_samples = OperationParams {
            samples: Some(0),
            ..sampling_params()
        };
        let err = Operation::from_params(OperationKind::AccessibleVolume, &zero_samples)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { ref field, .. } if field == "samples"));

        // Zero radius is allowed (point probe)
        let zero_radius = OperationParams {
            probe_radius: Some(0.0),
            ..Default::default()
        };
        assert!(Operation::from_params(OperationKind::ChannelAnalysis, &zero_radius).is_ok());
    }

    #[test]
    fn test_staged_input_name() {
        assert_eq!(staged_input_name("IRMOF-1.CIF").unwrap(), "structure.cif");
        assert_eq!(staged_input_name("/tmp/upload/edi.cssr").unwrap(), "structure.cssr");
        assert!(staged_input_name("noext").is_err());
        assert!(staged_input_name("weird.c if").is_err());
        assert!(staged_input_name("trailing.").is_err());
    }

    #[test]
    fn test_same_bytes_different_upload_names_share_arguments() {
        let op = Operation::PoreDiameter {
            high_accuracy: true,
        };
        let a = op.arguments(&staged_input_name("a.cif").unwrap());
        let b = op.arguments(&staged_input_name("B.CIF").unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_dispatches_by_operation() {
        let res = result_with("result.res", "structure.res 4.8 3.0 4.7\n");
        let report = Operation::PoreDiameter {
            high_accuracy: true,
        }
        .decode(&res)
        .unwrap();
        assert!(matches!(report, AnalysisReport::PoreDiameters(ref r) if r.free_diameter == 3.0));

        let xyz = result_with("result.xyz", "3\n\nO 0 0 0\n");
        match Operation::ConvertXyz.decode(&xyz).unwrap() {
            AnalysisReport::Text(text) => assert_eq!(text.content, "3\n\nO 0 0 0\n"),
            other => panic!("unexpected report {other:?}"),
        }

        // Output for a different operation is a missing output
        assert!(matches!(
            Operation::OpenMetalSites.decode(&res),
            Err(Error::MissingOutput { .. })
        ));
    }

    #[test]
    fn test_report_serializes_flat() {
        let oms = result_with("result.oms", "OMS detected: 3\n");
        let report = Operation::OpenMetalSites.decode(&oms).unwrap();
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({ "oms_count": 3 })
        );
    }
}
