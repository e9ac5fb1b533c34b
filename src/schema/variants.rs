//! Built-in schema variants
//!
//! - `split`: separate reach, node and SWORD files, full source extent,
//!   `Qhat` averaged over the cross-section axis
//! - `combined`: one file with `swot_reach`, `swot_node` and `sword` groups,
//!   the first 10 time steps and 5 cross-sections, scalar `Qhat`
//! - `sliced`: a SWOT file with reach/node groups and a SWORD file, renamed
//!   from file name tokens, the first 324 time steps and 10 cross-sections,
//!   scalar `Qhat`
//!
//! `Qhat` is not computed the same way in every variant. Each table keeps its
//! own definition.

use super::{
    ContainerSchema, DimensionDescriptor, ElementType, FieldAttributes, FieldDescriptor,
    FieldKind, OutputNaming, Schema, TokenRename, DEFAULT_FILL,
};
use std::path::PathBuf;

/// Names accepted by [`by_name`]
pub const VARIANT_NAMES: &[&str] = &["split", "combined", "sliced"];

/// Built-in schema called `name`, if there is one.
pub fn by_name(name: &str) -> Option<Schema> {
    match name {
        "split" => Some(split()),
        "combined" => Some(combined()),
        "sliced" => Some(sliced()),
        _ => None,
    }
}

fn copy(target: &str, dims: &[&str], source: &str, attributes: FieldAttributes) -> FieldDescriptor {
    FieldDescriptor {
        target: target.to_string(),
        dims: dims.iter().map(|d| d.to_string()).collect(),
        element_type: ElementType::F64,
        fill_value: Some(DEFAULT_FILL),
        attributes,
        kind: FieldKind::Copy {
            source: source.to_string(),
        },
    }
}

fn coordinate(name: &str, source: &str, units: &str) -> FieldDescriptor {
    FieldDescriptor {
        target: name.to_string(),
        dims: vec![name.to_string()],
        element_type: ElementType::I32,
        fill_value: None,
        attributes: FieldAttributes::new(units, name),
        kind: FieldKind::Copy {
            source: source.to_string(),
        },
    }
}

fn slope2(group: Option<&str>, dims: &[&str], source: &str) -> FieldDescriptor {
    copy(
        &in_group(group, "slope2"),
        dims,
        source,
        FieldAttributes::new("m/m", "enhanced water surface slope with respect to geoid")
            .valid_range(-0.001, 0.1),
    )
}

/// `width`, `wse` and the derived `d_x_area` of a node container.
fn node_fields(group: Option<&str>, wse_source: &str) -> Vec<FieldDescriptor> {
    let width = in_group(group, "width");
    let wse = in_group(group, "wse");
    vec![
        copy(
            &width,
            &["nt", "nx"],
            "XS_Timseries/W",
            FieldAttributes::new("m", "node width").valid_range(0.0, 100_000.0),
        ),
        copy(
            &wse,
            &["nt", "nx"],
            wse_source,
            FieldAttributes::new("m", "water surface elevation with respect to the geoid")
                .valid_range(-1000.0, 100_000.0),
        ),
        FieldDescriptor {
            target: in_group(group, "d_x_area"),
            dims: vec!["nt".to_string(), "nx".to_string()],
            element_type: ElementType::F64,
            fill_value: Some(DEFAULT_FILL),
            attributes: FieldAttributes::new("m^2", "change in cross-sectional area")
                .valid_range(-10_000_000.0, 10_000_000.0),
            kind: FieldKind::CrossSectionAreaChange { wse, width },
        },
    ]
}

fn qhat(target: &str, dims: &[&str], axis: Option<usize>, fill: f64, units: &str) -> FieldDescriptor {
    FieldDescriptor {
        target: target.to_string(),
        dims: dims.iter().map(|d| d.to_string()).collect(),
        element_type: ElementType::F64,
        fill_value: Some(fill),
        attributes: FieldAttributes::new(units, "Qhat"),
        kind: FieldKind::Mean {
            source: "XS_Timseries/Q".to_string(),
            axis,
        },
    }
}

fn in_group(group: Option<&str>, name: &str) -> String {
    match group {
        Some(group) => format!("{group}/{name}"),
        None => name.to_string(),
    }
}

fn keep_name(directory: &str) -> OutputNaming {
    OutputNaming {
        directory: PathBuf::from(directory),
        rename: None,
    }
}

fn token_name(directory: &str, prefix: &str) -> OutputNaming {
    OutputNaming {
        directory: PathBuf::from(directory),
        rename: Some(TokenRename {
            prefix: prefix.to_string(),
            delimiter: "_".to_string(),
            tokens: vec![2, 3],
        }),
    }
}

/// Three files, one per role, sized from the full source dimensions.
pub fn split() -> Schema {
    let nt = DimensionDescriptor::new("nt", "Time steps");

    Schema {
        name: "split".to_string(),
        containers: vec![
            ContainerSchema {
                role: "reach".to_string(),
                title_prefix: String::new(),
                groups: Vec::new(),
                dimensions: vec![nt.clone(), DimensionDescriptor::new("nx", "Reach")],
                fields: vec![slope2(None, &["nt", "nx"], "Reach_Timeseries/S_90m")],
                output: keep_name("swot_reach"),
            },
            ContainerSchema {
                role: "node".to_string(),
                title_prefix: String::new(),
                groups: Vec::new(),
                dimensions: vec![nt.clone(), DimensionDescriptor::new("nx", "XS_90m")],
                fields: node_fields(None, "XS_Timseries/H_1km"),
                output: keep_name("swot_node"),
            },
            ContainerSchema {
                role: "sword".to_string(),
                title_prefix: String::new(),
                groups: Vec::new(),
                dimensions: vec![nt],
                fields: vec![qhat("Qhat", &["nt"], Some(1), 99_999.0, "??")],
                output: keep_name("sword"),
            },
        ],
    }
}

/// One file holding reach, node and SWORD groups over a small window.
pub fn combined() -> Schema {
    let mut fields = vec![
        coordinate("nt", "Time steps", "day"),
        coordinate("nx", "XS_90m", "orthogonals"),
        slope2(Some("swot_reach"), &["nt"], "Reach_Timeseries/S_1km"),
    ];
    fields.extend(node_fields(Some("swot_node"), "XS_Timseries/H_1km"));
    fields.push(qhat("sword/Qhat", &[], None, DEFAULT_FILL, "m^3/s"));

    Schema {
        name: "combined".to_string(),
        containers: vec![ContainerSchema {
            role: "swot".to_string(),
            title_prefix: String::new(),
            groups: vec![
                "swot_reach".to_string(),
                "swot_node".to_string(),
                "sword".to_string(),
            ],
            dimensions: vec![
                DimensionDescriptor::new("nt", "Time steps").limited(10),
                DimensionDescriptor::new("nx", "XS_90m").limited(5),
            ],
            fields,
            output: keep_name("output"),
        }],
    }
}

/// A SWOT file and a SWORD file renamed from file name tokens.
pub fn sliced() -> Schema {
    let mut swot_fields = vec![
        coordinate("nt", "Time steps", "day"),
        coordinate("nx", "XS_90m", "orthogonals"),
        slope2(Some("swot_reach"), &["nt"], "Reach_Timeseries/S_1km"),
    ];
    swot_fields.extend(node_fields(Some("swot_node"), "XS_Timseries/H_1km"));

    Schema {
        name: "sliced".to_string(),
        containers: vec![
            ContainerSchema {
                role: "swot".to_string(),
                title_prefix: "SWOT_".to_string(),
                groups: vec!["swot_reach".to_string(), "swot_node".to_string()],
                dimensions: vec![
                    DimensionDescriptor::new("nt", "Time steps").limited(324),
                    DimensionDescriptor::new("nx", "XS_90m").limited(10),
                ],
                fields: swot_fields,
                output: token_name("output/swot", "SWOT"),
            },
            ContainerSchema {
                role: "sword".to_string(),
                title_prefix: "SWORD_".to_string(),
                groups: Vec::new(),
                dimensions: Vec::new(),
                fields: vec![qhat("Qhat", &[], None, DEFAULT_FILL, "m^3/s")],
                output: token_name("output/sword", "SWORD"),
            },
        ],
    }
}
