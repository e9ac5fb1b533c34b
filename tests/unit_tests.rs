//! Unit tests for the pure parts of swot_relabel: masked arithmetic, derived
//! fields, schema validation and path naming.

use ndarray::{array, ArrayD};
use std::path::{Path, PathBuf};
use swot_relabel::{
    derive::{calculate, mean},
    errors::{RelabelError, SchemaError},
    masked::MaskedArray,
    parallel::ParallelConfig,
    paths::{discover_inputs, rename_from_tokens, NamingResolver, PathResolver},
    schema::{
        variants::{self, VARIANT_NAMES},
        ContainerSchema, DimensionDescriptor, ElementType, FieldAttributes, FieldDescriptor,
        FieldKind, OutputNaming, Schema, TokenRename,
    },
};
use tempfile::tempdir;

fn field(target: &str, dims: &[&str], kind: FieldKind) -> FieldDescriptor {
    FieldDescriptor {
        target: target.to_string(),
        dims: dims.iter().map(|d| d.to_string()).collect(),
        element_type: ElementType::F64,
        fill_value: Some(-1.0),
        attributes: FieldAttributes::new("m", target),
        kind,
    }
}

fn copy_kind(source: &str) -> FieldKind {
    FieldKind::Copy {
        source: source.to_string(),
    }
}

fn area_kind(wse: &str, width: &str) -> FieldKind {
    FieldKind::CrossSectionAreaChange {
        wse: wse.to_string(),
        width: width.to_string(),
    }
}

fn container(fields: Vec<FieldDescriptor>) -> ContainerSchema {
    ContainerSchema {
        role: "node".to_string(),
        title_prefix: String::new(),
        groups: Vec::new(),
        dimensions: vec![
            DimensionDescriptor::new("nt", "Time steps"),
            DimensionDescriptor::new("nx", "XS_90m"),
        ],
        fields,
        output: OutputNaming {
            directory: PathBuf::from("swot_node"),
            rename: None,
        },
    }
}

fn masked_with(values: ArrayD<f64>, missing: &[&[usize]]) -> MaskedArray {
    let mut mask = ArrayD::from_elem(values.raw_dim(), false);
    for index in missing {
        mask[*index] = true;
    }
    MaskedArray::new(values, mask).expect("mask shape matches")
}

#[test]
fn test_error_types() {
    let err = RelabelError::schema(
        "input/run_01.nc",
        SchemaError::MissingDimension {
            dim: "Reach".to_string(),
        },
    );
    assert_eq!(
        err.to_string(),
        "input/run_01.nc: source dimension 'Reach' not found"
    );

    let err: RelabelError = SchemaError::UnknownVariant {
        name: "bogus".to_string(),
    }
    .into();
    assert!(err.to_string().contains("unknown schema variant 'bogus'"));

    let cycle = SchemaError::DependencyCycle {
        fields: vec!["a".to_string(), "b".to_string()],
    };
    assert_eq!(cycle.to_string(), "dependency cycle among fields: a, b");
}

#[test]
fn test_median_skips_masked_elements() {
    let odd = MaskedArray::from_values(array![3.0, 1.0, 2.0].into_dyn());
    assert_eq!(odd.median(), Some(2.0));

    let even = MaskedArray::from_values(array![[4.0, 1.0], [3.0, 2.0]].into_dyn());
    assert_eq!(even.median(), Some(2.5));

    let with_gap = masked_with(array![1.0, 100.0, 2.0, 3.0].into_dyn(), &[&[1]]);
    assert_eq!(with_gap.median(), Some(2.0));

    let nan = MaskedArray::from_values(array![f64::NAN, 5.0].into_dyn());
    assert_eq!(nan.count(), 1);
    assert_eq!(nan.median(), Some(5.0));

    assert_eq!(MaskedArray::fully_masked(&[2, 2]).median(), None);
}

#[test]
fn test_fill_and_range_masking() {
    let values = array![-9999.0, 5.0, 250.0, 10.0].into_dyn();
    let masked = MaskedArray::with_fill(values, Some(-9999.0)).mask_outside(Some(0.0), Some(100.0));

    assert_eq!(masked.compressed(), vec![5.0, 10.0]);
    assert!(masked.is_masked(&[0]));
    assert!(masked.is_masked(&[2]));
    assert_eq!(masked.get(&[3]), Some(10.0));
    assert_eq!(masked.get(&[7]), None);
}

#[test]
fn test_calculate_literal_example() {
    let h = MaskedArray::from_values(array![[1.0, 3.0], [5.0, 7.0]].into_dyn());
    let w = MaskedArray::from_values(array![[2.0, 4.0], [6.0, 8.0]].into_dyn());

    let result = calculate(&h, &w).expect("shapes match");
    assert_eq!(
        result.filled(f64::NAN),
        array![[-4.5, -0.5], [-0.5, -4.5]].into_dyn()
    );
    assert_eq!(result.count(), 4);
}

#[test]
fn test_calculate_preserves_shape() {
    let h = MaskedArray::from_values(ArrayD::from_shape_fn(vec![4, 3], |ix| ix[0] as f64));
    let w = MaskedArray::from_values(ArrayD::from_shape_fn(vec![4, 3], |ix| 10.0 + ix[1] as f64));

    let result = calculate(&h, &w).expect("shapes match");
    assert_eq!(result.shape(), &[4, 3]);
}

#[test]
fn test_calculate_propagates_masks() {
    let h = masked_with(array![[1.0, 3.0], [5.0, 7.0]].into_dyn(), &[&[0, 1]]);
    let w = masked_with(array![[2.0, 4.0], [6.0, 8.0]].into_dyn(), &[&[1, 0]]);

    let result = calculate(&h, &w).expect("shapes match");

    assert!(result.is_masked(&[0, 1]));
    assert!(result.is_masked(&[1, 0]));

    // median(h) over {1, 5, 7} is 5; median(w) over {2, 4, 8} is 4.
    assert_eq!(result.get(&[0, 0]), Some((4.0 - 2.0) * ((1.0 - 5.0) / 2.0)));
    assert_eq!(result.get(&[1, 1]), Some((4.0 - 8.0) * ((7.0 - 5.0) / 2.0)));
}

#[test]
fn test_calculate_with_fully_masked_input() {
    let h = MaskedArray::fully_masked(&[2, 3]);
    let w = MaskedArray::from_values(ArrayD::from_elem(vec![2, 3], 1.0));

    let result = calculate(&h, &w).expect("shapes match");
    assert_eq!(result.shape(), &[2, 3]);
    assert!(result.is_fully_masked());

    let narrow = MaskedArray::from_values(ArrayD::from_elem(vec![2, 2], 1.0));
    assert!(calculate(&h, &narrow).is_err());
}

#[test]
fn test_mean_scalar_and_axis() {
    let q = masked_with(
        array![[100.0, 200.0], [300.0, 400.0], [500.0, 600.0]].into_dyn(),
        &[&[2, 1]],
    );

    let total = mean(&q, None);
    assert_eq!(total.ndim(), 0);
    assert_eq!(total.get(&[]), Some(300.0));

    let per_step = mean(&q, Some(1));
    assert_eq!(per_step.shape(), &[3]);
    assert_eq!(per_step.compressed(), vec![150.0, 350.0, 500.0]);

    let lane_missing = masked_with(array![[1.0, 2.0], [3.0, 4.0]].into_dyn(), &[&[1, 0], &[1, 1]]);
    let reduced = mean(&lane_missing, Some(1));
    assert_eq!(reduced.get(&[0]), Some(1.5));
    assert!(reduced.is_masked(&[1]));
}

#[test]
fn test_leading_block() {
    let data = MaskedArray::from_values(ArrayD::from_shape_fn(vec![4, 3], |ix| {
        (ix[0] * 3 + ix[1]) as f64
    }));

    let block = data.leading_block(&[2, 2]).expect("block fits");
    assert_eq!(block.filled(0.0), array![[0.0, 1.0], [3.0, 4.0]].into_dyn());
    assert!(data.leading_block(&[5, 1]).is_err());
    assert!(data.leading_block(&[2]).is_err());
}

#[test]
fn test_squeeze_to_drops_single_length_axes() {
    let reach = masked_with(array![[0.011], [0.012], [0.013]].into_dyn(), &[&[1, 0]]);

    let series = reach.squeeze_to(1).expect("reach axis has length one");
    assert_eq!(series.shape(), &[3]);
    assert_eq!(series.compressed(), vec![0.011, 0.013]);
    assert!(series.is_masked(&[1]));

    let grid = MaskedArray::from_values(ArrayD::from_elem(vec![3, 2], 1.0));
    assert!(grid.squeeze_to(1).is_none());

    let single = MaskedArray::from_values(ArrayD::from_elem(vec![1, 1], 4.0));
    let scalar = single.squeeze_to(0).expect("both axes have length one");
    assert_eq!(scalar.get(&[]), Some(4.0));
}

#[test]
fn test_builtin_variants_validate() {
    for name in VARIANT_NAMES {
        let schema = Schema::builtin(name).expect("built-in variant is valid");
        assert_eq!(&schema.name, name);
        assert!(!schema.containers.is_empty());
    }

    match Schema::builtin("nope") {
        Err(RelabelError::InvalidSchema(SchemaError::UnknownVariant { name })) => {
            assert_eq!(name, "nope")
        }
        other => panic!("expected unknown variant, got {other:?}"),
    }
}

#[test]
fn test_split_variant_layout() {
    let schema = variants::split();
    let roles: Vec<&str> = schema.containers.iter().map(|c| c.role.as_str()).collect();
    assert_eq!(roles, ["reach", "node", "sword"]);

    let node = schema.container("node").expect("node container");
    let order: Vec<&str> = node
        .evaluation_order()
        .expect("acyclic")
        .iter()
        .map(|f| f.target.as_str())
        .collect();
    assert_eq!(order, ["width", "wse", "d_x_area"]);

    let sword = schema.container("sword").expect("sword container");
    assert_eq!(sword.fields[0].fill_value, Some(99_999.0));
}

#[test]
fn test_derived_field_ordered_after_dependencies() {
    let schema = container(vec![
        field("d_x_area", &["nt", "nx"], area_kind("wse", "width")),
        field("width", &["nt", "nx"], copy_kind("XS_Timseries/W")),
        field("wse", &["nt", "nx"], copy_kind("XS_Timseries/H_1km")),
    ]);

    let order: Vec<&str> = schema
        .evaluation_order()
        .expect("acyclic")
        .iter()
        .map(|f| f.target.as_str())
        .collect();
    assert_eq!(order, ["width", "wse", "d_x_area"]);
}

#[test]
fn test_schema_validation_errors() {
    let undeclared_dim = container(vec![field("width", &["nt", "ny"], copy_kind("W"))]);
    assert_eq!(
        undeclared_dim.validate(),
        Err(SchemaError::UndeclaredDimension {
            field: "width".to_string(),
            dim: "ny".to_string(),
        })
    );

    let undeclared_group = container(vec![field("sword/Qhat", &[], copy_kind("Q"))]);
    assert!(matches!(
        undeclared_group.validate(),
        Err(SchemaError::UndeclaredGroup { .. })
    ));

    let duplicate = container(vec![
        field("width", &["nt"], copy_kind("W")),
        field("width", &["nt"], copy_kind("W")),
    ]);
    assert!(matches!(
        duplicate.validate(),
        Err(SchemaError::DuplicateField { .. })
    ));

    let unknown = container(vec![
        field("width", &["nt", "nx"], copy_kind("W")),
        field("d_x_area", &["nt", "nx"], area_kind("wse", "width")),
    ]);
    assert_eq!(
        unknown.validate(),
        Err(SchemaError::UnknownDependency {
            field: "d_x_area".to_string(),
            dependency: "wse".to_string(),
        })
    );

    let cycle = container(vec![
        field("a", &["nt"], area_kind("b", "b")),
        field("b", &["nt"], area_kind("a", "a")),
    ]);
    match cycle.validate() {
        Err(SchemaError::DependencyCycle { fields }) => assert_eq!(fields, ["a", "b"]),
        other => panic!("expected a cycle, got {other:?}"),
    }

    let bad_axis = container(vec![field(
        "Qhat",
        &["nt"],
        FieldKind::Mean {
            source: "XS_Timseries/Q".to_string(),
            axis: Some(2),
        },
    )]);
    assert!(matches!(
        bad_axis.validate(),
        Err(SchemaError::InvalidAxis { axis: 2, rank: 2, .. })
    ));

    let twice = Schema {
        name: "twice".to_string(),
        containers: vec![container(Vec::new()), container(Vec::new())],
    };
    assert!(matches!(
        twice.validate(),
        Err(SchemaError::DuplicateRole { .. })
    ));
}

#[test]
fn test_schema_from_json() {
    let json = r#"{
        "name": "custom",
        "containers": [{
            "role": "node",
            "dimensions": [
                {"name": "nt", "source": "Time steps", "limit": 4},
                {"name": "nx", "source": "XS_90m"}
            ],
            "fields": [
                {"target": "width", "dims": ["nt", "nx"], "element_type": "f4",
                 "attributes": {"units": "m", "long_name": "node width"},
                 "kind": "copy", "source": "XS_Timseries/W"},
                {"target": "Qhat", "dims": ["nt"],
                 "attributes": {"units": "m^3/s", "long_name": "Qhat"},
                 "kind": "mean", "source": "XS_Timseries/Q", "axis": 1}
            ],
            "output": {"directory": "nodes",
                       "rename": {"prefix": "N", "tokens": [1]}}
        }]
    }"#;

    let schema = Schema::from_json_str(json).expect("valid schema");
    let node = schema.container("node").expect("node container");

    assert_eq!(node.dimensions[0].target_len(10), 4);
    assert_eq!(node.dimensions[1].target_len(10), 10);
    assert_eq!(node.fields[0].element_type, ElementType::F32);
    assert_eq!(node.fields[0].fill_value, None);
    assert_eq!(
        node.fields[1].kind,
        FieldKind::Mean {
            source: "XS_Timseries/Q".to_string(),
            axis: Some(1),
        }
    );
    let rename = node.output.rename.as_ref().expect("rename rule");
    assert_eq!(rename.delimiter, "_");

    let invalid = json.replace(r#"["nt", "nx"]"#, r#"["nt", "nz"]"#);
    assert!(matches!(
        Schema::from_json_str(&invalid),
        Err(RelabelError::InvalidSchema(SchemaError::UndeclaredDimension { .. }))
    ));
    assert!(matches!(
        Schema::from_json_str("{"),
        Err(RelabelError::Json(_))
    ));
}

#[test]
fn test_rename_from_tokens() {
    let rename = TokenRename {
        prefix: "SWOT".to_string(),
        delimiter: "_".to_string(),
        tokens: vec![2, 3],
    };
    assert_eq!(
        rename_from_tokens("sim_run_0042_reach7.nc", &rename).expect("enough tokens"),
        "SWOT_0042_reach7.nc"
    );

    match rename_from_tokens("short_name.nc", &rename) {
        Err(RelabelError::Config(message)) => assert!(message.contains("token 2")),
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn test_naming_resolver() {
    let resolver = NamingResolver::new("/data/out", &variants::sliced());
    let input = Path::new("/data/input/sim_run_0042_reach7.nc");

    assert_eq!(
        resolver.resolve(input, "swot").expect("swot role"),
        PathBuf::from("/data/out/output/swot/SWOT_0042_reach7.nc")
    );
    assert_eq!(
        resolver.resolve(input, "sword").expect("sword role"),
        PathBuf::from("/data/out/output/sword/SWORD_0042_reach7.nc")
    );
    assert!(resolver.resolve(input, "reach").is_err());

    let split = NamingResolver::new("out", &variants::split());
    assert_eq!(
        split.resolve(input, "node").expect("node role"),
        PathBuf::from("out/swot_node/sim_run_0042_reach7.nc")
    );
}

#[test]
fn test_closure_resolver() {
    let resolver = |input: &Path, role: &str| -> swot_relabel::Result<PathBuf> {
        let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("x");
        Ok(PathBuf::from(format!("{role}-{stem}.nc")))
    };
    assert_eq!(
        resolver
            .resolve(Path::new("in/a.nc"), "node")
            .expect("closure resolves"),
        PathBuf::from("node-a.nc")
    );
}

#[test]
fn test_discover_inputs() {
    let dir = tempdir().expect("Failed to create temp dir");
    for name in ["b_run.nc", "a_run.nc", "notes.txt"] {
        std::fs::write(dir.path().join(name), b"").expect("Failed to write file");
    }
    std::fs::create_dir(dir.path().join("nested.nc")).expect("Failed to create dir");

    let found = discover_inputs(dir.path(), "nc").expect("discovery succeeds");
    let names: Vec<&str> = found
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect();
    assert_eq!(names, ["a_run.nc", "b_run.nc"]);

    let empty = discover_inputs(&dir.path().join("missing"), "nc").expect("discovery succeeds");
    assert!(empty.is_empty());
}

#[test]
fn test_parallel_config() {
    let default_config = ParallelConfig::default();
    assert!(default_config.is_sequential());

    let config_4 = ParallelConfig::with_threads(4);
    assert_eq!(config_4.num_threads, Some(4));
    assert!(!config_4.is_sequential());

    let all_cores = ParallelConfig::all_cores();
    assert!(all_cores.num_threads.is_some_and(|n| n > 0));

    let pool = config_4.build_pool().expect("Failed to build pool");
    assert_eq!(pool.current_num_threads(), 4);
}
