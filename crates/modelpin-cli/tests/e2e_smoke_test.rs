use std::{fs, path::Path};

use tempfile::tempdir;

use modelpin::{ErrorKind, ModelpinError};
use modelpin_cli::{Args, run};

const CLASSIFIER: &str = r#"
[[node]]
name = "images"
type = "Data"
outputs = 1
shape = [1, 224, 224, 3]

[[node]]
name = "conv"
type = "Conv2D"
inputs = 1
outputs = 1

[[node]]
name = "logits"
type = "MatMul"
inputs = 1
outputs = 1

[[node]]
name = "probs"
type = "Softmax"
inputs = 1
outputs = 1

[[node]]
name = "output"
type = "NetOutput"
inputs = 2

[[edge]]
src = "images"
dst = "conv"

[[edge]]
src = "conv"
dst = "logits"

[[edge]]
src = "logits"
dst = "probs"

[[edge]]
src = "logits"
dst = "output"
dst_slot = 0

[[edge]]
src = "probs"
dst = "output"
dst_slot = 1
"#;

fn args(input: &Path, output: &Path, defines: &[&str]) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: Some(output.to_string_lossy().to_string()),
        config: None,
        framework: Some("tensorflow".to_string()),
        defines: defines.iter().map(|d| d.to_string()).collect(),
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_default_outputs() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("classifier.toml");
    let output = temp_dir.path().join("report.toml");
    fs::write(&input, CLASSIFIER).expect("Failed to write graph");

    run(&args(&input, &output, &["output=classifier"])).expect("Run failed");

    let report = fs::read_to_string(&output).expect("Failed to read report");
    assert!(report.contains("graph = \"classifier\""), "Report: {report}");
    assert!(report.contains("\"logits:0\""), "Report: {report}");
    assert!(report.contains("\"probs:0\""), "Report: {report}");
}

#[test]
fn e2e_smoke_test_user_outputs_with_config() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("classifier.toml");
    let output = temp_dir.path().join("report.toml");
    let config = temp_dir.path().join("config.toml");
    fs::write(&input, CLASSIFIER).expect("Failed to write graph");
    fs::write(
        &config,
        r#"
framework = "onnx"

[directives]
out_nodes = "logits:0"
"#,
    )
    .expect("Failed to write config");

    let mut args = args(
        &input,
        &output,
        &["out_nodes=probs:0", "output_type=probs:0:FP16"],
    );
    args.framework = None;
    args.config = Some(config.to_string_lossy().to_string());

    run(&args).expect("Run failed");

    let report = fs::read_to_string(&output).expect("Failed to read report");
    assert!(report.contains("framework = \"onnx\""), "Report: {report}");
    assert!(report.contains("\"probs:0\""), "Report: {report}");
    assert!(!report.contains("\"logits:0\""), "Report: {report}");
    assert!(report.contains("0:DT_FLOAT16"), "Report: {report}");
}

#[test]
fn e2e_smoke_test_caffe_top_name_outputs() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("lenet.toml");
    let output = temp_dir.path().join("report.toml");
    fs::write(
        &input,
        r#"
top_names = ["prob"]
default_outputs = [{ node = "softmax" }]

[[node]]
name = "data"
type = "Data"
outputs = 1
shape = [1, 3, 28, 28]

[[node]]
name = "ip1"
type = "InnerProduct"
inputs = 1
outputs = 1
tops = ["ip1_out"]

[[node]]
name = "softmax"
type = "Softmax"
inputs = 1
outputs = 1
tops = ["prob"]

[[edge]]
src = "data"
dst = "ip1"

[[edge]]
src = "ip1"
dst = "softmax"
"#,
    )
    .expect("Failed to write graph");

    let mut caffe = args(&input, &output, &["out_nodes=ip1_out"]);
    caffe.framework = Some("caffe".to_string());
    run(&caffe).expect("Run failed");

    let report = fs::read_to_string(&output).expect("Failed to read report");
    assert!(report.contains("\"ip1:0:ip1_out\""), "Report: {report}");
    assert!(!report.contains("softmax:0"), "Report: {report}");

    let mut unknown = args(&input, &output, &["out_nodes=fc7"]);
    unknown.framework = Some("caffe".to_string());
    let err = run(&unknown).unwrap_err();
    assert!(matches!(err, ModelpinError::Graph(_)));
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
}

#[test]
fn e2e_smoke_test_failures() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("classifier.toml");
    let output = temp_dir.path().join("report.toml");
    fs::write(&input, CLASSIFIER).expect("Failed to write graph");

    let err = run(&args(&input, &output, &["input_shape=images:1.5"])).unwrap_err();
    assert!(matches!(err, ModelpinError::Directive { .. }));
    assert_eq!(err.kind(), Some(ErrorKind::MalformedDirective));

    let err = run(&args(&input, &output, &["out_nodes=missing:0"])).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));

    let err = run(&args(&input, &output, &["bogus=1"])).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::UnsupportedValue));

    let mut bad_framework = args(&input, &output, &[]);
    bad_framework.framework = Some("mxnet".to_string());
    assert!(matches!(run(&bad_framework), Err(ModelpinError::Config(_))));

    assert!(!output.exists(), "No report should be written on failure");
}
