use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn cargo_bin() -> PathBuf {
    if let Ok(path) = env::var("CARGO_BIN_EXE_ndc") {
        return PathBuf::from(path);
    }

    let target_dir = env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| repo_root().join("target"));
    let executable_name = format!("ndc{}", std::env::consts::EXE_SUFFIX);
    let fallback = target_dir.join("debug").join(executable_name);

    if fallback.exists() {
        return fallback;
    }

    panic!(
        "CARGO_BIN_EXE_ndc is not set and fallback binary was not found at {}",
        fallback.display()
    );
}

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn run_ndc(args: &[&str]) -> Output {
    Command::new(cargo_bin())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run ndc")
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

const MESSAGE: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
    xmlns="http://www.iata.org/IATA/2015/EASD/00/IATA_OffersAndOrdersMessage"
    xmlns:cns="http://www.iata.org/IATA/2015/EASD/00/IATA_OffersAndOrdersCommonTypes"
    targetNamespace="http://www.iata.org/IATA/2015/EASD/00/IATA_OffersAndOrdersMessage"
    elementFormDefault="qualified" version="24.1">
  <xs:import namespace="http://www.iata.org/IATA/2015/EASD/00/IATA_OffersAndOrdersCommonTypes"
      schemaLocation="IATA_OffersAndOrdersCommonTypes.xsd"/>
  <xs:element name="IATA_PingRQ" type="PingType"/>
  <xs:complexType name="PingType">
    <xs:sequence><xs:element name="Echo" type="cns:EchoType"/></xs:sequence>
  </xs:complexType>
</xs:schema>
"#;

const COMMON: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
    targetNamespace="http://www.iata.org/IATA/2015/EASD/00/IATA_OffersAndOrdersCommonTypes">
  <xs:complexType name="EchoType">
    <xs:simpleContent><xs:extension base="xs:string"/></xs:simpleContent>
  </xs:complexType>
  <xs:complexType name="UnusedType"/>
</xs:schema>
"#;

/// `<root>/24.1_ndc` with one message and its common types
fn raw_schemas() -> TempDir {
    let temp = TempDir::new().expect("temp dir");
    let version = temp.path().join("24.1_ndc");
    fs::create_dir_all(&version).unwrap();
    fs::write(version.join("IATA_PingRQ.xsd"), MESSAGE).unwrap();
    fs::write(version.join("IATA_OffersAndOrdersCommonTypes.xsd"), COMMON).unwrap();
    temp
}

#[test]
fn flatten_command_writes_bundle() {
    let schemas = raw_schemas();
    let out = TempDir::new().unwrap();

    let output = run_ndc(&[
        "flatten",
        "--schemas",
        &path_arg(schemas.path()),
        "--version",
        "24.1",
        "--out",
        &path_arg(out.path()),
        "--message",
        "IATA_PingRQ",
    ]);

    assert!(
        output.status.success(),
        "expected flatten to succeed; stdout: {}; stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let bundle = out.path().join("24.1").join("PingRQ");
    assert!(bundle.join("IATA_PingRQ.xsd").is_file());
    let side = fs::read_to_string(bundle.join("IATA_PingRQ_CommonTypes.xsd")).unwrap();
    assert!(side.contains("EchoType"));
    assert!(!side.contains("UnusedType"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("OK   24.1 IATA_PingRQ"), "stdout: {}", stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Flatten summary: succeeded=1, failed=0"), "stderr: {}", stderr);
}

#[test]
fn flatten_unknown_message_exits_with_failure() {
    let schemas = raw_schemas();
    let out = TempDir::new().unwrap();

    let output = run_ndc(&[
        "flatten",
        "--schemas",
        &path_arg(schemas.path()),
        "--version",
        "24.1",
        "--out",
        &path_arg(out.path()),
        "--message",
        "IATA_NotThereRQ",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("FAIL 24.1 IATA_NotThereRQ"));
}

#[test]
fn batch_command_uses_message_list() {
    let schemas = raw_schemas();
    let out = TempDir::new().unwrap();
    let list = schemas.path().join("messages.json");
    fs::write(
        &list,
        r#"{"versions": {"24.1": ["IATA_PingRQ.xsd", "IATA_AbsentRQ"], "25.4": ["IATA_PingRQ"]}}"#,
    )
    .unwrap();

    let output = run_ndc(&[
        "batch",
        "--schemas",
        &path_arg(schemas.path()),
        "--message-list",
        &path_arg(&list),
        "--out",
        &path_arg(out.path()),
    ]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(out.path().join("24.1/PingRQ/IATA_PingRQ.xsd").is_file());
    assert!(!out.path().join("25.4").exists());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Batch summary: succeeded=1, failed=0"));
}

#[test]
fn config_file_supplies_directories() {
    let schemas = raw_schemas();
    let out = TempDir::new().unwrap();
    let config = schemas.path().join("ndc.yaml");
    fs::write(
        &config,
        format!(
            "schemas_dir: {}\noutput_dir: {}\nconcurrency: 2\n",
            path_arg(schemas.path()),
            path_arg(out.path())
        ),
    )
    .unwrap();

    let output = run_ndc(&["--config", &path_arg(&config), "flatten", "--version", "24.1"]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(out.path().join("24.1/PingRQ/IATA_PingRQ.xsd").is_file());
}

#[test]
fn invalid_config_is_fatal() {
    let schemas = raw_schemas();
    let config = schemas.path().join("bad.yaml");
    fs::write(&config, "colour: neon\n").unwrap();

    let output = run_ndc(&[
        "--config",
        &path_arg(&config),
        "flatten",
        "--schemas",
        &path_arg(schemas.path()),
        "--version",
        "24.1",
        "--out",
        &path_arg(schemas.path()),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("ERROR:"),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn missing_output_directory_is_reported() {
    let schemas = raw_schemas();
    let output = run_ndc(&["flatten", "--schemas", &path_arg(schemas.path()), "--version", "24.1"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--out is required"));
}
