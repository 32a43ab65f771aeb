use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_temp(contents: &str, suffix: &str) -> NamedTempFile {
    let mut tmp = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp file");
    tmp.write_all(contents.as_bytes()).expect("write temp file");
    tmp
}

#[test]
fn summary_lists_the_garden() {
    let mut cmd = Command::cargo_bin("garden-scene").expect("binary exists");
    cmd.arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("placements (4 lamps)"))
        .stdout(contains(" - Grass (plane, grass)"))
        .stdout(contains(" - Lamp 1 post (cylinder, lamp_base)"))
        .stdout(contains(" - Tree leaves (sphere, leaves)"))
        .stdout(contains(
            "Camera pos=(0.00, 10.00, 50.00) yaw=-90.00 pitch=0.00 zoom=45.00",
        ))
        .stdout(contains(
            "Sun pos=(10.50, 20.00, 20.00) color=(1.00, 1.00, 1.00)",
        ))
        .stdout(contains(
            "Lamp 4 pos=(47.50, 6.00, 20.00) color=(0.00, 0.00, 0.00)",
        ));
}

#[test]
fn summary_uses_scene_and_config_files() {
    let scene = write_temp(
        r#"<scene>
  <sun><position>0 40 0</position></sun>
  <lamp><position>3 5 3</position></lamp>
  <placement>
    <name>Patio</name>
    <mesh>box</mesh>
    <material>sidewalk</material>
    <scale>10 0.2 10</scale>
  </placement>
</scene>
"#,
        ".xml",
    );
    let config = write_temp(
        r#"
[camera]
position = [1.0, 2.0, 3.0]
zoom = 30.0
"#,
        ".toml",
    );

    let mut cmd = Command::cargo_bin("garden-scene").expect("binary exists");
    cmd.arg("--scene")
        .arg(scene.path())
        .arg("--config")
        .arg(config.path())
        .arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Loaded scene with 1 placements (1 lamps)"))
        .stdout(contains(" - Patio (box, sidewalk)"))
        .stdout(contains("Camera pos=(1.00, 2.00, 3.00) yaw=-90.00 pitch=0.00 zoom=30.00"))
        .stdout(contains("Sun pos=(0.00, 40.00, 0.00)"));
}

#[test]
fn invalid_scene_is_reported() {
    let scene = write_temp("<scene><placement><mesh>box</mesh></placement></scene>", ".xml");
    let mut cmd = Command::cargo_bin("garden-scene").expect("binary exists");
    cmd.arg("--scene").arg(scene.path()).arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("failed to parse scene"))
        .stderr(contains("<name> tag is missing"));
}

#[test]
fn too_many_lamps_are_reported() {
    let lamps = "<lamp><position>0 6 0</position></lamp>".repeat(5);
    let scene = write_temp(&format!("<scene>{lamps}</scene>"), ".xml");
    let mut cmd = Command::cargo_bin("garden-scene").expect("binary exists");
    cmd.arg("--scene").arg(scene.path()).arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("scene has 5 lamps, at most 4 are supported"));
}

#[test]
fn bad_binding_in_config_is_reported() {
    let config = write_temp("[bindings]\nforward = \"Hyperspace\"\n", ".toml");
    let mut cmd = Command::cargo_bin("garden-scene").expect("binary exists");
    cmd.arg("--config").arg(config.path()).arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("unknown key `Hyperspace` bound to `forward`"));
}

#[test]
fn unknown_argument_prints_usage() {
    let mut cmd = Command::cargo_bin("garden-scene").expect("binary exists");
    cmd.arg("--fly");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --fly"))
        .stderr(contains("Usage: garden-scene"));
}
