use std::{env, fs};

use shupito_tools::{
    config::DescriptorFile,
    formats::c_source,
    protocol::{
        device::{by_kind, BuildInfo, DeviceKind},
        render,
    },
    Descriptor, LeafFormat,
};

const SHUPITO2: &str = r#"
version = 1
device_id = "093d7f32-cdc6-4928-955d-513d17a85358"
format = "flags_payload"

root = { and = [
  { or = [
    { leaf = { id = "46dbc865-b4d0-466b-9b70-2f3f5b264e65", first_pipe = 1, pipe_count = 8, payload = "01 0024f400 0100 0010" } },
    { leaf = { id = "71efb903-3030-4fd3-8896-1946aba37efc", first_pipe = 1, pipe_count = 8, payload = "01 0024f400 0100 0010" } },
    { leaf = { id = "ee047e35-dec8-48ab-b194-e3762c8f6b66", first_pipe = 1, pipe_count = 4, payload = "01 0048e801" } },
    { leaf = { id = "76e37480-3f61-4e7a-9b1b-37af6bd418fa", first_pipe = 1, pipe_count = 5, payload = "01 0024f400 0100 0010" } },
    { leaf = { id = "633125ab-32e0-49ec-b240-7d845bb70b2d", first_pipe = 1, pipe_count = 3, payload = "01 0024f400 0100 0010" } },
  ] },
  { leaf = { id = "356e9bf7-8718-4965-94a4-0be370c8797c", first_pipe = 9, pipe_count = 1, flags = 3, payload = "01 80841e00" } },
  { leaf = { id = "1d4738a0-fc34-4f71-aa73-57881b278cb1", first_pipe = 10, pipe_count = 1, payload = "01 01b40200" } },
] }
"#;

#[test]
fn toml_file_matches_preset() -> anyhow::Result<()> {
    let path = env::temp_dir().join(format!("shupito2-{}.toml", std::process::id()));
    fs::write(&path, SHUPITO2)?;
    let loaded = DescriptorFile::load(&path);
    fs::remove_file(&path)?;

    let descriptor = loaded?.to_descriptor()?;
    let preset = by_kind(DeviceKind::Shupito2, &BuildInfo::default());
    assert_eq!(descriptor, preset);
    assert_eq!(descriptor.to_framed_bytes()?, preset.to_framed_bytes()?);
    Ok(())
}

#[test]
fn json_export_reloads() -> anyhow::Result<()> {
    let build = BuildInfo {
        timestamp: 1_700_000_000,
        utc_offset_minutes: 60,
        revision: vec![0x12, 0x34, 0x56].into(),
    };
    let preset = by_kind(DeviceKind::Shupito23, &build);

    let path = env::temp_dir().join(format!("shupito23-{}.json", std::process::id()));
    fs::write(&path, DescriptorFile::from(&preset).to_json()?)?;
    let loaded = DescriptorFile::load(&path);
    fs::remove_file(&path)?;

    assert_eq!(loaded?.to_descriptor()?, preset);
    Ok(())
}

#[test]
fn rendered_table_decodes() -> anyhow::Result<()> {
    for kind in [DeviceKind::Shupito0, DeviceKind::Shupito1, DeviceKind::Shupito2] {
        let preset = by_kind(kind, &BuildInfo::default());
        let source = render::render_array("yb_desc", preset.to_framed_bytes()?);

        let table = c_source::parse(&source)?;
        let decoded = Descriptor::from_framed_bytes(table, preset.format)?;
        assert_eq!(decoded, preset);
    }
    Ok(())
}

#[test]
fn wrong_format_is_detected() -> anyhow::Result<()> {
    // The shupito1 table has no payload length bytes
    let preset = by_kind(DeviceKind::Shupito1, &BuildInfo::default());
    let framed = preset.to_framed_bytes()?;
    assert!(Descriptor::from_framed_bytes(framed, LeafFormat::FlagsPayload).is_err());
    Ok(())
}

#[test]
fn missing_file() {
    let err = DescriptorFile::load("/nonexistent/board.toml").unwrap_err();
    assert!(err.to_string().starts_with("couldn't read /nonexistent/board.toml"));
}
