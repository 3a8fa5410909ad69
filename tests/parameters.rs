use c3d_rs::error::C3dError;
use c3d_rs::{C3dReader, C3dWriter, ParameterValue};
use tempfile::tempdir;

#[test]
fn defaults_are_present() {
    let writer = C3dWriter::new();
    assert_eq!(writer.parameter("POINT:DATA_START"), Some(&ParameterValue::Int16(2)));
    assert_eq!(writer.parameter("POINT:USED"), Some(&ParameterValue::Int16(0)));
    assert_eq!(writer.parameter("POINT:FRAMES"), Some(&ParameterValue::Int16(0)));
    assert_eq!(writer.parameter("POINT:SCALE"), Some(&ParameterValue::Float(1.0)));
    assert_eq!(writer.parameter("POINT:RATE"), Some(&ParameterValue::Float(30.0)));
    assert_eq!(writer.parameter("ANALOG:RATE"), Some(&ParameterValue::Float(0.0)));
    assert_eq!(writer.parameter("ANALOG:GEN_SCALE"), Some(&ParameterValue::Float(1.0)));
    assert_eq!(writer.parameter("ANALOG:SCALE"), Some(&ParameterValue::FloatArray(Vec::new())));
    assert_eq!(writer.parameter("ANALOG:OFFSET"), Some(&ParameterValue::Int16Array(Vec::new())));
    assert_eq!(writer.header().first_frame, 1);
    assert_eq!(writer.header().last_frame, 0);
}

#[test]
fn every_shape_reads_back_from_the_file() -> Result<(), C3dError> {
    let dir = tempdir()?;
    let path = dir.path().join("shapes.c3d");

    let values = vec![
        ("INFO:SHORT", ParameterValue::Int16(-7)),
        ("INFO:SHORTS", ParameterValue::Int16Array(vec![1, 2, 3])),
        ("INFO:REAL", ParameterValue::Float(2.5)),
        ("INFO:REALS", ParameterValue::FloatArray(vec![0.25, -1.0])),
        ("INFO:TABLE", ParameterValue::Float2D(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])),
        ("INFO:NAME", ParameterValue::from("Subject 01")),
        ("INFO:NAMES", ParameterValue::from(vec!["LASI", "RASI", "LPSI"])),
        ("INFO:FLAG", ParameterValue::Byte(9)),
        ("INFO:FLAGS", ParameterValue::ByteArray(vec![0, 1, 255])),
    ];

    let mut writer = C3dWriter::new();
    for (path, value) in &values {
        writer.set_parameter(path, value.clone())?;
    }
    writer.set_group_description("INFO", "Session metadata")?;
    writer.open(&path)?;
    writer.close()?;

    let reader = C3dReader::open(&path)?;
    for (path, value) in &values {
        assert_eq!(reader.parameter(path), Some(value), "{path}");
    }
    assert_eq!(reader.parameters().group("INFO").map(|g| g.description.as_str()), Some("Session metadata"));
    let groups: Vec<&str> = reader.parameters().groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(groups, ["POINT", "ANALOG", "INFO"]);
    Ok(())
}

#[test]
fn invalid_paths_are_rejected() {
    let mut writer = C3dWriter::new();
    for path in ["POINT", "POINT:", ":RATE", "A:B:C"] {
        assert!(matches!(writer.set_parameter(path, 1i16), Err(C3dError::InvalidPath(_))), "{path}");
    }
    assert!(writer.parameter("POINT").is_none());
}

#[test]
fn point_labels_update_point_count() -> Result<(), C3dError> {
    let mut writer = C3dWriter::new();
    writer.set_parameter("POINT:LABELS", vec!["A", "B", "C"])?;
    assert_eq!(writer.header().point_count, 3);
    assert_eq!(writer.parameter("POINT:USED"), Some(&ParameterValue::Int16(3)));
    assert_eq!(writer.point_labels(), ["A", "B", "C"]);

    assert!(matches!(
        writer.set_parameter("POINT:LABELS", "A"),
        Err(C3dError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        writer.set_parameter("POINT:RATE", 100i16),
        Err(C3dError::ShapeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn scale_and_rates_are_mirrored_into_the_header() -> Result<(), C3dError> {
    let mut writer = C3dWriter::new();
    writer.set_parameter("POINT:SCALE", -1.0f32)?;
    writer.set_parameter("POINT:RATE", 250.0f32)?;
    writer.set_parameter("ANALOG:USED", 4i16)?;
    assert_eq!(writer.header().scale_factor, -1.0);
    assert_eq!(writer.header().frame_rate, 250.0);
    assert_eq!(writer.header().analog_channels, 4);
    assert_eq!(writer.header().analog_samples_per_frame, 1);
    Ok(())
}

#[test]
fn open_file_only_accepts_same_shape_updates() -> Result<(), C3dError> {
    let dir = tempdir()?;
    let mut writer = C3dWriter::new();
    writer.set_parameter("POINT:LABELS", vec!["A", "B"])?;
    writer.set_parameter("SUBJECTS:NAMES", vec!["Jane"])?;
    writer.open(dir.path().join("open.c3d"))?;

    assert!(matches!(writer.set_parameter("INFO:NEW", 1i16), Err(C3dError::Lifecycle(_))));
    assert!(matches!(writer.set_parameter("POINT:NEW", 1i16), Err(C3dError::Lifecycle(_))));
    assert!(matches!(writer.set_parameter("POINT:RATE", 60.0f32), Err(C3dError::Lifecycle(_))));
    assert!(matches!(writer.set_parameter("POINT:SCALE", 2.0f32), Err(C3dError::Lifecycle(_))));
    assert!(matches!(writer.set_parameter("ANALOG:USED", 2i16), Err(C3dError::Lifecycle(_))));
    assert!(matches!(writer.set_group_description("POINT", "x"), Err(C3dError::Lifecycle(_))));
    assert!(matches!(
        writer.set_parameter("SUBJECTS:NAMES", vec!["Jonathan"]),
        Err(C3dError::ShapeMismatch { .. })
    ));
    writer.set_parameter("SUBJECTS:NAMES", vec!["Joan"])?;
    writer.set_parameter("POINT:LABELS", vec!["C", "D"])?;
    assert_eq!(writer.header().point_count, 2);

    writer.close()?;
    writer.set_parameter("INFO:NEW", 1i16)?;
    Ok(())
}

#[test]
fn unknown_group_description_is_an_invalid_path() {
    let mut writer = C3dWriter::new();
    assert!(matches!(writer.set_group_description("NOPE", "x"), Err(C3dError::InvalidPath(_))));
}

#[test]
fn analog_channels_need_a_sample_per_frame() -> Result<(), C3dError> {
    let mut writer = C3dWriter::new();
    writer.set_analog_samples_per_frame(0)?;
    assert!(matches!(writer.set_analog_samples_per_frame(-1), Err(C3dError::BlockSerializationError(_))));

    writer.set_parameter("ANALOG:USED", 2i16)?;
    assert!(matches!(writer.set_analog_samples_per_frame(0), Err(C3dError::BlockSerializationError(_))));
    assert_eq!(writer.header().analog_samples_per_frame, 1);
    assert_eq!(writer.header().analog_words_per_frame(), 2);

    writer.set_analog_samples_per_frame(4)?;
    assert_eq!(writer.header().analog_words_per_frame(), 8);
    Ok(())
}
