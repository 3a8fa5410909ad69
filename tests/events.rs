use c3d_rs::error::C3dError;
use c3d_rs::writer::rewrite::{copy_frames, scratch_path};
use c3d_rs::{C3dEvent, C3dReader, C3dWriter, EventContext, ParameterValue, WriterConfig};
use tempfile::tempdir;

fn config(events_enabled: bool) -> WriterConfig {
    WriterConfig {
        point_labels: vec!["LHEE".into(), "RHEE".into()],
        point_rate: 30.0,
        analog_labels: vec!["FZ".into()],
        events_enabled,
        ..Default::default()
    }
}

fn write_frames(writer: &mut C3dWriter, count: usize) -> Result<(), C3dError> {
    for i in 0..count {
        let f = i as f32;
        writer.write_frame(&[[f, 0.0, 1.0], [-f, 2.0, 3.0]])?;
        writer.write_analog_data(&[f * 10.0])?;
    }
    Ok(())
}

fn read_all(path: &std::path::Path) -> Result<Vec<c3d_rs::parsing::decoder::Frame>, C3dError> {
    let mut reader = C3dReader::open(path)?;
    let mut frames = Vec::new();
    while let Some(frame) = reader.read_frame()? {
        frames.push(frame);
    }
    Ok(frames)
}

#[test]
fn adding_events_requires_enabling_them() -> Result<(), C3dError> {
    let mut writer = C3dWriter::new();
    assert!(!writer.events_enabled());
    assert!(matches!(writer.add_event(C3dEvent::new("Foot Strike", "Left")), Err(C3dError::EventsDisabled)));

    writer.set_events_enabled(true)?;
    writer.add_event(C3dEvent::new("Foot Strike", "Left"))?;
    assert_eq!(writer.events().len(), 1);
    Ok(())
}

#[test]
fn events_cannot_be_toggled_while_open() -> Result<(), C3dError> {
    let dir = tempdir()?;
    let mut writer = C3dWriter::new();
    writer.open(dir.path().join("toggle.c3d"))?;
    assert!(matches!(writer.set_events_enabled(true), Err(C3dError::Lifecycle(_))));
    assert!(matches!(writer.stage_event_parameters(), Err(C3dError::Lifecycle(_))));
    Ok(())
}

#[test]
fn rewrite_places_event_groups_and_removes_scratch() -> Result<(), C3dError> {
    let dir = tempdir()?;
    let path = dir.path().join("walk.c3d");
    let scratch = scratch_path(&path);

    let mut writer = C3dWriter::with_config(&config(true))?;
    writer.open(&path)?;
    assert!(scratch.exists());
    write_frames(&mut writer, 5)?;
    writer.add_event(C3dEvent::new("Foot Strike", "Left"))?;
    writer.add_event(C3dEvent::new("Foot Off", "Right").at_frame(90).with_description("toe off"))?;
    writer.add_event(C3dEvent::new("Foot Strike", "Left").at_frame(1830).with_subject("Ann"))?;
    assert_eq!(writer.events()[0].frame, Some(5));
    assert!(writer.close()?);

    assert!(!scratch.exists());
    assert!(writer.events().is_empty());
    assert!(writer.events_enabled());

    let reader = C3dReader::open(&path)?;
    assert_eq!(reader.frames_count(), 5);
    assert_eq!(reader.parameter("EVENT:USED"), Some(&ParameterValue::Int16(3)));
    assert_eq!(
        reader.parameter("EVENT:CONTEXTS"),
        Some(&ParameterValue::from(vec!["Left", "Right", "Left"]))
    );
    assert_eq!(
        reader.parameter("EVENT:LABELS"),
        Some(&ParameterValue::from(vec!["Foot Strike", "Foot Off", "Foot Strike"]))
    );
    assert_eq!(
        reader.parameter("EVENT:DESCRIPTIONS"),
        Some(&ParameterValue::from(vec!["", "toe off", ""]))
    );
    assert_eq!(
        reader.parameter("EVENT:TIMES"),
        Some(&ParameterValue::Float2D(vec![vec![0.0, 0.0, 1.0], vec![5.0 / 30.0, 3.0, 1.0]]))
    );
    assert_eq!(reader.parameter("EVENT_CONTEXT:USED"), Some(&ParameterValue::Int16(2)));
    assert_eq!(
        reader.parameter("EVENT_CONTEXT:LABELS"),
        Some(&ParameterValue::from(vec!["Left", "Right"]))
    );
    Ok(())
}

#[test]
fn rewritten_frames_match_a_plain_session() -> Result<(), C3dError> {
    let dir = tempdir()?;
    let plain = dir.path().join("plain.c3d");
    let staged = dir.path().join("staged.c3d");

    let mut writer = C3dWriter::with_config(&config(false))?;
    writer.open(&plain)?;
    write_frames(&mut writer, 12)?;
    writer.close()?;

    let mut writer = C3dWriter::with_config(&config(true))?;
    writer.open(&staged)?;
    write_frames(&mut writer, 12)?;
    writer.add_event(C3dEvent::new("Start", "General").at_frame(1))?;
    writer.close()?;

    let plain_frames = read_all(&plain)?;
    assert_eq!(plain_frames.len(), 12);
    assert_eq!(read_all(&staged)?, plain_frames);

    let plain_reader = C3dReader::open(&plain)?;
    assert!(plain_reader.parameters().group("EVENT").is_none());
    Ok(())
}

#[test]
fn declared_contexts_lead_the_context_table() -> Result<(), C3dError> {
    let dir = tempdir()?;
    let path = dir.path().join("contexts.c3d");

    let mut cfg = config(true);
    cfg.event_contexts = vec![EventContext {
        label: "General".into(),
        description: "Whole body".into(),
        icon_id: 2,
        colour: 7,
    }];
    let mut writer = C3dWriter::with_config(&cfg)?;
    writer.add_event(C3dEvent::new("Foot Strike", "Right").at_frame(0))?;
    writer.open(&path)?;
    writer.close()?;

    let reader = C3dReader::open(&path)?;
    assert_eq!(reader.parameter("EVENT_CONTEXT:USED"), Some(&ParameterValue::Int16(2)));
    assert_eq!(
        reader.parameter("EVENT_CONTEXT:LABELS"),
        Some(&ParameterValue::from(vec!["General", "Right"]))
    );
    assert_eq!(
        reader.parameter("EVENT_CONTEXT:DESCRIPTIONS"),
        Some(&ParameterValue::from(vec!["Whole body", ""]))
    );
    assert_eq!(reader.parameter("EVENT_CONTEXT:COLOURS"), Some(&ParameterValue::Int16Array(vec![7, 0])));
    Ok(())
}

#[test]
fn second_session_restages_events() -> Result<(), C3dError> {
    let dir = tempdir()?;
    let first = dir.path().join("first.c3d");
    let second = dir.path().join("second.c3d");

    let mut writer = C3dWriter::with_config(&config(true))?;
    writer.open(&first)?;
    writer.add_event(C3dEvent::new("A", "Left").at_frame(0))?;
    writer.add_event(C3dEvent::new("B", "Left").at_frame(0))?;
    writer.close()?;

    writer.open(&second)?;
    writer.add_event(C3dEvent::new("C", "Left").at_frame(0))?;
    writer.close()?;

    assert_eq!(C3dReader::open(&first)?.parameter("EVENT:USED"), Some(&ParameterValue::Int16(2)));
    assert_eq!(C3dReader::open(&second)?.parameter("EVENT:USED"), Some(&ParameterValue::Int16(1)));
    Ok(())
}

#[test]
fn copy_frames_reproduces_a_fixture() -> Result<(), C3dError> {
    let dir = tempdir()?;
    let fixture = dir.path().join("fixture.c3d");
    let target = dir.path().join("target.c3d");

    let mut writer = C3dWriter::with_config(&WriterConfig {
        scale_factor: -1.0,
        ..config(false)
    })?;
    writer.open(&fixture)?;
    write_frames(&mut writer, 7)?;
    writer.close()?;

    let mut reader = C3dReader::open(&fixture)?;
    let mut copy = C3dWriter::from_reader(&reader);
    copy.open(&target)?;
    assert_eq!(copy_frames(&mut reader, &mut copy)?, 7);
    copy.close()?;
    reader.close();

    assert_eq!(read_all(&target)?, read_all(&fixture)?);
    Ok(())
}

#[test]
fn scratch_file_is_hidden_next_to_target() {
    let path = std::path::Path::new("/data/session/trial01.c3d");
    assert_eq!(scratch_path(path), std::path::Path::new("/data/session/.trial01.c3d.scratch"));
}

#[test]
fn events_do_not_leak_into_a_later_plain_session() -> Result<(), C3dError> {
    let dir = tempdir()?;
    let first = dir.path().join("with_events.c3d");
    let second = dir.path().join("plain.c3d");

    let mut writer = C3dWriter::with_config(&config(true))?;
    writer.open(&first)?;
    writer.add_event(C3dEvent::new("Old", "Left").at_frame(0))?;
    writer.close()?;
    assert!(writer.parameter("EVENT:LABELS").is_none());
    assert!(writer.parameters().group("EVENT_CONTEXT").is_none());

    writer.set_events_enabled(false)?;
    writer.open(&second)?;
    write_frames(&mut writer, 2)?;
    writer.close()?;

    let reader = C3dReader::open(&second)?;
    assert!(reader.parameter("EVENT:LABELS").is_none());
    assert!(reader.parameters().group("EVENT").is_none());
    assert!(reader.parameters().group("EVENT_CONTEXT").is_none());
    assert_eq!(reader.frames_count(), 2);
    assert_eq!(
        C3dReader::open(&first)?.parameter("EVENT:LABELS"),
        Some(&ParameterValue::from(vec!["Old"]))
    );
    Ok(())
}
