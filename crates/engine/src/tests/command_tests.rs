use super::helpers::*;
use crate::*;
use anyhow::Result;
use cds::Persistence;
use config::limits::PACKETS_IN_FILTER_TABLE;
use config::{EngineConfig, FileNameType, FilterType};
use destfile::LocalStorage;
use filter::CcsdsPacket;
use tempfile::tempdir;

fn send(engine: &mut Engine<MockHost>, command: Command) {
    let packet = cmd(engine, &command);
    engine.process_message(&packet);
}

// --------------------- Codec ---------------------

#[test]
fn decode_reads_big_endian_fields() {
    let payload = [0x08, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x07, 0x00, 0x01, 0x00, 0x00];
    let command = Command::decode(5, &payload).unwrap();
    assert_eq!(
        command,
        Command::SetFilterParms {
            message_id: 0x0801,
            filter_index: 2,
            n: 3,
            x: 7,
            o: 1,
        }
    );
    assert_eq!(command.payload(), payload);
}

#[test]
fn decode_rejects_unknown_code_and_bad_length() {
    assert_eq!(Command::decode(18, &[]), Err(CommandError::UnknownCode(18)));
    assert_eq!(
        Command::decode(0, &[0, 0]),
        Err(CommandError::Length {
            code: 0,
            expected: 0,
            actual: 2
        })
    );
    assert_eq!(
        Command::decode(8, &[0; 4]),
        Err(CommandError::Length {
            code: 8,
            expected: 68,
            actual: 4
        })
    );
}

#[test]
fn string_commands_use_fixed_buffers() {
    let path = Command::set_path(3, "/cf/logs");
    let payload = path.payload();
    assert_eq!(payload.len(), 68);
    assert_eq!(&payload[0..2], &[0, 3]);
    assert_eq!(&payload[4..12], b"/cf/logs");
    assert!(payload[12..].iter().all(|&b| b == 0));
    assert_eq!(Command::decode(8, &payload).unwrap(), Command::SetDestPath {
        file_index: 3,
        pathname: payload[4..].to_vec(),
    });

    assert_eq!(Command::set_ext(0, "dat").payload().len(), 12);
}

// --------------------- Housekeeping commands ---------------------

#[test]
fn noop_is_accepted() -> Result<()> {
    let dir = tempdir()?;
    let (filter, dest) = simple_tables();
    let mut engine = engine(dir.path(), filter, dest);

    send(&mut engine, Command::Noop);

    assert_eq!(engine.counters().cmd_accepted, 1);
    assert_eq!(engine.counters().cmd_rejected, 0);
    Ok(())
}

#[test]
fn malformed_commands_are_rejected() -> Result<()> {
    let dir = tempdir()?;
    let (filter, dest) = simple_tables();
    let mut engine = engine(dir.path(), filter, dest);
    let mid = engine.config().cmd_mid as u16;

    engine.process_message(&CcsdsPacket::command(mid, 42, &[]));
    engine.process_message(&CcsdsPacket::command(mid, 0, &[0, 0, 0, 0]));

    assert_eq!(engine.counters().cmd_rejected, 2);
    assert_eq!(engine.counters().cmd_accepted, 0);
    Ok(())
}

#[test]
fn reset_zeroes_counters_without_counting_itself() -> Result<()> {
    let dir = tempdir()?;
    let (filter, dest) = simple_tables();
    let mut engine = engine(dir.path(), filter, dest);
    engine.process_message(&tlm(HK_MID, 0));
    send(&mut engine, Command::Noop);
    send(&mut engine, Command::SetAppState { state: 7 });

    send(&mut engine, Command::ResetCounters);

    assert_eq!(*engine.counters(), Counters::default());
    Ok(())
}

#[test]
fn app_state_toggles_storage() -> Result<()> {
    let dir = tempdir()?;
    let (filter, dest) = simple_tables();
    let mut engine = engine(dir.path(), filter, dest);

    send(&mut engine, Command::SetAppState { state: 0 });
    assert!(!engine.app_enabled());
    engine.process_message(&tlm(HK_MID, 0));
    assert_eq!(engine.counters().disabled_pkt, 1);

    send(&mut engine, Command::SetAppState { state: 2 });
    assert!(!engine.app_enabled());
    assert_eq!(engine.counters().cmd_rejected, 1);

    send(&mut engine, Command::SetAppState { state: 1 });
    assert!(engine.app_enabled());
    assert_eq!(engine.counters().cmd_accepted, 2);
    Ok(())
}

// --------------------- Filter table commands ---------------------

#[test]
fn filter_parms_with_offset_past_group_are_rejected() -> Result<()> {
    let dir = tempdir()?;
    let (filter, dest) = simple_tables();
    let mut engine = engine(dir.path(), filter, dest);
    let before = engine.filter_table().unwrap().entries[0].filters[0];

    send(
        &mut engine,
        Command::SetFilterParms {
            message_id: HK_MID,
            filter_index: 0,
            n: 1,
            x: 4,
            o: 4,
        },
    );

    assert_eq!(engine.counters().cmd_rejected, 1);
    assert_eq!(engine.counters().cmd_accepted, 0);
    assert_eq!(engine.filter_table().unwrap().entries[0].filters[0], before);
    assert!(engine.host().filter_modified.is_empty());
    Ok(())
}

#[test]
fn filter_parms_update_working_table() -> Result<()> {
    let dir = tempdir()?;
    let (filter, dest) = simple_tables();
    let mut engine = engine(dir.path(), filter, dest);

    send(
        &mut engine,
        Command::SetFilterParms {
            message_id: HK_MID,
            filter_index: 1,
            n: 2,
            x: 10,
            o: 3,
        },
    );

    assert_eq!(engine.counters().cmd_accepted, 1);
    let parms = engine.filter_table().unwrap().entries[0].filters[1];
    assert_eq!((parms.n, parms.x, parms.o), (2, 10, 3));
    assert_eq!(engine.host().filter_modified.len(), 1);
    Ok(())
}

#[test]
fn filter_file_and_type_update_working_table() -> Result<()> {
    let dir = tempdir()?;
    let (filter, dest) = simple_tables();
    let mut engine = engine(dir.path(), filter, dest);

    send(
        &mut engine,
        Command::SetFilterFile {
            message_id: HK_MID,
            filter_index: 0,
            file_index: 15,
        },
    );
    send(
        &mut engine,
        Command::SetFilterType {
            message_id: HK_MID,
            filter_index: 0,
            filter_type: 2,
        },
    );

    assert_eq!(engine.counters().cmd_accepted, 2);
    let parms = engine.filter_table().unwrap().entries[0].filters[0];
    assert_eq!(parms.file_table_index, 15);
    assert_eq!(parms.filter_type, FilterType::ByTime);
    Ok(())
}

#[test]
fn filter_commands_check_their_target() -> Result<()> {
    let dir = tempdir()?;
    let (filter, dest) = simple_tables();
    let mut engine = engine(dir.path(), filter, dest);
    let original = engine.filter_table().unwrap().clone();

    let rejected = [
        // unused message id
        Command::SetFilterFile {
            message_id: 0,
            filter_index: 0,
            file_index: 1,
        },
        // filter index past the row
        Command::SetFilterFile {
            message_id: HK_MID,
            filter_index: 4,
            file_index: 1,
        },
        // destination index past the table
        Command::SetFilterFile {
            message_id: HK_MID,
            filter_index: 0,
            file_index: 16,
        },
        Command::SetFilterType {
            message_id: HK_MID,
            filter_index: 0,
            filter_type: 3,
        },
        // message id not in the table
        Command::SetFilterParms {
            message_id: EVS_MID,
            filter_index: 0,
            n: 1,
            x: 2,
            o: 0,
        },
    ];
    for command in rejected {
        send(&mut engine, command);
    }

    assert_eq!(engine.counters().cmd_rejected, 5);
    assert_eq!(engine.filter_table().unwrap(), &original);
    Ok(())
}

#[test]
fn filter_commands_need_a_filter_table() -> Result<()> {
    let dir = tempdir()?;
    let mut host = MockHost::default();
    host.filter_updates.push_back(TableUpdate::NeverLoaded);
    let mut engine = Engine::new(
        EngineConfig::default(),
        host,
        Box::new(LocalStorage::rooted(dir.path())),
        Persistence::disabled(),
    )?;

    send(
        &mut engine,
        Command::SetFilterParms {
            message_id: HK_MID,
            filter_index: 0,
            n: 1,
            x: 2,
            o: 0,
        },
    );
    send(&mut engine, Command::AddMessageId { message_id: HK_MID });

    assert_eq!(engine.counters().cmd_rejected, 2);
    Ok(())
}

#[test]
fn add_message_id_fills_first_free_row() -> Result<()> {
    let dir = tempdir()?;
    let (filter, dest) = simple_tables();
    let mut engine = engine(dir.path(), filter, dest);

    send(&mut engine, Command::AddMessageId { message_id: EVS_MID });

    assert_eq!(engine.counters().cmd_accepted, 1);
    assert_eq!(engine.find_message(u32::from(EVS_MID)), Some(1));
    let row = &engine.filter_table().unwrap().entries[1];
    assert_eq!(row.message_id, u32::from(EVS_MID));
    assert!(row.filters.iter().all(|f| f.is_unused()));
    assert!(engine.host().is_subscribed(u32::from(EVS_MID)));
    assert_eq!(engine.host().filter_modified.len(), 1);

    // a new row has no active filters yet
    engine.process_message(&tlm(EVS_MID, 0));
    assert_eq!(engine.counters().filtered_pkt, 1);
    Ok(())
}

#[test]
fn add_message_id_rejects_duplicates_and_full_table() -> Result<()> {
    let dir = tempdir()?;
    let mut filter = filter_table(&[]);
    for (row, entry) in filter.entries.iter_mut().enumerate() {
        entry.message_id = 0x0900 + row as u32;
    }
    let mut engine = engine(dir.path(), filter, dest_table(&[]));
    assert_eq!(engine.find_message(0x0900 + 255), Some(255));

    send(&mut engine, Command::AddMessageId { message_id: 0x0900 });
    send(&mut engine, Command::AddMessageId { message_id: EVS_MID });
    send(&mut engine, Command::AddMessageId { message_id: 0 });

    assert_eq!(engine.counters().cmd_rejected, 3);
    assert_eq!(
        engine.filter_table().unwrap().message_ids().count(),
        PACKETS_IN_FILTER_TABLE
    );
    Ok(())
}

// --------------------- Destination table commands ---------------------

#[test]
fn dest_state_updates_table_and_status() -> Result<()> {
    let dir = tempdir()?;
    let (filter, dest) = simple_tables();
    let mut engine = engine(dir.path(), filter, dest);

    send(&mut engine, Command::SetDestState { file_index: 0, state: 0 });

    assert_eq!(engine.counters().cmd_accepted, 1);
    assert!(!engine.dest_table().unwrap().files[0].enabled);
    assert!(!engine.file_status(0).unwrap().is_enabled());
    assert_eq!(engine.host().dest_modified.len(), 1);

    engine.process_message(&tlm(HK_MID, 0));
    assert_eq!(engine.counters().filtered_pkt, 1);
    Ok(())
}

#[test]
fn dest_count_updates_table_and_status() -> Result<()> {
    let dir = tempdir()?;
    let (filter, dest) = simple_tables();
    let mut engine = engine(dir.path(), filter, dest);

    send(
        &mut engine,
        Command::SetDestCount {
            file_index: 0,
            sequence_count: 500,
        },
    );
    send(
        &mut engine,
        Command::SetDestCount {
            file_index: 0,
            sequence_count: 100_000_000,
        },
    );

    assert_eq!(engine.counters().cmd_accepted, 1);
    assert_eq!(engine.counters().cmd_rejected, 1);
    assert_eq!(engine.dest_table().unwrap().files[0].sequence_count, 500);
    assert_eq!(engine.file_status(0).unwrap().sequence_count(), 500);

    engine.process_message(&tlm(HK_MID, 0));
    assert_eq!(engine.file_status(0).unwrap().name(), "/ram/hk00000500.dat");
    Ok(())
}

#[test]
fn dest_name_parts_are_validated() -> Result<()> {
    let dir = tempdir()?;
    let (filter, dest) = simple_tables();
    let mut engine = engine(dir.path(), filter, dest);

    send(&mut engine, Command::set_path(0, "/cf/logs"));
    send(&mut engine, Command::set_base(0, ""));
    send(&mut engine, Command::set_ext(0, ".log"));
    assert_eq!(engine.counters().cmd_accepted, 3);

    let d = &engine.dest_table().unwrap().files[0];
    assert_eq!(d.pathname.as_str(), "/cf/logs");
    assert_eq!(d.basename.as_str(), "");
    assert_eq!(d.extension.as_str(), ".log");

    // empty path, illegal character, missing terminator
    send(&mut engine, Command::set_path(0, ""));
    send(&mut engine, Command::set_base(0, "hk data"));
    send(&mut engine, Command::set_ext(0, "12345678"));
    assert_eq!(engine.counters().cmd_rejected, 3);
    assert_eq!(engine.dest_table().unwrap().files[0].pathname.as_str(), "/cf/logs");
    Ok(())
}

#[test]
fn dest_limits_are_validated() -> Result<()> {
    let dir = tempdir()?;
    let (filter, dest) = simple_tables();
    let mut engine = engine(dir.path(), filter, dest);

    send(&mut engine, Command::SetDestSize { file_index: 0, max_size: 1023 });
    send(&mut engine, Command::SetDestAge { file_index: 0, max_age: 59 });
    send(&mut engine, Command::SetDestType { file_index: 0, filename_type: 0 });
    send(&mut engine, Command::SetDestState { file_index: 0, state: 2 });
    send(&mut engine, Command::SetDestSize { file_index: 16, max_size: 4096 });
    assert_eq!(engine.counters().cmd_rejected, 5);

    send(&mut engine, Command::SetDestSize { file_index: 0, max_size: 1024 });
    send(&mut engine, Command::SetDestAge { file_index: 0, max_age: 60 });
    send(&mut engine, Command::SetDestType { file_index: 0, filename_type: 2 });
    assert_eq!(engine.counters().cmd_accepted, 3);

    let d = &engine.dest_table().unwrap().files[0];
    assert_eq!(d.max_size, 1024);
    assert_eq!(d.max_age, 60);
    assert_eq!(d.filename_type, FileNameType::ByTime);
    Ok(())
}

#[test]
fn dest_commands_need_a_dest_table() -> Result<()> {
    let dir = tempdir()?;
    let mut host = MockHost::default();
    host.dest_updates.push_back(TableUpdate::NeverLoaded);
    let mut engine = Engine::new(
        EngineConfig::default(),
        host,
        Box::new(LocalStorage::rooted(dir.path())),
        Persistence::disabled(),
    )?;

    send(&mut engine, Command::SetDestAge { file_index: 0, max_age: 600 });
    send(&mut engine, Command::set_path(0, "/ram"));

    assert_eq!(engine.counters().cmd_rejected, 2);
    Ok(())
}

// --------------------- File control ---------------------

#[test]
fn close_file_closes_only_that_destination() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = engine(
        dir.path(),
        filter_table(&[(HK_MID, &[pass_all(0), pass_all(1)])]),
        dest_table(&[dest("/ram", "a", "dat"), dest("/ram", "b", "dat")]),
    );
    engine.process_message(&tlm(HK_MID, 0));

    send(&mut engine, Command::CloseFile { file_index: 1 });
    // closing an already closed destination is still accepted
    send(&mut engine, Command::CloseFile { file_index: 1 });
    send(&mut engine, Command::CloseFile { file_index: 16 });

    assert_eq!(engine.counters().cmd_accepted, 2);
    assert_eq!(engine.counters().cmd_rejected, 1);
    assert!(engine.file_status(0).unwrap().is_open());
    assert!(!engine.file_status(1).unwrap().is_open());
    assert_eq!(engine.counters().file_update, 1);
    Ok(())
}

#[test]
fn close_all_closes_every_open_destination() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = engine(
        dir.path(),
        filter_table(&[(HK_MID, &[pass_all(0), pass_all(1)])]),
        dest_table(&[dest("/ram", "a", "dat"), dest("/ram", "b", "dat")]),
    );
    engine.process_message(&tlm(HK_MID, 0));

    send(&mut engine, Command::CloseAll);

    assert_eq!(engine.counters().cmd_accepted, 1);
    assert!(!engine.file_status(0).unwrap().is_open());
    assert!(!engine.file_status(1).unwrap().is_open());
    assert_eq!(engine.counters().file_update, 2);
    Ok(())
}

#[test]
fn get_file_info_reports_every_slot() -> Result<()> {
    let dir = tempdir()?;
    let (filter, dest) = simple_tables();
    let mut engine = engine(dir.path(), filter, dest);
    engine.process_message(&tlm(HK_MID, 0));

    send(&mut engine, Command::GetFileInfo);

    assert_eq!(engine.counters().cmd_accepted, 1);
    let report = &engine.host().file_info[0];
    assert_eq!(report.files.len(), 16);
    let first = &report.files[0];
    assert!(first.open);
    assert!(first.enabled);
    assert_eq!(first.name, "/ram/hk00000001.dat");
    assert_eq!(first.size, 140 + 32);
    assert_eq!(first.sequence_count, 2);
    assert!(!report.files[1].open);
    assert!(!report.files[1].enabled);
    assert_eq!(report.files[1].name, "");
    Ok(())
}

#[test]
fn file_info_without_dest_table_reports_disabled() -> Result<()> {
    let dir = tempdir()?;
    let mut host = MockHost::default();
    host.dest_updates.push_back(TableUpdate::NeverLoaded);
    let engine = Engine::new(
        EngineConfig::default(),
        host,
        Box::new(LocalStorage::rooted(dir.path())),
        Persistence::disabled(),
    )?;

    let report = engine.file_info();
    assert!(report.files.iter().all(|f| !f.enabled && !f.open));
    Ok(())
}
