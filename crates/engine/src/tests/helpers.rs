use std::collections::VecDeque;
use std::fs;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use anyhow::bail;
use cds::{MemoryStore, Persistence};
use config::{
    DestFileTable, DestinationFileConfig, EngineConfig, FileNameType, FilterParms, FilterTable,
    FilterType,
};
use destfile::{LocalStorage, Storage, WriteSeek};
use filter::{CcsdsPacket, PacketTime};

use crate::*;

pub const HK_MID: u16 = 0x0801;
pub const EVS_MID: u16 = 0x0808;

/// Host double: records everything the engine sends and hands out queued
/// table updates (`Unchanged` once the queue is empty).
#[derive(Default)]
pub struct MockHost {
    pub subscribed: Vec<(u32, u16)>,
    pub unsubscribed: Vec<u32>,
    pub refuse: Vec<u32>,
    pub filter_updates: VecDeque<TableUpdate<FilterTable>>,
    pub dest_updates: VecDeque<TableUpdate<DestFileTable>>,
    pub filter_modified: Vec<FilterTable>,
    pub dest_modified: Vec<DestFileTable>,
    pub hk_reports: Vec<HousekeepingReport>,
    pub file_info: Vec<FileInfoReport>,
    pub clock: PacketTime,
}

impl MockHost {
    pub fn with_tables(filter: FilterTable, dest: DestFileTable) -> Self {
        let mut host = MockHost::default();
        host.filter_updates.push_back(TableUpdate::Updated(filter));
        host.dest_updates.push_back(TableUpdate::Updated(dest));
        host
    }

    pub fn is_subscribed(&self, mid: u32) -> bool {
        let subs = self.subscribed.iter().filter(|(m, _)| *m == mid).count();
        let unsubs = self.unsubscribed.iter().filter(|m| **m == mid).count();
        subs > unsubs
    }
}

impl Host for MockHost {
    fn subscribe(&mut self, message_id: u32, depth: u16) -> anyhow::Result<()> {
        if self.refuse.contains(&message_id) {
            bail!("no route for 0x{message_id:04X}");
        }
        self.subscribed.push((message_id, depth));
        Ok(())
    }

    fn unsubscribe(&mut self, message_id: u32) -> anyhow::Result<()> {
        self.unsubscribed.push(message_id);
        Ok(())
    }

    fn poll_filter_table(&mut self) -> TableUpdate<FilterTable> {
        self.filter_updates.pop_front().unwrap_or(TableUpdate::Unchanged)
    }

    fn poll_dest_table(&mut self) -> TableUpdate<DestFileTable> {
        self.dest_updates.pop_front().unwrap_or(TableUpdate::Unchanged)
    }

    fn filter_table_modified(&mut self, table: &FilterTable) {
        self.filter_modified.push(table.clone());
    }

    fn dest_table_modified(&mut self, table: &DestFileTable) {
        self.dest_modified.push(table.clone());
    }

    fn send_housekeeping(&mut self, report: &HousekeepingReport) {
        self.hk_reports.push(report.clone());
    }

    fn send_file_info(&mut self, report: &FileInfoReport) {
        self.file_info.push(report.clone());
    }

    fn current_time(&self) -> PacketTime {
        self.clock
    }
}

/// A writer whose every write fails.
pub struct BrokenWriter;

impl Write for BrokenWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "device full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for BrokenWriter {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Ok(0)
    }
}

/// Storage that refuses to create files, or hands out broken writers.
pub struct FaultyStorage {
    pub refuse_create: bool,
}

impl Storage for FaultyStorage {
    fn create(&mut self, name: &str) -> io::Result<Box<dyn WriteSeek>> {
        if self.refuse_create {
            return Err(io::Error::new(io::ErrorKind::NotFound, name.to_string()));
        }
        Ok(Box::new(BrokenWriter))
    }

    fn relocate(&mut self, _from: &str, _to: &str) -> io::Result<()> {
        Ok(())
    }
}

// -------------------- Table builders --------------------

pub fn pass_all(file: u16) -> FilterParms {
    by_count(file, 1, 1, 0)
}

pub fn by_count(file: u16, n: u16, x: u16, o: u16) -> FilterParms {
    FilterParms {
        file_table_index: file,
        filter_type: FilterType::ByCount,
        n,
        x,
        o,
    }
}

/// Filter table with one row per `(mid, filters)`, in order.
pub fn filter_table(rows: &[(u16, &[FilterParms])]) -> FilterTable {
    let mut table = FilterTable::default();
    for (row, (mid, filters)) in rows.iter().enumerate() {
        table.entries[row].message_id = u32::from(*mid);
        for (slot, parms) in filters.iter().enumerate() {
            table.entries[row].filters[slot] = *parms;
        }
    }
    table
}

pub fn dest(path: &str, base: &str, ext: &str) -> DestinationFileConfig {
    DestinationFileConfig {
        pathname: path.try_into().unwrap(),
        basename: base.try_into().unwrap(),
        extension: ext.try_into().unwrap(),
        movename: Default::default(),
        filename_type: FileNameType::ByCount,
        enabled: true,
        max_size: 1024 * 1024,
        max_age: 3600,
        sequence_count: 1,
    }
}

/// Destination table with `entries` in slots `0..`.
pub fn dest_table(entries: &[DestinationFileConfig]) -> DestFileTable {
    let mut table = DestFileTable::default();
    for (slot, entry) in entries.iter().enumerate() {
        table.files[slot] = entry.clone();
    }
    table
}

/// HK_MID to slot 0, everything kept, files under `/ram`.
pub fn simple_tables() -> (FilterTable, DestFileTable) {
    (
        filter_table(&[(HK_MID, &[pass_all(0)])]),
        dest_table(&[dest("/ram", "hk", "dat")]),
    )
}

// -------------------- Engine builders --------------------

/// Creates the `ram` and `dl` directories beneath `root`.
pub fn storage_dirs(root: &Path) {
    fs::create_dir_all(root.join("ram")).unwrap();
    fs::create_dir_all(root.join("dl")).unwrap();
}

pub fn engine_with(
    root: &Path,
    config: EngineConfig,
    filter: FilterTable,
    dest: DestFileTable,
) -> Engine<MockHost> {
    storage_dirs(root);
    Engine::new(
        config,
        MockHost::with_tables(filter, dest),
        Box::new(LocalStorage::rooted(root)),
        Persistence::new(Box::new(MemoryStore::new()), "DS_CDS"),
    )
    .unwrap()
}

pub fn engine(root: &Path, filter: FilterTable, dest: DestFileTable) -> Engine<MockHost> {
    engine_with(root, EngineConfig::default(), filter, dest)
}

pub fn faulty_engine(refuse_create: bool) -> Engine<MockHost> {
    let (filter, dest) = simple_tables();
    Engine::new(
        EngineConfig::default(),
        MockHost::with_tables(filter, dest),
        Box::new(FaultyStorage { refuse_create }),
        Persistence::disabled(),
    )
    .unwrap()
}

// -------------------- Packets --------------------

pub fn tlm(mid: u16, seq: u16) -> CcsdsPacket {
    CcsdsPacket::telemetry(mid, seq, PacketTime::new(1000, 0), &[0xAB; 20])
}

pub fn tlm_at(mid: u16, seq: u16, seconds: u32) -> CcsdsPacket {
    CcsdsPacket::telemetry(mid, seq, PacketTime::new(seconds, 0), &[0xAB; 20])
}

pub fn cmd(engine: &Engine<MockHost>, command: &Command) -> CcsdsPacket {
    command.to_packet(engine.config().cmd_mid as u16)
}

pub fn hk_request(engine: &Engine<MockHost>) -> CcsdsPacket {
    CcsdsPacket::command(engine.config().send_hk_mid as u16, 0, &[])
}

/// Path of an engine file name beneath `root`.
pub fn on_disk(root: &Path, name: &str) -> std::path::PathBuf {
    root.join(name.trim_start_matches('/'))
}
