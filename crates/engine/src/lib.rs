//! # Engine - Packet Archiving Engine
//!
//! Decides, for every message that crosses the host bus, whether and where to
//! persist it, and runs the lifecycle of the destination files it lands in.
//!
//! ## Architecture
//!
//! ```text
//! Host bus
//!   |
//!   v
//! ┌───────────────────────────────────────────────────────┐
//! │                        ENGINE                         │
//! │                                                       │
//! │ dispatch.rs → command id?  → commands.rs              │
//! │             → hk request?  → housekeeping.rs          │
//! │             → anything else (and both of the above,   │
//! │               when listed in the filter table)        │
//! │                   |                                   │
//! │                   v                                   │
//! │   FilterIndex lookup → N/X/O filters → files.rs       │
//! │                                  |                    │
//! │                                  v                    │
//! │              Closed ──first packet──▶ Open            │
//! │                ▲                       |              │
//! │                └─ size / age / close / write error ───┘│
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module          | Purpose                                                  |
//! |-----------------|----------------------------------------------------------|
//! | [`lib.rs`]      | `Engine` struct, constructor, accessors, `Debug`, `Drop` |
//! | [`ports`]       | `Host` and `MessageSource` traits, `TableUpdate`          |
//! | [`dispatch`]    | Message routing, packet storage pre-checks               |
//! | [`files`]       | Destination file state machine                           |
//! | [`tables`]      | Table reloads, subscriptions, index rebuilds             |
//! | [`command`]     | Ground command decoding                                  |
//! | [`commands`]    | Ground command execution                                 |
//! | [`housekeeping`]| Periodic housekeeping pass                               |
//! | [`telemetry`]   | Counters and report types                                |
//!
//! ## Ownership
//!
//! One `Engine` value owns all mutable state: the working copies of both
//! tables, the filter index, the per-slot file status and every counter.
//! It is driven through `&mut self` from a single thread.
mod command;
mod commands;
mod dispatch;
mod files;
mod housekeeping;
mod ports;
mod tables;
mod telemetry;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use cds::{FileStore, Persistence, DEST_SLOTS};
use config::limits::DEST_FILE_CNT;
use config::{DestFileTable, EngineConfig, FilterTable};
use destfile::{LocalStorage, Storage, WriteSeek};
use index::FilterIndex;

pub use command::{Command, CommandError, CommandKind};
pub use ports::{Host, MessageSource, TableUpdate};
pub use telemetry::{Counters, FileInfo, FileInfoReport, HousekeepingReport};

/// Runtime state of one destination slot.
#[derive(Default)]
pub struct FileStatus {
    pub(crate) handle: Option<Box<dyn WriteSeek>>,
    pub(crate) age: u32,
    pub(crate) size: u32,
    pub(crate) growth: u32,
    pub(crate) rate: u32,
    pub(crate) sequence_count: u32,
    pub(crate) enabled: bool,
    pub(crate) name: String,
    /// Seconds of the last packet written (fixed-width text headers).
    pub(crate) last_packet_time: u32,
}

impl FileStatus {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn growth(&self) -> u32 {
        self.growth
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn sequence_count(&self) -> u32 {
        self.sequence_count
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Name of the open file; empty when closed.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStatus")
            .field("open", &self.is_open())
            .field("age", &self.age)
            .field("size", &self.size)
            .field("growth", &self.growth)
            .field("rate", &self.rate)
            .field("sequence_count", &self.sequence_count)
            .field("enabled", &self.enabled)
            .field("name", &self.name)
            .finish()
    }
}

/// The packet archiving engine.
///
/// # Message path
///
/// 1. Route by message id (command, housekeeping request, anything else).
/// 2. Pre-check: app enabled, both tables present, id in the filter index.
/// 3. Apply each of the row's filters whose destination is enabled.
/// 4. Every passing filter writes the whole packet to its destination,
///    opening or rotating the file as needed.
///
/// # Startup
///
/// [`Engine::new`] subscribes to the command and housekeeping ids, polls the
/// table service once for each table, then creates or restores the
/// persisted counters.
pub struct Engine<H: Host> {
    pub(crate) config: EngineConfig,
    pub(crate) host: H,
    pub(crate) storage: Box<dyn Storage>,
    pub(crate) persistence: Persistence,

    pub(crate) counters: Counters,
    pub(crate) app_enabled: bool,

    /// Working copies of the active tables; `None` until first loaded.
    pub(crate) filter_table: Option<FilterTable>,
    pub(crate) dest_table: Option<DestFileTable>,
    pub(crate) index: FilterIndex,

    /// One status per destination slot.
    pub(crate) files: Vec<FileStatus>,

    /// Seconds of the packet being stored (fixed-width text headers).
    pub(crate) current_packet_time: u32,
}

impl<H: Host> std::fmt::Debug for Engine<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("app_enabled", &self.app_enabled)
            .field("counters", &self.counters)
            .field("filter_table_loaded", &self.filter_table.is_some())
            .field("dest_table_loaded", &self.dest_table.is_some())
            .field("indexed_ids", &self.index.len())
            .field("open_files", &self.files.iter().filter(|f| f.is_open()).count())
            .field("persistence", &self.persistence)
            .finish()
    }
}

impl<H: Host> Engine<H> {
    /// Builds and initializes an engine from explicit parts.
    ///
    /// # Errors
    ///
    /// Fails only when the command or housekeeping-request subscription is
    /// refused; table and persistence problems are logged and counted.
    pub fn new(
        config: EngineConfig,
        host: H,
        storage: Box<dyn Storage>,
        persistence: Persistence,
    ) -> Result<Self> {
        let mut files = Vec::with_capacity(DEST_FILE_CNT);
        files.resize_with(DEST_FILE_CNT, FileStatus::default);

        let mut engine = Self {
            app_enabled: config.default_enable_state,
            config,
            host,
            storage,
            persistence,
            counters: Counters::default(),
            filter_table: None,
            dest_table: None,
            index: FilterIndex::new(),
            files,
            current_packet_time: 0,
        };

        let depth = engine.config.pipe_depth;
        let cmd_mid = engine.config.cmd_mid;
        let hk_mid = engine.config.send_hk_mid;
        engine
            .host
            .subscribe(hk_mid, depth)
            .with_context(|| format!("failed to subscribe to hk request 0x{hk_mid:04X}"))?;
        engine
            .host
            .subscribe(cmd_mid, depth)
            .with_context(|| format!("failed to subscribe to commands 0x{cmd_mid:04X}"))?;

        engine.manage_dest_table();
        engine.manage_filter_table();
        engine.init_persistence();

        info!(
            app_enabled = engine.app_enabled,
            persistence = engine.persistence.is_active(),
            "archiving engine initialized"
        );
        Ok(engine)
    }

    /// Builds an engine over the local file system: destination names are
    /// resolved beneath `storage_root` and the persisted counters live in
    /// `cds_dir`.
    pub fn open<P1: AsRef<Path>, P2: AsRef<Path>>(
        config: EngineConfig,
        host: H,
        storage_root: P1,
        cds_dir: P2,
    ) -> Result<Self> {
        let cds_dir = cds_dir.as_ref();
        let store = FileStore::open(cds_dir)
            .with_context(|| format!("failed to open data store at {}", cds_dir.display()))?;
        let persistence = Persistence::new(Box::new(store), config.cds_key.clone());
        let storage = Box::new(LocalStorage::rooted(storage_root));
        Self::new(config, host, storage, persistence)
    }

    fn init_persistence(&mut self) {
        let mut counts = self.sequence_counts();
        let mut enabled = self.app_enabled;
        let restore = self.config.restore_enable_state;
        if self.persistence.create_or_restore(&mut counts, &mut enabled, restore) {
            for (status, count) in self.files.iter_mut().zip(counts) {
                status.sequence_count = count;
            }
            self.app_enabled = enabled;
        }
    }

    pub(crate) fn sequence_counts(&self) -> [u32; DEST_SLOTS] {
        let mut counts = [0u32; DEST_SLOTS];
        for (slot, status) in counts.iter_mut().zip(&self.files) {
            *slot = status.sequence_count;
        }
        counts
    }

    /// Persists sequence counts and the enable flag (best effort).
    pub(crate) fn update_persistence(&mut self) {
        let counts = self.sequence_counts();
        self.persistence.update(&counts, self.app_enabled);
    }

    /// Processes messages until `source` is exhausted. Returns the number of
    /// messages handled.
    pub fn run<S: MessageSource>(&mut self, source: &mut S) -> usize {
        let mut handled = 0;
        while let Some(message) = source.receive() {
            self.process_message(&message);
            handled += 1;
        }
        info!(handled, "message source closed");
        handled
    }

    #[must_use]
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    #[must_use]
    pub fn app_enabled(&self) -> bool {
        self.app_enabled
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Status of destination slot `index`.
    pub fn file_status(&self, index: usize) -> Option<&FileStatus> {
        self.files.get(index)
    }

    pub fn filter_table(&self) -> Option<&FilterTable> {
        self.filter_table.as_ref()
    }

    pub fn dest_table(&self) -> Option<&DestFileTable> {
        self.dest_table.as_ref()
    }

    /// Row of the active filter table holding `message_id`.
    pub fn find_message(&self, message_id: u32) -> Option<usize> {
        let table = self.filter_table.as_ref()?;
        self.index.lookup(table, message_id)
    }

    pub fn persistence_active(&self) -> bool {
        self.persistence.is_active()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

/// Best-effort close on drop.
///
/// Open files get their header updated and are closed (and relocated, when
/// configured) so the last file of a run is complete on disk.
impl<H: Host> Drop for Engine<H> {
    fn drop(&mut self) {
        self.close_all_open();
    }
}

#[cfg(test)]
mod tests;
