//! Interfaces between the engine and the flight software around it.
use config::{DestFileTable, FilterTable};
use filter::{Packet, PacketTime};

use crate::telemetry::{FileInfoReport, HousekeepingReport};

/// Result of polling the table service for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableUpdate<T> {
    /// The engine's current copy is still the active version.
    Unchanged,
    /// A new (or the first) validated version.
    Updated(T),
    /// No version has ever been loaded.
    NeverLoaded,
}

/// Host services the engine consumes and produces.
pub trait Host {
    /// Routes `message_id` to the engine's input queue with the given depth.
    fn subscribe(&mut self, message_id: u32, depth: u16) -> anyhow::Result<()>;

    fn unsubscribe(&mut self, message_id: u32) -> anyhow::Result<()>;

    fn poll_filter_table(&mut self) -> TableUpdate<FilterTable>;

    fn poll_dest_table(&mut self) -> TableUpdate<DestFileTable>;

    /// The engine edited its working copy of the filter table.
    fn filter_table_modified(&mut self, table: &FilterTable);

    /// The engine edited its working copy of the destination table.
    fn dest_table_modified(&mut self, table: &DestFileTable);

    fn send_housekeeping(&mut self, report: &HousekeepingReport);

    fn send_file_info(&mut self, report: &FileInfoReport);

    /// Host clock, seconds and subseconds past the mission epoch.
    fn current_time(&self) -> PacketTime;
}

/// Blocking message receive. `None` ends [`Engine::run`](crate::Engine::run).
pub trait MessageSource {
    type Message: Packet;

    fn receive(&mut self) -> Option<Self::Message>;
}

impl<P: Packet, I: Iterator<Item = P>> MessageSource for std::iter::Fuse<I> {
    type Message = P;

    fn receive(&mut self) -> Option<P> {
        self.next()
    }
}
