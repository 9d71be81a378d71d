//! Table reloads.
//!
//! Both tables are polled at startup and on every housekeeping cycle. A new
//! filter table swaps the message subscriptions and rebuilds the index; a
//! new destination table reseeds each slot's enable state and sequence
//! count.
use tracing::{debug, error, info};

use config::FilterTable;

use crate::ports::{Host, TableUpdate};
use crate::telemetry::bump;
use crate::Engine;

impl<H: Host> Engine<H> {
    pub(crate) fn manage_dest_table(&mut self) {
        match self.host.poll_dest_table() {
            TableUpdate::Unchanged => {}
            TableUpdate::NeverLoaded => {
                bump!(self.counters.dest_tbl_err);
                debug!("destination file table has never been loaded");
            }
            TableUpdate::Updated(table) => {
                for (status, dest) in self.files.iter_mut().zip(&table.files) {
                    status.enabled = dest.enabled;
                    status.sequence_count = dest.sequence_count;
                }
                self.dest_table = Some(table);
                self.update_persistence();
                bump!(self.counters.dest_tbl_load);
                info!("destination file table loaded");
            }
        }
    }

    pub(crate) fn manage_filter_table(&mut self) {
        match self.host.poll_filter_table() {
            TableUpdate::Unchanged => {}
            TableUpdate::NeverLoaded => {
                bump!(self.counters.filter_tbl_err);
                debug!("packet filter table has never been loaded");
            }
            TableUpdate::Updated(table) => {
                if let Some(old) = self.filter_table.take() {
                    self.unsubscribe_table(&old);
                }
                self.subscribe_table(&table);
                let indexed = self.index.rebuild(&table);
                self.filter_table = Some(table);
                bump!(self.counters.filter_tbl_load);
                info!(indexed, "packet filter table loaded");
            }
        }
    }

    fn subscribe_table(&mut self, table: &FilterTable) {
        let depth = self.config.pipe_depth;
        for mid in routed_ids(table, self.config.cmd_mid, self.config.send_hk_mid) {
            if let Err(e) = self.host.subscribe(mid, depth) {
                error!(mid, error = %e, "subscribe error");
            }
        }
    }

    fn unsubscribe_table(&mut self, table: &FilterTable) {
        for mid in routed_ids(table, self.config.cmd_mid, self.config.send_hk_mid) {
            if let Err(e) = self.host.unsubscribe(mid) {
                error!(mid, error = %e, "unsubscribe error");
            }
        }
    }
}

/// Message ids the table routes to the engine. The unused id and the
/// engine's own command and request ids are never (un)subscribed here.
fn routed_ids(table: &FilterTable, cmd_mid: u32, hk_mid: u32) -> impl Iterator<Item = u32> + '_ {
    table
        .message_ids()
        .filter(move |&mid| mid != cmd_mid && mid != hk_mid)
}
