//! Message routing and the storage pre-checks.
use tracing::error;

use config::limits::DEST_FILE_CNT;
use filter::{evaluate, Packet};

use crate::ports::Host;
use crate::telemetry::bump;
use crate::Engine;

impl<H: Host> Engine<H> {
    /// Handles one message from the input queue.
    ///
    /// Commands and housekeeping requests are acted on first and then stored
    /// like any other packet if their id is listed in the filter table.
    pub fn process_message<P: Packet + ?Sized>(&mut self, packet: &P) {
        let mid = packet.message_id();

        if mid == self.config.cmd_mid {
            self.process_command(packet);
            if self.find_message(mid).is_some() {
                self.store_packet(packet);
            }
        } else if mid == self.config.send_hk_mid {
            let len = packet.payload().len();
            if len != 0 {
                error!(mid, len, "invalid housekeeping request length");
                return;
            }
            self.housekeeping();
            if self.find_message(mid).is_some() {
                self.store_packet(packet);
            }
        } else {
            self.store_packet(packet);
        }
    }

    /// Runs `packet` through its filters and writes it to every destination
    /// that admits it.
    pub(crate) fn store_packet<P: Packet + ?Sized>(&mut self, packet: &P) {
        if !self.app_enabled {
            bump!(self.counters.disabled_pkt);
            return;
        }
        let (Some(filter_table), Some(_)) = (self.filter_table.as_ref(), self.dest_table.as_ref())
        else {
            bump!(self.counters.ignored_pkt);
            return;
        };
        let Some(row) = self.index.lookup(filter_table, packet.message_id()) else {
            bump!(self.counters.ignored_pkt);
            return;
        };
        let filters = filter_table.entries[row].filters;

        let mut passed = false;
        for parms in filters {
            if parms.n == 0 {
                continue;
            }
            let slot = usize::from(parms.file_table_index);
            if slot >= DEST_FILE_CNT || !self.files[slot].enabled {
                continue;
            }
            if evaluate(packet, parms.filter_type as u16, parms.n, parms.x, parms.o).passed() {
                passed = true;
                self.setup_write(slot, packet);
            }
        }

        if passed {
            bump!(self.counters.passed_pkt);
        } else {
            bump!(self.counters.filtered_pkt);
        }
    }
}
