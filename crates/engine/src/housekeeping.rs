use crate::ports::Host;
use crate::telemetry::{FileInfo, FileInfoReport, HousekeepingReport};
use crate::Engine;

impl<H: Host> Engine<H> {
    /// One housekeeping cycle: age files, pick up table reloads, report
    /// counters and roll the per-slot growth into a rate.
    pub(crate) fn housekeeping(&mut self) {
        self.test_age(self.config.secs_per_hk_cycle);
        self.manage_dest_table();
        self.manage_filter_table();

        let report = HousekeepingReport {
            counters: self.counters,
            app_enabled: self.app_enabled,
        };

        let period = self.config.secs_per_hk_cycle.max(1);
        for status in &mut self.files {
            status.rate = status.growth / period;
            status.growth = 0;
        }

        self.host.send_housekeeping(&report);
    }

    /// Builds the per-slot diagnostic report.
    pub fn file_info(&self) -> FileInfoReport {
        let table = self.dest_table.as_ref();
        let files = self
            .files
            .iter()
            .map(|status| FileInfo {
                age: status.age,
                size: status.size,
                rate: status.rate,
                sequence_count: status.sequence_count,
                enabled: table.is_some() && status.enabled,
                open: status.is_open(),
                name: status.name.clone(),
            })
            .collect();
        FileInfoReport { files }
    }

    pub(crate) fn send_file_info(&mut self) {
        let report = self.file_info();
        self.host.send_file_info(&report);
    }
}
