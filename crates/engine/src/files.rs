//! Destination file lifecycle.
//!
//! Each slot is either closed (`handle == None`) or open. A slot opens on
//! the first packet admitted to it and closes when the next packet would
//! push it past `max_size`, when it reaches `max_age`, on a close command,
//! or after a failed write.
use std::io::Write;

use tracing::{debug, error, info};

use config::limits::MAX_SEQUENCE_COUNT;
use config::{FileNameType, HeaderFormat};
use destfile::{
    build_filename, initial_header, relocation_target, sequence_token, time_token, ClosingInfo,
    HeaderContext, NameError,
};
use filter::Packet;

use crate::ports::Host;
use crate::telemetry::bump;
use crate::Engine;

impl<H: Host> Engine<H> {
    /// Writes `packet` to destination `slot`, opening or rotating the file
    /// first when needed.
    pub(crate) fn setup_write<P: Packet + ?Sized>(&mut self, slot: usize, packet: &P) {
        let Some(max_size) = self
            .dest_table
            .as_ref()
            .and_then(|t| t.files.get(slot))
            .map(|d| d.max_size)
        else {
            return;
        };
        if self.config.header_format == HeaderFormat::FixedWidthText {
            self.current_packet_time = packet.time().seconds;
        }

        let data = packet.as_bytes();
        let status = &self.files[slot];
        if !status.is_open() {
            self.create_dest(slot);
        } else {
            let projected = u64::from(status.size) + data.len() as u64;
            if projected > u64::from(max_size) {
                self.update_header(slot);
                self.close_dest(slot);
                self.create_dest(slot);
            }
        }

        if self.files[slot].is_open() {
            self.write_data(slot, data);
        }
    }

    fn next_file_name(&self, slot: usize) -> Result<String, NameError> {
        let Some(dest) = self.dest_table.as_ref().and_then(|t| t.files.get(slot)) else {
            return Err(NameError::MissingPath);
        };
        let token = match dest.filename_type {
            FileNameType::ByCount => sequence_token(self.files[slot].sequence_count),
            FileNameType::ByTime => {
                let seconds = match self.config.header_format {
                    HeaderFormat::FixedWidthText => self.current_packet_time,
                    HeaderFormat::Structured => self.host.current_time().seconds,
                };
                time_token(seconds)?
            }
        };
        build_filename(
            dest.pathname.as_str(),
            dest.basename.as_str(),
            &token,
            dest.extension.as_str(),
        )
    }

    /// Names, creates and heads a new file for `slot`.
    pub(crate) fn create_dest(&mut self, slot: usize) {
        let name = match self.next_file_name(slot) {
            Ok(name) => name,
            Err(e) => {
                error!(dest = slot, error = %e, "file name error");
                let status = &mut self.files[slot];
                status.name.clear();
                status.enabled = false;
                return;
            }
        };

        let handle = match self.storage.create(&name) {
            Ok(handle) => handle,
            Err(e) => {
                bump!(self.counters.file_write_err);
                error!(dest = slot, name = %name, error = %e, "file create error");
                let status = &mut self.files[slot];
                status.name.clear();
                status.enabled = false;
                return;
            }
        };
        bump!(self.counters.file_write);
        debug!(dest = slot, name = %name, "destination file created");

        let name_type = self
            .dest_table
            .as_ref()
            .and_then(|t| t.files.get(slot))
            .map(|d| d.filename_type)
            .unwrap_or_default();

        let status = &mut self.files[slot];
        status.handle = Some(handle);
        status.name = name;

        let blocks = {
            let ctx = HeaderContext {
                dest_index: slot as u16,
                name_type: name_type as u16,
                file_name: &status.name,
                create_time: self.host.current_time(),
                sequence: status.sequence_count,
                start_seconds: self.current_packet_time,
            };
            initial_header(self.config.header_format, &ctx)
        };
        for block in blocks {
            if !self.write_data(slot, &block) {
                return;
            }
        }

        if name_type == FileNameType::ByCount {
            let restart = self
                .dest_table
                .as_ref()
                .and_then(|t| t.files.get(slot))
                .map(|d| d.sequence_count)
                .unwrap_or(0);
            let status = &mut self.files[slot];
            status.sequence_count = status.sequence_count.saturating_add(1);
            if status.sequence_count > MAX_SEQUENCE_COUNT {
                status.sequence_count = restart;
            }
            self.update_persistence();
        }
    }

    /// Appends `data` to the open file of `slot`. Returns `false` (after
    /// closing and disabling the slot) when the write fails.
    pub(crate) fn write_data(&mut self, slot: usize, data: &[u8]) -> bool {
        let status = &mut self.files[slot];
        let Some(handle) = status.handle.as_mut() else {
            return false;
        };
        match handle.write_all(data) {
            Ok(()) => {
                bump!(self.counters.file_write);
                let len = data.len() as u32;
                status.size = status.size.wrapping_add(len);
                status.growth = status.growth.wrapping_add(len);
                if self.config.header_format == HeaderFormat::FixedWidthText {
                    status.last_packet_time = self.current_packet_time;
                }
                true
            }
            Err(e) => {
                error!(dest = slot, name = %status.name, error = %e, "file write error");
                self.write_error(slot);
                false
            }
        }
    }

    fn write_error(&mut self, slot: usize) {
        bump!(self.counters.file_write_err);
        self.close_dest(slot);
        self.files[slot].enabled = false;
    }

    /// Rewrites the closing fields of the header of an open file.
    pub(crate) fn update_header(&mut self, slot: usize) {
        let info = ClosingInfo {
            close_time: self.host.current_time(),
            last_packet_seconds: self.files[slot].last_packet_time,
            file_size: self.files[slot].size,
        };
        let format = self.config.header_format;
        let status = &mut self.files[slot];
        let Some(handle) = status.handle.as_mut() else {
            return;
        };
        match destfile::update_header(format, &mut **handle, &info) {
            Ok(()) => bump!(self.counters.file_update),
            Err(e) => {
                bump!(self.counters.file_update_err);
                error!(dest = slot, name = %status.name, error = %e, "file header update error");
            }
        }
    }

    /// Closes the file of `slot`, moving it when configured, and resets the
    /// slot's file state. Growth is kept for the next rate computation.
    pub(crate) fn close_dest(&mut self, slot: usize) {
        let status = &mut self.files[slot];
        if let Some(mut handle) = status.handle.take() {
            if let Err(e) = handle.flush() {
                error!(dest = slot, name = %status.name, error = %e, "file flush error");
            }
        }
        let name = std::mem::take(&mut status.name);
        status.age = 0;
        status.size = 0;

        if !self.config.move_files || name.is_empty() {
            return;
        }
        let Some(movename) = self
            .dest_table
            .as_ref()
            .and_then(|t| t.files.get(slot))
            .map(|d| d.movename.as_str())
            .filter(|m| !m.is_empty())
        else {
            return;
        };
        match relocation_target(movename, &name) {
            Ok(target) => match self.storage.relocate(&name, &target) {
                Ok(()) => info!(dest = slot, from = %name, to = %target, "file moved"),
                Err(e) => {
                    error!(dest = slot, from = %name, to = %target, error = %e, "file move error")
                }
            },
            Err(e) => error!(dest = slot, name = %name, error = %e, "file move target error"),
        }
    }

    /// Ages every open file by `elapsed` seconds and closes the ones that
    /// reached their limit.
    pub(crate) fn test_age(&mut self, elapsed: u32) {
        let Some(table) = self.dest_table.as_ref() else {
            return;
        };
        let limits: Vec<u32> = table.files.iter().map(|d| d.max_age).collect();
        for (slot, max_age) in limits.into_iter().enumerate() {
            let status = &mut self.files[slot];
            if !status.is_open() {
                continue;
            }
            status.age = status.age.saturating_add(elapsed);
            if status.age >= max_age {
                self.update_header(slot);
                self.close_dest(slot);
            }
        }
    }

    /// Updates and closes every open file.
    pub(crate) fn close_all_open(&mut self) {
        for slot in 0..self.files.len() {
            if self.files[slot].is_open() {
                self.update_header(slot);
                self.close_dest(slot);
            }
        }
    }
}
