//! Ground command execution.
//!
//! Every handler validates completely before it mutates anything, so a
//! rejected command leaves the engine as it was. Checks run in a fixed
//! order; the first failure decides the reported reason.
use tracing::{debug, error};

use config::limits::{FILTERS_PER_PACKET, UNUSED};
use config::{
    is_filename_text, verify_age, verify_count, verify_file_index, verify_parms, verify_size,
    verify_state, Basename, BoundedString, DestinationFileConfig, Extension, FileNameType,
    FilterParms, FilterType, Pathname, TableError,
};
use filter::Packet;

use crate::command::{Command, CommandError};
use crate::ports::Host;
use crate::telemetry::bump;
use crate::Engine;

/// Decodes a fixed string buffer into a name part, enforcing the file name
/// character set.
fn name_part<const N: usize>(
    buf: &[u8],
    field: &'static str,
    required: bool,
) -> Result<BoundedString<N>, TableError> {
    let text = BoundedString::<N>::from_c_bytes(buf)?;
    if text.is_empty() {
        if required {
            return Err(TableError::MissingText { field });
        }
    } else if !is_filename_text(text.as_str()) {
        return Err(TableError::InvalidText { field });
    }
    Ok(text)
}

fn check_filter_target(message_id: u16, filter_index: u16) -> Result<(), CommandError> {
    if u32::from(message_id) == UNUSED {
        return Err(CommandError::MessageId(UNUSED));
    }
    if usize::from(filter_index) >= FILTERS_PER_PACKET {
        return Err(CommandError::FilterIndex(filter_index));
    }
    Ok(())
}

impl<H: Host> Engine<H> {
    pub(crate) fn process_command<P: Packet + ?Sized>(&mut self, packet: &P) {
        let decoded = match packet.command_code() {
            Some(code) => Command::decode(code, packet.payload()),
            None => Err(CommandError::NotCommand),
        };
        match decoded {
            Ok(command) => self.execute(command),
            Err(e) => {
                bump!(self.counters.cmd_rejected);
                error!(mid = packet.message_id(), error = %e, "command rejected");
            }
        }
    }

    fn execute(&mut self, command: Command) {
        let kind = command.kind();
        let result = match command {
            Command::Noop => Ok(()),
            Command::ResetCounters => {
                self.counters.reset();
                debug!("reset counters command");
                return;
            }
            Command::SetAppState { state } => self.set_app_state(state),
            Command::SetFilterFile {
                message_id,
                filter_index,
                file_index,
            } => self.set_filter_file(message_id, filter_index, file_index),
            Command::SetFilterType {
                message_id,
                filter_index,
                filter_type,
            } => self.set_filter_type(message_id, filter_index, filter_type),
            Command::SetFilterParms {
                message_id,
                filter_index,
                n,
                x,
                o,
            } => self.set_filter_parms(message_id, filter_index, n, x, o),
            Command::SetDestType {
                file_index,
                filename_type,
            } => self.set_dest_type(file_index, filename_type),
            Command::SetDestState { file_index, state } => self.set_dest_state(file_index, state),
            Command::SetDestPath {
                file_index,
                pathname,
            } => self.set_dest_path(file_index, &pathname),
            Command::SetDestBase {
                file_index,
                basename,
            } => self.set_dest_base(file_index, &basename),
            Command::SetDestExt {
                file_index,
                extension,
            } => self.set_dest_ext(file_index, &extension),
            Command::SetDestSize {
                file_index,
                max_size,
            } => self.set_dest_size(file_index, max_size),
            Command::SetDestAge {
                file_index,
                max_age,
            } => self.set_dest_age(file_index, max_age),
            Command::SetDestCount {
                file_index,
                sequence_count,
            } => self.set_dest_count(file_index, sequence_count),
            Command::CloseFile { file_index } => self.close_file(file_index),
            Command::GetFileInfo => {
                bump!(self.counters.cmd_accepted);
                debug!(?kind, "command accepted");
                self.send_file_info();
                return;
            }
            Command::AddMessageId { message_id } => self.add_message_id(message_id),
            Command::CloseAll => {
                self.close_all_open();
                Ok(())
            }
        };

        match result {
            Ok(()) => {
                bump!(self.counters.cmd_accepted);
                debug!(?kind, "command accepted");
            }
            Err(e) => {
                bump!(self.counters.cmd_rejected);
                error!(?kind, error = %e, "command rejected");
            }
        }
    }

    fn set_app_state(&mut self, state: u16) -> Result<(), CommandError> {
        self.app_enabled = verify_state(state)?;
        self.update_persistence();
        Ok(())
    }

    // -------------------- Filter table edits --------------------

    /// Finds the filter table row of `message_id`.
    fn locate_filter_row(&self, message_id: u16) -> Result<usize, CommandError> {
        let table = self.filter_table.as_ref().ok_or(CommandError::NoFilterTable)?;
        let mid = u32::from(message_id);
        self.index
            .lookup(table, mid)
            .ok_or(CommandError::NotInTable(mid))
    }

    fn edit_filter(
        &mut self,
        message_id: u16,
        filter_index: u16,
        edit: impl FnOnce(&mut FilterParms),
    ) -> Result<(), CommandError> {
        let row = self.locate_filter_row(message_id)?;
        let table = self.filter_table.as_mut().ok_or(CommandError::NoFilterTable)?;
        edit(&mut table.entries[row].filters[usize::from(filter_index)]);
        self.host.filter_table_modified(table);
        Ok(())
    }

    fn set_filter_file(
        &mut self,
        message_id: u16,
        filter_index: u16,
        file_index: u16,
    ) -> Result<(), CommandError> {
        check_filter_target(message_id, filter_index)?;
        verify_file_index(file_index)?;
        self.edit_filter(message_id, filter_index, |f| f.file_table_index = file_index)
    }

    fn set_filter_type(
        &mut self,
        message_id: u16,
        filter_index: u16,
        filter_type: u16,
    ) -> Result<(), CommandError> {
        check_filter_target(message_id, filter_index)?;
        let kind =
            FilterType::try_from(filter_type).map_err(|_| TableError::FilterType(filter_type))?;
        self.edit_filter(message_id, filter_index, |f| f.filter_type = kind)
    }

    fn set_filter_parms(
        &mut self,
        message_id: u16,
        filter_index: u16,
        n: u16,
        x: u16,
        o: u16,
    ) -> Result<(), CommandError> {
        check_filter_target(message_id, filter_index)?;
        verify_parms(n, x, o)?;
        self.edit_filter(message_id, filter_index, |f| {
            f.n = n;
            f.x = x;
            f.o = o;
        })
    }

    fn add_message_id(&mut self, message_id: u16) -> Result<(), CommandError> {
        let mid = u32::from(message_id);
        if mid == UNUSED {
            return Err(CommandError::MessageId(mid));
        }
        let table = self.filter_table.as_mut().ok_or(CommandError::NoFilterTable)?;
        if self.index.lookup(table, mid).is_some() {
            return Err(CommandError::AlreadyInTable(mid));
        }
        let row = table.first_unused().ok_or(CommandError::TableFull)?;

        let entry = &mut table.entries[row];
        entry.message_id = mid;
        entry.filters = [FilterParms::UNUSED; FILTERS_PER_PACKET];
        self.index.insert(mid, row);

        if let Err(e) = self.host.subscribe(mid, self.config.pipe_depth) {
            error!(mid, error = %e, "subscribe error");
        }
        self.host.filter_table_modified(table);
        Ok(())
    }

    // -------------------- Destination table edits --------------------

    fn edit_dest(
        &mut self,
        file_index: u16,
        edit: impl FnOnce(&mut DestinationFileConfig),
    ) -> Result<(), CommandError> {
        let table = self.dest_table.as_mut().ok_or(CommandError::NoDestTable)?;
        edit(&mut table.files[usize::from(file_index)]);
        self.host.dest_table_modified(table);
        Ok(())
    }

    fn set_dest_type(&mut self, file_index: u16, filename_type: u16) -> Result<(), CommandError> {
        verify_file_index(file_index)?;
        let kind = FileNameType::try_from(filename_type)?;
        self.edit_dest(file_index, |d| d.filename_type = kind)
    }

    fn set_dest_state(&mut self, file_index: u16, state: u16) -> Result<(), CommandError> {
        verify_file_index(file_index)?;
        let enabled = verify_state(state)?;
        self.edit_dest(file_index, |d| d.enabled = enabled)?;
        self.files[usize::from(file_index)].enabled = enabled;
        self.update_persistence();
        Ok(())
    }

    fn set_dest_path(&mut self, file_index: u16, buf: &[u8]) -> Result<(), CommandError> {
        verify_file_index(file_index)?;
        let pathname: Pathname = name_part(buf, "pathname", true)?;
        self.edit_dest(file_index, |d| d.pathname = pathname)
    }

    fn set_dest_base(&mut self, file_index: u16, buf: &[u8]) -> Result<(), CommandError> {
        verify_file_index(file_index)?;
        let basename: Basename = name_part(buf, "basename", false)?;
        self.edit_dest(file_index, |d| d.basename = basename)
    }

    fn set_dest_ext(&mut self, file_index: u16, buf: &[u8]) -> Result<(), CommandError> {
        verify_file_index(file_index)?;
        let extension: Extension = name_part(buf, "extension", false)?;
        self.edit_dest(file_index, |d| d.extension = extension)
    }

    fn set_dest_size(&mut self, file_index: u16, max_size: u32) -> Result<(), CommandError> {
        verify_file_index(file_index)?;
        verify_size(max_size)?;
        self.edit_dest(file_index, |d| d.max_size = max_size)
    }

    fn set_dest_age(&mut self, file_index: u16, max_age: u32) -> Result<(), CommandError> {
        verify_file_index(file_index)?;
        verify_age(max_age)?;
        self.edit_dest(file_index, |d| d.max_age = max_age)
    }

    fn set_dest_count(&mut self, file_index: u16, sequence_count: u32) -> Result<(), CommandError> {
        verify_file_index(file_index)?;
        verify_count(sequence_count)?;
        self.edit_dest(file_index, |d| d.sequence_count = sequence_count)?;
        self.files[usize::from(file_index)].sequence_count = sequence_count;
        self.update_persistence();
        Ok(())
    }

    // -------------------- File control --------------------

    fn close_file(&mut self, file_index: u16) -> Result<(), CommandError> {
        verify_file_index(file_index)?;
        let slot = usize::from(file_index);
        if self.files[slot].is_open() {
            self.update_header(slot);
            self.close_dest(slot);
        }
        Ok(())
    }
}
