use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Seek, SeekFrom, Write};

use config::limits::TOTAL_FNAME_BUFSIZE;
use config::HeaderFormat;
use filter::PacketTime;

/// Size of the container header.
pub const CONTAINER_HEADER_LEN: usize = 64;
/// Size of the archive header that follows the container header.
pub const ARCHIVE_HEADER_LEN: usize = 4 + 4 + 2 + 2 + TOTAL_FNAME_BUFSIZE;
/// Size of the fixed-width text header.
pub const TEXT_HEADER_LEN: usize = 48;

const CONTENT_TYPE: u32 = 0x6346_4531; // "cFE1"
const SUBTYPE: u32 = 12345;
const DESCRIPTION: &[u8] = b"DS data storage file";
const DESCRIPTION_LEN: usize = 32;

const SOURCE_ID: &[u8; 4] = b"SCHK";
const TEXT_STOP_TIME_OFFSET: u64 = 16;

/// Everything a new file's header records.
#[derive(Debug, Clone, Copy)]
pub struct HeaderContext<'a> {
    pub dest_index: u16,
    pub name_type: u16,
    pub file_name: &'a str,
    /// Host clock at creation (structured layout).
    pub create_time: PacketTime,
    /// Sequence count the file was named with (text layout).
    pub sequence: u32,
    /// Seconds of the packet that opened the file (text layout).
    pub start_seconds: u32,
}

/// Values rewritten in place when a file is closed.
#[derive(Debug, Clone, Copy)]
pub struct ClosingInfo {
    /// Host clock at close (structured layout).
    pub close_time: PacketTime,
    /// Seconds of the last packet written (text layout).
    pub last_packet_seconds: u32,
    /// Total bytes in the file, header included (text layout).
    pub file_size: u32,
}

/// Renders `value` as 8 ASCII decimal digits, saturating at 99,999,999.
pub fn convert_decimal8(value: u32) -> [u8; 8] {
    let mut v = value.min(99_999_999);
    let mut out = [b'0'; 8];
    for digit in out.iter_mut().rev() {
        *digit = b'0' + (v % 10) as u8;
        v /= 10;
    }
    out
}

/// Header blocks for a freshly created file, in write order. The
/// structured layout is two blocks, the text layout one.
pub fn initial_header(format: HeaderFormat, ctx: &HeaderContext<'_>) -> Vec<Vec<u8>> {
    match format {
        HeaderFormat::Structured => vec![container_header(ctx), archive_header(ctx)],
        HeaderFormat::FixedWidthText => vec![text_header(ctx)],
    }
}

fn container_header(ctx: &HeaderContext<'_>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(CONTAINER_HEADER_LEN);
    // Writes into a Vec cannot fail.
    let _ = buf.write_u32::<BigEndian>(CONTENT_TYPE);
    let _ = buf.write_u32::<BigEndian>(SUBTYPE);
    let _ = buf.write_u32::<BigEndian>(CONTAINER_HEADER_LEN as u32);
    let _ = buf.write_u32::<BigEndian>(0); // spacecraft
    let _ = buf.write_u32::<BigEndian>(0); // processor
    let _ = buf.write_u32::<BigEndian>(0); // application
    let _ = buf.write_u32::<BigEndian>(ctx.create_time.seconds);
    let _ = buf.write_u32::<BigEndian>(ctx.create_time.subseconds);
    let mut desc = [0u8; DESCRIPTION_LEN];
    desc[..DESCRIPTION.len()].copy_from_slice(DESCRIPTION);
    buf.extend_from_slice(&desc);
    buf
}

fn archive_header(ctx: &HeaderContext<'_>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(ARCHIVE_HEADER_LEN);
    // close time is filled in on close
    let _ = buf.write_u32::<BigEndian>(0);
    let _ = buf.write_u32::<BigEndian>(0);
    let _ = buf.write_u16::<BigEndian>(ctx.dest_index);
    let _ = buf.write_u16::<BigEndian>(ctx.name_type);
    let mut name = [0u8; TOTAL_FNAME_BUFSIZE];
    let n = ctx.file_name.len().min(TOTAL_FNAME_BUFSIZE - 1);
    name[..n].copy_from_slice(&ctx.file_name.as_bytes()[..n]);
    buf.extend_from_slice(&name);
    buf
}

fn text_header(ctx: &HeaderContext<'_>) -> Vec<u8> {
    let mut buf = vec![b' '; TEXT_HEADER_LEN];
    buf[0..4].copy_from_slice(SOURCE_ID);
    buf[4..12].copy_from_slice(&convert_decimal8(ctx.sequence));
    buf[12..16].copy_from_slice(&ctx.start_seconds.to_be_bytes());
    // stop time and size stay blank until close
    buf
}

/// Rewrites the close-time fields of an open file in place.
pub fn update_header<W: Write + Seek + ?Sized>(
    format: HeaderFormat,
    file: &mut W,
    info: &ClosingInfo,
) -> io::Result<()> {
    match format {
        HeaderFormat::Structured => {
            file.seek(SeekFrom::Start(CONTAINER_HEADER_LEN as u64))?;
            let mut buf = [0u8; 8];
            buf[0..4].copy_from_slice(&info.close_time.seconds.to_be_bytes());
            buf[4..8].copy_from_slice(&info.close_time.subseconds.to_be_bytes());
            file.write_all(&buf)?;
        }
        HeaderFormat::FixedWidthText => {
            file.seek(SeekFrom::Start(TEXT_STOP_TIME_OFFSET))?;
            file.write_all(&info.last_packet_seconds.to_be_bytes())?;
            file.write_all(&convert_decimal8(info.file_size))?;
        }
    }
    file.seek(SeekFrom::End(0))?;
    Ok(())
}
