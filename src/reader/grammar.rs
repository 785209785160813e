use super::cursor::Cursor;
use crate::error::Result;
use crate::location::Location;
use crate::records::{BranchHistory, BranchInfo, MemInfo, SampleInfo};

/// Header marking a profile collected without LBR
pub(crate) const NO_LBR_MARKER: &str = "no_lbr";

/// Parse the optional `no_lbr [event ...]` first line
///
/// Returns `None` when the profile does not start with the marker, and the
/// listed event names otherwise.
pub(crate) fn parse_no_lbr_header<'a>(cursor: &mut Cursor<'a>) -> Result<Option<Vec<&'a str>>> {
    let start = cursor.position();
    if !cursor.consume_literal(NO_LBR_MARKER) {
        return Ok(None);
    }

    let sep = cursor.separator();
    let mut events = Vec::new();
    if cursor.peek() == Some(sep) {
        cursor.expect_field_separator()?;
        while !matches!(cursor.peek(), None | Some(b'\n')) {
            events.push(cursor.parse_string(sep, true)?);
        }
    }
    if !cursor.check_and_consume_newline() {
        return Err(cursor.error_at(start, "malformed no_lbr line"));
    }
    Ok(Some(events))
}

/// `<kind> <name> <hex offset>`
///
/// Branch and sample kinds are 0 (DSO), 1 (global symbol) and 2 (local
/// symbol); memory events use the same kinds plus 3.
pub(crate) fn parse_location<'a>(
    cursor: &mut Cursor<'a>,
    end: u8,
    end_nl: bool,
    memory: bool,
) -> Result<Location<'a>> {
    let kind = if memory {
        cursor.parse_flag(b"345", "expected 3, 4 or 5")?
    } else {
        cursor.parse_flag(b"012", "expected 0, 1 or 2")?
    };
    let is_symbol = matches!(kind, b'1' | b'2' | b'4' | b'5');

    let name = cursor.parse_string(cursor.separator(), false)?;
    let offset = cursor.parse_hex_field(end, end_nl)?;
    Ok(Location::new(is_symbol, name, offset))
}

/// `<from> <to> <mispreds> <branches>[ <histories>]` followed by the history blocks
pub(crate) fn parse_branch_info<'a>(cursor: &mut Cursor<'a>) -> Result<BranchInfo<'a>> {
    let sep = cursor.separator();
    let from = parse_location(cursor, sep, false, false)?;
    let to = parse_location(cursor, sep, false, false)?;
    let mispreds = cursor.parse_number_field(sep, false)?;
    let branches = cursor.parse_number_field(sep, true)?;
    let mut branch = BranchInfo::new(from, to, mispreds, branches);

    if cursor.check_and_consume_newline() {
        return Ok(branch);
    }
    let num_histories = cursor.parse_number_field(sep, true)?;
    cursor.expect_newline()?;

    for _ in 0..num_histories {
        branch.histories.push(parse_branch_history(cursor)?);
    }
    Ok(branch)
}

/// `<mispreds> <branches> <length>` followed by `length` lines of `<from> <to>`
fn parse_branch_history<'a>(cursor: &mut Cursor<'a>) -> Result<BranchHistory<'a>> {
    let sep = cursor.separator();
    let mispreds = cursor.parse_number_field(sep, false)?;
    let branches = cursor.parse_number_field(sep, false)?;
    let length = cursor.parse_number_field(sep, true)?;
    cursor.expect_newline()?;

    let mut context = Vec::new();
    for _ in 0..length {
        let from = parse_location(cursor, sep, false, false)?;
        let to = parse_location(cursor, sep, true, false)?;
        cursor.expect_newline()?;
        context.push((from, to));
    }
    Ok(BranchHistory {
        mispreds,
        branches,
        context,
    })
}

/// `<pc location> <address location> <count>`
pub(crate) fn parse_mem_info<'a>(cursor: &mut Cursor<'a>) -> Result<MemInfo<'a>> {
    let sep = cursor.separator();
    let offset = parse_location(cursor, sep, false, true)?;
    let addr = parse_location(cursor, sep, false, true)?;
    let count = cursor.parse_number_field(sep, true)?;
    cursor.expect_newline()?;
    Ok(MemInfo::new(offset, addr, count.unsigned_abs()))
}

/// `<location> <count>`
pub(crate) fn parse_sample_info<'a>(cursor: &mut Cursor<'a>) -> Result<SampleInfo<'a>> {
    let sep = cursor.separator();
    let loc = parse_location(cursor, sep, false, false)?;
    let hits = cursor.parse_number_field(sep, true)?;
    cursor.expect_newline()?;
    Ok(SampleInfo::new(loc, hits))
}
