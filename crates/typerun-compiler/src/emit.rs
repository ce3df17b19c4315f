//! Image serialization — the final linking pass.
//!
//! Lays out storage, source maps, the subroutine table and the code segments
//! into one self-contained byte image. All subroutine and storage indices
//! written during lowering are already image addresses (storage) or resolve
//! positionally (subroutine order), so the only fix-up is the leading `Jump`
//! over the storage block.

use typerun_bytecode::{Op, write_u16, write_u32, write_u64};
use typerun_core::content_hash;

use crate::program::Program;

/// Bytes of a subroutine record in the image header.
const SUBROUTINE_RECORD_SIZE: u32 = 1 + 4 + 4 + 1;
/// Bytes per source-map entry.
const SOURCE_MAP_ENTRY_SIZE: u32 = 4 * 3;

/// Serialize a compiled program into its byte image.
pub fn build(program: &Program) -> Vec<u8> {
    let mut bin: Vec<u8> = Vec::new();

    // Jump + target, patched below once the storage size is known.
    let mut address: u32 = 5;
    bin.push(Op::Jump as u8);
    push_u32(&mut bin, 0);

    for item in program.storage() {
        address += 8 + 2 + item.len() as u32;
    }
    write_u32(&mut bin, 1, address);

    for item in program.storage() {
        push_u64(&mut bin, content_hash(item));
        push_u16(&mut bin, item.len() as u16);
        bin.extend_from_slice(item.as_bytes());
    }

    let mut source_map_size: u32 = 0;
    for routine in program.subroutines() {
        source_map_size += routine.source_map().len() as u32 * SOURCE_MAP_ENTRY_SIZE;
    }
    source_map_size += program.main_source_map().len() as u32 * SOURCE_MAP_ENTRY_SIZE;

    bin.push(Op::SourceMap as u8);
    push_u32(&mut bin, source_map_size);
    address += 1 + 4 + source_map_size;

    // Local ips become absolute by adding each segment's code offset, which
    // starts right after the subroutine table and Main record.
    let mut bytecode_pos_offset = address;
    bytecode_pos_offset += program.subroutines().len() as u32 * SUBROUTINE_RECORD_SIZE;
    bytecode_pos_offset += 1 + 4;

    for routine in program.subroutines() {
        for entry in routine.source_map().entries() {
            push_u32(&mut bin, bytecode_pos_offset + entry.bytecode_pos);
            push_u32(&mut bin, entry.source_pos);
            push_u32(&mut bin, entry.source_end);
        }
        bytecode_pos_offset += routine.ops().len() as u32;
    }
    for entry in program.main_source_map().entries() {
        push_u32(&mut bin, bytecode_pos_offset + entry.bytecode_pos);
        push_u32(&mut bin, entry.source_pos);
        push_u32(&mut bin, entry.source_end);
    }

    address += 1 + 4;
    address += program.subroutines().len() as u32 * SUBROUTINE_RECORD_SIZE;

    // Subroutine metadata follows the storage and source map.
    for routine in program.subroutines() {
        bin.push(Op::Subroutine as u8);
        push_u32(&mut bin, routine.name_address());
        push_u32(&mut bin, address);
        bin.push(routine.flags());
        address += routine.ops().len() as u32;
    }

    // The Main record marks the end of the header.
    bin.push(Op::Main as u8);
    push_u32(&mut bin, address);

    for routine in program.subroutines() {
        bin.extend_from_slice(routine.ops());
    }
    bin.extend_from_slice(program.main_ops());
    bin.push(Op::Halt as u8);

    bin
}

fn push_u16(bin: &mut Vec<u8>, v: u16) {
    let at = bin.len();
    write_u16(bin, at, v);
}

fn push_u32(bin: &mut Vec<u8>, v: u32) {
    let at = bin.len();
    write_u32(bin, at, v);
}

fn push_u64(bin: &mut Vec<u8>, v: u64) {
    let at = bin.len();
    write_u64(bin, at, v);
}
