//! Bytecode contract between the typerun compiler and VM.
//!
//! This crate owns everything both sides must agree on:
//! - the opcode table and each opcode's parameter width (`op`)
//! - little-endian parameter encoding and back-patching (`encode`)
//! - the layout of a compiled image and its decoded view (`image`)
//! - a human-readable disassembly for debugging (`dump`)

mod encode;
mod image;
mod op;

pub mod dump;

pub use encode::{
    read_i32, read_u16, read_u32, read_u64, write_i32, write_u16, write_u32, write_u64,
};
pub use image::{Image, ImageError, SourceMapEntry, StorageEntry, SubroutineRecord};
pub use op::{ErrorCode, Op, param_size, visit_ops};
