//! Human-readable bytecode dump for debugging and tests.

use std::fmt::Write as _;

use crate::encode::{read_i32, read_u16, read_u32};
use crate::image::Image;
use crate::op::{Op, param_size};

/// Render an ops buffer as one line per instruction: `ip op params`.
pub fn dump_ops(ops: &[u8]) -> String {
    let mut out = String::new();
    let mut i = 0usize;
    while i < ops.len() {
        let op = Op::from_u8(ops[i]);
        write!(out, "{i:>4} {op:?}").unwrap();
        match op {
            Op::Call | Op::TailCall => {
                write!(
                    out,
                    " routine={} type_args={}",
                    read_u32(ops, i + 1),
                    read_u16(ops, i + 5)
                )
                .unwrap();
            }
            Op::Loads => {
                write!(
                    out,
                    " frame={} symbol={}",
                    read_u16(ops, i + 1),
                    read_u16(ops, i + 3)
                )
                .unwrap();
            }
            Op::Jump | Op::JumpCondition | Op::FrameReturnJump => {
                write!(out, " rel={}", read_i32(ops, i + 1)).unwrap();
            }
            Op::Distribute | Op::Main | Op::SourceMap => {
                write!(out, " {}", read_u32(ops, i + 1)).unwrap();
            }
            Op::StringLiteral
            | Op::NumberLiteral
            | Op::BigIntLiteral
            | Op::Parameter
            | Op::Set
            | Op::FunctionRef
            | Op::TypeArgumentDefault => {
                write!(out, " addr={}", read_u32(ops, i + 1)).unwrap();
            }
            Op::Instantiate | Op::CallExpression => {
                write!(out, " count={}", read_u16(ops, i + 1)).unwrap();
            }
            Op::Error => {
                write!(out, " code={}", read_u16(ops, i + 1)).unwrap();
            }
            Op::Subroutine => {
                write!(
                    out,
                    " name={} code={} flags={}",
                    read_u32(ops, i + 1),
                    read_u32(ops, i + 5),
                    ops[i + 9]
                )
                .unwrap();
            }
            _ => {}
        }
        out.push('\n');
        i += 1 + param_size(op);
    }
    out
}

/// Render a full decoded image: storage, subroutine table, code segments.
pub fn dump_image(image: &Image) -> String {
    let mut out = String::new();

    writeln!(out, "[storage]").unwrap();
    for (address, entry) in &image.storage {
        writeln!(out, "{address:>4} {:016x} {:?}", entry.hash, entry.text).unwrap();
    }

    writeln!(out, "\n[subroutines]").unwrap();
    for (i, record) in image.subroutines.iter().enumerate() {
        let name = image
            .storage_text(record.name_address)
            .unwrap_or("<inline>");
        writeln!(
            out,
            "#{i} {name} code={} flags={}",
            record.code_address, record.flags
        )
        .unwrap();
        out.push_str(&dump_ops(image.subroutine_code(i)));
    }

    writeln!(out, "\n[main] code={}", image.main_address).unwrap();
    out.push_str(&dump_ops(image.main_code()));

    out
}
