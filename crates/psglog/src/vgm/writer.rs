//! Operation serializer.
//!
//! The inverse of `parser::parse_commands`, except that waits are written
//! in their most compact form: a `WaitExact(735)` comes out as `0x62`, a
//! `WaitExact(3)` as `0x72`, and a zero-length wait not at all.
use crate::vgm::command::{
    Instance, MAX_WAIT_SAMPLES, Operation, WAIT_50HZ_SAMPLES, WAIT_60HZ_SAMPLES, opcode,
};

/// Append the bytes of a single wait of `samples` (at most 65535).
fn encode_wait(samples: u32, out: &mut Vec<u8>) {
    debug_assert!(samples <= MAX_WAIT_SAMPLES);
    match samples {
        0 => {}
        WAIT_60HZ_SAMPLES => out.push(opcode::WAIT_735),
        WAIT_50HZ_SAMPLES => out.push(opcode::WAIT_882),
        1..=16 => out.push(opcode::WAIT_N_BASE | (samples - 1) as u8),
        _ => {
            out.push(opcode::WAIT_SAMPLES);
            out.extend_from_slice(&(samples as u16).to_le_bytes());
        }
    }
}

/// Append the bytes of `op`.
pub fn encode_operation(op: &Operation, out: &mut Vec<u8>) {
    match op {
        Operation::Write(w) => {
            let code = match w.instance {
                Instance::Primary => opcode::PSG_WRITE,
                Instance::Secondary => opcode::PSG_WRITE_SECONDARY,
            };
            out.extend_from_slice(&[code, w.value]);
        }
        Operation::WaitExact(_)
        | Operation::WaitFixed60
        | Operation::WaitFixed50
        | Operation::WaitSmall(_) => encode_wait(op.wait_samples(), out),
        Operation::End => out.push(opcode::END_OF_DATA),
        Operation::GameGearStereo(v) => out.extend_from_slice(&[opcode::GAME_GEAR_STEREO, *v]),
        Operation::ForeignWrite {
            opcode,
            register,
            value,
        } => out.extend_from_slice(&[*opcode, *register, *value]),
        Operation::DacWriteWait(n) => out.push(opcode::DAC_WRITE_WAIT_BASE | (n & 0x0F)),
        Operation::PcmSeek(d) => {
            out.push(opcode::PCM_SEEK);
            out.extend_from_slice(&d.to_le_bytes());
        }
    }
}

/// Serialize a whole operation list.
pub fn encode_operations(ops: &[Operation]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ops.len() * 2);
    for op in ops {
        encode_operation(op, &mut out);
    }
    out
}

/// Wait operations covering a gap of `samples`.
///
/// Exactly one 60 Hz or 50 Hz frame becomes the matching fixed wait;
/// anything else is split into `WaitExact` chunks of at most 65535 samples.
pub fn wait_operations(samples: u64) -> Vec<Operation> {
    match samples {
        0 => Vec::new(),
        s if s == WAIT_60HZ_SAMPLES as u64 => vec![Operation::WaitFixed60],
        s if s == WAIT_50HZ_SAMPLES as u64 => vec![Operation::WaitFixed50],
        _ => {
            let mut ops = Vec::new();
            let mut remaining = samples;
            while remaining > 0 {
                let chunk = remaining.min(MAX_WAIT_SAMPLES as u64);
                ops.push(Operation::WaitExact(chunk as u16));
                remaining -= chunk;
            }
            ops
        }
    }
}
