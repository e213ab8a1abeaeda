//! Instruction word encoding: `opcode:8 | payload:24`, little-endian
//! independent since it only ever exists as a `u32` in memory, never
//! serialized. The payload is a signed offset (bias `2^23`) for
//! `TEST`/`JUMP`/`FRAME`/`CONTI` and an unsigned index otherwise.

const PAYLOAD_BITS: u32 = 24;
const PAYLOAD_MASK: u32 = (1 << PAYLOAD_BITS) - 1;
const OFFSET_BIAS: i32 = 1 << (PAYLOAD_BITS - 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Nop = 0,
    Refer = 1,
    Const = 2,
    Close = 3,
    Test = 4,
    Jump = 5,
    Assign = 6,
    Define = 7,
    Argument = 8,
    Frame = 9,
    Conti = 10,
    Apply = 11,
    Return = 12,
    Halt = 13,
}

impl Opcode {
    pub fn takes_offset(self) -> bool {
        matches!(self, Opcode::Test | Opcode::Jump | Opcode::Frame | Opcode::Conti)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        Ok(match byte {
            0 => Opcode::Nop,
            1 => Opcode::Refer,
            2 => Opcode::Const,
            3 => Opcode::Close,
            4 => Opcode::Test,
            5 => Opcode::Jump,
            6 => Opcode::Assign,
            7 => Opcode::Define,
            8 => Opcode::Argument,
            9 => Opcode::Frame,
            10 => Opcode::Conti,
            11 => Opcode::Apply,
            12 => Opcode::Return,
            13 => Opcode::Halt,
            other => return Err(other),
        })
    }
}

pub fn pack(op: Opcode, payload: u32) -> u32 {
    ((op as u32) << PAYLOAD_BITS) | (payload & PAYLOAD_MASK)
}

pub fn pack_offset(op: Opcode, offset: i32) -> u32 {
    pack(op, (offset + OFFSET_BIAS) as u32)
}

/// Splits a packed word back into its opcode byte and raw 24-bit payload.
/// Returns the raw opcode byte on failure so the caller can report which
/// unrecognized value it saw.
pub fn unpack(word: u32) -> Result<(Opcode, u32), u8> {
    let op = ((word >> PAYLOAD_BITS) & 0xFF) as u8;
    let payload = word & PAYLOAD_MASK;
    Ok((Opcode::try_from(op)?, payload))
}

pub fn unpack_offset(payload: u32) -> i32 {
    payload as i32 - OFFSET_BIAS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_an_index_payload() {
        let word = pack(Opcode::Const, 12345);
        let (op, payload) = unpack(word).unwrap();
        assert_eq!(op, Opcode::Const);
        assert_eq!(payload, 12345);
    }

    #[test]
    fn roundtrips_a_negative_offset() {
        let word = pack_offset(Opcode::Jump, -7);
        let (op, payload) = unpack(word).unwrap();
        assert_eq!(op, Opcode::Jump);
        assert_eq!(unpack_offset(payload), -7);
    }

    #[test]
    fn roundtrips_a_positive_offset() {
        let word = pack_offset(Opcode::Test, 42);
        let (_, payload) = unpack(word).unwrap();
        assert_eq!(unpack_offset(payload), 42);
    }

    #[test]
    fn unknown_opcode_byte_is_rejected() {
        let word = (250u32) << 24;
        assert_eq!(unpack(word), Err(250));
    }
}
