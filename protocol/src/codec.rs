//! Commitment codec.
//!
//! The chain stores commitment info as a list of data fields, each a small
//! tagged union. The tag of a raw field encodes its byte length, so a 38-byte
//! peer identifier is written as variant `Raw38`:
//!
//! ```text
//! compact(field_count) || tag || body || tag || body ...
//!
//! tag 0          None               (no body)
//! tag 1..=129    Raw(tag - 1 bytes)
//! tag 130..=133  32-byte hash       (BlakeTwo256, Sha256, Keccak256, ShaThree256)
//! ```
//!
//! `compact` is the SCALE compact integer: the two low bits of the first byte
//! select a 1, 2 or 4 byte little-endian encoding of `n << 2`.
//!
//! Decoding never panics on hostile input; [`decode`] maps every failure to
//! `None` and logs it so callers can simply skip the record.

use warden_types::peer::PEER_ID_LEN;
use warden_types::ClusterPeerId;

use crate::CodecError;

/// Largest raw variant the chain defines.
pub const MAX_RAW_LEN: usize = 128;

/// Upper bound on fields accepted while decoding.
pub const MAX_FIELDS: usize = 16;

const TAG_NONE: u8 = 0;
const TAG_RAW_MAX: u8 = MAX_RAW_LEN as u8 + 1;
const TAG_BLAKE_TWO_256: u8 = 130;
const TAG_SHA_256: u8 = 131;
const TAG_KECCAK_256: u8 = 132;
const TAG_SHA_THREE_256: u8 = 133;

/// One data field of a commitment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitmentField {
    None,
    Raw(Vec<u8>),
    BlakeTwo256([u8; 32]),
    Sha256([u8; 32]),
    Keccak256([u8; 32]),
    ShaThree256([u8; 32]),
}

/// The decoded commitment info: an ordered list of fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitmentInfo {
    pub fields: Vec<CommitmentField>,
}

impl CommitmentInfo {
    /// Serialize to the on-chain byte layout.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        write_compact(&mut out, self.fields.len() as u32);
        for field in &self.fields {
            match field {
                CommitmentField::None => out.push(TAG_NONE),
                CommitmentField::Raw(bytes) => {
                    if bytes.len() > MAX_RAW_LEN {
                        return Err(CodecError::RawTooLong(bytes.len()));
                    }
                    out.push(raw_tag(bytes.len()));
                    out.extend_from_slice(bytes);
                }
                CommitmentField::BlakeTwo256(h) => push_hash(&mut out, TAG_BLAKE_TWO_256, h),
                CommitmentField::Sha256(h) => push_hash(&mut out, TAG_SHA_256, h),
                CommitmentField::Keccak256(h) => push_hash(&mut out, TAG_KECCAK_256, h),
                CommitmentField::ShaThree256(h) => push_hash(&mut out, TAG_SHA_THREE_256, h),
            }
        }
        Ok(out)
    }

    /// Parse the on-chain byte layout. The whole input must be consumed.
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(payload);
        let count = reader.compact()? as usize;
        if count > MAX_FIELDS {
            return Err(CodecError::TooManyFields(count));
        }

        let mut fields = Vec::with_capacity(count);
        for _ in 0..count {
            let tag = reader.byte()?;
            let field = match tag {
                TAG_NONE => CommitmentField::None,
                1..=TAG_RAW_MAX => CommitmentField::Raw(reader.take((tag - 1) as usize)?.to_vec()),
                TAG_BLAKE_TWO_256 => CommitmentField::BlakeTwo256(reader.hash()?),
                TAG_SHA_256 => CommitmentField::Sha256(reader.hash()?),
                TAG_KECCAK_256 => CommitmentField::Keccak256(reader.hash()?),
                TAG_SHA_THREE_256 => CommitmentField::ShaThree256(reader.hash()?),
                other => return Err(CodecError::UnknownTag(other)),
            };
            fields.push(field);
        }

        if reader.remaining() > 0 {
            return Err(CodecError::TrailingBytes(reader.remaining()));
        }
        Ok(Self { fields })
    }
}

/// Encode a peer identifier as a single `Raw38` field.
pub fn encode(peer_id: &ClusterPeerId) -> Vec<u8> {
    let bytes = peer_id.as_bytes();
    let mut out = Vec::with_capacity(2 + bytes.len());
    write_compact(&mut out, 1);
    out.push(raw_tag(bytes.len()));
    out.extend_from_slice(bytes);
    out
}

/// Extract the peer identifier from the first field of a commitment payload.
pub fn decode_peer_id(payload: &[u8]) -> Result<ClusterPeerId, CodecError> {
    let info = CommitmentInfo::decode(payload)?;
    let first = info.fields.into_iter().next().ok_or(CodecError::Empty)?;
    let CommitmentField::Raw(bytes) = first else {
        return Err(CodecError::NotRaw);
    };
    let actual = bytes.len();
    ClusterPeerId::from_bytes(bytes).map_err(|_| CodecError::WrongLength {
        expected: PEER_ID_LEN,
        actual,
    })
}

/// Like [`decode_peer_id`] but logs and swallows the error: `None` means
/// "skip this record".
pub fn decode(payload: &[u8]) -> Option<ClusterPeerId> {
    match decode_peer_id(payload) {
        Ok(peer_id) => Some(peer_id),
        Err(e) => {
            tracing::warn!(error = %e, payload_len = payload.len(), "malformed commitment payload");
            None
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────────

fn raw_tag(len: usize) -> u8 {
    (len + 1) as u8
}

fn push_hash(out: &mut Vec<u8>, tag: u8, hash: &[u8; 32]) {
    out.push(tag);
    out.extend_from_slice(hash);
}

fn write_compact(out: &mut Vec<u8>, n: u32) {
    match n {
        0..=0x3f => out.push((n as u8) << 2),
        0x40..=0x3fff => out.extend_from_slice(&(((n as u16) << 2) | 0b01).to_le_bytes()),
        _ if n <= 0x3fff_ffff => out.extend_from_slice(&((n << 2) | 0b10).to_le_bytes()),
        // Big-integer mode; never needed for a field count.
        _ => {
            out.push(0b11);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Truncated {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn hash(&mut self) -> Result<[u8; 32], CodecError> {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.take(32)?);
        Ok(out)
    }

    fn compact(&mut self) -> Result<u32, CodecError> {
        let first = self.byte()?;
        match first & 0b11 {
            0b00 => Ok(u32::from(first >> 2)),
            0b01 => {
                let second = self.byte()?;
                Ok(u32::from(u16::from_le_bytes([first, second]) >> 2))
            }
            0b10 => {
                let rest = self.take(3)?;
                Ok(u32::from_le_bytes([first, rest[0], rest[1], rest[2]]) >> 2)
            }
            _ => Err(CodecError::UnsupportedCompact),
        }
    }
}
