//! Byte-order normalization of serialized envelopes.
//!
//! Every full envelope passes through [`to_network_order`] before it is sent
//! and through [`from_network_order`] after it is received. The transform is
//! applied to the whole buffer. A serialized envelope is a sequence of single
//! bytes, and single bytes are identical in every byte order, so the
//! network-order form of the buffer is the buffer itself. Peers that apply the
//! transform interoperate with this node either way.

use bytes::{BufMut, Bytes, BytesMut};

/// Writes `buf` in network (big-endian) byte order.
#[must_use]
pub fn to_network_order(buf: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(buf.len());
    for byte in buf {
        out.put_u8(*byte);
    }
    out.freeze()
}

/// Reads `buf` back from network (big-endian) byte order.
///
/// Exact inverse of [`to_network_order`].
#[must_use]
pub fn from_network_order(buf: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(buf.len());
    for byte in buf {
        out.put_u8(u8::from_be_bytes([*byte]));
    }
    out.freeze()
}
