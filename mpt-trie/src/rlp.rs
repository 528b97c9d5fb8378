//! # RLP list codec
//!
//! Nodes are RLP lists whose items are either byte strings or, for inlined
//! children, complete embedded lists. This module splits a node into those
//! items and joins them back, leaving the header arithmetic to `alloy-rlp`.

use alloy_rlp::{Encodable, Header};

use crate::error::{Result, TrieError};

/// One item of an encoded node list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Item<'a> {
    /// Payload of an RLP string
    String(&'a [u8]),
    /// Full encoding (header included) of an embedded RLP list
    List(&'a [u8]),
}

/// Split an encoded list into its items.
///
/// The whole input must be consumed by the outer list.
pub(crate) fn decode_list(data: &[u8]) -> Result<Vec<Item<'_>>> {
    let mut buf = data;
    let header = Header::decode(&mut buf)?;
    if !header.list {
        return Err(TrieError::MalformedNode("expected an RLP list".to_string()));
    }
    if buf.len() != header.payload_length {
        return Err(TrieError::MalformedNode(format!(
            "list payload is {} bytes, header declares {}",
            buf.len(),
            header.payload_length
        )));
    }

    let mut items = Vec::with_capacity(17);
    let mut rest = buf;
    while !rest.is_empty() {
        let start = rest;
        let item = Header::decode(&mut rest)?;
        let header_len = start.len() - rest.len();
        let end = header_len + item.payload_length;
        if end > start.len() {
            return Err(alloy_rlp::Error::InputTooShort.into());
        }

        items.push(if item.list {
            Item::List(&start[..end])
        } else {
            Item::String(&start[header_len..end])
        });
        rest = &start[end..];
    }

    Ok(items)
}

/// Join items into an encoded list
pub(crate) fn encode_list(items: &[Item<'_>]) -> Vec<u8> {
    let payload_length: usize = items
        .iter()
        .map(|item| match *item {
            Item::String(bytes) => bytes.length(),
            Item::List(raw) => raw.len(),
        })
        .sum();

    let header = Header {
        list: true,
        payload_length,
    };
    let mut out = Vec::with_capacity(header.length() + payload_length);
    header.encode(&mut out);
    for item in items {
        match *item {
            Item::String(bytes) => bytes.encode(&mut out),
            Item::List(raw) => out.extend_from_slice(raw),
        }
    }

    out
}
