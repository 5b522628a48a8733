//! Versioned binary record format for nodes and edges.
//!
//! Everything is little-endian. Strings are a `u32` byte length followed by
//! UTF-8 bytes, no terminator. Every record starts with a one-byte format
//! version; decoding any other version fails. Records are not
//! self-describing beyond that byte: whether a page holds a node or an edge
//! is knowledge the index (or a scan heuristic) supplies.
//!
//! Layout:
//!
//! ```text
//! node: version:u8 id:i64 active:u8 label_count:u32 (label string)*
//!       prop_count:u32 (property)*
//! edge: version:u8 id:i64 active:u8 type:string source:i64 target:i64
//!       prop_count:u32 (property)*
//! property: key:string tag:u8 value   (tag 0 = i64, 1 = string, 2 = u8 bool)
//! ```

#[cfg(test)]
mod tests;

use bytes::{Buf, BufMut};
use common::{Edge, EdgeId, KiteError, KiteResult, Node, NodeId, Property};
use types::Value;

/// Current record format version, written as the first byte of every record.
pub const FORMAT_VERSION: u8 = 1;

const TAG_INT: u8 = 0;
const TAG_STR: u8 = 1;
const TAG_BOOL: u8 = 2;

/// Serialize a node record.
pub fn encode_node(node: &Node) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    buf.put_u8(FORMAT_VERSION);
    buf.put_i64_le(node.id.0);
    buf.put_u8(node.active as u8);
    buf.put_u32_le(node.labels.len() as u32);
    for label in &node.labels {
        put_string(&mut buf, label);
    }
    put_properties(&mut buf, &node.properties);
    buf
}

/// Serialize an edge record.
pub fn encode_edge(edge: &Edge) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    buf.put_u8(FORMAT_VERSION);
    buf.put_i64_le(edge.id.0);
    buf.put_u8(edge.active as u8);
    put_string(&mut buf, &edge.ty);
    buf.put_i64_le(edge.source.0);
    buf.put_i64_le(edge.target.0);
    put_properties(&mut buf, &edge.properties);
    buf
}

/// Deserialize a node record from the front of `data`, returning the node
/// and the number of bytes consumed.
pub fn decode_node(data: &[u8]) -> KiteResult<(Node, usize)> {
    let mut buf = data;
    read_version(&mut buf)?;
    let id = read_id(&mut buf)?;
    let active = read_active(&mut buf)?;

    let label_count = read_u32(&mut buf)?;
    let mut labels = Vec::with_capacity(label_count.min(16) as usize);
    for _ in 0..label_count {
        labels.push(read_string(&mut buf)?);
    }

    let properties = read_properties(&mut buf)?;
    let node = Node {
        id: NodeId(id),
        active,
        labels,
        properties,
    };
    Ok((node, data.len() - buf.remaining()))
}

/// Deserialize an edge record from the front of `data`, returning the edge
/// and the number of bytes consumed.
pub fn decode_edge(data: &[u8]) -> KiteResult<(Edge, usize)> {
    let mut buf = data;
    read_version(&mut buf)?;
    let id = read_id(&mut buf)?;
    let active = read_active(&mut buf)?;

    let ty = read_string(&mut buf)?;
    if ty.is_empty() {
        return Err(KiteError::Malformed("edge type is empty".into()));
    }
    let source = read_i64(&mut buf)?;
    let target = read_i64(&mut buf)?;
    if source < 1 || target < 1 {
        return Err(KiteError::Malformed(format!(
            "edge endpoints must be positive, got {source} -> {target}"
        )));
    }

    let properties = read_properties(&mut buf)?;
    let edge = Edge {
        id: EdgeId(id),
        active,
        ty,
        source: NodeId(source),
        target: NodeId(target),
        properties,
    };
    Ok((edge, data.len() - buf.remaining()))
}

fn put_string(buf: &mut Vec<u8>, s: &str) {
    buf.put_u32_le(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

fn put_properties(buf: &mut Vec<u8>, props: &[Property]) {
    buf.put_u32_le(props.len() as u32);
    for prop in props {
        put_string(buf, &prop.key);
        match &prop.value {
            Value::Int(i) => {
                buf.put_u8(TAG_INT);
                buf.put_i64_le(*i);
            }
            Value::Str(s) => {
                buf.put_u8(TAG_STR);
                put_string(buf, s);
            }
            Value::Bool(b) => {
                buf.put_u8(TAG_BOOL);
                buf.put_u8(*b as u8);
            }
        }
    }
}

fn read_version(buf: &mut &[u8]) -> KiteResult<()> {
    let version = read_u8(buf)?;
    if version != FORMAT_VERSION {
        return Err(KiteError::Malformed(format!(
            "unsupported record version {version}"
        )));
    }
    Ok(())
}

fn read_id(buf: &mut &[u8]) -> KiteResult<i64> {
    let id = read_i64(buf)?;
    if id < 1 {
        return Err(KiteError::Malformed(format!("record id {id} is not positive")));
    }
    Ok(id)
}

fn read_active(buf: &mut &[u8]) -> KiteResult<bool> {
    match read_u8(buf)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(KiteError::Malformed(format!(
            "active flag must be 0 or 1, got {other}"
        ))),
    }
}

fn read_properties(buf: &mut &[u8]) -> KiteResult<Vec<Property>> {
    let count = read_u32(buf)?;
    let mut props = Vec::with_capacity(count.min(64) as usize);
    for _ in 0..count {
        let key = read_string(buf)?;
        if key.is_empty() {
            return Err(KiteError::Malformed("property key is empty".into()));
        }
        let value = match read_u8(buf)? {
            TAG_INT => Value::Int(read_i64(buf)?),
            TAG_STR => Value::Str(read_string(buf)?),
            TAG_BOOL => match read_u8(buf)? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => {
                    return Err(KiteError::Malformed(format!(
                        "bool value must be 0 or 1, got {other}"
                    )));
                }
            },
            tag => {
                return Err(KiteError::Type(format!(
                    "unsupported property type tag {tag}"
                )));
            }
        };
        props.push(Property { key, value });
    }
    Ok(props)
}

fn read_u8(buf: &mut &[u8]) -> KiteResult<u8> {
    if buf.remaining() < 1 {
        return Err(exhausted());
    }
    Ok(buf.get_u8())
}

fn read_u32(buf: &mut &[u8]) -> KiteResult<u32> {
    if buf.remaining() < 4 {
        return Err(exhausted());
    }
    Ok(buf.get_u32_le())
}

fn read_i64(buf: &mut &[u8]) -> KiteResult<i64> {
    if buf.remaining() < 8 {
        return Err(exhausted());
    }
    Ok(buf.get_i64_le())
}

fn read_string(buf: &mut &[u8]) -> KiteResult<String> {
    let len = read_u32(buf)? as usize;
    if buf.remaining() < len {
        return Err(exhausted());
    }
    let bytes = buf[..len].to_vec();
    buf.advance(len);
    String::from_utf8(bytes)
        .map_err(|_| KiteError::Malformed("string is not valid UTF-8".into()))
}

fn exhausted() -> KiteError {
    KiteError::Malformed("buffer exhausted mid-record".into())
}
