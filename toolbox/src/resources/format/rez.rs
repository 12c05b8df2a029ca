//! Rez resource container: little-endian header section, big-endian map
//! section. The two different byte orders in one file don't fit the
//! single-order [`libcommon::Reader`] cleanly, so this driver reads the raw
//! slice directly with explicit-endian primitives instead.

use std::collections::BTreeMap;
use std::convert::TryInto;

use byteorder::{BigEndian, ByteOrder as ByteOrderExt, LittleEndian};
use libcommon::Block;

use crate::resources::container::File;
use crate::resources::id::OsType;
use crate::resources::{Error, Result};

const MAGIC: &[u8; 4] = b"BRGR";
const MAP_MARKER: &[u8; 13] = b"resource.map\0";

fn read_u32_le(bytes: &[u8], pos: usize) -> u32 {
    LittleEndian::read_u32(&bytes[pos..pos + 4])
}

fn read_u32_be(bytes: &[u8], pos: usize) -> u32 {
    BigEndian::read_u32(&bytes[pos..pos + 4])
}

fn read_i16_be(bytes: &[u8], pos: usize) -> i16 {
    BigEndian::read_i16(&bytes[pos..pos + 2])
}

#[must_use]
pub fn sniff(block: &Block) -> bool {
    block.len() >= 12 && &block.as_slice()[0..4] == MAGIC
}

pub fn parse(block: &Block) -> Result<File> {
    let bytes = block.as_slice();
    if bytes.len() < 12 || &bytes[0..4] != MAGIC {
        return Err(Error::NotAResourceFile);
    }
    let version = read_u32_le(bytes, 4);
    if version != 1 {
        return Err(Error::MalformedResourceFile(format!("unsupported rez version {}", version)));
    }
    let header_length = read_u32_le(bytes, 8) as usize;
    let header_base = 12usize;
    if header_base + header_length > bytes.len() {
        return Err(Error::MalformedResourceFile("rez header length out of range".into()));
    }

    let _unknown = read_u32_le(bytes, header_base);
    let _first_index = read_u32_le(bytes, header_base + 4);
    let entry_count = read_u32_le(bytes, header_base + 8) as usize;

    let mut entries = Vec::with_capacity(entry_count);
    let mut pos = header_base + 12;
    for _ in 0..entry_count {
        let data_offset = read_u32_le(bytes, pos) as usize;
        let data_size = read_u32_le(bytes, pos + 4) as usize;
        let _unknown = read_u32_le(bytes, pos + 8);
        entries.push((data_offset, data_size));
        pos += 12;
    }

    let marker_pos = pos;
    if bytes.len() < marker_pos + MAP_MARKER.len() || &bytes[marker_pos..marker_pos + MAP_MARKER.len()] != MAP_MARKER {
        return Err(Error::MalformedResourceFile("missing resource.map marker".into()));
    }

    let map_base = marker_pos + MAP_MARKER.len();
    let _map_unknown = read_u32_be(bytes, map_base);
    let type_count = read_u32_be(bytes, map_base + 4) as usize;

    let mut file = File::new();
    let mut type_pos = map_base + 8;

    for _ in 0..type_count {
        if type_pos + 12 > bytes.len() {
            return Err(Error::MalformedResourceFile("rez type table out of range".into()));
        }
        let code = OsType::from(read_u32_be(bytes, type_pos));
        let first_type_offset = read_u32_be(bytes, type_pos + 4) as usize;
        let count = read_u32_be(bytes, type_pos + 8) as usize;
        type_pos += 12;

        let mut resource_pos = map_base + first_type_offset;
        for _ in 0..count {
            if resource_pos + 266 > bytes.len() {
                return Err(Error::MalformedResourceFile("rez resource table out of range".into()));
            }
            let index = read_u32_be(bytes, resource_pos) as usize;
            let _entry_code = read_u32_be(bytes, resource_pos + 4);
            let id = i64::from(read_i16_be(bytes, resource_pos + 8));
            let name_bytes = &bytes[resource_pos + 10..resource_pos + 266];
            let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
            let name = if name_end == 0 { None } else { Some(libcommon::encodings::MAC_ROMAN.decode(&name_bytes[..name_end])) };
            resource_pos += 266;

            let (data_offset, data_size) = *entries.get(index).ok_or_else(|| Error::MalformedResourceFile(format!("rez entry index {} out of range", index)))?;
            if data_offset + data_size > bytes.len() {
                return Err(Error::MalformedResourceFile("rez entry data out of range".into()));
            }
            let data = bytes[data_offset..data_offset + data_size].to_vec();

            file.add_resource(code, id, name, data, BTreeMap::new());
        }
    }

    Ok(file)
}

pub fn write(file: &File) -> Result<Block> {
    let mut le_header = Vec::new();
    le_header.extend_from_slice(MAGIC);
    le_header.extend_from_slice(&1u32.to_le_bytes());
    // header_length backpatched below.
    le_header.extend_from_slice(&0u32.to_le_bytes());

    let header_body_start = le_header.len();
    le_header.extend_from_slice(&0u32.to_le_bytes()); // unknown
    le_header.extend_from_slice(&0u32.to_le_bytes()); // first_index

    // Pass 1: collect data sizes (and ordering) without yet knowing absolute offsets.
    let mut sizes: Vec<u32> = Vec::new();
    let mut entry_index_of: Vec<Vec<usize>> = Vec::new();
    for bucket in file.types() {
        let mut indices = Vec::new();
        for resource in bucket.resources() {
            sizes.push(resource.data().len() as u32);
            indices.push(sizes.len() - 1);
        }
        entry_index_of.push(indices);
    }

    let entry_count = sizes.len() as u32;
    let header_length = (8 + sizes.len() * 12) as u32; // unknown + first_index + entry_count field is outside this count
    le_header.extend_from_slice(&entry_count.to_le_bytes());

    // magic(4) + version(4) + header_length field(4) + header body (unknown+first_index+entry_count+entries)
    let data_base = 4 + 4 + 4 + 8 + 4 + sizes.len() * 12;
    let mut entries: Vec<(u32, u32)> = Vec::new();
    let mut running = data_base as u32;
    for &size in &sizes {
        entries.push((running, size));
        running += size;
    }

    for (offset, size) in &entries {
        le_header.extend_from_slice(&offset.to_le_bytes());
        le_header.extend_from_slice(&size.to_le_bytes());
        le_header.extend_from_slice(&0u32.to_le_bytes());
    }
    le_header[8..12].copy_from_slice(&header_length.to_le_bytes());

    let mut out = Vec::new();
    out.extend_from_slice(&le_header);
    for bucket in file.types() {
        for resource in bucket.resources() {
            out.extend_from_slice(resource.data());
        }
    }
    out.extend_from_slice(MAP_MARKER);

    let mut map = Vec::new();
    map.extend_from_slice(&0u32.to_be_bytes()); // unknown
    map.extend_from_slice(&(file.type_codes().count() as u32).to_be_bytes());

    let header_table_start = map.len();
    for _ in file.types() {
        map.extend_from_slice(&[0; 4]);
        map.extend_from_slice(&0u32.to_be_bytes());
        map.extend_from_slice(&0u32.to_be_bytes());
    }

    let mut type_headers = Vec::new();
    for (t, bucket) in file.types().enumerate() {
        let first_type_offset = map.len() as u32;
        for (i, resource) in bucket.resources().iter().enumerate() {
            let index = entry_index_of[t][i] as u32;
            map.extend_from_slice(&index.to_be_bytes());
            map.extend_from_slice(bucket.code().as_bytes());
            map.extend_from_slice(&(resource.id() as i16).to_be_bytes());
            let mut name_field = vec![0u8; 256];
            if let Some(name) = resource.name() {
                let encoded = libcommon::encodings::MAC_ROMAN.encode(name);
                let len = encoded.len().min(255);
                name_field[..len].copy_from_slice(&encoded[..len]);
            }
            map.extend_from_slice(&name_field);
        }
        type_headers.push((bucket.code(), first_type_offset, bucket.len() as u32));
        let _ = t;
    }

    map[header_table_start..header_table_start + type_headers.len() * 12].copy_from_slice(&{
        let mut bytes = Vec::new();
        for (code, first_type_offset, count) in &type_headers {
            bytes.extend_from_slice(code.as_bytes());
            bytes.extend_from_slice(&first_type_offset.to_be_bytes());
            bytes.extend_from_slice(&count.to_be_bytes());
        }
        bytes
    });

    out.extend_from_slice(&map);

    Ok(Block::from_vec(out, libcommon::ByteOrder::Big))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_marker_bytes_match_apple_literal() {
        assert_eq!(MAP_MARKER.len(), 13);
        assert_eq!(&MAP_MARKER[..12], b"resource.map");
    }
}
