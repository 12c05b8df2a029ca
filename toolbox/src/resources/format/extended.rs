//! Extended 64-bit resource fork layout: the same conceptual shape as the
//! classic layout, widened to 64-bit offsets/lengths/ids and carrying a
//! per-type attribute list so qualified buckets (e.g. `lang=en`) round-trip.

use std::collections::BTreeMap;

use libcommon::{Block, ByteOrder, Reader, Writer};

use crate::resources::container::File;
use crate::resources::id::OsTypeReadExt;
use crate::resources::{Error, Result};

const VERSION: u64 = 1;

struct Preamble {
    data_offset: u64,
    map_offset: u64,
    data_length: u64,
    map_length: u64,
}

fn read_preamble(reader: &mut Reader<'_>) -> Result<Preamble> {
    Ok(Preamble {
        data_offset: reader.read_quad()?,
        map_offset: reader.read_quad()?,
        data_length: reader.read_quad()?,
        map_length: reader.read_quad()?,
    })
}

#[must_use]
pub fn sniff(block: &Block) -> bool {
    if block.len() < 8 + 32 {
        return false;
    }
    let mut reader = Reader::new(block);
    match reader.read_quad() {
        Ok(v) if v == VERSION => (),
        _ => return false,
    }
    let preamble = match read_preamble(&mut reader) {
        Ok(p) => p,
        Err(_) => return false,
    };
    preamble.map_offset == preamble.data_offset + preamble.data_length
        && preamble.data_offset as u64 + preamble.data_length + preamble.map_length <= block.len() as u64
}

pub fn parse(block: &Block) -> Result<File> {
    let mut reader = Reader::new(block);
    let version = reader.read_quad()?;
    if version != VERSION {
        return Err(Error::MalformedResourceFile(format!("unsupported extended version {}", version)));
    }
    let preamble = read_preamble(&mut reader)?;
    if preamble.map_size_invalid(block.len() as u64) {
        return Err(Error::MalformedResourceFile("map size out of range".into()));
    }

    reader.set_position(preamble.map_offset as usize)?;
    let _attribute_list_offset = reader.read_quad()?;
    let type_list_offset = reader.read_quad()?;
    let name_list_offset = reader.read_quad()?;

    let type_list_base = preamble.map_offset as usize + type_list_offset as usize;
    let name_list_base = preamble.map_offset as usize + name_list_offset as usize;

    reader.set_position(type_list_base)?;
    let type_count = reader.read_quad()? + 1;

    let mut file = File::new();

    for _ in 0..type_count {
        let code = reader.read_os_type()?;
        let resource_count = reader.read_quad()? + 1;
        let first_resource_offset = reader.read_quad()?;
        let attribute_count = reader.read_quad()?;
        let attribute_list_offset = reader.read_quad()?;

        let mut attributes = BTreeMap::new();
        if attribute_count > 0 {
            let saved = reader.position();
            reader.set_position(preamble.map_offset as usize + attribute_list_offset as usize)?;
            for _ in 0..attribute_count {
                let name = reader.read_cstr(0)?;
                let value = reader.read_cstr(0)?;
                attributes.insert(name, value);
            }
            reader.set_position(saved)?;
        }

        let resource_list_base = type_list_base + first_resource_offset as usize;

        for i in 0..resource_count {
            reader.set_position(resource_list_base + i as usize * 29)?;
            let id = reader.read_signed_quad()?;
            let name_offset = reader.read_quad()?;
            let _attr = reader.read_byte()?;
            let data_offset = reader.read_quad()?;
            let _reserved = reader.read_long()?;

            let name = if name_offset == u64::MAX {
                None
            } else {
                let saved = reader.position();
                reader.set_position(name_list_base + name_offset as usize)?;
                let name = reader.read_pstr()?;
                reader.set_position(saved)?;
                Some(name)
            };

            let saved = reader.position();
            reader.set_position(preamble.data_offset as usize + data_offset as usize)?;
            let data_len = reader.read_quad()?;
            let data = reader.read_bytes(data_len as usize)?;
            reader.set_position(saved)?;

            file.add_resource(code, id, name, data, attributes.clone());
        }
    }

    Ok(file)
}

impl Preamble {
    fn map_size_invalid(&self, file_len: u64) -> bool {
        self.map_offset != self.data_offset + self.data_length
            || self.data_offset + self.data_length + self.map_length > file_len
    }
}

pub fn write(file: &File) -> Result<Block> {
    let mut writer = Writer::new(ByteOrder::Big);

    writer.write_quad(VERSION)?;
    writer.write_quad(0)?; // data_offset placeholder
    writer.write_quad(0)?; // map_offset placeholder
    writer.write_quad(0)?; // data_length placeholder
    writer.write_quad(0)?; // map_length placeholder

    let data_offset = writer.position() as u64;
    let mut data_offsets: Vec<Vec<u64>> = Vec::new();

    for bucket in file.types() {
        let mut offsets = Vec::new();
        for resource in bucket.resources() {
            offsets.push(writer.position() as u64 - data_offset);
            writer.write_quad(resource.data().len() as u64)?;
            writer.write_data(&Block::from_vec(resource.data().to_vec(), ByteOrder::Big))?;
        }
        data_offsets.push(offsets);
    }

    let data_length = writer.position() as u64 - data_offset;
    let map_offset = writer.position() as u64;

    writer.write_quad(0)?; // attribute_list_offset placeholder (unused at file level)
    let type_list_offset_pos = writer.position();
    writer.write_quad(0)?; // type_list_offset placeholder
    writer.write_quad(0)?; // name_list_offset placeholder

    let type_list_offset = writer.position() as u64 - map_offset;
    writer.write_quad(file.types().count().saturating_sub(1) as u64)?;

    // Reserve per-type headers; resource lists follow immediately after.
    let header_start = writer.position();
    for _ in file.types() {
        writer.write_raw(&[0; 4])?;
        writer.write_quad(0)?;
        writer.write_quad(0)?;
        writer.write_quad(0)?;
        writer.write_quad(0)?;
    }

    // Name offsets only depend on insertion order, not on where anything is
    // physically written, so they can be precomputed before the map body.
    let mut names: Vec<String> = Vec::new();
    let mut name_offsets: Vec<Vec<Option<u64>>> = Vec::new();
    for bucket in file.types() {
        let mut offsets_for_bucket = Vec::new();
        for resource in bucket.resources() {
            let name_offset = resource.name().map(|name| {
                let offset: u64 = names.iter().map(|n: &String| libcommon::encodings::MAC_ROMAN.encode(n).len() as u64 + 1).sum();
                names.push(name.to_string());
                offset
            });
            offsets_for_bucket.push(name_offset);
        }
        name_offsets.push(offsets_for_bucket);
    }

    // Each bucket's attribute list is written immediately followed by its
    // own resource records, so the offsets recorded in the header match
    // where bytes actually land.
    let mut type_headers = Vec::new();
    for (t, bucket) in file.types().enumerate() {
        let mut attr_strings = Vec::new();
        for (k, v) in bucket.attributes() {
            attr_strings.push(k.clone());
            attr_strings.push(v.clone());
        }
        let attribute_list_offset = if attr_strings.is_empty() {
            0
        } else {
            let offset = (writer.position() - map_offset as usize) as u64;
            for s in &attr_strings {
                writer.write_cstr(s, 0)?;
            }
            offset
        };

        let resource_list_offset = (writer.position() - map_offset as usize) as u64;
        for (i, resource) in bucket.resources().iter().enumerate() {
            writer.write_signed_quad(resource.id())?;
            writer.write_quad(name_offsets[t][i].unwrap_or(u64::MAX))?;
            writer.write_byte(0)?;
            writer.write_quad(data_offsets[t][i])?;
            writer.write_long(0)?;
        }

        type_headers.push((bucket.code(), bucket.len(), resource_list_offset, bucket.attributes().len(), attribute_list_offset));
    }

    let name_list_offset = (writer.position() - map_offset as usize) as u64;
    for name in &names {
        writer.write_pstr(name)?;
    }

    let map_length = writer.position() as u64 - map_offset;

    writer.set_position(header_start)?;
    for (code, count, resource_list_offset, attribute_count, attribute_list_offset) in &type_headers {
        writer.write_raw(code.as_bytes())?;
        writer.write_quad(count.saturating_sub(1) as u64)?;
        writer.write_quad(*resource_list_offset)?;
        writer.write_quad(*attribute_count as u64)?;
        writer.write_quad(*attribute_list_offset)?;
    }

    writer.set_position(8)?;
    writer.write_quad(data_offset)?;
    writer.write_quad(map_offset)?;
    writer.write_quad(data_length)?;
    writer.write_quad(map_length)?;

    writer.set_position(type_list_offset_pos)?;
    writer.write_quad(type_list_offset)?;
    writer.write_quad(name_list_offset)?;

    writer.set_position(map_offset as usize + map_length as usize)?;

    Ok(writer.into_block())
}
