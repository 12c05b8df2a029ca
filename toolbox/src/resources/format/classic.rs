//! Classic 24-bit resource fork layout.

use std::collections::BTreeMap;

use libcommon::{Block, ByteOrder, Reader, Writer};

use crate::resources::container::File;
use crate::resources::id::{OsType, OsTypeReadExt};
use crate::resources::{Error, Result};

struct Preamble {
    data_offset: u32,
    map_offset: u32,
    data_length: u32,
    map_length: u32,
}

fn read_preamble(reader: &mut Reader<'_>) -> Result<Preamble> {
    Ok(Preamble {
        data_offset: reader.read_long()?,
        map_offset: reader.read_long()?,
        data_length: reader.read_long()?,
        map_length: reader.read_long()?,
    })
}

#[must_use]
pub fn sniff(block: &Block) -> bool {
    if block.len() < 16 {
        return false;
    }
    let mut reader = Reader::new(block);
    let preamble = match read_preamble(&mut reader) {
        Ok(p) => p,
        Err(_) => return false,
    };
    preamble.data_offset >= 16
        && preamble.map_offset == preamble.data_offset + preamble.data_length
        && (preamble.data_offset as u64 + preamble.data_length as u64 + preamble.map_length as u64) <= block.len() as u64
}

pub fn parse(block: &Block) -> Result<File> {
    let mut reader = Reader::new(block);
    let preamble = read_preamble(&mut reader)?;

    if preamble.map_offset as u64 + 24 > block.len() as u64 {
        return Err(Error::MalformedResourceFile("map offset out of range".into()));
    }

    // Mirror preamble, tolerated all-zero.
    reader.set_position(preamble.map_offset as usize)?;
    let mirror = read_preamble(&mut reader)?;
    let mirror_is_zero = mirror.data_offset == 0 && mirror.map_offset == 0 && mirror.data_length == 0 && mirror.map_length == 0;
    if !mirror_is_zero
        && (mirror.data_offset != preamble.data_offset
            || mirror.map_offset != preamble.map_offset
            || mirror.data_length != preamble.data_length
            || mirror.map_length != preamble.map_length)
    {
        return Err(Error::MalformedResourceFile("map preamble mirror mismatch".into()));
    }

    reader.set_position(preamble.map_offset as usize + 22)?;
    let _flags = reader.read_short()?;
    let type_list_offset = reader.read_short()?;
    let name_list_offset = reader.read_short()?;

    let type_list_base = preamble.map_offset as usize + type_list_offset as usize;
    let name_list_base = preamble.map_offset as usize + name_list_offset as usize;

    reader.set_position(type_list_base)?;
    let type_count = u32::from(reader.read_short()?) + 1;

    let mut file = File::new();

    for _ in 0..type_count {
        let code = reader.read_os_type()?;
        let resource_count = u32::from(reader.read_short()?) + 1;
        let first_resource_offset = reader.read_short()?;
        let resource_list_base = type_list_base + first_resource_offset as usize;

        for i in 0..resource_count {
            reader.set_position(resource_list_base + i as usize * 12)?;
            let id = i64::from(reader.read_signed_short()?);
            let name_offset = reader.read_short()?;
            let attr = reader.read_byte()?;
            let data_offset = reader.read_triple()?;
            let _handle = reader.read_long()?;

            let name = if name_offset == 0xFFFF {
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
            let data_len = reader.read_long()?;
            let data = reader.read_bytes(data_len as usize)?;
            reader.set_position(saved)?;

            let _ = attr;
            file.add_resource(code, id, name, data, BTreeMap::new());
        }
    }

    Ok(file)
}

pub fn write(file: &File) -> Result<Block> {
    for bucket in file.types() {
        if !bucket.attributes().is_empty() {
            return Err(Error::AttributesNotRepresentable { format: "classic", code: bucket.code() });
        }
    }

    let mut writer = Writer::new(ByteOrder::Big);

    // Preamble placeholder; backpatched once the data/map sizes are known.
    writer.write_long(0)?;
    writer.write_long(0)?;
    writer.write_long(0)?;
    writer.write_long(0)?;
    let data_offset = writer.position() as u32;

    // Per-resource data offsets (relative to data_offset), recorded while
    // writing the data section, consumed while writing the map.
    let mut data_offsets: Vec<Vec<u32>> = Vec::new();

    for bucket in file.types() {
        let mut offsets = Vec::new();
        for resource in bucket.resources() {
            if resource.id() < i64::from(i16::MIN) || resource.id() > i64::from(i16::MAX) {
                return Err(Error::FormatOverflow { format: "classic", value: resource.id() });
            }
            offsets.push(writer.position() as u32 - data_offset);
            writer.write_long(resource.data().len() as u32)?;
            writer.write_data(&Block::from_vec(resource.data().to_vec(), ByteOrder::Big))?;
        }
        data_offsets.push(offsets);
    }

    let data_length = writer.position() as u32 - data_offset;
    let map_offset = writer.position() as u32;

    // Map preamble mirror.
    writer.write_long(data_offset)?;
    writer.write_long(map_offset)?;
    writer.write_long(data_length)?;
    writer.write_long(0)?; // map_length backpatched below
    writer.write_long(0)?; // reserved next map handle
    writer.write_short(0)?; // reserved ref num
    writer.write_short(0)?; // flags
    let type_list_offset_pos = writer.position();
    writer.write_short(0)?; // type_list_offset, backpatched
    writer.write_short(0)?; // name_list_offset, backpatched

    let type_list_offset = (writer.position() - map_offset as usize) as u16;
    writer.write_short(file.types().count().checked_sub(1).unwrap_or(0) as u16)?;

    let type_list_base = map_offset as usize + type_list_offset as usize;
    let header_size_per_type = 8usize;
    let mut resource_list_offset = (writer.position() - type_list_base) + file.types().count() * header_size_per_type;

    let mut type_headers = Vec::new();
    for bucket in file.types() {
        type_headers.push((bucket.code(), bucket.len(), resource_list_offset));
        resource_list_offset += bucket.len() * 12;
    }
    for (code, count, first_offset) in &type_headers {
        writer.write_raw(code.as_bytes())?;
        writer.write_short(count.checked_sub(1).unwrap_or(0) as u16)?;
        writer.write_short(*first_offset as u16)?;
    }

    // Resource list + collect names for the name list.
    let mut names: Vec<String> = Vec::new();
    let mut name_offsets: Vec<Vec<Option<u16>>> = Vec::new();
    for bucket in file.types() {
        let mut offsets_for_bucket = Vec::new();
        for resource in bucket.resources() {
            let name_offset = resource.name().map(|name| {
                let offset = names.iter().map(|n| libcommon::encodings::MAC_ROMAN.encode(n).len() + 1).sum::<usize>() as u16;
                names.push(name.to_string());
                offset
            });
            offsets_for_bucket.push(name_offset);
        }
        name_offsets.push(offsets_for_bucket);
    }

    for (t, bucket) in file.types().enumerate() {
        for (i, resource) in bucket.resources().iter().enumerate() {
            writer.write_signed_short(resource.id() as i16)?;
            writer.write_short(name_offsets[t][i].unwrap_or(0xFFFF))?;
            writer.write_byte(0)?;
            writer.write_triple(data_offsets[t][i])?;
            writer.write_long(0)?;
        }
    }

    let name_list_offset = (writer.position() - map_offset as usize) as u16;
    for name in &names {
        writer.write_pstr(name)?;
    }

    let map_length = writer.position() as u32 - map_offset;

    writer.set_position(0)?;
    writer.write_long(data_offset)?;
    writer.write_long(map_offset)?;
    writer.write_long(data_length)?;
    writer.write_long(map_length)?;

    writer.set_position(map_offset as usize + 12)?;
    writer.write_long(map_length)?;

    writer.set_position(type_list_offset_pos)?;
    writer.write_short(type_list_offset)?;
    writer.write_short(name_list_offset)?;

    writer.set_position(map_offset as usize + map_length as usize)?;

    Ok(writer.into_block())
}
