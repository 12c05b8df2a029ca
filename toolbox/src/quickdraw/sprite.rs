//! SpriteWorld animation sheets: `rlëD` (16-bit, opcode/row) and `rlëX`
//! (32-bit, YCbCr delta-coded). Both share a 16-byte header; each lays its
//! decoded frames out on a grid whose column count differs per format.

use libcommon::{Block, ByteOrder, Reader, Writer};

use super::color::Color;
use super::surface::Surface;
use crate::resources::{Error, Result};

/// A decoded animation sheet: the per-frame dimensions and the frames
/// themselves, in on-disk order.
#[derive(Clone, Debug)]
pub struct SpriteSheet {
    pub frame_width: u32,
    pub frame_height: u32,
    pub bpp: u16,
    pub palette_id: u16,
    pub frames: Vec<Surface>,
}

impl SpriteSheet {
    #[must_use]
    pub fn new(frame_width: u32, frame_height: u32, frames: Vec<Surface>) -> Self {
        Self { frame_width, frame_height, bpp: 16, palette_id: 0, frames }
    }

    /// Composites every frame into a single grid-laid-out canvas, as the
    /// on-disk decoder would when asked for the whole sheet at once.
    #[must_use]
    pub fn to_grid(&self, columns: u32) -> Surface {
        let rows = (self.frames.len() as u32 + columns - 1) / columns.max(1);
        let mut canvas = Surface::new(columns * self.frame_width, rows * self.frame_height);
        for (i, frame) in self.frames.iter().enumerate() {
            let col = i as u32 % columns;
            let row = i as u32 / columns;
            canvas.blit(frame, (col * self.frame_width) as i32, (row * self.frame_height) as i32);
        }
        canvas
    }
}

fn read_header(reader: &mut Reader<'_>) -> Result<(u32, u32, u16, u16, u16)> {
    let height = reader.read_signed_short()?;
    let width = reader.read_signed_short()?;
    let bpp = reader.read_short()?;
    let palette_id = reader.read_short()?;
    let frame_count = reader.read_short()?;
    reader.read_bytes(6)?;
    Ok((width.max(0) as u32, height.max(0) as u32, bpp, palette_id, frame_count))
}

fn write_header(writer: &mut Writer, width: u32, height: u32, bpp: u16, palette_id: u16, frame_count: u16) -> Result<()> {
    writer.write_signed_short(height as i16)?;
    writer.write_signed_short(width as i16)?;
    writer.write_short(bpp)?;
    writer.write_short(palette_id)?;
    writer.write_short(frame_count)?;
    writer.write_raw(&[0; 6])?;
    Ok(())
}

/// `rlëD`'s grid is a fixed 6 columns wide; `rlëX` packs frames into the
/// smallest square that fits.
#[must_use]
pub fn grid_columns_rled() -> u32 {
    6
}

#[must_use]
pub fn grid_columns_rlex(frame_count: u32) -> u32 {
    (f64::from(frame_count).sqrt().ceil()) as u32
}

// ---- rlëD --------------------------------------------------------------

pub fn decode_rled(reader: &mut Reader<'_>) -> Result<SpriteSheet> {
    let (width, height, bpp, palette_id, frame_count) = read_header(reader)?;
    let mut frames = Vec::with_capacity(usize::from(frame_count));

    for _ in 0..frame_count {
        let mut frame = Surface::new(width, height);
        let mut y: i32 = -1;
        let mut x: u32 = 0;
        let mut row_start = reader.position();

        loop {
            let word = reader.read_long()?;
            let opcode = (word >> 24) as u8;
            let count = word & 0x00FF_FFFF;
            match opcode {
                0x00 => break,
                0x01 => {
                    y += 1;
                    x = 0;
                    row_start = reader.position();
                }
                0x02 => {
                    let words = (count / 2) as usize;
                    for _ in 0..words {
                        let pixel = reader.read_short()?;
                        if y >= 0 && x < width {
                            frame.set(x, y as u32, Color::from_rgb555(pixel));
                        }
                        x += 1;
                    }
                    let relative = reader.position() - row_start;
                    if relative % 4 != 0 {
                        reader.read_bytes(4 - relative % 4)?;
                    }
                }
                0x03 => {
                    x += count / 2;
                }
                0x04 => {
                    let payload = reader.read_long()?;
                    let upper = Color::from_rgb555((payload >> 16) as u16);
                    let lower = Color::from_rgb555(payload as u16);
                    for _ in 0..count / 4 {
                        if y >= 0 && x < width {
                            frame.set(x, y as u32, upper);
                        }
                        x += 1;
                        if y >= 0 && x < width {
                            frame.set(x, y as u32, lower);
                        }
                        x += 1;
                    }
                }
                other => return Err(Error::UnsupportedOpcode(u16::from(other))),
            }
        }
        frames.push(frame);
    }

    Ok(SpriteSheet { frame_width: width, frame_height: height, bpp, palette_id, frames })
}

/// Greedily classifies each row into transparent/uniform-color/literal
/// spans. A fully-transparent row emits nothing at all (the canvas already
/// starts transparent); a single trailing transparent span is likewise
/// dropped since nothing downstream reads past the row's last opcode.
pub fn encode_rled(sheet: &SpriteSheet) -> Result<Vec<u8>> {
    let mut writer = Writer::new(ByteOrder::Big);
    write_header(&mut writer, sheet.frame_width, sheet.frame_height, sheet.bpp, sheet.palette_id, sheet.frames.len() as u16)?;

    for frame in &sheet.frames {
        for y in 0..sheet.frame_height {
            writer.write_long(0x0100_0000)?; // line_start, count = 0
            let row_start = writer.position();
            let mut x = 0u32;
            while x < sheet.frame_width {
                if frame.at(x, y).a == 0 {
                    let run_start = x;
                    while x < sheet.frame_width && frame.at(x, y).a == 0 {
                        x += 1;
                    }
                    if x == sheet.frame_width {
                        break; // trailing transparent: leave unwritten
                    }
                    let run = x - run_start;
                    writer.write_long(0x0300_0000 | (run * 2))?;
                    continue;
                }

                let color = frame.at(x, y);
                let run_start = x;
                while x < sheet.frame_width && frame.at(x, y).to_u32() == color.to_u32() {
                    x += 1;
                }
                let run = x - run_start;
                if run >= 2 {
                    let word = color_to_555(color);
                    let pairs = run / 2;
                    writer.write_long(0x0400_0000 | (pairs * 4))?;
                    writer.write_long((u32::from(word) << 16) | u32::from(word))?;
                    if run % 2 == 1 {
                        writer.write_long(0x0200_0000 | 2)?;
                        writer.write_short(word)?;
                        pad_to_row_boundary(&mut writer, row_start)?;
                    }
                } else {
                    let lit_start = run_start;
                    let mut lit_len = 1u32;
                    x = run_start + 1;
                    while x < sheet.frame_width {
                        let next = frame.at(x, y);
                        if next.a == 0 {
                            break;
                        }
                        if x + 1 < sheet.frame_width && frame.at(x + 1, y).to_u32() == next.to_u32() {
                            break;
                        }
                        lit_len += 1;
                        x += 1;
                    }
                    writer.write_long(0x0200_0000 | (lit_len * 2))?;
                    for px in lit_start..lit_start + lit_len {
                        writer.write_short(color_to_555(frame.at(px, y)))?;
                    }
                    pad_to_row_boundary(&mut writer, row_start)?;
                }
            }
        }
        writer.write_long(0)?; // eof
    }

    Ok(writer.into_block().as_slice().to_vec())
}

fn pad_to_row_boundary(writer: &mut Writer, row_start: usize) -> Result<()> {
    let relative = writer.position() - row_start;
    if relative % 4 != 0 {
        writer.write_raw(&vec![0u8; 4 - relative % 4])?;
    }
    Ok(())
}

fn color_to_555(color: Color) -> u16 {
    let r5 = u16::from(color.r >> 3);
    let g5 = u16::from(color.g >> 3);
    let b5 = u16::from(color.b >> 3);
    (r5 << 10) | (g5 << 5) | b5
}

// ---- rlëX ---------------------------------------------------------------

struct YCbCrState {
    y: u8,
    cb: u8,
    cr: u8,
    a: u8,
}

impl Default for YCbCrState {
    fn default() -> Self {
        Self { y: 0, cb: 128, cr: 128, a: 255 }
    }
}

fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> (u8, u8, u8) {
    let y = f32::from(y);
    let cb = f32::from(cb) - 128.0;
    let cr = f32::from(cr) - 128.0;
    let r = y + 1.402 * cr;
    let g = y - 0.344136 * cb - 0.714136 * cr;
    let b = y + 1.772 * cb;
    (clamp_round(r), clamp_round(g), clamp_round(b))
}

fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
    let y = 0.299 * rf + 0.587 * gf + 0.114 * bf;
    let cb = 128.0 - 0.168736 * rf - 0.331264 * gf + 0.5 * bf;
    let cr = 128.0 + 0.5 * rf - 0.418688 * gf - 0.081312 * bf;
    (clamp_round(y), clamp_round(cb), clamp_round(cr))
}

fn clamp_round(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

pub fn decode_rlex(reader: &mut Reader<'_>) -> Result<SpriteSheet> {
    let (width, height, bpp, palette_id, frame_count) = read_header(reader)?;

    let remaining = reader.bytes_left();
    let mut body_block = reader.read_data(remaining)?;
    body_block.set_byte_order(ByteOrder::Little);
    let mut body = Reader::new(&body_block);

    let mut frames = Vec::with_capacity(usize::from(frame_count));
    for _ in 0..frame_count {
        let mut frame = Surface::new(width, height);
        let mut state = YCbCrState::default();
        let mut index: u32 = 0;
        let total = width * height;

        loop {
            let opcode = body.read_byte()?;
            match opcode {
                0x00 => break,
                0x01 => state.y = body.read_byte()?,
                0x02 => state.cr = body.read_byte()?,
                0x03 => state.cb = body.read_byte()?,
                0x04 => state.a = body.read_byte()?,
                0x05 => {
                    let run = body.read_long()?;
                    index = paint_run(&mut frame, width, total, index, run, &state);
                }
                short if short & 0x80 != 0 => {
                    let run = u32::from(short & 0x7F);
                    index = paint_run(&mut frame, width, total, index, run, &state);
                }
                other => return Err(Error::UnsupportedOpcode(u16::from(other))),
            }
        }
        frames.push(frame);
    }

    Ok(SpriteSheet { frame_width: width, frame_height: height, bpp, palette_id, frames })
}

fn paint_run(frame: &mut Surface, width: u32, total: u32, index: u32, run: u32, state: &YCbCrState) -> u32 {
    let (r, g, b) = ycbcr_to_rgb(state.y, state.cb, state.cr);
    let color = Color::rgba(r, g, b, state.a);
    let end = (index + run).min(total);
    let mut i = index;
    while i < end {
        frame.set(i % width, i / width, color);
        i += 1;
    }
    index + run
}

pub fn encode_rlex(sheet: &SpriteSheet) -> Result<Vec<u8>> {
    let mut header_writer = Writer::new(ByteOrder::Big);
    write_header(&mut header_writer, sheet.frame_width, sheet.frame_height, sheet.bpp, sheet.palette_id, sheet.frames.len() as u16)?;

    let mut body = Writer::new(ByteOrder::Little);
    for frame in &sheet.frames {
        let mut state = YCbCrState::default();
        let mut run: u32 = 0;
        for y in 0..sheet.frame_height {
            for x in 0..sheet.frame_width {
                let color = frame.at(x, y);
                let (ty, tcb, tcr) = rgb_to_ycbcr(color.r, color.g, color.b);
                let ta = color.a;
                if ty != state.y || tcb != state.cb || tcr != state.cr || ta != state.a {
                    flush_run(&mut body, &mut run)?;
                    if ty != state.y {
                        body.write_byte(0x01)?;
                        body.write_byte(ty)?;
                        state.y = ty;
                    }
                    if tcr != state.cr {
                        body.write_byte(0x02)?;
                        body.write_byte(tcr)?;
                        state.cr = tcr;
                    }
                    if tcb != state.cb {
                        body.write_byte(0x03)?;
                        body.write_byte(tcb)?;
                        state.cb = tcb;
                    }
                    if ta != state.a {
                        body.write_byte(0x04)?;
                        body.write_byte(ta)?;
                        state.a = ta;
                    }
                }
                run += 1;
            }
        }
        flush_run(&mut body, &mut run)?;
        body.write_byte(0x00)?; // eof
    }

    let mut header_block = header_writer.into_block();
    let body_block = body.into_block();
    let mut out = header_block.as_mut_slice().to_vec();
    out.extend_from_slice(body_block.as_slice());
    Ok(out)
}

fn flush_run(body: &mut Writer, run: &mut u32) -> Result<()> {
    if *run == 0 {
        return Ok(());
    }
    if *run < 128 {
        body.write_byte(0x80 | (*run as u8))?;
    } else {
        body.write_byte(0x05)?;
        body.write_long(*run)?;
    }
    *run = 0;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rled_uniform_transparent_frame_round_trips() {
        let sheet = SpriteSheet::new(2, 1, vec![Surface::new(2, 1)]);
        let bytes = encode_rled(&sheet).unwrap();
        let block = Block::from_vec(bytes, ByteOrder::Big);
        let mut reader = Reader::new(&block);
        let decoded = decode_rled(&mut reader).unwrap();
        assert_eq!(decoded.frames.len(), 1);
        assert_eq!(decoded.frames[0].at(0, 0).a, 0);
        assert_eq!(decoded.frames[0].at(1, 0).a, 0);
    }

    #[test]
    fn rled_tolerates_doubled_eof_fixture() {
        let mut writer = Writer::new(ByteOrder::Big);
        write_header(&mut writer, 2, 1, 16, 0, 1).unwrap();
        writer.write_long(0x0100_0000).unwrap(); // line_start count=0
        writer.write_long(0).unwrap(); // eof
        writer.write_long(0).unwrap(); // redundant eof, tolerated
        let block = writer.into_block();
        let mut reader = Reader::new(&block);
        let decoded = decode_rled(&mut reader).unwrap();
        assert_eq!(decoded.frames.len(), 1);
    }

    #[test]
    fn rlex_two_frame_transparent_round_trips() {
        let mut frame0 = Surface::new(2, 2);
        for y in 0..2 {
            for x in 0..2 {
                frame0.set(x, y, Color::rgba(0, 0, 0, 0));
            }
        }
        let mut frame1 = Surface::new(2, 2);
        for y in 0..2 {
            for x in 0..2 {
                frame1.set(x, y, Color::rgba(255, 0, 0, 255));
            }
        }
        let sheet = SpriteSheet::new(2, 2, vec![frame0, frame1]);
        let bytes = encode_rlex(&sheet).unwrap();
        let block = Block::from_vec(bytes, ByteOrder::Big);
        let mut reader = Reader::new(&block);
        let decoded = decode_rlex(&mut reader).unwrap();
        assert_eq!(decoded.frames.len(), 2);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(decoded.frames[0].at(x, y), Color::rgba(0, 0, 0, 0));
                let c = decoded.frames[1].at(x, y);
                assert!(i16::from(c.r) - 255 <= 2 && i16::from(c.r) - 255 >= -2);
                assert_eq!(c.g, 0);
                assert_eq!(c.b, 0);
            }
        }
    }

    #[test]
    fn grid_columns_rlex_is_the_ceiling_square_root() {
        assert_eq!(grid_columns_rlex(1), 1);
        assert_eq!(grid_columns_rlex(4), 2);
        assert_eq!(grid_columns_rlex(5), 3);
    }
}
