use libcommon::{Block, ByteOrder, ReadMode, Reader, Writer};

#[test]
fn reader_and_writer_agree_on_fixed_point() {
    let mut writer = Writer::new(ByteOrder::Big);
    writer.write_fixed_point(1.5).unwrap();
    writer.write_fixed_point(-2.25).unwrap();
    let block = writer.into_block();
    let mut reader = Reader::new(&block);
    assert!((reader.read_fixed_point().unwrap() - 1.5).abs() < f64::EPSILON);
    assert!((reader.read_fixed_point().unwrap() - (-2.25)).abs() < f64::EPSILON);
}

#[test]
fn read_data_is_a_zero_copy_view() {
    let block = Block::from_vec(vec![1, 2, 3, 4, 5], ByteOrder::Big);
    let mut reader = Reader::new(&block);
    reader.set_position(1).unwrap();
    let view = reader.read_data(3).unwrap();
    assert_eq!(view.as_slice(), &[2, 3, 4]);
    assert_eq!(reader.position(), 4);
}

#[test]
fn peek_mode_round_trips_with_offset() {
    let block = Block::from_vec(vec![0, 0, 0xAB], ByteOrder::Big);
    let mut reader = Reader::new(&block);
    assert_eq!(reader.read_byte_at(2, ReadMode::Peek).unwrap(), 0xAB);
    assert_eq!(reader.position(), 0);
}
