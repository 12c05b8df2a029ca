use libcommon::{Block, ByteOrder, Reader};
use toolbox::resources::{OsType, OsTypeReadExt, ResourceId};

#[test]
fn basic() {
    let id = ResourceId::new(b"HELO", 123);
    assert_eq!(id.os_type(), OsType::new(*b"HELO"));
    assert_eq!(id.id(), 123);
}

#[test]
fn os_type_primitive() {
    let os_type = OsType::new(*b"HeLO");
    assert_eq!(format!("{}", os_type), "HeLO");
    assert_eq!(format!("{:?}", os_type), "OsType(HeLO)");
}

#[test]
fn os_type_read() {
    let block = Block::from_vec(b"HeLO".to_vec(), ByteOrder::Big);
    let mut reader = Reader::new(&block);
    assert_eq!(reader.read_os_type().unwrap(), OsType::new(*b"HeLO"));
}

#[test]
fn os_type_from_u32() {
    let os_type = 0x48_65_4c_4f;
    assert_eq!(OsType::from(os_type), OsType::new(*b"HeLO"));
}
