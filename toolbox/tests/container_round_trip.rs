//! Testable property: a `File` built up through `add_resource` survives a
//! write/parse round trip through each on-disk container format, preserving
//! resource bytes, names, ids, bucket attributes and insertion order.

use std::collections::BTreeMap;

use toolbox::resources::format::{self, Format};
use toolbox::resources::File;

fn sample_file_without_attributes() -> File {
    let mut file = File::new();
    file.add_resource(*b"PICT", 128, Some("picture".into()), vec![0xDE, 0xAD, 0xBE, 0xEF], BTreeMap::new());
    file.add_resource(*b"PICT", -1, None, vec![], BTreeMap::new());
    file.add_resource(*b"PICT", 1000, Some("another".into()), (0..64).collect(), BTreeMap::new());
    file.add_resource(*b"STR ", 0, None, b"hello world".to_vec(), BTreeMap::new());
    file
}

fn assert_round_trips_without_attributes(file: &File, format: Format) {
    let block = format::write(file, format).unwrap();
    let (parsed, detected) = format::detect_and_parse(&block).unwrap();
    assert_eq!(detected, format);

    assert_eq!(parsed.count(), file.count());
    assert_eq!(parsed.type_codes().collect::<Vec<_>>(), file.type_codes().collect::<Vec<_>>());

    for (want_bucket, got_bucket) in file.types().zip(parsed.types()) {
        assert_eq!(got_bucket.code(), want_bucket.code());
        assert_eq!(got_bucket.len(), want_bucket.len());
        for (want, got) in want_bucket.resources().iter().zip(got_bucket.resources().iter()) {
            assert_eq!(got.id(), want.id());
            assert_eq!(got.name(), want.name());
            assert_eq!(got.data(), want.data());
        }
    }
}

#[test]
fn classic_round_trips_multiple_types_and_names() {
    assert_round_trips_without_attributes(&sample_file_without_attributes(), Format::Classic);
}

#[test]
fn extended_round_trips_multiple_types_and_names() {
    assert_round_trips_without_attributes(&sample_file_without_attributes(), Format::Extended);
}

#[test]
fn rez_round_trips_multiple_types_and_names() {
    assert_round_trips_without_attributes(&sample_file_without_attributes(), Format::Rez);
}

/// Regression test for a bug where the extended driver's `write()` computed
/// `resource_list_offset` in a pass that didn't match where the resource
/// records actually landed once more than one bucket was attributed or
/// the file held more than one type. Multiple buckets sharing a type code
/// but differing attributes only round-trip distinctly in the extended
/// format, which is the only one of the three that carries attributes at
/// all.
#[test]
fn extended_round_trips_distinct_buckets_with_attributes() {
    let mut file = File::new();

    let mut english = BTreeMap::new();
    english.insert("lang".to_string(), "en".to_string());
    let mut french = BTreeMap::new();
    french.insert("lang".to_string(), "fr".to_string());

    file.add_resource(*b"STR#", 1, Some("greeting".into()), b"hello".to_vec(), english.clone());
    file.add_resource(*b"STR#", 2, None, b"farewell".to_vec(), english.clone());
    file.add_resource(*b"STR#", 1, Some("bonjour".into()), b"bonjour".to_vec(), french.clone());
    file.add_resource(*b"PICT", 128, Some("pic".into()), vec![1, 2, 3, 4, 5], BTreeMap::new());

    let block = format::write(&file, Format::Extended).unwrap();
    let (parsed, detected) = format::detect_and_parse(&block).unwrap();
    assert_eq!(detected, Format::Extended);

    assert_eq!(parsed.count(), file.count());

    let en_bucket = parsed.find_qualified(*b"STR#", 1, &english).unwrap();
    assert_eq!(en_bucket.data(), b"hello");
    assert_eq!(en_bucket.name(), Some("greeting"));

    let en_farewell = parsed.find_qualified(*b"STR#", 2, &english).unwrap();
    assert_eq!(en_farewell.data(), b"farewell");

    let fr_bucket = parsed.find_qualified(*b"STR#", 1, &french).unwrap();
    assert_eq!(fr_bucket.data(), b"bonjour");
    assert_eq!(fr_bucket.name(), Some("bonjour"));

    let pic = parsed.find(*b"PICT", 128).unwrap();
    assert_eq!(pic.data(), &[1, 2, 3, 4, 5]);

    let str_key = toolbox::resources::OsType::new(*b"STR#");
    assert_eq!(
        parsed.types().filter(|b| b.code() == str_key).count(),
        2,
        "english and french STR# buckets must stay distinct across the round trip"
    );
}

#[test]
fn classic_rejects_resource_ids_outside_i16_range() {
    let mut file = File::new();
    file.add_resource(*b"PICT", i64::from(i16::MAX) + 1, None, vec![1], BTreeMap::new());
    assert!(format::write(&file, Format::Classic).is_err());
}
