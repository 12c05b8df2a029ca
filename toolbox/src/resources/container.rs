//! The in-memory resource file: an ordered map of typed buckets, each an
//! ordered set of resources keyed by signed identifier and, optionally, name.

use std::collections::BTreeMap;
use std::path::Path;

use super::format::{self, Format};
use super::id::OsType;
use super::{Error, Result};

/// A single resource: an id, an optional name, and its payload bytes.
#[derive(Debug, Clone)]
pub struct Resource {
    id: i64,
    name: Option<String>,
    data: Vec<u8>,
}

impl Resource {
    #[must_use]
    pub fn new(id: i64, name: Option<String>, data: Vec<u8>) -> Self {
        Self { id, name, data }
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }
}

/// Canonical, order-independent serialization of an attribute map, used as
/// part of a bucket's lookup key so e.g. `'PICT'{lang=en}` and
/// `'PICT'{lang=fr}` coexist as distinct buckets.
fn canonical_attributes(attributes: &BTreeMap<String, String>) -> String {
    attributes.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join("\u{1}")
}

type TypeKey = (OsType, String);

/// An ordered set of resources sharing a 4-byte type code and attribute set.
#[derive(Debug, Clone)]
pub struct TypeBucket {
    code: OsType,
    attributes: BTreeMap<String, String>,
    resources: Vec<Resource>,
    by_id: std::collections::HashMap<i64, usize>,
    by_name: std::collections::HashMap<String, usize>,
}

impl TypeBucket {
    fn new(code: OsType, attributes: BTreeMap<String, String>) -> Self {
        Self { code, attributes, resources: Vec::new(), by_id: Default::default(), by_name: Default::default() }
    }

    #[must_use]
    pub fn code(&self) -> OsType {
        self.code
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn reindex(&mut self) {
        self.by_id.clear();
        self.by_name.clear();
        for (i, resource) in self.resources.iter().enumerate() {
            self.by_id.insert(resource.id, i);
            if let Some(name) = &resource.name {
                self.by_name.insert(name.clone(), i);
            }
        }
    }

    fn push(&mut self, resource: Resource) {
        self.resources.push(resource);
        self.reindex();
    }

    #[must_use]
    pub fn by_id(&self, id: i64) -> Option<&Resource> {
        self.by_id.get(&id).map(|&i| &self.resources[i])
    }

    #[must_use]
    pub fn by_id_mut(&mut self, id: i64) -> Option<&mut Resource> {
        self.by_id.get(&id).copied().map(move |i| &mut self.resources[i])
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Resource> {
        self.by_name.get(name).map(|&i| &self.resources[i])
    }
}

/// The container: an ordered mapping from type key to type bucket.
#[derive(Debug, Clone, Default)]
pub struct File {
    order: Vec<TypeKey>,
    types: std::collections::HashMap<TypeKey, TypeBucket>,
}

impl File {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Format)> {
        let block = libcommon::Block::from_file(path.as_ref(), libcommon::ByteOrder::Big)?;
        format::detect_and_parse(&block)
    }

    pub fn save(&self, path: impl AsRef<Path>, fmt: Format) -> Result<()> {
        let block = format::write(self, fmt)?;
        block.save(path.as_ref()).map_err(Error::Common)
    }

    pub fn add_resource(
        &mut self,
        os_type: impl Into<OsType>,
        id: i64,
        name: Option<String>,
        data: Vec<u8>,
        attributes: BTreeMap<String, String>,
    ) {
        let code = os_type.into();
        let key = (code, canonical_attributes(&attributes));
        if !self.types.contains_key(&key) {
            self.order.push(key.clone());
            self.types.insert(key.clone(), TypeBucket::new(code, attributes));
        }
        let bucket = self.types.get_mut(&key).expect("just inserted");
        bucket.push(Resource::new(id, name, data));
    }

    #[must_use]
    pub fn find(&self, os_type: impl Into<OsType>, id: i64) -> Option<&Resource> {
        let code = os_type.into();
        self.order.iter()
            .filter(|key| key.0 == code)
            .find_map(|key| self.types[key].by_id(id))
    }

    #[must_use]
    pub fn find_qualified(&self, os_type: impl Into<OsType>, id: i64, attributes: &BTreeMap<String, String>) -> Option<&Resource> {
        let key = (os_type.into(), canonical_attributes(attributes));
        self.types.get(&key).and_then(|bucket| bucket.by_id(id))
    }

    #[must_use]
    pub fn find_named(&self, os_type: impl Into<OsType>, name: &str) -> Option<&Resource> {
        let code = os_type.into();
        self.order.iter()
            .filter(|key| key.0 == code)
            .find_map(|key| self.types[key].by_name(name))
    }

    #[must_use]
    pub fn r#type(&self, os_type: impl Into<OsType>) -> Option<&TypeBucket> {
        let code = os_type.into();
        self.order.iter().filter(|key| key.0 == code).find_map(|key| self.types.get(key))
    }

    pub fn type_codes(&self) -> impl Iterator<Item = OsType> + '_ {
        self.order.iter().map(|key| key.0)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeBucket> + '_ {
        self.order.iter().map(move |key| &self.types[key])
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.types.values().map(TypeBucket::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_find_round_trips() {
        let mut file = File::new();
        file.add_resource(*b"PICT", 128, Some("pic".into()), vec![1, 2, 3], BTreeMap::new());
        let resource = file.find(*b"PICT", 128).unwrap();
        assert_eq!(resource.data(), &[1, 2, 3]);
        assert_eq!(resource.name(), Some("pic"));
    }

    #[test]
    fn qualified_buckets_stay_distinct() {
        let mut file = File::new();
        let mut en = BTreeMap::new();
        en.insert("lang".to_string(), "en".to_string());
        let mut fr = BTreeMap::new();
        fr.insert("lang".to_string(), "fr".to_string());
        file.add_resource(*b"PICT", 1, None, vec![1], en.clone());
        file.add_resource(*b"PICT", 1, None, vec![2], fr.clone());
        assert_eq!(file.find_qualified(*b"PICT", 1, &en).unwrap().data(), &[1]);
        assert_eq!(file.find_qualified(*b"PICT", 1, &fr).unwrap().data(), &[2]);
    }

    #[test]
    fn duplicate_ids_keep_first_insert_order_last_index_lookup() {
        let mut file = File::new();
        file.add_resource(*b"STR ", 1, None, vec![1], BTreeMap::new());
        file.add_resource(*b"STR ", 1, None, vec![2], BTreeMap::new());
        let bucket = file.r#type(*b"STR ").unwrap();
        assert_eq!(bucket.resources()[0].data(), &[1]);
        assert_eq!(bucket.by_id(1).unwrap().data(), &[2]);
    }
}
