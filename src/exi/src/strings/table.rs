//! The string table: URI, Prefix, Local-Name, Local-Value and
//! Global-Value partitions (spec.md §3, §4.4).
//!
//! Strings live in a `bumpalo::Bump` arena owned by the table, so every
//! `&'arena str` returned from a lookup stays valid for the table's
//! whole lifetime without individually reference-counting each string
//! (mirrors how the teacher's metadata tables borrowed from one
//! mmap-backed buffer instead of copying each row out).

use bumpalo::Bump;
use smallvec::SmallVec;

use super::compact_id::{bits_for_count, CompactId};
use super::value_partition::ValuePartition;
use crate::error::{ExiError, ExiResult};
use crate::header::ExiOptions;

const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";
const XSI_URI: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD_URI: &str = "http://www.w3.org/2001/XMLSchema";

/// The prefixes bound to one URI, in first-seen order. Almost always
/// zero or one entry, so inline storage avoids a heap allocation for
/// the common case.
pub struct PrefixPartition<'arena> {
    prefixes: SmallVec<[&'arena str; 2]>,
}

impl<'arena> PrefixPartition<'arena> {
    fn new() -> Self {
        Self { prefixes: SmallVec::new() }
    }

    pub fn len(&self) -> u32 {
        self.prefixes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn log(&self) -> u32 {
        bits_for_count(self.len())
    }

    pub fn find(&self, prefix: &str) -> Option<CompactId> {
        self.prefixes.iter().position(|&p| p == prefix).map(|i| CompactId(i as u32))
    }

    pub fn get(&self, id: CompactId) -> Option<&'arena str> {
        self.prefixes.get(id.0 as usize).copied()
    }

    fn push(&mut self, prefix: &'arena str) -> CompactId {
        self.prefixes.push(prefix);
        CompactId(self.prefixes.len() as u32 - 1)
    }
}

/// One local name within a URI, with its own local-value partition.
pub struct LocalNameEntry<'arena> {
    pub local_name: &'arena str,
    pub qname: &'arena str,
    local_values: ValuePartition<'arena>,
}

impl<'arena> LocalNameEntry<'arena> {
    pub fn local_value_log(&self) -> u32 {
        self.local_values.log()
    }

    pub fn local_value_count(&self) -> u32 {
        self.local_values.len()
    }

    pub fn find_local_value(&self, value: &str) -> Option<CompactId> {
        self.local_values.find(value)
    }

    pub fn get_local_value(&self, id: CompactId) -> Option<&'arena str> {
        self.local_values.get(id)
    }
}

struct UriEntry<'arena> {
    uri: &'arena str,
    prefixes: PrefixPartition<'arena>,
    local_names: Vec<LocalNameEntry<'arena>>,
}

/// The complete per-document string table.
pub struct StringTable<'arena> {
    arena: &'arena Bump,
    uris: Vec<UriEntry<'arena>>,
    global_values: ValuePartition<'arena>,
    value_partition_capacity: Option<u32>,
    value_max_length: Option<u32>,
}

impl<'arena> StringTable<'arena> {
    /// Builds a fresh table, pre-seeded with the URI/Prefix/Local-Name
    /// entries the EXI 1.0 default grammar requires: the empty URI,
    /// `xml` (prefix `xml`; local names `base`, `id`, `lang`, `space`),
    /// `xsi` (local names `nil`, `type`), and, when `options.schema_id`
    /// names a schema, the XML Schema namespace itself.
    pub fn setup(arena: &'arena Bump, options: &ExiOptions) -> Self {
        let mut table = Self {
            arena,
            uris: Vec::new(),
            global_values: ValuePartition::new(options.value_partition_capacity),
            value_partition_capacity: options.value_partition_capacity,
            value_max_length: options.value_max_length,
        };

        let empty_id = table.add_uri_unchecked("");

        let xml_id = table.add_uri_unchecked(XML_URI);
        table.add_prefix(xml_id, "xml").expect("pre-seeded uri exists");
        for name in ["base", "id", "lang", "space"] {
            table.add_local_name(xml_id, name).expect("pre-seeded uri exists");
        }

        let xsi_id = table.add_uri_unchecked(XSI_URI);
        for name in ["nil", "type"] {
            table.add_local_name(xsi_id, name).expect("pre-seeded uri exists");
        }

        if options.schema_id.is_some() {
            table.add_uri_unchecked(XSD_URI);
        }

        let _ = empty_id;
        table
    }

    fn add_uri_unchecked(&mut self, uri: &str) -> CompactId {
        if let Some(id) = self.find_uri(uri) {
            return id;
        }
        let interned: &'arena str = self.arena.alloc_str(uri);
        self.uris.push(UriEntry { uri: interned, prefixes: PrefixPartition::new(), local_names: Vec::new() });
        CompactId(self.uris.len() as u32 - 1)
    }

    pub fn uri_log(&self) -> u32 {
        bits_for_count(self.uris.len() as u32)
    }

    pub fn uri_count(&self) -> u32 {
        self.uris.len() as u32
    }

    pub fn find_uri(&self, uri: &str) -> Option<CompactId> {
        self.uris.iter().position(|e| e.uri == uri).map(|i| CompactId(i as u32))
    }

    pub fn get_uri(&self, id: CompactId) -> Option<&'arena str> {
        self.uris.get(id.0 as usize).map(|e| e.uri)
    }

    /// Adds a URI on a miss, returning its new id. Idempotent on hit.
    pub fn add_uri(&mut self, uri: &str) -> CompactId {
        self.add_uri_unchecked(uri)
    }

    fn uri_entry(&self, uri_id: CompactId) -> ExiResult<&UriEntry<'arena>> {
        self.uris.get(uri_id.0 as usize).ok_or_else(|| ExiError::invalid_input("unknown uri id"))
    }

    fn uri_entry_mut(&mut self, uri_id: CompactId) -> ExiResult<&mut UriEntry<'arena>> {
        self.uris.get_mut(uri_id.0 as usize).ok_or_else(|| ExiError::invalid_input("unknown uri id"))
    }

    pub fn prefix_log(&self, uri_id: CompactId) -> ExiResult<u32> {
        Ok(self.uri_entry(uri_id)?.prefixes.log())
    }

    pub fn prefix_count(&self, uri_id: CompactId) -> ExiResult<u32> {
        Ok(self.uri_entry(uri_id)?.prefixes.len())
    }

    pub fn find_prefix(&self, uri_id: CompactId, prefix: &str) -> ExiResult<Option<CompactId>> {
        Ok(self.uri_entry(uri_id)?.prefixes.find(prefix))
    }

    pub fn get_prefix(&self, uri_id: CompactId, prefix_id: CompactId) -> ExiResult<Option<&'arena str>> {
        Ok(self.uri_entry(uri_id)?.prefixes.get(prefix_id))
    }

    pub fn add_prefix(&mut self, uri_id: CompactId, prefix: &str) -> ExiResult<CompactId> {
        if let Some(id) = self.uri_entry(uri_id)?.prefixes.find(prefix) {
            return Ok(id);
        }
        let interned: &'arena str = self.arena.alloc_str(prefix);
        Ok(self.uri_entry_mut(uri_id)?.prefixes.push(interned))
    }

    pub fn local_name_log(&self, uri_id: CompactId) -> ExiResult<u32> {
        Ok(bits_for_count(self.uri_entry(uri_id)?.local_names.len() as u32))
    }

    pub fn local_name_count(&self, uri_id: CompactId) -> ExiResult<u32> {
        Ok(self.uri_entry(uri_id)?.local_names.len() as u32)
    }

    pub fn find_local_name(&self, uri_id: CompactId, name: &str) -> ExiResult<Option<CompactId>> {
        Ok(self
            .uri_entry(uri_id)?
            .local_names
            .iter()
            .position(|e| e.local_name == name)
            .map(|i| CompactId(i as u32)))
    }

    pub fn get_local_name(&self, uri_id: CompactId, local_id: CompactId) -> ExiResult<Option<&LocalNameEntry<'arena>>> {
        Ok(self.uri_entry(uri_id)?.local_names.get(local_id.0 as usize))
    }

    /// Adds a local name on a miss, returning its new id. Idempotent on
    /// hit.
    pub fn add_local_name(&mut self, uri_id: CompactId, name: &str) -> ExiResult<CompactId> {
        if let Some(id) = self.find_local_name(uri_id, name)? {
            return Ok(id);
        }
        let local_name: &'arena str = self.arena.alloc_str(name);
        let uri = self.uri_entry(uri_id)?.uri;
        let qname: &'arena str = if uri.is_empty() {
            self.arena.alloc_str(name)
        } else {
            self.arena.alloc_str(&format!("{uri}:{name}"))
        };
        let capacity = self.value_partition_capacity;
        let entry = self.uri_entry_mut(uri_id)?;
        entry.local_names.push(LocalNameEntry { local_name, qname, local_values: ValuePartition::new(capacity) });
        Ok(CompactId(entry.local_names.len() as u32 - 1))
    }

    pub fn global_value_log(&self) -> u32 {
        self.global_values.log()
    }

    pub fn global_value_count(&self) -> u32 {
        self.global_values.len()
    }

    pub fn find_global_value(&self, value: &str) -> Option<CompactId> {
        self.global_values.find(value)
    }

    pub fn get_global_value(&self, id: CompactId) -> Option<&'arena str> {
        self.global_values.get(id)
    }

    /// Records a miss in both the local-value partition for
    /// `(uri_id, local_id)` and the global-value partition, as every
    /// EXI string miss does (spec.md §4.2 "miss" branch). Returns the
    /// arena-interned copy of `value` regardless of whether either
    /// partition actually retains it (a `ValuePartitionCapacity` of
    /// `0` still needs the caller to get back a live reference). A
    /// value whose code-point length exceeds `ValueMaxLength` (spec.md
    /// §4.4) is never stored in either partition, so it always takes
    /// the miss branch again on recurrence.
    pub fn add_value(&mut self, uri_id: CompactId, local_id: CompactId, value: &str) -> ExiResult<&'arena str> {
        let interned: &'arena str = self.arena.alloc_str(value);
        let fits = self.value_max_length.map_or(true, |max| value.chars().count() as u64 <= max as u64);
        if fits {
            self.global_values.push(interned);
        }
        let uri_entry = self.uri_entry_mut(uri_id)?;
        let local = uri_entry
            .local_names
            .get_mut(local_id.0 as usize)
            .ok_or_else(|| ExiError::invalid_input("unknown local name id"))?;
        if fits {
            local.local_values.push(interned);
        }
        Ok(interned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ExiOptions;

    #[test]
    fn setup_preseeds_xml_and_xsi_namespaces() {
        let arena = Bump::new();
        let table = StringTable::setup(&arena, &ExiOptions::default());
        assert_eq!(table.find_uri(""), Some(CompactId(0)));
        let xml_id = table.find_uri(XML_URI).expect("xml uri present");
        assert!(table.find_local_name(xml_id, "lang").unwrap().is_some());
        let xsi_id = table.find_uri(XSI_URI).expect("xsi uri present");
        assert!(table.find_local_name(xsi_id, "nil").unwrap().is_some());
        assert!(table.find_uri(XSD_URI).is_none());
    }

    #[test]
    fn schema_id_preseeds_xsd_namespace() {
        let arena = Bump::new();
        let mut options = ExiOptions::default();
        options.schema_id = Some("urn:example".into());
        let table = StringTable::setup(&arena, &options);
        assert!(table.find_uri(XSD_URI).is_some());
    }

    #[test]
    fn add_value_populates_both_local_and_global_partitions() {
        let arena = Bump::new();
        let mut table = StringTable::setup(&arena, &ExiOptions::default());
        let uri_id = table.add_uri("urn:demo");
        let local_id = table.add_local_name(uri_id, "widget").unwrap();
        table.add_value(uri_id, local_id, "hello").unwrap();
        assert_eq!(table.find_global_value("hello"), Some(CompactId(0)));
        let entry = table.get_local_name(uri_id, local_id).unwrap().unwrap();
        assert_eq!(entry.find_local_value("hello"), Some(CompactId(0)));
    }

    #[test]
    fn uri_lookup_is_idempotent_on_repeated_add() {
        let arena = Bump::new();
        let mut table = StringTable::setup(&arena, &ExiOptions::default());
        let first = table.add_uri("urn:demo");
        let second = table.add_uri("urn:demo");
        assert_eq!(first, second);
    }

    #[test]
    fn add_value_beyond_value_max_length_skips_both_partitions_but_still_returns_it() {
        let arena = Bump::new();
        let mut options = ExiOptions::default();
        options.value_max_length = Some(3);
        let mut table = StringTable::setup(&arena, &options);
        let uri_id = table.add_uri("urn:demo");
        let local_id = table.add_local_name(uri_id, "widget").unwrap();

        let returned = table.add_value(uri_id, local_id, "hello").unwrap();
        assert_eq!(returned, "hello");
        assert_eq!(table.find_global_value("hello"), None);
        let entry = table.get_local_name(uri_id, local_id).unwrap().unwrap();
        assert_eq!(entry.find_local_value("hello"), None);

        // A value within the limit is still stored normally.
        table.add_value(uri_id, local_id, "hi").unwrap();
        assert_eq!(table.find_global_value("hi"), Some(CompactId(0)));
    }
}
