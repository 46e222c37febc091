//! Re-emission of a decoded value tree back to the chunk format, plus the
//! byte-exact pass-through copy used to leave untouched components intact
//! across a recompile. Grounded on `cdb::Writer` in
//! `examples/original_source/include/cdb.h`. One deliberate asymmetry
//! carried over from the original: the reader's continuation queues are
//! LIFO (see `reader.rs`/DESIGN.md) but the writer's are FIFO, because a
//! value's sub-chunks are emitted in the order its fields were visited,
//! not stack order.

use std::collections::VecDeque;
use std::io::{Read, Seek, SeekFrom, Write};

use serde_json::Value;

use crate::config::WriterOptions;
use crate::error::{CdbError, Result};
use crate::manager::Manager;
use crate::model::ResourceIdRepr;
use crate::primitives::{
    write_f32, write_f64, write_i16, write_i32, write_i64, write_i8, write_string, write_u16,
    write_u32, write_u64, write_u8, ResourceId,
};
use crate::schema::{self, builtin, Class, Schema, TypeRef};

#[derive(Clone, Copy, PartialEq, Eq)]
enum ChunkKind {
    List,
    Map,
}

struct PendingWrite {
    value: Value,
    is_diff: bool,
    kind: ChunkKind,
}

struct PendingUserWrite {
    value: Value,
    cast_type: TypeRef,
    is_diff: bool,
}

/// A new object and its hash, ready to be appended to the database.
/// `resource_id`/`hash64` seed the `CompiledDB` lookup table; `hash64` is
/// always caller-supplied (see DESIGN.md: path-to-hash derivation is out
/// of scope).
pub struct NewObject {
    pub resource_id: ResourceId,
    pub hash64: u64,
    /// One `{"Type": ..., "Data": ...}` value per owned component.
    pub components: Vec<Value>,
}

pub struct Writer<W> {
    stream: W,
    options: WriterOptions,
    write_queue: VecDeque<PendingWrite>,
    user_write_queue: VecDeque<PendingUserWrite>,
}

impl<W: Write> Writer<W> {
    pub fn new(stream: W, options: WriterOptions) -> Self {
        Writer {
            stream,
            options,
            write_queue: VecDeque::new(),
            user_write_queue: VecDeque::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.stream
    }

    /// Emits `BETH`/`STRT`/`TYPE`/`CLAS*` exactly mirroring what
    /// `Reader::read_header` expects.
    pub fn write_header(&mut self, schema: &Schema, version: u32, chunk_size: u32) -> Result<()> {
        let mut beth = Vec::new();
        write_u32(&mut beth, version)?;
        write_u32(&mut beth, chunk_size)?;
        self.emit_chunk(b"BETH", &beth)?;

        self.emit_chunk(b"STRT", schema.strings.as_bytes())?;

        let mut type_payload = Vec::new();
        write_u32(&mut type_payload, schema.classes.len() as u32)?;
        self.emit_chunk(b"TYPE", &type_payload)?;

        for class in &schema.classes {
            let mut buf = Vec::new();
            schema::write_class(&mut buf, class)?;
            self.emit_chunk(b"CLAS", &buf)?;
        }
        Ok(())
    }

    /// Writes the `CompiledDB`, two empty `Collisions`/`Circular` lists,
    /// `DBFileIndex`, and the `Objects`/`Components`/`Edges` lists: the
    /// existing database's own entries plus whatever `creates` adds. The
    /// original computes the `Components` list's size field from
    /// `creates` alone even though it goes on to write existing
    /// components too (see DESIGN.md) — this writer uses the true total.
    pub fn write_database(&mut self, schema: &Schema, manager: &Manager, creates: &[NewObject]) -> Result<()> {
        self.write_compiled_db(schema, manager, creates)?;
        self.write_empty_list()?; // Collisions
        self.write_empty_list()?; // Circular
        self.write_file_index(schema, manager, creates)?;
        Ok(())
    }

    fn write_compiled_db(&mut self, schema: &Schema, manager: &Manager, creates: &[NewObject]) -> Result<()> {
        let type_id = schema
            .type_by_name("BSMaterial::Internal::CompiledDB")
            .ok_or(CdbError::UnknownType(0))?;

        let mut entries = serde_json::Map::new();
        for (resource, hash) in &manager.meta.hash_map {
            entries.insert(format_resource_key(resource), Value::String(hash.to_string()));
        }
        for create in creates {
            entries.insert(
                format_resource_key(&ResourceIdRepr {
                    dir: create.resource_id.dir,
                    file: create.resource_id.file,
                    ext: create.resource_id.ext,
                }),
                Value::String(create.hash64.to_string()),
            );
        }

        let value = serde_json::json!({
            "Type": "BSMaterial::Internal::CompiledDB",
            "Data": {
                "BuildVersion": manager.meta.build_version.clone(),
                "HashMap": { "Type": "<collection>", "ElementType": "uint64_t", "Data": entries },
                "Collisions": { "Type": "<collection>", "Data": [] },
                "Circular": { "Type": "<collection>", "Data": [] },
            }
        });

        self.write_top_value(schema, type_id, &value, false)
    }

    fn write_file_index(&mut self, schema: &Schema, manager: &Manager, creates: &[NewObject]) -> Result<()> {
        let type_id = schema.type_by_name("DBFileIndex").ok_or(CdbError::UnknownType(0))?;

        let objects: Vec<Value> = manager
            .file_index
            .objects
            .iter()
            .map(|o| {
                serde_json::json!({"Type": "ObjectInfo", "Data": {
                    "PersistentID": {"Type": "BSResource::ID", "Data": {
                        "Dir": o.persistent_id.dir.to_string(),
                        "File": o.persistent_id.file.to_string(),
                        "Ext": o.persistent_id.ext.to_string(),
                    }},
                    "DBID": o.db_id.0.to_string(),
                    "Parent": o.parent.0.to_string(),
                    "HasData": if o.has_data {"true"} else {"false"},
                }})
            })
            .collect();

        let mut components: Vec<Value> = manager
            .file_index
            .components
            .iter()
            .map(|c| {
                serde_json::json!({"Type": "ComponentInfo", "Data": {
                    "ObjectID": c.object_id.0.to_string(),
                    "Index": c.index.to_string(),
                    "Type": c.type_id.to_string(),
                }})
            })
            .collect();

        for create in creates {
            for (i, _) in create.components.iter().enumerate() {
                components.push(serde_json::json!({"Type": "ComponentInfo", "Data": {
                    "ObjectID": "0",
                    "Index": i.to_string(),
                    "Type": "0",
                }}));
            }
        }

        let edges: Vec<Value> = manager
            .file_index
            .edges
            .iter()
            .map(|e| {
                serde_json::json!({"Type": "EdgeInfo", "Data": {
                    "SourceID": e.source_id.0.to_string(),
                    "TargetID": e.target_id.0.to_string(),
                    "Index": e.index.to_string(),
                    "Type": e.type_id.to_string(),
                }})
            })
            .collect();

        let value = serde_json::json!({
            "Type": "DBFileIndex",
            "Data": {
                "ComponentTypes": { "Type": "<collection>", "Data": [] },
                "Objects": { "Type": "<collection>", "ElementType": "ObjectInfo", "Data": objects },
                "Components": { "Type": "<collection>", "ElementType": "ComponentInfo", "Data": components },
                "Edges": { "Type": "<collection>", "ElementType": "EdgeInfo", "Data": edges },
                "Optimized": if manager.file_index.optimized {"true"} else {"false"},
            }
        });

        self.write_top_value(schema, type_id, &value, false)
    }

    fn write_empty_list(&mut self) -> Result<()> {
        let mut payload = Vec::new();
        write_u32(&mut payload, builtin::UINT32)?;
        write_u32(&mut payload, 0)?;
        self.emit_chunk(b"LIST", &payload)
    }

    /// Re-encodes one already-shaped `{"Type": ..., "Data": ...}` component
    /// as a brand new `OBJT`. Used for every component a `create` adds;
    /// existing components are never run back through this path (they are
    /// byte-copied, see `copy_component`).
    pub fn write_component_json(&mut self, schema: &Schema, component: &Value) -> Result<()> {
        let type_name = component
            .get("Type")
            .and_then(Value::as_str)
            .ok_or(CdbError::UnknownType(0))?;
        let type_id = schema
            .resolve_type_name(type_name)
            .ok_or(CdbError::UnknownType(0))?;
        self.write_top_value(schema, type_id, component, false)
    }

    fn write_top_value(&mut self, schema: &Schema, type_id: TypeRef, value: &Value, is_diff: bool) -> Result<()> {
        self.write_queue.clear();
        self.user_write_queue.clear();
        let expected = self.options.verify_chunk_count.then(|| count_chunks(schema, value));

        let mut payload = Vec::new();
        write_u32(&mut payload, type_id)?;
        self.encode_value(schema, type_id, value, is_diff, &mut payload)?;
        self.emit_chunk(if is_diff { b"DIFF" } else { b"OBJT" }, &payload)?;

        let mut emitted = 0u32;
        loop {
            if let Some(item) = self.write_queue.pop_front() {
                self.emit_list_or_map(schema, item)?;
                emitted += 1;
            } else if let Some(item) = self.user_write_queue.pop_front() {
                self.emit_user(schema, item)?;
                emitted += 1;
            } else {
                break;
            }
        }

        if let Some(expected) = expected {
            if expected != emitted {
                return Err(CdbError::ChunkSizeMismatch {
                    expected,
                    actual: emitted,
                });
            }
        }
        Ok(())
    }

    fn encode_value(
        &mut self,
        schema: &Schema,
        type_id: TypeRef,
        value: &Value,
        is_diff: bool,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        if schema::is_builtin(type_id) {
            return self.encode_builtin(schema, type_id, value, is_diff, out);
        }

        let class = schema.class(type_id).cloned().ok_or(CdbError::UnknownType(type_id))?;
        let class_name = schema.name_of(type_id)?;

        if class_name == "BSComponentDB2::ID" {
            let id: u32 = value
                .get("Data")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            if is_diff {
                write_u16(out, 0)?;
                write_u32(out, id)?;
                write_u16(out, 0)?;
            } else {
                write_u32(out, id)?;
            }
            return Ok(());
        }

        if class.is_user() {
            self.user_write_queue.push_back(PendingUserWrite {
                value: value.clone(),
                cast_type: type_id,
                is_diff,
            });
            return Ok(());
        }

        self.encode_class_fields(schema, &class, value, is_diff, out)
    }

    fn encode_builtin(
        &mut self,
        schema: &Schema,
        type_id: TypeRef,
        value: &Value,
        is_diff: bool,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        use builtin::*;
        let s = || value.as_str().unwrap_or_default();
        match type_id {
            NULL => {}
            STRING => write_string(out, s())?,
            LIST => {
                self.write_queue.push_back(PendingWrite {
                    value: value.clone(),
                    is_diff,
                    kind: ChunkKind::List,
                });
            }
            MAP => {
                self.write_queue.push_back(PendingWrite {
                    value: value.clone(),
                    is_diff,
                    kind: ChunkKind::Map,
                });
            }
            REF => self.encode_ref(schema, value, is_diff, out)?,
            INT8 => write_i8(out, s().parse().unwrap_or(0))?,
            UINT8 => write_u8(out, s().parse().unwrap_or(0))?,
            INT16 => write_i16(out, s().parse().unwrap_or(0))?,
            UINT16 => write_u16(out, s().parse().unwrap_or(0))?,
            INT32 => write_i32(out, s().parse().unwrap_or(0))?,
            UINT32 => write_u32(out, s().parse().unwrap_or(0))?,
            INT64 => write_i64(out, s().parse().unwrap_or(0))?,
            UINT64 => write_u64(out, s().parse().unwrap_or(0))?,
            BOOL => write_u8(out, if s() == "true" { 1 } else { 0 })?,
            FLOAT => write_f32(out, s().parse().unwrap_or(0.0))?,
            DOUBLE => write_f64(out, s().parse().unwrap_or(0.0))?,
            other => return Err(CdbError::UnknownType(other)),
        }
        Ok(())
    }

    fn encode_ref(&mut self, schema: &Schema, value: &Value, is_diff: bool, out: &mut Vec<u8>) -> Result<()> {
        let inner = value.get("Data").cloned().unwrap_or(Value::Null);
        let target_name = inner.get("Type").and_then(Value::as_str).unwrap_or("<null>");
        let target_type = schema.resolve_type_name(target_name).ok_or(CdbError::UnknownType(0))?;
        write_u32(out, target_type)?;
        self.encode_value(schema, target_type, &inner, is_diff, out)
    }

    fn encode_class_fields(
        &mut self,
        schema: &Schema,
        class: &Class,
        value: &Value,
        is_diff: bool,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let data = value.get("Data").cloned().unwrap_or(Value::Null);

        if is_diff {
            for (index, field) in class.fields.iter().enumerate() {
                let field_name = schema.field_name(field)?;
                let Some(field_value) = data.get(&field_name) else {
                    continue;
                };
                if field_value.is_null() {
                    continue;
                }
                write_u16(out, index as u16)?;
                self.encode_value(schema, field.type_id, field_value, true, out)?;
            }
            write_u16(out, schema::FIELD_OFFSET_ABSENT)?;
        } else {
            for field in &class.fields {
                let field_name = schema.field_name(field)?;
                let field_value = data.get(&field_name).cloned().unwrap_or(Value::Null);
                self.encode_value(schema, field.type_id, &field_value, false, out)?;
            }
        }
        Ok(())
    }

    fn emit_list_or_map(&mut self, schema: &Schema, item: PendingWrite) -> Result<()> {
        match item.kind {
            ChunkKind::List => self.emit_list(schema, item.value, item.is_diff),
            ChunkKind::Map => self.emit_map(schema, item.value, item.is_diff),
        }
    }

    fn emit_list(&mut self, schema: &Schema, value: Value, is_diff: bool) -> Result<()> {
        let element_name = value.get("ElementType").and_then(Value::as_str).unwrap_or("<null>");
        let element_type = schema.resolve_type_name(element_name).ok_or(CdbError::UnknownType(0))?;
        let items = value
            .get("Data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut payload = Vec::new();
        write_u32(&mut payload, element_type)?;
        write_u32(&mut payload, items.len() as u32)?;
        for item in &items {
            self.encode_value(schema, element_type, item, is_diff, &mut payload)?;
        }
        self.emit_chunk(b"LIST", &payload)
    }

    fn emit_map(&mut self, schema: &Schema, value: Value, is_diff: bool) -> Result<()> {
        let value_name = value.get("ElementType").and_then(Value::as_str).unwrap_or("<null>");
        let value_type = schema.resolve_type_name(value_name).ok_or(CdbError::UnknownType(0))?;

        match value.get("Data") {
            Some(Value::Object(entries)) => {
                let key_type = schema.type_by_name("BSResource::ID").ok_or(CdbError::UnknownType(0))?;
                let mut payload = Vec::new();
                write_u32(&mut payload, key_type)?;
                write_u32(&mut payload, value_type)?;
                write_u32(&mut payload, entries.len() as u32)?;
                for (key, val) in entries {
                    let id = parse_resource_key(key).unwrap_or_default();
                    id.write(&mut payload)?;
                    self.encode_value(schema, value_type, val, is_diff, &mut payload)?;
                }
                self.emit_chunk(b"MAPC", &payload)
            }
            Some(Value::Array(pairs)) => {
                let key_type = builtin::STRING;
                let mut payload = Vec::new();
                write_u32(&mut payload, key_type)?;
                write_u32(&mut payload, value_type)?;
                write_u32(&mut payload, pairs.len() as u32)?;
                for pair in pairs {
                    let key = pair.pointer("/Data/Key").and_then(Value::as_str).unwrap_or_default();
                    write_string(&mut payload, key)?;
                    let val = pair.pointer("/Data/Value").cloned().unwrap_or(Value::Null);
                    self.encode_value(schema, value_type, &val, is_diff, &mut payload)?;
                }
                self.emit_chunk(b"MAPC", &payload)
            }
            _ => {
                let mut payload = Vec::new();
                write_u32(&mut payload, builtin::UINT32)?;
                write_u32(&mut payload, value_type)?;
                write_u32(&mut payload, 0)?;
                self.emit_chunk(b"MAPC", &payload)
            }
        }
    }

    fn emit_user(&mut self, schema: &Schema, item: PendingUserWrite) -> Result<()> {
        let mut payload = Vec::new();
        write_u32(&mut payload, item.cast_type)?;
        write_u32(&mut payload, item.cast_type)?;
        self.encode_value(schema, item.cast_type, &item.value, item.is_diff, &mut payload)?;
        write_u32(&mut payload, 0)?; // trailing userValue, always 0
        self.emit_chunk(if item.is_diff { b"USRD" } else { b"USER" }, &payload)
    }

    fn emit_chunk(&mut self, sig: &[u8; 4], payload: &[u8]) -> Result<()> {
        self.stream.write_all(sig)?;
        write_u32(&mut self.stream, payload.len() as u32)?;
        self.stream.write_all(payload)?;
        Ok(())
    }

    /// Copies one component's chunks byte-for-byte from `source`, starting
    /// at the `OBJT`/`DIFF` chunk it is currently positioned on and
    /// continuing through any `LIST`/`MAPC`/`USER`/`USRD` continuations
    /// until the next component begins or the stream ends.
    pub fn copy_component<R: Read + Seek>(&mut self, source: &mut R) -> Result<()> {
        loop {
            let mut header = [0u8; 8];
            let n = source.read(&mut header[..4])?;
            if n == 0 {
                return Ok(());
            }
            if n < 4 {
                source.read_exact(&mut header[n..4])?;
            }
            source.read_exact(&mut header[4..8])?;
            let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

            self.stream.write_all(&header)?;
            let mut payload = vec![0u8; size];
            source.read_exact(&mut payload)?;
            self.stream.write_all(&payload)?;

            let mut peek = [0u8; 1];
            let peeked = source.read(&mut peek)?;
            if peeked == 0 {
                return Ok(());
            }
            source.seek(SeekFrom::Current(-1))?;
            if peek[0] == b'O' || peek[0] == b'D' {
                return Ok(());
            }
        }
    }
}

/// Advances `source` past one component's whole chunk group without
/// copying its bytes anywhere, mirroring `Reader::SkipNextObject` in the
/// original. Used to step over the `CompiledDB` and `DBFileIndex`
/// components before copying the rest of the file through unchanged.
pub fn skip_component<R: Read + Seek>(source: &mut R) -> Result<()> {
    loop {
        let mut header = [0u8; 8];
        let n = source.read(&mut header[..4])?;
        if n == 0 {
            return Ok(());
        }
        if n < 4 {
            source.read_exact(&mut header[n..4])?;
        }
        source.read_exact(&mut header[4..8])?;
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as i64;
        source.seek(SeekFrom::Current(size))?;

        let mut peek = [0u8; 1];
        let peeked = source.read(&mut peek)?;
        if peeked == 0 {
            return Ok(());
        }
        source.seek(SeekFrom::Current(-1))?;
        if peek[0] == b'O' || peek[0] == b'D' {
            return Ok(());
        }
    }
}

/// Recursively counts the continuation chunks a value would expand into
/// if written: one per collection, plus one per user-cast class. Used to
/// advance the header's declared `chunkSize` for newly created components.
/// Grounded on `Reader::GetJsonChunkCount`.
pub fn count_chunks(schema: &Schema, value: &Value) -> u32 {
    let mut count = 0;
    count_chunks_inner(schema, value, &mut count);
    count
}

fn count_chunks_inner(schema: &Schema, value: &Value, count: &mut u32) {
    let Some(type_name) = value.get("Type").and_then(Value::as_str) else {
        return;
    };

    if type_name == "<collection>" {
        *count += 1;
        match value.get("Data") {
            Some(Value::Array(items)) => {
                for item in items {
                    count_chunks_inner(schema, item, count);
                }
            }
            Some(Value::Object(entries)) => {
                for item in entries.values() {
                    count_chunks_inner(schema, item, count);
                }
            }
            _ => {}
        }
        return;
    }

    if type_name == "<ref>" {
        if let Some(inner) = value.get("Data") {
            count_chunks_inner(schema, inner, count);
        }
        return;
    }

    if let Some(type_id) = schema.resolve_type_name(type_name) {
        if let Some(class) = schema.class(type_id) {
            if class.is_user() {
                *count += 1;
            }
        }
    }

    if let Some(data) = value.get("Data").and_then(Value::as_object) {
        for v in data.values() {
            count_chunks_inner(schema, v, count);
        }
    }
}

fn format_resource_key(id: &ResourceIdRepr) -> String {
    format!("{:08x}:{:08x}:{:08x}", id.dir, id.file, id.ext)
}

fn parse_resource_key(key: &str) -> Option<ResourceId> {
    let mut parts = key.split(':');
    let dir = u32::from_str_radix(parts.next()?, 16).ok()?;
    let file = u32::from_str_radix(parts.next()?, 16).ok()?;
    let ext = u32::from_str_radix(parts.next()?, 16).ok()?;
    Some(ResourceId { dir, file, ext })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReaderOptions;
    use crate::reader::Reader;
    use crate::schema::{Class, Field, StringTable};
    use std::io::Cursor;

    fn simple_schema() -> Schema {
        let mut strings = Vec::new();
        strings.extend_from_slice(b"Widget\0Value\0");
        let classes = vec![Class {
            name: 0,
            type_id: 100,
            flags: 0,
            fields: vec![Field {
                name: 7,
                type_id: builtin::INT32,
                offset: 0xFFFF,
                size: 4,
            }],
        }];
        Schema::new(StringTable::from_bytes(strings), classes)
    }

    #[test]
    fn header_round_trips_through_reader() {
        let schema = simple_schema();
        let mut buf = Vec::new();
        {
            let mut writer = Writer::new(&mut buf, WriterOptions::default());
            writer.write_header(&schema, 5, 0).unwrap();
        }
        let mut reader = Reader::new(Cursor::new(buf), ReaderOptions::default());
        reader.read_header().unwrap();
        assert_eq!(reader.version(), 5);
        assert_eq!(reader.schema().classes.len(), 1);
    }

    #[test]
    fn component_round_trips_through_reader() {
        let schema = simple_schema();
        let component = serde_json::json!({"Type": "Widget", "Data": {"Value": "7"}});

        let mut buf = Vec::new();
        {
            let mut writer = Writer::new(&mut buf, WriterOptions::default());
            writer.write_header(&schema, 1, 4).unwrap();
            writer.write_component_json(&schema, &component).unwrap();
        }

        let mut reader = Reader::new(Cursor::new(buf), ReaderOptions::default());
        reader.read_header().unwrap();
        let components = reader.read_all_components().unwrap();
        assert_eq!(components, vec![component]);
    }

    #[test]
    fn count_chunks_counts_one_per_collection() {
        let schema = simple_schema();
        let value = serde_json::json!({
            "Type": "Widget",
            "Data": {
                "Value": {"Type": "<collection>", "ElementType": "int32", "Data": ["1", "2"]}
            }
        });
        assert_eq!(count_chunks(&schema, &value), 1);
    }
}
