//! Minimal fixed-behavior demonstration of the reader/writer round trip:
//! builds a tiny in-memory schema and database, writes it, reads it back,
//! and prints the composed JSON for one object. Not a CLI tool — directory
//! scanning, path arguments, and material export belong to a caller that
//! links this crate as a library (see `glue::export_material` /
//! `glue::recompile_database`).

use std::io::Cursor;

use cdb::config::{ReaderOptions, WriterOptions};
use cdb::manager::Manager;
use cdb::model::{ComponentInfo, DatabaseMeta, EdgeInfo, FileIndex, ObjectInfo, ResourceIdRepr};
use cdb::primitives::DbId;
use cdb::reader::Reader;
use cdb::schema::{builtin, Class, Field, Schema, StringTable};
use cdb::writer::Writer;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();
}

fn demo_schema() -> Schema {
    let mut strings = Vec::new();
    strings.extend_from_slice(b"BSMaterial::Color\0Value\0");
    let classes = vec![Class {
        name: 0,
        type_id: 1000,
        flags: 0,
        fields: vec![Field {
            name: 19,
            type_id: builtin::FLOAT,
            offset: 0xFFFF,
            size: 4,
        }],
    }];
    Schema::new(StringTable::from_bytes(strings), classes)
}

fn main() {
    init_logging();

    let schema = demo_schema();
    let type_id = schema.classes[0].type_id;
    let component = serde_json::json!({"Type": "BSMaterial::Color", "Data": {"Value": "0.5"}});

    let mut bytes = Vec::new();
    {
        let mut writer = Writer::new(&mut bytes, WriterOptions::default());
        writer.write_header(&schema, 1, 4).expect("write header");
        writer
            .write_component_json(&schema, &component)
            .expect("write component");
    }
    tracing::info!(bytes = bytes.len(), "wrote demo database");

    let mut reader = Reader::new(Cursor::new(bytes), ReaderOptions::default());
    reader.read_header().expect("read header");
    let components = reader.read_all_components().expect("read components");

    let file_index = FileIndex {
        component_types: Vec::new(),
        objects: vec![ObjectInfo {
            persistent_id: ResourceIdRepr { dir: 0, file: 0, ext: 0 },
            db_id: DbId(1),
            parent: DbId(0),
            has_data: true,
        }],
        components: vec![ComponentInfo {
            object_id: DbId(1),
            index: 0,
            type_id,
        }],
        edges: Vec::<EdgeInfo>::new(),
        optimized: false,
    };
    let manager = Manager::build(reader.schema().clone(), DatabaseMeta::default(), file_index, components);

    let composed = manager.full_json(DbId(1)).expect("compose object");
    println!("{}", serde_json::to_string_pretty(&composed).unwrap());
}
