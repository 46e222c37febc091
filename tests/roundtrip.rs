use std::io::Cursor;

use cdb::config::{ReaderOptions, WriterOptions};
use cdb::manager::Manager;
use cdb::model::{DatabaseMeta, EdgeInfo, FileIndex, ObjectInfo, ResourceIdRepr};
use cdb::primitives::DbId;
use cdb::reader::Reader;
use cdb::schema::{builtin, Class, Field, Schema, StringTable};
use cdb::writer::Writer;
use proptest::prelude::*;

fn widget_schema() -> Schema {
    let mut strings = Vec::new();
    strings.extend_from_slice(b"Widget\0Name\0Value\0Tags\0");
    let classes = vec![Class {
        name: 0,
        type_id: 500,
        flags: 0,
        fields: vec![
            Field {
                name: 7,
                type_id: builtin::STRING,
                offset: 0xFFFF,
                size: 0,
            },
            Field {
                name: 12,
                type_id: builtin::INT32,
                offset: 0xFFFF,
                size: 4,
            },
            Field {
                name: 18,
                type_id: builtin::LIST,
                offset: 0xFFFF,
                size: 0,
            },
        ],
    }];
    Schema::new(StringTable::from_bytes(strings), classes)
}

/// A header plus a single non-diff `Widget` component round-trips through
/// `Writer` and back through `Reader` byte-identically at the value level.
#[test]
fn header_and_component_round_trip() {
    let schema = widget_schema();
    let component = serde_json::json!({
        "Type": "Widget",
        "Data": {
            "Name": "torch",
            "Value": "7",
            "Tags": {"Type": "<collection>", "ElementType": "int32_t", "Data": ["1", "2", "3"]},
        }
    });

    let mut buf = Vec::new();
    {
        let mut writer = Writer::new(&mut buf, WriterOptions::default());
        writer.write_header(&schema, 3, 5).unwrap();
        writer.write_component_json(&schema, &component).unwrap();
    }

    let mut reader = Reader::new(Cursor::new(buf), ReaderOptions::default());
    reader.read_header().unwrap();
    assert_eq!(reader.version(), 3);
    let components = reader.read_all_components().unwrap();
    assert_eq!(components, vec![component]);
}

/// Every class's `TypeRef` maps back to exactly one class via `Schema::class`,
/// and the builtin/class namespaces never collide.
#[test]
fn type_table_is_injective() {
    let schema = widget_schema();
    for class in &schema.classes {
        assert!(!cdb::schema::is_builtin(class.type_id));
        assert_eq!(schema.class(class.type_id).unwrap().type_id, class.type_id);
    }
}

/// A manager built directly from hand-constructed object/component tables
/// composes a three-level parent chain deterministically, and doing it
/// twice produces the same JSON.
#[test]
fn composition_is_deterministic_across_runs() {
    use cdb::model::ComponentInfo;

    let schema = widget_schema();
    let type_id = schema.classes[0].type_id;
    let objects = vec![
        ObjectInfo {
            persistent_id: ResourceIdRepr { dir: 0, file: 0, ext: 0 },
            db_id: DbId(3),
            parent: DbId(2),
            has_data: true,
        },
        ObjectInfo {
            persistent_id: ResourceIdRepr { dir: 0, file: 0, ext: 0 },
            db_id: DbId(2),
            parent: DbId(1),
            has_data: true,
        },
        ObjectInfo {
            persistent_id: ResourceIdRepr { dir: 0, file: 0, ext: 0 },
            db_id: DbId(1),
            parent: DbId(0),
            has_data: true,
        },
    ];
    let components = vec![
        ComponentInfo { object_id: DbId(1), index: 0, type_id },
        ComponentInfo { object_id: DbId(3), index: 0, type_id },
    ];
    let file_index = FileIndex {
        component_types: Vec::new(),
        objects,
        components,
        edges: Vec::<EdgeInfo>::new(),
        optimized: false,
    };
    let values = vec![
        serde_json::json!({"Type": "Widget", "Data": {"Name": "root", "Value": "1"}}),
        serde_json::json!({"Type": "Widget", "Data": {"Value": "3"}}),
    ];
    let manager = Manager::build(schema, DatabaseMeta::default(), file_index, values);

    let first = manager.full_json(DbId(3)).unwrap();
    let second = manager.full_json(DbId(3)).unwrap();
    assert_eq!(first, second);

    let data = &first["Components"][0]["Data"];
    assert_eq!(data["Name"], "root");
    assert_eq!(data["Value"], "3");
}

proptest! {
    /// `Manager::parents` always terminates and starts with the object
    /// itself, no matter how the `parent` links are wired — including a
    /// parent pointing at itself or at an object further down the chain
    /// that eventually loops back.
    #[test]
    fn parent_chain_terminates_for_any_wiring(parents in proptest::collection::vec(0u32..8, 8)) {
        let schema = widget_schema();
        let objects = (1u32..=8)
            .zip(parents.iter())
            .map(|(id, &parent)| ObjectInfo {
                persistent_id: ResourceIdRepr { dir: 0, file: 0, ext: 0 },
                db_id: DbId(id),
                parent: DbId(parent),
                has_data: true,
            })
            .collect();
        let file_index = FileIndex {
            component_types: Vec::new(),
            objects,
            components: Vec::new(),
            edges: Vec::<EdgeInfo>::new(),
            optimized: false,
        };
        let manager = Manager::build(schema, DatabaseMeta::default(), file_index, Vec::new());

        for id in 1u32..=8 {
            let chain = manager.parents(DbId(id));
            prop_assert!(!chain.is_empty());
            prop_assert_eq!(chain[0], DbId(id));
            prop_assert!(chain.len() <= 8);
        }
    }
}
