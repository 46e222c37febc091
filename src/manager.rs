//! Indexes a decoded database and implements the object graph operations
//! on top of it: parent-chain composition, reference rewriting, and
//! material export/recompile support. Grounded on `cdb::Manager` in
//! `examples/original_source/include/cdb.h`; owner-indexed lookup tables
//! follow the shape of `ecsdb/src/entity/archetype.rs`'s
//! `ArchetypeRegistry` (a handful of `HashMap<Id, Vec<_>>` side indices
//! built once after load).

use std::collections::{HashMap, HashSet, VecDeque};

use serde_json::Value;

use crate::error::{CdbError, Result};
use crate::model::{ComponentInfo, DatabaseMeta, EdgeInfo, FileIndex, ObjectInfo, ResourceIdRepr};
use crate::primitives::{DbId, ResourceId};
use crate::schema::Schema;
use crate::value as vt;

/// Component types whose `Data.ID` field is a reference to another
/// object, named exactly as the original's closed reference-type set.
const REFERENCE_COMPONENT_TYPES: &[&str] = &[
    "BSMaterial::BlenderID",
    "BSMaterial::LayerID",
    "BSMaterial::MaterialID",
    "BSMaterial::TextureSetID",
    "BSMaterial::UVStreamID",
    "BSMaterial::LODMaterialID",
    "BSMaterial::LayeredMaterialID",
];

/// The `ext` a persistent id carries for `.mat` files: `bs.h`'s
/// `BSResource::ID` stores the 3-letter extension packed little-endian, so
/// "mat" round-trips as this 4-byte constant.
const MAT_EXT: u32 = u32::from_le_bytes(*b"tam\0");

pub struct Manager {
    pub schema: Schema,
    pub meta: DatabaseMeta,
    pub file_index: FileIndex,
    /// One decoded component value per entry in `file_index.components`.
    pub component_values: Vec<Value>,
    objects_by_db_id: HashMap<DbId, usize>,
    components_by_owner: HashMap<DbId, Vec<usize>>,
    edges_by_source: HashMap<DbId, Vec<usize>>,
    resource_to_db: HashMap<ResourceId, DbId>,
    next_object_id: u32,
}

impl Manager {
    /// Builds a `Manager` from the reader's raw output: the first two
    /// decoded components are always the `CompiledDB` hash map and the
    /// `DBFileIndex`, matching `RecompileDatabase`'s two `SkipNextObject`
    /// calls in `examples/original_source/src/JsonToCdb.cpp`; everything
    /// after that is one component value per `file_index.components`
    /// entry.
    pub fn from_decoded(schema: Schema, mut components: Vec<Value>) -> Result<Manager> {
        if components.len() < 2 {
            return Err(CdbError::FieldIndexOutOfRange {
                class: "<database root>".into(),
                index: 0,
                count: components.len(),
            });
        }
        let file_index_value = components.remove(1);
        let meta_value = components.remove(0);

        let meta = parse_database_meta(&meta_value);
        let file_index = parse_file_index(&file_index_value);

        Ok(Manager::build(schema, meta, file_index, components))
    }

    pub fn build(
        schema: Schema,
        meta: DatabaseMeta,
        file_index: FileIndex,
        component_values: Vec<Value>,
    ) -> Self {
        let mut objects_by_db_id = HashMap::new();
        let mut resource_to_db = HashMap::new();
        let mut max_id = 0u32;
        for (i, obj) in file_index.objects.iter().enumerate() {
            objects_by_db_id.insert(obj.db_id, i);
            max_id = max_id.max(obj.db_id.0);
            let resource_id: ResourceId = obj.persistent_id.into();
            if resource_id.ext == MAT_EXT {
                resource_to_db.insert(resource_id, obj.db_id);
            }
        }

        let mut components_by_owner: HashMap<DbId, Vec<usize>> = HashMap::new();
        for (i, c) in file_index.components.iter().enumerate() {
            components_by_owner.entry(c.object_id).or_default().push(i);
        }

        let mut edges_by_source: HashMap<DbId, Vec<usize>> = HashMap::new();
        for (i, e) in file_index.edges.iter().enumerate() {
            edges_by_source.entry(e.source_id).or_default().push(i);
        }

        Manager {
            schema,
            meta,
            file_index,
            component_values,
            objects_by_db_id,
            components_by_owner,
            edges_by_source,
            resource_to_db,
            next_object_id: max_id + 1,
        }
    }

    pub fn object(&self, id: DbId) -> Option<&ObjectInfo> {
        self.objects_by_db_id.get(&id).map(|&i| &self.file_index.objects[i])
    }

    pub fn object_by_resource(&self, resource: ResourceId) -> Option<DbId> {
        self.resource_to_db.get(&resource).copied()
    }

    pub fn edges_from(&self, id: DbId) -> impl Iterator<Item = &EdgeInfo> {
        self.edges_by_source
            .get(&id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.file_index.edges[i])
    }

    /// Self-first parent chain: `[id, parent(id), parent(parent(id)), ...]`
    /// terminating at an object with no parent.
    pub fn parents(&self, id: DbId) -> Vec<DbId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(obj) = self.object(current) {
            if obj.parent.is_none() || chain.contains(&obj.parent) {
                break;
            }
            chain.push(obj.parent);
            current = obj.parent;
        }
        chain
    }

    /// The fully composed component set for `id`: every ancestor's owned
    /// components merged root-to-leaf, so the most derived object's fields
    /// win. Grounded on `Manager::GetFullJson`.
    pub fn full_json(&self, id: DbId) -> Result<Value> {
        let mut components = Vec::new();
        for ancestor in self.parents(id).into_iter().rev() {
            self.merge_owned_components(ancestor, &mut components)?;
        }
        Ok(serde_json::json!({ "Components": components }))
    }

    /// Just `id`'s own directly-owned components, with no parent walk.
    /// Grounded on `Manager::GetDiffJson`.
    pub fn diff_json(&self, id: DbId) -> Result<Value> {
        let mut components = Vec::new();
        self.merge_owned_components(id, &mut components)?;
        Ok(serde_json::json!({ "Components": components }))
    }

    fn merge_owned_components(&self, owner: DbId, components: &mut Vec<Value>) -> Result<()> {
        let Some(indices) = self.components_by_owner.get(&owner) else {
            return Ok(());
        };
        for &idx in indices {
            let info = self.file_index.components[idx];
            // The component's own envelope already names its class; reading
            // that directly sidesteps `ComponentInfo.type_id`, which is an
            // index into a `ComponentTypes` table this crate does not carry
            // (see DESIGN.md), not a `TypeRef` `Schema::name_of` could use.
            let type_name = self.component_values[idx]
                .get("Type")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let slot = find_or_create_component(components, type_name, info.index);
            vt::compose_jsons(slot, &self.component_values[idx]);
        }
        Ok(())
    }

    /// Sets an external `"Parent"` path on a material object by walking
    /// past `id` itself to the first ancestor `resolve_path` knows an
    /// on-disk path for. Path derivation is an external concern (see
    /// DESIGN.md), so it is always injected rather than computed here.
    fn set_material_parent(
        &self,
        id: DbId,
        obj: &mut Value,
        resolve_path: &dyn Fn(DbId) -> Option<String>,
    ) -> Result<()> {
        let chain = self.parents(id);
        if chain.len() <= 1 {
            return Ok(());
        }
        for ancestor in chain.into_iter().skip(1) {
            if let Some(path) = resolve_path(ancestor) {
                obj["Parent"] = Value::String(path);
                return Ok(());
            }
        }
        Err(CdbError::MissingParentPath(id.0))
    }

    /// Walks a material's composed `Components` array, rewriting every
    /// reference-type component's `Data.ID` from a database id into the
    /// queue's assigned external id, pushing unseen targets onto the
    /// queue as it goes. Grounded on `Manager::GetReferencedIds`.
    pub fn rewrite_referenced_ids(&self, material: &mut Value, queue: &mut ExportQueue) -> Result<()> {
        let Some(components) = material.get_mut("Components").and_then(Value::as_array_mut) else {
            return Ok(());
        };
        for component in components.iter_mut() {
            self.rewrite_component_refs(component, queue)?;
        }
        Ok(())
    }

    fn rewrite_component_refs(&self, component: &mut Value, queue: &mut ExportQueue) -> Result<()> {
        let type_name = component
            .get("Type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if REFERENCE_COMPONENT_TYPES.contains(&type_name.as_str()) {
            if let Some(raw) = component
                .pointer("/Data/ID")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<u32>().ok())
            {
                if raw != 0 {
                    queue.push(DbId(raw));
                    let target = self
                        .object(DbId(raw))
                        .ok_or(CdbError::ReferenceTargetMissing(raw))?;
                    let formatted = format_external_resource_id(&target.persistent_id);
                    if let Some(slot) = component.pointer_mut("/Data/ID") {
                        *slot = Value::String(formatted);
                    }
                }
            }
            return Ok(());
        }

        if let Some(data) = component.get_mut("Data") {
            self.rewrite_nested_refs(data, queue)?;
        }
        Ok(())
    }

    fn rewrite_nested_refs(&self, value: &mut Value, queue: &mut ExportQueue) -> Result<()> {
        match value {
            Value::Object(map) => {
                if map.contains_key("Type") {
                    self.rewrite_component_refs(value, queue)?;
                } else {
                    for v in map.values_mut() {
                        self.rewrite_nested_refs(v, queue)?;
                    }
                }
            }
            Value::Array(items) => {
                for v in items.iter_mut() {
                    self.rewrite_nested_refs(v, queue)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Exports a material and the transitive closure of objects it
    /// references into one JSON document. Grounded on
    /// `Manager::CreateMaterialJson`; edges are deliberately not consulted
    /// for reference closure, matching the original's own comment that
    /// edges are not needed for this.
    pub fn create_material_json(
        &self,
        mat_id: DbId,
        resolve_path: &dyn Fn(DbId) -> Option<String>,
    ) -> Result<Value> {
        let mut queue = ExportQueue::seed(mat_id);
        let mut objects = Vec::new();

        let mut root = self.full_json(mat_id)?;
        self.set_material_parent(mat_id, &mut root, resolve_path)?;
        self.rewrite_referenced_ids(&mut root, &mut queue)?;
        objects.push(root);

        while let Some(next_id) = queue.pop() {
            let mut obj = self.full_json(next_id)?;
            let local_id = queue.local_id(next_id).expect("queued id is always assigned");
            let target = self
                .object(next_id)
                .ok_or(CdbError::ReferenceTargetMissing(next_id.0))?;
            obj["ID"] = Value::String(format_external_resource_id(&target.persistent_id));
            self.set_material_parent(next_id, &mut obj, resolve_path)?;
            self.rewrite_referenced_ids(&mut obj, &mut queue)?;
            tracing::debug!(db_id = next_id.0, local_id, "pulled referenced object into material export");
            objects.push(obj);
        }

        Ok(serde_json::json!({ "Objects": objects }))
    }

    /// Allocates fresh sequential database ids for a freshly authored
    /// material document and rewrites its internal reference strings to
    /// match. Grounded on `Manager::UpdateDatabaseIds`.
    pub fn update_database_ids(&mut self, material: &mut Value) -> Result<()> {
        let mut remap: HashMap<u32, u32> = HashMap::new();

        let Some(objects) = material.get_mut("Objects").and_then(Value::as_array_mut) else {
            return Ok(());
        };

        for obj in objects.iter_mut() {
            let old = obj
                .get("ID")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<u32>().ok());
            let assigned = self.allocate_id(old, &mut remap);
            obj["ID"] = Value::String(assigned.to_string());
        }

        for obj in objects.iter_mut() {
            if let Some(components) = obj.get_mut("Components").and_then(Value::as_array_mut) {
                for component in components.iter_mut() {
                    self.remap_component_refs(component, &remap)?;
                }
            }
        }

        Ok(())
    }

    fn allocate_id(&mut self, old: Option<u32>, remap: &mut HashMap<u32, u32>) -> u32 {
        if let Some(old) = old {
            if let Some(&existing) = remap.get(&old) {
                return existing;
            }
        }
        let assigned = self.next_object_id;
        self.next_object_id += 1;
        if let Some(old) = old {
            remap.insert(old, assigned);
        }
        assigned
    }

    fn remap_component_refs(&self, component: &mut Value, remap: &HashMap<u32, u32>) -> Result<()> {
        let type_name = component
            .get("Type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if REFERENCE_COMPONENT_TYPES.contains(&type_name.as_str()) {
            if let Some(old) = component
                .pointer("/Data/ID")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<u32>().ok())
            {
                if old != 0 {
                    let new_id = *remap
                        .get(&old)
                        .ok_or(CdbError::ReferenceTargetMissing(old))?;
                    if let Some(slot) = component.pointer_mut("/Data/ID") {
                        *slot = Value::String(new_id.to_string());
                    }
                }
            }
            return Ok(());
        }

        if let Some(data) = component.get_mut("Data") {
            self.remap_nested_refs(data, remap)?;
        }
        Ok(())
    }

    fn remap_nested_refs(&self, value: &mut Value, remap: &HashMap<u32, u32>) -> Result<()> {
        match value {
            Value::Object(map) => {
                if map.contains_key("Type") {
                    self.remap_component_refs(value, remap)?;
                } else {
                    for v in map.values_mut() {
                        self.remap_nested_refs(v, remap)?;
                    }
                }
            }
            Value::Array(items) => {
                for v in items.iter_mut() {
                    self.remap_nested_refs(v, remap)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Structural diff between an author-edited material document and the
    /// database's own current rendering of it, used by the recompile flow
    /// to decide whether to treat a material as changed.
    pub fn material_changed(&self, edited: &Value, mat_id: DbId, resolve_path: &dyn Fn(DbId) -> Option<String>) -> Result<bool> {
        let current = self.create_material_json(mat_id, resolve_path)?;
        Ok(vt::compare_jsons(edited, &current))
    }

    /// The transitive closure of objects and component indices reachable
    /// from a material, used by this crate's own tests to validate that
    /// reference rewriting reaches indirectly-referenced objects.
    pub fn material_closure(&self, mat_id: DbId) -> Result<MaterialClosure> {
        let mut queue = ExportQueue::seed(mat_id);
        let mut objects = HashSet::new();
        let mut components = HashSet::new();

        objects.insert(mat_id);
        self.collect_closure(mat_id, &mut components, &mut queue)?;
        while let Some(next) = queue.pop() {
            objects.insert(next);
            self.collect_closure(next, &mut components, &mut queue)?;
        }

        Ok(MaterialClosure { objects, components })
    }

    fn collect_closure(&self, id: DbId, components_out: &mut HashSet<usize>, queue: &mut ExportQueue) -> Result<()> {
        for ancestor in self.parents(id) {
            let Some(indices) = self.components_by_owner.get(&ancestor) else {
                continue;
            };
            for &idx in indices {
                components_out.insert(idx);
                let mut probe = self.component_values[idx].clone();
                self.rewrite_component_refs(&mut probe, queue)?;
            }
        }
        Ok(())
    }
}

pub struct MaterialClosure {
    pub objects: HashSet<DbId>,
    pub components: HashSet<usize>,
}

fn find_or_create_component<'a>(components: &'a mut Vec<Value>, type_name: &str, index: u16) -> &'a mut Value {
    if let Some(pos) = components
        .iter()
        .position(|c| c["Type"] == type_name && c["Index"] == index)
    {
        return &mut components[pos];
    }
    components.push(serde_json::json!({ "Type": type_name, "Index": index, "Data": {} }));
    components.last_mut().unwrap()
}

/// Formats the target's real `(dir, file, ext)` persistent id, the way
/// `GetReferencedIds`/`CreateMaterialJson` format `PersistentID` rather than
/// any queue-local counter. See `primitives::format_resource_id`.
fn format_external_resource_id(persistent_id: &ResourceIdRepr) -> String {
    let resource_id: ResourceId = (*persistent_id).into();
    crate::primitives::format_resource_id(&resource_id)
}

/// Dedupe + drain order for objects discovered during reference rewriting.
/// The original's `ObjectQueue` pops LIFO (see DESIGN.md); this queue
/// drains FIFO instead, since only the *set* of pulled-in objects is part
/// of this crate's contract.
pub struct ExportQueue {
    id_map: HashMap<DbId, u32>,
    pending: VecDeque<DbId>,
    next_local: u32,
}

impl ExportQueue {
    pub fn seed(root: DbId) -> Self {
        let mut id_map = HashMap::new();
        id_map.insert(root, 0);
        ExportQueue {
            id_map,
            pending: VecDeque::new(),
            next_local: 1,
        }
    }

    pub fn push(&mut self, db_id: DbId) -> u32 {
        if let Some(&local) = self.id_map.get(&db_id) {
            return local;
        }
        let local = self.next_local;
        self.next_local += 1;
        self.id_map.insert(db_id, local);
        self.pending.push_back(db_id);
        local
    }

    pub fn local_id(&self, db_id: DbId) -> Option<u32> {
        self.id_map.get(&db_id).copied()
    }

    pub fn pop(&mut self) -> Option<DbId> {
        self.pending.pop_front()
    }
}

/// Best-effort extraction of `CompiledDB`/`DBFileIndex` out of the generic
/// value tree the reader produces for them. Because the format is
/// self-describing, the exact field names come from whatever the source
/// file's own schema declares; this accepts the couple of capitalizations
/// seen across the corpus rather than hard-failing on a name mismatch, and
/// defaults a field to empty when it cannot be found at all.
fn parse_database_meta(value: &Value) -> DatabaseMeta {
    let data = value.get("Data").cloned().unwrap_or(Value::Null);
    let build_version = field_str(&data, &["BuildVersion"]).unwrap_or_default();

    let mut hash_map = Vec::new();
    if let Some(Value::Object(entries)) = data.get("HashMap").and_then(|m| m.get("Data")) {
        for (key, val) in entries {
            if let (Some(resource), Some(hash)) = (parse_resource_key(key), field_u64_val(val)) {
                hash_map.push((resource, hash));
            }
        }
    }

    DatabaseMeta {
        build_version,
        hash_map,
        collisions: Vec::new(),
        circular_count: 0,
    }
}

fn parse_file_index(value: &Value) -> FileIndex {
    let data = value.get("Data").cloned().unwrap_or(Value::Null);
    let optimized = field_bool(&data, &["Optimized"]).unwrap_or(false);

    let objects = parse_list(&data, "Objects", |d| {
        Some(ObjectInfo {
            persistent_id: parse_resource_field(d.get("PersistentID")?)?,
            db_id: DbId(field_u32(d, &["DBID"])?),
            parent: DbId(field_u32(d, &["Parent"])?),
            has_data: field_bool(d, &["HasData"]).unwrap_or(false),
        })
    });

    let components = parse_list(&data, "Components", |d| {
        Some(ComponentInfo {
            object_id: DbId(field_u32(d, &["ObjectID"])?),
            index: field_u16(d, &["Index"])?,
            type_id: field_u32(d, &["Type"])?,
        })
    });

    let edges = parse_list(&data, "Edges", |d| {
        Some(EdgeInfo {
            source_id: DbId(field_u32(d, &["SourceID"])?),
            target_id: DbId(field_u32(d, &["TargetID"])?),
            index: field_u16(d, &["Index"])?,
            type_id: field_u32(d, &["Type"])?,
        })
    });

    FileIndex {
        component_types: Vec::new(),
        objects,
        components,
        edges,
        optimized,
    }
}

fn parse_list<T>(data: &Value, key: &str, f: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    data.get(key)
        .and_then(|l| l.get("Data"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|entry| entry.get("Data").and_then(&f))
                .collect()
        })
        .unwrap_or_default()
}

fn field_u32(data: &Value, names: &[&str]) -> Option<u32> {
    names.iter().find_map(|n| data.get(n).and_then(Value::as_str)?.parse().ok())
}

fn field_str(data: &Value, names: &[&str]) -> Option<String> {
    names.iter().find_map(|n| data.get(n).and_then(Value::as_str)).map(str::to_string)
}

fn field_u16(data: &Value, names: &[&str]) -> Option<u16> {
    names.iter().find_map(|n| data.get(n).and_then(Value::as_str)?.parse().ok())
}

fn field_u64_val(value: &Value) -> Option<u64> {
    value.as_str()?.parse().ok()
}

fn field_bool(data: &Value, names: &[&str]) -> Option<bool> {
    names.iter().find_map(|n| Some(data.get(n)?.as_str()? == "true"))
}

fn parse_resource_field(v: &Value) -> Option<ResourceIdRepr> {
    let d = v.get("Data")?;
    Some(ResourceIdRepr {
        dir: field_u32(d, &["Dir", "dir"])?,
        file: field_u32(d, &["File", "file"])?,
        ext: field_u32(d, &["Ext", "ext"])?,
    })
}

/// Inverse of `reader::format_resource_id_key`.
fn parse_resource_key(key: &str) -> Option<ResourceIdRepr> {
    let mut parts = key.split(':');
    let dir = u32::from_str_radix(parts.next()?, 16).ok()?;
    let file = u32::from_str_radix(parts.next()?, 16).ok()?;
    let ext = u32::from_str_radix(parts.next()?, 16).ok()?;
    Some(ResourceIdRepr { dir, file, ext })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComponentInfo;
    use crate::schema::{Class, StringTable};

    fn schema_with(names: &[&str]) -> Schema {
        let joined: Vec<u8> = names.iter().flat_map(|n| {
            let mut b = n.as_bytes().to_vec();
            b.push(0);
            b
        }).collect();
        let mut offset = 0u32;
        let classes = names
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let c = Class {
                    name: offset,
                    type_id: 1000 + i as u32,
                    flags: 0,
                    fields: vec![],
                };
                offset += n.len() as u32 + 1;
                c
            })
            .collect();
        Schema::new(StringTable::from_bytes(joined), classes)
    }

    fn obj(db_id: u32, parent: u32) -> ObjectInfo {
        ObjectInfo {
            persistent_id: ResourceIdRepr { dir: 0, file: 0, ext: 0 },
            db_id: DbId(db_id),
            parent: DbId(parent),
            has_data: true,
        }
    }

    #[test]
    fn parent_chain_is_self_first_and_terminates() {
        let schema = schema_with(&["A"]);
        let file_index = FileIndex {
            component_types: vec![],
            objects: vec![obj(3, 2), obj(2, 1), obj(1, 0)],
            components: vec![],
            edges: vec![],
            optimized: false,
        };
        let mgr = Manager::build(schema, DatabaseMeta::default(), file_index, vec![]);
        assert_eq!(mgr.parents(DbId(3)), vec![DbId(3), DbId(2), DbId(1)]);
    }

    #[test]
    fn full_json_lets_descendant_components_win() {
        let schema = schema_with(&["Widget"]);
        let type_id = schema.classes[0].type_id;
        let file_index = FileIndex {
            component_types: vec![],
            objects: vec![obj(2, 1), obj(1, 0)],
            components: vec![
                ComponentInfo { object_id: DbId(1), index: 0, type_id },
                ComponentInfo { object_id: DbId(2), index: 0, type_id },
            ],
            edges: vec![],
            optimized: false,
        };
        let values = vec![
            serde_json::json!({"Type": "Widget", "Data": {"X": "1", "Y": "root"}}),
            serde_json::json!({"Type": "Widget", "Data": {"X": "2"}}),
        ];
        let mgr = Manager::build(schema, DatabaseMeta::default(), file_index, values);
        let composed = mgr.full_json(DbId(2)).unwrap();
        let data = &composed["Components"][0]["Data"];
        assert_eq!(data["X"], "2");
        assert_eq!(data["Y"], "root");
    }

    #[test]
    fn export_queue_dedupes_and_drains_fifo() {
        let mut q = ExportQueue::seed(DbId(1));
        assert_eq!(q.push(DbId(5)), 1);
        assert_eq!(q.push(DbId(6)), 2);
        assert_eq!(q.push(DbId(5)), 1);
        assert_eq!(q.pop(), Some(DbId(5)));
        assert_eq!(q.pop(), Some(DbId(6)));
        assert_eq!(q.pop(), None);
    }
}
