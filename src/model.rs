//! The plain data records the `DBFileIndex` chunk group decodes into.
//! Field shape grounded on `examples/original_source/include/bs.h`; struct
//! style (plain records, no behavior) grounded on
//! `ecsdb/src/entity/registry.rs`'s `EntityRecord`.

use serde::{Deserialize, Serialize};

use crate::primitives::{DbId, ResourceId};
use crate::schema::TypeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub persistent_id: ResourceIdRepr,
    pub db_id: DbId,
    pub parent: DbId,
    pub has_data: bool,
}

/// `ResourceId` wrapped for serde, since the raw struct intentionally has
/// no derive (it is reused as a `HashMap` key with a hand-rolled hash
/// elsewhere and keeping it derive-free there avoids an accidental
/// mismatch between `Hash` and `PartialEq`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdRepr {
    pub dir: u32,
    pub file: u32,
    pub ext: u32,
}

impl From<ResourceId> for ResourceIdRepr {
    fn from(id: ResourceId) -> Self {
        ResourceIdRepr {
            dir: id.dir,
            file: id.file,
            ext: id.ext,
        }
    }
}

impl From<ResourceIdRepr> for ResourceId {
    fn from(id: ResourceIdRepr) -> Self {
        ResourceId {
            dir: id.dir,
            file: id.file,
            ext: id.ext,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub object_id: DbId,
    pub index: u16,
    pub type_id: TypeRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeInfo {
    pub source_id: DbId,
    pub target_id: DbId,
    pub index: u16,
    pub type_id: TypeRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentTypeInfo {
    pub class: TypeRef,
    pub version: u16,
    pub is_empty: bool,
}

/// The `BSMaterial::Internal::CompiledDB` blob: a resource-id-to-db-id hash
/// map plus two lists the format carries but this crate's write path never
/// populates, matching the original (`Collisions` and `Circular` are
/// always empty in every sample database this was built against).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseMeta {
    pub build_version: String,
    pub hash_map: Vec<(ResourceIdRepr, u64)>,
    pub collisions: Vec<(u32, u32)>,
    pub circular_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    pub component_types: Vec<(u16, ComponentTypeInfo)>,
    pub objects: Vec<ObjectInfo>,
    pub components: Vec<ComponentInfo>,
    pub edges: Vec<EdgeInfo>,
    pub optimized: bool,
}
