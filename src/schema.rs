//! The self-describing part of the database: a flat string table and a
//! table of classes, each naming its fields by `StringRef` and typing them
//! by `TypeRef`. Built once from the file header and treated as immutable
//! afterwards, mirroring `ecsdb/src/schema/types.rs`'s `FieldDefinition`
//! shape (name + type + a handful of flags) even though the wire encoding
//! here is positional, not TOML.

use std::collections::HashMap;
use std::io::{Read, Write};

use crate::error::{CdbError, Result};
use crate::primitives::{read_string, read_u16, read_u32, write_string, write_u16, write_u32, StringRef};

pub type TypeRef = u32;

/// Builtin type references live in the `0xFFFFFF__` space; everything else
/// is an index into the class table.
pub mod builtin {
    use super::TypeRef;

    pub const NULL: TypeRef = 0xFFFF_FF01;
    pub const STRING: TypeRef = 0xFFFF_FF02;
    pub const LIST: TypeRef = 0xFFFF_FF03;
    pub const MAP: TypeRef = 0xFFFF_FF04;
    pub const REF: TypeRef = 0xFFFF_FF05;
    pub const INT8: TypeRef = 0xFFFF_FF08;
    pub const UINT8: TypeRef = 0xFFFF_FF09;
    pub const INT16: TypeRef = 0xFFFF_FF0A;
    pub const UINT16: TypeRef = 0xFFFF_FF0B;
    pub const INT32: TypeRef = 0xFFFF_FF0C;
    pub const UINT32: TypeRef = 0xFFFF_FF0D;
    pub const INT64: TypeRef = 0xFFFF_FF0E;
    pub const UINT64: TypeRef = 0xFFFF_FF0F;
    pub const BOOL: TypeRef = 0xFFFF_FF10;
    pub const FLOAT: TypeRef = 0xFFFF_FF11;
    pub const DOUBLE: TypeRef = 0xFFFF_FF12;
    pub const NPOS: TypeRef = 0xFFFF_FFFF;
}

pub fn is_builtin(type_id: TypeRef) -> bool {
    type_id & 0xFFFF_FF00 == 0xFFFF_FF00
}

pub fn is_chunk_type(type_id: TypeRef) -> bool {
    type_id == builtin::LIST || type_id == builtin::MAP
}

pub const CLASS_FLAG_USER: u16 = 1 << 2;
pub const CLASS_FLAG_STRUCT: u16 = 1 << 3;
pub const CLASS_NULL: u16 = 0xFFFF;

pub const FIELD_OFFSET_ABSENT: u16 = 0xFFFF;

#[derive(Debug, Clone)]
pub struct Field {
    pub name: StringRef,
    pub type_id: TypeRef,
    pub offset: u16,
    pub size: u16,
}

impl Field {
    fn read<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Field {
            name: read_u32(r)?,
            type_id: read_u32(r)?,
            offset: read_u16(r)?,
            size: read_u16(r)?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        write_u32(w, self.name)?;
        write_u32(w, self.type_id)?;
        write_u16(w, self.offset)?;
        write_u16(w, self.size)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Class {
    pub name: StringRef,
    pub type_id: TypeRef,
    pub flags: u16,
    pub fields: Vec<Field>,
}

impl Class {
    pub fn is_user(&self) -> bool {
        self.flags & CLASS_FLAG_USER != 0
    }

    pub fn is_struct(&self) -> bool {
        self.flags & CLASS_FLAG_STRUCT != 0
    }
}

/// The flat, NUL-joined string table every `StringRef` indexes into.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    bytes: Vec<u8>,
}

impl StringTable {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        StringTable { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn resolve(&self, at: StringRef) -> Result<&str> {
        let start = at as usize;
        if start >= self.bytes.len() {
            return Err(CdbError::UnresolvedRef(at));
        }
        let end = self.bytes[start..]
            .iter()
            .position(|&b| b == 0)
            .map(|p| start + p)
            .ok_or(CdbError::UnresolvedRef(at))?;
        std::str::from_utf8(&self.bytes[start..end]).map_err(|_| CdbError::UnresolvedRef(at))
    }
}

/// The parsed `BETH`/`STRT`/`TYPE`/`CLAS` header: string table plus class
/// table, indexed by `TypeRef` for fast lookup during decode.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub strings: StringTable,
    pub classes: Vec<Class>,
    by_type: HashMap<TypeRef, usize>,
}

impl Schema {
    pub fn new(strings: StringTable, classes: Vec<Class>) -> Self {
        let by_type = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.type_id, i))
            .collect();
        Schema {
            strings,
            classes,
            by_type,
        }
    }

    pub fn class(&self, type_id: TypeRef) -> Option<&Class> {
        self.by_type.get(&type_id).map(|&i| &self.classes[i])
    }

    pub fn type_by_name(&self, name: &str) -> Option<TypeRef> {
        self.classes
            .iter()
            .find(|c| self.strings.resolve(c.name).map(|n| n == name).unwrap_or(false))
            .map(|c| c.type_id)
    }

    /// `type_by_name`, falling back to the builtin name table — used when
    /// re-encoding a value whose `Type`/`ElementType` may name either a
    /// class or a builtin.
    pub fn resolve_type_name(&self, name: &str) -> Option<TypeRef> {
        builtin_by_name(name).or_else(|| self.type_by_name(name))
    }

    pub fn name_of(&self, type_id: TypeRef) -> Result<String> {
        if let Some(class) = self.class(type_id) {
            return self.strings.resolve(class.name).map(String::from);
        }
        Ok(builtin_name(type_id).unwrap_or("Unknown").to_string())
    }

    pub fn field_name(&self, field: &Field) -> Result<String> {
        self.strings.resolve(field.name).map(String::from)
    }
}

pub fn builtin_by_name(name: &str) -> Option<TypeRef> {
    use builtin::*;
    Some(match name {
        "<null>" => NULL,
        "BSFixedString" => STRING,
        "<collection>" => LIST,
        "pointer" => REF,
        "int8_t" => INT8,
        "uint8_t" => UINT8,
        "int16_t" => INT16,
        "uint16_t" => UINT16,
        "int32_t" => INT32,
        "uint32_t" => UINT32,
        "int64_t" => INT64,
        "uint64_t" => UINT64,
        "bool" => BOOL,
        "float" => FLOAT,
        "double" => DOUBLE,
        _ => return None,
    })
}

pub fn builtin_name(type_id: TypeRef) -> Option<&'static str> {
    use builtin::*;
    Some(match type_id {
        NULL => "<null>",
        STRING => "BSFixedString",
        LIST => "<collection>",
        MAP => "<collection>",
        REF => "pointer",
        INT8 => "int8_t",
        UINT8 => "uint8_t",
        INT16 => "int16_t",
        UINT16 => "uint16_t",
        INT32 => "int32_t",
        UINT32 => "uint32_t",
        INT64 => "int64_t",
        UINT64 => "uint64_t",
        BOOL => "bool",
        FLOAT => "float",
        DOUBLE => "double",
        _ => return None,
    })
}

pub(crate) fn read_class<R: Read>(r: &mut R) -> Result<Class> {
    let name = read_u32(r)?;
    let type_id = read_u32(r)?;
    let flags = read_u16(r)?;
    let field_count = read_u16(r)?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        fields.push(Field::read(r)?);
    }
    Ok(Class {
        name,
        type_id,
        flags,
        fields,
    })
}

pub(crate) fn write_class<W: Write>(w: &mut W, class: &Class) -> Result<()> {
    write_u32(w, class.name)?;
    write_u32(w, class.type_id)?;
    write_u16(w, class.flags)?;
    write_u16(w, class.fields.len() as u16)?;
    for field in &class.fields {
        field.write(w)?;
    }
    Ok(())
}

pub(crate) fn read_string_table<R: Read>(r: &mut R, byte_count: usize) -> Result<StringTable> {
    let mut bytes = vec![0u8; byte_count];
    r.read_exact(&mut bytes)?;
    Ok(StringTable::from_bytes(bytes))
}

#[allow(dead_code)]
pub(crate) fn string_of<R: Read>(r: &mut R) -> Result<String> {
    read_string(r)
}

#[allow(dead_code)]
pub(crate) fn write_str<W: Write>(w: &mut W, s: &str) -> Result<()> {
    write_string(w, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_detection() {
        assert!(is_builtin(builtin::INT32));
        assert!(is_builtin(builtin::NPOS));
        assert!(!is_builtin(0));
        assert!(!is_builtin(1234));
    }

    #[test]
    fn chunk_type_detection() {
        assert!(is_chunk_type(builtin::LIST));
        assert!(is_chunk_type(builtin::MAP));
        assert!(!is_chunk_type(builtin::REF));
        assert!(!is_chunk_type(builtin::INT32));
    }

    #[test]
    fn string_table_resolves_nul_terminated_entries() {
        let mut bytes = b"Foo\0Bar\0".to_vec();
        bytes.shrink_to_fit();
        let table = StringTable::from_bytes(bytes);
        assert_eq!(table.resolve(0).unwrap(), "Foo");
        assert_eq!(table.resolve(4).unwrap(), "Bar");
        assert!(table.resolve(100).is_err());
    }

    #[test]
    fn schema_looks_up_class_by_type_id() {
        let table = StringTable::from_bytes(b"Widget\0".to_vec());
        let schema = Schema::new(
            table,
            vec![Class {
                name: 0,
                type_id: 7,
                flags: 0,
                fields: vec![],
            }],
        );
        assert_eq!(schema.name_of(7).unwrap(), "Widget");
        assert!(schema.class(999).is_none());
        assert_eq!(schema.name_of(builtin::BOOL).unwrap(), "bool");
    }
}
