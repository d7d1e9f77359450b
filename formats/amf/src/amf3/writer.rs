///! @see: SPEC_FULL.md section 4.5 (C5), AMF3 encoder.
use std::io::Write;

use byteorder::WriteBytesExt;

use super::consts;
use crate::class::Amf3Sink;
use crate::errors::{AmfWriteError, AmfWriteResult};
use crate::primitives::{write_f64_be, write_inline_header, write_reference_header, write_u29};
use crate::reference::Amf3References;
use crate::value::{Object, Value};

/// Matches the teacher's conservative default for unbounded recursion
/// through externalizable bodies and nested composites.
pub const DEFAULT_MAX_DEPTH: usize = 512;

fn write_utf8_vr<W: Write>(sink: &mut W, refs: &mut Amf3References, s: &str) -> AmfWriteResult<()> {
    if s.is_empty() {
        write_inline_header(sink, 0, true)?;
        return Ok(());
    }
    if let Some(idx) = refs.lookup_string(s) {
        return write_reference_header(sink, idx);
    }
    write_inline_header(sink, s.len() as u32, true)?;
    sink.write_all(s.as_bytes())?;
    refs.insert_string(s);
    Ok(())
}

fn object_key(object: &Object) -> usize {
    object as *const Object as usize
}

/// Identity key for a composite `Value` that has no inner struct of its
/// own to key on (arrays, dictionaries, dates) — the enclosing `Value`'s
/// own address, stable for the session as long as it isn't moved.
fn value_key(value: &Value) -> usize {
    value as *const Value as usize
}

fn write_object<W: Write>(
    sink: &mut W,
    refs: &mut Amf3References,
    max_depth: usize,
    depth: usize,
    object: &Object,
) -> AmfWriteResult<()> {
    sink.write_u8(consts::OBJECT)?;
    if let Some(idx) = refs.lookup_object(object_key(object)) {
        return write_reference_header(sink, idx);
    }
    refs.insert_object(object_key(object));

    match &object.class {
        Some(class) if class.is_externalizable => {
            let externalizable = object.externalizable.as_ref().ok_or_else(|| {
                AmfWriteError::NotExternalizable {
                    class: class.name.clone(),
                }
            })?;
            if let Some(idx) = refs.lookup_class(class) {
                write_u29(sink, (idx << 2) | 0b01)?;
            } else {
                let header = (1u32 << 2) | 0b11;
                write_u29(sink, header)?;
                write_utf8_vr(sink, refs, &class.name)?;
                refs.insert_class(class);
            }
            let mut cursor = Amf3Cursor {
                sink,
                refs,
                depth: depth + 1,
                max_depth,
            };
            externalizable.write_external(&mut cursor)
        }
        Some(class) => {
            if let Some(idx) = refs.lookup_class(class) {
                write_u29(sink, (idx << 2) | 0b01)?;
            } else {
                let header = ((class.members.len() as u32) << 4) | ((class.is_dynamic as u32) << 3) | 0b11;
                write_u29(sink, header)?;
                write_utf8_vr(sink, refs, &class.name)?;
                for member in &class.members {
                    write_utf8_vr(sink, refs, &member.name)?;
                }
                refs.insert_class(class);
            }
            for (_, value) in &object.sealed {
                write_value(sink, refs, max_depth, depth + 1, value)?;
            }
            if class.is_dynamic {
                write_dynamic_members(sink, refs, max_depth, depth, &object.dynamic)?;
            }
            Ok(())
        }
        None => {
            let header = (1u32 << 3) | 0b11;
            write_u29(sink, header)?;
            write_utf8_vr(sink, refs, "")?;
            write_dynamic_members(sink, refs, max_depth, depth, &object.dynamic)
        }
    }
}

fn write_dynamic_members<W: Write>(
    sink: &mut W,
    refs: &mut Amf3References,
    max_depth: usize,
    depth: usize,
    members: &[(String, Value)],
) -> AmfWriteResult<()> {
    for (key, value) in members {
        write_utf8_vr(sink, refs, key)?;
        write_value(sink, refs, max_depth, depth + 1, value)?;
    }
    write_utf8_vr(sink, refs, "")
}

fn write_array<W: Write>(
    sink: &mut W,
    refs: &mut Amf3References,
    max_depth: usize,
    depth: usize,
    value: &Value,
    entries: &[Value],
) -> AmfWriteResult<()> {
    sink.write_u8(consts::ARRAY)?;
    let key = value_key(value);
    if let Some(idx) = refs.lookup_object(key) {
        return write_reference_header(sink, idx);
    }
    refs.insert_object(key);
    write_inline_header(sink, entries.len() as u32, true)?;
    write_utf8_vr(sink, refs, "")?;
    for entry in entries {
        write_value(sink, refs, max_depth, depth + 1, entry)?;
    }
    Ok(())
}

fn write_associative_array<W: Write>(
    sink: &mut W,
    refs: &mut Amf3References,
    max_depth: usize,
    depth: usize,
    value: &Value,
    entries: &[(String, Value)],
) -> AmfWriteResult<()> {
    sink.write_u8(consts::ARRAY)?;
    let key = value_key(value);
    if let Some(idx) = refs.lookup_object(key) {
        return write_reference_header(sink, idx);
    }
    refs.insert_object(key);
    write_inline_header(sink, 0, true)?;
    write_dynamic_members(sink, refs, max_depth, depth, entries)
}

fn write_dictionary<W: Write>(
    sink: &mut W,
    refs: &mut Amf3References,
    max_depth: usize,
    depth: usize,
    value: &Value,
    entries: &[(Value, Value)],
) -> AmfWriteResult<()> {
    sink.write_u8(consts::DICTIONARY)?;
    let key = value_key(value);
    if let Some(idx) = refs.lookup_object(key) {
        return write_reference_header(sink, idx);
    }
    refs.insert_object(key);
    write_inline_header(sink, entries.len() as u32, true)?;
    sink.write_u8(0)?; // weak-keys: not supported, always strong
    for (k, v) in entries {
        write_value(sink, refs, max_depth, depth + 1, k)?;
        write_value(sink, refs, max_depth, depth + 1, v)?;
    }
    Ok(())
}

fn write_vectors<W: Write>(
    sink: &mut W,
    refs: &mut Amf3References,
    max_depth: usize,
    depth: usize,
    value: &Value,
) -> AmfWriteResult<()> {
    match value {
        Value::I32Vector { is_fixed, entries } => {
            sink.write_u8(consts::VECTOR_INT)?;
            write_inline_header(sink, entries.len() as u32, true)?;
            sink.write_u8(*is_fixed as u8)?;
            for v in entries {
                sink.write_i32::<byteorder::BigEndian>(*v)?;
            }
            Ok(())
        }
        Value::U32Vector { is_fixed, entries } => {
            sink.write_u8(consts::VECTOR_UINT)?;
            write_inline_header(sink, entries.len() as u32, true)?;
            sink.write_u8(*is_fixed as u8)?;
            for v in entries {
                sink.write_u32::<byteorder::BigEndian>(*v)?;
            }
            Ok(())
        }
        Value::DoubleVector { is_fixed, entries } => {
            sink.write_u8(consts::VECTOR_DOUBLE)?;
            write_inline_header(sink, entries.len() as u32, true)?;
            sink.write_u8(*is_fixed as u8)?;
            for v in entries {
                write_f64_be(sink, *v)?;
            }
            Ok(())
        }
        Value::ObjectVector {
            is_fixed,
            class_name,
            entries,
        } => {
            sink.write_u8(consts::VECTOR_OBJECT)?;
            write_inline_header(sink, entries.len() as u32, true)?;
            sink.write_u8(*is_fixed as u8)?;
            write_utf8_vr(sink, refs, class_name.as_deref().unwrap_or("*"))?;
            for entry in entries {
                write_value(sink, refs, max_depth, depth + 1, entry)?;
            }
            Ok(())
        }
        _ => unreachable!("write_vectors called with a non-vector value"),
    }
}

pub(crate) fn write_value<W: Write>(
    sink: &mut W,
    refs: &mut Amf3References,
    max_depth: usize,
    depth: usize,
    value: &Value,
) -> AmfWriteResult<()> {
    if depth > max_depth {
        return Err(AmfWriteError::DepthLimit { limit: max_depth });
    }
    match value {
        Value::Undefined => Ok(sink.write_u8(consts::UNDEFINED)?),
        Value::Null => Ok(sink.write_u8(consts::NULL)?),
        Value::Boolean(false) => Ok(sink.write_u8(consts::FALSE)?),
        Value::Boolean(true) => Ok(sink.write_u8(consts::TRUE)?),
        Value::Integer(v) if (consts::INTEGER_MIN..=consts::INTEGER_MAX).contains(v) => {
            sink.write_u8(consts::INTEGER)?;
            write_u29(sink, (*v as u32) & 0x1FFF_FFFF)
        }
        Value::Integer(v) => {
            sink.write_u8(consts::DOUBLE)?;
            write_f64_be(sink, *v as f64)
        }
        Value::Double(v) => {
            sink.write_u8(consts::DOUBLE)?;
            write_f64_be(sink, *v)
        }
        Value::Utf8String(s) => {
            sink.write_u8(consts::STRING)?;
            write_utf8_vr(sink, refs, s)
        }
        Value::XmlDocument(s) => {
            sink.write_u8(consts::XML_DOCUMENT)?;
            write_inline_header(sink, s.len() as u32, true)?;
            Ok(sink.write_all(s.as_bytes())?)
        }
        Value::XmlElement(s) => {
            sink.write_u8(consts::XML)?;
            write_inline_header(sink, s.len() as u32, true)?;
            Ok(sink.write_all(s.as_bytes())?)
        }
        Value::ByteArray(bytes) => {
            sink.write_u8(consts::BYTE_ARRAY)?;
            write_inline_header(sink, bytes.len() as u32, true)?;
            Ok(sink.write_all(bytes)?)
        }
        Value::Date(millis) => {
            sink.write_u8(consts::DATE)?;
            let key = value_key(value);
            if let Some(idx) = refs.lookup_object(key) {
                return write_reference_header(sink, idx);
            }
            refs.insert_object(key);
            write_inline_header(sink, 0, true)?;
            write_f64_be(sink, *millis as f64)
        }
        Value::Array(entries) => write_array(sink, refs, max_depth, depth, value, entries),
        Value::StringMap(entries) => write_associative_array(sink, refs, max_depth, depth, value, entries),
        Value::Dictionary(entries) => write_dictionary(sink, refs, max_depth, depth, value, entries),
        Value::Object(object) => write_object(sink, refs, max_depth, depth, object),
        Value::I32Vector { .. }
        | Value::U32Vector { .. }
        | Value::DoubleVector { .. }
        | Value::ObjectVector { .. } => write_vectors(sink, refs, max_depth, depth, value),
    }
}

struct Amf3Cursor<'a, W> {
    sink: &'a mut W,
    refs: &'a mut Amf3References,
    depth: usize,
    max_depth: usize,
}

impl<'a, W: Write> Amf3Sink for Amf3Cursor<'a, W> {
    fn write_value(&mut self, value: &Value) -> AmfWriteResult<()> {
        write_value(self.sink, self.refs, self.max_depth, self.depth, value)
    }

    fn write_raw_bytes(&mut self, bytes: &[u8]) -> AmfWriteResult<()> {
        Ok(self.sink.write_all(bytes)?)
    }
}

/// A single AMF3 encoding session: owns the output sink and the three
/// reference tables that live for the session's lifetime. @see
/// SPEC_FULL.md section 4.5 and section 3 (reference tables).
#[derive(Debug)]
pub struct Writer<W> {
    sink: W,
    refs: Amf3References,
    max_depth: usize,
}

impl<W: Write> Writer<W> {
    pub fn new(sink: W) -> Self {
        Self::with_max_depth(sink, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(sink: W, max_depth: usize) -> Self {
        Self {
            sink,
            refs: Amf3References::new(),
            max_depth,
        }
    }

    /// Starts a fresh encoding session: clears all three reference tables.
    /// The privileged operation described in SPEC_FULL.md section 5.
    pub fn reset(&mut self) {
        self.refs.reset();
    }

    pub fn write_value(&mut self, value: &Value) -> AmfWriteResult<()> {
        write_value(&mut self.sink, &mut self.refs, self.max_depth, 0, value)
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassDescription;
    use std::sync::Arc;

    fn encode(value: &Value) -> Vec<u8> {
        let mut writer = Writer::new(Vec::new());
        writer.write_value(value).unwrap();
        writer.into_inner()
    }

    #[test]
    fn small_integer() {
        assert_eq!(encode(&Value::Integer(1)), vec![0x04, 0x01]);
    }

    #[test]
    fn negative_integer_round_trips_as_29_bit_twos_complement() {
        // -1 as a 29-bit two's-complement value is all ones: 0xFF 0xFF 0xFF 0xFF.
        assert_eq!(encode(&Value::Integer(-1)), vec![0x04, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn out_of_range_integer_falls_back_to_double() {
        let bytes = encode(&Value::Integer(consts::INTEGER_MAX + 1));
        assert_eq!(bytes[0], consts::DOUBLE);
        assert_eq!(bytes.len(), 9);
    }

    #[test]
    fn empty_string_is_never_referenced() {
        assert_eq!(encode(&Value::Utf8String(String::new())), vec![0x06, 0x01]);
    }

    #[test]
    fn string_reference_table_dedupes_repeats() {
        let array = Value::Array(vec![
            Value::Utf8String("ab".to_string()),
            Value::Utf8String("ab".to_string()),
        ]);
        let bytes = encode(&array);
        // marker, inline-count header, empty assoc terminator, then two string
        // entries: first inline ("ab"), second a bare reference index 0.
        assert_eq!(
            bytes,
            vec![0x09, 0x05, 0x01, 0x06, 0x05, b'a', b'b', 0x06, 0x00]
        );
    }

    #[test]
    fn anonymous_object_is_dynamic_with_empty_class_name() {
        let object = Value::Object(Object::anonymous(vec![(
            "x".to_string(),
            Value::Integer(1),
        )]));
        let bytes = encode(&object);
        assert_eq!(bytes[0], consts::OBJECT);
        // inline header 0x0B == (0 members << 4 | dynamic<<3 | 0b11)
        assert_eq!(bytes[1], 0x0B);
    }

    #[test]
    fn typed_sealed_object_reuses_class_definition_by_reference() {
        let class = Arc::new(ClassDescription::new("Foo", vec!["a"]));
        let first = Object::typed(class.clone(), vec![("a".to_string(), Value::Integer(1))], vec![]);
        let second = Object::typed(class, vec![("a".to_string(), Value::Integer(2))], vec![]);
        let array = Value::Array(vec![Value::Object(first), Value::Object(second)]);
        let bytes = encode(&array);
        // second object's trait header should be a 2-bit class reference (idx 0<<2|1 = 1).
        assert!(bytes.windows(1).any(|w| w == [0x01]));
    }

    #[test]
    fn repeated_array_reference_is_shared_object_table() {
        let array = Value::Array(vec![]);
        let mut writer = Writer::new(Vec::new());
        writer.write_value(&array).unwrap();
        writer.write_value(&array).unwrap();
        let bytes = writer.into_inner();
        // first: marker, inline(0), empty assoc terminator. second: marker,
        // then a bare reference index 0 instead of a second inline body.
        assert_eq!(bytes, vec![0x09, 0x01, 0x01, 0x09, 0x00]);
    }

    #[test]
    fn repeated_dictionary_reference_is_shared_object_table() {
        let dict = Value::Dictionary(vec![]);
        let mut writer = Writer::new(Vec::new());
        writer.write_value(&dict).unwrap();
        writer.write_value(&dict).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(bytes, vec![0x11, 0x01, 0x00, 0x11, 0x00]);
    }

    #[test]
    fn repeated_date_reference_is_shared_object_table() {
        let date = Value::Date(0);
        let mut writer = Writer::new(Vec::new());
        writer.write_value(&date).unwrap();
        writer.write_value(&date).unwrap();
        let bytes = writer.into_inner();
        // first: marker, inline(0), 8-byte f64. second: marker, reference index 0.
        assert_eq!(bytes.len(), 1 + 1 + 8 + 1 + 1);
        assert_eq!(bytes[bytes.len() - 2], consts::DATE);
        assert_eq!(bytes[bytes.len() - 1], 0x00);
    }

    #[test]
    fn distinct_empty_arrays_do_not_collide_on_the_reference_table() {
        // Two separately-constructed empty `Vec`s can share the same
        // dangling pointer; the reference table is keyed on the enclosing
        // `Value`'s own address, so this must not collide them.
        let outer = Value::Array(vec![Value::Array(vec![]), Value::Array(vec![])]);
        let bytes = encode(&outer);
        assert_eq!(
            bytes,
            vec![
                0x09, 0x05, 0x01, // outer: marker, inline(2), assoc terminator
                0x09, 0x01, 0x01, // first inner empty array: full body
                0x09, 0x01, 0x01, // second inner empty array: also a full body
            ]
        );
    }

    #[test]
    fn class_flagged_externalizable_without_a_capability_is_an_error() {
        // The class declares itself externalizable but the object carries no
        // `Externalizable` impl to call `write_external` on; this must not
        // silently fall through to the sealed/dynamic encoding.
        let class = ClassDescription::new("Foo", vec![]).externalizable();
        let object = Object::typed(Arc::new(class), vec![], vec![]);
        let mut writer = Writer::new(Vec::new());
        let err = writer.write_value(&Value::Object(object)).unwrap_err();
        assert!(matches!(err, AmfWriteError::NotExternalizable { .. }));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut inner = Value::Null;
        for _ in 0..4 {
            inner = Value::Array(vec![inner]);
        }
        let mut writer = Writer::with_max_depth(Vec::new(), 2);
        assert!(matches!(
            writer.write_value(&inner),
            Err(AmfWriteError::DepthLimit { limit: 2 })
        ));
    }
}
