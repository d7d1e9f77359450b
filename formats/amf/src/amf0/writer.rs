///! @see: SPEC_FULL.md section 4.4 (C4), AMF0 encoder.
use std::io::Write;

use byteorder::WriteBytesExt;

use super::consts;
use crate::amf3;
use crate::errors::{AmfWriteError, AmfWriteResult};
use crate::primitives::{write_f64_be, write_u16_be, write_u32_be};
use crate::reference::{Amf0References, Amf3References};
use crate::value::{Object, ObjectEncoding, Value};

fn write_short_string<W: Write>(sink: &mut W, s: &str) -> AmfWriteResult<()> {
    if s.len() > u16::MAX as usize {
        return Err(AmfWriteError::StringTooLong { len: s.len() });
    }
    write_u16_be(sink, s.len() as u16)?;
    Ok(sink.write_all(s.as_bytes())?)
}

fn write_long_string<W: Write>(sink: &mut W, s: &str) -> AmfWriteResult<()> {
    write_u32_be(sink, s.len() as u32)?;
    Ok(sink.write_all(s.as_bytes())?)
}

/// Writes `s` as whichever of `STRING`/`LONG_STRING` fits, including the
/// type marker byte. Used for top-level string values, not object keys
/// (object keys are always short-string, no marker).
fn write_string_value<W: Write>(sink: &mut W, s: &str) -> AmfWriteResult<()> {
    if s.len() > u16::MAX as usize {
        sink.write_u8(consts::LONG_STRING)?;
        write_long_string(sink, s)
    } else {
        sink.write_u8(consts::STRING)?;
        write_short_string(sink, s)
    }
}

fn object_key(object: &Object) -> usize {
    object as *const Object as usize
}

/// A single AMF0 encoding session. Holds the shared value-reference table
/// (objects, ECMA arrays and strict arrays all dedupe through it) plus a
/// fallback AMF3 sub-session used when `encoding` is `Amf3` and a value is
/// upgraded behind an `AVM_PLUS_OBJECT` marker (@see SPEC_FULL.md section
/// 4.4, the AMF0/AMF3 switch).
#[derive(Debug)]
pub struct Writer<W> {
    sink: W,
    refs: Amf0References,
    amf3_refs: Amf3References,
    encoding: ObjectEncoding,
    max_depth: usize,
}

impl<W: Write> Writer<W> {
    pub fn new(sink: W) -> Self {
        Self::with_encoding(sink, ObjectEncoding::Amf0)
    }

    pub fn with_encoding(sink: W, encoding: ObjectEncoding) -> Self {
        Self {
            sink,
            refs: Amf0References::new(),
            amf3_refs: Amf3References::new(),
            encoding,
            max_depth: amf3::DEFAULT_MAX_DEPTH,
        }
    }

    pub fn encoding(&self) -> ObjectEncoding {
        self.encoding
    }

    /// Starts a fresh encoding session: clears both the AMF0 and (if ever
    /// used) the AMF3 reference tables. The privileged operation described
    /// in SPEC_FULL.md section 5.
    pub fn reset(&mut self) {
        self.refs.reset();
        self.amf3_refs.reset();
    }

    pub fn write_value(&mut self, value: &Value) -> AmfWriteResult<()> {
        if self.encoding == ObjectEncoding::Amf3 {
            self.sink.write_u8(consts::AVM_PLUS_OBJECT)?;
            return amf3::writer_write_value(&mut self.sink, &mut self.amf3_refs, self.max_depth, 0, value);
        }
        self.write_amf0_value(value)
    }

    fn write_amf0_value(&mut self, value: &Value) -> AmfWriteResult<()> {
        match value {
            Value::Null => Ok(self.sink.write_u8(consts::NULL)?),
            Value::Undefined => Ok(self.sink.write_u8(consts::UNDEFINED)?),
            Value::Boolean(b) => {
                self.sink.write_u8(consts::BOOLEAN)?;
                Ok(self.sink.write_u8(*b as u8)?)
            }
            Value::Integer(v) => {
                self.sink.write_u8(consts::NUMBER)?;
                write_f64_be(&mut self.sink, *v as f64)
            }
            Value::Double(v) => {
                self.sink.write_u8(consts::NUMBER)?;
                write_f64_be(&mut self.sink, *v)
            }
            Value::Utf8String(s) => write_string_value(&mut self.sink, s),
            Value::XmlDocument(s) => {
                self.sink.write_u8(consts::XML_DOCUMENT)?;
                write_long_string(&mut self.sink, s)
            }
            Value::XmlElement(_) => Err(AmfWriteError::UnsupportedInAmf0 { kind: "XmlElement" }),
            Value::ByteArray(_) => Err(AmfWriteError::UnsupportedInAmf0 { kind: "ByteArray" }),
            Value::Date(millis) => {
                self.sink.write_u8(consts::DATE)?;
                write_f64_be(&mut self.sink, *millis as f64)?;
                // timezone offset, always UTC.
                write_u16_be(&mut self.sink, 0)
            }
            Value::Array(entries) => self.write_strict_array(value, entries),
            Value::StringMap(entries) => self.write_ecma_array(value, entries),
            Value::Dictionary(_) => Err(AmfWriteError::UnsupportedInAmf0 { kind: "Dictionary" }),
            Value::Object(object) => self.write_object(object),
            Value::I32Vector { .. } => Err(AmfWriteError::UnsupportedInAmf0 { kind: "I32Vector" }),
            Value::U32Vector { .. } => Err(AmfWriteError::UnsupportedInAmf0 { kind: "U32Vector" }),
            Value::DoubleVector { .. } => Err(AmfWriteError::UnsupportedInAmf0 { kind: "DoubleVector" }),
            Value::ObjectVector { .. } => Err(AmfWriteError::UnsupportedInAmf0 { kind: "ObjectVector" }),
        }
    }

    fn write_strict_array(&mut self, value: &Value, entries: &[Value]) -> AmfWriteResult<()> {
        // Keyed on the enclosing `Value`'s own address, not the backing
        // `Vec`'s buffer pointer: an empty, non-allocated `Vec` shares the
        // same dangling (`align_of`) pointer with every other empty `Vec`
        // of the same element type, which would collide two distinct
        // empty arrays onto the same reference slot.
        let key = value as *const Value as usize;
        if let Some(idx) = self.refs.lookup(key) {
            self.sink.write_u8(consts::REFERENCE)?;
            return write_u16_be(&mut self.sink, idx);
        }
        self.refs.insert(key);
        self.sink.write_u8(consts::STRICT_ARRAY)?;
        write_u32_be(&mut self.sink, entries.len() as u32)?;
        for entry in entries {
            self.write_amf0_value(entry)?;
        }
        Ok(())
    }

    fn write_ecma_array(&mut self, value: &Value, entries: &[(String, Value)]) -> AmfWriteResult<()> {
        let key = value as *const Value as usize;
        if let Some(idx) = self.refs.lookup(key) {
            self.sink.write_u8(consts::REFERENCE)?;
            return write_u16_be(&mut self.sink, idx);
        }
        self.refs.insert(key);
        self.sink.write_u8(consts::ECMA_ARRAY)?;
        write_u32_be(&mut self.sink, entries.len() as u32)?;
        self.write_properties(entries)
    }

    fn write_object(&mut self, object: &Object) -> AmfWriteResult<()> {
        let key = object_key(object);
        if let Some(idx) = self.refs.lookup(key) {
            self.sink.write_u8(consts::REFERENCE)?;
            return write_u16_be(&mut self.sink, idx);
        }
        self.refs.insert(key);

        if object.is_externalizable() {
            return Err(AmfWriteError::UnsupportedInAmf0 {
                kind: "externalizable object",
            });
        }

        match object.class_name() {
            Some(name) => {
                self.sink.write_u8(consts::TYPED_OBJECT)?;
                write_short_string(&mut self.sink, name)?;
            }
            None => {
                self.sink.write_u8(consts::OBJECT)?;
            }
        }

        // AMF0 does not distinguish sealed from dynamic members on the
        // wire; both lists serialize as one flat property run.
        for (name, value) in object.sealed.iter().chain(object.dynamic.iter()) {
            write_short_string(&mut self.sink, name)?;
            self.write_amf0_value(value)?;
        }
        Ok(self.sink.write_all(&consts::OBJECT_END_MARKER)?)
    }

    fn write_properties(&mut self, entries: &[(String, Value)]) -> AmfWriteResult<()> {
        for (name, value) in entries {
            write_short_string(&mut self.sink, name)?;
            self.write_amf0_value(value)?;
        }
        Ok(self.sink.write_all(&consts::OBJECT_END_MARKER)?)
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

    fn encode(value: &Value) -> Vec<u8> {
        let mut writer = Writer::new(Vec::new());
        writer.write_value(value).unwrap();
        writer.into_inner()
    }

    #[test]
    fn short_string() {
        assert_eq!(
            encode(&Value::Utf8String("hi".to_string())),
            vec![0x02, 0x00, 0x02, b'h', b'i']
        );
    }

    #[test]
    fn number() {
        let bytes = encode(&Value::Double(0.0));
        assert_eq!(bytes[0], consts::NUMBER);
        assert_eq!(bytes.len(), 9);
    }

    #[test]
    fn boolean_true() {
        assert_eq!(encode(&Value::Boolean(true)), vec![0x01, 0x01]);
    }

    #[test]
    fn null_and_undefined() {
        assert_eq!(encode(&Value::Null), vec![0x05]);
        assert_eq!(encode(&Value::Undefined), vec![0x06]);
    }

    #[test]
    fn anonymous_object_terminates_with_end_marker() {
        let object = Value::Object(Object::anonymous(vec![(
            "a".to_string(),
            Value::Boolean(true),
        )]));
        let bytes = encode(&object);
        assert_eq!(bytes[0], consts::OBJECT);
        assert_eq!(&bytes[bytes.len() - 3..], &consts::OBJECT_END_MARKER);
    }

    #[test]
    fn dictionary_is_unsupported_in_plain_amf0() {
        let mut writer = Writer::new(Vec::new());
        let err = writer.write_value(&Value::Dictionary(vec![])).unwrap_err();
        assert!(matches!(err, AmfWriteError::UnsupportedInAmf0 { .. }));
    }

    #[test]
    fn amf3_encoding_upgrades_via_switch_marker() {
        let mut writer = Writer::with_encoding(Vec::new(), ObjectEncoding::Amf3);
        writer.write_value(&Value::Integer(1)).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(bytes[0], consts::AVM_PLUS_OBJECT);
        assert_eq!(&bytes[1..], &[0x04, 0x01]);
    }

    #[test]
    fn distinct_empty_arrays_do_not_collide_on_the_reference_table() {
        // Two separately-constructed empty `Vec`s share the same dangling
        // pointer; the reference table must still treat them as distinct
        // values (keyed on the enclosing `Value`, not the `Vec` buffer).
        let outer = Value::Array(vec![Value::Array(vec![]), Value::Array(vec![])]);
        let bytes = encode(&outer);
        // Outer STRICT_ARRAY(2), then two inner STRICT_ARRAY(0) bodies in
        // full, never a REFERENCE marker for the second one.
        assert_eq!(
            bytes,
            vec![
                consts::STRICT_ARRAY,
                0x00, 0x00, 0x00, 0x02,
                consts::STRICT_ARRAY,
                0x00, 0x00, 0x00, 0x00,
                consts::STRICT_ARRAY,
                0x00, 0x00, 0x00, 0x00,
            ]
        );
    }
}
