///! @see: SPEC_FULL.md section 3, DATA MODEL
use std::sync::Arc;

use crate::class::{ClassDescription, Externalizable};

/// Which wire family a value is encoded under. Threaded through the RTMP
/// chunk writer and command bodies exactly the way the teacher threads
/// `amf::Version` — a connect-response's `objectEncoding` field and the
/// dispatcher's entry point both take the same enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ObjectEncoding {
    Amf0 = 0,
    Amf3 = 3,
}

/// The opaque tagged union every encoder dispatches on (@see SPEC_FULL.md
/// section 3). AMF0 and AMF3 both consume the same `Value`; per-kind
/// writers pick the marker and body layout appropriate to their wire
/// family.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Undefined,
    Boolean(bool),
    Integer(i32),
    Double(f64),
    Utf8String(String),
    /// UTC milliseconds since the epoch.
    Date(i64),
    XmlDocument(String),
    XmlElement(String),
    ByteArray(Vec<u8>),
    /// A dense, ordered list.
    Array(Vec<Value>),
    /// A string-keyed map preserving insertion order (AMF0 `EcmaArray`,
    /// AMF3 associative `Array`).
    StringMap(Vec<(String, Value)>),
    /// An arbitrary-keyed map; AMF3 `Dictionary` only, no AMF0
    /// representation exists (@see SPEC_FULL.md section 4.3 table).
    Dictionary(Vec<(Value, Value)>),
    Object(Object),
    I32Vector {
        is_fixed: bool,
        entries: Vec<i32>,
    },
    U32Vector {
        is_fixed: bool,
        entries: Vec<u32>,
    },
    DoubleVector {
        is_fixed: bool,
        entries: Vec<f64>,
    },
    ObjectVector {
        is_fixed: bool,
        class_name: Option<String>,
        entries: Vec<Value>,
    },
}

/// A typed, anonymous, or externalizable composite object.
///
/// `class` carries the `ClassDescription` identity the AMF3 class-definition
/// reference table keys on (@see SPEC_FULL.md section 3); `None` means an
/// anonymous dynamic object. `sealed` holds exactly `class.members` values in
/// declared order (empty for an anonymous object); `dynamic` holds the
/// trailing string-keyed entries emitted only when the class (or anonymous
/// object) is dynamic.
#[derive(Debug, Clone)]
pub struct Object {
    pub class: Option<Arc<ClassDescription>>,
    pub sealed: Vec<(String, Value)>,
    pub dynamic: Vec<(String, Value)>,
    pub externalizable: Option<Arc<dyn Externalizable>>,
}

impl Object {
    pub fn anonymous(entries: Vec<(String, Value)>) -> Self {
        Self {
            class: None,
            sealed: Vec::new(),
            dynamic: entries,
            externalizable: None,
        }
    }

    pub fn typed(
        class: Arc<ClassDescription>,
        sealed: Vec<(String, Value)>,
        dynamic: Vec<(String, Value)>,
    ) -> Self {
        Self {
            class: Some(class),
            sealed,
            dynamic,
            externalizable: None,
        }
    }

    pub fn externalizable(class: Arc<ClassDescription>, value: Arc<dyn Externalizable>) -> Self {
        Self {
            class: Some(class),
            sealed: Vec::new(),
            dynamic: Vec::new(),
            externalizable: Some(value),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        match &self.class {
            Some(class) => class.is_dynamic,
            None => true,
        }
    }

    pub fn is_externalizable(&self) -> bool {
        self.externalizable.is_some()
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class.as_ref().map(|c| c.name.as_str())
    }
}

impl Value {
    pub fn try_as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8String(s) | Value::XmlDocument(s) | Value::XmlElement(s) => Some(s),
            _ => None,
        }
    }

    pub fn try_as_f64(&self) -> Option<f64> {
        match *self {
            Value::Integer(v) => Some(v as f64),
            Value::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn try_as_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(v) => Some(v),
            _ => None,
        }
    }
}

/// Makes a `String` value.
pub fn string<T: Into<String>>(t: T) -> Value {
    Value::Utf8String(t.into())
}

/// Makes a `Double` value.
pub fn number<T: Into<f64>>(t: T) -> Value {
    Value::Double(t.into())
}

/// Makes a `Boolean` value.
pub fn boolean(t: bool) -> Value {
    Value::Boolean(t)
}

/// Makes an anonymous, dynamic `Object` value.
pub fn object<I, K>(entries: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    Value::Object(Object::anonymous(
        entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
    ))
}
