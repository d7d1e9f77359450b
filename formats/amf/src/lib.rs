///! AMF0/AMF3 object serialization core. @see SPEC_FULL.md sections 3-5.
pub mod amf0;
pub mod amf3;
pub mod class;
pub mod errors;
mod primitives;
pub mod reference;
pub mod value;

pub use class::{Amf3Sink, ClassDescription, ClassMember, ClassOracle, Externalizable, MemoizingClassOracle, UnknownTypeFallback};
pub use errors::{AmfWriteError, AmfWriteResult};
pub use value::{boolean, number, object, string, Object, ObjectEncoding, Value};
