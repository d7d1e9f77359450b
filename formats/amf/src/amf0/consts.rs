///! AMF0 type markers. @see SPEC_FULL.md section 4.4, table of markers.
pub const NUMBER: u8 = 0x00;
pub const BOOLEAN: u8 = 0x01;
pub const STRING: u8 = 0x02;
pub const OBJECT: u8 = 0x03;
pub const NULL: u8 = 0x05;
pub const UNDEFINED: u8 = 0x06;
pub const REFERENCE: u8 = 0x07;
pub const ECMA_ARRAY: u8 = 0x08;
pub const OBJECT_END: u8 = 0x09;
pub const STRICT_ARRAY: u8 = 0x0A;
pub const DATE: u8 = 0x0B;
pub const LONG_STRING: u8 = 0x0C;
pub const UNSUPPORTED: u8 = 0x0D;
pub const XML_DOCUMENT: u8 = 0x0F;
pub const TYPED_OBJECT: u8 = 0x10;
/// Marks an inline switch to AMF3 encoding for the rest of the value.
pub const AVM_PLUS_OBJECT: u8 = 0x11;

/// `UTF-8-empty` followed by `object-end-marker` as a single 3-byte run
/// (00 00 09) that terminates an object, ECMA array, or strict-array body.
pub const OBJECT_END_MARKER: [u8; 3] = [0x00, 0x00, OBJECT_END];
