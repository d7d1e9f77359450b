///! @see: SPEC_FULL.md section 4.6 (C6), the "command-or-data" algorithm.
use std::borrow::Cow;

use amf_formats::{AmfWriteResult, Value};

use crate::message::AmfEncoder;

/// Whether a command body is an outbound request, or a response reporting
/// success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Request,
    Success,
    Failure,
}

/// One `CommandAmf0`/`CommandAmf3`/`DataAmf0`/`DataAmf3` payload. `Notify`
/// messages (plain data, e.g. `onMetaData`/`@setDataFrame`) carry no
/// invocation id; `Invoke` messages (connect, call, createStream, ...) do.
#[derive(Debug, Clone)]
pub struct Command {
    pub name: String,
    pub outcome: CallOutcome,
    pub invocation_id: Option<f64>,
    pub connection_params: Option<Value>,
    pub arguments: Vec<Value>,
}

impl Command {
    pub fn notify(name: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            outcome: CallOutcome::Request,
            invocation_id: None,
            connection_params: None,
            arguments,
        }
    }

    pub fn invoke(name: impl Into<String>, invocation_id: f64, connection_params: Option<Value>, arguments: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            outcome: CallOutcome::Request,
            invocation_id: Some(invocation_id),
            connection_params,
            arguments,
        }
    }

    pub fn response(name: impl Into<String>, invocation_id: f64, outcome: CallOutcome, arguments: Vec<Value>) -> Self {
        debug_assert_ne!(outcome, CallOutcome::Request, "a response command needs an outcome");
        Self {
            name: name.into(),
            outcome,
            invocation_id: Some(invocation_id),
            connection_params: None,
            arguments,
        }
    }
}

fn call_failed_status() -> Value {
    amf_formats::object([
        ("level", Value::Utf8String("error".to_string())),
        ("code", Value::Utf8String("CallFailed".to_string())),
        ("description", Value::Utf8String("Call failed.".to_string())),
    ])
}

/// Writes `command` through `encoder` following the method-name /
/// invocation-id / argument-list algorithm common to every RTMP command
/// and data message. @see SPEC_FULL.md section 4.6.
pub fn write_command_or_data<W: std::io::Write>(encoder: &mut AmfEncoder<W>, command: &Command) -> AmfWriteResult<()> {
    let method_name = match command.outcome {
        CallOutcome::Request => command.name.as_str(),
        CallOutcome::Success => "_result",
        CallOutcome::Failure => "_error",
    };
    encoder.write_value(&Value::Utf8String(method_name.to_string()))?;

    if command.name == "@setDataFrame" {
        if let Some(params) = &command.connection_params {
            encoder.write_value(params)?;
        }
    }

    if let Some(invocation_id) = command.invocation_id {
        encoder.write_value(&Value::Double(invocation_id))?;
        match &command.connection_params {
            Some(params) => encoder.write_value(params)?,
            None => encoder.write_value(&Value::Null)?,
        }
    }

    let is_failed_invoke = command.invocation_id.is_some() && command.outcome == CallOutcome::Failure;
    let arguments: Cow<[Value]> = if is_failed_invoke {
        Cow::Owned(vec![call_failed_status()])
    } else {
        Cow::Borrowed(&command.arguments)
    };

    for argument in arguments.iter() {
        encoder.write_value(argument)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::AmfEncoder;
    use amf_formats::amf0;

    fn encode(command: &Command) -> Vec<u8> {
        let mut encoder = AmfEncoder::Amf0(amf0::Writer::new(Vec::new()));
        write_command_or_data(&mut encoder, command).unwrap();
        match encoder {
            AmfEncoder::Amf0(w) => w.into_inner(),
            AmfEncoder::Amf3(_) => unreachable!(),
        }
    }

    #[test]
    fn notify_has_no_invocation_id() {
        let command = Command::notify("onStatus", vec![Value::Utf8String("ok".to_string())]);
        let bytes = encode(&command);
        // method-name string then the single argument, no transaction id.
        assert_eq!(bytes[0], 0x02); // AMF0 String marker
    }

    #[test]
    fn failed_invoke_substitutes_call_failed_status() {
        let command = Command::response("_error", 2.0, CallOutcome::Failure, vec![Value::Utf8String("ignored".to_string())]);
        let bytes = encode(&command);
        // The object marker for the substituted CallFailed status object
        // must appear somewhere after the name/id prefix.
        assert!(bytes.contains(&0x03));
    }
}
