// Copyright 2024-2026, NVIDIA CORPORATION & AFFILIATES. All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions
// are met:
//  * Redistributions of source code must retain the above copyright
//    notice, this list of conditions and the following disclaimer.
//  * Redistributions in binary form must reproduce the above copyright
//    notice, this list of conditions and the following disclaimer in the
//    documentation and/or other materials provided with the distribution.
//  * Neither the name of NVIDIA CORPORATION nor the names of its
//    contributors may be used to endorse or promote products derived
//    from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS ``AS IS'' AND ANY
// EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR
// PURPOSE ARE DISCLAIMED.  IN NO EVENT SHALL THE COPYRIGHT OWNER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY
// OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT
// (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Serializes inference requests into wire frames.
//!
//! A frame is a compact JSON header immediately followed by the raw bytes of
//! every binary tensor, in input order, with no separator. When a binary
//! segment is present the receiver needs the header length out of band, so
//! the frame carries an `Inference-Header-Content-Length` transport header.
//!
//! # Example
//!
//! ```rust
//! use triton_http_codec::encoder::{self, HEADER_CONTENT_LENGTH};
//! use triton_http_codec::infer::InferRequestBuilder;
//! use triton_http_codec::tensor::TensorBuffer;
//!
//! let ids = TensorBuffer::from_slice("input_ids", vec![1, 2], &[3u32, 4]).unwrap();
//! let request = InferRequestBuilder::new().input(ids).build();
//!
//! let frame = encoder::encode(&request).unwrap();
//! assert_eq!(frame.binary_payload().len(), 8);
//! assert_eq!(
//!     frame.header(HEADER_CONTENT_LENGTH),
//!     Some(frame.header_length().to_string().as_str())
//! );
//! ```

use std::collections::HashSet;

use bytes::{Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::header::{
    OutputEntry, RequestHeader, ResponseHeader, TensorEntry, TensorParameters, WireParameters,
};
use crate::infer::InferenceRequest;
use crate::tensor::TensorBuffer;

/// Transport header carrying the byte length of the JSON header segment.
pub const HEADER_CONTENT_LENGTH: &str = "Inference-Header-Content-Length";

/// Transport header advertising accepted response compression.
pub const ACCEPT_ENCODING: &str = "Accept-Encoding";

// ---------------------------------------------------------------------------
// WireFrame
// ---------------------------------------------------------------------------

/// The complete byte sequence and transport headers for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFrame {
    header_json: Bytes,
    binary_payload: Bytes,
    headers: Vec<(String, String)>,
}

impl WireFrame {
    /// Returns the UTF-8 JSON header segment.
    #[must_use]
    pub fn header_json(&self) -> &Bytes {
        &self.header_json
    }

    /// Returns the byte length of the JSON header segment.
    #[must_use]
    pub fn header_length(&self) -> usize {
        self.header_json.len()
    }

    /// Returns the concatenated bytes of every binary tensor.
    #[must_use]
    pub fn binary_payload(&self) -> &Bytes {
        &self.binary_payload
    }

    /// Whether any tensor travels as binary data.
    #[must_use]
    pub fn has_binary_payload(&self) -> bool {
        !self.binary_payload.is_empty()
    }

    /// Returns the transport headers in the order they must be sent.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Looks up a transport header, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the full wire body: `header_json || binary_payload`.
    #[must_use]
    pub fn body(&self) -> Bytes {
        if self.binary_payload.is_empty() {
            return self.header_json.clone();
        }
        let mut body = BytesMut::with_capacity(self.header_json.len() + self.binary_payload.len());
        body.extend_from_slice(&self.header_json);
        body.extend_from_slice(&self.binary_payload);
        body.freeze()
    }

    fn new(header_json: Vec<u8>, binary_payload: Bytes, headers: Vec<(String, String)>) -> Self {
        let mut frame = Self {
            header_json: Bytes::from(header_json),
            binary_payload,
            headers,
        };
        if frame.has_binary_payload() {
            frame
                .headers
                .push((HEADER_CONTENT_LENGTH.to_owned(), frame.header_length().to_string()));
        }
        frame
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encodes a request into a wire frame.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if two inputs share a name or an inline tensor
/// cannot be represented as JSON.
pub fn encode(request: &InferenceRequest) -> Result<WireFrame> {
    let (inputs, payload) = tensor_entries(request.inputs(), "input")?;

    let requested = request.outputs().filter(|outputs| !outputs.is_empty());
    let outputs = requested.map(|outputs| outputs.iter().map(OutputEntry::from).collect());

    let params = request.parameters();
    let sequence = params.sequence.as_ref();
    let parameters = WireParameters {
        sequence_id: sequence.map(|s| &s.id),
        sequence_start: sequence.map(|s| s.start),
        sequence_end: sequence.map(|s| s.end),
        priority: params.priority,
        timeout: params.timeout,
        binary_data_output: requested.is_none().then_some(true),
    };

    let header = RequestHeader {
        id: request.id(),
        inputs,
        outputs,
        parameters: (!parameters.is_empty()).then_some(parameters),
    };
    let header_json = serde_json::to_vec(&header)
        .map_err(|e| Error::Encoding(format!("cannot serialize request header: {e}")))?;

    let mut headers = Vec::new();
    if let Some(compression) = request.response_compression() {
        headers.push((ACCEPT_ENCODING.to_owned(), compression.as_str().to_owned()));
    }

    let frame = WireFrame::new(header_json, payload, headers);
    tracing::trace!(
        inputs = request.inputs().len(),
        header_length = frame.header_length(),
        binary_bytes = frame.binary_payload().len(),
        "encoded inference request"
    );
    Ok(frame)
}

/// Encodes output tensors into a response frame, the way a server would.
///
/// Loopback transports and test servers use this to answer requests; its
/// framing rules are the same as [`encode`].
///
/// # Errors
///
/// Returns [`Error::Encoding`] if two outputs share a name or an inline tensor
/// cannot be represented as JSON.
pub fn encode_response(id: Option<&str>, outputs: &[TensorBuffer]) -> Result<WireFrame> {
    let (entries, payload) = tensor_entries(outputs, "output")?;
    let header = ResponseHeader {
        id: id.map(str::to_owned),
        model_name: None,
        model_version: None,
        outputs: entries,
        error: None,
    };
    let header_json = serde_json::to_vec(&header)
        .map_err(|e| Error::Encoding(format!("cannot serialize response header: {e}")))?;
    Ok(WireFrame::new(header_json, payload, Vec::new()))
}

fn tensor_entries(tensors: &[TensorBuffer], kind: &str) -> Result<(Vec<TensorEntry>, Bytes)> {
    let mut seen = HashSet::with_capacity(tensors.len());
    let mut entries = Vec::with_capacity(tensors.len());
    let mut payload = BytesMut::new();

    for tensor in tensors {
        if !seen.insert(tensor.name()) {
            return Err(Error::Encoding(format!(
                "duplicate {kind} tensor name '{}'",
                tensor.name()
            )));
        }

        let (parameters, data) = if tensor.is_binary() {
            payload.extend_from_slice(tensor.data());
            let parameters = TensorParameters {
                binary_data_size: Some(tensor.data().len()),
            };
            (Some(parameters), None)
        } else {
            (None, Some(tensor.json_values()?))
        };

        entries.push(TensorEntry {
            name: tensor.name().to_owned(),
            shape: tensor.shape().to_vec(),
            datatype: tensor.datatype().as_str().to_owned(),
            parameters,
            data,
        });
    }

    Ok((entries, payload.freeze()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::{Compression, InferRequestBuilder, RequestedOutput};
    use serde_json::{json, Value};

    fn u32_tensor(name: &str, values: &[u32]) -> TensorBuffer {
        TensorBuffer::from_slice(name, vec![1, values.len()], values).unwrap()
    }

    fn header_value(frame: &WireFrame) -> Value {
        serde_json::from_slice(frame.header_json()).unwrap()
    }

    #[test]
    fn binary_inputs_follow_header() {
        let a = u32_tensor("a", &[1, 2]);
        let b = u32_tensor("b", &[3]);
        let request = InferRequestBuilder::new().input(a.clone()).input(b.clone()).build();

        let frame = encode(&request).unwrap();
        let body = frame.body();
        let n = frame.header_length();

        assert_eq!(n, frame.header_json().len());
        assert!(serde_json::from_slice::<Value>(&body[..n]).is_ok());

        let mut expected = a.data().to_vec();
        expected.extend_from_slice(b.data());
        assert_eq!(&body[n..], expected.as_slice());
        assert_eq!(frame.header(HEADER_CONTENT_LENGTH), Some(n.to_string().as_str()));
    }

    #[test]
    fn header_layout() {
        let request = InferRequestBuilder::new()
            .input(u32_tensor("input_ids", &[5, 6]))
            .build();
        let frame = encode(&request).unwrap();
        assert_eq!(
            header_value(&frame),
            json!({
                "inputs": [{
                    "name": "input_ids",
                    "shape": [1, 2],
                    "datatype": "UINT32",
                    "parameters": {"binary_data_size": 8}
                }],
                "parameters": {"binary_data_output": true}
            })
        );
        let text = std::str::from_utf8(frame.header_json()).unwrap();
        assert!(text.starts_with(r#"{"inputs":[{"name":"input_ids","shape":[1,2],"datatype":"UINT32""#));
    }

    #[test]
    fn inline_inputs_have_no_payload() {
        let ids = u32_tensor("input_ids", &[5, 6]).with_binary_data(false);
        let request = InferRequestBuilder::new().input(ids).build();
        let frame = encode(&request).unwrap();

        assert!(!frame.has_binary_payload());
        assert_eq!(frame.body(), *frame.header_json());
        assert_eq!(frame.header(HEADER_CONTENT_LENGTH), None);
        assert_eq!(header_value(&frame)["inputs"][0]["data"], json!([5, 6]));
        assert!(header_value(&frame)["inputs"][0].get("parameters").is_none());
    }

    #[test]
    fn inline_values_per_type() {
        let mask = TensorBuffer::from_slice("mask", vec![2], &[true, false])
            .unwrap()
            .with_binary_data(false);
        let text = TensorBuffer::from_strings("text", vec![1], &["hi"])
            .unwrap()
            .with_binary_data(false);
        let scale = TensorBuffer::from_slice("scale", vec![1], &[0.5f32])
            .unwrap()
            .with_binary_data(false);
        let request = InferRequestBuilder::new()
            .inputs(vec![mask, text, scale])
            .build();

        let header = header_value(&encode(&request).unwrap());
        assert_eq!(header["inputs"][0]["data"], json!([true, false]));
        assert_eq!(header["inputs"][1]["data"], json!(["hi"]));
        assert_eq!(header["inputs"][1]["datatype"], json!("BYTES"));
        assert_eq!(header["inputs"][2]["data"], json!([0.5]));
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        for values in [[f32::NAN, 1.0], [1.0, f32::INFINITY]] {
            let x = TensorBuffer::from_slice("x", vec![2], &values)
                .unwrap()
                .with_binary_data(false);
            let request = InferRequestBuilder::new().input(x).build();
            assert!(matches!(encode(&request), Err(Error::Encoding(_))));
        }

        let y = TensorBuffer::from_slice("y", vec![1], &[f64::NEG_INFINITY])
            .unwrap()
            .with_binary_data(false);
        assert!(matches!(encode_response(None, &[y]), Err(Error::Encoding(_))));
    }

    #[test]
    fn absent_fields_are_not_keys() {
        let request = InferRequestBuilder::new()
            .input(u32_tensor("x", &[1]))
            .output("y")
            .build();
        let header = header_value(&encode(&request).unwrap());
        let object = header.as_object().unwrap();
        assert!(!object.contains_key("id"));
        assert!(!object.contains_key("parameters"));
        assert_eq!(
            header["outputs"],
            json!([{"name": "y", "parameters": {"binary_data": true}}])
        );
    }

    #[test]
    fn all_parameters_in_order() {
        let request = InferRequestBuilder::new()
            .request_id("r1")
            .input(u32_tensor("x", &[1]).with_binary_data(false))
            .output_with(RequestedOutput::new("probs").with_class_count(2))
            .sequence(9u64, true, false)
            .priority(3)
            .timeout_us(1000)
            .build();
        let frame = encode(&request).unwrap();
        let text = std::str::from_utf8(frame.header_json()).unwrap();
        assert!(text.starts_with(r#"{"id":"r1","inputs":"#));
        assert!(text.ends_with(
            r#""outputs":[{"name":"probs","parameters":{"binary_data":true,"classification":2}}],"parameters":{"sequence_id":9,"sequence_start":true,"sequence_end":false,"priority":3,"timeout":1000}}"#
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let request = InferRequestBuilder::new()
            .input(u32_tensor("x", &[1]))
            .input(u32_tensor("x", &[2]))
            .build();
        assert!(matches!(encode(&request), Err(Error::Encoding(_))));
    }

    #[test]
    fn compression_header() {
        let request = InferRequestBuilder::new()
            .input(u32_tensor("x", &[1]))
            .response_compression(Compression::Deflate)
            .build();
        let frame = encode(&request).unwrap();
        assert_eq!(frame.headers()[0], (ACCEPT_ENCODING.to_owned(), "deflate".to_owned()));
        assert_eq!(frame.headers()[1].0, HEADER_CONTENT_LENGTH);
        assert_eq!(frame.header("accept-encoding"), Some("deflate"));

        let plain = InferRequestBuilder::new().input(u32_tensor("x", &[1])).build();
        assert_eq!(frame.header_json(), encode(&plain).unwrap().header_json());
    }

    #[test]
    fn encoding_is_deterministic() {
        let build = || {
            InferRequestBuilder::new()
                .request_id("same")
                .input(u32_tensor("a", &[1, 2, 3]))
                .input(u32_tensor("b", &[4]).with_binary_data(false))
                .sequence("s", false, true)
                .build()
        };
        assert_eq!(encode(&build()).unwrap(), encode(&build()).unwrap());
    }

    #[test]
    fn response_frame_uses_outputs_key() {
        let frame = encode_response(Some("r"), &[u32_tensor("output_ids", &[7])]).unwrap();
        let header = header_value(&frame);
        assert_eq!(header["id"], json!("r"));
        assert_eq!(header["outputs"][0]["parameters"]["binary_data_size"], json!(4));
        assert!(header.get("inputs").is_none());
    }
}
