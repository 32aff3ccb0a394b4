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

//! Parses response frames back into named output tensors.
//!
//! The JSON header declares outputs in order. Each binary output claims the
//! next `binary_data_size` bytes of the trailing payload, so offsets are the
//! running sum of the sizes declared before it. Every payload byte must be
//! claimed by exactly one output.

use std::collections::HashSet;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::header::{RequestInputs, ResponseHeader, TensorEntry};
use crate::infer::{InferenceRequest, InferenceResponse};
use crate::tensor::{DataType, TensorBuffer};

/// Decodes a response body.
///
/// `header_length` is the value of the `Inference-Header-Content-Length`
/// transport header. When it is `None` the whole body is the JSON header.
///
/// # Errors
///
/// Returns [`Error::Decoding`] if the frame is malformed,
/// [`Error::UnsupportedDType`] for an unknown datatype string and
/// [`Error::Server`] if the server answered with an error document.
///
/// # Example
///
/// ```rust
/// use triton_http_codec::decoder;
///
/// let body = br#"{"model_name":"t5","outputs":[{"name":"n","shape":[1],"datatype":"INT32","data":[7]}]}"#;
/// let response = decoder::decode(body.to_vec(), None).unwrap();
/// assert_eq!(response.output("n").unwrap().to_vec::<i32>().unwrap(), vec![7]);
/// ```
pub fn decode(body: impl Into<Bytes>, header_length: Option<usize>) -> Result<InferenceResponse> {
    let (header, payload) = split_body(body.into(), header_length)?;
    let mut response = decode_split(&header, payload)?;
    response.header_length = header_length;
    Ok(response)
}

/// Decodes a response whose header and binary payload were already split by
/// the transport.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_parts(header: &[u8], payload: impl Into<Bytes>) -> Result<InferenceResponse> {
    let payload = payload.into();
    let header_length = (!payload.is_empty()).then_some(header.len());
    let mut response = decode_split(header, payload)?;
    response.header_length = header_length;
    Ok(response)
}

/// Decodes a response and checks that every output `request` asked for is
/// present.
///
/// # Errors
///
/// Same as [`decode`], plus [`Error::MissingOutput`] naming the first
/// requested output the server did not return.
pub fn decode_for(
    request: &InferenceRequest,
    body: impl Into<Bytes>,
    header_length: Option<usize>,
) -> Result<InferenceResponse> {
    let response = decode(body, header_length)?;
    response.ensure_requested(request)?;
    Ok(response)
}

/// Parses a request frame back into its input tensors.
///
/// This is the server half of [`encoder::encode`](crate::encoder::encode),
/// used by loopback transports.
///
/// # Errors
///
/// Same framing errors as [`decode`].
pub fn decode_inputs(body: impl Into<Bytes>, header_length: Option<usize>) -> Result<Vec<TensorBuffer>> {
    let (header, payload) = split_body(body.into(), header_length)?;
    let document: RequestInputs = parse_json(&header)?;
    build_tensors(document.inputs, &payload)
}

/// Parses the decimal value of an `Inference-Header-Content-Length` header.
///
/// # Errors
///
/// Returns [`Error::Decoding`] if the value is not a non-negative integer.
pub fn parse_header_length(value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| {
        Error::Decoding(format!("invalid header length '{value}'"))
    })
}

fn split_body(body: Bytes, header_length: Option<usize>) -> Result<(Bytes, Bytes)> {
    match header_length {
        None => Ok((body, Bytes::new())),
        Some(n) if n > body.len() => Err(Error::Decoding(format!(
            "header length {n} exceeds body length {}",
            body.len()
        ))),
        Some(n) => {
            let mut header = body;
            let payload = header.split_off(n);
            Ok((header, payload))
        }
    }
}

fn parse_json<T: DeserializeOwned>(header: &[u8]) -> Result<T> {
    serde_json::from_slice(header)
        .map_err(|e| Error::Decoding(format!("invalid JSON header: {e}")))
}

fn decode_split(header: &[u8], payload: Bytes) -> Result<InferenceResponse> {
    let document: ResponseHeader = parse_json(header)?;
    if let Some(message) = document.error {
        return Err(Error::Server(message));
    }

    let outputs = build_tensors(document.outputs, &payload)?;
    tracing::trace!(
        outputs = outputs.len(),
        binary_bytes = payload.len(),
        "decoded inference response"
    );
    Ok(InferenceResponse {
        id: document.id,
        model_name: document.model_name,
        model_version: document.model_version,
        outputs,
        header_length: None,
    })
}

fn build_tensors(entries: Vec<TensorEntry>, payload: &Bytes) -> Result<Vec<TensorBuffer>> {
    let mut seen = HashSet::with_capacity(entries.len());
    let mut tensors = Vec::with_capacity(entries.len());
    let mut offset = 0usize;

    for entry in entries {
        if !seen.insert(entry.name.clone()) {
            return Err(Error::Decoding(format!(
                "duplicate tensor name '{}'",
                entry.name
            )));
        }
        let datatype: DataType = entry.datatype.parse()?;
        let binary_size = entry.parameters.and_then(|p| p.binary_data_size);

        let tensor = match (binary_size, entry.data) {
            (Some(size), _) => {
                let end = offset
                    .checked_add(size)
                    .filter(|end| *end <= payload.len())
                    .ok_or_else(|| {
                        Error::Decoding(format!(
                            "tensor '{}' claims bytes {offset}..{offset}+{size} but the payload has {}",
                            entry.name,
                            payload.len()
                        ))
                    })?;
                let data = payload.slice(offset..end);
                offset = end;
                TensorBuffer::new(entry.name, entry.shape, datatype, data).map_err(|e| match e {
                    Error::ShapeMismatch(msg) => Error::Decoding(msg),
                    other => other,
                })?
            }
            (None, Some(values)) => {
                let mut flat = Vec::with_capacity(values.len());
                flatten(values, &mut flat);
                TensorBuffer::from_json_values(entry.name, entry.shape, datatype, &flat)?
                    .with_binary_data(false)
            }
            (None, None) => {
                return Err(Error::Decoding(format!(
                    "tensor '{}' has neither binary data nor inline data",
                    entry.name
                )));
            }
        };
        tensors.push(tensor);
    }

    if offset != payload.len() {
        return Err(Error::Decoding(format!(
            "{} trailing payload bytes are not claimed by any tensor",
            payload.len() - offset
        )));
    }
    Ok(tensors)
}

fn flatten(values: Vec<Value>, out: &mut Vec<Value>) {
    for value in values {
        match value {
            Value::Array(inner) => flatten(inner, out),
            other => out.push(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
