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

//! Builder types for inference requests and the decoded response wrapper.
//!
//! [`InferRequestBuilder`] assembles an [`InferenceRequest`] from input
//! tensors and [`RequestOptions`]; the encoder turns that request into a wire
//! frame. [`InferenceResponse`] is what the decoder hands back.
//!
//! # Example
//!
//! ```rust
//! use triton_http_codec::infer::{Compression, InferRequestBuilder};
//! use triton_http_codec::tensor::TensorBuffer;
//!
//! let input = TensorBuffer::from_slice("input_ids", vec![1, 3], &[4u32, 8, 15]).unwrap();
//!
//! let request = InferRequestBuilder::new()
//!     .request_id("req-001")
//!     .input(input)
//!     .output("output_ids")
//!     .priority(2)
//!     .response_compression(Compression::Gzip)
//!     .build();
//!
//! assert_eq!(request.inputs().len(), 1);
//! assert_eq!(request.id(), Some("req-001"));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tensor::TensorBuffer;

// ---------------------------------------------------------------------------
// Compression
// ---------------------------------------------------------------------------

/// Response compression the client is willing to accept.
///
/// This only annotates the outgoing header list with `Accept-Encoding`;
/// decompressing the body is up to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// `Accept-Encoding: gzip`
    Gzip,
    /// `Accept-Encoding: deflate`
    Deflate,
}

impl Compression {
    /// Returns the literal `Accept-Encoding` value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Request parameters
// ---------------------------------------------------------------------------

/// Identifier correlating requests of a stateful sequence.
///
/// The server accepts either an unsigned integer or a string. `0` and the
/// empty string mean "no sequence".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SequenceId {
    /// Numeric correlation id.
    Int(u64),
    /// String correlation id.
    Str(String),
}

impl SequenceId {
    /// Whether this id names an actual sequence.
    #[must_use]
    pub fn is_set(&self) -> bool {
        match self {
            Self::Int(id) => *id != 0,
            Self::Str(id) => !id.is_empty(),
        }
    }
}

impl From<u64> for SequenceId {
    fn from(id: u64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for SequenceId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_owned())
    }
}

impl From<String> for SequenceId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

/// Sequence batching controls attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Sequence {
    /// Correlation id of the sequence.
    pub id: SequenceId,
    /// Marks the first request of the sequence.
    #[serde(default)]
    pub start: bool,
    /// Marks the last request of the sequence.
    #[serde(default)]
    pub end: bool,
}

/// Request-level parameters. Every field is optional; unset fields are
/// omitted from the JSON header entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParameters {
    /// Sequence controls, only ever set with a non-default id.
    pub sequence: Option<Sequence>,
    /// Scheduling priority, only ever set when non-zero.
    pub priority: Option<u64>,
    /// Server-side timeout in microseconds. Forwarded, never enforced locally.
    pub timeout: Option<u64>,
}

// ---------------------------------------------------------------------------
// RequestedOutput
// ---------------------------------------------------------------------------

/// Describes a requested output tensor for an inference request.
///
/// Specifying outputs is optional. When no outputs are requested, the server
/// is asked to return every output in binary form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestedOutput {
    name: String,
    #[serde(default = "default_binary_data")]
    binary_data: bool,
    #[serde(default)]
    class_count: Option<u32>,
}

fn default_binary_data() -> bool {
    true
}

impl RequestedOutput {
    /// Creates a new requested output, returned as binary data.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binary_data: true,
            class_count: None,
        }
    }

    /// Chooses between a binary segment and inline JSON for this output.
    #[must_use]
    pub fn with_binary_data(self, binary_data: bool) -> Self {
        Self {
            binary_data,
            ..self
        }
    }

    /// Asks the server for the top `count` classifications instead of raw
    /// output values. A count of zero disables classification.
    #[must_use]
    pub fn with_class_count(self, count: u32) -> Self {
        Self {
            class_count: (count != 0).then_some(count),
            ..self
        }
    }

    /// Returns the output tensor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the output is requested as binary data.
    #[must_use]
    pub fn binary_data(&self) -> bool {
        self.binary_data
    }

    /// Returns the classification count, if any.
    #[must_use]
    pub fn class_count(&self) -> Option<u32> {
        self.class_count
    }
}

// ---------------------------------------------------------------------------
// RequestOptions
// ---------------------------------------------------------------------------

/// Per-request metadata that travels alongside the input tensors.
///
/// # Example
///
/// ```rust
/// use triton_http_codec::infer::{Compression, RequestOptions};
///
/// let options = RequestOptions::default()
///     .request_id("abc")
///     .sequence(42u64, true, false)
///     .timeout_us(5_000)
///     .response_compression(Compression::Deflate);
/// assert_eq!(options.parameters().timeout, Some(5_000));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    request_id: Option<String>,
    outputs: Option<Vec<RequestedOutput>>,
    sequence: Option<Sequence>,
    priority: Option<u64>,
    timeout_us: Option<u64>,
    response_compression: Option<Compression>,
}

impl RequestOptions {
    /// Sets the request identifier echoed by the server. An empty id is the
    /// same as no id.
    #[must_use]
    pub fn request_id(self, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            request_id: (!id.is_empty()).then_some(id),
            ..self
        }
    }

    /// Adds a requested output.
    #[must_use]
    pub fn output(mut self, output: RequestedOutput) -> Self {
        self.outputs.get_or_insert_with(Vec::new).push(output);
        self
    }

    /// Sets sequence batching controls. An unset id (`0` or `""`) clears them.
    #[must_use]
    pub fn sequence(self, id: impl Into<SequenceId>, start: bool, end: bool) -> Self {
        let id = id.into();
        Self {
            sequence: id.is_set().then_some(Sequence { id, start, end }),
            ..self
        }
    }

    /// Sets the scheduling priority. Zero is the server default and is not
    /// sent.
    #[must_use]
    pub fn priority(self, priority: u64) -> Self {
        Self {
            priority: (priority != 0).then_some(priority),
            ..self
        }
    }

    /// Sets the server-side timeout in microseconds.
    #[must_use]
    pub fn timeout_us(self, timeout: u64) -> Self {
        Self {
            timeout_us: Some(timeout),
            ..self
        }
    }

    /// Requests a compressed response.
    #[must_use]
    pub fn response_compression(self, compression: Compression) -> Self {
        Self {
            response_compression: Some(compression),
            ..self
        }
    }

    /// Returns the request parameters these options describe.
    #[must_use]
    pub fn parameters(&self) -> RequestParameters {
        RequestParameters {
            sequence: self.sequence.clone().filter(|s| s.id.is_set()),
            priority: self.priority.filter(|p| *p != 0),
            timeout: self.timeout_us,
        }
    }
}

// ---------------------------------------------------------------------------
// InferenceRequest
// ---------------------------------------------------------------------------

/// A fully assembled inference call, ready to be encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    id: Option<String>,
    inputs: Vec<TensorBuffer>,
    outputs: Option<Vec<RequestedOutput>>,
    parameters: RequestParameters,
    response_compression: Option<Compression>,
}

impl InferenceRequest {
    /// Returns the request identifier, if one was set.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the input tensors in wire order.
    #[must_use]
    pub fn inputs(&self) -> &[TensorBuffer] {
        &self.inputs
    }

    /// Returns the requested outputs, or `None` when all outputs are wanted.
    #[must_use]
    pub fn outputs(&self) -> Option<&[RequestedOutput]> {
        self.outputs.as_deref()
    }

    /// Returns the request parameters.
    #[must_use]
    pub fn parameters(&self) -> &RequestParameters {
        &self.parameters
    }

    /// Returns the requested response compression.
    #[must_use]
    pub fn response_compression(&self) -> Option<Compression> {
        self.response_compression
    }
}

// ---------------------------------------------------------------------------
// InferRequestBuilder
// ---------------------------------------------------------------------------

/// Builder for [`InferenceRequest`] values.
///
/// Inputs keep the order in which they are added; that order is the order of
/// both the JSON header entries and the binary payload.
#[derive(Debug, Default)]
pub struct InferRequestBuilder {
    inputs: Vec<TensorBuffer>,
    options: RequestOptions,
}

impl InferRequestBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the request options wholesale.
    #[must_use]
    pub fn options(self, options: RequestOptions) -> Self {
        Self { options, ..self }
    }

    /// Sets an optional request identifier.
    #[must_use]
    pub fn request_id(self, id: impl Into<String>) -> Self {
        Self {
            options: self.options.request_id(id),
            ..self
        }
    }

    /// Adds an input tensor to the request.
    #[must_use]
    pub fn input(mut self, input: TensorBuffer) -> Self {
        self.inputs.push(input);
        self
    }

    /// Adds multiple input tensors to the request.
    #[must_use]
    pub fn inputs(mut self, inputs: impl IntoIterator<Item = TensorBuffer>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    /// Adds a requested output by name, returned as binary data.
    #[must_use]
    pub fn output(self, name: impl Into<String>) -> Self {
        self.output_with(RequestedOutput::new(name))
    }

    /// Adds a fully-configured requested output.
    #[must_use]
    pub fn output_with(self, output: RequestedOutput) -> Self {
        Self {
            options: self.options.output(output),
            ..self
        }
    }

    /// Sets sequence batching controls.
    #[must_use]
    pub fn sequence(self, id: impl Into<SequenceId>, start: bool, end: bool) -> Self {
        Self {
            options: self.options.sequence(id, start, end),
            ..self
        }
    }

    /// Sets the scheduling priority.
    #[must_use]
    pub fn priority(self, priority: u64) -> Self {
        Self {
            options: self.options.priority(priority),
            ..self
        }
    }

    /// Sets the server-side timeout in microseconds.
    #[must_use]
    pub fn timeout_us(self, timeout: u64) -> Self {
        Self {
            options: self.options.timeout_us(timeout),
            ..self
        }
    }

    /// Requests a compressed response.
    #[must_use]
    pub fn response_compression(self, compression: Compression) -> Self {
        Self {
            options: self.options.response_compression(compression),
            ..self
        }
    }

    /// Consumes the builder and produces an [`InferenceRequest`].
    #[must_use]
    pub fn build(self) -> InferenceRequest {
        let parameters = self.options.parameters();
        InferenceRequest {
            id: self.options.request_id.filter(|id| !id.is_empty()),
            inputs: self.inputs,
            outputs: self.options.outputs,
            parameters,
            response_compression: self.options.response_compression,
        }
    }
}

// ---------------------------------------------------------------------------
// InferenceResponse
// ---------------------------------------------------------------------------

/// Output tensors decoded from a server response.
///
/// Outputs keep the order the server declared them in; lookups are by name.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResponse {
    pub(crate) id: Option<String>,
    pub(crate) model_name: Option<String>,
    pub(crate) model_version: Option<String>,
    pub(crate) outputs: Vec<TensorBuffer>,
    pub(crate) header_length: Option<usize>,
}

impl InferenceResponse {
    /// Creates a response holding the given outputs.
    ///
    /// This is useful for testing or when outputs were obtained outside of
    /// the normal decode path.
    #[must_use]
    pub fn new(outputs: Vec<TensorBuffer>) -> Self {
        Self {
            id: None,
            model_name: None,
            model_version: None,
            outputs,
            header_length: None,
        }
    }

    /// Returns the request identifier echoed by the server.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the model name that produced this response.
    #[must_use]
    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    /// Returns the model version that produced this response.
    #[must_use]
    pub fn model_version(&self) -> Option<&str> {
        self.model_version.as_deref()
    }

    /// Returns the JSON header length reported by the server, if the
    /// response carried a binary payload.
    #[must_use]
    pub fn header_length(&self) -> Option<usize> {
        self.header_length
    }

    /// Returns all output tensors in declaration order.
    #[must_use]
    pub fn outputs(&self) -> &[TensorBuffer] {
        &self.outputs
    }

    /// Finds an output tensor by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TensorBuffer> {
        self.outputs.iter().find(|o| o.name() == name)
    }

    /// Finds an output tensor by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingOutput`] if the response has no such output.
    pub fn output(&self, name: &str) -> Result<&TensorBuffer> {
        self.get(name)
            .ok_or_else(|| Error::MissingOutput(name.to_owned()))
    }

    /// Checks that every output the request asked for is present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingOutput`] naming the first absent output.
    pub fn ensure_requested(&self, request: &InferenceRequest) -> Result<()> {
        for requested in request.outputs().unwrap_or_default() {
            self.output(requested.name())?;
        }
        Ok(())
    }

    /// Consumes the response and returns its outputs.
    #[must_use]
    pub fn into_outputs(self) -> Vec<TensorBuffer> {
        self.outputs
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
