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

//! Text-level inference client.
//!
//! [`TextClient`] runs the whole pipeline for one text or a batch of texts:
//! tokenize, build the input tensors, encode the wire frame, send it through
//! the [`Transport`], decode the response and reduce the generated tokens
//! back to text. Each stage is timed and logged at debug level.
//!
//! # Example
//!
//! ```rust,no_run
//! use triton_http_codec::client::{ClientOptions, TextClient};
//! use triton_http_codec::error::Result;
//! use triton_http_codec::tokenizer::Tokenizer;
//! use triton_http_codec::transport::Transport;
//!
//! async fn summarize<T: Transport, K: Tokenizer>(transport: T, tokenizer: K) -> Result<String> {
//!     let client = TextClient::new(transport, tokenizer, "fastertransformer")
//!         .with_options(ClientOptions::default().max_output_len(64));
//!     client.infer(Some("summarize"), "studies have shown that ...").await
//! }
//! ```

use serde::Deserialize;

use crate::decoder;
use crate::encoder::{self, WireFrame};
use crate::error::{Error, Result};
use crate::infer::{InferenceRequest, RequestOptions, RequestedOutput};
use crate::preprocess::{self, RequestBuilder, TensorRoles};
use crate::reducer::ResultReducer;
use crate::timing::{timed, Timer};
use crate::tokenizer::Tokenizer;
use crate::transport::Transport;

/// Default number of tokens to generate per row.
const DEFAULT_MAX_OUTPUT_LEN: u32 = 128;

/// Options for a [`TextClient`].
///
/// # Example
///
/// ```rust
/// use triton_http_codec::client::ClientOptions;
/// use triton_http_codec::infer::{Compression, RequestOptions};
///
/// let options = ClientOptions::default()
///     .max_output_len(256)
///     .sampling(4)
///     .binary_inputs(true)
///     .request(RequestOptions::default().response_compression(Compression::Gzip));
/// assert_eq!(options.get_max_output_len(), 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    max_output_len: u32,
    sampling: u32,
    binary_inputs: bool,
    request_outputs: bool,
    request: RequestOptions,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_output_len: DEFAULT_MAX_OUTPUT_LEN,
            sampling: 1,
            binary_inputs: false,
            request_outputs: false,
            request: RequestOptions::default(),
        }
    }
}

impl ClientOptions {
    /// Loads options from a JSON document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document is malformed.
    pub fn from_json(document: &str) -> Result<Self> {
        serde_json::from_str(document).map_err(|e| Error::Config(format!("client options: {e}")))
    }

    /// Sets the maximum number of generated tokens.
    ///
    /// Default: 128.
    #[must_use]
    pub fn max_output_len(self, max_output_len: u32) -> Self {
        Self {
            max_output_len,
            ..self
        }
    }

    /// Sets the sampling parameter (top-k or beam width).
    ///
    /// Default: 1.
    #[must_use]
    pub fn sampling(self, sampling: u32) -> Self {
        Self { sampling, ..self }
    }

    /// Sends inputs as a binary payload instead of inline JSON.
    ///
    /// Default: `false`.
    #[must_use]
    pub fn binary_inputs(self, binary_inputs: bool) -> Self {
        Self {
            binary_inputs,
            ..self
        }
    }

    /// Names the token and length outputs explicitly in each request instead
    /// of asking for every output.
    ///
    /// Default: `false`.
    #[must_use]
    pub fn request_outputs(self, request_outputs: bool) -> Self {
        Self {
            request_outputs,
            ..self
        }
    }

    /// Sets the per-request options (id, sequence, priority, timeout,
    /// compression).
    #[must_use]
    pub fn request(self, request: RequestOptions) -> Self {
        Self { request, ..self }
    }

    /// Returns the maximum number of generated tokens.
    #[must_use]
    pub fn get_max_output_len(&self) -> u32 {
        self.max_output_len
    }

    /// Returns the sampling parameter.
    #[must_use]
    pub fn get_sampling(&self) -> u32 {
        self.sampling
    }
}

/// Runs text generation against one model.
///
/// The client holds no connection state of its own; share it behind an
/// `Arc` to use it from several tasks.
#[derive(Debug)]
pub struct TextClient<T, K> {
    transport: T,
    tokenizer: K,
    model_name: String,
    roles: TensorRoles,
    options: ClientOptions,
}

impl<T: Transport, K: Tokenizer> TextClient<T, K> {
    /// Creates a client for `model_name` with T5 tensor names and default
    /// options.
    pub fn new(transport: T, tokenizer: K, model_name: impl Into<String>) -> Self {
        Self {
            transport,
            tokenizer,
            model_name: model_name.into(),
            roles: TensorRoles::default(),
            options: ClientOptions::default(),
        }
    }

    /// Sets the tensor names of the model signature.
    #[must_use]
    pub fn with_roles(self, roles: TensorRoles) -> Self {
        Self { roles, ..self }
    }

    /// Sets the client options.
    #[must_use]
    pub fn with_options(self, options: ClientOptions) -> Self {
        Self { options, ..self }
    }

    /// Returns the model name requests are sent to.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the tensor names in use.
    #[must_use]
    pub fn roles(&self) -> &TensorRoles {
        &self.roles
    }

    /// Returns the client options.
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Tokenizes `texts` and builds the inference request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Preprocessing`] for an empty batch and propagates
    /// tokenizer failures.
    pub fn preprocess<S: AsRef<str>>(&self, texts: &[S]) -> Result<InferenceRequest> {
        self.build_request(texts, self.options.request.clone())
    }

    /// Builds the raw wire frame for `texts` without sending it, for callers
    /// that post it with their own HTTP client.
    ///
    /// An empty `request_id` keeps whatever id the options carry.
    ///
    /// # Errors
    ///
    /// Same as [`preprocess`](Self::preprocess), plus [`Error::Encoding`].
    pub fn payload<S: AsRef<str>>(&self, texts: &[S], request_id: &str) -> Result<WireFrame> {
        let mut options = self.options.request.clone();
        if !request_id.is_empty() {
            options = options.request_id(request_id);
        }
        let request = self.build_request(texts, options)?;
        timed("encode", || encoder::encode(&request))
    }

    /// Generates text for a single input, optionally prefixed with a task
    /// name (`"{task}: {text}"`).
    ///
    /// # Errors
    ///
    /// Returns any error of [`infer_batch`](Self::infer_batch).
    pub async fn infer(&self, task: Option<&str>, text: &str) -> Result<String> {
        let timer = Timer::start("infer");
        let text = preprocess::with_task(task, text);
        let rows = self.infer_batch(&[text]).await;
        timer.stop();
        rows?
            .pop()
            .ok_or_else(|| Error::Decoding("response has no rows".into()))
    }

    /// Generates text for every input of a batch, returned in input order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the call fails, [`Error::Server`] if
    /// the server rejects it, and the codec errors of each stage otherwise.
    pub async fn infer_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<String>> {
        tracing::debug!(model = %self.model_name, batch = texts.len(), "running inference");

        let request = self.preprocess(texts)?;
        let frame = timed("encode", || encoder::encode(&request))?;

        let timer = Timer::start("transport");
        let raw = self.transport.infer(&self.model_name, frame).await;
        timer.stop();
        let raw = raw?;

        let response = timed("decode", || {
            decoder::decode_for(&request, raw.body, raw.header_length)
        })?;
        let reducer = ResultReducer::from_roles(&self.roles);
        let outputs = timed("postprocess", || reducer.reduce(&response, &self.tokenizer))?;

        if outputs.len() != texts.len() {
            return Err(Error::Decoding(format!(
                "sent {} texts but received {} rows",
                texts.len(),
                outputs.len()
            )));
        }
        Ok(outputs)
    }

    fn build_request<S: AsRef<str>>(
        &self,
        texts: &[S],
        mut request: RequestOptions,
    ) -> Result<InferenceRequest> {
        timed("preprocess", || {
            let params = preprocess::tokenize_batch(
                &self.tokenizer,
                texts,
                self.options.max_output_len,
                self.options.sampling,
            )?;
            if self.options.request_outputs {
                request = request
                    .output(RequestedOutput::new(&self.roles.output_ids))
                    .output(RequestedOutput::new(&self.roles.output_lengths));
            }
            RequestBuilder::new(self.roles.clone())
                .with_options(request)
                .with_binary_inputs(self.options.binary_inputs)
                .build_request(&params)
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
