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

//! Wire codec for the Triton / KServe v2 HTTP inference protocol.
//!
//! This crate turns named, typed tensors into the hybrid request body that
//! Triton Inference Server accepts over HTTP (a JSON header immediately
//! followed by raw little-endian tensor bytes) and turns the server's
//! response back into tensors. On top of the codec it provides the
//! text-generation helpers of FasterTransformer models: building the input
//! tensors from token ids and reducing generated tokens to text.
//!
//! The crate never performs I/O. The HTTP call and tokenization are injected
//! through the [`Transport`](transport::Transport) and
//! [`Tokenizer`](tokenizer::Tokenizer) traits.
//!
//! # Quick Start
//!
//! ```rust
//! use triton_http_codec::{decoder, encoder};
//! use triton_http_codec::preprocess::{GenerationParams, RequestBuilder, TensorRoles};
//! use triton_http_codec::reducer::ResultReducer;
//! use triton_http_codec::tensor::TensorBuffer;
//!
//! # fn main() -> triton_http_codec::error::Result<()> {
//! // Build the T5 input tensors for one padded row
//! let params = GenerationParams {
//!     input_ids: vec![vec![21603, 10, 1]],
//!     input_lengths: vec![3],
//!     max_output_len: 128,
//!     sampling: 1,
//! };
//! let request = RequestBuilder::new(TensorRoles::fastertransformer_t5()).build_request(&params)?;
//!
//! // Encode the request body and its transport headers
//! let frame = encoder::encode(&request)?;
//! assert_eq!(frame.header_length(), frame.header_json().len());
//!
//! // Decode a server answer
//! let outputs = [
//!     TensorBuffer::from_slice("output_ids", vec![1, 1, 4], &[8u32, 4, 1, 0])?,
//!     TensorBuffer::from_slice("sequence_length", vec![1, 1], &[3u32])?,
//! ];
//! let answer = encoder::encode_response(None, &outputs)?;
//! let response = decoder::decode(answer.body(), Some(answer.header_length()))?;
//!
//! let rows = ResultReducer::default().truncate(&response)?;
//! assert_eq!(rows, vec![vec![8, 4, 1]]);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`tensor`] -- [`TensorBuffer`](tensor::TensorBuffer) and the wire
//!   datatype table.
//! - [`infer`] -- Request/response value types and the request builder.
//! - [`preprocess`] -- Generation input tensors and tensor name presets.
//! - [`encoder`] -- Request serialization into a [`WireFrame`](encoder::WireFrame).
//! - [`decoder`] -- Response parsing with running-sum binary offsets.
//! - [`reducer`] -- Sequence-length truncation and detokenization.
//! - [`client`] -- [`TextClient`](client::TextClient), the full text pipeline.
//! - [`transport`] / [`tokenizer`] -- Collaborator traits.
//! - [`timing`] -- Stage timers.
//! - [`error`] -- Error types and the [`Result`](error::Result) alias.

pub mod client;
pub mod decoder;
pub mod encoder;
pub mod error;
mod header;
pub mod infer;
pub mod preprocess;
pub mod reducer;
pub mod tensor;
pub mod timing;
pub mod tokenizer;
pub mod transport;

/// Re-export of the main client type for convenience.
pub use client::TextClient;
pub use error::{Error, Result};
pub use tensor::{DataType, TensorBuffer};
