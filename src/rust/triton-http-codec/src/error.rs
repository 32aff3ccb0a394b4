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

//! Error types for the tensor wire codec.
//!
//! This module defines [`Error`] -- the unified error type returned by all
//! fallible operations -- along with the [`Result`] type alias used throughout
//! the crate. Every invariant violation surfaces as its own variant so a
//! serving layer can map it to a client-facing status.

/// Convenience alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that may occur while building, encoding, decoding or reducing
/// inference tensors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A tensor's data does not match its declared shape and data type.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A data type string or element type is not part of the wire table.
    #[error("unsupported data type: {0}")]
    UnsupportedDType(String),

    /// Generation parameters are inconsistent (e.g. disagreeing batch sizes).
    #[error("preprocessing error: {0}")]
    Preprocessing(String),

    /// A request could not be serialized into a wire frame.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A response frame is corrupt, truncated or otherwise malformed.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// A requested output tensor is absent from the response.
    #[error("missing output: {0}")]
    MissingOutput(String),

    /// A row's sequence length is larger than the token buffer it indexes.
    #[error("sequence length {length} of row {row} exceeds max length {max_len}")]
    Truncation {
        /// Batch row whose length was out of range.
        row: usize,
        /// The sequence length reported by the server.
        length: usize,
        /// The max length dimension of the output token tensor.
        max_len: usize,
    },

    /// The server answered with an error document instead of outputs.
    #[error("server error: {0}")]
    Server(String),

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The tokenizer collaborator failed to encode or decode.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// The transport collaborator failed to deliver the request.
    #[error("transport error: {0}")]
    Transport(String),
}
