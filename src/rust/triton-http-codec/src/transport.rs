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

//! The network collaborator.
//!
//! This crate never opens a socket. A [`Transport`] receives an encoded
//! [`WireFrame`], performs the HTTP call with whatever client the
//! application uses, and hands back the raw response bytes.

use std::future::Future;

use bytes::Bytes;

use crate::decoder;
use crate::encoder::{WireFrame, HEADER_CONTENT_LENGTH};
use crate::error::Result;

/// A raw response as received from the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// The undecoded response body.
    pub body: Bytes,
    /// The `Inference-Header-Content-Length` value, if the server sent one.
    pub header_length: Option<usize>,
}

impl RawResponse {
    /// Creates a JSON-only response.
    #[must_use]
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            header_length: None,
        }
    }

    /// Sets the reported header length.
    #[must_use]
    pub fn with_header_length(self, header_length: usize) -> Self {
        Self {
            header_length: Some(header_length),
            ..self
        }
    }

    /// Creates a response from a body and its transport headers, reading
    /// the header length from `Inference-Header-Content-Length`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decoding`](crate::error::Error::Decoding) if the
    /// header length is not a decimal integer.
    pub fn from_headers<'a, I>(body: impl Into<Bytes>, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let header_length = headers
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(HEADER_CONTENT_LENGTH))
            .map(|(_, value)| decoder::parse_header_length(value))
            .transpose()?;
        Ok(Self {
            body: body.into(),
            header_length,
        })
    }
}

/// Sends one encoded inference request to a model.
///
/// Implementations should report network and HTTP status failures as
/// [`Error::Transport`](crate::error::Error::Transport), and forward every
/// header in [`WireFrame::headers`] unchanged.
pub trait Transport: Send + Sync {
    /// Posts `frame` to the model's infer endpoint and returns the response.
    fn infer(
        &self,
        model_name: &str,
        frame: WireFrame,
    ) -> impl Future<Output = Result<RawResponse>> + Send;
}
