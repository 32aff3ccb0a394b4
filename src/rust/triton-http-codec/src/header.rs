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

//! JSON header documents exchanged with the server.
//!
//! Field order in these structs is the key order on the wire, so a given
//! request always serializes to the same bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::infer::{RequestedOutput, SequenceId};

/// One tensor entry of a request `inputs` or response `outputs` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TensorEntry {
    pub name: String,
    pub shape: Vec<usize>,
    pub datatype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<TensorParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct TensorParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_data_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OutputEntry<'a> {
    pub name: &'a str,
    pub parameters: OutputParameters,
}

#[derive(Debug, Serialize)]
pub(crate) struct OutputParameters {
    pub binary_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<u32>,
}

impl<'a> From<&'a RequestedOutput> for OutputEntry<'a> {
    fn from(output: &'a RequestedOutput) -> Self {
        Self {
            name: output.name(),
            parameters: OutputParameters {
                binary_data: output.binary_data(),
                classification: output.class_count(),
            },
        }
    }
}

/// Request-level `parameters` object. Unset fields never become keys.
#[derive(Debug, Default, Serialize)]
pub(crate) struct WireParameters<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<&'a SequenceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_start: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_end: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_data_output: Option<bool>,
}

impl WireParameters<'_> {
    pub fn is_empty(&self) -> bool {
        self.sequence_id.is_none()
            && self.sequence_start.is_none()
            && self.sequence_end.is_none()
            && self.priority.is_none()
            && self.timeout.is_none()
            && self.binary_data_output.is_none()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestHeader<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    pub inputs: Vec<TensorEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<OutputEntry<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<WireParameters<'a>>,
}

/// The part of a request header a loopback server needs to rebuild inputs.
#[derive(Debug, Deserialize)]
pub(crate) struct RequestInputs {
    pub inputs: Vec<TensorEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ResponseHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default)]
    pub outputs: Vec<TensorEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
