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

//! Assembles the input tensors of one generation call.
//!
//! A generation model takes four inputs: padded token ids, the valid length
//! of each row, the maximum number of tokens to generate and a sampling
//! parameter (top-k or beam width). [`TensorRoles`] maps each of those roles
//! to the tensor name a particular model signature expects.
//!
//! # Example
//!
//! ```rust
//! use triton_http_codec::preprocess::{GenerationParams, RequestBuilder, TensorRoles};
//!
//! let params = GenerationParams {
//!     input_ids: vec![vec![37, 9, 1], vec![8, 1, 0]],
//!     input_lengths: vec![3, 2],
//!     max_output_len: 64,
//!     sampling: 1,
//! };
//! let request = RequestBuilder::new(TensorRoles::fastertransformer_t5())
//!     .build_request(&params)
//!     .unwrap();
//!
//! let shapes: Vec<_> = request.inputs().iter().map(|t| t.shape().to_vec()).collect();
//! assert_eq!(shapes, vec![vec![2, 3], vec![2, 1], vec![2, 1], vec![2, 1]]);
//! ```

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::infer::{InferRequestBuilder, InferenceRequest, RequestOptions};
use crate::tensor::TensorBuffer;
use crate::tokenizer::Tokenizer;

// ---------------------------------------------------------------------------
// TensorRoles
// ---------------------------------------------------------------------------

/// Wire names of the tensors a generation model reads and writes.
///
/// Missing keys in a JSON document fall back to the T5 names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TensorRoles {
    /// Padded token ids, `[batch, width]`.
    pub input_ids: String,
    /// Valid length of each row, `[batch, 1]`.
    pub input_lengths: String,
    /// Maximum number of generated tokens, `[batch, 1]`.
    pub max_output_len: String,
    /// Top-k or beam width, `[batch, 1]`.
    pub sampling: String,
    /// Generated token ids.
    pub output_ids: String,
    /// Number of valid generated tokens per row.
    pub output_lengths: String,
}

impl TensorRoles {
    /// Tensor names of the FasterTransformer T5 backend.
    #[must_use]
    pub fn fastertransformer_t5() -> Self {
        Self {
            input_ids: "input_ids".into(),
            input_lengths: "sequence_length".into(),
            max_output_len: "max_output_len".into(),
            sampling: "runtime_top_k".into(),
            output_ids: "output_ids".into(),
            output_lengths: "sequence_length".into(),
        }
    }

    /// Tensor names of the FasterTransformer GPT backend.
    #[must_use]
    pub fn fastertransformer_gpt() -> Self {
        Self {
            input_ids: "input_ids".into(),
            input_lengths: "input_lengths".into(),
            max_output_len: "request_output_len".into(),
            sampling: "beam_width".into(),
            output_ids: "output_ids".into(),
            output_lengths: "sequence_length".into(),
        }
    }

    /// Loads a role mapping from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document is not a valid mapping.
    pub fn from_json(document: &str) -> Result<Self> {
        serde_json::from_str(document).map_err(|e| Error::Config(format!("tensor roles: {e}")))
    }
}

impl Default for TensorRoles {
    fn default() -> Self {
        Self::fastertransformer_t5()
    }
}

// ---------------------------------------------------------------------------
// GenerationParams
// ---------------------------------------------------------------------------

/// Task-level parameters of one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationParams {
    /// Token ids, one row per batch entry, all padded to the same width.
    pub input_ids: Vec<Vec<u32>>,
    /// Number of valid (unpadded) tokens in each row.
    pub input_lengths: Vec<u32>,
    /// Maximum number of tokens to generate, shared by every row.
    pub max_output_len: u32,
    /// Top-k for T5, beam width for GPT.
    pub sampling: u32,
}

impl GenerationParams {
    /// Returns the batch size.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.input_ids.len()
    }

    fn validate(&self) -> Result<usize> {
        let Some(first) = self.input_ids.first() else {
            return Err(Error::Preprocessing("empty batch".into()));
        };
        let width = first.len();
        if width == 0 {
            return Err(Error::Preprocessing("input rows are empty".into()));
        }
        if self.input_lengths.len() != self.input_ids.len() {
            return Err(Error::Preprocessing(format!(
                "{} input lengths for {} rows",
                self.input_lengths.len(),
                self.input_ids.len()
            )));
        }
        for (row, (ids, length)) in self.input_ids.iter().zip(&self.input_lengths).enumerate() {
            if ids.len() != width {
                return Err(Error::Preprocessing(format!(
                    "row {row} has {} tokens but row 0 has {width}",
                    ids.len()
                )));
            }
            if *length as usize > width {
                return Err(Error::Preprocessing(format!(
                    "row {row} length {length} exceeds padded width {width}"
                )));
            }
        }
        Ok(width)
    }
}

// ---------------------------------------------------------------------------
// RequestBuilder
// ---------------------------------------------------------------------------

/// Turns [`GenerationParams`] into the model's input tensors.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    roles: TensorRoles,
    options: RequestOptions,
    binary_inputs: bool,
}

impl RequestBuilder {
    /// Creates a builder for the given role mapping. Inputs travel as binary
    /// data unless [`with_binary_inputs`](Self::with_binary_inputs) says
    /// otherwise.
    #[must_use]
    pub fn new(roles: TensorRoles) -> Self {
        Self {
            roles,
            options: RequestOptions::default(),
            binary_inputs: true,
        }
    }

    /// Sets the request options applied to every built request.
    #[must_use]
    pub fn with_options(self, options: RequestOptions) -> Self {
        Self { options, ..self }
    }

    /// Chooses between binary payload and inline JSON inputs.
    #[must_use]
    pub fn with_binary_inputs(self, binary_inputs: bool) -> Self {
        Self {
            binary_inputs,
            ..self
        }
    }

    /// Returns the role mapping.
    #[must_use]
    pub fn roles(&self) -> &TensorRoles {
        &self.roles
    }

    /// Builds the input tensors in role order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Preprocessing`] if the batch is empty, ragged, or its
    /// lengths disagree with the rows.
    pub fn input_tensors(&self, params: &GenerationParams) -> Result<Vec<TensorBuffer>> {
        let width = params.validate()?;
        let batch = params.batch_size();
        let ids: Vec<u32> = params.input_ids.iter().flatten().copied().collect();
        let broadcast = |value: u32| vec![value; batch];

        let tensors = vec![
            TensorBuffer::from_slice(&self.roles.input_ids, vec![batch, width], &ids)?,
            TensorBuffer::from_slice(&self.roles.input_lengths, vec![batch, 1], &params.input_lengths)?,
            TensorBuffer::from_slice(
                &self.roles.max_output_len,
                vec![batch, 1],
                &broadcast(params.max_output_len),
            )?,
            TensorBuffer::from_slice(&self.roles.sampling, vec![batch, 1], &broadcast(params.sampling))?,
        ];
        Ok(tensors
            .into_iter()
            .map(|t| t.with_binary_data(self.binary_inputs))
            .collect())
    }

    /// Builds a complete request with this builder's options.
    ///
    /// # Errors
    ///
    /// Same as [`input_tensors`](Self::input_tensors).
    pub fn build_request(&self, params: &GenerationParams) -> Result<InferenceRequest> {
        let inputs = self.input_tensors(params)?;
        Ok(InferRequestBuilder::new()
            .options(self.options.clone())
            .inputs(inputs)
            .build())
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(TensorRoles::default())
    }
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Tokenizes a batch of texts, padding every row to the longest one.
///
/// # Errors
///
/// Returns [`Error::Preprocessing`] for an empty batch and propagates
/// tokenizer failures.
pub fn tokenize_batch<K, S>(
    tokenizer: &K,
    texts: &[S],
    max_output_len: u32,
    sampling: u32,
) -> Result<GenerationParams>
where
    K: Tokenizer + ?Sized,
    S: AsRef<str>,
{
    if texts.is_empty() {
        return Err(Error::Preprocessing("empty batch".into()));
    }
    let mut rows = texts
        .iter()
        .map(|text| tokenizer.encode(text.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut input_lengths = Vec::with_capacity(rows.len());
    for row in &mut rows {
        let length = u32::try_from(row.len()).map_err(|_| {
            Error::Preprocessing(format!("{} tokens do not fit a UINT32 length", row.len()))
        })?;
        input_lengths.push(length);
        row.resize(width, tokenizer.pad_token_id());
    }

    Ok(GenerationParams {
        input_ids: rows,
        input_lengths,
        max_output_len,
        sampling,
    })
}

/// Prefixes `text` with a task name, as in `"summarize: ..."`.
#[must_use]
pub fn with_task(task: Option<&str>, text: &str) -> String {
    match task {
        Some(task) => format!("{task}: {text}"),
        None => text.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::DataType;

    struct CharTokenizer;

    impl Tokenizer for CharTokenizer {
        fn encode(&self, text: &str) -> Result<Vec<u32>> {
            Ok(text.chars().map(u32::from).collect())
        }

        fn decode(&self, ids: &[u32], _skip_special_tokens: bool) -> Result<String> {
            Ok(ids.iter().filter_map(|id| char::from_u32(*id)).collect())
        }

        fn pad_token_id(&self) -> u32 {
            0
        }
    }

    fn params() -> GenerationParams {
        GenerationParams {
            input_ids: vec![vec![1, 2, 3], vec![4, 5, 0]],
            input_lengths: vec![3, 2],
            max_output_len: 128,
            sampling: 1,
        }
    }

    #[test]
    fn t5_layout() {
        let tensors = RequestBuilder::default()
            .with_binary_inputs(false)
            .input_tensors(&params())
            .unwrap();
        let names: Vec<_> = tensors.iter().map(TensorBuffer::name).collect();
        assert_eq!(
            names,
            vec!["input_ids", "sequence_length", "max_output_len", "runtime_top_k"]
        );
        assert!(tensors.iter().all(|t| t.datatype() == DataType::Uint32));
        assert!(tensors.iter().all(|t| t.batch_size() == 2));
        assert!(tensors.iter().all(|t| !t.is_binary()));
        assert_eq!(tensors[0].to_vec::<u32>().unwrap(), vec![1, 2, 3, 4, 5, 0]);
        assert_eq!(tensors[1].to_vec::<u32>().unwrap(), vec![3, 2]);
        assert_eq!(tensors[2].to_vec::<u32>().unwrap(), vec![128, 128]);
        assert_eq!(tensors[3].shape(), &[2, 1]);
    }

    #[test]
    fn gpt_layout_is_binary() {
        let request = RequestBuilder::new(TensorRoles::fastertransformer_gpt())
            .with_options(RequestOptions::default().request_id("gpt"))
            .build_request(&params())
            .unwrap();
        let names: Vec<_> = request.inputs().iter().map(TensorBuffer::name).collect();
        assert_eq!(
            names,
            vec!["input_ids", "input_lengths", "request_output_len", "beam_width"]
        );
        assert!(request.inputs().iter().all(TensorBuffer::is_binary));
        assert_eq!(request.id(), Some("gpt"));
    }

    #[test]
    fn invalid_batches() {
        let builder = RequestBuilder::default();
        let cases = [
            GenerationParams { input_ids: vec![], input_lengths: vec![], ..params() },
            GenerationParams { input_lengths: vec![3], ..params() },
            GenerationParams { input_ids: vec![vec![1, 2, 3], vec![4]], ..params() },
            GenerationParams { input_lengths: vec![3, 4], ..params() },
            GenerationParams { input_ids: vec![vec![]], input_lengths: vec![0], ..params() },
        ];
        for case in cases {
            assert!(matches!(builder.input_tensors(&case), Err(Error::Preprocessing(_))));
        }
    }

    #[test]
    fn roles_from_json() {
        let roles = TensorRoles::from_json(r#"{"sampling": "beam_width"}"#).unwrap();
        assert_eq!(roles.sampling, "beam_width");
        assert_eq!(roles.input_ids, "input_ids");
        assert_eq!(roles.output_lengths, "sequence_length");

        assert!(matches!(TensorRoles::from_json(r#"{"sampling": 3}"#), Err(Error::Config(_))));
    }

    #[test]
    fn tokenize_pads_to_longest() {
        let params = tokenize_batch(&CharTokenizer, &["abc", "d"], 16, 2).unwrap();
        assert_eq!(params.input_ids, vec![vec![97, 98, 99], vec![100, 0, 0]]);
        assert_eq!(params.input_lengths, vec![3, 1]);
        assert_eq!(params.max_output_len, 16);
        assert_eq!(params.sampling, 2);

        let empty: [&str; 0] = [];
        assert!(matches!(
            tokenize_batch(&CharTokenizer, &empty, 16, 1),
            Err(Error::Preprocessing(_))
        ));
    }

    #[test]
    fn task_prefix() {
        assert_eq!(
            with_task(Some("translate English to German"), "hi"),
            "translate English to German: hi"
        );
        assert_eq!(with_task(None, "hi"), "hi");
    }
}
