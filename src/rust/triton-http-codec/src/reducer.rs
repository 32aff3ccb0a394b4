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

//! Reduces generated token tensors to text.
//!
//! Generation backends return a fixed-width buffer of token ids per row and
//! beam plus the number of tokens that are actually valid. Only beam 0 is
//! kept, cut to its valid length, and handed to the tokenizer.

use crate::error::{Error, Result};
use crate::infer::InferenceResponse;
use crate::preprocess::TensorRoles;
use crate::tensor::{DataType, TensorBuffer};
use crate::tokenizer::Tokenizer;

/// Turns `output_ids` and `sequence_length` outputs into one string per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultReducer {
    output_ids: String,
    sequence_length: String,
}

impl ResultReducer {
    /// Creates a reducer reading the two named outputs.
    #[must_use]
    pub fn new(output_ids: impl Into<String>, sequence_length: impl Into<String>) -> Self {
        Self {
            output_ids: output_ids.into(),
            sequence_length: sequence_length.into(),
        }
    }

    /// Creates a reducer for the output names of a role mapping.
    #[must_use]
    pub fn from_roles(roles: &TensorRoles) -> Self {
        Self::new(roles.output_ids.clone(), roles.output_lengths.clone())
    }

    /// Returns the valid token ids of each row's first beam.
    ///
    /// `output_ids` may be `[batch, max_len]` or `[batch, beam, max_len]`;
    /// `sequence_length` may be `[batch]` or `[batch, beam]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingOutput`] if either output is absent,
    /// [`Error::Decoding`] if their shapes are unsupported or disagree on the
    /// batch size, and [`Error::Truncation`] if a length exceeds `max_len`.
    pub fn truncate(&self, response: &InferenceResponse) -> Result<Vec<Vec<u32>>> {
        let ids = response.output(&self.output_ids)?;
        let lengths = response.output(&self.sequence_length)?;

        let (batch, beams, max_len) = match *ids.shape() {
            [batch, max_len] => (batch, 1, max_len),
            [batch, beams, max_len] => (batch, beams, max_len),
            _ => {
                return Err(Error::Decoding(format!(
                    "output '{}' has unsupported shape {:?}",
                    self.output_ids,
                    ids.shape()
                )))
            }
        };
        let stride = match *lengths.shape() {
            [rows] | [rows, 1] if rows == batch => 1,
            // Per-beam lengths must cover every beam of a 3-D token tensor.
            [rows, columns] if rows == batch && (ids.shape().len() == 2 || columns == beams) => {
                columns
            }
            _ => {
                return Err(Error::Decoding(format!(
                    "output '{}' has shape {:?}, which does not fit '{}' of shape {:?}",
                    self.sequence_length,
                    lengths.shape(),
                    self.output_ids,
                    ids.shape()
                )))
            }
        };

        let tokens = as_u32s(ids)?;
        let lengths = as_u32s(lengths)?;
        (0..batch)
            .map(|row| {
                let length = lengths[row * stride] as usize;
                if length > max_len {
                    return Err(Error::Truncation {
                        row,
                        length,
                        max_len,
                    });
                }
                let start = row * beams * max_len;
                Ok(tokens[start..start + length].to_vec())
            })
            .collect()
    }

    /// Truncates every row and decodes it, skipping special tokens.
    ///
    /// # Errors
    ///
    /// Same as [`truncate`](Self::truncate), plus tokenizer failures.
    pub fn reduce<K>(&self, response: &InferenceResponse, tokenizer: &K) -> Result<Vec<String>>
    where
        K: Tokenizer + ?Sized,
    {
        self.truncate(response)?
            .iter()
            .map(|row| tokenizer.decode(row, true))
            .collect()
    }
}

impl Default for ResultReducer {
    fn default() -> Self {
        Self::from_roles(&TensorRoles::default())
    }
}

/// Reads integer token data as `u32`, whatever the integer width on the wire.
fn as_u32s(tensor: &TensorBuffer) -> Result<Vec<u32>> {
    fn narrow<T>(tensor: &TensorBuffer, values: Vec<T>) -> Result<Vec<u32>>
    where
        T: Copy + std::fmt::Display + TryInto<u32>,
    {
        values
            .into_iter()
            .map(|v| {
                v.try_into().map_err(|_| {
                    Error::Decoding(format!(
                        "output '{}' holds {v}, which is not a token id",
                        tensor.name()
                    ))
                })
            })
            .collect()
    }

    match tensor.datatype() {
        DataType::Uint32 => tensor.to_vec::<u32>(),
        DataType::Int32 => narrow(tensor, tensor.to_vec::<i32>()?),
        DataType::Uint64 => narrow(tensor, tensor.to_vec::<u64>()?),
        DataType::Int64 => narrow(tensor, tensor.to_vec::<i64>()?),
        other => Err(Error::UnsupportedDType(format!(
            "output '{}' is {other}, expected integer token ids",
            tensor.name()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
