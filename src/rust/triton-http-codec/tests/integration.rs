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

//! Integration tests for the wire codec.
//!
//! Everything runs offline: a loopback transport plays the server by
//! decoding request frames and answering with encoded response frames.

use std::sync::Arc;

use triton_http_codec::client::{ClientOptions, TextClient};
use triton_http_codec::decoder::{self, decode_inputs, parse_header_length};
use triton_http_codec::encoder::{self, WireFrame, ACCEPT_ENCODING, HEADER_CONTENT_LENGTH};
use triton_http_codec::error::{Error, Result};
use triton_http_codec::infer::{Compression, InferRequestBuilder, RequestOptions};
use triton_http_codec::preprocess::TensorRoles;
use triton_http_codec::tensor::{DataType, TensorBuffer};
use triton_http_codec::tokenizer::Tokenizer;
use triton_http_codec::transport::{RawResponse, Transport};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

const VOCAB: &[&str] = &[
    "<pad>", "</s>", "<unk>", "summarize:", "translate:", "the", "cat", "sat", "on", "mat",
];
const PAD: u32 = 0;
const EOS: u32 = 1;
const UNK: u32 = 2;

/// Whitespace tokenizer over a fixed vocabulary; every row ends with `</s>`.
struct Vocab;

impl Tokenizer for Vocab {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let mut ids: Vec<u32> = text
            .split_whitespace()
            .map(|word| {
                VOCAB
                    .iter()
                    .position(|v| *v == word)
                    .map_or(UNK, |i| i as u32)
            })
            .collect();
        ids.push(EOS);
        Ok(ids)
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        let words = ids
            .iter()
            .filter(|id| !(skip_special_tokens && (**id == PAD || **id == EOS)))
            .map(|id| {
                VOCAB
                    .get(*id as usize)
                    .copied()
                    .ok_or_else(|| Error::Tokenizer(format!("unknown id {id}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(words.join(" "))
    }

    fn pad_token_id(&self) -> u32 {
        PAD
    }
}

/// Echo model: returns each row's valid input tokens, padded to a fixed
/// output width, with the T5 output names.
struct Loopback;

impl Loopback {
    fn respond(&self, frame: &WireFrame) -> Result<RawResponse> {
        let header_length = frame
            .header(HEADER_CONTENT_LENGTH)
            .map(parse_header_length)
            .transpose()?;
        let inputs = decode_inputs(frame.body(), header_length)?;
        let find = |name: &str| {
            inputs
                .iter()
                .find(|t| t.name() == name)
                .ok_or_else(|| Error::MissingOutput(name.to_owned()))
        };

        let ids = find("input_ids")?;
        let (batch, width) = (ids.shape()[0], ids.shape()[1]);
        let tokens = ids.to_vec::<u32>()?;
        let lengths = find("sequence_length")?.to_vec::<u32>()?;

        let max_len = width + 2;
        let mut output = vec![PAD; batch * max_len];
        for row in 0..batch {
            let valid = lengths[row] as usize;
            output[row * max_len..row * max_len + valid]
                .copy_from_slice(&tokens[row * width..row * width + valid]);
        }

        let outputs = [
            TensorBuffer::from_slice("output_ids", vec![batch, 1, max_len], &output)?,
            TensorBuffer::from_slice("sequence_length", vec![batch, 1], &lengths)?,
        ];
        let answer = encoder::encode_response(Some("loopback"), &outputs)?;
        Ok(RawResponse::new(answer.body()).with_header_length(answer.header_length()))
    }
}

impl Transport for Loopback {
    async fn infer(&self, _model_name: &str, frame: WireFrame) -> Result<RawResponse> {
        self.respond(&frame)
    }
}

/// A server that always answers with a fixed JSON document.
struct Canned(&'static str);

impl Transport for Canned {
    async fn infer(&self, _model_name: &str, _frame: WireFrame) -> Result<RawResponse> {
        Ok(RawResponse::new(self.0.as_bytes().to_vec()))
    }
}

fn u32_tensor(name: &str, shape: Vec<usize>, values: &[u32]) -> TensorBuffer {
    TensorBuffer::from_slice(name, shape, values).unwrap()
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

#[test]
fn header_length_is_exact() {
    let a = u32_tensor("a", vec![1, 3], &[1, 2, 3]);
    let b = TensorBuffer::from_slice("b", vec![2], &[0.25f64, -1.0]).unwrap();
    let inline = u32_tensor("c", vec![1], &[7]).with_binary_data(false);
    let request = InferRequestBuilder::new()
        .inputs(vec![a.clone(), inline, b.clone()])
        .build();

    let frame = encoder::encode(&request).unwrap();
    let body = frame.body();
    let n: usize = frame.header(HEADER_CONTENT_LENGTH).unwrap().parse().unwrap();

    assert_eq!(n, frame.header_length());
    assert_eq!(n, frame.header_json().len());
    assert!(serde_json::from_slice::<serde_json::Value>(&body[..n]).is_ok());
    assert_eq!(&body[n..], [a.data().as_ref(), b.data().as_ref()].concat().as_slice());
}

#[test]
fn encoding_is_byte_identical() {
    let build = || {
        InferRequestBuilder::new()
            .options(
                RequestOptions::default()
                    .request_id("r")
                    .sequence(5u64, true, true)
                    .timeout_us(10),
            )
            .input(u32_tensor("input_ids", vec![1, 2], &[4, 5]))
            .output("output_ids")
            .build()
    };
    let first = encoder::encode(&build()).unwrap();
    let second = encoder::encode(&build()).unwrap();
    assert_eq!(first.body(), second.body());
    assert_eq!(first.headers(), second.headers());
}

#[test]
fn response_round_trip() {
    let outputs = vec![
        u32_tensor("output_ids", vec![2, 1, 3], &[1, 2, 3, 4, 5, 6]),
        TensorBuffer::from_slice("scores", vec![2], &[0.5f32, 1.5]).unwrap(),
        TensorBuffer::from_strings("labels", vec![2], &["yes", "no"])
            .unwrap()
            .with_binary_data(false),
        TensorBuffer::from_slice("mask", vec![1, 2], &[true, false]).unwrap(),
    ];
    let frame = encoder::encode_response(Some("rt"), &outputs).unwrap();
    let response = decoder::decode(frame.body(), Some(frame.header_length())).unwrap();

    assert_eq!(response.id(), Some("rt"));
    assert_eq!(response.outputs(), outputs.as_slice());
}

#[test]
fn offsets_replay_declaration_order() {
    let a = TensorBuffer::new("A", vec![1], DataType::Int32, vec![1u8, 0, 0, 0]).unwrap();
    let b = TensorBuffer::new("B", vec![1], DataType::Fp64, vec![2u8; 8]).unwrap();
    let frame = encoder::encode_response(None, &[a, b]).unwrap();
    let payload = frame.binary_payload().clone();

    let response = decoder::decode(frame.body(), Some(frame.header_length())).unwrap();
    assert_eq!(response.output("A").unwrap().data(), &payload.slice(0..4));
    assert_eq!(response.output("B").unwrap().data(), &payload.slice(4..12));
}

#[test]
fn compression_annotation() {
    let input = u32_tensor("x", vec![1], &[1]);
    let plain = InferRequestBuilder::new().input(input.clone()).build();
    assert_eq!(encoder::encode(&plain).unwrap().header(ACCEPT_ENCODING), None);

    for (compression, value) in [(Compression::Gzip, "gzip"), (Compression::Deflate, "deflate")] {
        let request = InferRequestBuilder::new()
            .input(input.clone())
            .response_compression(compression)
            .build();
        let frame = encoder::encode(&request).unwrap();
        assert_eq!(frame.header(ACCEPT_ENCODING), Some(value));
        assert!(!String::from_utf8_lossy(frame.header_json()).contains(value));
    }
}

#[test]
fn shape_mismatch_on_construction() {
    let err = TensorBuffer::from_slice("x", vec![2, 3], &[1u32, 2, 3, 4, 5]).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch(_)));
    assert!(err.to_string().contains("shape mismatch"));
}

#[test]
fn data_type_table() {
    let all_types = [
        DataType::Bool,
        DataType::Uint8,
        DataType::Uint16,
        DataType::Uint32,
        DataType::Uint64,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Fp32,
        DataType::Fp64,
        DataType::Bytes,
    ];
    for dt in all_types {
        assert_eq!(DataType::parse(dt.as_str()), Some(dt));
    }
    assert!(matches!("FP16".parse::<DataType>(), Err(Error::UnsupportedDType(_))));
}

#[test]
fn error_display_messages() {
    let err = Error::Truncation {
        row: 1,
        length: 9,
        max_len: 4,
    };
    assert_eq!(err.to_string(), "sequence length 9 of row 1 exceeds max length 4");

    let err = Error::MissingOutput("probs".into());
    assert!(err.to_string().contains("probs"));

    let err = Error::Transport("refused".into());
    assert!(err.to_string().contains("refused"));
}

// ---------------------------------------------------------------------------
// Client pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn end_to_end_single_text() {
    let client = TextClient::new(Loopback, Vocab, "fastertransformer");
    let text = client.infer(Some("summarize"), "the cat sat").await.unwrap();
    assert_eq!(text, "summarize: the cat sat");

    let unknown = client.infer(None, "the dog sat").await.unwrap();
    assert_eq!(unknown, "the <unk> sat");
}

#[tokio::test]
async fn end_to_end_batch_with_binary_inputs() {
    let options = ClientOptions::default()
        .binary_inputs(true)
        .request_outputs(true)
        .request(RequestOptions::default().response_compression(Compression::Gzip));
    let client =
        TextClient::new(Loopback, Vocab, "fastertransformer").with_options(options);

    let texts = ["the cat sat on the mat", "the cat", "mat"];
    let rows = client.infer_batch(&texts).await.unwrap();
    assert_eq!(rows, texts);
}

#[tokio::test]
async fn missing_requested_output() {
    let canned = Canned(r#"{"outputs":[{"name":"logits","shape":[1],"datatype":"FP32","data":[0.0]}]}"#);
    let request = InferRequestBuilder::new()
        .input(u32_tensor("x", vec![1], &[1]))
        .output("probs")
        .build();
    let frame = encoder::encode(&request).unwrap();
    let raw = canned.infer("classifier", frame).await.unwrap();

    match decoder::decode_for(&request, raw.body, raw.header_length) {
        Err(Error::MissingOutput(name)) => assert_eq!(name, "probs"),
        other => panic!("expected MissingOutput, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_surfaces() {
    let client = TextClient::new(Canned(r#"{"error":"unknown model"}"#), Vocab, "nope");
    match client.infer(None, "the cat").await {
        Err(Error::Server(message)) => assert_eq!(message, "unknown model"),
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn gpt_inputs_rejected_by_t5_server() {
    // The loopback only understands T5 input names.
    let client = TextClient::new(Loopback, Vocab, "gptj")
        .with_roles(TensorRoles::fastertransformer_gpt());
    assert!(matches!(
        client.infer(None, "the cat").await,
        Err(Error::MissingOutput(name)) if name == "sequence_length"
    ));
}

#[tokio::test]
async fn concurrent_requests() {
    let client = Arc::new(TextClient::new(Loopback, Vocab, "fastertransformer"));
    let texts = ["the cat", "the mat", "cat sat on mat", "on the cat", "sat"];

    let handles: Vec<_> = texts
        .iter()
        .map(|text| {
            let client = Arc::clone(&client);
            let text = (*text).to_owned();
            tokio::spawn(async move { client.infer(None, &text).await })
        })
        .collect();

    for (handle, text) in handles.into_iter().zip(texts) {
        assert_eq!(handle.await.unwrap().unwrap(), text);
    }
}

#[tokio::test]
async fn concurrent_codec_tasks() {
    let handles: Vec<_> = (0..8u32)
        .map(|i| {
            tokio::spawn(async move {
                let outputs = [u32_tensor("output_ids", vec![1, 1, 2], &[i, i + 1])];
                let frame = encoder::encode_response(None, &outputs).unwrap();
                let response = decoder::decode(frame.body(), Some(frame.header_length())).unwrap();
                response.output("output_ids").unwrap().to_vec::<u32>().unwrap()
            })
        })
        .collect();

    for (i, handle) in (0..8u32).zip(handles) {
        assert_eq!(handle.await.unwrap(), vec![i, i + 1]);
    }
}
