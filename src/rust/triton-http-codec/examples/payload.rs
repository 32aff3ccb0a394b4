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

//! Payload inspection example.
//!
//! Builds the HTTP request a T5 FasterTransformer model would receive for
//! the given text, prints its transport headers and JSON header, then runs
//! the full text pipeline against an in-process echo server.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --example payload -- "translate English to German" "the house is wonderful"
//! ```

use tracing_subscriber::EnvFilter;

use triton_http_codec::client::{ClientOptions, TextClient};
use triton_http_codec::decoder;
use triton_http_codec::encoder::{self, WireFrame};
use triton_http_codec::error::{Error, Result};
use triton_http_codec::infer::{Compression, RequestOptions};
use triton_http_codec::preprocess;
use triton_http_codec::tensor::TensorBuffer;
use triton_http_codec::tokenizer::Tokenizer;
use triton_http_codec::transport::{RawResponse, Transport};

/// Maps every byte of the text to its own token id; 0 pads, 1 ends a row.
struct ByteTokenizer;

impl Tokenizer for ByteTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let mut ids: Vec<u32> = text.bytes().map(|b| u32::from(b) + 2).collect();
        ids.push(1);
        Ok(ids)
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        let bytes: Vec<u8> = ids
            .iter()
            .filter(|id| !skip_special_tokens || **id > 1)
            .filter_map(|id| u8::try_from(id.saturating_sub(2)).ok())
            .collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn pad_token_id(&self) -> u32 {
        0
    }
}

/// Answers every request with its own input tokens.
struct Echo;

impl Transport for Echo {
    async fn infer(&self, model_name: &str, frame: WireFrame) -> Result<RawResponse> {
        tracing::info!(model_name, bytes = frame.body().len(), "echo server received request");

        let header_length = frame.has_binary_payload().then(|| frame.header_length());
        let inputs = decoder::decode_inputs(frame.body(), header_length)?;
        let find = |name: &str| {
            inputs
                .iter()
                .find(|t| t.name() == name)
                .ok_or_else(|| Error::MissingOutput(name.to_owned()))
        };
        let ids = find("input_ids")?;
        let lengths = find("sequence_length")?;
        let [batch, width] = *ids.shape() else {
            return Err(Error::Decoding(format!(
                "input_ids has shape {:?}, expected [batch, width]",
                ids.shape()
            )));
        };

        let outputs = [
            TensorBuffer::from_slice(
                "output_ids",
                vec![batch, 1, width],
                &ids.to_vec::<u32>()?,
            )?,
            TensorBuffer::from_slice(
                "sequence_length",
                vec![batch, 1],
                &lengths.to_vec::<u32>()?,
            )?,
        ];
        let answer = encoder::encode_response(None, &outputs)?;
        Ok(RawResponse::new(answer.body()).with_header_length(answer.header_length()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let task = args.next().unwrap_or_else(|| "summarize".to_owned());
    let text = args
        .next()
        .unwrap_or_else(|| "the quick brown fox jumps over the lazy dog".to_owned());

    let options = ClientOptions::default().request(
        RequestOptions::default()
            .sequence(7u64, true, true)
            .response_compression(Compression::Gzip),
    );
    let client = TextClient::new(Echo, ByteTokenizer, "fastertransformer").with_options(options);

    // -- Raw payload -----------------------------------------------------------

    let prompt = preprocess::with_task(Some(task.as_str()), &text);
    let frame = client.payload(&[prompt.as_str()], "example-1")?;

    println!("Headers:");
    for (name, value) in frame.headers() {
        println!("  {name}: {value}");
    }
    println!("Header JSON ({} bytes):", frame.header_length());
    println!("  {}", String::from_utf8_lossy(frame.header_json()));
    println!("Binary payload: {} bytes", frame.binary_payload().len());

    // -- Full pipeline -----------------------------------------------------------

    let binary = client.with_options(ClientOptions::default().binary_inputs(true));
    let output = binary.infer(Some(task.as_str()), &text).await?;
    println!("Echoed text: {output}");

    Ok(())
}
