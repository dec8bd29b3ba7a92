//! Benchmarks for the wire path
//!
//! Performance-critical paths:
//! - `encode_envelope`: every outbound request and reply
//! - `decode_envelope`: every received datagram, before dispatch

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qrp_node::wire::{decode_envelope, encode_envelope};
use qrp_node::{Envelope, JsonCodec, MessageCodec, Request, Response};
use serde::Serialize;

#[derive(Serialize)]
struct Text {
    #[serde(rename = "Text")]
    text: String,
}

fn request(payload_len: usize) -> Envelope {
    let argument = JsonCodec
        .encode(&Text {
            text: "x".repeat(payload_len),
        })
        .unwrap_or_default();
    Envelope::Request(Request {
        message_id: 0x5eed_0001,
        procedure: "Echo".to_string(),
        argument: argument.into(),
    })
}

fn response(payload_len: usize) -> Envelope {
    let payload = JsonCodec
        .encode(&Text {
            text: "x".repeat(payload_len),
        })
        .unwrap_or_default();
    Envelope::Response(Response {
        message_id: 0x5eed_0001,
        payload: payload.into(),
    })
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_codec/encode");

    for size in [0, 64, 256] {
        let envelope = request(size);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{size}_byte_request")),
            &envelope,
            |b, envelope| b.iter(|| encode_envelope(&JsonCodec, black_box(envelope))),
        );
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_codec/decode");

    for size in [0, 64, 256] {
        let Ok(request) = encode_envelope(&JsonCodec, &request(size)) else {
            continue;
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{size}_byte_request")),
            &request,
            |b, datagram| b.iter(|| decode_envelope(&JsonCodec, black_box(datagram))),
        );

        let Ok(reply) = encode_envelope(&JsonCodec, &response(size)) else {
            continue;
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{size}_byte_reply")),
            &reply,
            |b, datagram| b.iter(|| decode_envelope(&JsonCodec, black_box(datagram))),
        );
    }

    group.bench_function("garbage", |b| {
        b.iter(|| decode_envelope(&JsonCodec, black_box(b"\x00\x01not an envelope")));
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
