//! Benchmarks for a full call over loopback UDP
//!
//! Covers allocation of the call key, the send path, dispatch on the serving
//! node and reply correlation.

#![allow(missing_docs)]

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use qrp_node::{MessageCodec, Node, Service, ServiceMethods};
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Text {
    #[serde(rename = "Text")]
    text: String,
}

struct Echo;

impl Service for Echo {
    fn procedures<C: MessageCodec>(methods: &mut ServiceMethods<Self, C>) {
        methods.method("Echo", |_: &Echo, args: Text, reply: &mut Text| {
            reply.text = args.text;
        });
    }
}

async fn serving_node() -> Option<Node> {
    let node = Node::bind("127.0.0.1:0", qrp_node::DEFAULT_MAX_DATAGRAM_SIZE)
        .await
        .ok()?;
    tokio::spawn({
        let node = node.clone();
        async move { node.serve().await }
    });
    Some(node)
}

fn bench_echo_call(c: &mut Criterion) {
    let Ok(rt) = Runtime::new() else {
        return;
    };
    let Some((server, client)) = rt.block_on(async {
        let server = serving_node().await?;
        server.register(Echo);
        let client = serving_node().await?;
        Some((server, client))
    }) else {
        return;
    };
    let Ok(server_addr) = server.local_addr() else {
        return;
    };
    let args = Text {
        text: "hi".to_string(),
    };

    c.bench_function("call_roundtrip/echo", |b| {
        b.to_async(&rt).iter(|| async {
            let reply: Result<Text, _> = client
                .call("Echo", server_addr, &args, Some(Duration::from_secs(1)))
                .await;
            reply
        });
    });

    server.shutdown();
    client.shutdown();
}

criterion_group!(benches, bench_echo_call);
criterion_main!(benches);
