//! Benchmarks parsing of `tc -s qdisc show` output. The monitor parses
//! once per interval, so this mostly guards against accidental
//! quadratic scans on large hierarchical qdisc dumps.

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tlab_queue_monitor::QueueSample;

const FQ_CODEL: &str = include_str!("./fq_codel.txt");

fn htb_tree(children: usize) -> String {
  let mut text = String::from(
    "qdisc htb 1: root refcnt 2 r2q 10 default 0x10 direct_packets_stat 0 direct_qlen 1000\n Sent 982341 bytes 712 pkt (dropped 44, overlimits 120 requeues 0)\n backlog 0b 0p requeues 0\n",
  );
  for i in 0..children {
    text.push_str(&format!(
      "qdisc fq_codel {i:x}: parent 1:{i:x} limit 10240p flows 1024 quantum 1514 target 5ms interval 100ms memory_limit 32Mb ecn drop_batch 64\n Sent {} bytes {} pkt (dropped {}, overlimits 0 requeues 0)\n backlog {}b {}p requeues 0\n  maxpacket 1514 drop_overlimit 0 new_flow_count 1 ecn_mark 0\n  new_flows_len 0 old_flows_len 0\n",
      i * 1514,
      i,
      i % 3,
      (i % 5) * 1514,
      i % 5
    ));
  }
  text
}

pub fn criterion_benchmark(c: &mut Criterion) {
  c.bench_function("parse fq_codel", |b| {
    b.iter(|| {
      black_box(QueueSample::parse(black_box(FQ_CODEL)));
    });
  });

  let tree = htb_tree(1000);
  c.bench_function("parse htb with 1000 children", |b| {
    b.iter(|| {
      black_box(QueueSample::parse(black_box(&tree)));
    });
  });

  let no_matches = "qdisc noqueue 0: root refcnt 2\n Sent 0 bytes 0 pkt\n".repeat(500);
  c.bench_function("parse output with no counters", |b| {
    b.iter(|| {
      black_box(QueueSample::parse(black_box(&no_matches)));
    });
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
