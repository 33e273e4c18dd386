//! Trimmed `iperf3 -J` captures. Intervals and most of `start` are cut.

pub(crate) const IPERF_SINGLE_STREAM_JSON: &str = r#"{
  "start": {
    "connected": [{"socket": 5, "local_host": "10.0.0.1", "local_port": 40312, "remote_host": "10.0.0.2", "remote_port": 5001}],
    "version": "iperf 3.12",
    "test_start": {"protocol": "TCP", "num_streams": 1, "blksize": 131072, "duration": 10, "reverse": 0}
  },
  "intervals": [],
  "end": {
    "streams": [{
      "sender": {
        "socket": 5, "start": 0, "end": 10.0003, "seconds": 10.0003,
        "bytes": 117702656, "bits_per_second": 94159283.5, "retransmits": 12,
        "max_snd_cwnd": 312480, "max_rtt": 3100, "min_rtt": 512, "mean_rtt": 1204, "sender": true
      },
      "receiver": {
        "socket": 5, "start": 0, "end": 10.0421, "seconds": 10.0003,
        "bytes": 117440512, "bits_per_second": 93556601.2, "sender": true
      }
    }],
    "sum_sent": {
      "start": 0, "end": 10.0003, "seconds": 10.0003,
      "bytes": 117702656, "bits_per_second": 94159283.5, "retransmits": 12, "sender": true
    },
    "sum_received": {
      "start": 0, "end": 10.0421, "seconds": 10.0421,
      "bytes": 117440512, "bits_per_second": 93556601.2, "sender": true
    },
    "cpu_utilization_percent": {"host_total": 1.2, "remote_total": 3.4},
    "sender_tcp_congestion": "cubic",
    "receiver_tcp_congestion": "cubic"
  }
}"#;

pub(crate) const IPERF_TWO_STREAMS_JSON: &str = r#"{
  "end": {
    "streams": [
      {"sender": {"bytes": 1000, "seconds": 5.0, "bits_per_second": 1600.0, "max_rtt": 4000, "min_rtt": 900, "mean_rtt": 2100}},
      {"sender": {"bytes": 1000, "seconds": 5.0, "bits_per_second": 1600.0, "max_rtt": 8000, "min_rtt": 1000, "mean_rtt": 3000}},
      {"udp": {}}
    ],
    "sum_sent": {"seconds": 5.0, "bytes": 2000, "bits_per_second": 3200.0}
  }
}"#;

pub(crate) const IPERF_ERROR_JSON: &str = r#"{
  "start": {"connected": [], "version": "iperf 3.12"},
  "intervals": [],
  "end": {},
  "error": "error - unable to connect to server: Connection refused"
}"#;
