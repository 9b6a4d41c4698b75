use rand::Rng;
use prost::Message;
use crate::prompb::*;
use crate::tests::generators::{add_unknown_fields, create_rng, generate_series, GeneratorOptions};

fn assert_round_trip<M: Message + Default + PartialEq + std::fmt::Debug>(msg: &M) {
    let bytes = msg.encode_to_vec();
    assert_eq!(bytes.len(), msg.encoded_len());
    let decoded = M::decode(bytes.as_slice()).unwrap();
    assert_eq!(&decoded, msg);
    // re-encoding is byte stable
    assert_eq!(decoded.encode_to_vec(), bytes);
}

#[test]
fn write_request_with_special_values() {
    for seed in 0..20 {
        let options = GeneratorOptions {
            start: -60_000,
            interval: 7_000,
            special_values: 0.2,
            shuffle: true,
            unknown_fields: true,
            seed: Some(seed),
            ..Default::default()
        };
        let mut req = WriteRequest::new(generate_series(&options));
        add_unknown_fields(&mut create_rng(Some(seed)), &mut req.unknown_fields);
        assert_round_trip(&req);
    }
}

#[test]
fn empty_collections() {
    assert_round_trip(&WriteRequest::new(vec![TimeSeries::default()]));
    assert_round_trip(&ReadRequest::new(vec![Query::default()]));
    assert_round_trip(&ReadResponse::new(vec![QueryResult::default(), QueryResult::default()]));
    assert_round_trip(&Labels::default());
}

#[test]
fn read_request_and_response() {
    let mut rng = create_rng(Some(7));
    let queries = (0..5)
        .map(|i| {
            let start: i64 = rng.gen_range(-1_000_000..1_000_000);
            let query = Query::new(
                start,
                start + rng.gen_range(0..100_000),
                vec![
                    LabelMatcher::eq("__name__", "up"),
                    LabelMatcher::re("job", "api|web"),
                    LabelMatcher::nre("instance", ".*:9090"),
                    LabelMatcher::neq("env", ""),
                ],
            );
            if i % 2 == 0 {
                query.with_hints(ReadHints {
                    step_ms: rng.gen_range(0..60_000),
                    func: "rate".to_string(),
                    start_ms: start,
                    end_ms: start + 10,
                    grouping: vec!["job".to_string()],
                    by: i % 4 == 0,
                    range_ms: 300_000,
                    ..Default::default()
                })
            } else {
                query
            }
        })
        .collect();
    let req = ReadRequest {
        queries,
        accepted_response_types: vec![ResponseType::StreamedXorChunks as i32, ResponseType::Samples as i32],
        ..Default::default()
    };
    assert_round_trip(&req);

    let results = (0..3)
        .map(|seed| {
            QueryResult::new(generate_series(&GeneratorOptions {
                seed: Some(seed),
                special_values: 0.1,
                ..Default::default()
            }))
        })
        .collect();
    assert_round_trip(&ReadResponse::new(results));
}

#[test]
fn labels_message() {
    let labels = Labels {
        labels: vec![Label::new("__name__", "up"), Label::new("job", ""), Label::new("", "x")],
        ..Default::default()
    };
    assert_round_trip(&labels);
}

#[test]
fn request_from_json_fixture() {
    let req: ReadRequest = serde_json::from_str(
        r#"{
            "queries": [
                {
                    "start_timestamp_ms": 1700000000000,
                    "end_timestamp_ms": 1700000300000,
                    "matchers": [
                        {"type": 0, "name": "__name__", "value": "node_cpu_seconds_total"},
                        {"type": 2, "name": "mode", "value": "idle|user"}
                    ],
                    "hints": {"step_ms": 15000, "func": "rate", "range_ms": 60000}
                }
            ],
            "accepted_response_types": [0]
        }"#,
    )
    .unwrap();
    assert_round_trip(&req);
    let decoded = ReadRequest::decode(req.encode_to_vec().as_slice()).unwrap();
    assert_eq!(decoded.queries[0].matchers[1].matcher_type().unwrap(), MatcherType::Re);
}
