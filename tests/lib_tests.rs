use quakeq::pipeline::{ResultAggregator, check_for_total_failure, merge_page, parse_page_body};
use quakeq::query::{
    PagePlan, SessionMeta, build_page_request, clean_query, page_span, pages_for,
};
use quakeq::transport::{cookie_header, parse_cookie_string};
use quakeq::{
    AggregateResult, EngineConfig, FailureKind, Metadata, PageError, PageResult, PageSpan, Query,
    QueryError,
};
use serde_json::json;
use std::sync::Arc;

// --- clean_query ---

#[test]
fn test_clean_service_data_domain() {
    assert_eq!(
        clean_query("服务数据 | domain: example.com"),
        "domain:\"example.com\""
    );
}

#[test]
fn test_clean_service_data_with_stray_paren() {
    assert_eq!(
        clean_query("服务数据 | domain: example.com)"),
        "domain:\"example.com\""
    );
}

#[test]
fn test_clean_app_field() {
    assert_eq!(clean_query("app: nginx"), "app:\"nginx\"");
}

#[test]
fn test_clean_requotes_already_quoted_value() {
    assert_eq!(
        clean_query("domain: \"example.com\""),
        "domain:\"example.com\""
    );
}

#[test]
fn test_clean_strips_enclosing_quotes_and_whitespace() {
    assert_eq!(clean_query("  \"port: 443\"  "), "port: 443");
}

#[test]
fn test_clean_drops_unbalanced_trailing_parens() {
    assert_eq!(clean_query("(port: 443))"), "(port: 443)");
    assert_eq!(clean_query("ip: 1.1.1.1)"), "ip: 1.1.1.1");
}

#[test]
fn test_clean_keeps_balanced_parens() {
    assert_eq!(
        clean_query("(port: 80 OR port: 443)"),
        "(port: 80 OR port: 443)"
    );
}

#[test]
fn test_clean_leaves_other_fields_alone() {
    assert_eq!(clean_query("title: admin"), "title: admin");
}

#[test]
fn test_clean_is_idempotent() {
    let inputs = [
        "服务数据 | domain: example.com",
        "\"\"domain: a.com\"\"",
        "app: \"x\"))",
        "  服务数据 |   app:  \"nginx\"  ",
        "(ip: 10.0.0.1))",
        "\"",
        "",
    ];
    for raw in inputs {
        let once = clean_query(raw);
        assert_eq!(clean_query(&once), once, "input: {raw:?}");
    }
}

#[test]
fn test_query_new_rejects_empty() {
    assert!(matches!(Query::new("   "), Err(QueryError::InvalidInput(_))));
    assert!(matches!(Query::new("\"\""), Err(QueryError::InvalidInput(_))));
}

#[test]
fn test_query_keeps_raw_and_cleaned() {
    let q = Query::new("app: nginx").unwrap();
    assert_eq!(q.raw(), "app: nginx");
    assert_eq!(q.cleaned(), "app:\"nginx\"");
}

// --- page plan ---

#[test]
fn test_pages_for() {
    assert_eq!(pages_for(1), 1);
    assert_eq!(pages_for(100), 1);
    assert_eq!(pages_for(101), 2);
    assert_eq!(pages_for(250), 3);
    assert_eq!(pages_for(1000), 10);
}

#[test]
fn test_page_span_last_page_is_short() {
    assert_eq!(
        page_span(2, 250),
        Some(PageSpan {
            index: 2,
            start: 200,
            size: 50
        })
    );
    assert_eq!(page_span(3, 250), None);
}

#[test]
fn test_plan_spans_cover_total_exactly() {
    let plan = PagePlan::new(250).unwrap();
    let spans: Vec<(usize, usize)> = plan.spans().map(|s| (s.start, s.size)).collect();
    assert_eq!(spans, vec![(0, 100), (100, 100), (200, 50)]);
    assert_eq!(plan.pages_total(), 3);
    assert_eq!(plan.total_size(), 250);
}

#[test]
fn test_plan_rejects_zero() {
    assert!(matches!(PagePlan::new(0), Err(QueryError::InvalidInput(_))));
}

// --- page request ---

fn session() -> SessionMeta {
    SessionMeta::at(&EngineConfig::default(), "2024/01/02 03:04:05")
}

#[test]
fn test_build_page_request_fields() {
    let req = build_page_request("domain:\"a.com\"", 50, 200, &session()).unwrap();
    assert_eq!(req.size, 50);
    assert_eq!(req.start, 200);
    assert!(req.latest);
    assert!(!req.ignore_cache);
    assert_eq!(req.shortcuts, vec!["63734bfa9c27d4249ca7261c".to_string()]);

    let value = serde_json::to_value(&req).unwrap();
    assert_eq!(value["query"], "domain:\"a.com\"");
    assert_eq!(value["device"]["os"], "Windows");
    assert_eq!(value["device"]["date"], "2024/01/02 03:04:05");
    assert!(value["device"]["user_agent"].as_str().unwrap().starts_with("Mozilla"));
}

#[test]
fn test_build_page_request_clamps_size() {
    assert_eq!(build_page_request("q", 500, 0, &session()).unwrap().size, 100);
    assert_eq!(build_page_request("q", 0, 0, &session()).unwrap().size, 1);
}

#[test]
fn test_build_page_request_rejects_negative_bounds() {
    assert!(matches!(
        build_page_request("q", -1, 0, &session()),
        Err(QueryError::InvalidInput(_))
    ));
    assert!(matches!(
        build_page_request("q", 10, -100, &session()),
        Err(QueryError::InvalidInput(_))
    ));
}

#[test]
fn test_build_page_request_is_deterministic() {
    let s = session();
    assert_eq!(
        build_page_request("q", 10, 0, &s).unwrap(),
        build_page_request("q", 10, 0, &s).unwrap()
    );
}

#[test]
fn test_user_agent_follows_headers() {
    let mut config = EngineConfig::default();
    config.headers.remove("User-Agent");
    config
        .headers
        .insert("user-agent".to_string(), "agent/1.0".to_string());
    let s = SessionMeta::at(&config, "now");
    assert_eq!(s.device.user_agent, "agent/1.0");
}

// --- cookies ---

#[test]
fn test_parse_cookie_string() {
    let cookies = parse_cookie_string("a=1; b = two ;\r\nc=x=y; junk; =empty; d=").unwrap();
    assert_eq!(cookies.len(), 3);
    assert_eq!(cookies["a"], "1");
    assert_eq!(cookies["b"], "two");
    assert_eq!(cookies["c"], "x=y");
}

#[test]
fn test_parse_cookie_string_rejects_garbage() {
    assert!(parse_cookie_string("no pairs here").is_err());
    assert!(parse_cookie_string("").is_err());
}

#[test]
fn test_cookie_header() {
    let cookies = parse_cookie_string("b=2; a=1").unwrap();
    assert_eq!(cookie_header(&cookies).as_deref(), Some("a=1; b=2"));
    assert_eq!(cookie_header(&Default::default()), None);
}

// --- parse_page_body ---

#[test]
fn test_parse_page_body_ok() {
    let body = json!({"code": 0, "data": [{"ip": "1.1.1.1"}], "meta": {"total": 9}}).to_string();
    let (items, meta) = parse_page_body(&body).unwrap();
    assert_eq!(items, vec![json!({"ip": "1.1.1.1"})]);
    assert_eq!(meta["total"], 9);
}

#[test]
fn test_parse_page_body_without_meta() {
    let (items, meta) = parse_page_body(r#"{"data": []}"#).unwrap();
    assert!(items.is_empty());
    assert!(meta.is_empty());
}

#[test]
fn test_parse_page_body_malformed() {
    for body in ["not json", "[1,2]", r#"{"message": "login required"}"#, r#"{"data": {}}"#] {
        assert!(
            matches!(parse_page_body(body), Err(FailureKind::MalformedBody(_))),
            "body: {body}"
        );
    }
    let Err(FailureKind::MalformedBody(msg)) = parse_page_body(r#"{"message": "login required"}"#)
    else {
        panic!("expected malformed body");
    };
    assert!(msg.contains("login required"));
}

// --- merge_page / aggregator ---

fn page(index: usize, n: usize, meta: serde_json::Value) -> PageResult {
    let metadata: Metadata = meta.as_object().cloned().unwrap_or_default();
    PageResult {
        page_index: index,
        requested: n,
        items: (0..n).map(|i| json!({"p": index, "i": i})).collect(),
        metadata,
        error: None,
    }
}

fn failed_page(index: usize) -> PageResult {
    PageResult {
        page_index: index,
        requested: 100,
        error: Some(PageError {
            page_index: index,
            kind: FailureKind::Status { code: 500 },
        }),
        ..Default::default()
    }
}

#[test]
fn test_merge_page_appends_and_overwrites_meta() {
    let mut agg = AggregateResult::default();
    merge_page(&mut agg, page(1, 2, json!({"k": 1, "a": true})), 10);
    merge_page(&mut agg, page(0, 2, json!({"k": 2})), 10);
    assert_eq!(agg.items.len(), 4);
    assert_eq!(agg.items[0]["p"], 1);
    assert_eq!(agg.items[2]["p"], 0);
    assert_eq!(agg.metadata["k"], 2);
    assert_eq!(agg.metadata["a"], true);
    assert_eq!(agg.pages_completed, 2);
}

#[test]
fn test_merge_page_truncates_to_total() {
    let mut agg = AggregateResult::default();
    merge_page(&mut agg, page(0, 100, json!({})), 150);
    merge_page(&mut agg, page(1, 100, json!({})), 150);
    assert_eq!(agg.items.len(), 150);
    assert_eq!(agg.items[149], json!({"p": 1, "i": 49}));
}

#[test]
fn test_merge_failed_page_records_failure_only() {
    let mut agg = AggregateResult::default();
    merge_page(&mut agg, failed_page(3), 100);
    assert!(agg.items.is_empty());
    assert_eq!(agg.failures.len(), 1);
    assert_eq!(agg.failures[0].page_index, 3);
    assert_eq!(agg.pages_completed, 1);
}

#[test]
fn test_aggregator_concurrent_merges() {
    let agg = Arc::new(ResultAggregator::new(1000, 8));
    let handles: Vec<_> = (0..8)
        .map(|p| {
            let agg = Arc::clone(&agg);
            std::thread::spawn(move || {
                agg.merge(page(p, 100, json!({})));
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let progress = agg.progress();
    assert_eq!(progress.pages_done, 8);
    assert_eq!(progress.pages_total, 8);
    assert_eq!(progress.running_count, 800);
    let agg = Arc::try_unwrap(agg).unwrap();
    assert_eq!(agg.into_result().items.len(), 800);
}

#[test]
fn test_aggregator_skips_progress_for_failed_pages() {
    let agg = ResultAggregator::new(300, 3);
    assert!(agg.merge(page(0, 100, json!({}))).is_some());
    assert!(agg.merge(failed_page(1)).is_none());
    let snap = agg.progress();
    assert_eq!(snap.pages_done, 2);
    assert_eq!(snap.failed_pages, 1);
    assert_eq!(snap.running_count, 100);
    assert_eq!(agg.running_count(), 100);
    assert_eq!(agg.snapshot().failures.len(), 1);
}

// --- check_for_total_failure ---

#[test]
fn test_total_failure_only_when_every_page_failed() {
    let mut agg = AggregateResult {
        pages_total: 2,
        ..Default::default()
    };
    merge_page(&mut agg, failed_page(0), 200);
    merge_page(&mut agg, page(1, 5, json!({})), 200);
    assert!(check_for_total_failure(agg).is_ok());

    let mut agg = AggregateResult {
        pages_total: 2,
        ..Default::default()
    };
    merge_page(&mut agg, failed_page(1), 200);
    merge_page(&mut agg, failed_page(0), 200);
    let Err(QueryError::AllPagesFailed { errors }) = check_for_total_failure(agg) else {
        panic!("expected AllPagesFailed");
    };
    let order: Vec<usize> = errors.iter().map(|e| e.page_index).collect();
    assert_eq!(order, vec![1, 0]);
}

#[test]
fn test_empty_successful_run_is_not_a_failure() {
    let mut agg = AggregateResult {
        pages_total: 1,
        ..Default::default()
    };
    merge_page(&mut agg, page(0, 0, json!({})), 100);
    let agg = check_for_total_failure(agg).unwrap();
    assert!(agg.is_empty());
}
