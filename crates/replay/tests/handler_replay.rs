//! Replays extracted documents through an in-process handler.

use std::sync::{Arc, Mutex};

use serde_json::json;
use specport_core::{extract_file, SpecDocument};
use specport_replay::{
    load_specs, run_specs, HttpRequest, HttpResponse, ReplayOptions, Tap, Target,
};

const SOURCE: &str = r#"
spec :: SpecWith ((), Application)
spec =
  describe "Items" $ do
    it "lists" $
      get "/items" `shouldRespondWith` [json|[{"id":1}]|]

    it "creates" $
      request methodPost "/items" [("Prefer", "return=minimal")]
        [json|{ id: 2 }|]
        `shouldRespondWith` ""
        { matchStatus = 201
        , matchHeaders = [matchHeaderAbsent hContentType]
        }

    it "is missing" $
      get "/nope" `shouldRespondWith` 404
"#;

fn document() -> SpecDocument {
    extract_file("ItemsSpec.hs", SOURCE, "default").to_document()
}

/// A tiny fake service that answers the three requests above.
fn service(seen: Arc<Mutex<Vec<HttpRequest>>>) -> Target {
    Target::handler(move |req: &HttpRequest| {
        seen.lock().unwrap().push(req.clone());
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/items") => HttpResponse::new(200)
                .with_header("Content-Type", "application/json; charset=utf-8")
                .with_body(r#"[{"id": 1}]"#),
            ("POST", "/items") => HttpResponse::new(201),
            _ => HttpResponse::new(404).with_body(r#"{"message":"not found"}"#),
        }
    })
}

#[test]
fn extracted_document_passes_against_matching_service() {
    let doc = document();
    assert_eq!(doc.tests.len(), 3);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut tap = Tap::new();
    run_specs(&[doc], &service(seen.clone()), &ReplayOptions::default(), &mut tap);

    let mut buf = Vec::new();
    let summary = tap.write_to(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(summary.fail, 0, "{}", text);
    assert_eq!(summary.pass, 3);
    assert!(text.contains("ok 2 - Items > Items > creates"));

    let seen = seen.lock().unwrap();
    let post = &seen[1];
    assert_eq!(post.body.as_deref(), Some(r#"{"id":2}"#));
    assert_eq!(post.header("Prefer"), Some("return=minimal"));
    assert_eq!(post.header("Content-Type"), Some("application/json"));
}

#[test]
fn failures_carry_every_mismatch() {
    let target = Target::handler(|_req: &HttpRequest| {
        HttpResponse::new(500)
            .with_header("Content-Type", "text/plain")
            .with_body("boom")
    });
    let mut tap = Tap::new();
    run_specs(&[document()], &target, &ReplayOptions::default(), &mut tap);

    let mut buf = Vec::new();
    let summary = tap.write_to(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(summary.fail, 3);
    // "creates": wrong status, non-empty body, Content-Type present
    assert!(text.contains("# status: expected 201, got 500"));
    assert!(text.contains("# header Content-Type should be absent"));
    assert!(text.contains("# expected JSON body but got: boom"));
}

#[test]
fn skipped_tests_are_reported_not_run() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let options = ReplayOptions {
        skip_tests: vec!["Items > creates".into()],
        ..Default::default()
    };
    let mut tap = Tap::new();
    run_specs(&[document()], &service(seen.clone()), &options, &mut tap);

    let summary = tap.summary();
    assert_eq!(summary.skip, 1);
    assert_eq!(summary.pass, 2);
    assert!(seen.lock().unwrap().iter().all(|r| r.method.as_str() != "POST"));
}

#[test]
fn load_from_disk_then_replay() {
    let tmp = tempfile::tempdir().unwrap();
    let doc = document();
    std::fs::write(
        tmp.path().join("items.json"),
        serde_json::to_string_pretty(&doc).unwrap(),
    )
    .unwrap();
    std::fs::write(tmp.path().join("_flagged.json"), "[]").unwrap();
    let other = json!({"file": "Plan", "config": "plan-enabled", "tests": []});
    std::fs::write(tmp.path().join("plan.json"), other.to_string()).unwrap();

    let options = ReplayOptions {
        skip_configs: vec!["plan-enabled".into()],
        ..Default::default()
    };
    let specs = load_specs(tmp.path(), &options).unwrap();
    assert_eq!(specs, vec![doc]);

    let mut tap = Tap::new();
    run_specs(&specs, &service(Arc::default()), &options, &mut tap);
    assert_eq!(tap.failure_count(), 0);
}
