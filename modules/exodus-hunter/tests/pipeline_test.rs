//! End-to-end cycle tests: real worker, ledger, qualifiers and notifier, with
//! mocks only at the network edges.

use std::collections::HashMap;
use std::sync::Arc;

use exodus_common::{AppConfig, CyclePlan, WorkUnit};
use exodus_hunter::ledger::Ledger;
use exodus_hunter::notify::{AdminLog, Notifier};
use exodus_hunter::qualify::{ModelQualifier, RuleQualifier};
use exodus_hunter::sources::plan_work_units;
use exodus_hunter::testing::{
    business_item, feed_item, MockQualifier, MockSource, RecordingSender, ScriptedModel,
    StaticEmails, StaticMx,
};
use exodus_hunter::worker::Worker;

fn config(pairs: &[(&str, &str)]) -> AppConfig {
    let vars: HashMap<&str, &str> = pairs.iter().copied().collect();
    AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

fn feed_unit() -> WorkUnit {
    WorkUnit::FeedBatch {
        index: 0,
        keywords: vec!["\"need a website\"".into()],
    }
}

#[tokio::test]
async fn repeated_items_notify_once_across_cycles() {
    let unit = feed_unit();
    let source = MockSource::new().on_unit(&unit, vec![feed_item("t3_a"), feed_item("t3_b")]);
    let sender = Arc::new(RecordingSender::new());
    let worker = Worker::new(
        vec![unit],
        Arc::new(source),
        Arc::new(MockQualifier::accept_all()),
        Notifier::new(sender.clone(), vec!["100".into(), "200".into()]),
    );

    for _ in 0..3 {
        worker.run_cycle().await;
    }

    assert_eq!(sender.sent_to("100"), 2);
    assert_eq!(sender.sent_to("200"), 2);
    assert_eq!(worker.ledger().len(), 2);
}

#[tokio::test]
async fn ledger_reset_lets_items_resurface() {
    let unit = feed_unit();
    let ledger = Arc::new(Ledger::new());
    let sender = Arc::new(RecordingSender::new());
    let worker = Worker::new(
        vec![unit.clone()],
        Arc::new(MockSource::new().on_unit(&unit, vec![feed_item("t3_a")])),
        Arc::new(MockQualifier::accept_all()),
        Notifier::new(sender.clone(), vec!["100".into()]),
    )
    .with_ledger(ledger.clone());

    worker.run_cycle().await;
    worker.run_cycle().await;
    assert_eq!(sender.sent().len(), 1);

    ledger.clear();
    worker.run_cycle().await;
    assert_eq!(sender.sent().len(), 2);
}

#[tokio::test]
async fn failing_recipient_is_isolated() {
    let unit = feed_unit();
    let sender = Arc::new(RecordingSender::failing_for(&["200"]));
    let worker = Worker::new(
        vec![unit.clone()],
        Arc::new(MockSource::new().on_unit(&unit, vec![feed_item("t3_a"), feed_item("t3_b")])),
        Arc::new(MockQualifier::accept_all()),
        Notifier::new(sender.clone(), vec!["100".into(), "200".into(), "300".into()]),
    );

    let stats = worker.run_cycle().await;

    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.delivered, 4);
    assert_eq!(stats.delivery_failures, 2);
    assert_eq!(sender.sent_to("100"), 2);
    assert_eq!(sender.sent_to("300"), 2);
}

#[tokio::test]
async fn rotation_visits_every_city_and_niche_once() {
    let config = config(&[
        ("SERPAPI_KEY", "k"),
        ("LEAD_BOT_TOKEN", "1:t"),
        ("MY_CHAT_ID", "1"),
        ("CITIES", "Houston, TX; Miami, FL"),
        ("NICHES", "Roofing; HVAC; Pest Control"),
    ]);
    let units = plan_work_units(&config);
    assert_eq!(units.len(), 6);

    let source = MockSource::new();
    let calls = source.calls();
    let worker = Worker::new(
        units.clone(),
        Arc::new(source),
        Arc::new(MockQualifier::accept_all()),
        Notifier::new(Arc::new(RecordingSender::new()), vec!["1".into()]),
    )
    .with_plan(config.cycle_plan);

    for _ in 0..units.len() {
        worker.run_cycle().await;
    }

    let visited = calls.lock().unwrap().clone();
    assert_eq!(visited, units, "one unit per cycle, in plan order");
}

#[tokio::test]
async fn sweep_queries_every_keyword_batch_once() {
    let keywords: Vec<String> = (0..151).map(|i| format!("term{i}")).collect();
    let joined = keywords.join(";");
    let config = config(&[
        ("BOT_MODE", "feed"),
        ("AI_API_KEY", "sk"),
        ("LEAD_BOT_TOKEN", "1:t"),
        ("MY_CHAT_ID", "1"),
        ("KEYWORDS", joined.as_str()),
        ("FEED_BATCH_SIZE", "30"),
    ]);
    let units = plan_work_units(&config);
    assert_eq!(units.len(), 6);

    let source = MockSource::new();
    let calls = source.calls();
    let worker = Worker::new(
        units.clone(),
        Arc::new(source),
        Arc::new(MockQualifier::accept_all()),
        Notifier::new(Arc::new(RecordingSender::new()), vec!["1".into()]),
    )
    .with_plan(CyclePlan::Sweep);

    let stats = worker.run_cycle().await;

    assert_eq!(stats.units, 6);
    assert_eq!(*calls.lock().unwrap(), units);
    match units.last() {
        Some(WorkUnit::FeedBatch { keywords, .. }) => assert_eq!(keywords, &vec!["term150".to_string()]),
        other => panic!("unexpected last unit {other:?}"),
    }
}

#[tokio::test]
async fn malformed_model_output_sends_nothing() {
    let unit = feed_unit();
    let leads = Arc::new(RecordingSender::new());
    let admin = Arc::new(RecordingSender::new());
    let model = Arc::new(ScriptedModel::replying("Great post! Score: 95/100"));
    let worker = Worker::new(
        vec![unit.clone()],
        Arc::new(MockSource::new().on_unit(&unit, vec![feed_item("t3_a")])),
        Arc::new(ModelQualifier::new(model.clone(), 50.0)),
        Notifier::new(leads.clone(), vec!["100".into()]),
    )
    .with_admin_log(AdminLog::new(admin.clone(), "42", false));

    let stats = worker.run_cycle().await;

    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.accepted, 0);
    assert_eq!(model.prompt_count(), 1);
    assert!(leads.sent().is_empty());
    assert!(admin
        .sent()
        .iter()
        .any(|(_, m)| m.text.contains("[SYSTEM ERROR]") && m.text.contains("no verdict")));
}

#[tokio::test]
async fn model_threshold_decides_notification() {
    let unit = feed_unit();
    let leads = Arc::new(RecordingSender::new());
    let model = Arc::new(ScriptedModel::replying(
        "```json\n{\"score\": 50, \"reason\": \"asks for a quote\", \"pitch\": \"Hi there\"}\n```",
    ));
    let worker = Worker::new(
        vec![unit.clone()],
        Arc::new(MockSource::new().on_unit(&unit, vec![feed_item("t3_a")])),
        Arc::new(ModelQualifier::new(model, 50.0)),
        Notifier::new(leads.clone(), vec!["100".into()]),
    );

    let stats = worker.run_cycle().await;

    assert_eq!(stats.accepted, 1);
    let sent = leads.sent();
    assert!(sent[0].1.text.contains("(score 50/100)"));
    assert!(sent[0].1.text.contains("asks for a quote"));
}

#[tokio::test]
async fn directory_rules_pick_only_qualified_listings() {
    let unit = WorkUnit::directory("Roofing", "Houston, TX");
    let listings = vec![
        business_item("at-threshold", Some(4.0), None),
        business_item("below", Some(3.9), None),
        business_item("has-site", Some(5.0), Some("https://roof.example")),
    ];
    let leads = Arc::new(RecordingSender::new());
    let qualifier = RuleQualifier::new(
        4.0,
        Arc::new(StaticEmails::found("owner@roof.example")),
        Arc::new(StaticMx::present()),
    );
    let worker = Worker::new(
        vec![unit.clone()],
        Arc::new(MockSource::new().on_unit(&unit, listings)),
        Arc::new(qualifier),
        Notifier::new(leads.clone(), vec!["100".into()]),
    );

    let stats = worker.run_cycle().await;

    assert_eq!((stats.accepted, stats.rejected), (1, 2));
    let sent = leads.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.text.contains("Apex Roofing at-threshold"));
    assert!(sent[0].1.text.contains("owner@roof.example"));
    assert!(sent[0].1.text.contains("(Zip: 77002)"));
}
