use conegate::core::audit::{self, AuditLog, AuditRecord};
use conegate::core::config::{self, ConeConfig};
use conegate::core::error::ConeError;
use conegate::core::store::Store;
use conegate::core::time;
use std::fs;
use std::sync::{Arc, Barrier};
use tempfile::tempdir;

#[test]
fn store_defaults_resolve_under_data_dir() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::open(tmp.path()).expect("open store");

    assert_eq!(store.config, ConeConfig::default());
    assert_eq!(store.state_path(), tmp.path().join("data").join("cone_state.json"));
    assert_eq!(store.audit_log_path(), tmp.path().join("data").join("audit.log"));
}

#[test]
fn store_honors_config_file() {
    let tmp = tempdir().expect("tempdir");
    fs::write(
        tmp.path().join(config::CONFIG_FILE_NAME),
        r#"
[paths]
data_dir = "var/gov"
audit_log = "decisions.jsonl"

[review]
decision_window = 50
"#,
    )
    .expect("write config");

    let store = Store::open(tmp.path()).expect("open store");
    assert_eq!(store.audit_log_path(), tmp.path().join("var/gov/decisions.jsonl"));
    assert_eq!(store.state_path(), tmp.path().join("var/gov/cone_state.json"));
    assert_eq!(store.config.review.decision_window, 50);
    assert_eq!(store.config.review.deny_rate_threshold, 0.35);
}

#[test]
fn invalid_config_is_rejected() {
    let tmp = tempdir().expect("tempdir");
    fs::write(
        tmp.path().join(config::CONFIG_FILE_NAME),
        "[review]\ndecision_window = 0\n",
    )
    .expect("write config");
    assert!(matches!(Store::open(tmp.path()), Err(ConeError::ConfigError(_))));

    fs::write(tmp.path().join(config::CONFIG_FILE_NAME), "[paths\n").expect("write config");
    assert!(matches!(Store::open(tmp.path()), Err(ConeError::ConfigError(_))));
}

#[test]
fn audit_log_appends_one_line_per_record() {
    let tmp = tempdir().expect("tempdir");
    let log = AuditLog::new(&tmp.path().join("nested").join("audit.log"));

    assert_eq!(log.count().unwrap(), 0);
    log.append(audit::EVENT_CONE_SET, &serde_json::json!({"band": "B_CAUTION"}))
        .expect("append");
    log.append(audit::EVENT_CONE_DENY, &serde_json::json!({"engine": "wholesaling"}))
        .expect("append");

    let content = fs::read_to_string(log.path()).expect("read log");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).expect("json line");
    assert_eq!(first["event"], "CONE_SET");
    assert_eq!(first["payload"]["band"], "B_CAUTION");
    let ts = first["ts_utc"].as_str().expect("ts string");
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
}

#[test]
fn audit_tail_skips_malformed_lines() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("audit.log");
    let log = AuditLog::new(&path);
    for i in 0..5 {
        log.append(audit::EVENT_CONE_ALLOW, &serde_json::json!({ "i": i }))
            .expect("append");
    }
    let mut content = fs::read_to_string(&path).expect("read");
    content.push_str("not json\n");
    fs::write(&path, content).expect("write");

    let tail: Vec<AuditRecord> = log.tail(2).expect("tail");
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].payload["i"], 3);
    assert_eq!(tail[1].payload["i"], 4);
    assert_eq!(log.count().unwrap(), 5);
    assert_eq!(log.tail(100).unwrap().len(), 5);
}

#[test]
fn concurrent_appends_keep_lines_whole() {
    let tmp = tempdir().expect("tempdir");
    let log = Arc::new(AuditLog::new(&tmp.path().join("audit.log")));
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let log = Arc::clone(&log);
            let gate = Arc::clone(&barrier);
            std::thread::spawn(move || {
                gate.wait();
                for i in 0..25 {
                    log.append(audit::EVENT_CONE_ALLOW, &serde_json::json!({ "t": t, "i": i }))
                        .expect("append");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("thread joined");
    }

    let content = fs::read_to_string(log.path()).expect("read");
    assert_eq!(content.lines().count(), 100);
    assert_eq!(log.count().unwrap(), 100);
}

#[test]
fn command_envelope_carries_payload() {
    let env = time::command_envelope("cone.decide", "ok", serde_json::json!({"allowed": true}));
    assert_eq!(env["cmd"], "cone.decide");
    assert_eq!(env["allowed"], true);
    assert!(ulid::Ulid::from_string(env["event_id"].as_str().unwrap()).is_ok());
}

#[test]
fn parse_metric_accepts_json_and_strings() {
    let (k, v) = conegate::parse_metric("runway_days=45").unwrap();
    assert_eq!(k, "runway_days");
    assert_eq!(v, serde_json::json!(45));

    let (_, v) = conegate::parse_metric("note = cash tight").unwrap();
    assert_eq!(v, serde_json::json!("cash tight"));

    assert!(conegate::parse_metric("novalue").is_err());
    assert!(conegate::parse_metric("=3").is_err());
}
