use conegate::core::audit::AuditLog;
use conegate::core::error::ConeError;
use conegate::core::store::Store;
use conegate::plugins::canon::{self, ConeBand, EngineClass};
use conegate::plugins::cone::{
    ConeStore, DEFAULT_REASON, EngineAction, Metrics, allowed_actions,
};
use std::fs;
use tempfile::tempdir;

fn test_cone() -> (tempfile::TempDir, Store, ConeStore) {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let cone = ConeStore::open(&store);
    (tmp, store, cone)
}

fn audit_lines(store: &Store) -> usize {
    fs::read_to_string(store.audit_log_path())
        .map(|c| c.lines().count())
        .unwrap_or(0)
}

#[test]
fn test_default_state_is_caution() {
    let (_tmp, store, cone) = test_cone();
    let state = cone.get_state();
    assert_eq!(state.band, ConeBand::BCaution);
    assert_eq!(state.reason, DEFAULT_REASON);
    assert!(state.metrics.is_empty());
    // Reading never writes.
    assert!(!store.state_path().exists());
}

#[test]
fn test_get_state_is_idempotent() {
    let (_tmp, _store, cone) = test_cone();
    assert_eq!(cone.get_state(), cone.get_state());

    cone.set_state(ConeBand::CStabilize, "q3 drawdown", Metrics::new())
        .unwrap();
    assert_eq!(cone.get_state(), cone.get_state());
}

#[test]
fn test_set_state_persists_and_reloads() {
    let (_tmp, store, cone) = test_cone();
    let mut metrics = Metrics::new();
    metrics.insert("runway_days".to_string(), serde_json::json!(45));

    let state = cone
        .set_state(ConeBand::DSurvival, "runway under 60 days", metrics)
        .unwrap();
    assert_eq!(state.band, ConeBand::DSurvival);

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.state_path()).unwrap()).unwrap();
    assert_eq!(raw["band"], "D_SURVIVAL");
    assert_eq!(raw["reason"], "runway under 60 days");
    assert_eq!(raw["metrics"]["runway_days"], 45);
    assert!(raw["updated_at_utc"].is_string());

    // A fresh handle stands in for a fresh process.
    let reopened = ConeStore::open(&store);
    let loaded = reopened.get_state();
    assert_eq!(loaded.band, ConeBand::DSurvival);
    assert_eq!(loaded.reason, "runway under 60 days");
    assert_eq!(loaded, state);
}

#[test]
fn test_set_state_audits_cone_set() {
    let (_tmp, store, cone) = test_cone();
    cone.set_state(ConeBand::AExpansion, "all KPIs green", Metrics::new())
        .unwrap();

    let records = cone.audit().tail(10).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event, "CONE_SET");
    assert_eq!(records[0].payload["band"], "A_EXPANSION");
    assert_eq!(records[0].payload["reason"], "all KPIs green");
    assert!(records[0].payload["metrics"].is_object());
    assert_eq!(audit_lines(&store), 1);
}

#[test]
fn test_set_state_accepts_empty_reason() {
    let (_tmp, store, cone) = test_cone();
    let state = cone
        .set_state(ConeBand::CStabilize, "", Metrics::new())
        .unwrap();
    assert_eq!(state.reason, "");

    let reloaded = ConeStore::open(&store).get_state();
    assert_eq!(reloaded.band, ConeBand::CStabilize);
    assert_eq!(reloaded.reason, "");

    let records = cone.audit().tail(10).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event, "CONE_SET");
    assert_eq!(records[0].payload["reason"], "");
}

#[test]
fn test_corrupted_state_falls_back_to_caution() {
    let (_tmp, store, _cone) = test_cone();
    fs::create_dir_all(store.data_dir()).unwrap();
    fs::write(store.state_path(), "{\"band\": \"Z_PANIC\"").unwrap();

    let cone = ConeStore::open(&store);
    let state = cone.get_state();
    assert_eq!(state.band, ConeBand::BCaution);
    assert_eq!(state.reason, DEFAULT_REASON);
}

#[test]
fn test_failed_persist_keeps_previous_state() {
    let tmp = tempdir().unwrap();
    // The state path's parent is a regular file, so the write must fail.
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, "x").unwrap();
    let cone = ConeStore::new(
        &blocker.join("cone_state.json"),
        AuditLog::new(&tmp.path().join("audit.log")),
    );

    let err = cone.set_state(ConeBand::DSurvival, "halt", Metrics::new());
    assert!(matches!(err, Err(ConeError::IoError(_))));
    assert_eq!(cone.get_state().band, ConeBand::BCaution);
}

#[test]
fn test_decide_matches_matrix_for_every_pair() {
    let (_tmp, _store, cone) = test_cone();
    let actions = ["run", "optimize", "scale", "liquidate"];

    for band in ConeBand::ALL {
        cone.set_state(band, "matrix sweep", Metrics::new()).unwrap();
        for spec in canon::list_engines() {
            for action in actions {
                let d = cone.decide(spec.name, action).unwrap();
                let in_matrix = allowed_actions(band, spec.engine_class)
                    .iter()
                    .any(|a| a.as_str() == action);
                let overridden = (spec.engine_class == EngineClass::Boring && action == "optimize")
                    || (spec.engine_class == EngineClass::Opportunistic && action == "scale");
                assert_eq!(
                    d.allowed,
                    in_matrix && !overridden,
                    "band={} engine={} action={}",
                    band,
                    spec.name,
                    action
                );
                assert_eq!(d.band, band);
                assert_eq!(d.engine, spec.name);
                assert_eq!(d.action, action);
            }
        }
    }
}

#[test]
fn test_boring_optimize_always_denied() {
    let (_tmp, _store, cone) = test_cone();
    for band in ConeBand::ALL {
        cone.set_state(band, "sweep", Metrics::new()).unwrap();
        assert!(!cone.decide("storage_units", "optimize").unwrap().allowed);
    }
}

#[test]
fn test_opportunistic_scale_always_denied() {
    let (_tmp, _store, cone) = test_cone();
    for band in ConeBand::ALL {
        cone.set_state(band, "sweep", Metrics::new()).unwrap();
        assert!(!cone.decide("fx_arbitrage", "scale").unwrap().allowed);
    }
}

#[test]
fn test_survival_band_blocks_alpha() {
    let (_tmp, _store, cone) = test_cone();
    cone.set_state(ConeBand::DSurvival, "cash crunch", Metrics::new())
        .unwrap();

    let d = cone.decide("wholesaling", "run").unwrap();
    assert!(!d.allowed);
    assert_eq!(d.band, ConeBand::DSurvival);
    assert!(d.reason.contains("band=D_SURVIVAL class=EngineClass.ALPHA"), "{}", d.reason);

    assert!(cone.decide("storage_units", "run").unwrap().allowed);
}

#[test]
fn test_expansion_band_lets_alpha_scale() {
    let (_tmp, _store, cone) = test_cone();
    cone.set_state(ConeBand::AExpansion, "growth quarter", Metrics::new())
        .unwrap();

    let d = cone.decide("wholesaling", "scale").unwrap();
    assert!(d.allowed);
    assert_eq!(d.reason, "Allowed by Cone");
}

#[test]
fn test_decide_unknown_engine_errors_without_audit() {
    let (_tmp, store, cone) = test_cone();
    for action in ["run", "optimize", "scale"] {
        assert!(matches!(
            cone.decide("moon_base", action),
            Err(ConeError::UnknownEngine(_))
        ));
    }
    assert_eq!(audit_lines(&store), 0);
}

#[test]
fn test_every_decision_writes_one_audit_line() {
    let (_tmp, store, cone) = test_cone();
    let calls = [
        ("storage_units", "run"),
        ("storage_units", "optimize"),
        ("wholesaling", "optimize"),
        ("fx_arbitrage", "scale"),
        ("vending_routes", "run"),
    ];
    for (i, (engine, action)) in calls.iter().enumerate() {
        let d = cone.decide(engine, action).unwrap();
        assert_eq!(audit_lines(&store), i + 1);

        let last = cone.audit().tail(1).unwrap().remove(0);
        let expected = if d.allowed { "CONE_ALLOW" } else { "CONE_DENY" };
        assert_eq!(last.event, expected);
        assert_eq!(last.payload["engine"], *engine);
        assert_eq!(last.payload["reason"], d.reason.as_str());
    }
}

#[test]
fn test_override_reasons() {
    let (_tmp, _store, cone) = test_cone();
    cone.set_state(ConeBand::AExpansion, "growth", Metrics::new())
        .unwrap();
    // Neither pair is in the matrix, so the matrix denial fires first.
    let d = cone.decide("storage_units", "optimize").unwrap();
    assert!(d.reason.starts_with("Denied by Cone: band=A_EXPANSION class=EngineClass.BORING"));
    let d = cone.decide("fx_arbitrage", "scale").unwrap();
    assert!(d.reason.contains("class=EngineClass.OPPORTUNISTIC"));
}

#[test]
fn test_matrix_examples() {
    assert_eq!(
        allowed_actions(ConeBand::AExpansion, EngineClass::Alpha),
        &[EngineAction::Run, EngineAction::Scale, EngineAction::Optimize]
    );
    assert_eq!(
        allowed_actions(ConeBand::BCaution, EngineClass::Opportunistic),
        &[EngineAction::Run]
    );
    assert!(allowed_actions(ConeBand::DSurvival, EngineClass::Alpha).is_empty());
    assert!(allowed_actions(ConeBand::CStabilize, EngineClass::Opportunistic).is_empty());
}
