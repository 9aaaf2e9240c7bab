use std::path::Path;

use swarm_goap::{ConfigError, GoapConfig, PlannerConfig};

#[test]
fn empty_document_yields_defaults() {
    let config = GoapConfig::from_yaml_str("{}").expect("parse");
    assert_eq!(config, GoapConfig::default());

    assert_eq!(config.planner.max_depth, 16);
    assert_eq!(config.planner.max_expansions, 4096);
    assert_eq!(config.executor.max_failures, 3);
    assert_eq!(config.executor.drift_threshold, 5);
    assert_eq!(config.role.max_plan_starts_per_goal, None);
    assert!(config.role.check_drift);
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let yaml = r#"
planner:
  max_expansions: 512
  allow_partial: true
executor:
  drift_threshold: 8
role:
  max_plan_starts_per_goal: 4
"#;
    let config = GoapConfig::from_yaml_str(yaml).expect("parse");

    assert_eq!(
        config.planner,
        PlannerConfig {
            max_expansions: 512,
            allow_partial: true,
            ..PlannerConfig::default()
        }
    );
    assert_eq!(config.executor.drift_threshold, 8);
    assert_eq!(config.executor.max_failures, 3);
    assert_eq!(config.role.max_plan_starts_per_goal, Some(4));
    assert_eq!(config.role.min_replan_interval_ticks, 0);
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let err = GoapConfig::from_yaml_str("planner: [1, 2").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)), "{err}");

    let err = GoapConfig::from_yaml_str("executor:\n  max_failures: many\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn missing_file_handling() {
    let path = Path::new("/nonexistent/swarm-goap/goap.yaml");

    let err = GoapConfig::load(path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("goap.yaml"));

    let config = GoapConfig::load_or_default(path).expect("defaults");
    assert_eq!(config, GoapConfig::default());
}

#[test]
fn config_round_trips_through_yaml() {
    let mut config = GoapConfig::default();
    config.planner.heuristic_weight = 1.5;
    config.role.min_replan_interval_ticks = 10;

    let yaml = serde_yaml::to_string(&config).expect("serialize");
    let parsed = GoapConfig::from_yaml_str(&yaml).expect("parse");
    assert_eq!(parsed, config);
}
