// Unit tests for rule table loading and validation.

use coastwatch::classify::{ClassificationInput, RuleTable, DEFAULT_PROFILE};

fn table_json(rules: &str) -> String {
    format!(r#"{{ "rules": {rules} }}"#)
}

#[test]
fn minimal_table_gets_builtin_profiles() {
    let json = table_json(r#"[{"name": "Rip Current", "keywords": ["rip current"], "weight": 0.9}]"#);
    let table = RuleTable::from_json(&json).unwrap();
    assert_eq!(table.rules.len(), 1);
    assert!(table.rules[0].urgency_keywords.is_empty());
    assert!(table.profile_names().contains(&DEFAULT_PROFILE));
    assert!(table.profile("reddit").is_ok());

    let classifier = table.classifier("twitter").unwrap();
    assert_eq!(classifier.classify_text("Rip current at Juhu").category, "Rip Current");
}

#[test]
fn missing_default_profile_is_filled_in() {
    let json = r#"{
        "rules": [{"name": "Tsunami", "keywords": ["tsunami"], "weight": 1.0}],
        "profiles": {"Coastguard": {"keyword_weight": 0.5}}
    }"#;
    let table = RuleTable::from_json(json).unwrap();
    assert_eq!(table.profile_names(), vec!["coastguard", "default"]);

    let coastguard = table.profile("COASTGUARD").unwrap();
    assert_eq!(coastguard.keyword_weight, 0.5);
    // Unspecified fields fall back to defaults
    assert_eq!(coastguard.urgency_weight, 0.2);
}

#[test]
fn rejects_empty_rule_list() {
    assert!(RuleTable::from_json(&table_json("[]")).is_err());
}

#[test]
fn rejects_duplicate_names() {
    let json = table_json(
        r#"[{"name": "Flooding", "keywords": ["flood"], "weight": 0.8},
            {"name": "flooding", "keywords": ["inundation"], "weight": 0.8}]"#,
    );
    let err = RuleTable::from_json(&json).unwrap_err();
    assert!(format!("{err:#}").contains("Duplicate"));
}

#[test]
fn rejects_out_of_range_weight() {
    for weight in ["0", "1.5", "-0.2"] {
        let json = table_json(&format!(
            r#"[{{"name": "Flooding", "keywords": ["flood"], "weight": {weight}}}]"#
        ));
        let err = RuleTable::from_json(&json).unwrap_err();
        assert!(format!("{err:#}").contains("Flooding"), "weight {weight}");
    }
}

#[test]
fn rejects_rule_without_keywords() {
    let json = table_json(r#"[{"name": "Flooding", "keywords": [], "weight": 0.8}]"#);
    assert!(RuleTable::from_json(&json).is_err());

    let json = table_json(r#"[{"name": "Flooding", "keywords": ["flood", "  "], "weight": 0.8}]"#);
    assert!(RuleTable::from_json(&json).is_err());
}

#[test]
fn rejects_reserved_general_name() {
    let json = table_json(r#"[{"name": "General", "keywords": ["anything"], "weight": 0.5}]"#);
    assert!(RuleTable::from_json(&json).is_err());
}

#[test]
fn rejects_negative_constants() {
    let json = r#"{
        "rules": [{"name": "Tsunami", "keywords": ["tsunami"], "weight": 1.0}],
        "profiles": {"default": {"urgency_weight": -0.1}}
    }"#;
    let err = RuleTable::from_json(json).unwrap_err();
    assert!(format!("{err:#}").contains("urgency_weight"));
}

#[test]
fn extra_keywords_for_unknown_category_are_ignored() {
    let json = r#"{
        "rules": [{"name": "Tsunami", "keywords": ["tsunami"], "weight": 1.0}],
        "profiles": {"default": {"extra_keywords": {"Volcano": ["lava"]}}}
    }"#;
    let table = RuleTable::from_json(json).unwrap();
    let classifier = table.classifier("default").unwrap();
    assert!(classifier.classify_text("lava flow").is_general());
}

#[test]
fn context_prior_keys_are_normalized_on_load() {
    let json = r#"{
        "rules": [{"name": "Tsunami", "keywords": ["tsunami"], "weight": 1.0}],
        "profiles": {"reddit": {
            "keyword_weight": 0.25,
            "context_weight": 0.5,
            "default_context_prior": 0.3,
            "context_priors": {"Tsunami": 1.0, " r/Chennai ": 0.6}
        }}
    }"#;
    let table = RuleTable::from_json(json).unwrap();
    let reddit = table.profile("reddit").unwrap();
    assert_eq!(
        reddit.context_priors.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["chennai", "tsunami"]
    );

    let classifier = table.classifier("reddit").unwrap();
    let input = ClassificationInput::new("tsunami").with_source("r/tsunami");
    // (0.25 + 1.0 * 0.5) * 1.0
    assert!((classifier.classify(&input).confidence - 0.75).abs() < 1e-9);
}

#[test]
fn rejects_context_keys_that_collide() {
    let json = r#"{
        "rules": [{"name": "Tsunami", "keywords": ["tsunami"], "weight": 1.0}],
        "profiles": {"reddit": {"context_priors": {"Tsunami": 1.0, "r/tsunami": 0.5}}}
    }"#;
    let err = RuleTable::from_json(json).unwrap_err();
    assert!(format!("{err:#}").contains("tsunami"));
}

#[test]
fn rejects_profiles_differing_only_in_case() {
    let json = r#"{
        "rules": [{"name": "Tsunami", "keywords": ["tsunami"], "weight": 1.0}],
        "profiles": {"Reddit": {"keyword_weight": 0.9}, "reddit": {"keyword_weight": 0.1}}
    }"#;
    let err = RuleTable::from_json(json).unwrap_err();
    assert!(format!("{err:#}").contains("defined more than once"));
}

#[test]
fn rejects_malformed_json() {
    assert!(RuleTable::from_json("{ not json").is_err());
}

#[test]
fn builtin_table_roundtrips_through_json() {
    let table = RuleTable::builtin();
    let json = serde_json::to_string(&table).unwrap();
    let loaded = RuleTable::from_json(&json).unwrap();
    assert_eq!(loaded.rules, table.rules);
    assert_eq!(loaded.profiles, table.profiles);
}

#[test]
fn load_reports_missing_file() {
    let err = RuleTable::load(std::path::Path::new("/nonexistent/coastwatch-rules.json")).unwrap_err();
    assert!(format!("{err:#}").contains("coastwatch-rules.json"));
}
