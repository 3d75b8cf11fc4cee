#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use udpsynth_common::{Config, EmitConfig, OverlapPolicy, SynthConfig};

#[test]
fn test_config_default() {
    let config = Config::default();
    assert!(config.parallel);
    assert!(config.synth.reduce);
    assert_eq!(config.synth.overlap, OverlapPolicy::RejectConflicting);
    assert_eq!(config.emit.indent, 2);
    assert!(config.emit.row_comments);
}

#[test]
fn test_config_builder() {
    let config = Config::new()
        .with_parallel(false)
        .with_synth(
            SynthConfig::new()
                .with_reduce(false)
                .with_overlap(OverlapPolicy::RejectAny),
        )
        .with_emit(EmitConfig::new().with_indent(4).with_row_comments(false));

    assert!(!config.parallel);
    assert!(!config.synth.reduce);
    assert_eq!(config.synth.overlap, OverlapPolicy::RejectAny);
    assert_eq!(config.emit.indent, 4);
    assert!(!config.emit.row_comments);
    assert!(config.emit.header_comment);
}

#[test]
fn test_config_json_partial_uses_defaults() {
    let config = Config::from_json_str(r#"{ "synth": { "overlap": "reject-any" } }"#)
        .expect("partial config should parse");
    assert_eq!(config.synth.overlap, OverlapPolicy::RejectAny);
    assert!(config.synth.reduce);
    assert!(config.parallel);
    assert_eq!(config.emit, EmitConfig::default());
}

#[test]
fn test_config_json_round_trip() {
    let config = Config::new().with_emit(EmitConfig::new().with_header_comment(false));
    let text = config.to_json_string().expect("serialize");
    let back = Config::from_json_str(&text).expect("deserialize");
    assert_eq!(config, back);
}

#[test]
fn test_config_json_rejects_unknown_policy() {
    assert!(Config::from_json_str(r#"{ "synth": { "overlap": "first-wins" } }"#).is_err());
}

#[test]
fn test_config_hash_difference() {
    let config1 = Config::new().with_parallel(true);
    let config2 = Config::new().with_parallel(false);

    let mut hasher1 = DefaultHasher::new();
    let mut hasher2 = DefaultHasher::new();
    config1.hash(&mut hasher1);
    config2.hash(&mut hasher2);

    assert_ne!(hasher1.finish(), hasher2.finish());
}
