//! Loaded documents dump to plain YAML that loads back unchanged.

use pretty_assertions::assert_eq;
use smartyaml::{DumpOptions, LoadOptions, Value, dump, dump_to_path, load, loads};

const DOCUMENT: &str = r##"
__vars:
  app: shop
name: !expand '{{app}}-api'
enabled: yes
ratio: 0.25
huge: 1.0e+100
count: 0x1F
nothing: ~
quoted: "yes"
numeric_text: "42"
dotted: ".hidden"
multiline: |
  line one
  line two
tags: [a, "b: c", "#hash"]
nested:
  - key: value
    list: []
    map: {}
encoded: !base64 hello
"##;

#[test]
fn test_dump_then_load_is_identity() {
    let options = LoadOptions::new();
    let first = loads(DOCUMENT, &options).unwrap();

    for dump_options in [
        DumpOptions::default(),
        DumpOptions {
            multiline_strings: true,
            compact: false,
        },
    ] {
        let text = dump(&first, &dump_options).unwrap();
        assert!(!text.contains('!'), "{text}");
        let second = loads(&text, &options).unwrap();
        assert_eq!(first, second, "{text}");
    }
}

#[test]
fn test_loaded_types() {
    let value = loads(DOCUMENT, &LoadOptions::new()).unwrap();
    assert_eq!(value.get("name"), Some(&Value::from("shop-api")));
    assert_eq!(value.get("enabled"), Some(&Value::Bool(true)));
    assert_eq!(value.get("huge"), Some(&Value::Float(1e100)));
    assert_eq!(value.get("count"), Some(&Value::Integer(31)));
    assert_eq!(value.get("nothing"), Some(&Value::Null));
    assert_eq!(value.get("quoted"), Some(&Value::from("yes")));
    assert_eq!(value.get("numeric_text"), Some(&Value::from("42")));
}

#[test]
fn test_dump_to_path_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.yaml");
    let value = loads(DOCUMENT, &LoadOptions::new()).unwrap();

    dump_to_path(&value, &path, &DumpOptions::default()).unwrap();
    assert_eq!(load(&path, &LoadOptions::new()).unwrap(), value);
}
