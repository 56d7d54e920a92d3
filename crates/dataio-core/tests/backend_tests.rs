use std::fs;

use dataio_core::{
    Backend, BackendRegistry, DataError, DataNode, JsonBackend, NodeKind, StorageConfig,
    YamlBackend,
};
use tempfile::tempdir;

fn registry_at(base: &std::path::Path) -> BackendRegistry {
    BackendRegistry::with_default_backends(StorageConfig {
        base_path: base.to_path_buf(),
        ..StorageConfig::default()
    })
}

#[test]
fn load_json_string_and_query() {
    let reg = BackendRegistry::default();
    let root = reg
        .load_string(r#"{"server":{"port":8080,"hosts":["a","b"],"tls":false}}"#)
        .expect("parse json");
    assert_eq!(root.get_number(0.0, "server.port"), 8080.0);
    assert_eq!(root.get_list_size("server.hosts"), 2);
    assert_eq!(root.get_string("", "server.hosts.1"), "b");
    assert!(!root.get_boolean(true, "server.tls"));
}

#[test]
fn load_yaml_string_by_sniffing() {
    let reg = BackendRegistry::default();
    let text = "server:\n  port: 8080\n  hosts:\n    - a\n    - b\n";
    let root = reg.load_string(text).expect("parse yaml");
    assert_eq!(root.get_number(0.0, "server.port"), 8080.0);
    assert_eq!(root.get_string("", "server.hosts.0"), "a");
}

#[test]
fn invalid_strings_yield_none() {
    let reg = BackendRegistry::default();
    assert!(reg.load_string("{not json").is_none());
    assert!(reg.load_string("   ").is_none());
    assert!(reg.load_string("42").is_none());
    assert!(matches!(
        reg.try_load_string(""),
        Err(DataError::BackendUnavailable(_))
    ));
}

#[test]
fn json_serialize_preserves_order_and_integers() {
    let reg = BackendRegistry::default();
    let src = r#"{"z":1,"a":[3,2.5,true,"s"],"m":{"y":0,"b":-4}}"#;
    let root = reg.load_string(src).unwrap();
    let out = reg.serialize(&root).unwrap();
    let canonical: serde_json::Value = serde_json::from_str(src).unwrap();
    let produced: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(produced, canonical);
    let z = out.find("\"z\"").unwrap();
    let a = out.find("\"a\"").unwrap();
    let m = out.find("\"m\"").unwrap();
    assert!(z < a && a < m);
}

#[test]
fn nulls_are_dropped_on_load() {
    let root = JsonBackend
        .parse_string(r#"{"a":null,"b":[1,null,2]}"#)
        .unwrap();
    assert!(!root.has_key("a"));
    assert_eq!(root.get_list_size("b"), 2);
    assert_eq!(root.get_number(0.0, "b.1"), 2.0);
}

#[test]
fn long_strings_are_truncated_on_load() {
    let long = "x".repeat(300);
    let root = JsonBackend
        .parse_string(&format!(r#"{{"s":"{}"}}"#, long))
        .unwrap();
    assert_eq!(root.get_string("", "s").len(), 127);
}

#[test]
fn multibyte_strings_are_cut_at_a_char_boundary_on_load() {
    // 63 two-byte chars fill 126 bytes; the next one would cross 127
    let long = "é".repeat(100);
    let root = JsonBackend
        .parse_string(&format!(r#"{{"s":"{}"}}"#, long))
        .unwrap();
    assert_eq!(root.get_string("", "s"), "é".repeat(63));

    let root = YamlBackend.parse_string(&format!("s: {}\n", long)).unwrap();
    assert_eq!(root.get_string("", "s").len(), 126);
}

#[test]
fn negative_zero_keeps_its_sign() {
    let mut root = DataNode::default();
    root.set_number(Some("z"), -0.0);
    for backend in [&JsonBackend as &dyn Backend, &YamlBackend] {
        let text = backend.serialize(&root).unwrap();
        let back = backend.parse_string(&text).unwrap();
        let z = back.get_number(1.0, "z");
        assert_eq!(z, 0.0);
        assert!(z.is_sign_negative(), "{} lost the sign: {}", backend.name(), text);
    }
}

#[test]
fn non_finite_numbers_do_not_serialize_as_json() {
    let mut root = DataNode::default();
    root.set_number(Some("bad"), f64::NAN);
    assert!(matches!(
        JsonBackend.serialize(&root),
        Err(DataError::Serialize { backend: "json", .. })
    ));
    assert!(BackendRegistry::default().serialize(&root).is_none());
}

#[test]
fn yaml_round_trip_and_serialize_as() {
    let reg = BackendRegistry::default();
    let mut root = reg.create_empty();
    root.set_string(Some("name"), "arm");
    let joints = root.add_list(Some("joints")).unwrap();
    joints.set_number(None, 1.0);
    joints.set_number(None, 0.25);
    let out = reg.serialize_as(&root, "yaml").unwrap();
    assert!(out.contains("name: arm"));
    let back = YamlBackend.parse_string(&out).unwrap();
    assert_eq!(back, root);
    assert!(reg.serialize_as(&root, "toml").is_err());
}

#[test]
fn yaml_keys_and_tags() {
    let root = YamlBackend
        .parse_string("1: one\ntrue: yes\ntagged: !custom 5\n")
        .unwrap();
    assert_eq!(root.get_string("", dataio_core::data_path!("1")), "one");
    assert_eq!(root.get_string("", "true"), "yes");
    assert_eq!(root.get_number(0.0, "tagged"), 5.0);
}

#[test]
fn load_storage_by_name_and_extension() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("robot.json"), r#"{"joints":3}"#).unwrap();
    fs::write(dir.path().join("limits.yml"), "max: 2.5\n").unwrap();
    let reg = registry_at(dir.path());

    let robot = reg.load_storage("robot").expect("load by entry name");
    assert_eq!(robot.get_number(0.0, "joints"), 3.0);
    let robot = reg.load_storage("robot.json").expect("load by file name");
    assert_eq!(robot.get_number(0.0, "joints"), 3.0);
    let limits = reg.load_storage("limits").expect("yaml entry");
    assert_eq!(limits.get_number(0.0, "max"), 2.5);

    assert!(reg.load_storage("missing").is_none());
    assert!(matches!(
        reg.try_load_storage("missing"),
        Err(DataError::PathNotFound(_))
    ));
}

#[test]
fn base_path_can_be_overridden() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    fs::write(a.path().join("cfg.json"), r#"{"from":"a"}"#).unwrap();
    fs::write(b.path().join("cfg.json"), r#"{"from":"b"}"#).unwrap();
    let mut reg = registry_at(a.path());
    assert_eq!(reg.load_storage("cfg").unwrap().get_string("", "from"), "a");
    reg.set_base_storage_path(b.path());
    assert_eq!(reg.base_storage_path(), b.path());
    assert_eq!(reg.load_storage("cfg").unwrap().get_string("", "from"), "b");
    // absolute paths ignore the base
    let abs = a.path().join("cfg.json");
    assert_eq!(reg.load_storage(&abs).unwrap().get_string("", "from"), "a");
}

#[test]
fn unknown_extension_is_backend_unavailable() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    let reg = registry_at(dir.path());
    assert!(matches!(
        reg.try_load_storage("notes.txt"),
        Err(DataError::BackendUnavailable(_))
    ));
}

#[test]
fn list_entries_reports_loadable_stems() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.json"), "{}").unwrap();
    fs::write(dir.path().join("b.yaml"), "k: 1\n").unwrap();
    fs::write(dir.path().join("c.YML"), "k: 2\n").unwrap();
    fs::write(dir.path().join("ignored.txt"), "").unwrap();
    fs::create_dir(dir.path().join("sub.json")).unwrap();
    let reg = registry_at(dir.path());
    let mut names = reg.list_entries("");
    names.sort();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn list_entries_missing_dir_is_empty() {
    let dir = tempdir().unwrap();
    let reg = registry_at(dir.path());
    assert!(reg.list_entries("nowhere").is_empty());
    assert!(reg.try_list_entries("nowhere").unwrap().is_empty());
}

#[test]
fn load_directory_as_level() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("configs");
    fs::create_dir(&cfg).unwrap();
    fs::write(cfg.join("motor.json"), r#"{"kp":1.5}"#).unwrap();
    fs::write(cfg.join("sensor.yaml"), "rate: 100\n").unwrap();
    fs::write(cfg.join("broken.json"), "{oops").unwrap();
    let reg = registry_at(dir.path());
    let root = reg.load_storage("configs").expect("directory load");
    assert_eq!(root.get_number(0.0, "motor.kp"), 1.5);
    assert_eq!(root.get_number(0.0, "sensor.rate"), 100.0);
    assert!(!root.has_key("broken"));
    assert_eq!(root.kind(), NodeKind::Level);
}

#[test]
fn save_storage_picks_backend_by_extension() {
    let dir = tempdir().unwrap();
    let reg = registry_at(dir.path());
    let mut root = reg.create_empty();
    root.set_number(Some("port"), 8080.0);

    let json = reg.save_storage(&root, "out/app").unwrap();
    assert_eq!(json, dir.path().join("out/app.json"));
    let yaml = reg.save_storage(&root, "out/app.yaml").unwrap();
    assert!(fs::read_to_string(&yaml).unwrap().contains("port: 8080"));
    assert!(reg.save_storage(&root, "out/app.ini").is_err());

    assert_eq!(reg.load_storage("out/app").unwrap(), root);
    let mut names = reg.list_entries("out");
    names.sort();
    assert_eq!(names, vec!["app"]);
}

#[test]
fn custom_backend_registration() {
    struct Upper;
    impl Backend for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }
        fn extensions(&self) -> &'static [&'static str] {
            &["up"]
        }
        fn sniff(&self, text: &str) -> bool {
            text.starts_with("UP:")
        }
        fn parse_string(&self, text: &str) -> dataio_core::Result<DataNode> {
            let mut root = DataNode::default();
            root.try_insert(Some("value"), DataNode::string(&text[3..])?)?;
            Ok(root)
        }
        fn serialize(&self, data: &DataNode) -> dataio_core::Result<String> {
            Ok(format!("UP:{}", data.get_string("", "value").to_uppercase()))
        }
    }

    let mut reg = BackendRegistry::new(StorageConfig::default());
    assert!(reg.load_string("UP:hi").is_none());
    reg.register(Box::new(Upper));
    let root = reg.load_string("UP:hi").unwrap();
    assert_eq!(reg.serialize_as(&root, "upper").unwrap(), "UP:HI");
    assert_eq!(reg.backend_names(), vec!["upper"]);
    // default backend "json" is not registered here
    assert!(reg.serialize(&root).is_none());
}

#[test]
fn config_from_env_value_sets_base_path() {
    let cfg = StorageConfig::from_env_value(Some("/srv/data".into()));
    assert_eq!(cfg.base_path, std::path::PathBuf::from("/srv/data"));
    assert_eq!(cfg.default_backend, "json");

    assert_eq!(StorageConfig::from_env_value(None), StorageConfig::default());
    assert_eq!(
        StorageConfig::from_env_value(Some("".into())),
        StorageConfig::default()
    );
}
