//! Loading from disk and rendering loaded dictionaries.

use std::fs;
use std::path::Path;

use vxconfig::{Config, Dictionary, EngineError, EntryValue, Lookup, Lookups};

const SAMPLE: &str = r#"
// model settings
model    = "GFS";
n_levels = 3;
scale    = 0.5 * n_levels;
enabled  = TRUE;

cat_thresh = [ >0, >=5&&<10, NA ];
levels     = [ 850, 700, 500 ];
weights    = [ -1.5, 2.0 ];

/* nested */
fcst = {
   field = [
      { name = "TMP"; level = [ "P850" ]; },
      { name = "HGT"; level = [ "P500" ]; }
   ];
   thresh = ge273.15;
};

ramp = ( (0, 0.0) (10, 1.0) );
"#;

fn load_ok(source: &str) -> Config {
    let mut config = Config::new();
    if let Err(err) = config.read_string("config", source) {
        panic!("load failed:\n{err}");
    }
    config
}

fn write_file(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn test_read_layered_files() {
    let dir = tempfile::tempdir().unwrap();
    let defaults = write_file(dir.path(), "default.conf", SAMPLE);
    let user = write_file(
        dir.path(),
        "user.conf",
        "model = \"ECMWF\";\nfcst = { thresh = gt280; };\n",
    );

    let mut config = Config::new();
    config.read(&defaults).unwrap();
    config.read(&user).unwrap();

    assert_eq!(
        config.lookup_string("model", Lookup::Required).unwrap().as_deref(),
        Some("ECMWF")
    );
    assert_eq!(
        config.lookup_thresh("fcst.thresh", Lookup::Required).unwrap().unwrap().get_str(),
        ">280"
    );
    // untouched members of the merged dictionary survive
    let fields = config
        .lookup_dictionary_array("fcst.field", Lookup::Required)
        .unwrap()
        .unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(
        fields[1].lookup_string("name", Lookup::Required).unwrap().as_deref(),
        Some("HGT")
    );
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.conf");
    let mut config = Config::new();
    let err = config.read(&missing).unwrap_err();
    assert!(matches!(&err, EngineError::Io { path, .. } if path == &missing));
    assert!(err.to_string().contains("absent.conf"));
}

// =============================================================================
// Dumps
// =============================================================================

#[test]
fn test_config_dump_reparses_to_same_entries() {
    let original = load_ok(SAMPLE).into_dictionary();
    let text = original.dump_config_format();
    let reparsed = load_ok(&text).into_dictionary();
    assert_eq!(reparsed, original, "dump was:\n{text}");
}

#[test]
fn test_user_functions_dump_as_comments() {
    let dict = load_ok("f(a, b) = a + b;\nx = 1;").into_dictionary();
    let text = dict.dump_config_format();
    assert_eq!(text, "/* f: user function (2 args) */\nx = 1;\n");
    let reparsed = load_ok(&text).into_dictionary();
    assert_eq!(reparsed.len(), 1);
}

#[test]
fn test_debug_dump_names_types() {
    let dict = load_ok("t = >=5;\nd = { s = \"a\"; };").into_dictionary();
    let dump = dict.dump();
    assert!(dump.contains("Type  = ThresholdType"));
    assert!(dump.contains("string = >=5"));
    assert!(dump.contains("Type  = DictionaryType"));
    assert!(dump.contains("String Value = \"a\""));
}

#[test]
fn test_json_output() {
    let dict: Dictionary = load_ok(SAMPLE).into_dictionary();
    let json = serde_json::to_value(&dict).unwrap();

    assert_eq!(json["model"], "GFS");
    assert_eq!(json["n_levels"], 3);
    assert_eq!(json["scale"], 1.5);
    assert_eq!(json["enabled"], true);
    assert_eq!(json["cat_thresh"], serde_json::json!([">0", ">=5&&<10", "NA"]));
    assert_eq!(json["levels"], serde_json::json!([850, 700, 500]));
    assert_eq!(json["fcst"]["field"][0]["name"], "TMP");
    assert_eq!(json["fcst"]["thresh"], ">=273.15");
    assert_eq!(json["ramp"]["points"], serde_json::json!([[0.0, 0.0], [10.0, 1.0]]));
}

#[test]
fn test_entries_keep_source_order() {
    let dict = load_ok("b = 1; a = 2; c = 3; a = 4;").into_dictionary();
    let names: Vec<&str> = dict.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["b", "a", "c"]);
    assert_eq!(dict.get("a").map(|e| &e.value), Some(&EntryValue::Int(4)));
}
