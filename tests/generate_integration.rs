use std::path::Path;
use std::process::{Command, Output};

const ROOT: &str = r#"
tileset:
  name: Fixture
  version: 1.0.0
  description: Two layers sharing a mapping file.
  attribution: '&copy; OpenStreetMap contributors'
  languages: [en, de]
  layers:
    - layers/poi/poi.yaml
    - layers/shop/shop.yaml
"#;

const POI_LAYER: &str = r#"
layer:
  id: poi
  description: Points of interest.
  buffer_size: 64
  fields:
    name: Name of the point.
    class:
      description: Coarse category.
      values:
        food:
          amenity: [cafe, restaurant]
        shop:
          shop: []
    rank: {description: Rank within its tile.}
datasources:
  - type: imposm3
    mapping_file: ./mapping.yaml
"#;

const SHOP_LAYER: &str = r#"
layer:
  id: shop
  description: Shops.
  buffer_size: 4
  fields:
    type:
      description: Shop type.
      values: ["supermarket (large)", bakery]
datasources:
  - type: imposm3
    mapping_file: ../poi/mapping.yaml
  - type: postgis
    file: ./shop.sql
"#;

const MAPPING: &str = r#"
def_name: &name
  type: string
  name: name
  key: name
tables:
  poi_point:
    type: point
    mapping:
      amenity: [cafe, restaurant]
      shop: [__any__]
    columns:
      - {type: id, name: osm_id}
      - {type: geometry, name: geometry}
      - *name
      - {type: mapping_key, name: mapping_key}
      - {type: mapping_value, name: subclass}
  poi_polygon:
    type: polygon
    mapping:
      amenity: [cafe, restaurant]
    filters:
      reject:
        building: [no]
    columns:
      - *name
      - {type: integer, name: layer, key: layer}
"#;

fn write_schema(root: &Path, mapping: &str) {
    let files = [
        ("openmaptiles.yaml", ROOT),
        ("layers/poi/poi.yaml", POI_LAYER),
        ("layers/poi/mapping.yaml", mapping),
        ("layers/shop/shop.yaml", SHOP_LAYER),
    ];
    for (name, contents) in files {
        let path = root.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
}

fn generate(schema: &Path, output: &Path, format: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tilegen"))
        .arg("--schema-dir")
        .arg(schema)
        .arg("--output")
        .arg(output)
        .arg("--format")
        .arg(format)
        .arg("--verbose")
        .output()
        .expect("failed to execute process")
}

#[test]
fn generates_rust_modules_deterministically() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("schema");
    write_schema(&schema, MAPPING);

    let first = dir.path().join("first");
    let second = dir.path().join("second");
    assert!(generate(&schema, &first, "rust").status.success());
    assert!(generate(&schema, &second, "rust").status.success());

    for name in ["schema.rs", "tables.rs"] {
        let a = std::fs::read_to_string(first.join(name)).unwrap();
        let b = std::fs::read_to_string(second.join(name)).unwrap();
        assert_eq!(a, b, "{name} differs between runs");
    }

    let schema_rs = std::fs::read_to_string(first.join("schema.rs")).unwrap();
    assert!(schema_rs.contains(r#"pub const LAYERS: &[&str] = &["poi", "shop"];"#));
    assert!(schema_rs.contains(r#"pub const TYPE_SUPERMARKET: &str = "supermarket";"#));
    assert!(schema_rs.contains(r#"("shop", match_field("shop")),"#));

    let tables_rs = std::fs::read_to_string(first.join("tables.rs")).unwrap();
    assert!(tables_rs.contains("pub struct OsmPoiPoint {"));
    assert!(tables_rs.contains("pub struct OsmPoiPolygon {"));
    assert!(tables_rs.contains(r#"not(match_any("building", ["no"]))"#));
    assert!(tables_rs.contains("pub trait WithSubclass {"));
    assert!(tables_rs.contains("pub trait OsmPoiPolygonHandler {"));
    assert!(tables_rs.contains("pub fn dispatch_map<'a>("));
}

#[test]
fn switching_format_replaces_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("schema");
    write_schema(&schema, MAPPING);
    let output = dir.path().join("out");

    assert!(generate(&schema, &output, "rust").status.success());
    assert!(generate(&schema, &output, "json").status.success());

    let names: Vec<String> = std::fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["schema.json"]);
}

#[test]
fn json_manifest_lists_layers_and_tables() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("schema");
    write_schema(&schema, MAPPING);
    let output = dir.path().join("out");

    let result = generate(&schema, &output, "json");
    assert!(result.status.success());

    let text = std::fs::read_to_string(output.join("schema.json")).unwrap();
    let manifest: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(manifest["tileset"]["name"], "Fixture");
    assert_eq!(manifest["layers"][1]["fields"][0]["allowed_values"][0], "supermarket");

    let tables = manifest["tables"].as_array().unwrap();
    let names: Vec<&str> = tables
        .iter()
        .map(|t| t["table_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["osm_poi_point", "osm_poi_polygon"]);
    assert_eq!(manifest["row_index"].as_array().unwrap().len(), 2);
    assert_eq!(manifest["field_types"]["layer"], "Integer");
}

#[test]
fn conflicting_schema_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("schema");
    let broken = MAPPING.replace(
        "{type: integer, name: layer, key: layer}",
        "{type: integer, name: subclass, key: layer}",
    );
    write_schema(&schema, &broken);
    let output = dir.path().join("out");

    let result = generate(&schema, &output, "rust");
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("subclass"), "{stderr}");
    assert!(!output.exists());

    // an earlier good run survives a failing one
    write_schema(&schema, MAPPING);
    assert!(generate(&schema, &output, "rust").status.success());
    write_schema(&schema, &broken);
    assert!(!generate(&schema, &output, "rust").status.success());
    assert!(output.join("tables.rs").exists());
}

#[test]
fn missing_schema_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");
    let result = generate(&dir.path().join("nowhere"), &output, "rust");
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("Crawl"));
    assert!(!output.exists());
}
