//! Browser tests for the JS facade. Run with `wasm-pack test --headless`.

#![cfg(target_arch = "wasm32")]

use dungeon_layout_wasm::DungeonLayoutWasm;
use js_sys::Reflect;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn chain(dungeon: &mut DungeonLayoutWasm) {
    let start = dungeon.add_room(0, 255, 100.0);
    let mid = dungeon.add_room(1, 255, 100.0);
    let end = dungeon.add_room(4, 255, 100.0);
    dungeon.connect(start, mid).unwrap();
    dungeon.connect(mid, end).unwrap();
}

#[wasm_bindgen_test]
fn test_generate_returns_layout_object() {
    let mut dungeon = DungeonLayoutWasm::new(1);
    chain(&mut dungeon);

    let layout = dungeon.generate().unwrap();
    let corridors = Reflect::get(&layout, &JsValue::from_str("corridors")).unwrap();
    assert!(js_sys::Array::is_array(&corridors));
    assert_eq!(js_sys::Array::from(&corridors).length(), 2);

    let report = Reflect::get(&layout, &JsValue::from_str("report")).unwrap();
    let attempts = Reflect::get(&report, &JsValue::from_str("roomAttempts")).unwrap();
    assert!(attempts.as_f64().unwrap() >= 1.0);
}

#[wasm_bindgen_test]
fn test_partial_config_is_accepted() {
    let mut dungeon = DungeonLayoutWasm::new(1);
    let config = js_sys::Object::new();
    Reflect::set(&config, &"idealGap".into(), &JsValue::from_f64(35.0)).unwrap();
    dungeon.set_config(config.into()).unwrap();

    let current = dungeon.get_config().unwrap();
    let gap = Reflect::get(&current, &"idealGap".into()).unwrap();
    let width = Reflect::get(&current, &"corridorWidth".into()).unwrap();
    assert_eq!(gap.as_f64(), Some(35.0));
    assert_eq!(width.as_f64(), Some(2.0));
}

#[wasm_bindgen_test]
fn test_invalid_config_is_rejected() {
    let mut dungeon = DungeonLayoutWasm::new(1);
    let config = js_sys::Object::new();
    Reflect::set(&config, &"corridorWidth".into(), &JsValue::from_f64(0.0)).unwrap();
    let err = dungeon.set_config(config.into()).unwrap_err();
    assert!(err.as_string().unwrap().contains("corridorWidth"));
}

#[wasm_bindgen_test]
fn test_missing_start_room_is_an_error() {
    let mut dungeon = DungeonLayoutWasm::new(1);
    dungeon.add_room(1, 255, 100.0);
    let err = dungeon.generate().unwrap_err();
    assert_eq!(err.as_string().as_deref(), Some("room graph has no start room"));
}

#[wasm_bindgen_test]
fn test_duplicate_connection_is_an_error() {
    let mut dungeon = DungeonLayoutWasm::new(1);
    let a = dungeon.add_room(0, 255, 100.0);
    let b = dungeon.add_room(4, 255, 100.0);
    dungeon.connect(a, b).unwrap();
    assert!(dungeon.connect(b, a).is_err());
    assert!(dungeon.connect(a, a).is_err());
}

#[wasm_bindgen_test]
fn test_incremental_ticks_to_completion() {
    let mut dungeon = DungeonLayoutWasm::new(2);
    chain(&mut dungeon);
    dungeon.begin_incremental().unwrap();

    assert_eq!(dungeon.observed_positions().length(), 6);
    assert_eq!(dungeon.observed_room_ids().to_vec(), vec![0, 1, 2]);

    let mut done = false;
    for _ in 0..10_000 {
        if dungeon.tick(0.5) {
            done = true;
            break;
        }
    }
    assert!(done);
    assert_eq!(dungeon.phase(), "converged");
    assert!(!dungeon.last_layout().unwrap().is_undefined());
}

#[wasm_bindgen_test]
fn test_catalog_footprints_are_used() {
    let mut dungeon = DungeonLayoutWasm::new(4);
    let catalog: JsValue = js_sys::JSON::parse(
        r#"[
            {"kind": "start", "footprint": {"name": "gate", "width": 20, "height": 12}},
            {"kind": "end", "footprint": {"name": "vault", "width": 8, "height": 8}}
        ]"#,
    )
    .unwrap();
    dungeon.set_catalog(catalog).unwrap();

    let start = dungeon.add_room(0, 255, 100.0);
    let end = dungeon.add_room(4, 255, 100.0);
    dungeon.connect(start, end).unwrap();
    let layout = dungeon.generate().unwrap();

    let report = Reflect::get(&layout, &"report".into()).unwrap();
    let warnings = Reflect::get(&report, &"warnings".into()).unwrap();
    assert_eq!(js_sys::Array::from(&warnings).length(), 0);
}
