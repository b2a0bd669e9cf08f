//! The cached JSON read path.

mod common;

use std::fs;
use std::sync::Arc;

use common::{fixture, fixture_with, params};
use modelsql_core::errors::{EngineError, ExecError};
use modelsql_core::types::ParamMap;
use modelsql_engine::Engine;
use modelsql_params::{NamedValue, NamedValues};
use modelsql_storage::statement::sqlite_error;
use serde_json::{json, Value as JsonValue};

fn as_json(bytes: &[u8]) -> JsonValue {
    serde_json::from_slice(bytes).unwrap()
}

fn rename_ann(engine: &Engine, to: &str) {
    engine
        .databases()
        .get("main")
        .unwrap()
        .with_writer(|c| {
            c.execute("UPDATE users SET name = ?1 WHERE id = 'u1'", [to])
                .map_err(sqlite_error)
        })
        .unwrap();
}

#[test]
fn test_select_json_shape() {
    let fx = fixture();
    let bytes = fx
        .engine
        .query_json("biz/demo", "list", &params(json!({"minage": 18})))
        .unwrap();
    assert_eq!(
        as_json(&bytes),
        json!([
            {"age": 30, "id": "u1", "name": "ann"},
            {"age": 45, "id": "u3", "name": "cy"}
        ])
    );
}

#[test]
fn test_cached_group_serves_repeat_calls_from_cache() {
    let fx = fixture();
    let p = params(json!({"minage": 18}));
    let first = fx.engine.query_json("biz/demo", "list", &p).unwrap();
    assert_eq!(fx.engine.stats().cached_results, 1);

    rename_ann(&fx.engine, "anna");
    let second = fx.engine.query_json("biz/demo", "list", &p).unwrap();
    assert_eq!(first, second, "second call must not hit the database");
    assert_eq!(as_json(&second)[0]["name"], "ann");

    let direct = fx.engine.select("biz/demo", "list", &p).unwrap();
    assert_eq!(direct[0]["name"].as_str(), Some("anna"));
}

#[test]
fn test_other_parameters_bypass_the_cached_slot() {
    let fx = fixture();
    fx.engine
        .query_json("biz/demo", "list", &params(json!({"minage": 18})))
        .unwrap();

    let other = fx
        .engine
        .query_json("biz/demo", "list", &params(json!({"minage": 40})))
        .unwrap();
    assert_eq!(as_json(&other), json!([{"age": 45, "id": "u3", "name": "cy"}]));
    assert_eq!(fx.engine.stats().cached_results, 1);

    rename_ann(&fx.engine, "anna");
    let again = fx
        .engine
        .query_json("biz/demo", "list", &params(json!({"minage": 18})))
        .unwrap();
    assert_eq!(as_json(&again)[0]["name"], "ann");
}

#[test]
fn test_empty_results_are_fixed_and_uncached() {
    let fx = fixture();
    let empty = fx
        .engine
        .query_json("biz/demo", "list", &params(json!({"minage": 150})))
        .unwrap();
    assert_eq!(&*empty, b"[]");

    let page = fx
        .engine
        .query_json("biz/demo", "page", &params(json!({"city": "lima", "size": 5})))
        .unwrap();
    assert_eq!(&*page, br#"{"total":0,"data":[]}"#);
    assert_eq!(fx.engine.stats().cached_results, 0);
}

#[test]
fn test_paging_and_multi_json() {
    let fx = fixture();
    let page = fx
        .engine
        .query_json("biz/demo", "page", &params(json!({"city": "oslo", "size": 5})))
        .unwrap();
    assert_eq!(
        as_json(&page),
        json!({"total": 2, "data": [{"id": "u1", "name": "ann"}, {"id": "u3", "name": "cy"}]})
    );

    let multi = fx
        .engine
        .query_json("biz/demo", "overview", &ParamMap::new())
        .unwrap();
    assert_eq!(
        as_json(&multi),
        json!({"data1": [{"n": 0}], "users": [{"id": "u1"}, {"id": "u2"}, {"id": "u3"}]})
    );
    assert_eq!(fx.engine.stats().cached_results, 2);
}

#[test]
fn test_uncached_group_is_never_stored() {
    let fx = fixture();
    fx.engine
        .query_json("biz/demo", "bycity", &ParamMap::new())
        .unwrap();
    assert_eq!(fx.engine.stats().cached_results, 0);
}

#[test]
fn test_global_switch_disables_result_cache() {
    let fx = fixture_with(|config| config.cache.enabled = false);
    fx.engine
        .query_json("biz/demo", "list", &params(json!({"minage": 1})))
        .unwrap();
    assert_eq!(fx.engine.stats().cached_results, 0);
}

#[test]
fn test_json_path_rejects_write_groups() {
    let fx = fixture();
    let err = fx
        .engine
        .query_json("biz/demo", "add", &params(json!({"name": "x"})))
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Exec(ExecError::TypeMismatch { expected: "read", .. })
    ));
    assert!(fx.engine.select("biz/demo", "profile", &params(json!({"id": "x"}))).unwrap().is_empty());
}

#[test]
fn test_refresh_and_reload_invalidate_cached_results() {
    let fx = fixture();
    let p = params(json!({"minage": 18}));
    fx.engine.query_json("biz/demo", "list", &p).unwrap();
    fx.engine.query_json("biz/demo", "overview", &ParamMap::new()).unwrap();
    assert_eq!(fx.engine.stats().cached_results, 2);

    let path = fx.dir.path().join("demo.msql");
    fs::write(&path, fs::read_to_string(&path).unwrap() + "\n").unwrap();
    let id_path = fx.dir.path().join("demo");
    let key = fx.engine.reload_model(id_path.to_str().unwrap()).unwrap();
    assert_eq!(key, "biz/demo");
    assert_eq!(fx.engine.stats().cached_results, 0);

    fx.engine.query_json("biz/demo", "list", &p).unwrap();
    assert_eq!(fx.engine.stats().cached_results, 1);
    assert_eq!(fx.engine.reload_all(), 1);
    assert_eq!(fx.engine.stats().cached_results, 0);
}

#[test]
fn test_group_ids_with_slashes_cannot_share_cache_keys() {
    let fx = fixture();
    let nested = fx.dir.path().join("a");
    fs::create_dir(&nested).unwrap();
    fs::write(
        fx.dir.path().join("a.msql"),
        r#"<model id="a"><sql id="x/y" type="select" cached="true"><cmd>SELECT 'from-a' AS v</cmd></sql></model>"#,
    )
    .unwrap();
    fs::write(
        nested.join("x.msql"),
        r#"<model id="x"><sql id="y" type="select" cached="true"><cmd>SELECT 'from-ax' AS v</cmd></sql></model>"#,
    )
    .unwrap();
    fx.engine.reload_all();

    assert!(fx.engine.registry().model("biz/a").is_none());
    let err = fx.engine.query_json("biz/a", "x/y", &ParamMap::new()).unwrap_err();
    assert_eq!(err.error_code(), "MODEL_NOT_FOUND");

    let bytes = fx.engine.query_json("biz/a/x", "y", &ParamMap::new()).unwrap();
    assert_eq!(as_json(&bytes), json!([{"v": "from-ax"}]));
}

#[test]
fn test_reload_during_query_does_not_cache_old_result() {
    let fx = fixture();
    let path = fx.dir.path().join("hot.msql");
    fs::write(
        &path,
        r#"<model id="hot"><sql id="q" type="select" cached="true">
             <cmd>SELECT 'v1' AS v, :h AS h
               <parameters><parameter name="h" default="reload_hot_model"/></parameters>
             </cmd></sql></model>"#,
    )
    .unwrap();
    fx.engine.reload_all();

    let registry = Arc::clone(fx.engine.registry());
    let id_path = fx.dir.path().join("hot").display().to_string();
    let rewrite = path.clone();
    NamedValues::global()
        .register(
            "reload_hot_model",
            NamedValue::function(0, move |_| {
                fs::write(
                    &rewrite,
                    r#"<model id="hot"><sql id="q" type="select" cached="true"><cmd>SELECT 'v2' AS v</cmd></sql></model>"#,
                )
                .unwrap();
                registry.reload_model(&id_path).unwrap();
                vec![json!(1)]
            }),
        )
        .unwrap();

    let first = fx.engine.query_json("biz/hot", "q", &ParamMap::new()).unwrap();
    assert_eq!(as_json(&first), json!([{"h": 1, "v": "v1"}]));
    assert_eq!(fx.engine.stats().cached_results, 0);

    let second = fx.engine.query_json("biz/hot", "q", &ParamMap::new()).unwrap();
    assert_eq!(as_json(&second), json!([{"v": "v2"}]));
    assert_eq!(fx.engine.stats().cached_results, 1);

    NamedValues::global().unregister("reload_hot_model");
}
