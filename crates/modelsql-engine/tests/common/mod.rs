//! Shared fixture: a temporary definition root with one model, an
//! in-memory `main` database and an engine over both.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use modelsql_core::errors::ExecError;
use modelsql_core::types::ParamMap;
use modelsql_core::ModelSqlConfig;
use modelsql_engine::Engine;
use modelsql_storage::statement::sqlite_error;
use serde_json::Value as JsonValue;
use tempfile::TempDir;

pub const SCHEMA: &str = "
    CREATE TABLE users(
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        age INTEGER,
        city TEXT,
        active BOOLEAN,
        joined DATETIME
    );
    CREATE TABLE orders(
        id INTEGER PRIMARY KEY,
        user_id TEXT NOT NULL,
        total REAL NOT NULL CHECK (total >= 0)
    );
    CREATE TABLE lines(
        order_id INTEGER NOT NULL,
        sku TEXT NOT NULL
    );
    INSERT INTO users VALUES ('u1', 'ann', 30, 'oslo', 1, '2024-01-02 03:04:05');
    INSERT INTO users VALUES ('u2', 'bob', 17, 'rome', 0, NULL);
    INSERT INTO users VALUES ('u3', 'cy', 45, 'oslo', 1, NULL);
";

pub const DEMO: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<model id="demo" database="main">
  <sql id="list" type="select" cached="true" cachetime="10">
    <cmd><![CDATA[SELECT id, name, age FROM users WHERE age >= :minage ORDER BY id]]>
      <parameters>
        <parameter name="minage" type="int" required="true" range="0:150"/>
      </parameters>
    </cmd>
  </sql>
  <sql id="bycity" type="select">
    <cmd>SELECT name FROM users WHERE (:city IS NULL OR city = :city) ORDER BY id
      <parameters>
        <parameter name="city" type="string" len="2:20"/>
      </parameters>
    </cmd>
  </sql>
  <sql id="profile" type="select">
    <cmd>SELECT id, active, joined FROM users WHERE id = :id</cmd>
  </sql>
  <sql id="tree" type="nestedselect" idfield="id" pidfield="parent">
    <cmd>SELECT id, name FROM users ORDER BY id</cmd>
  </sql>
  <sql id="page" type="pagingselect" cached="true">
    <cmd>SELECT COUNT(*) FROM users WHERE city = :city</cmd>
    <cmd>SELECT id, name FROM users WHERE city = :city ORDER BY id LIMIT :size</cmd>
  </sql>
  <sql id="badpage" type="pagingselect">
    <cmd>SELECT age FROM users</cmd>
    <cmd>SELECT id FROM users</cmd>
  </sql>
  <sql id="emptypage" type="pagingselect">
    <cmd>SELECT age FROM users WHERE age > 1000</cmd>
    <cmd>SELECT id FROM users</cmd>
  </sql>
  <sql id="overview" type="multiselect" cached="true">
    <cmd out="users">SELECT id FROM users ORDER BY id</cmd>
    <cmd>SELECT COUNT(*) AS n FROM orders</cmd>
  </sql>
  <sql id="add" type="insert">
    <cmd>INSERT INTO users(id, name, age) VALUES (:id, :name, :age)
      <parameters>
        <parameter name="id" default="uuid" return="true"/>
        <parameter name="name" type="string" required="true" len="1:32"/>
        <parameter name="age" type="int" range="0:150"/>
      </parameters>
    </cmd>
  </sql>
  <sql id="addwithorder" type="exec">
    <cmd>INSERT INTO users(id, name) VALUES (:uid, :name)</cmd>
    <cmd>INSERT INTO orders(user_id, total) VALUES (:uid, :total)</cmd>
  </sql>
  <sql id="bulk" type="batchinsert">
    <cmd>INSERT INTO orders(user_id, total) VALUES (:uid, :total)
      <parameters>
        <parameter name="uid" type="string" required="true"/>
        <parameter name="total" type="float" range="0:"/>
      </parameters>
    </cmd>
  </sql>
  <sql id="bulkeach" type="batchinsert" eachtran="true">
    <cmd>INSERT INTO orders(id, user_id, total) VALUES (:id, :uid, :total)
      <parameters>
        <parameter name="id" default="intid" return="true"/>
      </parameters>
    </cmd>
  </sql>
  <sql id="complex" type="batchcomplex">
    <cmd in="orders">INSERT INTO orders(id, user_id, total) VALUES (:id, :uid, :total)
      <parameters>
        <parameter name="id" default="intid" return="true"/>
      </parameters>
    </cmd>
    <cmd in="lines">INSERT INTO lines(order_id, sku) VALUES (:order, :sku)</cmd>
  </sql>
  <sql id="exportall" type="export"/>
</model>
"#;

pub struct Fixture {
    pub dir: TempDir,
    pub engine: Engine,
}

pub fn config(root: &Path) -> ModelSqlConfig {
    let mut config = ModelSqlConfig::default();
    config.registry.roots.insert("biz".into(), root.to_path_buf());
    config.cache.enabled = true;
    config
}

/// `demo.msql` under a fresh root, engine loaded, schema seeded.
pub fn fixture() -> Fixture {
    fixture_with(|_| {})
}

pub fn fixture_with(adjust: impl FnOnce(&mut ModelSqlConfig)) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("demo.msql"), DEMO).unwrap();
    let mut config = config(dir.path());
    adjust(&mut config);
    let engine = Engine::new(&config).unwrap();
    engine
        .databases()
        .get("main")
        .unwrap()
        .with_writer(|c| c.execute_batch(SCHEMA).map_err(sqlite_error))
        .unwrap();
    Fixture { dir, engine }
}

pub fn params(value: JsonValue) -> ParamMap {
    match value {
        JsonValue::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn count(engine: &Engine, sql: &str) -> i64 {
    engine
        .databases()
        .get("main")
        .unwrap()
        .with_reader(|c| c.query_row(sql, [], |r| r.get(0)).map_err(sqlite_error))
        .unwrap()
}

pub fn is_sqlite_error(err: &ExecError) -> bool {
    matches!(err, ExecError::SqliteError { .. })
}
