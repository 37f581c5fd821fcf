mod common;

use kalog::model::DatabaseError;
use kalog::model::entity::{SettingValue, Settings};

use crate::common::setup_test_db;

#[tokio::test]
async fn settings_round_trip_test() {
    let db = setup_test_db().await;

    Settings::set(db.mm(), "x", 5).await.unwrap();
    Settings::set(db.mm(), "y", 2.5).await.unwrap();
    Settings::set(db.mm(), "language", "en").await.unwrap();

    assert_eq!(Settings::get(db.mm(), "x").await.unwrap(), SettingValue::Int(5));
    assert_eq!(Settings::get(db.mm(), "y").await.unwrap(), SettingValue::Float(2.5));
    assert_eq!(
        Settings::get(db.mm(), "language").await.unwrap(),
        SettingValue::Text(String::from("en"))
    );
}

#[tokio::test]
async fn settings_stored_representation_test() {
    let db = setup_test_db().await;

    let setting = Settings::set(db.mm(), "x", 5).await.unwrap();
    assert_eq!(setting.raw_value(), "5");
    assert_eq!(setting.datatype(), "int");

    let setting = Settings::set(db.mm(), "y", 2.5).await.unwrap();
    assert_eq!(setting.raw_value(), "2.5");
    assert_eq!(setting.datatype(), "float");
}

#[tokio::test]
async fn settings_missing_is_empty_string_test() {
    let db = setup_test_db().await;

    let value = Settings::get(db.mm(), "nope").await.unwrap();
    assert_eq!(value, SettingValue::Text(String::new()));
    assert!(Settings::find(db.mm(), "nope").await.unwrap().is_none());
}

#[tokio::test]
async fn settings_set_overwrites_test() {
    let db = setup_test_db().await;

    Settings::set(db.mm(), "x", 5).await.unwrap();
    Settings::set(db.mm(), "x", "five").await.unwrap();

    assert_eq!(
        Settings::get(db.mm(), "x").await.unwrap(),
        SettingValue::Text(String::from("five"))
    );

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE name = 'x'")
        .fetch_one(db.mm().executor())
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn settings_malformed_value_test() {
    let db = setup_test_db().await;

    sqlx::query("INSERT INTO settings (name, value, datatype) VALUES ('broken', 'abc', 'int')")
        .execute(db.mm().executor())
        .await
        .unwrap();

    let result = Settings::get(db.mm(), "broken").await;
    assert!(matches!(result, Err(DatabaseError::InvalidSetting { .. })));
}

#[tokio::test]
async fn settings_unknown_tag_reads_as_text_test() {
    let db = setup_test_db().await;

    sqlx::query("INSERT INTO settings (name, value, datatype) VALUES ('flag', 'True', 'bool')")
        .execute(db.mm().executor())
        .await
        .unwrap();

    assert_eq!(
        Settings::get(db.mm(), "flag").await.unwrap(),
        SettingValue::Text(String::from("True"))
    );
}

#[tokio::test]
async fn settings_delete_test() {
    let db = setup_test_db().await;

    Settings::set(db.mm(), "x", 5).await.unwrap();
    assert!(Settings::delete(db.mm(), "x").await.unwrap());
    assert!(!Settings::delete(db.mm(), "x").await.unwrap());
    assert_eq!(Settings::get(db.mm(), "x").await.unwrap(), SettingValue::default());
}
