use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::model::{
    ModelManager,
    error::{DatabaseError, DatabaseResult},
};

/// Typed value held by a settings row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "datatype", content = "value", rename_all = "snake_case")]
pub enum SettingValue {
    Int(i64),
    Float(f64),
    #[serde(rename = "str")]
    Text(String),
}

impl SettingValue {
    pub fn datatype(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "str",
        }
    }

    /// Parses a stored value according to its tag. Unknown tags read as text.
    pub fn decode(datatype: &str, value: &str) -> Option<Self> {
        match datatype {
            "int" => value.trim().parse().ok().map(Self::Int),
            "float" => value.trim().parse().ok().map(Self::Float),
            _ => Some(Self::Text(value.to_string())),
        }
    }

    /// Best guess at the type of free-form input: integer, then float, then text.
    pub fn infer(raw: &str) -> Self {
        if let Ok(int) = raw.parse() {
            return Self::Int(int);
        }
        if let Ok(float) = raw.parse() {
            return Self::Float(float);
        }
        Self::Text(raw.to_string())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl Default for SettingValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Raw settings row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Settings {
    name: String,
    value: String,
    datatype: String,
}

impl Settings {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_value(&self) -> &str {
        &self.value
    }

    pub fn datatype(&self) -> &str {
        &self.datatype
    }

    pub fn value(&self) -> DatabaseResult<SettingValue> {
        SettingValue::decode(&self.datatype, &self.value).ok_or_else(|| {
            DatabaseError::InvalidSetting {
                name: self.name.clone(),
                datatype: self.datatype.clone(),
                value: self.value.clone(),
            }
        })
    }

    /// Stores `value` under `name`, replacing any previous value.
    #[tracing::instrument(skip(mm, value))]
    pub async fn set(
        mm: &ModelManager,
        name: &str,
        value: impl Into<SettingValue>,
    ) -> DatabaseResult<Self> {
        let value: SettingValue = value.into();
        tracing::debug!("storing {} setting {}", value.datatype(), name);

        let row = sqlx::query_as(
            r#"
            INSERT INTO settings (name, value, datatype) VALUES (?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET value = excluded.value, datatype = excluded.datatype
            RETURNING name, value, datatype
            "#,
        )
        .bind(name)
        .bind(value.to_string())
        .bind(value.datatype())
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    /// Value stored under `name`. A missing setting reads as an empty string.
    pub async fn get(mm: &ModelManager, name: &str) -> DatabaseResult<SettingValue> {
        match Self::find(mm, name).await? {
            Some(setting) => setting.value(),
            None => Ok(SettingValue::default()),
        }
    }

    pub async fn find(mm: &ModelManager, name: &str) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM settings WHERE name = ?")
            .bind(name)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn delete(mm: &ModelManager, name: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM settings WHERE name = ?")
            .bind(name)
            .execute(mm.executor())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn datatype_tags() {
        assert_eq!(SettingValue::from(5).datatype(), "int");
        assert_eq!(SettingValue::from(2.5).datatype(), "float");
        assert_eq!(SettingValue::from("x").datatype(), "str");
    }

    #[test]
    fn decode_by_tag() {
        assert_eq!(SettingValue::decode("int", "5"), Some(SettingValue::Int(5)));
        assert_eq!(SettingValue::decode("float", "2.5"), Some(SettingValue::Float(2.5)));
        assert_eq!(
            SettingValue::decode("str", "2.5"),
            Some(SettingValue::Text(String::from("2.5")))
        );
        assert_eq!(
            SettingValue::decode("bool", "True"),
            Some(SettingValue::Text(String::from("True")))
        );
    }

    #[test]
    fn decode_rejects_malformed() {
        assert_eq!(SettingValue::decode("int", "five"), None);
        assert_eq!(SettingValue::decode("float", ""), None);
    }

    #[test]
    fn display_then_decode() {
        for value in [
            SettingValue::Int(-42),
            SettingValue::Float(2.5),
            SettingValue::Float(3.0),
            SettingValue::Text(String::from("hello world")),
        ] {
            let decoded = SettingValue::decode(value.datatype(), &value.to_string());
            assert_eq!(decoded, Some(value));
        }
    }

    #[test]
    fn infer_from_raw_input() {
        assert_eq!(SettingValue::infer("7"), SettingValue::Int(7));
        assert_eq!(SettingValue::infer("0.25"), SettingValue::Float(0.25));
        assert_eq!(SettingValue::infer("en"), SettingValue::Text(String::from("en")));
    }

    #[test]
    fn default_is_empty_text() {
        assert_eq!(SettingValue::default().as_str(), Some(""));
    }
}
