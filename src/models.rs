use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Payload for `query.device.info`. Empty `dids` and `position_id` mean "no filter".
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeviceQuery {
    pub dids: Vec<String>,
    #[serde(rename = "positionId")]
    pub position_id: String,
    #[serde(rename = "pageNum")]
    pub page_num: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
}

impl Default for DeviceQuery {
    fn default() -> Self {
        Self {
            dids: Vec::new(),
            position_id: String::new(),
            page_num: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Device {
    pub did: String,
    #[serde(rename = "parentDid", default, deserialize_with = "null_as_default")]
    pub parent_did: String,
    #[serde(rename = "positionId", default, deserialize_with = "null_as_default")]
    pub position_id: String,
    #[serde(rename = "createTime", default, deserialize_with = "string_or_number")]
    pub create_time: String,
    #[serde(rename = "updateTime", default, deserialize_with = "string_or_number")]
    pub update_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(rename = "modelType", default, deserialize_with = "null_as_default")]
    pub model_type: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: i64,
    #[serde(rename = "firmwareVersion", default, deserialize_with = "null_as_default")]
    pub firmware_version: String,
    #[serde(rename = "deviceName", default, deserialize_with = "null_as_default")]
    pub device_name: String,
    #[serde(rename = "timeZone", default, deserialize_with = "null_as_default")]
    pub time_zone: String,
}

impl Device {
    pub fn is_online(&self) -> bool {
        self.state == 1
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct DeviceList {
    #[serde(default)]
    pub data: Vec<Device>,
    #[serde(rename = "totalCount", default)]
    pub total_count: u64,
}

/// Treat an explicit `null` like a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Timestamps show up both as "1612345678000" and 1612345678000
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
