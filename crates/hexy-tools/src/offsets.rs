//! # 标定偏移文件
//!
//! 格式：JSON 对象，键为舵机编号字符串，值为偏移角度（度）
//!
//! ```json
//! {"5": 3.5, "31": -1.0}
//! ```
//!
//! 文件中没有出现的舵机保持默认偏移。

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use hexy_protocol::ServoId;
use serde::{Deserialize, Serialize};

use crate::ToolsError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OffsetTable(BTreeMap<String, f64>);

impl OffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ServoId) -> Option<f64> {
        self.0.get(&id.to_string()).copied()
    }

    pub fn insert(&mut self, id: ServoId, offset: f64) -> Option<f64> {
        self.0.insert(id.to_string(), offset)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 原始键值（键不一定是合法舵机编号）
    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.0
    }

    pub fn from_json_str(content: &str) -> Result<Self, ToolsError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json_string(&self) -> Result<String, ToolsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ToolsError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// 保存到文件（覆盖）
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ToolsError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

impl FromIterator<(ServoId, f64)> for OffsetTable {
    fn from_iter<I: IntoIterator<Item = (ServoId, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(id, offset)| (id.to_string(), offset)).collect())
    }
}
