// ==========================================
// 可持续设计方案引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope, 当前仅使用 global)
// 红线: 配置值非法时回落默认值并告警,不阻断生成
// ==========================================

use crate::config::engine_config_trait::{ConstraintMode, EngineConfigReader};
use crate::config::scoring_profile::{IndexWeights, RankerWeightTable};
use crate::db::open_sqlite_connection;
use crate::domain::constraint::ConstraintLimits;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取并解析数值配置（解析失败回落默认值）
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: std::str::FromStr + Copy + std::fmt::Debug,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, ?default, "配置值格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 读取 JSON 配置（缺失或格式错误时使用 Default）
    fn get_json_or_default<T>(&self, key: &str) -> Result<T, Box<dyn Error>>
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(T::default());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(
                config_key = key,
                raw_value = %raw,
                error = %e,
                "JSON 配置格式错误，使用默认配置"
            );
            T::default()
        }))
    }

    /// 写入 global 配置（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON 字符串, 键有序）
    ///
    /// 每次保存项目时一并记录
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// EngineConfigReader Trait 实现
// ==========================================
#[async_trait]
impl EngineConfigReader for ConfigManager {
    async fn get_constraint_limits(&self) -> Result<ConstraintLimits, Box<dyn Error>> {
        let default = ConstraintLimits::default();
        let area_min = self.get_parsed_or_default(config_keys::AREA_MIN_SQFT, default.area_min)?;
        let area_max = self.get_parsed_or_default(config_keys::AREA_MAX_SQFT, default.area_max)?;

        let limits = ConstraintLimits { area_min, area_max };
        if limits.is_valid() {
            Ok(limits)
        } else {
            tracing::warn!(area_min, area_max, "面积上下限配置无效，使用默认值");
            Ok(default)
        }
    }

    async fn get_constraint_mode(&self) -> Result<ConstraintMode, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::CONSTRAINT_MODE, "STRICT")?;
        Ok(value.parse::<ConstraintMode>().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "约束模式配置无效，使用 STRICT");
            ConstraintMode::Strict
        }))
    }

    async fn get_service_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        let value = self.get_parsed_or_default(config_keys::SERVICE_TIMEOUT_MS, 8000u64)?;
        Ok(if value == 0 { 8000 } else { value })
    }

    async fn get_index_weights(&self) -> Result<IndexWeights, Box<dyn Error>> {
        let weights: IndexWeights = self.get_json_or_default(config_keys::INDEX_WEIGHTS)?;
        Ok(weights.sanitized())
    }

    async fn get_ranker_weights(&self) -> Result<RankerWeightTable, Box<dyn Error>> {
        self.get_json_or_default(config_keys::RANKER_WEIGHTS)
    }

    async fn get_history_limit(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_parsed_or_default(config_keys::HISTORY_LIMIT, 50usize)?;
        Ok(value.max(1))
    }

    async fn snapshot_config(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_snapshot()
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 约束
    pub const AREA_MIN_SQFT: &str = "area_min_sqft";
    pub const AREA_MAX_SQFT: &str = "area_max_sqft";
    pub const CONSTRAINT_MODE: &str = "constraint_mode"; // STRICT | CLAMP

    // 生成服务
    pub const SERVICE_TIMEOUT_MS: &str = "service_timeout_ms";

    // 评分
    pub const INDEX_WEIGHTS: &str = "index_weights"; // JSON
    pub const RANKER_WEIGHTS: &str = "ranker_weights"; // JSON, 按优先级

    // 历史
    pub const HISTORY_LIMIT: &str = "history_limit";
}
