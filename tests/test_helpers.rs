// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、配置写入、测试方案与可控的生成服务桩
// ==========================================
#![allow(dead_code)]

use async_trait::async_trait;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use sustainable_design::config::ConfigManager;
use sustainable_design::db::{open_and_migrate, open_sqlite_connection};
use sustainable_design::engine::{DesignService, GenerationRequest, GenerationResponse, ServiceError};
use sustainable_design::{Design, MetricsBundle};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    sustainable_design::logging::init_test();

    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    open_and_migrate(&db_path)?;

    Ok((temp_file, db_path))
}

/// 直接执行 SQL（用于构造损坏数据）
pub fn execute_sql(db_path: &str, sql: &str) -> Result<usize, Box<dyn Error>> {
    let conn = open_sqlite_connection(db_path)?;
    Ok(conn.execute(sql, [])?)
}

/// 写入 global 配置
pub fn set_config(db_path: &str, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let manager = ConfigManager::new(db_path)?;
    manager.set_global_config_value(key, value)
}

/// 构造指标包
pub fn metrics(energy: f64, water: f64, carbon: f64, index: f64, cost: f64) -> MetricsBundle {
    MetricsBundle {
        energy_efficiency: energy,
        water_efficiency: water,
        carbon_footprint: carbon,
        sustainability_index: index,
        estimated_cost: cost,
    }
}

/// 只关心 sustainabilityIndex 的测试方案
pub fn design_with_index(id: u32, name: &str, index: f64) -> Design {
    Design::new(id, name, metrics(70.0, 60.0, 15.0, index, 200_000.0))
}

/// 三个方案: 指数分别为 90 / 70 / 80
pub fn sample_batch() -> Vec<Design> {
    vec![
        design_with_index(0, "Eco-Efficient", 90.0),
        design_with_index(1, "Carbon-Optimized", 70.0),
        design_with_index(2, "Regenerative", 80.0),
    ]
}

// ==========================================
// StubService - 可控的生成服务桩
// ==========================================
pub enum StubBehavior {
    /// 返回固定报文（JSON 文本）
    Payload(String),
    /// 返回指定错误
    Fail(ServiceError),
    /// 睡眠后返回报文（用于超时测试）
    Slow(Duration, String),
}

pub struct StubService {
    behavior: StubBehavior,
    calls: AtomicUsize,
}

impl StubService {
    pub fn new(behavior: StubBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DesignService for StubService {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<GenerationResponse, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            StubBehavior::Payload(body) => GenerationResponse::from_json_str(body),
            StubBehavior::Fail(e) => Err(e.clone()),
            StubBehavior::Slow(delay, body) => {
                tokio::time::sleep(*delay).await;
                GenerationResponse::from_json_str(body)
            }
        }
    }
}

/// 服务报文: sample_batch() + 指定排名
pub fn payload_with_rankings(ml_rankings: serde_json::Value) -> String {
    serde_json::json!({
        "designs": sample_batch(),
        "ml_rankings": ml_rankings,
    })
    .to_string()
}
