// ==========================================
// 可持续设计方案引擎 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接与 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{DesignApi, ExportApi, ProjectApi};
use crate::config::config_manager::ConfigManager;
use crate::config::engine_config_trait::EngineConfigReader;
use crate::db::open_and_migrate;
use crate::engine::service::DesignService;
use crate::repository::project_repo::ProjectRepository;

/// 应用状态
///
/// 所有 API 共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器（配置写入 / 快照）
    pub config_manager: Arc<ConfigManager>,

    /// 设计方案API
    pub design_api: Arc<DesignApi>,

    /// 项目历史API
    pub project_api: Arc<ProjectApi>,

    /// 导出API
    pub export_api: Arc<ExportApi>,
}

/// 可选装配项
#[derive(Default, Clone)]
pub struct AppOptions {
    /// 固定随机种子
    pub seed: Option<u64>,
    /// 外部生成服务（None 时使用进程内服务）
    pub service: Option<Arc<dyn DesignService>>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_options(db_path, AppOptions::default())
    }

    pub fn with_options(db_path: String, options: AppOptions) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_and_migrate(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法初始化配置管理器: {}", e))?,
        );
        let config_reader: Arc<dyn EngineConfigReader> = config_manager.clone();
        let project_repo = Arc::new(ProjectRepository::from_connection(conn));

        let mut design_api = DesignApi::new(config_reader.clone(), project_repo.clone());
        if let Some(seed) = options.seed {
            design_api = design_api.with_seed(seed);
        }
        if let Some(service) = options.service {
            design_api = design_api.with_service(service);
        }

        let project_api = ProjectApi::new(config_reader, project_repo);

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            config_manager,
            design_api: Arc::new(design_api),
            project_api: Arc::new(project_api),
            export_api: Arc::new(ExportApi::new()),
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 SUSTAINABLE_DESIGN_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("SUSTAINABLE_DESIGN_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./sustainable_design.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        let dir = data_dir.join("sustainable-design-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("sustainable-design");

        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("sustainable_design.db");
        }
    }

    path.to_string_lossy().to_string()
}
