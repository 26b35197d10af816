// ==========================================
// 可持续设计方案引擎 - 项目历史 API
// ==========================================
// 职责: 项目历史列表、详情、清空
// ==========================================

use std::sync::Arc;

use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::config::engine_config_trait::EngineConfigReader;
use crate::domain::project::{ProjectRecord, ProjectSummary};
use crate::repository::project_repo::{OwnerFilter, ProjectRepository};

pub struct ProjectApi {
    config: Arc<dyn EngineConfigReader>,
    project_repo: Arc<ProjectRepository>,
}

impl ProjectApi {
    pub fn new(config: Arc<dyn EngineConfigReader>, project_repo: Arc<ProjectRepository>) -> Self {
        Self {
            config,
            project_repo,
        }
    }

    /// 最近项目列表
    ///
    /// # 参数
    /// - limit: 条数上限（None 时使用配置 history_limit）
    /// - user_id: 仅该用户
    /// - guest: 仅访客（无 user_id）记录,优先于 user_id
    pub async fn list_projects(
        &self,
        limit: Option<usize>,
        user_id: Option<i64>,
        guest: bool,
    ) -> ApiResult<Vec<ProjectSummary>> {
        let limit = match limit {
            Some(0) => return Err(ApiError::InvalidInput("limit 必须大于 0".to_string())),
            Some(limit) => limit,
            None => self
                .config
                .get_history_limit()
                .await
                .map_err(|e| ApiError::ConfigError(e.to_string()))?,
        };

        let projects = self
            .project_repo
            .list_projects(limit, OwnerFilter::new(user_id, guest))?;
        debug!(limit, count = projects.len(), "查询项目历史");
        Ok(projects)
    }

    /// 项目详情
    pub fn get_project(&self, project_id: i64) -> ApiResult<ProjectRecord> {
        self.project_repo
            .get_project(project_id)?
            .ok_or_else(|| ApiError::NotFound(format!("项目(id={})不存在", project_id)))
    }

    /// 清空项目历史
    ///
    /// # 返回
    /// - Ok(usize): 删除条数
    pub fn clear_projects(&self, user_id: Option<i64>, guest: bool) -> ApiResult<usize> {
        Ok(self
            .project_repo
            .clear_projects(OwnerFilter::new(user_id, guest))?)
    }
}
