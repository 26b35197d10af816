// ==========================================
// 可持续设计方案引擎 - 项目历史仓储
// ==========================================
// 职责: design_project 表的写入、列表、详情、清空
// 红线: Repository 不含业务逻辑
// 存储: 方案/排名/推荐以 JSON 文本保存
// ==========================================

use crate::domain::constraint::ConstraintSet;
use crate::domain::design::{Design, DesignId, RankingEntry};
use crate::domain::project::{NewProject, ProjectRecord, ProjectSummary, Recommendation};
use crate::domain::types::{Climate, Priority};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 历史归属过滤
///
/// - guest=true: 仅无 user_id 的记录
/// - user_id=Some: 仅该用户
/// - 都未指定: 全部
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OwnerFilter {
    pub user_id: Option<i64>,
    pub guest: bool,
}

impl OwnerFilter {
    pub fn new(user_id: Option<i64>, guest: bool) -> Self {
        Self { user_id, guest }
    }

    /// WHERE 子句片段 + 参数
    fn clause(&self) -> (&'static str, Option<i64>) {
        if self.guest {
            ("user_id IS NULL", None)
        } else if let Some(uid) = self.user_id {
            ("user_id = ?", Some(uid))
        } else {
            ("1 = 1", None)
        }
    }
}

/// 数据库原始行
struct ProjectRow {
    project_id: i64,
    user_id: Option<i64>,
    area: f64,
    budget: f64,
    climate: String,
    priority: String,
    designs_json: String,
    ml_rankings_json: Option<String>,
    best_design_id: Option<i64>,
    recommendation_json: Option<String>,
    config_snapshot_json: Option<String>,
    created_at: String,
}

impl ProjectRow {
    fn into_record(self) -> RepositoryResult<ProjectRecord> {
        let constraints = parse_constraints(
            self.project_id,
            self.area,
            self.budget,
            &self.climate,
            &self.priority,
        )?;

        let designs: Vec<Design> = serde_json::from_str(&self.designs_json)?;
        let ml_rankings: Option<Vec<RankingEntry>> = self
            .ml_rankings_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let recommendation: Option<Recommendation> = self
            .recommendation_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(ProjectRecord {
            project_id: self.project_id,
            user_id: self.user_id,
            constraints,
            designs,
            ml_rankings,
            best_design_id: self.best_design_id.and_then(|id| DesignId::try_from(id).ok()),
            recommendation,
            config_snapshot: self.config_snapshot_json,
            created_at: parse_datetime(&self.created_at),
        })
    }
}

// ==========================================
// ProjectRepository - 项目历史仓储
// ==========================================
pub struct ProjectRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectRepository {
    /// 创建新的项目仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存一次生成结果
    ///
    /// # 返回
    /// - Ok(i64): 新项目 ID
    pub fn save_project(&self, project: &NewProject) -> RepositoryResult<i64> {
        let designs_json = serde_json::to_string(&project.designs)?;
        let ml_rankings_json = project
            .ml_rankings
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let recommendation_json = project
            .recommendation
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let created_at = Utc::now().naive_utc().format(DATETIME_FORMAT).to_string();
        let c = &project.constraints;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO design_project (
                user_id, area, budget, climate, priority,
                designs_json, ml_rankings_json, best_design_id,
                recommendation_json, config_snapshot_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                project.user_id,
                c.area(),
                c.budget(),
                c.climate().as_str(),
                c.priority().as_str(),
                designs_json,
                ml_rankings_json,
                project.best_design_id.map(i64::from),
                recommendation_json,
                project.config_snapshot,
                created_at,
            ],
        )?;

        let project_id = conn.last_insert_rowid();
        tracing::debug!(project_id, user_id = project.user_id, "项目历史已保存");
        Ok(project_id)
    }

    /// 最近项目摘要（新→旧）
    pub fn list_projects(
        &self,
        limit: usize,
        filter: OwnerFilter,
    ) -> RepositoryResult<Vec<ProjectSummary>> {
        let (clause, uid) = filter.clause();
        let sql = format!(
            r#"
            SELECT
                project_id, user_id, area, budget, climate, priority,
                CASE WHEN json_valid(designs_json) THEN json_array_length(designs_json) ELSE 0 END,
                best_design_id, created_at
            FROM design_project
            WHERE {}
            ORDER BY project_id DESC
            LIMIT {}
            "#,
            clause,
            limit as i64
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let summaries = match uid {
            Some(uid) => stmt
                .query_map(params![uid], map_summary_row)?
                .collect::<SqliteResult<Vec<_>>>()?,
            None => stmt
                .query_map([], map_summary_row)?
                .collect::<SqliteResult<Vec<_>>>()?,
        };

        Ok(summaries)
    }

    /// 最近项目完整记录（用于历史推荐/造价学习）
    ///
    /// 无法解析的行跳过并告警,其余记录照常返回
    pub fn list_records(&self, limit: usize) -> RepositoryResult<Vec<ProjectRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY project_id DESC LIMIT ?1",
            SELECT_RECORD
        ))?;

        let rows = stmt
            .query_map(params![limit as i64], map_project_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        drop(stmt);
        drop(conn);

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let project_id = row.project_id;
            match row.into_record() {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(project_id, error = %e, "项目历史记录无法解析，已跳过");
                }
            }
        }
        Ok(records)
    }

    /// 按 ID 查询项目
    ///
    /// # 返回
    /// - Ok(Some(ProjectRecord)): 找到
    /// - Ok(None): 不存在
    pub fn get_project(&self, project_id: i64) -> RepositoryResult<Option<ProjectRecord>> {
        let row = {
            let conn = self.get_conn()?;
            conn.query_row(
                &format!("{} WHERE project_id = ?1", SELECT_RECORD),
                params![project_id],
                map_project_row,
            )
            .optional()?
        };

        row.map(ProjectRow::into_record).transpose()
    }

    /// 清空项目历史
    ///
    /// # 返回
    /// - Ok(usize): 删除条数
    pub fn clear_projects(&self, filter: OwnerFilter) -> RepositoryResult<usize> {
        let (clause, uid) = filter.clause();
        let sql = format!("DELETE FROM design_project WHERE {}", clause);

        let conn = self.get_conn()?;
        let deleted = match uid {
            Some(uid) => conn.execute(&sql, params![uid])?,
            None => conn.execute(&sql, [])?,
        };

        tracing::info!(deleted, user_id = filter.user_id, guest = filter.guest, "项目历史已清空");
        Ok(deleted)
    }

    /// 项目总数
    pub fn count_projects(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM design_project", [], |row| row.get(0))?)
    }
}

const SELECT_RECORD: &str = r#"
    SELECT
        project_id, user_id, area, budget, climate, priority,
        designs_json, ml_rankings_json, best_design_id,
        recommendation_json, config_snapshot_json, created_at
    FROM design_project
"#;

fn map_summary_row(row: &rusqlite::Row<'_>) -> SqliteResult<ProjectSummary> {
    Ok(ProjectSummary {
        project_id: row.get(0)?,
        user_id: row.get(1)?,
        area: row.get(2)?,
        budget: row.get(3)?,
        climate: row.get(4)?,
        priority: row.get(5)?,
        design_count: row.get::<_, Option<i64>>(6)?.unwrap_or(0).max(0) as usize,
        best_design_id: row
            .get::<_, Option<i64>>(7)?
            .and_then(|id| DesignId::try_from(id).ok()),
        created_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn map_project_row(row: &rusqlite::Row<'_>) -> SqliteResult<ProjectRow> {
    Ok(ProjectRow {
        project_id: row.get(0)?,
        user_id: row.get(1)?,
        area: row.get(2)?,
        budget: row.get(3)?,
        climate: row.get(4)?,
        priority: row.get(5)?,
        designs_json: row.get(6)?,
        ml_rankings_json: row.get(7)?,
        best_design_id: row.get(8)?,
        recommendation_json: row.get(9)?,
        config_snapshot_json: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn parse_constraints(
    project_id: i64,
    area: f64,
    budget: f64,
    climate: &str,
    priority: &str,
) -> RepositoryResult<ConstraintSet> {
    let field_error = |field: &str, message: String| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("project_id={}: {}", project_id, message),
    };

    let climate: Climate = climate.parse().map_err(|e| field_error("climate", e))?;
    let priority: Priority = priority.parse().map_err(|e| field_error("priority", e))?;

    ConstraintSet::new(area, budget, climate, priority)
        .map_err(|e| field_error(e.field(), e.to_string()))
}

fn parse_datetime(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).unwrap_or_default()
}
