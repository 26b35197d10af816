// ==========================================
// 可持续设计方案引擎 - 导出 API
// ==========================================
// 职责: 方案批次 → 报表行 → CSV / JSON
// 列: name, energyEfficiency, waterEfficiency, carbonFootprint,
//     sustainabilityIndex, estimatedCost
// ==========================================

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::design::Design;

/// 报表行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub name: String,
    pub energy_efficiency: f64,
    pub water_efficiency: f64,
    pub carbon_footprint: f64,
    pub sustainability_index: f64,
    pub estimated_cost: f64,
}

impl From<&Design> for ExportRow {
    fn from(design: &Design) -> Self {
        let m = &design.metrics;
        Self {
            name: design.name.clone(),
            energy_efficiency: m.energy_efficiency,
            water_efficiency: m.water_efficiency,
            carbon_footprint: m.carbon_footprint,
            sustainability_index: m.sustainability_index,
            estimated_cost: m.estimated_cost,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportApi;

impl ExportApi {
    pub fn new() -> Self {
        Self
    }

    /// 报表行（保持批次顺序）
    pub fn rows(&self, designs: &[Design]) -> Vec<ExportRow> {
        designs.iter().map(ExportRow::from).collect()
    }

    /// CSV 文本（含表头; 空批次只有表头）
    pub fn to_csv(&self, designs: &[Design]) -> ApiResult<String> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        writer
            .write_record([
                "name",
                "energyEfficiency",
                "waterEfficiency",
                "carbonFootprint",
                "sustainabilityIndex",
                "estimatedCost",
            ])
            .map_err(|e| ApiError::ExportError(e.to_string()))?;

        for row in self.rows(designs) {
            writer
                .serialize(&row)
                .map_err(|e| ApiError::ExportError(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ApiError::ExportError(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ApiError::ExportError(e.to_string()))
    }

    /// JSON 数组文本
    pub fn to_json(&self, designs: &[Design]) -> ApiResult<String> {
        serde_json::to_string_pretty(&self.rows(designs))
            .map_err(|e| ApiError::ExportError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::design::MetricsBundle;

    fn designs() -> Vec<Design> {
        vec![
            Design::new(
                0,
                "Eco-Efficient",
                MetricsBundle {
                    energy_efficiency: 81.5,
                    water_efficiency: 63.0,
                    carbon_footprint: 17.2,
                    sustainability_index: 70.4,
                    estimated_cost: 198000.0,
                },
            ),
            Design::new(
                1,
                "Carbon, Optimized",
                MetricsBundle {
                    energy_efficiency: 66.0,
                    water_efficiency: 60.0,
                    carbon_footprint: 9.9,
                    sustainability_index: 67.1,
                    estimated_cost: 180000.0,
                },
            ),
        ]
    }

    #[test]
    fn test_csv_header_and_rows() {
        let csv = ExportApi::new().to_csv(&designs()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "name,energyEfficiency,waterEfficiency,carbonFootprint,sustainabilityIndex,estimatedCost"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("Eco-Efficient,81.5,63.0,17.2,70.4,"));
        // 含逗号的名称被加引号
        assert!(lines[2].starts_with("\"Carbon, Optimized\","));
    }

    #[test]
    fn test_empty_batch_exports_header_only() {
        let csv = ExportApi::new().to_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert_eq!(ExportApi::new().to_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_json_uses_camel_case_columns() {
        let json = ExportApi::new().to_json(&designs()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["energyEfficiency"], 81.5);
        assert_eq!(parsed[1]["name"], "Carbon, Optimized");
        assert!(parsed[0].get("id").is_none());
    }
}
