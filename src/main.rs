// ==========================================
// 可持续设计方案引擎 - 命令行入口
// ==========================================
// 用法: sustainable-design <area> <budget> <climate> <priority> [seed]
// 输出: 生成结果 JSON（stdout）,日志写 stderr
// ==========================================

use anyhow::{anyhow, Context};
use sustainable_design::app::{get_default_db_path, AppOptions, AppState};
use sustainable_design::RawConstraintInput;

const USAGE: &str = "用法: sustainable-design <area> <budget> <climate> <priority> [seed]";

fn parse_args(args: &[String]) -> anyhow::Result<(RawConstraintInput, Option<u64>)> {
    if args.len() < 4 || args.len() > 5 {
        return Err(anyhow!("参数个数错误\n{}", USAGE));
    }

    let area: f64 = args[0]
        .parse()
        .with_context(|| format!("area 不是数值: {}", args[0]))?;
    let budget: f64 = args[1]
        .parse()
        .with_context(|| format!("budget 不是数值: {}", args[1]))?;
    let seed = match args.get(4) {
        Some(raw) => Some(
            raw.parse::<u64>()
                .with_context(|| format!("seed 不是非负整数: {}", raw))?,
        ),
        None => None,
    };

    Ok((RawConstraintInput::new(area, budget, &args[2], &args[3]), seed))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sustainable_design::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (raw, seed) = parse_args(&args)?;

    tracing::info!("==================================================");
    tracing::info!("{} v{}", sustainable_design::APP_NAME, sustainable_design::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    let state = AppState::with_options(
        db_path,
        AppOptions {
            seed,
            ..AppOptions::default()
        },
    )
    .map_err(|e| anyhow!(e))?;

    let report = state.design_api.generate_designs(&raw, None).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
