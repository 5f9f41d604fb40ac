use crate::map::{DEFAULT_TILE_URL, FitOptions, MapStyle};

/// 仪表盘配置 - 数据源与地图的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | RESOURCE_BASE_URL | http://localhost:3000 | REST 资源存储地址 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | MAP_TILE_URL | https://tile.openstreetmap.org/{z}/{x}/{y}.png | 栅格瓦片模板 |
///
/// # 示例
///
/// ```ignore
/// RESOURCE_BASE_URL=http://localhost:4000 cargo run --example dashboard
/// ```
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// REST 资源存储地址
    pub base_url: String,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 栅格瓦片 URL 模板
    pub tile_url: String,
    /// 默认取景参数
    pub fit: FitOptions,
    /// 选中订单的取景参数
    pub detail_fit: FitOptions,
}

impl DashboardConfig {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("RESOURCE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(30000),
            tile_url: std::env::var("MAP_TILE_URL").unwrap_or_else(|_| DEFAULT_TILE_URL.into()),
            fit: FitOptions::default(),
            detail_fit: FitOptions::detail(),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(base_url: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.base_url = base_url.into();
        config
    }

    /// 地图样式描述
    pub fn map_style(&self) -> MapStyle {
        MapStyle {
            tile_url: self.tile_url.clone(),
            ..MapStyle::default()
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
