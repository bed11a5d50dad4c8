pub mod services;

/// 健康检查路由前缀
pub const HEALTH_PREFIX: &str = "/health";
