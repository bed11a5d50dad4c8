use std::fmt;

#[derive(Debug, Clone)]
pub enum PluginMetricsError {
    Config(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    DataIntegrity(String),
    FileOperation(String),
    Validation(String),
    Serialization(String),
}

impl PluginMetricsError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            PluginMetricsError::Config(_) => "E001",
            PluginMetricsError::DatabaseConfig(_) => "E002",
            PluginMetricsError::DatabaseConnection(_) => "E003",
            PluginMetricsError::DatabaseOperation(_) => "E004",
            PluginMetricsError::DataIntegrity(_) => "E005",
            PluginMetricsError::FileOperation(_) => "E006",
            PluginMetricsError::Validation(_) => "E007",
            PluginMetricsError::Serialization(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            PluginMetricsError::Config(_) => "Configuration Error",
            PluginMetricsError::DatabaseConfig(_) => "Database Configuration Error",
            PluginMetricsError::DatabaseConnection(_) => "Database Connection Error",
            PluginMetricsError::DatabaseOperation(_) => "Database Operation Error",
            PluginMetricsError::DataIntegrity(_) => "Data Integrity Error",
            PluginMetricsError::FileOperation(_) => "File Operation Error",
            PluginMetricsError::Validation(_) => "Validation Error",
            PluginMetricsError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            PluginMetricsError::Config(msg)
            | PluginMetricsError::DatabaseConfig(msg)
            | PluginMetricsError::DatabaseConnection(msg)
            | PluginMetricsError::DatabaseOperation(msg)
            | PluginMetricsError::DataIntegrity(msg)
            | PluginMetricsError::FileOperation(msg)
            | PluginMetricsError::Validation(msg)
            | PluginMetricsError::Serialization(msg) => msg,
        }
    }

    /// 数据一致性被破坏（例如插入后仍查不到行），调用方应按内部错误处理
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, PluginMetricsError::DataIntegrity(_))
    }

    /// 格式化为彩色输出（用于终端）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for PluginMetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for PluginMetricsError {}

// 便捷的构造函数
impl PluginMetricsError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        PluginMetricsError::Config(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        PluginMetricsError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        PluginMetricsError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        PluginMetricsError::DatabaseOperation(msg.into())
    }

    pub fn data_integrity<T: Into<String>>(msg: T) -> Self {
        PluginMetricsError::DataIntegrity(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        PluginMetricsError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        PluginMetricsError::Validation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        PluginMetricsError::Serialization(msg.into())
    }
}

impl From<sea_orm::DbErr> for PluginMetricsError {
    fn from(err: sea_orm::DbErr) -> Self {
        PluginMetricsError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for PluginMetricsError {
    fn from(err: std::io::Error) -> Self {
        PluginMetricsError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for PluginMetricsError {
    fn from(err: serde_json::Error) -> Self {
        PluginMetricsError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PluginMetricsError>;
