//! # Error 模块
//!
//! 定义 reveal-runtime 中使用的错误类型。
//!
//! 引擎内没有致命错误：所有错误最终都降级为"显示静态内容"。

use thiserror::Error;

use crate::surface::ElementId;

/// 数值格式化错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// 文本中没有可解析的数值
    #[error("无法从 '{raw}' 中解析数值，不可动画")]
    NotAnimatable { raw: String },
}

/// 宿主表面（Surface）错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// 元素不存在
    #[error("元素不存在: {0}")]
    MissingElement(ElementId),

    /// 元素不是可绘制的路径
    #[error("元素 {0} 不是 SVG 路径")]
    NotAPath(ElementId),

    /// 宿主不支持该操作（动画运行时错误）
    #[error("宿主不支持操作: {operation}")]
    Unsupported { operation: String },
}

impl SurfaceError {
    /// 是否应触发降级（减少动画模式）
    pub fn is_runtime_failure(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// 表单字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
    Message,
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Message => "message",
        };
        write!(f, "{}", name)
    }
}

/// 表单校验错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    /// 缺少必填字段
    #[error("缺少必填字段: {field}")]
    MissingField { field: FormField },

    /// 邮箱格式无效
    #[error("邮箱格式无效: '{email}'")]
    InvalidEmail { email: String },

    /// 未勾选同意条款
    #[error("提交前必须同意隐私条款")]
    ConsentRequired,
}

impl FormError {
    /// 展示给用户的提示文案
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "Please fill in all required fields.",
            Self::InvalidEmail { .. } => "Please enter a valid email address.",
            Self::ConsentRequired => "Please agree to the privacy policy before submitting.",
        }
    }
}

/// 表单提交错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// 校验失败，未提交
    #[error("表单校验失败: {0}")]
    Invalid(#[from] FormError),

    /// 后端拒绝
    #[error("表单后端拒绝提交: {message}")]
    Rejected { message: String },
}

/// reveal-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 格式化错误
    #[error("格式化错误: {0}")]
    Format(#[from] FormatError),

    /// 表面错误
    #[error("表面错误: {0}")]
    Surface(#[from] SurfaceError),

    /// 目标未注册
    #[error("目标未注册: {0}")]
    UnknownTarget(ElementId),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
