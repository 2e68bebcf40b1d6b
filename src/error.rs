//! Error types for the export pipeline

use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while exporting a rendered explanation
#[derive(Error, Debug)]
pub enum Error {
    /// A required rendering, PDF or archive capability is not present
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Expected structural markers are missing from the rendered subtree
    #[error("Content not found: {0}")]
    ContentNotFound(String),

    /// The rasterizer failed to turn a subtree into a canvas
    #[error("Rasterization failed: {0}")]
    RasterizationError(String),

    /// Archive construction failed or had unusable input
    #[error("Packaging failed: {0}")]
    PackagingError(String),

    /// PDF assembly failed after rasterization succeeded
    #[error("PDF generation failed: {0}")]
    PdfError(String),

    /// The generative content source returned nothing usable
    #[error("{0}")]
    Generation(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Writing an artifact to its destination failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The background export worker has shut down
    #[error("Export worker is not running")]
    WorkerStopped,
}

impl Error {
    /// The message the presentation layer shows for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::CapabilityUnavailable(_) => "图片下载功能加载失败，请刷新页面重试。",
            Error::ContentNotFound(_) => "无法找到内容元素来生成图片。",
            Error::RasterizationError(_) => "创建图片失败，请稍后重试。",
            Error::PackagingError(_) => "打包图片时出错，请稍后重试。",
            Error::PdfError(_) => "创建 PDF 失败，请稍后重试。",
            Error::Generation(_) => "抱歉，AI 在生成解释时遇到问题。请检查您的输入或稍后重试。",
            Error::ConfigError(_) | Error::Io(_) | Error::WorkerStopped => "抱歉，发生未知错误，请重试。",
        }
    }
}
