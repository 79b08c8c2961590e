//! SimFlow 错误处理系统
//!
//! 统一的错误类型：注册表层包装失败的资源名与操作，保留内部原因

use crate::types::ValueKind;
use thiserror::Error;

/// 框架统一错误类型
#[derive(Error, Debug)]
pub enum SimFlowError {
    /// 读取资源失败；包装资源自身返回的错误
    #[error("failed to read resource '{resource}'")]
    Read {
        resource: String,
        #[source]
        source: Box<SimFlowError>,
    },

    /// 写入资源失败；包装资源自身返回的错误
    #[error("failed to write resource '{resource}'")]
    Write {
        resource: String,
        #[source]
        source: Box<SimFlowError>,
    },

    /// 名称未注册或资源不具备读能力
    #[error("resource '{resource}' is not readable")]
    NotReadable { resource: String },

    /// 名称未注册或资源不具备写能力
    #[error("resource '{resource}' is not writable")]
    NotWritable { resource: String },

    /// 写入值的类型与资源固定的值类型不一致
    #[error("mismatched types: expected {expected}, got {actual}")]
    MismatchedTypes {
        expected: ValueKind,
        actual: ValueKind,
    },

    /// 反馈控制器的设定点解析为非数值类型
    #[error("setpoint '{setpoint}' must be int32 or float32, got {actual}")]
    NotNumeric { setpoint: String, actual: ValueKind },
}

impl SimFlowError {
    /// 包装读取错误
    pub fn read(resource: &str, source: SimFlowError) -> Self {
        Self::Read {
            resource: resource.to_string(),
            source: Box::new(source),
        }
    }

    /// 包装写入错误
    pub fn write(resource: &str, source: SimFlowError) -> Self {
        Self::Write {
            resource: resource.to_string(),
            source: Box::new(source),
        }
    }

    /// 创建不可读错误
    pub fn not_readable(resource: &str) -> Self {
        Self::NotReadable {
            resource: resource.to_string(),
        }
    }

    /// 创建不可写错误
    pub fn not_writable(resource: &str) -> Self {
        Self::NotWritable {
            resource: resource.to_string(),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, SimFlowError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let error = SimFlowError::not_readable("tank");
        assert_eq!(error.to_string(), "resource 'tank' is not readable");

        let error = SimFlowError::MismatchedTypes {
            expected: ValueKind::Int,
            actual: ValueKind::Bool,
        };
        assert_eq!(error.to_string(), "mismatched types: expected int32, got bool");
    }

    #[test]
    fn test_wrapped_error_preserves_cause() {
        let inner = SimFlowError::MismatchedTypes {
            expected: ValueKind::Float,
            actual: ValueKind::Bool,
        };
        let wrapped = SimFlowError::write("setpoint", inner);

        assert_eq!(wrapped.to_string(), "failed to write resource 'setpoint'");

        let source = wrapped.source().expect("inner cause must be preserved");
        assert_eq!(
            source.to_string(),
            "mismatched types: expected float32, got bool"
        );
    }

    #[test]
    fn test_result_type() {
        let success: Result<i32> = Ok(42);
        let failure: Result<i32> = Err(SimFlowError::not_writable("rand"));

        assert!(success.is_ok());
        assert!(failure.is_err());
    }
}
