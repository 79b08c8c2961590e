//! SimFlow 核心值类型
//!
//! 资源值以封闭的标签联合表示，避免运行时反射式的类型判断；
//! 数值子集带有显式的 int32 ↔ float32 转换表

use serde::{Deserialize, Serialize};
use std::fmt;

/// 资源值的类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Int,
    Float,
    Bool,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Int => write!(f, "int32"),
            ValueKind::Float => write!(f, "float32"),
            ValueKind::Bool => write!(f, "bool"),
        }
    }
}

/// 资源值：支持的三种语义类型之一
///
/// 资源的值类型在构造时确定，生命周期内不变
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
}

impl Value {
    /// 值的类型种类
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Numeric> for Value {
    fn from(value: Numeric) -> Self {
        match value {
            Numeric::Int(v) => Value::Int(v),
            Numeric::Float(v) => Value::Float(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// 数值子集（int32 | float32）
///
/// 计数器与反馈控制器只接受数值类型，在构造期即固定种类
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Numeric {
    Int(i32),
    Float(f32),
}

impl Numeric {
    /// 数值的类型种类
    pub fn kind(&self) -> ValueKind {
        match self {
            Numeric::Int(_) => ValueKind::Int,
            Numeric::Float(_) => ValueKind::Float,
        }
    }

    /// 与 self 同种类的零值
    pub fn zero_like(&self) -> Numeric {
        match self {
            Numeric::Int(_) => Numeric::Int(0),
            Numeric::Float(_) => Numeric::Float(0.0),
        }
    }

    /// 以 f32 表示数值
    pub fn as_f32(&self) -> f32 {
        match self {
            Numeric::Int(v) => *v as f32,
            Numeric::Float(v) => *v,
        }
    }

    /// 显式转换表：将 self 转换到 other 的种类
    pub fn coerce_to(self, other: Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Int(v), Numeric::Int(_)) => Numeric::Int(v),
            (Numeric::Int(v), Numeric::Float(_)) => Numeric::Float(v as f32),
            (Numeric::Float(v), Numeric::Int(_)) => Numeric::Int(v as i32),
            (Numeric::Float(v), Numeric::Float(_)) => Numeric::Float(v),
        }
    }

    /// 相加；混合种类提升为 float32
    pub fn add(self, other: Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => Numeric::Int(a.wrapping_add(b)),
            (Numeric::Float(a), Numeric::Float(b)) => Numeric::Float(a + b),
            (Numeric::Int(a), Numeric::Float(b)) => Numeric::Float(a as f32 + b),
            (Numeric::Float(a), Numeric::Int(b)) => Numeric::Float(a + b as f32),
        }
    }

    /// 朝 target 前进一步，带夹紧：任一方向都不越过目标
    pub fn step_toward(self, target: Numeric, step: Numeric) -> Numeric {
        let target = target.coerce_to(self);
        let step = step.coerce_to(self);

        match (self, target, step) {
            (Numeric::Int(c), Numeric::Int(t), Numeric::Int(s)) => {
                if c < t {
                    Numeric::Int(c.saturating_add(s).min(t))
                } else if c > t {
                    Numeric::Int(c.saturating_sub(s).max(t))
                } else {
                    self
                }
            }
            (Numeric::Float(c), Numeric::Float(t), Numeric::Float(s)) => {
                if c < t {
                    Numeric::Float((c + s).min(t))
                } else if c > t {
                    Numeric::Float((c - s).max(t))
                } else {
                    self
                }
            }
            // coerce_to 保证三者同种类
            _ => self,
        }
    }
}

impl From<i32> for Numeric {
    fn from(value: i32) -> Self {
        Numeric::Int(value)
    }
}

impl From<f32> for Numeric {
    fn from(value: f32) -> Self {
        Numeric::Float(value)
    }
}

impl TryFrom<Value> for Numeric {
    /// 失败时返回冒犯的类型种类
    type Error = ValueKind;

    fn try_from(value: Value) -> Result<Self, ValueKind> {
        match value {
            Value::Int(v) => Ok(Numeric::Int(v)),
            Value::Float(v) => Ok(Numeric::Float(v)),
            Value::Bool(_) => Err(ValueKind::Bool),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind() {
        assert_eq!(Value::Int(1).kind(), ValueKind::Int);
        assert_eq!(Value::Float(1.0).kind(), ValueKind::Float);
        assert_eq!(Value::Bool(true).kind(), ValueKind::Bool);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ValueKind::Int.to_string(), "int32");
        assert_eq!(ValueKind::Float.to_string(), "float32");
        assert_eq!(ValueKind::Bool.to_string(), "bool");
    }

    #[test]
    fn test_coercion_table() {
        assert_eq!(Numeric::Int(3).coerce_to(Numeric::Float(0.0)), Numeric::Float(3.0));
        assert_eq!(Numeric::Float(5.9).coerce_to(Numeric::Int(0)), Numeric::Int(5));
        assert_eq!(Numeric::Int(7).coerce_to(Numeric::Int(0)), Numeric::Int(7));
        assert_eq!(Numeric::Float(2.5).coerce_to(Numeric::Float(0.0)), Numeric::Float(2.5));
    }

    #[test]
    fn test_add_same_kind() {
        assert_eq!(Numeric::Int(2).add(Numeric::Int(3)), Numeric::Int(5));
        assert_eq!(Numeric::Float(1.5).add(Numeric::Float(0.5)), Numeric::Float(2.0));
    }

    #[test]
    fn test_step_toward_clamps_upward() {
        let current = Numeric::Int(8);
        assert_eq!(
            current.step_toward(Numeric::Int(10), Numeric::Int(3)),
            Numeric::Int(10)
        );
    }

    #[test]
    fn test_step_toward_clamps_downward() {
        let mut current = Numeric::Float(1.0);
        current = current.step_toward(Numeric::Float(0.0), Numeric::Float(0.7));
        assert_eq!(current, Numeric::Float(0.3));
        current = current.step_toward(Numeric::Float(0.0), Numeric::Float(0.7));
        assert_eq!(current, Numeric::Float(0.0));
    }

    #[test]
    fn test_step_toward_holds_at_target() {
        let current = Numeric::Int(10);
        assert_eq!(
            current.step_toward(Numeric::Int(10), Numeric::Int(1)),
            Numeric::Int(10)
        );
    }

    #[test]
    fn test_numeric_from_value() {
        assert_eq!(Numeric::try_from(Value::Int(4)), Ok(Numeric::Int(4)));
        assert_eq!(Numeric::try_from(Value::Float(4.5)), Ok(Numeric::Float(4.5)));
        assert_eq!(Numeric::try_from(Value::Bool(true)), Err(ValueKind::Bool));
    }
}
