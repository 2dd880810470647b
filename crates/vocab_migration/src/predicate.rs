use std::fmt;

use sea_orm::sea_query::{Alias, Condition, Expr};

/// 作用于单个整数列的行谓词
///
/// 同一个谓词既可以渲染为 SQL 条件，也可以在内存中对改写后的值求值，
/// 两者语义保持一致：NULL 永远不匹配。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Eq(i64),
    Ne(i64),
    Gt(i64),
    Gte(i64),
    Lt(i64),
    Lte(i64),
    In(Vec<i64>),
    /// 任意一个子谓词匹配
    Any(Vec<Predicate>),
    /// 全部子谓词匹配
    All(Vec<Predicate>),
}

impl Predicate {
    pub fn matches(&self, value: i64) -> bool {
        match self {
            Self::Eq(v) => value == *v,
            Self::Ne(v) => value != *v,
            Self::Gt(v) => value > *v,
            Self::Gte(v) => value >= *v,
            Self::Lt(v) => value < *v,
            Self::Lte(v) => value <= *v,
            Self::In(values) => values.contains(&value),
            Self::Any(children) => children.iter().any(|p| p.matches(value)),
            Self::All(children) => children.iter().all(|p| p.matches(value)),
        }
    }

    /// 渲染为针对 `column` 的 SQL 条件，取值均以参数形式绑定
    pub fn to_condition(&self, column: &str) -> Condition {
        let col = || Expr::col(Alias::new(column));
        match self {
            Self::Eq(v) => Condition::all().add(col().eq(*v)),
            Self::Ne(v) => Condition::all().add(col().ne(*v)),
            Self::Gt(v) => Condition::all().add(col().gt(*v)),
            Self::Gte(v) => Condition::all().add(col().gte(*v)),
            Self::Lt(v) => Condition::all().add(col().lt(*v)),
            Self::Lte(v) => Condition::all().add(col().lte(*v)),
            Self::In(values) => Condition::all().add(col().is_in(values.iter().copied())),
            Self::Any(children) => children
                .iter()
                .fold(Condition::any(), |cond, p| cond.add(p.to_condition(column))),
            Self::All(children) => children
                .iter()
                .fold(Condition::all(), |cond, p| cond.add(p.to_condition(column))),
        }
    }

    /// 以 `column` 为主语的可读描述，用于日志
    pub fn describe(&self, column: &str) -> String {
        Described(self, column).to_string()
    }
}

struct Described<'a>(&'a Predicate, &'a str);

impl fmt::Display for Described<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Described(predicate, column) = *self;
        match predicate {
            Predicate::Eq(v) => write!(f, "{} = {}", column, v),
            Predicate::Ne(v) => write!(f, "{} <> {}", column, v),
            Predicate::Gt(v) => write!(f, "{} > {}", column, v),
            Predicate::Gte(v) => write!(f, "{} >= {}", column, v),
            Predicate::Lt(v) => write!(f, "{} < {}", column, v),
            Predicate::Lte(v) => write!(f, "{} <= {}", column, v),
            Predicate::In(values) => {
                let list: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{} IN ({})", column, list.join(", "))
            }
            Predicate::Any(children) | Predicate::All(children) => {
                let joiner = if matches!(predicate, Predicate::Any(_)) { " OR " } else { " AND " };
                let parts: Vec<String> = children
                    .iter()
                    .map(|p| format!("({})", Described(p, column)))
                    .collect();
                write!(f, "{}", parts.join(joiner))
            }
        }
    }
}
