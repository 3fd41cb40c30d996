//! 关系式解析
//!
//! 把一行拆成 `左边 运算符 右边`，左右两边暂不校验，留给求值器判断

use std::fmt;

/// 关系运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOperator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl RelationalOperator {
    /// 匹配优先级：双字符运算符必须排在它的单字符前缀之前
    pub const PRIORITY: [RelationalOperator; 6] = [
        RelationalOperator::Neq,
        RelationalOperator::Lte,
        RelationalOperator::Gte,
        RelationalOperator::Eq,
        RelationalOperator::Lt,
        RelationalOperator::Gt,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            RelationalOperator::Eq => "=",
            RelationalOperator::Neq => "!=",
            RelationalOperator::Lt => "<",
            RelationalOperator::Lte => "<=",
            RelationalOperator::Gt => ">",
            RelationalOperator::Gte => ">=",
        }
    }
}

impl fmt::Display for RelationalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// 解析出的关系式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRelation<'a> {
    pub left: &'a str,
    pub operator: RelationalOperator,
    pub right: &'a str,
}

/// 尝试把一行解析成关系式
///
/// 从左往右找第一个能匹配运算符的位置（左边至少一个字符），
/// 同一位置按 [`RelationalOperator::PRIORITY`] 依次尝试；右边为空时继续往后找。
/// 找不到运算符返回 `None`，整行按单个表达式处理。
pub fn parse_relation(line: &str) -> Option<ParsedRelation<'_>> {
    for (pos, _) in line.char_indices().skip(1) {
        let rest = &line[pos..];
        for operator in RelationalOperator::PRIORITY {
            let Some(right) = rest.strip_prefix(operator.symbol()) else {
                continue;
            };
            if right.is_empty() {
                continue;
            }
            return Some(ParsedRelation {
                left: &line[..pos],
                operator,
                right,
            });
        }
    }
    None
}
