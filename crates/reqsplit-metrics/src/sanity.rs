//! Canned prediction/reference cases for checking metric behavior

use crate::aggregate::{AlignedPair, RowKey};

/// A named case; items are joined with spaces before scoring
#[derive(Debug, Clone, Copy)]
pub struct SanityCase {
    pub name: &'static str,
    pub prediction: &'static [&'static str],
    pub reference: &'static [&'static str],
}

pub const SANITY_CASES: [SanityCase; 5] = [
    SanityCase {
        name: "完全正确但顺序不同",
        prediction: &["修改密码", "用户登录", "查看余额"],
        reference: &["用户登录", "查看余额", "修改密码"],
    },
    SanityCase {
        name: "过度拆分",
        prediction: &["用户名登录", "手机号登录", "邮箱登录", "第三方登录"],
        reference: &["用户登录"],
    },
    SanityCase {
        name: "粒度不同但语义等价",
        prediction: &["通过用户名密码登录系统", "通过手机验证码登录系统"],
        reference: &["用户登录验证"],
    },
    SanityCase {
        name: "漏掉需求",
        prediction: &["用户登录", "修改密码"],
        reference: &["用户登录", "查看余额", "修改密码", "安全设置"],
    },
    SanityCase {
        name: "完全一致",
        prediction: &["用户登录", "查看余额", "修改密码", "安全设置"],
        reference: &["用户登录", "查看余额", "修改密码", "安全设置"],
    },
];

/// The canned cases as scorable pairs keyed by case name
pub fn sanity_pairs() -> Vec<AlignedPair> {
    SANITY_CASES
        .iter()
        .map(|case| AlignedPair {
            key: RowKey::Case(case.name.to_string()),
            prediction: case.prediction.join(" "),
            reference: case.reference.join(" "),
        })
        .collect()
}
