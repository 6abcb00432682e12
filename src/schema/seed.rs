//! Fixed lookup rows inserted at initialization

/// Official operator tags, in the order they are seeded
pub const TAG_DICT_SEED: &[&str] = &[
    "治疗",
    "支援",
    "输出",
    "群攻",
    "减速",
    "生存",
    "防护",
    "削弱",
    "位移",
    "控场",
    "爆发",
    "召唤",
    "快速复活",
    "费用回复",
    "支援机械",
    "元素",
    "高空",
];
