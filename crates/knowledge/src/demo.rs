//! Built-in demonstration corpus.
//!
//! Ten short passages about a fictional company's staff and projects,
//! linked so that most questions need two hops (person → project → people).

use hoprag_core::Passage;

const DEMO: [(&str, &str, &str); 10] = [
    ("张三是一名资深的软件工程师，目前在北京科技公司工作。他擅长Python和机器学习技术。", "员工档案", "个人信息"),
    ("张三与李四在同一个项目组中合作，他们负责开发公司的AI产品。", "项目记录", "团队信息"),
    ("李四是项目经理，负责管理飞天项目的整体进度和团队协调。", "项目记录", "职责信息"),
    ("飞天项目是公司的重点AI项目，旨在开发下一代智能对话系统。", "项目文档", "项目描述"),
    ("飞天项目团队包括张三、李四、王五等多名工程师，预计2024年完成。", "项目文档", "团队组成"),
    ("王五负责飞天项目的前端开发工作，与张三的后端开发形成配合。", "项目记录", "分工信息"),
    ("公司还有另一个项目叫做星辰项目，由赵六负责，专注于数据分析平台。", "项目文档", "其他项目"),
    ("赵六是数据科学家，专门负责星辰项目的算法设计和数据处理。", "员工档案", "个人信息"),
    ("李四之前还参与过云端项目，该项目已于2023年成功上线。", "项目历史", "历史记录"),
    ("张三在加入飞天项目之前，曾经在智能助手项目中担任核心开发者。", "员工档案", "工作经历"),
];

/// Sample questions the demo corpus can answer.
pub const DEMO_QUESTIONS: [&str; 3] = [
    "张三参与了哪个项目？",
    "飞天项目的团队成员有哪些？",
    "李四负责什么工作？",
];

/// The demo passages, tagged with `source` and `type`.
pub fn demo_passages() -> Vec<Passage> {
    DEMO.iter()
        .map(|(content, source, kind)| {
            Passage::new(*content)
                .with_tag("source", *source)
                .with_tag("type", *kind)
        })
        .collect()
}
