use serde::{Deserialize, Serialize};

/// 流式内容块：高级文章的正文由一组带类型的内容块构成
/// 块只是交给模板层的数据，查询逻辑从不检查块内容
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamBlock {
    /// 标题加正文，没有别的
    TitleAndText {
        title: String,
        text: String,
    },
    /// 富文本块（Markdown，渲染交给模板的 markdown 过滤器）
    RichText {
        text: String,
    },
    /// 卡片列表块
    Cards {
        title: String,
        cards: Vec<CardItem>,
    },
    /// 行动号召块
    Cta {
        title: String,
        text: String,
        button_url: String,
        button_text: String,
    },
}

/// 卡片列表中的单张卡片
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardItem {
    /// 卡片图片
    pub image: Option<String>,
    /// 卡片标题
    pub title: String,
    /// 卡片正文
    #[serde(default)]
    pub text: String,
    /// 卡片链接
    pub link: Option<String>,
}
