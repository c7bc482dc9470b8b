use thiserror::Error;

/// 查询错误类型
#[derive(Error, Debug)]
pub enum QueryError {
    /// 作者过滤指定了不存在的用户名
    /// 解析器内部不捕获这个错误，由上层作为服务器错误暴露
    #[error("未知的作者: {username}")]
    UnknownAuthor { username: String },
}
