//! 数据模型模块
//! 登录事件（队列消息）与写入数据库的行

pub mod login;
pub mod row;

pub use login::*;
pub use row::*;
