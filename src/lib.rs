//! Homework Tracker - 辅导小组作业布置与提交后端服务
//!
//! 基于 Actix Web 构建：教师向小组或指定学生布置作业，学生提交答案，教师批改。
//!
//! # 架构
//! - `cache`: 对象缓存（Moka）
//! - `config`: 配置管理
//! - `domain`: 作业、学生与提交之间的关联规则（无 I/O）
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `middlewares`: 认证授权中间件
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）与上传文件存储
//! - `utils`: 工具函数

pub mod cache;
pub mod config;
pub mod domain;
pub mod entity;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
