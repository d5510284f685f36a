//! 模板子系统
//!
//! token 路径解析、命名转换和字符串模板渲染。

pub mod renderer;
pub mod tokens;
pub mod transform;

pub use renderer::TemplateRenderer;
pub use tokens::TokenFinder;
pub use transform::{TransformFn, TransformRegistry};
