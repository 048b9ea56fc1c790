//! ReAct模式的配置与响应类型

use std::time::Duration;

use rig::completion::Message;

/// ReAct执行配置
#[derive(Debug, Clone)]
pub struct ReActConfig {
    /// 最大迭代次数
    pub max_iterations: usize,
    /// 最大执行时间（墙钟预算）
    pub max_execution: Duration,
    /// 是否输出详细日志
    pub verbose: bool,
    /// 达到最大迭代次数时返回部分结果而不是报错
    pub return_partial_on_max_depth: bool,
    /// 达到最大迭代次数时启用总结推理兜底
    pub enable_summary_reasoning: bool,
}

impl Default for ReActConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            max_execution: Duration::from_secs(300),
            verbose: false,
            return_partial_on_max_depth: true,
            enable_summary_reasoning: true,
        }
    }
}

/// ReAct执行响应
#[derive(Debug, Clone)]
pub struct ReActResponse {
    /// 最终内容
    pub content: String,
    /// 实际使用的迭代次数（截断时为上限值）
    pub iterations_used: usize,
    /// 是否因达到最大迭代次数而截断
    pub stopped_by_max_depth: bool,
    /// 工具调用记录（函数名与参数的文本形式）
    pub tool_calls_history: Vec<String>,
    /// 对话历史，供总结推理兜底使用
    pub chat_history: Option<Vec<Message>>,
}

impl ReActResponse {
    /// 正常完成
    pub fn success(content: String, iterations_used: usize) -> Self {
        Self {
            content,
            iterations_used,
            stopped_by_max_depth: false,
            tool_calls_history: Vec::new(),
            chat_history: None,
        }
    }

    /// 因达到最大迭代次数而截断，携带部分结果与历史
    pub fn max_depth_reached_with_history(
        content: String,
        iterations_used: usize,
        tool_calls_history: Vec<String>,
        chat_history: Vec<Message>,
    ) -> Self {
        Self {
            content,
            iterations_used,
            stopped_by_max_depth: true,
            tool_calls_history,
            chat_history: Some(chat_history),
        }
    }

    /// 总结推理兜底产生的响应
    pub fn from_summary_reasoning(
        content: String,
        iterations_used: usize,
        tool_calls_history: Vec<String>,
        chat_history: Vec<Message>,
    ) -> Self {
        Self {
            content,
            iterations_used,
            stopped_by_max_depth: false,
            tool_calls_history,
            chat_history: Some(chat_history),
        }
    }
}
