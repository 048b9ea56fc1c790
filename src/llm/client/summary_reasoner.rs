//! 总结推理模块 - 当ReAct模式达到最大迭代次数时的fallover机制

use anyhow::Result;
use rig::completion::Message;

use super::providers::ProviderAgent;

/// 总结推理器
pub struct SummaryReasoner;

impl SummaryReasoner {
    /// 基于ReAct对话历史和工具调用记录进行总结推理
    pub async fn summarize_and_reason(
        agent_without_tools: &ProviderAgent,
        original_system_prompt: &str,
        original_user_prompt: &str,
        chat_history: &[Message],
        tool_calls_history: &[String],
    ) -> Result<String> {
        // 构建总结推理的提示词
        let summary_prompt = Self::build_summary_prompt(
            original_system_prompt,
            original_user_prompt,
            chat_history,
            tool_calls_history,
        );

        // 使用无工具的agent进行单轮推理
        let result = agent_without_tools.prompt(&summary_prompt).await?;

        Ok(result)
    }

    /// 构建总结推理的提示词
    fn build_summary_prompt(
        original_system_prompt: &str,
        original_user_prompt: &str,
        chat_history: &[Message],
        tool_calls_history: &[String],
    ) -> String {
        let mut prompt = String::new();

        prompt.push_str("# Original Task Background\n");
        prompt.push_str(original_system_prompt);
        prompt.push_str("\n\n");

        prompt.push_str("# Original Research Request\n");
        prompt.push_str(original_user_prompt);
        prompt.push_str("\n\n");

        if !tool_calls_history.is_empty() {
            prompt.push_str("# Tool Calls Already Executed\n");
            for (index, tool_call) in tool_calls_history.iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", index + 1, tool_call));
            }
            prompt.push('\n');
        }

        let conversation_details = Self::extract_detailed_conversation_info(chat_history);
        if !conversation_details.is_empty() {
            prompt.push_str("# Conversation History And Tool Results\n");
            prompt.push_str(&conversation_details);
            prompt.push_str("\n\n");
        }

        prompt.push_str("# Summarization Task\n");
        prompt.push_str(
            "The multi-turn research loop above was cut off after reaching its iteration limit. \
             Based on the context, tool call records and conversation history gathered so far, \
             write a complete research summary for the original request covering attractions, \
             ratings, prices, weather, local customs and anything else the findings support.\n\n",
        );
        prompt.push_str("Notes:\n");
        prompt.push_str("1. Reason only from the information above; do not invent findings\n");
        prompt.push_str(
            "2. If the findings are incomplete, state what is known and what is still missing\n",
        );
        prompt.push_str("3. Keep concrete place names, ratings and figures from the tool results\n");

        prompt
    }

    /// 提取更详细的对话信息，包括工具调用和相关上下文
    fn extract_detailed_conversation_info(chat_history: &[Message]) -> String {
        let mut details = String::new();

        for (index, message) in chat_history.iter().enumerate() {
            if index == 0 {
                // 跳过第一个用户输入（原user prompt），因为上面已经拼接过了
                continue;
            }
            match message {
                Message::User { content } => {
                    details.push_str(&format!("## User Input [turn {}]\n", index + 1));
                    details.push_str(&format!("{:#?}\n\n", content));
                }
                Message::Assistant { content, .. } => {
                    details.push_str(&format!("## Assistant Response [turn {}]\n", index + 1));

                    // 分别处理文本内容和工具调用
                    let mut has_content = false;

                    for item in content.iter() {
                        match item {
                            rig::completion::AssistantContent::Text(text) => {
                                if !text.text.is_empty() {
                                    details.push_str(&format!("**Text:** {}\n\n", text.text));
                                    has_content = true;
                                }
                            }
                            rig::completion::AssistantContent::ToolCall(tool_call) => {
                                details.push_str(&format!(
                                    "**Tool call:** `{}` \nArguments: `{}`\n\n",
                                    tool_call.function.name, tool_call.function.arguments
                                ));
                                has_content = true;
                            }
                            rig::completion::AssistantContent::Reasoning(reasoning) => {
                                if !reasoning.reasoning.is_empty() {
                                    let reasoning_text = reasoning.reasoning.join("\n");
                                    details
                                        .push_str(&format!("**Reasoning:** {}\n\n", reasoning_text));
                                    has_content = true;
                                }
                            }
                        }
                    }

                    if !has_content {
                        details.push_str("(empty)\n\n");
                    }
                }
            }
        }

        details
    }
}
