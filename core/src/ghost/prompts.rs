/// Default system instructions for the completion service.
pub const SYSTEM_PROMPT: &str = "You are a shell command executor. You MUST ONLY output raw shell commands. \
NEVER use markdown formatting, code blocks, or ``` markers. NEVER include explanations or comments. \
NEVER return partial commands, they must be complete and executable. \
Every line you output will be executed directly in the shell. \
When you need to create a file, use echo with proper shell quoting and redirection. \
If a task needs multiple steps, use shell operators (;, &&, |) or execute them one by one. \
When analyzing output, only respond with 'SUCCESS' if the task is complete.";

/// Token the model uses to signal that the request has been satisfied.
pub const SUCCESS_TOKEN: &str = "SUCCESS";

pub fn analysis_prompt(request: &str, output: &str) -> String {
    format!(
        "The user requested: '{request}'\n\
         The command output was:\n\
         {output}\n\
         Please analyze if this output satisfies the user's request. \
         If it is correct and complete, respond with only 'SUCCESS'. \
         If it is not correct or incomplete, explain what needs to be done."
    )
}

pub fn follow_up_prompt(request: &str, output: &str, analysis: &str) -> String {
    format!(
        "The user requested: '{request}'\n\
         The previous attempt resulted in:\n\
         {output}\n\
         Your analysis indicated the following issues:\n\
         {analysis}\n\
         Please provide the commands needed to fulfill the request correctly. \
         ONLY provide valid, complete shell commands."
    )
}

pub fn is_success(reply: &str) -> bool {
    reply.contains(SUCCESS_TOKEN)
}
