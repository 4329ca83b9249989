//! The reviewer agent: one static persona and one task per request.

use crate::llm::ChatMessage;

/// A static agent persona.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

/// The code improvement reviewer.
pub fn code_improvement_agent() -> AgentProfile {
    AgentProfile {
        role: "Code Improvement Specialist",
        goal: "Analyze the existing code and suggest improvements based on SOLID principles \
               and key design patterns.",
        backstory: "This agent specializes in identifying violations of best development \
                    practices and proposing solutions that follow SOLID principles (Single \
                    Responsibility, Open/Closed, Liskov Substitution, Interface Segregation, \
                    Dependency Inversion). It is also capable of recommending and applying \
                    design patterns such as Factory, Singleton, Strategy, and Observer, \
                    enhancing the maintainability and extensibility of the system.",
    }
}

/// One reviewing task: the persona plus a natural-language instruction
/// embedding the submitted code.
#[derive(Debug, Clone)]
pub struct ReviewTask {
    pub agent: AgentProfile,
    pub description: String,
    pub expected_output: String,
}

/// Build the code improvement task for one snippet, answering in `language`.
pub fn code_improvement_task(code: &str, language: &str) -> ReviewTask {
    ReviewTask {
        agent: code_improvement_agent(),
        description: format!(
            "Review the following code snippet and identify possible improvements in terms of \
             structure, readability, reusability, and adherence to development standards, Clean \
             Architecture, and SOLID principles. Highlight suboptimal practices and suggest \
             refactorings to enhance code clarity and efficiency.\n\n\
             Please ensure that the analysis and suggestions are provided in **{language}**.\n\n\
             Code to review:\n{code}"
        ),
        expected_output: format!(
            "A detailed analysis of the code, identifying areas for improvement in best \
             practices, organization, and efficiency, along with actionable suggestions for \
             enhancement. The output must be in {language}."
        ),
    }
}

impl ReviewTask {
    /// Render the persona and instruction as a chat exchange.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        let system = format!(
            "You are {}.\n\nGoal: {}\n\n{}",
            self.agent.role, self.agent.goal, self.agent.backstory
        );
        let user = format!(
            "{}\n\nExpected output: {}",
            self.description, self.expected_output
        );
        vec![ChatMessage::system(system), ChatMessage::user(user)]
    }
}

#[cfg(test)]
mod tests {
    use crate::llm::Role;

    use super::*;

    #[test]
    fn task_embeds_code_and_language() {
        let task = code_improvement_task("def f(): pass", "English");
        assert!(task.description.contains("def f(): pass"));
        assert!(task.description.contains("**English**"));
        assert!(task.expected_output.contains("English"));
    }

    #[test]
    fn task_renders_as_system_then_user() {
        let task = code_improvement_task("x = 1", "English");
        let messages = task.to_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Code Improvement Specialist"));
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.contains("x = 1"));
    }
}
