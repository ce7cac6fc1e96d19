use indoc::formatdoc;

use crate::catalog::Task;

/// Prompt sent to the generation service for a model answer to `prompt_text`.
pub fn build_prompt(task: &Task, prompt_text: &str) -> String {
    let image_hint = if task.requires_image {
        "\nDescribe the attached image vividly where the task calls for it."
    } else {
        ""
    };
    formatdoc! {"
        As a CELPIP English test expert (Level 12), provide a high-scoring spoken model answer for this task:

        Task Type: {title}
        Description: {description}
        Prompt: \"{prompt_text}\"

        Please provide only the transcript of the spoken answer. Use natural, fluent English suitable for a top-tier score (Level 9-12), with appropriate transitions and advanced vocabulary.{image_hint}
        ",
        title = task.title,
        description = task.description,
    }
}
