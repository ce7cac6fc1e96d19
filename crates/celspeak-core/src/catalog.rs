//! Task catalog.
//!
//! The catalog is an ordered, immutable list of speaking tasks loaded once at
//! startup. The built-in catalog mirrors the eight CELPIP speaking tasks; a
//! TOML file can replace it via the `catalog_path` config key.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Result, ValidationError};
use crate::storage::Config;

/// Collapsible guidance shown next to a task prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Helper {
    pub title: String,
    pub points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Preparation time in seconds.
    pub prep_time: u32,
    /// Speaking time in seconds.
    pub speak_time: u32,
    #[serde(default)]
    pub requires_image: bool,
    pub samples: Vec<String>,
    #[serde(default)]
    pub helper: Option<Helper>,
}

impl Task {
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn sample(&self, index: usize) -> Option<&str> {
        self.samples.get(index).map(String::as_str)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.prep_time == 0 {
            return Err(ValidationError::InvalidValue {
                field: format!("task {}.prep_time", self.id),
                message: "must be greater than zero".into(),
            });
        }
        if self.speak_time == 0 {
            return Err(ValidationError::InvalidValue {
                field: format!("task {}.speak_time", self.id),
                message: "must be greater than zero".into(),
            });
        }
        if self.samples.is_empty() {
            return Err(ValidationError::EmptyCollection(format!(
                "task {} samples",
                self.id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    tasks: Vec<Task>,
}

/// Ordered, validated task list. Never empty.
#[derive(Debug, Clone)]
pub struct TaskCatalog {
    tasks: Vec<Task>,
}

impl TaskCatalog {
    /// Validate and wrap a task list.
    ///
    /// # Errors
    /// Fails on an empty list, duplicate ids, zero durations or a task
    /// without samples.
    pub fn new(tasks: Vec<Task>) -> Result<Self, ValidationError> {
        if tasks.is_empty() {
            return Err(ValidationError::EmptyCollection("tasks".into()));
        }
        let mut seen = HashSet::new();
        for task in &tasks {
            if !seen.insert(task.id) {
                return Err(ValidationError::DuplicateTaskId(task.id));
            }
            task.validate()?;
        }
        Ok(Self { tasks })
    }

    /// Parse a catalog from TOML (`[[tasks]]` tables).
    pub fn from_toml_str(content: &str) -> Result<Self, ValidationError> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| ValidationError::ParseFailed(e.to_string()))?;
        Self::new(file.tasks)
    }

    /// The catalog named by `catalog_path`, or the built-in tasks when unset.
    pub fn for_config(config: &Config) -> Result<Self> {
        match &config.catalog_path {
            Some(path) => Ok(Self::load(path)?),
            None => Ok(Self::builtin()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::ParseFailed(format!("{}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The first task in catalog order; the home/default task.
    pub fn first(&self) -> &Task {
        // Construction guarantees at least one task.
        &self.tasks[0]
    }

    /// Look up `id`, falling back to the first task when it does not resolve.
    pub fn resolve(&self, id: u32) -> &Task {
        self.get(id).unwrap_or_else(|| self.first())
    }

    /// The built-in CELPIP speaking catalog.
    pub fn builtin() -> Self {
        Self {
            tasks: builtin_tasks(),
        }
    }
}

impl Default for TaskCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[allow(clippy::too_many_arguments)]
fn task(
    id: u32,
    title: &str,
    description: &str,
    prep_time: u32,
    speak_time: u32,
    requires_image: bool,
    samples: [&str; 3],
    helper_title: &str,
    points: [&str; 5],
) -> Task {
    Task {
        id,
        title: title.into(),
        description: description.into(),
        prep_time,
        speak_time,
        requires_image,
        samples: samples.iter().map(|s| s.to_string()).collect(),
        helper: Some(Helper {
            title: helper_title.into(),
            points: points.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

fn builtin_tasks() -> Vec<Task> {
    vec![
        task(
            1,
            "Giving Advice",
            "Provide advice to a friend or family member regarding a common situation.",
            30,
            90,
            false,
            [
                "Your friend is thinking about buying a second-hand car. Give him advice on what he should look for and how to negotiate the price.",
                "A family member wants to start a new exercise routine but doesn't know where to begin. Advise them on how to start safely and stay motivated.",
                "Your colleague is planning a first-time trip to a foreign country. Advise them on how to prepare for cultural differences and stay safe.",
            ],
            "Structure Advice",
            ["Friendly Greeting", "Acknowledge Situation", "Direct Advice", "Reasons/Explanations", "Encouraging Closing"],
        ),
        task(
            2,
            "Personal Experience",
            "Describe a personal memory or event from your past.",
            30,
            60,
            false,
            [
                "Talk about a time you visited a place that left a strong impression on you. What was the place and why was it memorable?",
                "Describe a celebration or festival you attended recently. Who was there and what happened?",
                "Tell a story about a challenge you faced and how you overcame it. What did you learn from the experience?",
            ],
            "Storytelling Tips",
            ["Set the Scene (Who/Where/When)", "Key Events (Chronological)", "Climax/Challenge", "Outcome", "Personal Reflection"],
        ),
        task(
            3,
            "Describe a Scene",
            "Describe a detailed illustration or photograph.",
            30,
            60,
            true,
            [
                "Describe everything that is happening in this picture. What are the people doing?",
                "Explain the environment and the interactions between the individuals in this scene.",
                "Describe the visual details of this scene including foreground, background, and actions.",
            ],
            "Scanning Technique",
            ["General Overview", "Foreground Actions", "Background Details", "Interactions", "Atmosphere"],
        ),
        task(
            4,
            "Make Predictions",
            "Predict what will happen next in the image provided.",
            30,
            60,
            true,
            [
                "Look at the picture and predict what will happen in the next 1-2 minutes.",
                "Based on the current actions, what do you think the characters will do next?",
                "Forecast the outcome of the situation shown in the image.",
            ],
            "Prediction Formula",
            ["Identify Current Clue", "Logical Outcome", "Speculate Variations", "Future Tense Usage", "Specific Actions"],
        ),
        task(
            5,
            "Comparing & Persuading",
            "Choose between two options and persuade someone to agree with your choice.",
            60,
            60,
            false,
            [
                "You have two options for a weekend retreat: a quiet cabin in the woods or a luxury hotel in the city. Persuade your partner to choose your preference.",
                "Compare two different gyms in your neighborhood. Convince your friend why the more expensive one is worth the extra cost.",
                "Your office is choosing a new coffee machine. Compare a high-end espresso maker vs a standard drip machine and argue for your choice.",
            ],
            "Persuasion Flow",
            ["State Preference", "Compare Key Features", "Highlight Benefits", "Address Counter-arguments", "Final Call to Action"],
        ),
        task(
            6,
            "Difficult Situation",
            "Explain a decision or situation to someone who may be disappointed or concerned.",
            60,
            60,
            false,
            [
                "You promised to help a friend move, but you have a family emergency. Call your friend and explain why you can't come.",
                "You need to tell your boss that a major project will be delayed by one week. Explain the reasons and offer a solution.",
                "You accidentally broke an expensive item borrowed from a neighbor. Explain what happened and how you plan to fix it.",
            ],
            "Handling Conflict",
            ["Empathetic Opening", "Direct Explanation", "Give Context/Reason", "Propose Solution/Alternative", "Express Sincerity"],
        ),
        task(
            7,
            "Expressing Opinions",
            "Answer a challenging question by stating and supporting your opinion.",
            30,
            90,
            false,
            [
                "Do you think social media has a positive or negative impact on the mental health of teenagers? Explain your reasons.",
                "Should companies be required to provide a 4-day work week? Why or why not?",
                "Is it better for children to grow up in a big city or a small town? Support your opinion with examples.",
            ],
            "Opinion Structure",
            ["Clear Thesis Statement", "Reason 1 + Example", "Reason 2 + Example", "Summary of Main Points", "Strong Conclusion"],
        ),
        task(
            8,
            "Unusual Situation",
            "Describe an unusual or strange object or scene to someone who cannot see it.",
            30,
            60,
            false,
            [
                "You are at a modern art gallery and see a very strange sculpture. Describe it in detail to a friend over the phone.",
                "You found a bizarre-looking tool in your grandfather's attic. Describe its shape, material, and possible function.",
                "Describe a futuristic gadget you saw in a movie to someone who hasn't seen it yet.",
            ],
            "Descriptive Strategy",
            ["General Shape/Size", "Color & Material", "Specific Details", "Hypothesized Function", "Context/Location"],
        ),
    ]
}
