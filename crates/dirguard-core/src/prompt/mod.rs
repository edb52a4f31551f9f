//! Grading prompt assembly
//!
//! Builds the fixed-format prompt handed to the model from a task's
//! `readme.md`, its `Варианты.md` variant list and the student's variant
//! number from the roster.

pub mod sections;

use crate::error::Result;
use crate::policy::detect::normalize_task;
use crate::roster::Roster;
use sections::{extract_section, ARTIFACTS, BONUSES, CRITERIA, DESCRIPTION};
use std::path::{Path, PathBuf};

/// Variant shown when the roster has none for the student
pub const UNKNOWN_VARIANT: &str = "(unknown)";

/// Variant list file name inside a task folder
pub const VARIANTS_FILE: &str = "Варианты.md";

const SYSTEM_MESSAGE: &str = "Ты строгий проверяющий лабораторных работ. Оценивай только по \
    критериям, не рассуждай вне шаблона, не проявляй эмпатию, не добавляй лишних комментариев. \
    Следуй формату вывода и инструкциям промпта.";

/// Sections pulled out of a task readme
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSections {
    /// Work description
    pub description: String,
    /// Grading criteria
    pub criteria: String,
    /// Deliverables
    pub artifacts: String,
    /// Bonus criteria
    pub bonuses: String,
}

impl TaskSections {
    /// Extract all sections from readme text
    pub fn from_readme(readme: &str) -> Self {
        Self {
            description: extract_section(readme, DESCRIPTION),
            criteria: extract_section(readme, CRITERIA),
            artifacts: extract_section(readme, ARTIFACTS),
            bonuses: extract_section(readme, BONUSES),
        }
    }

    /// Criteria followed by the bonus block, when present
    pub fn criteria_with_bonuses(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(2);
        if !self.criteria.is_empty() {
            parts.push(self.criteria.clone());
        }
        if !self.bonuses.is_empty() {
            parts.push(format!("Бонусы (+ до 10)\n{}", self.bonuses));
        }
        parts.join("\n\n").trim().to_string()
    }
}

/// Description of variant `variant` from a `N. text` list
pub fn variant_description(variants: &str, variant: &str) -> Option<String> {
    let n: u32 = variant.trim().parse().ok()?;
    let prefix = format!("{}.", n);
    variants.lines().find_map(|line| {
        let rest = line.strip_prefix(prefix.as_str())?;
        rest.starts_with(char::is_whitespace)
            .then(|| rest.trim().to_string())
    })
}

/// Everything the prompt template needs
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    /// Student folder name
    pub student: &'a str,
    /// Task folder (`task_NN`)
    pub task: &'a str,
    /// Variant number as written in the roster
    pub variant: &'a str,
    /// Task readme text (may be empty)
    pub readme: &'a str,
    /// Variant list text (may be empty)
    pub variants: &'a str,
}

fn or_placeholder<'s>(text: &'s str, placeholder: &'s str) -> &'s str {
    if text.is_empty() {
        placeholder
    } else {
        text
    }
}

/// Render the grading prompt
pub fn assemble_prompt(input: &PromptInput<'_>) -> String {
    let sections = TaskSections::from_readme(input.readme);
    let criteria = sections.criteria_with_bonuses();
    let variant_desc = variant_description(input.variants, input.variant)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| "(описание варианта не найдено)".to_string());

    let lines: Vec<String> = vec![
        "[System message для AI]:".into(),
        SYSTEM_MESSAGE.into(),
        "[Рекомендация: использовать temperature=0.3 для консистентности оценок]".into(),
        String::new(),
        "Оцени лабораторную работу.".into(),
        format!(
            "Смотреть файлы только в папке: (\"students\\{}\\{}\").",
            input.student, input.task
        ),
        format!("Проверять только лабораторную работу в папке : \"{}\".", input.task),
        "Игнорируй все изображения(\".jpg\", \".jpeg\", \".png\", \".gif\", \".svg\", \".webp\", \".avif\").".into(),
        "Игнорируй служебные и временные файлы(\".tmp\",\".bak\",\".zip\",\".rar\",\".7z\"),".into(),
        "Описание работы:".into(),
        or_placeholder(&sections.description, "(Описание не найдено в readme)").into(),
        String::new(),
        "Проверить соответствие теме варианту задания:".into(),
        format!("Вариант {}: {}", input.variant, variant_desc),
        "Явно проверь, что тема работы соответствует описанию варианта.".into(),
        String::new(),
        "Оценить по критериям:".into(),
        or_placeholder(&criteria, "(Критерии не найдены в readme)").into(),
        String::new(),
        "лабораторная работа должна содержать:".into(),
        or_placeholder(&sections.artifacts, "(Артефакты не найдены в readme)").into(),
        String::new(),
        "Выводи строго в формате:".into(),
        "критерии: NNN / XXX".into(),
        "Итого: NNN / 100".into(),
        String::new(),
        "Предлагай фиксы по улучшению, максимум 2 и кратко(по 1 предложению каждый).".into(),
        "анализируй только файлы, которые есть в папке.".into(),
        "Не описывай найденные файлы, только используй их для оценки.".into(),
    ];
    lines.join("\n")
}

fn read_or_empty(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "file not found, using empty text");
            Ok(String::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Builds prompts from a course repository checkout
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    root: PathBuf,
}

impl PromptBuilder {
    /// Builder rooted at a repository checkout
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `students/students.csv` under the root
    pub fn roster_path(&self) -> PathBuf {
        self.root.join("students").join("students.csv")
    }

    /// `tasks/<task>` under the root
    pub fn task_dir(&self, task: &str) -> PathBuf {
        self.root.join("tasks").join(task)
    }

    /// Load the roster for variant lookups, or an empty one when the file
    /// does not exist. Rows without a GitHub username are kept.
    pub fn load_roster(&self) -> Result<Roster> {
        let path = self.roster_path();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "roster not found");
            return Ok(Roster::default());
        }
        Ok(Roster::from_csv_path_lenient(&path)?.0)
    }

    /// Prompt for `student` and a raw task reference (`1`, `task_1`, `task_01`)
    pub fn build(&self, student: &str, task_raw: &str, roster: &Roster) -> Result<String> {
        let task = normalize_task(task_raw)?;
        let variant = roster
            .find_by_student(student)
            .and_then(|r| r.variant.as_deref())
            .unwrap_or(UNKNOWN_VARIANT);

        let dir = self.task_dir(&task);
        let readme = read_or_empty(&dir.join("readme.md"))?;
        let variants = read_or_empty(&dir.join(VARIANTS_FILE))?;
        tracing::debug!(student, task = %task, variant, "assembling prompt");

        Ok(assemble_prompt(&PromptInput {
            student,
            task: &task,
            variant,
            readme: &readme,
            variants: &variants,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::StudentRecord;

    const README: &str = "## Описание\nСделать SPA.\n\n\
        <!-- START: criteria -->\n## Критерии оценивания\n- Роутинг: 50\n- Тесты: 50\n<!-- END: criteria -->\n\n\
        ## Артефакты (что сдаём)\n- src/\n\n\
        ## Бонусы (+ до 10)\n- PWA\n";

    const VARIANTS: &str = "1. Блог\n2. Магазин книг\n12. Трекер задач\n";

    #[test]
    fn test_variant_description() {
        assert_eq!(variant_description(VARIANTS, "2").as_deref(), Some("Магазин книг"));
        assert_eq!(variant_description(VARIANTS, "12").as_deref(), Some("Трекер задач"));
        assert_eq!(variant_description(VARIANTS, "02").as_deref(), Some("Магазин книг"));
        assert_eq!(variant_description(VARIANTS, "3"), None);
        assert_eq!(variant_description(VARIANTS, UNKNOWN_VARIANT), None);
    }

    #[test]
    fn test_criteria_with_bonuses() {
        let s = TaskSections::from_readme(README);
        assert_eq!(
            s.criteria_with_bonuses(),
            "- Роутинг: 50\n- Тесты: 50\n\nБонусы (+ до 10)\n- PWA"
        );
        assert_eq!(TaskSections::default().criteria_with_bonuses(), "");
    }

    #[test]
    fn test_assemble_prompt() {
        let prompt = assemble_prompt(&PromptInput {
            student: "Ivanov",
            task: "task_04",
            variant: "2",
            readme: README,
            variants: VARIANTS,
        });
        assert!(prompt.starts_with("[System message для AI]:\n"));
        assert!(prompt.contains("(\"students\\Ivanov\\task_04\")"));
        assert!(prompt.contains("Описание работы:\nСделать SPA.\n"));
        assert!(prompt.contains("Вариант 2: Магазин книг"));
        assert!(prompt.contains("лабораторная работа должна содержать:\n- src/\n"));
        assert!(prompt.ends_with("только используй их для оценки."));
    }

    #[test]
    fn test_assemble_prompt_placeholders() {
        let prompt = assemble_prompt(&PromptInput {
            student: "Ivanov",
            task: "task_01",
            variant: UNKNOWN_VARIANT,
            readme: "",
            variants: "",
        });
        assert!(prompt.contains("(Описание не найдено в readme)"));
        assert!(prompt.contains("Вариант (unknown): (описание варианта не найдено)"));
        assert!(prompt.contains("(Критерии не найдены в readme)"));
        assert!(prompt.contains("(Артефакты не найдены в readme)"));
    }

    #[test]
    fn test_builder_reads_task_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let task_dir = dir.path().join("tasks").join("task_04");
        std::fs::create_dir_all(&task_dir).unwrap();
        std::fs::write(task_dir.join("readme.md"), README).unwrap();
        std::fs::write(task_dir.join(VARIANTS_FILE), VARIANTS).unwrap();

        let mut student = StudentRecord::new("ivanov-gh", "students/Ivanov");
        student.variant = Some("12".to_string());
        let roster: Roster = std::iter::once(student).collect();

        let prompt = PromptBuilder::new(dir.path()).build("Ivanov", "4", &roster).unwrap();
        assert!(prompt.contains("Вариант 12: Трекер задач"));
        assert!(prompt.contains("папке : \"task_04\"."));
    }

    #[test]
    fn test_builder_missing_files_and_bad_task() {
        let dir = tempfile::TempDir::new().unwrap();
        let builder = PromptBuilder::new(dir.path());
        let roster = builder.load_roster().unwrap();
        assert!(roster.is_empty());

        let prompt = builder.build("Nobody", "task_9", &roster).unwrap();
        assert!(prompt.contains("Вариант (unknown)"));
        assert!(builder.build("Nobody", "task", &roster).is_err());
    }
}
