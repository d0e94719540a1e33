//! User prompt for the initial lesson generation step.

use std::path::Path;

/// Build the user prompt that instructs the agent to generate a lesson file.
pub fn build_generation_prompt(
    spec_path: &Path,
    curriculum_path: &Path,
    output_file: &Path,
    document_id: &str,
) -> String {
    format!(
        r#"Generate a lesson from the specification.

**Lesson spec file**: {spec}
**Curriculum context**: {curriculum}
**Output file path**: {output}

Steps:
1. Read the lesson spec: {spec}
2. Read the curriculum for context: {curriculum}
3. Generate a complete, high-quality .lesson file
4. Write it to: {output}

The lesson should include:
- Proper <Meta> block with lesson ID "{id}" and appropriate title/tags
- Rich instructional content with sections (use `type` attribute: concept, code, tip, example)
- Markdown formatting in Body text (**bold**, *italic*, `code`, lists)
- LaTeX math expressions where appropriate ($inline$ and $$display$$)
- At least 4 FlashCards for key concepts
- At least 2 SingleSelect questions
- At least 1 MultiSelect question
- At least 1 SortQuiz
- At least 1 MatchPairs question
- At least 1 FillBlanks question
- At least 1 Subjective question with rubric
- All assessment IDs must be unique

Make the content genuinely educational and research-grade.
Write exactly one output file, at exactly the path above.
Once you have written the file, confirm that you are done."#,
        spec = spec_path.display(),
        curriculum = curriculum_path.display(),
        output = output_file.display(),
        id = document_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_contains_id_and_paths() {
        let prompt = build_generation_prompt(
            &PathBuf::from("curriculum/module_01/lesson_01_01.md"),
            &PathBuf::from("curriculum/curriculum.json"),
            &PathBuf::from("output/module_01/lesson_01_01.lesson"),
            "lesson-01-01",
        );
        assert!(prompt.contains(r#"lesson ID "lesson-01-01""#));
        assert!(prompt.contains("curriculum/module_01/lesson_01_01.md"));
        assert!(prompt.contains("output/module_01/lesson_01_01.lesson"));
    }

    #[test]
    fn test_lists_minimum_content_checklist() {
        let prompt = build_generation_prompt(
            &PathBuf::from("a.md"),
            &PathBuf::from("c.json"),
            &PathBuf::from("o.lesson"),
            "a",
        );
        assert!(prompt.contains("At least 4 FlashCards"));
        assert!(prompt.contains("At least 2 SingleSelect"));
        assert!(prompt.contains("Subjective question with rubric"));
        assert!(prompt.contains("exactly one output file"));
    }
}
