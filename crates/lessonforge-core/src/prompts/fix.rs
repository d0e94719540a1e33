//! User prompt for fixing validation errors.
//!
//! Sent to the agent when the external validator reports errors in the
//! generated lesson file. The diagnostic text is embedded verbatim — never
//! summarized or truncated — so the agent sees everything the validator
//! reported.

use std::path::Path;

/// Build a prompt that gives the agent validation errors to fix.
///
/// `attempt` is the current fix attempt number (1-indexed).
pub fn build_fix_prompt(output_file: &Path, validation_errors: &str, attempt: u32) -> String {
    format!(
        r#"The lesson file you generated failed validation (attempt {attempt}).

**File**: {output}

**Validation errors**:
```
{validation_errors}
```

Read the error messages carefully, then edit the file to fix every error.
After making your fixes, confirm that you are done."#,
        output = output_file.display(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_diagnostics_embedded_verbatim() {
        let errors = "line 4: Error: unclosed <Section>\nline 9: Error: duplicate id \"q1\"";
        let prompt = build_fix_prompt(&PathBuf::from("out/lesson_01.lesson"), errors, 3);
        assert!(prompt.contains(errors));
        assert!(prompt.contains("attempt 3"));
        assert!(prompt.contains("out/lesson_01.lesson"));
    }

    #[test]
    fn test_multiline_diagnostics_not_truncated() {
        let errors: String = (0..100)
            .map(|i| format!("Error {i}: something\n"))
            .collect();
        let prompt = build_fix_prompt(&PathBuf::from("f.lesson"), &errors, 1);
        assert!(prompt.contains("Error 0: something"));
        assert!(prompt.contains("Error 99: something"));
    }
}
