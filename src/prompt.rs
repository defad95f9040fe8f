//! Instructions that make a model emit files in the form the extractor reads.

use std::path::Path;

const FORMAT_EXAMPLE: &str = "**File: `path/to/file.py`**\n```python\n# file contents\n```";

/// System-prompt text describing the file block convention.
///
/// When a project folder is known it is named so the model picks paths
/// relative to it.
pub fn format_instructions(project_folder: Option<&Path>) -> String {
    let mut text = String::from(
        "When you create or change files, write each one as a complete file, never a fragment.\n\
         Put a marker line directly before every file's code block and keep paths relative.\n",
    );

    if let Some(folder) = project_folder {
        text.push_str(&format!(
            "All paths are relative to the project folder: {}\n\
             Suggest sensible subdirectories (src/, tests/, ...) inside it.\n",
            folder.display()
        ));
    }

    text.push_str("\nFormat every file exactly like this:\n\n");
    text.push_str(FORMAT_EXAMPLE);
    text.push_str(
        "\n\nFiles written this way are saved automatically; list the files you \
         created at the end of your answer.\n",
    );
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract_files;

    #[test]
    fn test_example_round_trips_through_extractor() {
        let files = extract_files(&format_instructions(None));

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "path/to/file.py");
        assert_eq!(files[0].language, "python");
    }

    #[test]
    fn test_project_folder_is_named() {
        let text = format_instructions(Some(Path::new("/work/app")));
        assert!(text.contains("/work/app"));
        assert!(!format_instructions(None).contains("project folder"));
    }
}
