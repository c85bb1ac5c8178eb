//! Prompt rendering.
//!
//! The template is a plain text file carrying four placeholder tokens.
//! Substitution is literal: every occurrence is replaced, unknown tokens are
//! left as they are, and values are never re-scanned.

use std::path::Path;

use crate::error::IngestError;
use crate::models::ProblemInfo;

pub const PROBLEM_TITLE: &str = "{{PROBLEM_TITLE}}";
pub const PROBLEM_SOURCE: &str = "{{PROBLEM_SOURCE}}";
pub const PROBLEM_DESCRIPTION: &str = "{{PROBLEM_DESCRIPTION}}";
pub const PSEUDO_CODE: &str = "{{PSEUDO_CODE}}";

/// Load the prompt template from disk.
pub fn load_template(path: &Path) -> Result<String, IngestError> {
    std::fs::read_to_string(path).map_err(|e| {
        IngestError::ResourceMissing(format!(
            "prompt template {} could not be read: {}",
            path.display(),
            e
        ))
    })
}

/// Substitute problem fields and pseudocode into `template`.
///
/// One left-to-right scan: substituted values are copied verbatim and never
/// scanned for tokens themselves.
pub fn render(template: &str, problem: &ProblemInfo, pseudo_code: &str) -> String {
    let substitutions = [
        (PROBLEM_TITLE, problem.title.as_str()),
        (PROBLEM_SOURCE, problem.source.as_str()),
        (PROBLEM_DESCRIPTION, problem.description.as_str()),
        (PSEUDO_CODE, pseudo_code),
    ];

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match substitutions
            .iter()
            .find(|(token, _)| tail.starts_with(token))
        {
            Some((token, value)) => {
                out.push_str(value);
                rest = &tail[token.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Load the template at `path` and render it.
pub fn render_from_file(
    path: &Path,
    problem: &ProblemInfo,
    pseudo_code: &str,
) -> Result<String, IngestError> {
    let template = load_template(path)?;
    Ok(render(&template, problem, pseudo_code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProblemSource;

    fn two_sum() -> ProblemInfo {
        ProblemInfo {
            source: ProblemSource::LeetCode,
            id: "1".to_string(),
            title: "Two Sum".to_string(),
            description: "Find two numbers.".to_string(),
        }
    }

    #[test]
    fn replaces_every_occurrence() {
        let out = render(
            "# {{PROBLEM_TITLE}}\nsee {{PROBLEM_TITLE}} on {{PROBLEM_SOURCE}}",
            &two_sum(),
            "",
        );
        assert_eq!(out, "# Two Sum\nsee Two Sum on leetcode");
    }

    #[test]
    fn all_four_tokens() {
        let out = render(
            "{{PROBLEM_TITLE}}|{{PROBLEM_SOURCE}}|{{PROBLEM_DESCRIPTION}}|{{PSEUDO_CODE}}",
            &two_sum(),
            "for i in nums",
        );
        assert_eq!(out, "Two Sum|leetcode|Find two numbers.|for i in nums");
    }

    #[test]
    fn unknown_placeholders_left_verbatim() {
        let out = render("{{LANGUAGE}} {{PSEUDO_CODE}}", &two_sum(), "");
        assert_eq!(out, "{{LANGUAGE}} ");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let mut problem = two_sum();
        problem.description = "use {{PSEUDO_CODE}} literally".to_string();
        problem.title = "{{PROBLEM_SOURCE}}".to_string();

        let out = render(
            "{{PROBLEM_TITLE}}: {{PROBLEM_DESCRIPTION}} / {{PSEUDO_CODE}}",
            &problem,
            "SECRET",
        );
        assert_eq!(out, "{{PROBLEM_SOURCE}}: use {{PSEUDO_CODE}} literally / SECRET");
    }

    #[test]
    fn extra_braces_around_tokens() {
        let out = render("{{{PROBLEM_TITLE}}} {{", &two_sum(), "");
        assert_eq!(out, "{Two Sum} {{");
    }

    #[test]
    fn missing_template_is_resource_missing() {
        let err = load_template(Path::new("/nonexistent/Prompt.md")).unwrap_err();
        assert!(matches!(err, IngestError::ResourceMissing(_)));
    }

    #[test]
    fn shipped_template_has_all_placeholders() {
        let template = include_str!("../assets/Prompt.md");
        for token in [PROBLEM_TITLE, PROBLEM_SOURCE, PROBLEM_DESCRIPTION, PSEUDO_CODE] {
            assert!(template.contains(token), "missing {}", token);
        }
    }
}
