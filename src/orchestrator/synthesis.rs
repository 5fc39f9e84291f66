//! Merging the four analyses into one report

use crate::agents::clip;
use crate::schemas::{
    CodeAnalysis, Decoded, DependencyAnalysis, IssueAnalysis, PrAnalysis, RepositoryDataset,
    RepositoryProfile, SuggestedProblem, SynthesizedReport,
};
use indexmap::IndexMap;

/// Characters of README carried into the report
pub const README_SUMMARY_CHARS: usize = 500;

/// The four joined analysis results
#[derive(Debug, Clone)]
pub struct Analyses {
    pub code: Decoded<CodeAnalysis>,
    pub pr: Decoded<PrAnalysis>,
    pub issue: Decoded<IssueAnalysis>,
    pub dependency: Decoded<DependencyAnalysis>,
}

/// Union of suggestion lists, deduplicated by case-insensitive title.
///
/// The first occurrence wins and order is otherwise preserved. Entries
/// without a title are dropped.
pub fn rank_suggestions<'a, I>(suggestions: I, limit: usize) -> Vec<SuggestedProblem>
where
    I: IntoIterator<Item = &'a SuggestedProblem>,
{
    let mut unique: IndexMap<String, &SuggestedProblem> = IndexMap::new();
    for suggestion in suggestions {
        let key = suggestion.title.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        unique.entry(key).or_insert(suggestion);
    }
    unique.into_values().take(limit).cloned().collect()
}

/// Build the report handed to the creator and validator
pub fn synthesize(
    dataset: &RepositoryDataset,
    analyses: Analyses,
    max_suggestions: usize,
) -> SynthesizedReport {
    let code = analyses.code.record();
    let pr = analyses.pr.record();
    let issue = analyses.issue.record();
    let dependency = analyses.dependency.record();

    let ranked_suggestions = rank_suggestions(
        pr.suggested_problems.iter().chain(issue.suggested_problems.iter()),
        max_suggestions,
    );

    let repository_profile = RepositoryProfile {
        name: dataset.repository.name.clone(),
        description: dataset.repository.description.clone(),
        language: dataset.language().to_string(),
        stars: dataset.repository.stars,
        forks: dataset.repository.forks,
        architecture: code.architecture.pattern.clone(),
        quality_score: code.code_quality.score,
        tech_stack: dependency.tech_stack.clone(),
        development_patterns: pr
            .patterns
            .common_change_types
            .iter()
            .chain(pr.patterns.workflow_patterns.iter())
            .cloned()
            .collect(),
        issue_patterns: issue
            .problem_patterns
            .iter()
            .map(|p| p.pattern.clone())
            .filter(|p| !p.is_empty())
            .collect(),
    };

    let opportunities = code.opportunities.clone();

    SynthesizedReport {
        repository_profile,
        opportunities,
        ranked_suggestions,
        readme_summary: clip(&dataset.readme, README_SUMMARY_CHARS).to_string(),
        code_analysis: analyses.code,
        pr_analysis: analyses.pr,
        issue_analysis: analyses.issue,
        dependency_analysis: analyses.dependency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FailureRecord;
    use crate::schemas::{Architecture, CodeQuality, ProblemPattern};

    fn suggestion(title: &str, rationale: &str) -> SuggestedProblem {
        SuggestedProblem {
            title: title.to_string(),
            rationale: rationale.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_dedup_is_case_insensitive_first_wins() {
        let pr = vec![
            suggestion("A", "first"),
            suggestion("b", ""),
            suggestion("a", "second"),
        ];
        let issue = vec![suggestion("C", "")];

        let ranked = rank_suggestions(pr.iter().chain(issue.iter()), 10);
        let titles: Vec<_> = ranked.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "b", "C"]);
        assert_eq!(ranked[0].rationale, "first");
    }

    #[test]
    fn test_blank_titles_dropped_and_capped() {
        let list = vec![
            suggestion("  ", ""),
            suggestion("One", ""),
            suggestion("Two", ""),
            suggestion("Three", ""),
        ];
        let ranked = rank_suggestions(&list, 2);
        let titles: Vec<_> = ranked.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two"]);
    }

    #[test]
    fn test_profile_assembled_from_records() {
        let mut dataset = RepositoryDataset::default();
        dataset.repository.name = "shop".into();
        dataset.readme = "x".repeat(800);

        let code = CodeAnalysis {
            architecture: Architecture {
                pattern: "Layered".into(),
                ..Default::default()
            },
            code_quality: CodeQuality {
                score: 72,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut issue = IssueAnalysis::default();
        issue.problem_patterns.push(ProblemPattern {
            pattern: "Race conditions".into(),
            frequency: "often".into(),
        });
        issue.suggested_problems.push(suggestion("Fix races", ""));

        let report = synthesize(
            &dataset,
            Analyses {
                code: Decoded::Parsed(code),
                pr: Decoded::failed(FailureRecord::new("no JSON found", "")),
                issue: Decoded::Parsed(issue),
                dependency: Decoded::Parsed(DependencyAnalysis::default()),
            },
            10,
        );

        let profile = &report.repository_profile;
        assert_eq!(profile.name, "shop");
        assert_eq!(profile.language, "Unknown");
        assert_eq!(profile.architecture, "Layered");
        assert_eq!(profile.quality_score, 72);
        assert_eq!(profile.issue_patterns, vec!["Race conditions"]);
        assert_eq!(report.ranked_suggestions.len(), 1);
        assert_eq!(report.readme_summary.len(), README_SUMMARY_CHARS);
        assert_eq!(report.decode_failures(), vec!["pr_analyzer"]);
    }
}
