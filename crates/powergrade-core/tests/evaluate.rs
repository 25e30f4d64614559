//! Evaluate mode: grade an existing results file without extraction.

use powergrade_core::{
    evaluate, load_results, render_evaluation, TaskSet, TaskStatus, ToleranceDefaults,
};
use serde_json::json;

#[test]
fn evaluate_results_file_against_tasks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tasks_path = dir.path().join("all_tasks.json");
    std::fs::write(
        &tasks_path,
        json!({"tasks": [
            {"id": "t1-a", "tier": 1, "ground_truth": {"sample_size_per_group": 64}, "tolerance": {"sample_size": 2}},
            {"id": "t1-b", "tier": 1, "ground_truth": {"power": 0.9}},
            {"id": "t2-a", "tier": "tier2", "ground_truth": {"detectable_effect_d": 0.4}, "tolerance": {"effect_size": 0.05}},
            {"id": "t3-a", "tier": 3, "ground_truth": {"events": 300}}
        ]})
        .to_string(),
    )
    .expect("write tasks");

    let results_path = dir.path().join("agent_results.json");
    std::fs::write(
        &results_path,
        json!({
            "t1-a": 65,
            "t1-b": {"value": 0.82, "unit": "fraction"},
            "t2-a": 0.44,
            "unknown-task": 12
        })
        .to_string(),
    )
    .expect("write results");

    let tasks = TaskSet::load(&tasks_path).expect("load tasks");
    let submitted = load_results(&results_path).expect("load results");
    let report = evaluate(&tasks, &submitted, &ToleranceDefaults::default());

    let statuses: Vec<(&str, TaskStatus)> = report
        .outcomes
        .iter()
        .map(|o| (o.task_id.as_str(), o.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("t1-a", TaskStatus::Pass),
            ("t1-b", TaskStatus::Fail),
            ("t2-a", TaskStatus::Pass),
            ("t3-a", TaskStatus::NoExtract),
        ]
    );
    assert_eq!(report.passed, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.missing_value, 1);
    assert_eq!(report.by_tier["tier1"].passed, 1);
    assert_eq!(report.by_tier["tier2"].total, 1);
    assert_eq!(report.by_tier["tier3"].passed, 0);

    let text = render_evaluation(&report);
    assert!(text.contains("Passed: 2/4"));
    assert!(text.contains("=== BY TIER ==="));
}
