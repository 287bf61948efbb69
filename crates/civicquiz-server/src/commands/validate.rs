//! The `civicquiz validate` command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;

use civicquiz_core::store::{read_question_file, validate_questions};

pub fn execute(questions_path: PathBuf) -> Result<()> {
    let questions = read_question_file(&questions_path)?;

    println!(
        "Question file: {} ({} questions)",
        questions_path.display(),
        questions.len()
    );

    let mut per_category: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for q in &questions {
        let entry = per_category.entry(q.category.as_str()).or_default();
        entry.0 += 1;
        entry.1 += q.answer.len();
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Questions", "Acceptable answers"]);
    for (category, (count, answers)) in &per_category {
        table.add_row(vec![
            category.to_string(),
            count.to_string(),
            answers.to_string(),
        ]);
    }
    println!("{table}");

    let warnings = validate_questions(&questions);
    for w in &warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("All questions valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
