//! Multi-task scripts: tasks separated by lines holding only `---`.

use std::fs;
use std::path::Path;

/// Separator line between tasks.
pub const TASK_SEPARATOR: &str = "---";

/// Split a script into task instructions. Blank segments are skipped.
pub fn parse_task_script(script: &str) -> Vec<String> {
    let mut tasks = Vec::new();
    let mut current = String::new();

    for line in script.lines() {
        if line.trim() == TASK_SEPARATOR {
            push_task(&mut tasks, &current);
            current.clear();
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    push_task(&mut tasks, &current);

    tasks
}

fn push_task(tasks: &mut Vec<String>, segment: &str) {
    let task = segment.trim();
    if !task.is_empty() {
        tasks.push(task.to_string());
    }
}

/// Read and split a task script file.
pub fn load_task_script(path: &Path) -> Result<Vec<String>, String> {
    let script = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read task script {}: {}", path.display(), e))?;
    Ok(parse_task_script(&script))
}
